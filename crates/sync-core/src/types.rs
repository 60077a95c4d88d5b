//! Control and column type universes.
//!
//! `ControlType` enumerates the question controls a form can carry and
//! `ColumnType` enumerates the field types of the destination table. Both
//! serialize to the exact strings used on the wire (`control_textbox`,
//! `singleLineText`, ...) and keep unknown strings in an `Other` variant so
//! that new upstream types never fail deserialization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Form question control type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlType {
    /// Single-line free text
    Textbox,
    /// Multi-line free text
    Textarea,
    Email,
    /// Phone number (composite: area, phone, full)
    Phone,
    Number,
    /// Single choice from a drop-down list
    Dropdown,
    /// Single choice from radio buttons
    Radio,
    /// Multiple choice check boxes
    Checkbox,
    FileUpload,
    /// Date (optionally with time)
    DateTime,
    /// Full name (composite: first, middle, last, ...)
    FullName,
    /// Postal address (composite: addr_line1, city, postal, ...)
    Address,
    Scale,
    Rating,
    Signature,
    /// Layout-only controls that never carry an answer
    /// (`control_head`, `control_button`, `control_pagebreak`, ...).
    Structural(String),
    /// Any control type this crate does not know about.
    Other(String),
}

/// Shape an answer takes for a given control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// No answer is ever recorded
    None,
    /// Uploaded files, answered as one or more URLs
    Files,
    /// Multiple selected values
    Choices,
    /// Nested object of named parts
    Composite,
    /// A single scalar (or a list collapsed into one)
    Scalar,
}

const STRUCTURAL_CONTROLS: &[&str] = &[
    "control_head",
    "control_button",
    "control_pagebreak",
    "control_divider",
    "control_text",
    "control_image",
];

impl ControlType {
    /// Parse a control type string. Never fails; unknown controls map to `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "control_textbox" => Self::Textbox,
            "control_textarea" => Self::Textarea,
            "control_email" => Self::Email,
            "control_phone" => Self::Phone,
            "control_number" => Self::Number,
            "control_dropdown" => Self::Dropdown,
            "control_radio" => Self::Radio,
            "control_checkbox" => Self::Checkbox,
            "control_fileupload" => Self::FileUpload,
            "control_datetime" => Self::DateTime,
            "control_fullname" => Self::FullName,
            "control_address" => Self::Address,
            "control_scale" => Self::Scale,
            "control_rating" => Self::Rating,
            "control_signature" => Self::Signature,
            other if STRUCTURAL_CONTROLS.contains(&other) => Self::Structural(other.to_string()),
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire representation of this control type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Textbox => "control_textbox",
            Self::Textarea => "control_textarea",
            Self::Email => "control_email",
            Self::Phone => "control_phone",
            Self::Number => "control_number",
            Self::Dropdown => "control_dropdown",
            Self::Radio => "control_radio",
            Self::Checkbox => "control_checkbox",
            Self::FileUpload => "control_fileupload",
            Self::DateTime => "control_datetime",
            Self::FullName => "control_fullname",
            Self::Address => "control_address",
            Self::Scale => "control_scale",
            Self::Rating => "control_rating",
            Self::Signature => "control_signature",
            Self::Structural(s) | Self::Other(s) => s,
        }
    }

    /// Layout controls never produce answers and are never synchronized.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }

    /// The answer shape this control produces.
    pub fn answer_kind(&self) -> AnswerKind {
        match self {
            Self::Structural(_) => AnswerKind::None,
            Self::FileUpload | Self::Signature => AnswerKind::Files,
            Self::Checkbox => AnswerKind::Choices,
            Self::FullName | Self::Address | Self::Phone => AnswerKind::Composite,
            _ => AnswerKind::Scalar,
        }
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ControlType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ControlType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Destination table column type.
///
/// Variants mirror the Airtable field type names. Types the table manages on
/// its own (auto numbers, created/modified stamps) are flagged by
/// [`ColumnType::is_system_managed`] and are never considered source-derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    SingleLineText,
    MultilineText,
    RichText,
    Email,
    PhoneNumber,
    Url,
    /// Numeric column with a fixed number of decimal places
    Number {
        precision: u8,
    },
    Currency,
    Percent,
    Rating,
    Date,
    DateTime,
    Checkbox,
    SingleSelect,
    MultipleSelects,
    MultipleAttachments,
    AutoNumber,
    CreatedTime,
    LastModifiedTime,
    CreatedBy,
    LastModifiedBy,
    /// Formula, lookup, rollup and any other type this crate does not model.
    Other(String),
}

impl ColumnType {
    /// Parse an Airtable type string. `number` defaults to integer precision.
    pub fn parse(s: &str) -> Self {
        match s {
            "singleLineText" => Self::SingleLineText,
            "multilineText" => Self::MultilineText,
            "richText" => Self::RichText,
            "email" => Self::Email,
            "phoneNumber" => Self::PhoneNumber,
            "url" => Self::Url,
            "number" => Self::Number { precision: 0 },
            "currency" => Self::Currency,
            "percent" => Self::Percent,
            "rating" => Self::Rating,
            "date" => Self::Date,
            "dateTime" => Self::DateTime,
            "checkbox" => Self::Checkbox,
            "singleSelect" => Self::SingleSelect,
            "multipleSelects" => Self::MultipleSelects,
            "multipleAttachments" => Self::MultipleAttachments,
            "autoNumber" => Self::AutoNumber,
            "createdTime" => Self::CreatedTime,
            "lastModifiedTime" => Self::LastModifiedTime,
            "createdBy" => Self::CreatedBy,
            "lastModifiedBy" => Self::LastModifiedBy,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire representation of this column type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SingleLineText => "singleLineText",
            Self::MultilineText => "multilineText",
            Self::RichText => "richText",
            Self::Email => "email",
            Self::PhoneNumber => "phoneNumber",
            Self::Url => "url",
            Self::Number { .. } => "number",
            Self::Currency => "currency",
            Self::Percent => "percent",
            Self::Rating => "rating",
            Self::Date => "date",
            Self::DateTime => "dateTime",
            Self::Checkbox => "checkbox",
            Self::SingleSelect => "singleSelect",
            Self::MultipleSelects => "multipleSelects",
            Self::MultipleAttachments => "multipleAttachments",
            Self::AutoNumber => "autoNumber",
            Self::CreatedTime => "createdTime",
            Self::LastModifiedTime => "lastModifiedTime",
            Self::CreatedBy => "createdBy",
            Self::LastModifiedBy => "lastModifiedBy",
            Self::Other(s) => s,
        }
    }

    /// Columns populated by the table itself, never by a sync.
    pub fn is_system_managed(&self) -> bool {
        matches!(
            self,
            Self::AutoNumber
                | Self::CreatedTime
                | Self::LastModifiedTime
                | Self::CreatedBy
                | Self::LastModifiedBy
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Number { .. } | Self::Currency | Self::Percent | Self::Rating
        )
    }

    /// Single or multiple select columns carry an allowed-option set.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::SingleSelect | Self::MultipleSelects)
    }

    /// Free-text style columns that accept any string.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Self::SingleLineText
                | Self::MultilineText
                | Self::RichText
                | Self::Email
                | Self::PhoneNumber
                | Self::Url
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}
