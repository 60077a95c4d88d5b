//! Static field mapping configuration.
//!
//! A [`MappingConfig`] is loaded once per process (YAML) and passed by
//! reference to the reconciler and the mapper. It is never mutated at
//! runtime.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use sync_core::{ColumnType, Question};

/// Destination column names are limited to this many characters.
pub const MAX_COLUMN_NAME_CHARS: usize = 255;

pub const DEFAULT_KEY_COLUMN: &str = "Submission ID";

/// Error type for mapping configuration.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// Error reading mapping file
    #[error("Failed to read mapping file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse mapping YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Structurally valid but unusable configuration
    #[error("Invalid mapping: {0}")]
    Invalid(String),
}

/// What to write when a question has no answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyAnswerPolicy {
    /// Leave the destination field untouched
    #[default]
    Preserve,
    /// Overwrite the destination field with an empty value
    Clear,
}

/// Where the answer of one question lands in the destination table.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnTarget<'a> {
    /// The whole answer goes to one column
    Single(String),
    /// Each configured part goes to its own column (part key -> column)
    Composite(&'a BTreeMap<String, String>),
}

/// Field mapping table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    /// Column holding the submission identifier
    pub key_column: String,

    /// Question semantic name -> column name overrides
    pub field_names: BTreeMap<String, String>,

    /// Question semantic name -> (answer part -> column name)
    pub composite_fields: BTreeMap<String, BTreeMap<String, String>>,

    /// Column name -> type used when the column has to be created
    pub column_types: BTreeMap<String, ColumnType>,

    /// Columns never created and never written
    pub skip_fields: BTreeSet<String>,

    /// Column name -> (submitted value -> destination option)
    pub value_normalization: BTreeMap<String, BTreeMap<String, String>>,

    pub empty_answers: EmptyAnswerPolicy,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            field_names: BTreeMap::new(),
            composite_fields: BTreeMap::new(),
            column_types: BTreeMap::new(),
            skip_fields: BTreeSet::new(),
            value_normalization: BTreeMap::new(),
            empty_answers: EmptyAnswerPolicy::default(),
        }
    }
}

impl MappingConfig {
    /// Load mapping from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MappingError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse mapping from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, MappingError> {
        let config: MappingConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), MappingError> {
        if self.key_column.trim().is_empty() {
            return Err(MappingError::Invalid("key_column must not be empty".into()));
        }

        let columns = self
            .field_names
            .values()
            .chain(self.composite_fields.values().flat_map(|parts| parts.values()));
        for column in columns {
            if column.trim().is_empty() {
                return Err(MappingError::Invalid("column names must not be empty".into()));
            }
            if column.chars().count() > MAX_COLUMN_NAME_CHARS {
                return Err(MappingError::Invalid(format!(
                    "column name longer than {MAX_COLUMN_NAME_CHARS} characters: {column}"
                )));
            }
            if *column == self.key_column {
                return Err(MappingError::Invalid(format!(
                    "column '{column}' is reserved for the submission identifier"
                )));
            }
        }
        Ok(())
    }

    /// Column name for a non-composite question.
    ///
    /// Explicit override by semantic name, then the trimmed display label,
    /// then `Field_<qid>`.
    pub fn column_name(&self, question: &Question) -> String {
        if let Some(name) = self.field_names.get(&question.name) {
            return name.clone();
        }

        let label = question.text.trim();
        if !label.is_empty() {
            return label.chars().take(MAX_COLUMN_NAME_CHARS).collect();
        }

        format!("Field_{}", question.qid)
    }

    /// Destination for a question's answer, or `None` for layout controls.
    pub fn target<'a>(&'a self, question: &Question) -> Option<ColumnTarget<'a>> {
        if question.control.is_structural() {
            return None;
        }

        match self.composite_fields.get(&question.name) {
            Some(parts) => Some(ColumnTarget::Composite(parts)),
            None => Some(ColumnTarget::Single(self.column_name(question))),
        }
    }

    pub fn is_skipped(&self, column: &str) -> bool {
        self.skip_fields.contains(column)
    }

    /// Type override for a column, if configured.
    pub fn column_type(&self, column: &str) -> Option<&ColumnType> {
        self.column_types.get(column)
    }

    /// Map a submitted value onto the destination's option spelling.
    pub fn normalize<'v>(&'v self, column: &str, value: &'v str) -> &'v str {
        self.value_normalization
            .get(column)
            .and_then(|values| values.get(value))
            .map(String::as_str)
            .unwrap_or(value)
    }
}
