use serde::Serialize;
use thiserror::Error;

use crate::model::FieldId;

/// Failures raised while compiling or applying a single mandatory rule.
///
/// None of these abort a validation pass: the tree walk turns them into a
/// [`ErrorKind::Custom`] error on the field that carried the rule.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("malformed expression `{raw}`: {reason}")]
    MalformedExpression { raw: String, reason: String },

    #[error("target field `{0}` not found in instance")]
    TargetNotFound(String),

    // Instance or config documents that could not be loaded.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

impl RuleError {
    pub(crate) fn malformed(raw: &str, reason: impl Into<String>) -> Self {
        RuleError::MalformedExpression {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;

/// What went wrong with a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum ErrorKind {
    /// The field is empty and its rule says it must be filled.
    Mandatory,
    /// The rule itself could not be applied.
    Custom(String),
}

/// A single problem reported back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: FieldId,
    pub field_name: String,
    pub kind: ErrorKind,
}

impl ValidationError {
    pub fn mandatory(field: FieldId, field_name: &str) -> Self {
        Self {
            field,
            field_name: field_name.to_string(),
            kind: ErrorKind::Mandatory,
        }
    }

    pub fn custom(field: FieldId, field_name: &str, message: impl Into<String>) -> Self {
        Self {
            field,
            field_name: field_name.to_string(),
            kind: ErrorKind::Custom(message.into()),
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.kind == ErrorKind::Mandatory
    }
}
