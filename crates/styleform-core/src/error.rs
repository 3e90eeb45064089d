use thiserror::Error;

use crate::identity::FieldIdentity;
use crate::scalar::DataType;
use crate::value::ValueKind;

pub type Result<T> = std::result::Result<T, FieldError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// A typed accessor does not match what the field declares or holds.
    #[error("type mismatch on {field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: FieldIdentity,
        expected: String,
        found: String,
    },

    /// Raw input could not be coerced into the declared type.
    #[error("malformed {data_type} value: {input:?}")]
    MalformedValue { data_type: DataType, input: String },

    /// A value-only field was handed something other than a literal.
    #[error("{field} only accepts literal values, got {kind}")]
    NotAConstant { field: FieldIdentity, kind: ValueKind },
}

impl FieldError {
    #[must_use]
    pub fn malformed(data_type: DataType, input: impl Into<String>) -> Self {
        Self::MalformedValue {
            data_type,
            input: input.into(),
        }
    }

    #[must_use]
    pub fn mismatch(
        field: FieldIdentity,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::TypeMismatch {
            field,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::FieldKind;

    #[test]
    fn mismatch_message_names_field_and_types() {
        let err = FieldError::mismatch(
            FieldIdentity::new(FieldKind::DefaultStyle),
            DataType::Boolean,
            DataType::Integer,
        );
        assert_eq!(
            err.to_string(),
            "type mismatch on default_style: expected boolean, found integer"
        );
    }

    #[test]
    fn malformed_message_quotes_input() {
        let err = FieldError::malformed(DataType::Double, "abc");
        assert_eq!(err.to_string(), "malformed double value: \"abc\"");
    }
}
