use thiserror::Error;

/// A prediction payload that parsed as JSON but does not carry what its
/// `success` flag promises.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("prediction response is missing `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("expected `name=value`, got `{0}`")]
    MalformedAssignment(String),
    #[error("field `{field}` expects a whole number, got `{value}`")]
    NotAnInteger { field: String, value: String },
    #[error("field `{field}` expects a number, got `{value}`")]
    NotADecimal { field: String, value: String },
    #[error("field `{field}` must be one of [{allowed}], got `{value}`")]
    UnknownChoice {
        field: String,
        value: String,
        allowed: String,
    },
}
