use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeserializeError {
    #[error("{0}")]
    Message(String),

    #[error("expected `key=value`, got `{0}`")]
    ExpectedEquals(String),
    #[error("expected bool (true, false, 1 or 0), got `{0}`")]
    ExpectedBool(String),
    #[error("expected integer, got `{0}`")]
    ExpectedInteger(String),
    #[error("expected floating-point value, got `{0}`")]
    ExpectedFloat(String),
    #[error("malformed window row near `{near}` ({kind})")]
    WindowSyntax { near: String, kind: String },
}

impl serde::de::Error for DeserializeError {
    fn custom<T: Display>(msg: T) -> Self {
        DeserializeError::Message(msg.to_string())
    }
}
