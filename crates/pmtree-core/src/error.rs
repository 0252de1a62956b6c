use thiserror::Error;

/// Failures while turning saveable values into [`SerializedValue`]s and back.
///
/// [`SerializedValue`]: crate::SerializedValue
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("value is not a {expected}")]
    TypeMismatch { expected: &'static str },
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PmError {
    #[error("no presentation model registered for description {description}")]
    UnknownDescription { description: String },
    #[error("presentation model {tag} is destroyed")]
    Destroyed { tag: String },
    #[error("presentation model {tag} already owns a navigator of another kind")]
    NavigatorInstalled { tag: String },
    #[error("navigator index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("set navigator needs at least one entry")]
    EmptySet,
    #[error("a stack navigator cannot be replaced with an empty backstack")]
    EmptyBackstack,
    #[error("work scope {scope} is cancelled")]
    ScopeCancelled { scope: String },
    #[error("no tokio runtime available to launch work")]
    NoRuntime,
    #[error(transparent)]
    Codec(#[from] CodecError),
}
