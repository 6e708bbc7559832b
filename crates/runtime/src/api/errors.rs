//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the generator, the validator, and narration so the
//! orchestrator can classify them: upstream failures and validation
//! rejections abort a batch with a spoken notice, per-action side-effect
//! failures are logged and skipped, and an ownership violation after
//! validation is a fatal programming-bug signal.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("action generator failed: {0}")]
    Generator(String),

    #[error("generator returned no actions")]
    EmptyBatch,

    #[error(transparent)]
    Validation(#[from] tabletalk_core::ValidationError),

    #[error("narration failed: {0}")]
    Narration(String),

    #[error(
        "turn ownership violated after validation: action targets '{target}' but '{active}' holds the turn"
    )]
    OwnershipViolation { target: String, active: String },

    #[error("write to protected state path '{0}' reached the executor after validation")]
    ProtectedWrite(String),

    #[error("game template must be a JSON object")]
    InvalidTemplate,

    #[error("orchestrator requires a {0} to be configured before building")]
    MissingCollaborator(&'static str),
}
