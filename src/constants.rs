/// Shown when a failure matches none of the known vendor errors
pub const GENERIC_FAILURE_MESSAGE: &str = "⚠️ *Something went wrong*";

/// Nova Reel accepts a single input resolution
pub const IMAGE_DIMENSIONS_MESSAGE: &str =
    "⚠️ *The provided image must have dimensions of 1280x720.*";

/// Nova Canvas bounds the input width
pub const IMAGE_WIDTH_MESSAGE: &str =
    "⚠️ *The width of the provided image must be within range 320 and 4096 pixels.*";

pub const MODEL_NOT_ENABLED_MESSAGE: &str =
    "*This model is not enabled. Please try again later or contact an administrator*";

/// Vendor error markers recognised by the failure classifier
pub const VALIDATION_EXCEPTION: &str = "An error occurred (ValidationException)";
pub const ACCESS_DENIED_EXCEPTION: &str = "An error occurred (AccessDeniedException)";

/// Sub-session suffix of a comparison variant: `<sessionId>_prompt_<index>`
pub const COMPARE_SUB_SESSION_INFIX: &str = "_prompt_";

/// Mode used when an envelope does not name one
pub const DEFAULT_MODE: &str = "chain";
