//! SQL text handling: the prompt sent to the model and the checks applied to
//! what comes back.

pub mod prompt;
pub mod sanitizer;
pub mod validator;

pub use prompt::build_prompt;
pub use sanitizer::{SanitizeOptions, sanitize, sanitize_with};
pub use validator::validate_readonly;
