//! Terminal output for interactive use, with plain fallbacks for CI logs

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{key_value, section, step_info, step_ok};
pub use progress::DownloadProgress;
