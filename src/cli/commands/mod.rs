//! CLI command implementations

pub mod cache;
pub mod config;
pub mod install;
pub mod platform;

pub use cache::execute as cache;
pub use config::execute as config;
pub use install::execute as install;
pub use platform::execute as platform;
