//! setup-coursier - Coursier installer for CI runners
//!
//! Installs the Coursier launcher into the runner tool cache, provisions a
//! JVM and installs apps, publishing PATH, JAVA_HOME and outputs to later
//! job steps.

pub mod actions;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod install;
pub mod orchestrator;
pub mod platform;
pub mod runner;
pub mod ui;

pub use error::{SetupError, SetupResult};
