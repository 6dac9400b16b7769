//! Local tool cache
//!
//! Maps (tool, version) to a directory holding a ready-to-run binary so the
//! Coursier launcher is downloaded once per runner cache lifetime.
//!
//! # Entry States
//!
//! | State | On disk | Description |
//! |-------|---------|-------------|
//! | Miss | nothing | Never installed |
//! | Partial | `{arch}/` only | Crashed mid-store, replaced on next store |
//! | Complete | `{arch}/` + `{arch}.complete` | Ready, never modified again |

pub mod entry;
pub mod tool_cache;

pub use entry::CacheEntry;
pub use tool_cache::{CacheLock, ToolCache};
