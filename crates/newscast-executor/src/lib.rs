//! Page-side runtime: media executors and the host that injects them.
//!
//! Each tab that triggers a commentary gets a [`executor`] task owning the
//! tab's only audio resource and driving it through the [`machine`]. The
//! [`host::PageHost`] spawns and unloads executors on behalf of the panel.

pub mod config;
pub mod executor;
pub mod generation;
pub mod headless;
pub mod host;
pub mod machine;
pub mod media;
mod runtime;
pub mod speaker;

pub use crate::executor::{ExecutorHandle, spawn_executor};
pub use crate::host::PageHost;
pub use crate::runtime::{RuntimeError, spawn};
