//! uno engine crate.
//!
//! Small-handle resource management and frame-batched draw submission over a
//! pluggable graphics backend (wgpu, or a recording backend for headless use).

pub mod backend;
pub mod batch;
pub mod device;
pub mod handle;
pub mod logging;
pub mod release;
pub mod render;
pub mod state;
pub mod time;

mod error;

pub use error::RenderError;
pub use render::{Renderer, RendererConfig, SubmitMode};
