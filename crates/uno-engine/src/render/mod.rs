//! Frame-batched renderer.
//!
//! `Renderer` ties the pieces together:
//! - `handle::ResourceTable` for texture handles
//! - `batch::DrawList` for the frame's draws
//! - `state::StateCache` to elide redundant binds during replay
//! - `release::ReleaseQueue` to free textures once their frame is submitted
//!
//! All state lives in the renderer value; construction and `shutdown` bracket
//! its lifetime.

mod config;
mod renderer;

pub use config::{RendererConfig, SubmitMode};
pub use renderer::Renderer;
