//! Frame batch (draw list) types.
//!
//! Responsibilities:
//! - accumulate geometry, uniform blocks and resolved textures for one frame
//! - keep submission order (replay order is draw order, back-to-front)
//! - pack uniform blocks at the backend's offset alignment

mod cmd;
mod list;

pub use cmd::{DrawCmd, UniformSpan};
pub use list::{DrawList, align_up};
