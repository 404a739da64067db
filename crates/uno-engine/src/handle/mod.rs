//! Resource handles.
//!
//! - `HandleRegistry`: O(1) dense/sparse slot allocator over `u8` handles
//! - `ResourceTable`: slot → backend resource id, with per-slot generations

mod registry;
mod table;

pub use registry::{Handle, HandleRegistry};
pub use table::{ResourceTable, TextureHandle, TextureSource};
