//! Redundant-state elimination for device binds.

mod cache;

pub use cache::{StateCache, StateSlot};
