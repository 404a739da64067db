//! Deferred resource release.
//!
//! Resources destroyed while a frame is being recorded may still be referenced
//! by its commands; they are queued here and released once the frame has been
//! submitted (optionally a fixed number of frames later).

mod queue;

pub use queue::ReleaseQueue;
