//! Reconstructs block programs from object-detector output.
//!
//! A photo of physical programming blocks is run through a detector elsewhere; this crate
//! takes the resulting labeled boxes, finds the `run` block, and follows the chain of
//! overlapping blocks along the program's direction. See [`sequence::build_sequence`].

mod colors;
pub mod config;
pub mod detection;
pub mod error;
pub mod rect;
pub mod render;
pub mod sequence;

pub use error::{Error, Result};
