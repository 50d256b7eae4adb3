//! Schedule layer: move tables and time-sampled sweeps.
//!
//! # Contents
//!
//! - [`move_table`]: the high-level per-row move description
//! - [`sweep`]: exact and quantized motion traces with collision metadata

pub mod move_table;
pub mod sweep;

pub use move_table::{MoveRow, MoveTable};
pub use sweep::Sweep;
