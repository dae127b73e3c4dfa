#![deny(missing_docs)]

//! Core error model, deterministic randomness and numeric reductions shared by
//! the graph inference crates.

pub mod errors;
pub mod numeric;
pub mod rng;
mod types;

pub use errors::{ErrorInfo, GinfError};
pub use numeric::{clip, entropy_term, log_factorial, log_mean_exp, log_sum_exp};
pub use rng::{derive_substream_seed, RngHandle};
pub use types::{all_pairs, Edge, Labels, NestedLabels};
