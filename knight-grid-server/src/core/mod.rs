//! Core deterministic primitives.

pub mod rng;

pub use rng::{DeterministicRng, derive_board_seed};
