//! Word-level Markov chain text generation library.
//!
//! This crate provides a first-order word chain including:
//! - Whitespace tokenization with attached punctuation
//! - Incremental ingestion with sentence-boundary bookkeeping
//! - Frequency-weighted sentence generation bounded by terminators
//! - Parallel ingestion and chain merging
//!
//! The chain itself lives in [`model::chain::Chain`]; the tokenizer and
//! its constants are exposed for callers that need the same token rules.

/// Successor table, ingestion cursor and generation logic.
pub mod model;

/// Line splitting and sentence-terminator rules.
pub mod tokenizer;

/// Error type shared by ingestion and generation.
pub mod error;

/// I/O utilities (corpus discovery, path helpers).
pub mod io;

pub use error::ChainError;
pub use model::chain::Chain;
pub use model::options::{ChainOptions, DeadEndPolicy};
pub use tokenizer::{ends_with_punctuation, SENTINEL, TERMINATORS};
