//! Top-level module for the word chain.
//!
//! This module provides:
//! - The chain itself (`Chain`): successor table, cursor and RNG
//! - Per-predecessor successor bags (`Successors`)
//! - Generation options (`ChainOptions`, `DeadEndPolicy`)

/// Successor table plus ingestion cursor.
///
/// Handles word, line and source ingestion, sentence generation,
/// merging and parallel ingestion.
pub mod chain;

/// Ordered bag of the successors observed after one predecessor.
///
/// Duplicates are kept so that uniform sampling over the bag is
/// frequency-weighted over distinct tokens.
pub mod successors;

/// Generation parameters: dead-end policy and token cap.
pub mod options;
