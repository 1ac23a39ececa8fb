//! Top-level module for the Markov verse system.
//!
//! This module provides a word-level order-N Markov chain, including:
//! - Tokenization of prose into words and punctuation (`tokenizer`)
//! - Additive construction and the frozen model (`ModelBuilder`, `MarkovModel`)
//! - Weighted successor sets (`SuccessorSet`)
//! - Generation constraints (`Constraints`)
//! - Constrained line generation (`Generator`)

/// Constrained line generation over a frozen model.
///
/// Handles start-context selection, temperature sampling, minimum length,
/// duplicate suppression and the bounded retry policy.
pub mod generator;

/// Order-N transition table: the mutable builder and the immutable model.
///
/// Supports incremental ingestion, merging and postcard snapshots.
pub mod markov_model;

/// Successor set of a single context.
///
/// Tracks successor counts and supports temperature-scaled sampling.
pub mod state;

/// Generation constraints and their validation.
pub mod constraints;

/// Word/punctuation tokenizer and the matching line renderer.
pub mod tokenizer;
