//! Six-phase validation pipeline for Blueprint spec documents.
//!
//! This crate implements the core validator: the node index, the six phase
//! checkers (structural, referential, semantic, evolution, generation-safety,
//! verifiability), and the orchestrator that runs them in order and halts on
//! hard errors. Each phase is a pure function from the document (and the
//! derived index) to a finding list; the orchestrator is the only place that
//! decides whether the pipeline continues.

pub mod evolution;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod referential;
pub mod semantic;
pub mod structural;
pub mod verifiability;

pub use index::NodeIndex;
pub use pipeline::{validate_source, Validator, ValidatorOptions};
