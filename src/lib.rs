//! Exploration model builder.
//!
//! Reads recorded exploration traces (one action per line, plus one record
//! file per observed UI state), deduplicates widgets and states by their
//! structural identity, repairs stale ids and assembles the traces into a
//! [`model::Model`]. Traces are processed concurrently; see
//! [`loader::ModelLoader`].

pub mod cli;
pub mod feature;
pub mod loader;
pub mod model;
pub mod storage;

pub use loader::{LoadOutcome, LoaderError, ModelConfig, ModelLoader, load_model};
pub use model::Model;
