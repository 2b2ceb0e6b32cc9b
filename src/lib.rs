// src/lib.rs
// =============================================================================
// repo-ingest: turn a hosted repository snapshot into a navigable file tree
// plus prompt-ready text.
//
// Pipeline (see ingest.rs):
//   reference -> metadata -> archive -> scan -> tree -> artifacts
//
// Each stage lives in its own module and can be used on its own; the
// Ingestor ties them together.
//
// Rust concepts:
// - Library + binary in one package: main.rs uses this crate by name
// - pub use: a flat public API over nested modules
// =============================================================================

pub mod artifacts;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod error;
pub mod github;
pub mod ingest;
pub mod patterns;
pub mod reference;
pub mod scan;
pub mod tree;

pub use artifacts::Digest;
pub use config::{HostConfig, IngestionConfig};
pub use error::{ErrorKind, IngestError, IngestFailure, IngestResult};
pub use ingest::{Ingestion, Ingestor};
pub use reference::{parse_reference, IngestSource, RepositoryReference};
pub use scan::IngestionStats;
pub use tree::FileNode;
