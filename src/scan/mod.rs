// src/scan/mod.rs
// =============================================================================
// Streams the entries of a downloaded snapshot and decides which ones make
// it into the tree.
//
// Submodules:
// - entry: RawEntry and reading entries out of a .tar.gz archive
// - classify: text vs binary detection
// - filter: the Scanner, which applies budgets and patterns in a fixed
//   order and keeps running statistics
//
// Everything here is synchronous and CPU-bound. It runs after the network
// stages have finished and is bounded by the budgets, not by a clock.
//
// Rust concepts:
// - Modules: one file per stage of the scan
// - pub use: callers import from crate::scan directly
// =============================================================================

mod classify;
pub(crate) mod entry;
mod filter;

pub use classify::{classify, is_text_path, looks_binary, Classification, SNIFF_LEN};
pub use entry::{tar_gz_entries, RawEntry};
pub use filter::{archive_root_wrapper, scan_tar_gz, IngestionStats, ScanOutcome, Scanner};
