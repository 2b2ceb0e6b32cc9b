// src/scan/filter.rs
// =============================================================================
// The Scanner: admits or rejects every archive entry against the budgets
// and the user's patterns.
//
// Directories are recorded as placeholders with no budget check. Files are
// checked in this exact order, and the first failing check rejects them:
//   (a) size <= max_file_size
//   (b) accepted bytes + size <= max_total_size
//   (c) no exclude pattern matches
//   (d) some include pattern matches (only if includes are configured)
//   (e) text, or binary with include_binaries set
//
// Once max_files files have been admitted, classification stops for the
// rest of the archive. Remaining file entries are still counted (as
// excluded) so the statistics say how much was left out, but their payload
// is never read.
//
// Going over a budget is a truncation, not an error.
//
// Rust concepts:
// - Nested Result: Result<Result<T, Rejection>, Error> separates I/O failure from a decision
// - checked_add: arithmetic that reports overflow instead of wrapping
// - Generic iterators: scan() takes any IntoIterator of entries
// - State enums: WrapperState replaces a pair of booleans
// =============================================================================

use super::classify::{classify, Classification, SNIFF_LEN};
use super::entry::{tar_gz_entries, RawEntry};
use crate::config::IngestionConfig;
use crate::error::{IngestError, IngestFailure, IngestResult};
use crate::patterns::PatternRules;
use crate::tree::{normalize_path, RootWrapper, TreeEntry};
use flate2::read::GzDecoder;
use serde::Serialize;
use std::io;
use tar::Archive;
use tracing::{debug, info, warn};

/// Running statistics for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionStats {
    /// Every archive entry seen, files and directories.
    pub total_entries: usize,
    pub accepted_files: usize,
    /// Files rejected by any check, or skipped after the file budget ran out.
    pub excluded_files: usize,
    pub total_accepted_bytes: u64,
    /// Files rejected only because they were binary.
    pub skipped_binary: usize,
    /// Some budget cut content out of the snapshot.
    pub truncated: bool,
}

/// What the scanner hands to the tree builder.
#[derive(Debug)]
pub struct ScanOutcome {
    pub entries: Vec<TreeEntry>,
    pub stats: IngestionStats,
    /// Root wrapper shared by every archive entry, if there was one.
    pub wrapper: Option<RootWrapper>,
}

// Without a pre-pass the wrapper is guessed from the first entry, which the
// scanner only sees once scanning starts.
#[derive(Debug)]
enum WrapperState {
    Pending,
    Resolved(Option<RootWrapper>),
}

// Why a file did not make it in. Only used for logging.
#[derive(Debug, Clone, Copy)]
enum Rejection {
    TooLarge,
    TotalSize,
    Excluded,
    NotIncluded,
    Binary,
}

pub struct Scanner<'a> {
    config: &'a IngestionConfig,
    rules: &'a PatternRules,
    subpath: Option<String>,
    wrapper: WrapperState,
    stats: IngestionStats,
    entries: Vec<TreeEntry>,
    file_budget_spent: bool,
    // Cleared when an entry turns up outside the detected wrapper
    wrapper_shared: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &'a IngestionConfig, rules: &'a PatternRules) -> Self {
        let wrapper = if config.strip_root_wrapper {
            WrapperState::Pending
        } else {
            WrapperState::Resolved(None)
        };
        Self {
            config,
            rules,
            subpath: None,
            wrapper,
            stats: IngestionStats::default(),
            entries: Vec::new(),
            file_budget_spent: false,
            wrapper_shared: true,
        }
    }

    /// Use a wrapper found ahead of time (see `archive_root_wrapper`)
    /// instead of guessing it from the first entry.
    pub fn with_root_wrapper(mut self, wrapper: Option<RootWrapper>) -> Self {
        if self.config.strip_root_wrapper {
            self.wrapper = WrapperState::Resolved(wrapper);
        }
        self
    }

    /// Only admit entries at or below `subpath` ("/" means everything).
    pub fn with_subpath(mut self, subpath: &str) -> Self {
        let normalized = normalize_path(subpath);
        self.subpath = if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        };
        self
    }

    pub fn stats(&self) -> &IngestionStats {
        &self.stats
    }

    /// Feeds every entry of an archive, in archive order.
    pub fn scan<'r, I>(&mut self, entries: I) -> IngestResult<()>
    where
        I: IntoIterator<Item = io::Result<RawEntry<'r>>>,
    {
        for entry in entries {
            let entry = entry.map_err(|e| IngestError::CorruptArchive(e.to_string()))?;
            self.push(entry)?;
        }
        Ok(())
    }

    /// Processes a single entry.
    pub fn push(&mut self, mut entry: RawEntry<'_>) -> IngestResult<()> {
        self.stats.total_entries += 1;

        if let WrapperState::Pending = self.wrapper {
            let detected = RootWrapper::detect(&entry.path, entry.is_directory);
            if let Some(wrapper) = &detected {
                debug!(prefix = wrapper.prefix(), "detected archive root wrapper");
            }
            self.wrapper = WrapperState::Resolved(detected);
        }

        let relative = match &self.wrapper {
            WrapperState::Resolved(Some(wrapper)) => {
                if self.wrapper_shared && !wrapper.contains(&entry.path) {
                    warn!(
                        prefix = wrapper.prefix(),
                        path = %entry.path,
                        "entry outside the root wrapper, keeping archive paths as they are"
                    );
                    self.wrapper_shared = false;
                }
                match wrapper.strip(&entry.path) {
                    Some(path) => path,
                    // The wrapper folder itself
                    None => return Ok(()),
                }
            }
            _ => normalize_path(&entry.path),
        };
        if relative.is_empty() || !self.in_subpath(&relative) {
            return Ok(());
        }

        if entry.is_directory {
            self.entries.push(TreeEntry::directory(entry.path));
            return Ok(());
        }

        if self.file_budget_spent {
            self.stats.excluded_files += 1;
            return Ok(());
        }
        if self.stats.accepted_files >= self.config.max_files {
            warn!(
                max_files = self.config.max_files,
                "file budget reached, skipping the rest of the archive"
            );
            self.file_budget_spent = true;
            self.stats.truncated = true;
            self.stats.excluded_files += 1;
            return Ok(());
        }

        match self.admit(&mut entry, &relative)? {
            Ok(admitted) => {
                self.stats.accepted_files += 1;
                self.stats.total_accepted_bytes += admitted.size;
                self.entries.push(admitted);
            }
            Err(reason) => {
                debug!(path = %relative, ?reason, "file rejected");
                self.stats.excluded_files += 1;
                match reason {
                    Rejection::TotalSize => self.stats.truncated = true,
                    Rejection::Binary => self.stats.skipped_binary += 1,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    // Runs checks (a) through (e). The outer Result is an I/O failure while
    // reading the payload; the inner one is the admission decision.
    fn admit(
        &self,
        entry: &mut RawEntry<'_>,
        relative: &str,
    ) -> IngestResult<Result<TreeEntry, Rejection>> {
        let size = entry.raw_size;

        if size > self.config.max_file_size {
            return Ok(Err(Rejection::TooLarge));
        }
        // A header can announce any size; overflowing counts as over budget
        match self.stats.total_accepted_bytes.checked_add(size) {
            Some(total) if total <= self.config.max_total_size => {}
            _ => return Ok(Err(Rejection::TotalSize)),
        }
        if self.rules.is_excluded(relative) {
            return Ok(Err(Rejection::Excluded));
        }
        if !self.rules.is_included(relative) {
            return Ok(Err(Rejection::NotIncluded));
        }

        let mut bytes = entry.read_head(SNIFF_LEN).map_err(read_error)?;
        match classify(relative, &bytes) {
            Classification::Binary if !self.config.include_binaries => Ok(Err(Rejection::Binary)),
            Classification::Binary => Ok(Ok(TreeEntry::binary(entry.path.clone(), size))),
            Classification::Text => {
                entry.read_rest(&mut bytes).map_err(read_error)?;
                let content = String::from_utf8_lossy(&bytes).into_owned();
                Ok(Ok(TreeEntry::file(entry.path.clone(), size, Some(content))))
            }
        }
    }

    fn in_subpath(&self, relative: &str) -> bool {
        match &self.subpath {
            None => true,
            Some(subpath) => {
                relative == subpath
                    || relative
                        .strip_prefix(subpath.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
                    // Parents of the subpath, so the tree can reach it
                    || subpath
                        .strip_prefix(relative)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }

    pub fn finish(self) -> ScanOutcome {
        info!(
            total_entries = self.stats.total_entries,
            accepted_files = self.stats.accepted_files,
            excluded_files = self.stats.excluded_files,
            total_accepted_bytes = self.stats.total_accepted_bytes,
            truncated = self.stats.truncated,
            "archive scan finished"
        );
        let wrapper = match self.wrapper {
            WrapperState::Resolved(wrapper) if self.wrapper_shared => wrapper,
            _ => None,
        };
        ScanOutcome {
            entries: self.entries,
            stats: self.stats,
            wrapper,
        }
    }
}

fn read_error(e: io::Error) -> IngestError {
    IngestError::CorruptArchive(e.to_string())
}

// Finds the root wrapper of an in-memory .tar.gz by reading headers only.
//
// Returns None when the entries do not all live under one top-level
// folder (a tarball made with `tar czf x.tgz src main.rs`, say).
pub fn archive_root_wrapper(bytes: &[u8]) -> io::Result<Option<RootWrapper>> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    let mut paths: Vec<(String, bool)> = Vec::new();
    for entry in tar_gz_entries(&mut archive)? {
        let entry = entry?;
        paths.push((entry.path, entry.is_directory));
    }
    Ok(RootWrapper::detect_shared(
        paths.iter().map(|(path, is_directory)| (path.as_str(), *is_directory)),
    ))
}

// Scans a whole in-memory .tar.gz.
//
// When the wrapper is to be stripped, a header-only pass settles it first,
// so patterns and the subpath are matched against the right relative paths.
// On failure the statistics gathered so far travel with the error.
pub fn scan_tar_gz(
    bytes: &[u8],
    config: &IngestionConfig,
    rules: &PatternRules,
    subpath: &str,
) -> Result<ScanOutcome, IngestFailure> {
    let mut scanner = Scanner::new(config, rules).with_subpath(subpath);
    if config.strip_root_wrapper {
        // A broken archive fails again below, with partial stats
        if let Ok(wrapper) = archive_root_wrapper(bytes) {
            scanner = scanner.with_root_wrapper(wrapper);
        }
    }

    let mut archive = Archive::new(GzDecoder::new(bytes));
    let result = tar_gz_entries(&mut archive)
        .map_err(read_error)
        .and_then(|entries| scanner.scan(entries));

    match result {
        Ok(()) => Ok(scanner.finish()),
        Err(error) => Err(IngestFailure {
            error,
            stats: scanner.stats().clone(),
        }),
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does admit() return Result<Result<TreeEntry, Rejection>>?
//    - The outer Result is "could we even read the entry?" (a broken gzip
//      stream aborts the whole scan with ?)
//    - The inner Result is the decision: admitted, or rejected with a reason
//    - Keeping them apart means a rejection is never mistaken for an error
//
// 2. Why checked_add instead of +?
//    - raw_size comes from the tar header, which can claim any u64
//    - In debug builds `a + b` panics on overflow; in release it wraps
//    - checked_add returns None on overflow, which we treat as "over budget"
//
// 3. What is the header-only pass in scan_tar_gz?
//    - archive_root_wrapper() walks the entries without reading payloads
//    - It answers "do ALL entries share one top folder?" before filtering,
//      so include/exclude patterns see repository-relative paths
//    - The bytes are already in memory, so reading the headers twice is cheap
//
// 4. What does the Untouchable reader in the tests do?
//    - It panics if anyone calls read() on it
//    - Tests use it as the payload of entries that must be skipped unread
// -----------------------------------------------------------------------------
