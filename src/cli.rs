// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - ingest: fetch a repository (or read a local .tar.gz) and print the
//   summary, tree listing and/or concatenated content
// - parse: only run the reference parser and show what it understood
//
// Budget flags override the matching fields of --config (or the defaults).
// Host settings can also come from the environment, which keeps tokens out
// of shell history.
//
// Rust concepts:
// - clap derive: the structs below ARE the argument parser
// - #[arg(env = ...)]: flags that fall back to environment variables
// - ValueEnum: enums usable directly as flag values
// =============================================================================

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use repo_ingest::config::{HostConfig, IngestionConfig};
use repo_ingest::patterns::parse_pattern_list;
use repo_ingest::tree::{NestingCollapse, SiblingOrder};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "repo-ingest",
    version,
    about = "Turn a GitHub repository snapshot into a file tree and prompt-ready text",
    long_about = "repo-ingest downloads a snapshot of a GitHub repository (or reads a local \
                  .tar.gz), filters it against size budgets and include/exclude patterns, \
                  and prints a summary, a directory listing and the concatenated file contents."
)]
pub struct Cli {
    /// Log every pipeline stage to stderr (same as RUST_LOG=debug)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a repository and print derived artifacts
    ///
    /// Example: repo-ingest ingest https://github.com/octocat/Hello-World/tree/main/src
    Ingest(IngestArgs),

    /// Show how a reference string is understood, without fetching anything
    ///
    /// Example: repo-ingest parse octocat/Hello-World
    Parse {
        /// "owner/name", a github.com URL, or a path to a local .tar.gz
        reference: String,

        /// Print the parsed reference as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Which artifacts to print.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Show {
    Summary,
    Tree,
    Content,
    All,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    /// Directories first, then files, alphabetically
    DirectoriesFirst,
    /// README files, files, hidden files, directories, hidden directories
    ReadmeFirst,
}

impl From<Order> for SiblingOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::DirectoriesFirst => SiblingOrder::DirectoriesFirst,
            Order::ReadmeFirst => SiblingOrder::ReadmeFirst,
        }
    }
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// "owner/name", a github.com URL, or a path to a local .tar.gz
    pub reference: String,

    /// Load budgets and filters from a JSON file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Start from the alternate defaults (10 MiB per file, README-first)
    #[arg(long)]
    pub alternate: bool,

    /// Largest single file to admit, in bytes
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Largest number of files to admit
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Largest total size of admitted files, in bytes
    #[arg(long)]
    pub max_total_size: Option<u64>,

    /// Only admit files matching these patterns (comma or space separated,
    /// may be repeated)
    #[arg(long)]
    pub include: Vec<String>,

    /// Never admit files matching these patterns
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Keep binary files in the tree (without content)
    #[arg(long)]
    pub include_binaries: bool,

    /// Deadline for the network stages, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Sibling ordering policy
    #[arg(long, value_enum)]
    pub order: Option<Order>,

    /// Collapse every level of same-named nested directories, not just one
    #[arg(long)]
    pub collapse_full: bool,

    /// Keep the archive's top-level wrapper folder
    #[arg(long)]
    pub keep_root_wrapper: bool,

    /// What to print
    #[arg(long, value_enum, default_value_t = Show::All)]
    pub show: Show,

    /// Print the whole result as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write summary, tree and content to this file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub host: HostArgs,
}

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Token sent as a bearer token to the API and archive hosts
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the hosting API
    #[arg(long, env = "REPO_INGEST_API_BASE")]
    pub api_base: Option<String>,

    /// Base URL archives are downloaded from
    #[arg(long, env = "REPO_INGEST_ARCHIVE_BASE")]
    pub archive_base: Option<String>,

    /// Relay archive downloads through this endpoint (as ?url=...)
    #[arg(long, env = "REPO_INGEST_PROXY")]
    pub proxy: Option<String>,
}

impl IngestArgs {
    // Builds the run's config: file (or defaults), then flag overrides.
    pub fn ingestion_config(&self) -> Result<IngestionConfig> {
        let mut config = match &self.config {
            Some(path) => IngestionConfig::from_json_file(path)?,
            None if self.alternate => IngestionConfig::alternate(),
            None => IngestionConfig::default(),
        };

        if let Some(max_file_size) = self.max_file_size {
            config.max_file_size = max_file_size;
        }
        if let Some(max_files) = self.max_files {
            config.max_files = max_files;
        }
        if let Some(max_total_size) = self.max_total_size {
            config.max_total_size = max_total_size;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(order) = self.order {
            config.sibling_order = order.into();
        }
        if self.include_binaries {
            config.include_binaries = true;
        }
        if self.collapse_full {
            config.nesting_collapse = NestingCollapse::Full;
        }
        if self.keep_root_wrapper {
            config.strip_root_wrapper = false;
        }

        // Flags add to whatever the config file listed
        extend_patterns(&mut config.include_patterns, &self.include);
        extend_patterns(&mut config.exclude_patterns, &self.exclude);

        Ok(config)
    }
}

impl HostArgs {
    pub fn host_config(&self) -> HostConfig {
        let defaults = HostConfig::default();
        HostConfig {
            api_base: self.api_base.clone().unwrap_or(defaults.api_base),
            archive_base: self.archive_base.clone().unwrap_or(defaults.archive_base),
            proxy: self.proxy.clone(),
            token: self.token.clone().filter(|t| !t.is_empty()),
            user_agent: defaults.user_agent,
        }
    }
}

fn extend_patterns(target: &mut Option<Vec<String>>, raw: &[String]) {
    let tokens: Vec<String> = raw.iter().flat_map(|s| parse_pattern_list(s)).collect();
    if tokens.is_empty() {
        return;
    }
    target.get_or_insert_with(Vec::new).extend(tokens);
}
