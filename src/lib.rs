//! Building blocks for generating an HTML changelog of merged pull requests.
//!
//! The library pages through a repository's closed pull requests and issues
//! on GitHub, assigns every merged pull request to the release version it
//! shipped in, counts contributions per author and per maintainer, and
//! renders the result as a single HTML document. The version layout and the
//! repository identity come from a validated YAML configuration.

mod aggregate;
mod config;
mod error;
mod markdown;
mod merged;
mod output;
mod pipeline;
mod progress;
mod render;
mod tracker;

pub use aggregate::{
    Aggregator, BufferKey, BufferKind, BufferValue, LabelGroups, Tally, VersionBucket,
};
pub use config::{
    ChangelogConfig, ConfigDocument, DEFAULT_API_BASE, DEFAULT_OUTPUT, DEFAULT_TITLE,
    DEFAULT_WEB_BASE, Pagination, PaginationConfig, RepositoryConfig, VersionEntry, VersionTable,
    load_config, parse_config,
};
pub use error::{Error, config_io_error, filesystem_error};
pub use markdown::render_fragment;
pub use merged::collect_merged_pull_numbers;
pub use output::write_changelog;
pub use pipeline::{
    Bucketer, PipelineOutcome, RunOptions, bucket_issues, render_entry, run_pipeline,
};
pub use progress::Progress;
pub use render::render_document;
pub use tracker::{
    Account, GithubTracker, Issue, Label, PullDetail, PullRequestLink, PullSummary, TrackerApi,
};
