// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Paginated walk over closed issues that buckets merged pulls by version.
///
/// The walk starts in the most recent version. Whenever an issue number
/// matches a boundary of the version table, the running accumulators are
/// flushed under the current version and the walk continues in the version
/// the boundary opens. Latest-only runs stop at the first boundary instead.
use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::{
    Aggregator, BufferKey, BufferKind, BufferValue, ChangelogConfig, Error, Issue, LabelGroups,
    Progress, Tally, TrackerApi, VersionTable, collect_merged_pull_numbers, render_fragment,
};

/// Result of a pipeline run, ready for the HTML renderer.
#[derive(Debug, Clone,)]
pub struct PipelineOutcome
{
    /// Versions to render, most recent first.
    pub versions:   Vec<String,>,
    /// Buffers collected for those versions.
    pub aggregator: Aggregator,
}

/// Settings shared by the whole walk.
#[derive(Debug, Clone, Copy,)]
pub struct RunOptions<'config,>
{
    /// Version boundary table.
    pub versions:    &'config VersionTable,
    /// Web root used for author profile links.
    pub web_base:    &'config str,
    /// Maximum number of issue pages fetched.
    pub page_cutoff: u32,
    /// Stop at the first boundary and render only the newest version.
    pub latest_only: bool,
}

impl<'config,> RunOptions<'config,>
{
    /// Options derived from a validated configuration.
    pub fn from_config(config: &'config ChangelogConfig, latest_only: bool,) -> Self
    {
        Self {
            versions: &config.versions,
            web_base: &config.web_base,
            page_cutoff: config.pagination.page_cutoff,
            latest_only,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
enum Step
{
    Continue,
    Done,
}

/// State machine assigning qualifying pulls to the current version.
#[derive(Debug,)]
pub struct Bucketer<'run,>
{
    options:     RunOptions<'run,>,
    merged:      &'run HashSet<u64,>,
    current:     String,
    crossed:     HashSet<u64,>,
    labelled:    LabelGroups,
    user_counts: Tally,
    merged_by:   Tally,
    aggregator:  Aggregator,
    done:        bool,
}

impl<'run,> Bucketer<'run,>
{
    /// Starts accumulating in the most recent version.
    pub fn new(options: RunOptions<'run,>, merged: &'run HashSet<u64,>,) -> Self
    {
        Self {
            current: options.versions.initial().to_owned(),
            options,
            merged,
            crossed: HashSet::new(),
            labelled: LabelGroups::default(),
            user_counts: Tally::default(),
            merged_by: Tally::default(),
            aggregator: Aggregator::new(),
            done: false,
        }
    }

    /// Whether latest-only mode already ended the walk.
    pub fn is_done(&self,) -> bool
    {
        self.done
    }

    /// Feeds one issue through the state machine.
    ///
    /// Pull details are fetched from `api` for every qualifying pull.
    ///
    /// # Errors
    ///
    /// Propagates tracker failures from the detail lookup.
    pub async fn process<A: TrackerApi,>(
        &mut self,
        api: &A,
        issue: &Issue,
        progress: &Progress,
    ) -> Result<(), Error,>
    {
        if self.done {
            return Ok((),);
        }

        if self.cross_boundary(issue.number,) == Step::Done {
            return Ok((),);
        }

        if !issue.is_pull_request() {
            debug!("Skipping #{}: not a pull request", issue.number);
            return Ok((),);
        }
        if !self.merged.contains(&issue.number,) {
            debug!("Skipping #{}: not merged", issue.number);
            return Ok((),);
        }

        let entry = render_entry(issue, self.options.web_base,);
        self.aggregator.set_buffer(
            &BufferKey::new(self.current.as_str(), BufferKind::Log,),
            BufferValue::Entry(entry,),
            true,
        );

        let link = format!("<a href=\"{}\">{}</a>", issue.html_url, issue.title);
        for label in &issue.labels {
            self.labelled.push(&label.name, link.clone(),);
        }
        self.user_counts.increment(issue.author(),);

        progress.step(format!("Getting info for pull {}", issue.number),);
        let detail = api.pull_detail(issue.number,).await?;
        match detail.merged_by {
            Some(merger,) => self.merged_by.increment(&merger.login,),
            None => warn!("Pull #{} has no merge attribution", issue.number),
        }

        debug!("Added #{} to version {}", issue.number, self.current);
        Ok((),)
    }

    fn cross_boundary(&mut self, number: u64,) -> Step
    {
        let Some(next,) = self.options.versions.version_at(number,) else {
            return Step::Continue;
        };
        if !self.crossed.insert(number,) {
            return Step::Continue;
        }

        self.flush();

        if self.options.latest_only {
            info!("Reached boundary #{} of version {}; stopping", number, self.current);
            self.done = true;
            return Step::Done;
        }

        info!("Reached boundary #{}: switching from {} to {}", number, self.current, next);
        self.current = next.to_owned();
        Step::Continue
    }

    fn flush(&mut self,)
    {
        let version = self.current.as_str();
        self.aggregator.set_buffer(
            &BufferKey::new(version, BufferKind::Labelled,),
            BufferValue::Labelled(std::mem::take(&mut self.labelled,),),
            false,
        );
        self.aggregator.set_buffer(
            &BufferKey::new(version, BufferKind::UserCount,),
            BufferValue::Counts(std::mem::take(&mut self.user_counts,),),
            false,
        );
        self.aggregator.set_buffer(
            &BufferKey::new(version, BufferKind::MergedBy,),
            BufferValue::Counts(std::mem::take(&mut self.merged_by,),),
            false,
        );
    }

    /// Flushes the running version and hands over the collected buffers.
    pub fn finish(mut self,) -> PipelineOutcome
    {
        if !self.done {
            self.flush();
        }

        let versions = if self.options.latest_only {
            vec![self.options.versions.initial().to_owned()]
        } else {
            self.options.versions.labels()
        };

        PipelineOutcome {
            versions,
            aggregator: self.aggregator,
        }
    }
}

/// Renders the log entry of a merged pull.
///
/// The entry links the pull, shows its title and author, and appends the
/// converted description when there is one.
pub fn render_entry(issue: &Issue, web_base: &str,) -> String
{
    let closed = issue.closed_at.as_deref().unwrap_or("",);
    let login = issue.author();
    let mut html = format!(
        "[<a href=\"{}\" title=\"Closed {closed}\">#{}</a>] <strong>{}</strong> (<a href=\"{web_base}/{login}\">{login}</a>)",
        issue.html_url, issue.number, issue.title
    );

    let body = issue.trimmed_body();
    if !body.is_empty() {
        html.push_str(&render_fragment(body,),);
    }
    html
}

/// Walks closed issues page by page and buckets merged pulls by version.
///
/// Stops on the first empty page, after `options.page_cutoff` pages, or at
/// the first boundary in latest-only mode.
///
/// # Errors
///
/// Propagates the first tracker failure; nothing is returned for a failed
/// walk.
pub async fn bucket_issues<A: TrackerApi,>(
    api: &A,
    options: RunOptions<'_,>,
    merged: &HashSet<u64,>,
    progress: &Progress,
) -> Result<PipelineOutcome, Error,>
{
    let mut bucketer = Bucketer::new(options, merged,);

    'pages: for page in 1..=options.page_cutoff {
        progress.page("issues", page,);
        let issues = api.closed_issues(page,).await?;

        if issues.is_empty() {
            break;
        }

        for issue in &issues {
            bucketer.process(api, issue, progress,).await?;
            if bucketer.is_done() {
                break 'pages;
            }
        }
    }

    Ok(bucketer.finish(),)
}

/// Runs the complete collection pipeline: merged-pull index, then the
/// bucketing walk.
///
/// # Errors
///
/// Propagates the first tracker failure from either stage.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use prlog::{GithubTracker, Progress, RunOptions, load_config, run_pipeline};
///
/// # async fn example() -> Result<(), prlog::Error> {
/// let config = load_config(Path::new("changelog.yaml",),)?;
/// let tracker = GithubTracker::new(&config,)?;
/// let outcome = run_pipeline(
///     &tracker,
///     RunOptions::from_config(&config, false,),
///     config.pagination,
///     &Progress::hidden(),
/// )
/// .await?;
/// println!("{} versions", outcome.versions.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_pipeline<A: TrackerApi,>(
    api: &A,
    options: RunOptions<'_,>,
    pagination: crate::Pagination,
    progress: &Progress,
) -> Result<PipelineOutcome, Error,>
{
    let merged = collect_merged_pull_numbers(api, pagination, progress,).await?;
    let outcome = bucket_issues(api, options, &merged, progress,).await?;

    let pulls: usize =
        outcome.versions.iter().map(|version| outcome.aggregator.bucket(version,).pull_count(),).sum();
    progress.finish(format!(
        "Collected {pulls} merged pulls across {} versions",
        outcome.versions.len()
    ),);

    Ok(outcome,)
}
