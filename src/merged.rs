// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Index of merged pull request numbers.
///
/// Closed pull requests include ones that were rejected; only pulls with a
/// merge timestamp make it into the changelog.
use std::collections::HashSet;

use tracing::info;

use crate::{Error, Pagination, Progress, TrackerApi};

/// Collects the numbers of all merged pull requests.
///
/// Pages through the closed pull requests starting at page 1 and stops at the
/// first empty page or after `pagination.page_cutoff` pages.
///
/// # Errors
///
/// Propagates the first tracker failure; no partial index is returned.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use prlog::{GithubTracker, Progress, collect_merged_pull_numbers, load_config};
///
/// # async fn example() -> Result<(), prlog::Error> {
/// let config = load_config(Path::new("changelog.yaml",),)?;
/// let tracker = GithubTracker::new(&config,)?;
/// let merged =
///     collect_merged_pull_numbers(&tracker, config.pagination, &Progress::hidden(),).await?;
/// println!("{} merged pulls", merged.len());
/// # Ok(())
/// # }
/// ```
pub async fn collect_merged_pull_numbers<A: TrackerApi,>(
    api: &A,
    pagination: Pagination,
    progress: &Progress,
) -> Result<HashSet<u64,>, Error,>
{
    let mut merged = HashSet::new();

    for page in 1..=pagination.page_cutoff {
        progress.page("merged pulls", page,);
        let pulls = api.closed_pulls(page,).await?;

        if pulls.is_empty() {
            break;
        }

        merged.extend(pulls.iter().filter(|pull| pull.is_merged(),).map(|pull| pull.number,),);
    }

    info!("Indexed {} merged pull requests", merged.len());

    Ok(merged,)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::tracker::testing::{FakeTracker, merged, unmerged};

    fn pagination(page_cutoff: u32,) -> Pagination
    {
        Pagination {
            per_page: 100,
            page_cutoff,
        }
    }

    #[tokio::test]
    async fn keeps_only_merged_pulls()
    {
        let api = FakeTracker {
            pull_pages: vec![vec![merged(5,), unmerged(4,), merged(3,)], vec![merged(1,)]],
            ..FakeTracker::default()
        };

        let index = collect_merged_pull_numbers(&api, pagination(20,), &Progress::hidden(),)
            .await
            .expect("index should build",);

        assert_eq!(index, HashSet::from([5, 3, 1]));
        assert_eq!(api.pull_calls.get(), 3, "two pages plus the empty terminator");
    }

    #[tokio::test]
    async fn stops_at_page_cutoff_when_pages_never_run_dry()
    {
        let api = FakeTracker {
            pull_pages: vec![vec![merged(1,)]],
            endless: true,
            ..FakeTracker::default()
        };

        collect_merged_pull_numbers(&api, pagination(20,), &Progress::hidden(),)
            .await
            .expect("index should build",);

        assert_eq!(api.pull_calls.get(), 20);
    }

    #[tokio::test]
    async fn empty_listing_yields_empty_index()
    {
        let api = FakeTracker::default();

        let index = collect_merged_pull_numbers(&api, pagination(5,), &Progress::hidden(),)
            .await
            .expect("index should build",);

        assert!(index.is_empty());
        assert_eq!(api.pull_calls.get(), 1);
    }
}
