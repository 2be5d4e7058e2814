// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Tracker records and the GitHub REST client used to fetch them.
///
/// [`TrackerApi`] is the seam between the pipeline and the network: the
/// binary talks to GitHub through [`GithubTracker`], tests drive the pipeline
/// with in-memory pages.
use octocrab::{Octocrab, service::middleware::retry::RetryConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ChangelogConfig, Error};

/// Login shown for records whose author account was deleted.
const GHOST_LOGIN: &str = "ghost";

/// Account reference embedded in issues and pull requests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq,)]
pub struct Account
{
    pub login: String,
}

/// Label attached to an issue.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq,)]
pub struct Label
{
    pub name: String,
}

/// Link object present only on issues that are pull requests.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq,)]
pub struct PullRequestLink
{
    #[serde(default)]
    pub html_url: Option<String,>,
}

/// Closed issue as returned by the issues listing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq,)]
pub struct Issue
{
    pub number:       u64,
    pub title:        String,
    #[serde(default)]
    pub body:         Option<String,>,
    pub html_url:     String,
    #[serde(default)]
    pub closed_at:    Option<String,>,
    #[serde(default)]
    pub user:         Option<Account,>,
    #[serde(default)]
    pub labels:       Vec<Label,>,
    #[serde(default)]
    pub pull_request: Option<PullRequestLink,>,
}

impl Issue
{
    /// Whether the record is a pull request rather than a plain issue.
    pub fn is_pull_request(&self,) -> bool
    {
        self.pull_request
            .as_ref()
            .and_then(|link| link.html_url.as_deref(),)
            .is_some_and(|url| !url.is_empty(),)
    }

    /// Login of the author, or `ghost` when the account no longer exists.
    pub fn author(&self,) -> &str
    {
        self.user.as_ref().map_or(GHOST_LOGIN, |account| account.login.as_str(),)
    }

    /// Description with surrounding whitespace removed; empty when absent.
    pub fn trimmed_body(&self,) -> &str
    {
        self.body.as_deref().map_or("", str::trim,)
    }
}

/// Entry of the closed pull requests listing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq,)]
pub struct PullSummary
{
    pub number:    u64,
    #[serde(default)]
    pub merged_at: Option<String,>,
}

impl PullSummary
{
    pub fn is_merged(&self,) -> bool
    {
        self.merged_at.as_deref().is_some_and(|stamp| !stamp.is_empty(),)
    }
}

/// Detailed pull request carrying merge attribution.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq,)]
pub struct PullDetail
{
    pub number:    u64,
    #[serde(default)]
    pub merged_at: Option<String,>,
    #[serde(default)]
    pub merged_by: Option<Account,>,
}

/// Read access to the tracker used by the changelog pipeline.
///
/// Implementations return an empty page once the listing is exhausted.
/// Every failure is fatal for the run.
#[allow(async_fn_in_trait)]
pub trait TrackerApi
{
    /// One page of closed issues, most recently updated first.
    async fn closed_issues(&self, page: u32,) -> Result<Vec<Issue,>, Error,>;

    /// One page of closed pull requests.
    async fn closed_pulls(&self, page: u32,) -> Result<Vec<PullSummary,>, Error,>;

    /// Merge details of a single pull request.
    async fn pull_detail(&self, number: u64,) -> Result<PullDetail, Error,>;
}

#[derive(Debug, Serialize,)]
struct IssuesQuery
{
    state:     &'static str,
    sort:      &'static str,
    direction: &'static str,
    page:      u32,
    per_page:  u8,
}

#[derive(Debug, Serialize,)]
struct PullsQuery
{
    state:    &'static str,
    page:     u32,
    per_page: u8,
}

/// [`TrackerApi`] backed by the GitHub REST API through octocrab.
///
/// Requests are unauthenticated and issued one at a time. The client's
/// built-in retry layer is switched off, so a failed request fails the run.
#[derive(Clone,)]
pub struct GithubTracker
{
    client:     Octocrab,
    owner:      String,
    repository: String,
    per_page:   u8,
}

impl GithubTracker
{
    /// Builds a client for the repository described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `api_base` is not a valid URI and
    /// [`Error::Network`] when the HTTP client cannot be constructed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::path::Path;
    ///
    /// use prlog::{GithubTracker, load_config};
    ///
    /// # fn example() -> Result<(), prlog::Error> {
    /// let config = load_config(Path::new("changelog.yaml",),)?;
    /// let tracker = GithubTracker::new(&config,)?;
    /// # let _ = tracker;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: &ChangelogConfig,) -> Result<Self, Error,>
    {
        let client = Octocrab::builder()
            .base_uri(config.api_base.as_str(),)
            .map_err(|e| {
                Error::validation(format!("invalid api_base '{}': {e}", config.api_base),)
            },)?
            .add_retry_config(RetryConfig::None,)
            .build()
            .map_err(|source| Error::from_client("GitHub client setup", source,),)?;

        Ok(Self {
            client,
            owner: config.owner.clone(),
            repository: config.repository.clone(),
            per_page: config.pagination.per_page,
        },)
    }

    fn route(&self, suffix: &str,) -> String
    {
        format!("/repos/{}/{}/{suffix}", self.owner, self.repository)
    }
}

impl TrackerApi for GithubTracker
{
    async fn closed_issues(&self, page: u32,) -> Result<Vec<Issue,>, Error,>
    {
        let query = IssuesQuery {
            state: "closed",
            sort: "updated",
            direction: "desc",
            page,
            per_page: self.per_page,
        };
        debug!("GET issues page {} of {}/{}", page, self.owner, self.repository);

        self.client
            .get(self.route("issues",), Some(&query,),)
            .await
            .map_err(|source| Error::from_client(format!("issues page #{page:02}"), source,),)
    }

    async fn closed_pulls(&self, page: u32,) -> Result<Vec<PullSummary,>, Error,>
    {
        let query = PullsQuery {
            state: "closed", page, per_page: self.per_page,
        };
        debug!("GET pulls page {} of {}/{}", page, self.owner, self.repository);

        self.client
            .get(self.route("pulls",), Some(&query,),)
            .await
            .map_err(|source| Error::from_client(format!("pulls page #{page:02}"), source,),)
    }

    async fn pull_detail(&self, number: u64,) -> Result<PullDetail, Error,>
    {
        self.client
            .get(self.route(&format!("pulls/{number}"),), None::<&(),>,)
            .await
            .map_err(|source| Error::from_client(format!("pull #{number}"), source,),)
    }
}

#[cfg(test)]
pub(crate) mod testing
{
    use std::{
        cell::{Cell, RefCell},
        collections::HashMap,
    };

    use super::*;

    /// Scripted tracker serving fixed pages from memory.
    #[derive(Debug, Default,)]
    pub(crate) struct FakeTracker
    {
        pub issue_pages:   Vec<Vec<Issue,>,>,
        pub pull_pages:    Vec<Vec<PullSummary,>,>,
        pub details:       HashMap<u64, PullDetail,>,
        /// Repeat the last page forever instead of running dry.
        pub endless:       bool,
        pub fail_on_issue: Option<u32,>,
        pub issue_calls:   Cell<u32,>,
        pub pull_calls:    Cell<u32,>,
        pub detail_calls:  RefCell<Vec<u64,>,>,
    }

    impl FakeTracker
    {
        fn page<T: Clone,>(&self, pages: &[Vec<T,>], page: u32,) -> Vec<T,>
        {
            let index = (page as usize).saturating_sub(1,);
            match pages.get(index,) {
                Some(items,) => items.clone(),
                None if self.endless => pages.last().cloned().unwrap_or_default(),
                None => Vec::new(),
            }
        }
    }

    impl TrackerApi for FakeTracker
    {
        async fn closed_issues(&self, page: u32,) -> Result<Vec<Issue,>, Error,>
        {
            self.issue_calls.set(self.issue_calls.get() + 1,);
            if self.fail_on_issue == Some(page,) {
                let source = serde_json::from_str::<Vec<Issue,>,>("{",).unwrap_err();
                return Err(Error::parse(format!("issues page #{page:02}"), source,),);
            }
            Ok(self.page(&self.issue_pages, page,),)
        }

        async fn closed_pulls(&self, page: u32,) -> Result<Vec<PullSummary,>, Error,>
        {
            self.pull_calls.set(self.pull_calls.get() + 1,);
            Ok(self.page(&self.pull_pages, page,),)
        }

        async fn pull_detail(&self, number: u64,) -> Result<PullDetail, Error,>
        {
            self.detail_calls.borrow_mut().push(number,);
            Ok(self.details.get(&number,).cloned().unwrap_or(PullDetail {
                number,
                merged_at: Some("2011-11-11T11:11:11Z".to_owned(),),
                merged_by: Some(Account {
                    login: "maintainer".to_owned(),
                },),
            },),)
        }
    }

    /// Merged pull request authored by `login`.
    pub(crate) fn pull(number: u64, login: &str,) -> Issue
    {
        Issue {
            number,
            title: format!("Change {number}"),
            body: None,
            html_url: format!("https://github.com/acme/widgets/pull/{number}"),
            closed_at: Some("2011-10-01T12:00:00Z".to_owned(),),
            user: Some(Account {
                login: login.to_owned(),
            },),
            labels: Vec::new(),
            pull_request: Some(PullRequestLink {
                html_url: Some(format!("https://github.com/acme/widgets/pull/{number}"),),
            },),
        }
    }

    /// Plain issue without a pull request link.
    pub(crate) fn plain_issue(number: u64,) -> Issue
    {
        Issue {
            pull_request: None, ..pull(number, "reporter",)
        }
    }

    pub(crate) fn merged(number: u64,) -> PullSummary
    {
        PullSummary {
            number,
            merged_at: Some("2011-10-01T12:00:00Z".to_owned(),),
        }
    }

    pub(crate) fn unmerged(number: u64,) -> PullSummary
    {
        PullSummary {
            number, merged_at: None,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn issue_deserializes_github_payload()
    {
        let json = r#"{
            "number": 42,
            "title": "Fix the loader",
            "body": "  Some **bold** text  ",
            "html_url": "https://github.com/acme/widgets/pull/42",
            "closed_at": "2011-10-01T12:00:00Z",
            "user": {"login": "alice", "id": 1},
            "labels": [{"name": "bug", "color": "f00"}],
            "pull_request": {"html_url": "https://github.com/acme/widgets/pull/42"},
            "state": "closed"
        }"#;
        let issue: Issue = serde_json::from_str(json,).expect("valid issue",);

        assert_eq!(issue.number, 42);
        assert!(issue.is_pull_request());
        assert_eq!(issue.author(), "alice");
        assert_eq!(issue.trimmed_body(), "Some **bold** text");
        assert_eq!(issue.labels[0].name, "bug");
    }

    #[test]
    fn plain_issue_is_not_a_pull_request()
    {
        let json = r#"{
            "number": 7,
            "title": "Question",
            "body": null,
            "html_url": "https://github.com/acme/widgets/issues/7",
            "closed_at": null,
            "user": null
        }"#;
        let issue: Issue = serde_json::from_str(json,).expect("valid issue",);

        assert!(!issue.is_pull_request());
        assert_eq!(issue.author(), "ghost");
        assert_eq!(issue.trimmed_body(), "");
        assert!(issue.labels.is_empty());
    }

    #[test]
    fn empty_pull_request_link_does_not_count()
    {
        let issue = Issue {
            pull_request: Some(PullRequestLink {
                html_url: Some(String::new(),),
            },),
            ..testing::pull(3, "bob",)
        };
        assert!(!issue.is_pull_request());
    }

    #[test]
    fn pull_summary_merge_state()
    {
        assert!(testing::merged(1).is_merged());
        assert!(!testing::unmerged(2).is_merged());

        let blank = PullSummary {
            number: 3, merged_at: Some(String::new(),),
        };
        assert!(!blank.is_merged());
    }

    #[test]
    fn pull_detail_deserializes_missing_merger()
    {
        let detail: PullDetail =
            serde_json::from_str(r#"{"number": 9, "merged_at": null, "merged_by": null}"#,)
                .expect("valid detail",);
        assert!(detail.merged_by.is_none());
    }

    #[test]
    fn github_tracker_rejects_malformed_api_base()
    {
        let mut config = crate::parse_config(
            "repository: {owner: acme, name: widgets}\nversions:\n  - label: '1.0'\n",
        )
        .expect("valid configuration",);
        config.api_base = "http://exa mple.com".to_owned();

        let Err(error,) = GithubTracker::new(&config,) else {
            panic!("expected malformed api_base to be rejected");
        };
        assert!(matches!(error, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn server_errors_are_not_retried()
    {
        use std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        };

        use tokio::{
            io::{AsyncReadExt, AsyncWriteExt},
            net::TcpListener,
        };

        let listener = TcpListener::bind("127.0.0.1:0",).await.expect("failed to bind listener",);
        let address = listener.local_addr().expect("listener address",);
        let requests = Arc::new(AtomicUsize::new(0,),);
        let counter = Arc::clone(&requests,);

        tokio::spawn(async move {
            while let Ok((mut socket, _,),) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst,);
                let mut buffer = [0_u8; 4096];
                let _ = socket.read(&mut buffer,).await;
                let body = r#"{"message":"Server Error","documentation_url":null}"#;
                let response = format!(
                    "HTTP/1.1 500 Internal Server Error\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes(),).await;
                let _ = socket.shutdown().await;
            }
        },);

        let mut config = crate::parse_config(
            "repository: {owner: acme, name: widgets}\nversions:\n  - label: '1.0'\n",
        )
        .expect("valid configuration",);
        config.api_base = format!("http://{address}");
        let tracker = GithubTracker::new(&config,).expect("client builds",);

        let result = tracker.closed_issues(1,).await;

        assert!(result.is_err());
        assert_eq!(requests.load(Ordering::SeqCst,), 1);
    }

    #[test]
    fn issues_query_serializes_expected_parameters()
    {
        let query = IssuesQuery {
            state: "closed", sort: "updated", direction: "desc", page: 2, per_page: 100,
        };
        let json = serde_json::to_value(&query,).expect("serialization failed",);
        assert_eq!(
            json,
            serde_json::json!({
                "state": "closed",
                "sort": "updated",
                "direction": "desc",
                "page": 2,
                "per_page": 100
            })
        );
    }
}
