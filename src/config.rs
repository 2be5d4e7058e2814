// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Configuration document describing the repository and release layout.
//!
//! The YAML document names the repository to query, the version boundary
//! table and a handful of optional presentation and pagination settings.
//! [`load_config`] and [`parse_config`] validate the document once at
//! startup so the pipeline can rely on the invariants documented on
//! [`ChangelogConfig`] and [`VersionTable`].

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{self, Error};

/// Output path used when the document does not override it.
pub const DEFAULT_OUTPUT: &str = "./docs/changelog.html";
/// Title used for the generated HTML document by default.
pub const DEFAULT_TITLE: &str = "Pull request log";
/// REST endpoint queried when no override is supplied.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
/// Web root used to link contributor profiles.
pub const DEFAULT_WEB_BASE: &str = "https://github.com";
const DEFAULT_PER_PAGE: u8 = 100;
const DEFAULT_PAGE_CUTOFF: u32 = 20;
const MAX_PER_PAGE: u8 = 100;

/// Raw configuration document as written by users.
///
/// # Examples
///
/// ```
/// use prlog::parse_config;
///
/// let yaml = r#"
/// repository:
///   owner: joomla
///   name: joomla-platform
/// versions:
///   - label: "11.4"
///   - label: "11.3"
///     boundary: 310
/// "#;
/// let config = parse_config(yaml,).expect("valid configuration",);
/// assert_eq!(config.versions.len(), 2);
/// ```
#[derive(Debug, Deserialize, Serialize, Clone,)]
pub struct ConfigDocument
{
    /// Repository whose pull requests are collected.
    pub repository: RepositoryConfig,

    /// Ordered version table, most recent release first.
    pub versions: Vec<VersionEntry,>,

    /// Optional document title override.
    #[serde(default)]
    pub title: Option<String,>,

    /// Optional destination path override.
    #[serde(default)]
    pub output: Option<PathBuf,>,

    /// Optional REST endpoint override, e.g. for GitHub Enterprise.
    #[serde(default, alias = "api-base", alias = "apiBase")]
    pub api_base: Option<String,>,

    /// Optional web root used for contributor profile links.
    #[serde(default, alias = "web-base", alias = "webBase")]
    pub web_base: Option<String,>,

    /// Optional pagination overrides.
    #[serde(default)]
    pub pagination: Option<PaginationConfig,>,
}

/// Repository identity.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq,)]
pub struct RepositoryConfig
{
    /// Account or organisation owning the repository.
    #[serde(alias = "user")]
    pub owner: String,
    /// Repository name.
    #[serde(alias = "repo", alias = "repository")]
    pub name:  String,
}

/// A single row of the version boundary table.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq,)]
pub struct VersionEntry
{
    /// Release label rendered as the section heading.
    pub label:    String,
    /// Issue number at which this version starts. Absent for the first row.
    #[serde(default)]
    pub boundary: Option<u64,>,
}

/// Optional pagination overrides.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq,)]
pub struct PaginationConfig
{
    /// Records requested per page.
    #[serde(default, alias = "per-page", alias = "perPage")]
    pub per_page:    Option<u8,>,
    /// Maximum number of pages fetched by each paginated loop.
    #[serde(default, alias = "page-cutoff", alias = "pageCutoff")]
    pub page_cutoff: Option<u32,>,
}

/// Validated pagination settings shared by both paginated loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct Pagination
{
    /// Records requested per page, within `1..=100`.
    pub per_page:    u8,
    /// Runaway guard: maximum number of pages fetched, at least one.
    pub page_cutoff: u32,
}

impl Default for Pagination
{
    fn default() -> Self
    {
        Self {
            per_page: DEFAULT_PER_PAGE, page_cutoff: DEFAULT_PAGE_CUTOFF,
        }
    }
}

/// Ordered version boundary table.
///
/// The first version is current when processing starts. Every later version
/// is entered when its boundary issue number is first observed.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct VersionTable
{
    initial:    String,
    boundaries: Vec<(u64, String,),>,
}

impl VersionTable
{
    /// Label of the most recent version, active before any boundary.
    pub fn initial(&self,) -> &str
    {
        &self.initial
    }

    /// Version entered when `number` is observed, if it is a boundary key.
    pub fn version_at(&self, number: u64,) -> Option<&str,>
    {
        self.boundaries
            .iter()
            .find(|(boundary, _,)| *boundary == number,)
            .map(|(_, label,)| label.as_str(),)
    }

    /// All labels in table order, most recent first.
    pub fn labels(&self,) -> Vec<String,>
    {
        std::iter::once(self.initial.clone(),)
            .chain(self.boundaries.iter().map(|(_, label,)| label.clone(),),)
            .collect()
    }

    /// Number of versions in the table.
    pub fn len(&self,) -> usize
    {
        self.boundaries.len() + 1
    }

    /// A validated table always holds the initial version.
    pub fn is_empty(&self,) -> bool
    {
        false
    }
}

/// Validated configuration consumed by the pipeline and the CLI.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ChangelogConfig
{
    /// Owner of the queried repository.
    pub owner:      String,
    /// Name of the queried repository.
    pub repository: String,
    /// Document title.
    pub title:      String,
    /// Destination of the generated document.
    pub output:     PathBuf,
    /// REST endpoint root.
    pub api_base:   String,
    /// Web root for profile links, without trailing slash.
    pub web_base:   String,
    /// Pagination settings.
    pub pagination: Pagination,
    /// Version boundary table.
    pub versions:   VersionTable,
}

/// Loads and validates the configuration document at `path`.
///
/// # Errors
///
/// Returns [`Error::ConfigIo`] when the file cannot be read, and the errors
/// of [`parse_config`] otherwise.
pub fn load_config(path: &Path,) -> Result<ChangelogConfig, Error,>
{
    let contents =
        fs::read_to_string(path,).map_err(|source| error::config_io_error(path, source,),)?;
    parse_config(&contents,)
}

/// Parses and validates a configuration document.
///
/// # Errors
///
/// Propagates [`Error::ConfigParse`] when the YAML cannot be decoded and
/// [`Error::Validation`] when the document violates an invariant.
pub fn parse_config(contents: &str,) -> Result<ChangelogConfig, Error,>
{
    let document: ConfigDocument = serde_yaml::from_str(contents,)?;
    validate(document,)
}

fn validate(document: ConfigDocument,) -> Result<ChangelogConfig, Error,>
{
    let owner = non_empty(&document.repository.owner, "repository.owner",)?;
    let repository = non_empty(&document.repository.name, "repository.name",)?;
    let versions = build_version_table(&document.versions,)?;
    let pagination = build_pagination(document.pagination,)?;

    let title = document
        .title
        .as_deref()
        .map(str::trim,)
        .filter(|value| !value.is_empty(),)
        .unwrap_or(DEFAULT_TITLE,)
        .to_owned();

    let api_base = document
        .api_base
        .as_deref()
        .map(str::trim,)
        .filter(|value| !value.is_empty(),)
        .unwrap_or(DEFAULT_API_BASE,)
        .to_owned();

    let web_base = document
        .web_base
        .as_deref()
        .map(str::trim,)
        .filter(|value| !value.is_empty(),)
        .unwrap_or(DEFAULT_WEB_BASE,)
        .trim_end_matches('/',)
        .to_owned();

    Ok(ChangelogConfig {
        owner,
        repository,
        title,
        output: document.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT,),),
        api_base,
        web_base,
        pagination,
        versions,
    },)
}

fn non_empty(value: &str, field: &str,) -> Result<String, Error,>
{
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} must not be empty"),),);
    }
    Ok(trimmed.to_owned(),)
}

fn build_version_table(entries: &[VersionEntry],) -> Result<VersionTable, Error,>
{
    let (first, rest,) = entries
        .split_first()
        .ok_or_else(|| Error::validation("versions must include at least one entry",),)?;

    if let Some(boundary,) = first.boundary {
        return Err(Error::validation(format!(
            "the first version is current from the start and cannot declare boundary {boundary}"
        ),),);
    }

    let initial = non_empty(&first.label, "versions[0].label",)?;
    let mut labels = HashSet::with_capacity(entries.len(),);
    labels.insert(initial.clone(),);

    let mut seen_boundaries = HashSet::with_capacity(rest.len(),);
    let mut boundaries = Vec::with_capacity(rest.len(),);

    for (offset, entry,) in rest.iter().enumerate() {
        let index = offset + 1;
        let label = non_empty(&entry.label, &format!("versions[{index}].label"),)?;
        let boundary = entry.boundary.ok_or_else(|| {
            Error::validation(format!("version '{label}' must declare a boundary issue number"),)
        },)?;

        if !labels.insert(label.clone(),) {
            return Err(Error::validation(format!("version '{label}' is declared twice"),),);
        }
        if !seen_boundaries.insert(boundary,) {
            return Err(Error::validation(format!(
                "boundary {boundary} is used by more than one version"
            ),),);
        }

        boundaries.push((boundary, label,),);
    }

    Ok(VersionTable {
        initial,
        boundaries,
    },)
}

fn build_pagination(overrides: Option<PaginationConfig,>,) -> Result<Pagination, Error,>
{
    let defaults = Pagination::default();
    let Some(overrides,) = overrides else {
        return Ok(defaults,);
    };

    let per_page = overrides.per_page.unwrap_or(defaults.per_page,);
    if per_page == 0 || per_page > MAX_PER_PAGE {
        return Err(Error::validation(format!(
            "pagination.per_page must be between 1 and {MAX_PER_PAGE}, got {per_page}"
        ),),);
    }

    let page_cutoff = overrides.page_cutoff.unwrap_or(defaults.page_cutoff,);
    if page_cutoff == 0 {
        return Err(Error::validation("pagination.page_cutoff must be at least 1",),);
    }

    Ok(Pagination {
        per_page,
        page_cutoff,
    },)
}
