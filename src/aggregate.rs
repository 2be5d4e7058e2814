// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Per-version accumulators collected while walking the issue stream.
//!
//! Every version owns four buffers, addressed by a [`BufferKey`]: the ordered
//! log of rendered entries, entries grouped by label, pull counts per author
//! and merge counts per maintainer. Groups and tallies remember insertion
//! order so rendering is deterministic.

use std::{borrow::Cow, collections::HashMap};

/// Counter keyed by login that preserves first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct Tally
{
    entries: Vec<(String, u32,),>,
}

impl Tally
{
    /// Adds one to the count of `login`, registering it on first sight.
    pub fn increment(&mut self, login: &str,)
    {
        match self.entries.iter_mut().find(|(known, _,)| known == login,) {
            Some((_, count,),) => *count += 1,
            None => self.entries.push((login.to_owned(), 1,),),
        }
    }

    /// Current count of `login`, zero when unseen.
    pub fn count(&self, login: &str,) -> u32
    {
        self.entries.iter().find(|(known, _,)| known == login,).map_or(0, |(_, count,)| *count,)
    }

    /// Sum of all counts.
    pub fn total(&self,) -> u32
    {
        self.entries.iter().map(|(_, count,)| count,).sum()
    }

    pub fn len(&self,) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self,) -> bool
    {
        self.entries.is_empty()
    }

    /// Entries sorted by count descending; equal counts keep insertion order.
    ///
    /// # Examples
    ///
    /// ```
    /// use prlog::Tally;
    ///
    /// let mut tally = Tally::default();
    /// for login in ["a", "a", "a", "b", "b", "b", "c", "c", "c", "c", "c"] {
    ///     tally.increment(login,);
    /// }
    /// assert_eq!(tally.ranked(), vec![("c", 5), ("a", 3), ("b", 3)]);
    /// ```
    pub fn ranked(&self,) -> Vec<(&str, u32,),>
    {
        let mut ranked: Vec<(&str, u32,),> =
            self.entries.iter().map(|(login, count,)| (login.as_str(), *count,),).collect();
        ranked.sort_by(|left, right| right.1.cmp(&left.1,),);
        ranked
    }
}

/// Rendered entries grouped by label name, in first-seen label order.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct LabelGroups
{
    groups: Vec<(String, Vec<String,>,),>,
}

impl LabelGroups
{
    /// Appends `entry` to the group of `label`.
    pub fn push(&mut self, label: &str, entry: String,)
    {
        match self.groups.iter_mut().find(|(name, _,)| name == label,) {
            Some((_, entries,),) => entries.push(entry,),
            None => self.groups.push((label.to_owned(), vec![entry],),),
        }
    }

    /// Groups in first-seen order.
    pub fn iter(&self,) -> impl Iterator<Item = (&str, &[String],),>
    {
        self.groups.iter().map(|(name, entries,)| (name.as_str(), entries.as_slice(),),)
    }

    pub fn len(&self,) -> usize
    {
        self.groups.len()
    }

    pub fn is_empty(&self,) -> bool
    {
        self.groups.is_empty()
    }
}

/// All accumulators of a single version.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct VersionBucket
{
    /// Rendered log entries in processing order.
    pub log:         Vec<String,>,
    /// Link entries grouped by label.
    pub labelled:    LabelGroups,
    /// Pull requests per author.
    pub user_counts: Tally,
    /// Merges per maintainer.
    pub merged_by:   Tally,
}

impl VersionBucket
{
    /// Number of pull requests recorded for the version.
    pub fn pull_count(&self,) -> usize
    {
        self.log.len()
    }
}

/// Which accumulator of a version a buffer refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash,)]
pub enum BufferKind
{
    Log,
    Labelled,
    UserCount,
    MergedBy,
}

/// Structured buffer address: version label plus accumulator kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash,)]
pub struct BufferKey
{
    pub version: String,
    pub kind:    BufferKind,
}

impl BufferKey
{
    pub fn new(version: impl Into<String,>, kind: BufferKind,) -> Self
    {
        Self {
            version: version.into(),
            kind,
        }
    }
}

/// Value stored in, or read from, a buffer.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub enum BufferValue
{
    /// A single rendered log entry.
    Entry(String,),
    /// A whole log.
    Entries(Vec<String,>,),
    /// Label groups.
    Labelled(LabelGroups,),
    /// A user or merger tally.
    Counts(Tally,),
}

/// Named store of per-version buffers.
#[derive(Debug, Clone, Default,)]
pub struct Aggregator
{
    buckets: HashMap<String, VersionBucket,>,
}

impl Aggregator
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Writes `value` into the buffer addressed by `key`.
    ///
    /// A single [`BufferValue::Entry`] is appended to the log when `append`
    /// is set and replaces it otherwise. Composite values always replace the
    /// buffer outright. Returns `false`, leaving the store untouched, when
    /// the value does not fit the buffer kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use prlog::{Aggregator, BufferKey, BufferKind, BufferValue};
    ///
    /// let mut aggregator = Aggregator::new();
    /// let key = BufferKey::new("11.4", BufferKind::Log,);
    /// aggregator.set_buffer(&key, BufferValue::Entry("first".into(),), true,);
    /// aggregator.set_buffer(&key, BufferValue::Entry("second".into(),), true,);
    /// assert_eq!(
    ///     aggregator.get_buffer(&key,),
    ///     BufferValue::Entries(vec!["first".into(), "second".into()],)
    /// );
    /// ```
    pub fn set_buffer(&mut self, key: &BufferKey, value: BufferValue, append: bool,) -> bool
    {
        let fits = matches!(
            (key.kind, &value,),
            (BufferKind::Log, BufferValue::Entry(_,) | BufferValue::Entries(_,),)
                | (BufferKind::Labelled, BufferValue::Labelled(_,),)
                | (BufferKind::UserCount | BufferKind::MergedBy, BufferValue::Counts(_,),)
        );
        if !fits {
            return false;
        }

        let bucket = self.buckets.entry(key.version.clone(),).or_default();
        match value {
            BufferValue::Entry(entry,) if append => bucket.log.push(entry,),
            BufferValue::Entry(entry,) => bucket.log = vec![entry],
            BufferValue::Entries(entries,) => bucket.log = entries,
            BufferValue::Labelled(groups,) => bucket.labelled = groups,
            BufferValue::Counts(tally,) if key.kind == BufferKind::UserCount => {
                bucket.user_counts = tally;
            }
            BufferValue::Counts(tally,) => bucket.merged_by = tally,
        }
        true
    }

    /// Reads the buffer addressed by `key`, or an empty value when absent.
    pub fn get_buffer(&self, key: &BufferKey,) -> BufferValue
    {
        let bucket = self.bucket(&key.version,);
        match key.kind {
            BufferKind::Log => BufferValue::Entries(bucket.log.clone(),),
            BufferKind::Labelled => BufferValue::Labelled(bucket.labelled.clone(),),
            BufferKind::UserCount => BufferValue::Counts(bucket.user_counts.clone(),),
            BufferKind::MergedBy => BufferValue::Counts(bucket.merged_by.clone(),),
        }
    }

    /// All buffers of `version`, or an empty bucket when nothing was stored.
    pub fn bucket(&self, version: &str,) -> Cow<'_, VersionBucket,>
    {
        match self.buckets.get(version,) {
            Some(bucket,) => Cow::Borrowed(bucket,),
            None => Cow::Owned(VersionBucket::default(),),
        }
    }

    /// Whether anything was stored for `version`.
    pub fn contains(&self, version: &str,) -> bool
    {
        self.buckets.contains_key(version,)
    }
}
