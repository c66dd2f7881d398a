//! Key-addressed cache of fetched query results.
//!
//! Keys render as `<family>[?params|/id]`, so a family name is a valid
//! invalidation prefix for every key in that family. Entries are never
//! dropped for being old: a stale entry stops satisfying [`QueryCache::read`]
//! but stays available through [`QueryCache::peek`] until it is overwritten.

use std::fmt;

use itertools::Itertools;
use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use moka::Entry;
use strum::Display;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::domain::models::{FilterCriteria, ProjectId};

/// Kind of data a cache key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum QueryFamily {
    List,
    Project,
    Summary,
}

impl QueryFamily {
    pub fn prefix(self) -> String {
        self.to_string()
    }
}

/// Composite of entity kind, filter parameters and entity id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    family: QueryFamily,
    rendered: String,
}

impl QueryKey {
    /// Key for a filtered list. Equivalent criteria render identically.
    pub fn list(criteria: &FilterCriteria) -> Self {
        let params = list_params(criteria);
        let rendered = if params.is_empty() {
            QueryFamily::List.prefix()
        } else {
            format!("{}?{}", QueryFamily::List, params)
        };
        Self {
            family: QueryFamily::List,
            rendered,
        }
    }

    pub fn project(id: ProjectId) -> Self {
        Self {
            family: QueryFamily::Project,
            rendered: format!("{}/{}", QueryFamily::Project, id),
        }
    }

    pub fn summary() -> Self {
        Self {
            family: QueryFamily::Summary,
            rendered: QueryFamily::Summary.prefix(),
        }
    }

    pub fn family(&self) -> QueryFamily {
        self.family
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

fn list_params(criteria: &FilterCriteria) -> String {
    let mut params = Vec::new();

    if let Some(statuses) = criteria.status.as_ref().filter(|s| !s.is_empty()) {
        let joined = statuses
            .iter()
            .sorted()
            .dedup()
            .map(|s| format!("{s:?}"))
            .join(",");
        params.push(format!("status={joined}"));
    }
    if let Some(priorities) = criteria.priority.as_ref().filter(|p| !p.is_empty()) {
        let joined = priorities.iter().sorted().dedup().join(",");
        params.push(format!("priority={joined}"));
    }
    if let Some(owner) = criteria.owner_term().map(str::to_lowercase) {
        params.push(format!("owner={owner}"));
    }
    if let Some(search) = criteria.search_term().map(str::to_lowercase) {
        params.push(format!("search={search}"));
    }
    if let Some(from) = criteria.start_from {
        params.push(format!("from={from}"));
    }
    if let Some(to) = criteria.start_to {
        params.push(format!("to={to}"));
    }
    let tags = criteria.tag_terms();
    if !tags.is_empty() {
        let joined = tags
            .iter()
            .map(|t| t.to_lowercase())
            .sorted()
            .dedup()
            .join(",");
        params.push(format!("tags={joined}"));
    }

    params.join("&")
}

/// Freshness thresholds and capacity for [`QueryCache`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryCacheConfig {
    pub list_ttl: Duration,
    pub project_ttl: Duration,
    pub summary_ttl: Duration,
    pub max_capacity: u64,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            list_ttl: Duration::minutes(5),
            project_ttl: Duration::minutes(2),
            summary_ttl: Duration::minutes(5),
            max_capacity: 1_000,
        }
    }
}

impl QueryCacheConfig {
    pub fn ttl_for(&self, family: QueryFamily) -> Duration {
        match family {
            QueryFamily::List => self.list_ttl,
            QueryFamily::Project => self.project_ttl,
            QueryFamily::Summary => self.summary_ttl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: OffsetDateTime,
    pub invalidated: bool,
}

impl<V> CacheEntry<V> {
    pub fn is_fresh(&self, ttl: Duration, now: OffsetDateTime) -> bool {
        !self.invalidated && now - self.stored_at <= ttl
    }
}

#[derive(Clone)]
pub struct QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    entries: Cache<String, CacheEntry<V>>,
    config: QueryCacheConfig,
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: QueryCacheConfig) -> Self {
        Self {
            entries: Cache::new(config.max_capacity),
            config,
        }
    }

    pub fn config(&self) -> &QueryCacheConfig {
        &self.config
    }

    /// The cached value if it is still fresh. `None` means refetch.
    pub fn read(&self, key: &QueryKey) -> Option<V> {
        self.read_at(key, OffsetDateTime::now_utc())
    }

    pub fn read_at(&self, key: &QueryKey, now: OffsetDateTime) -> Option<V> {
        let entry = self.entries.get(key.as_str())?;
        if entry.is_fresh(self.config.ttl_for(key.family()), now) {
            Some(entry.value)
        } else {
            debug!(key = %key, "cache entry stale");
            None
        }
    }

    /// The entry regardless of freshness.
    pub fn peek(&self, key: &QueryKey) -> Option<CacheEntry<V>> {
        self.entries.get(key.as_str())
    }

    /// Store `value`, overwriting any previous entry and its stale mark.
    pub fn write(&self, key: &QueryKey, value: V) {
        self.write_at(key, value, OffsetDateTime::now_utc());
    }

    pub fn write_at(&self, key: &QueryKey, value: V, now: OffsetDateTime) {
        self.entries.insert(
            key.as_str().to_string(),
            CacheEntry {
                value,
                stored_at: now,
                invalidated: false,
            },
        );
    }

    /// Mark every entry whose key starts with `prefix` as stale.
    ///
    /// Each entry is flagged in place under its key's lock, so a concurrent
    /// `write` is never replaced by the older value. Returns the number of
    /// entries newly marked.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| (*key).clone())
            .collect();

        let count = keys
            .into_iter()
            .filter(|key| {
                let result = self.entries.entry(key.clone()).and_compute_with(|current| {
                    match current.map(Entry::into_value) {
                        Some(mut entry) if !entry.invalidated => {
                            entry.invalidated = true;
                            Op::Put(entry)
                        }
                        _ => Op::Nop,
                    }
                });
                matches!(result, CompResult::ReplacedWith(_))
            })
            .count();

        debug!(prefix, count, "cache entries invalidated");
        count
    }

    pub fn invalidate_family(&self, family: QueryFamily) -> usize {
        self.invalidate(&family.prefix())
    }

    pub fn remove(&self, key: &QueryKey) {
        self.entries.invalidate(key.as_str());
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Priority, StatusCode};
    use time::macros::datetime;

    fn cache() -> QueryCache<&'static str> {
        QueryCache::new(QueryCacheConfig::default())
    }

    #[test]
    fn unfiltered_list_key_is_family_name() {
        assert_eq!(QueryKey::list(&FilterCriteria::default()).as_str(), "list");
        assert_eq!(QueryKey::project(ProjectId::new(7)).as_str(), "project/7");
        assert_eq!(QueryKey::summary().as_str(), "summary");
    }

    #[test]
    fn equivalent_criteria_share_a_key() {
        let a = FilterCriteria::default()
            .with_status([StatusCode::Completed, StatusCode::InProgress])
            .with_owner(" Alex ")
            .with_tags(["HR", "intranet"]);
        let b = FilterCriteria::default()
            .with_status([StatusCode::InProgress, StatusCode::Completed, StatusCode::InProgress])
            .with_owner("alex")
            .with_tags(["Intranet", "hr"]);

        assert_eq!(QueryKey::list(&a), QueryKey::list(&b));
        assert_eq!(
            QueryKey::list(&a).as_str(),
            "list?status=InProgress,Completed&owner=alex&tags=hr,intranet"
        );
    }

    #[test]
    fn key_follows_the_filter_predicate() {
        let plain = FilterCriteria::default().with_tags(["hr"]);
        let padded = FilterCriteria::default().with_tags([" HR ", ""]);
        assert_eq!(QueryKey::list(&plain), QueryKey::list(&padded));

        let blank = FilterCriteria::default()
            .with_owner("  ")
            .with_search("")
            .with_tags([" "]);
        assert_eq!(QueryKey::list(&blank).as_str(), "list");

        let owner = FilterCriteria::default().with_owner(" Sam ").with_search(" Portal");
        assert_eq!(QueryKey::list(&owner).as_str(), "list?owner=sam&search=portal");
    }

    #[test]
    fn different_criteria_get_different_keys() {
        let a = FilterCriteria::default().with_priority([Priority::High]);
        let b = FilterCriteria::default().with_priority([Priority::Low]);
        assert_ne!(QueryKey::list(&a), QueryKey::list(&b));
    }

    #[test]
    fn fresh_entry_is_returned() {
        let cache = cache();
        let key = QueryKey::summary();
        let now = datetime!(2024-05-01 10:00 UTC);

        cache.write_at(&key, "cached", now);

        assert_eq!(cache.read_at(&key, now + Duration::minutes(5)), Some("cached"));
    }

    #[test]
    fn thresholds_differ_per_family() {
        let cache = cache();
        let list = QueryKey::list(&FilterCriteria::default());
        let record = QueryKey::project(ProjectId::new(1));
        let now = datetime!(2024-05-01 10:00 UTC);

        cache.write_at(&list, "list", now);
        cache.write_at(&record, "record", now);

        let later = now + Duration::minutes(3);
        assert_eq!(cache.read_at(&list, later), Some("list"));
        assert_eq!(cache.read_at(&record, later), None);

        let much_later = now + Duration::minutes(6);
        assert_eq!(cache.read_at(&list, much_later), None);
    }

    #[test]
    fn invalidate_marks_prefix_stale_regardless_of_age() {
        let cache = cache();
        let now = OffsetDateTime::now_utc();
        let all = QueryKey::list(&FilterCriteria::default());
        let filtered = QueryKey::list(&FilterCriteria::default().with_search("portal"));
        let record = QueryKey::project(ProjectId::new(3));

        cache.write_at(&all, "all", now);
        cache.write_at(&filtered, "filtered", now);
        cache.write_at(&record, "record", now);

        assert_eq!(cache.invalidate("list"), 2);

        assert_eq!(cache.read_at(&all, now), None);
        assert_eq!(cache.read_at(&filtered, now), None);
        assert_eq!(cache.read_at(&record, now), Some("record"));
    }

    #[test]
    fn stale_entry_stays_peekable_until_overwritten() {
        let cache = cache();
        let key = QueryKey::list(&FilterCriteria::default());
        cache.write(&key, "old");
        cache.invalidate_family(QueryFamily::List);

        let entry = cache.peek(&key).unwrap();
        assert_eq!(entry.value, "old");
        assert!(entry.invalidated);

        cache.write(&key, "new");
        assert_eq!(cache.read(&key), Some("new"));
    }

    #[test]
    fn concurrent_invalidate_never_reverts_a_write() {
        let cache: QueryCache<usize> = QueryCache::new(QueryCacheConfig::default());
        let key = QueryKey::list(&FilterCriteria::default());
        cache.write(&key, 0);

        for round in 1..=200 {
            std::thread::scope(|s| {
                s.spawn(|| cache.invalidate("list"));
                s.spawn(|| cache.write(&key, round));
            });
            assert_eq!(cache.peek(&key).unwrap().value, round);
        }
    }

    #[test]
    fn remove_and_clear_drop_entries() {
        let cache = cache();
        let a = QueryKey::project(ProjectId::new(1));
        let b = QueryKey::project(ProjectId::new(2));
        cache.write(&a, "a");
        cache.write(&b, "b");

        cache.remove(&a);
        assert!(cache.peek(&a).is_none());
        assert_eq!(cache.read(&b), Some("b"));

        cache.clear();
        assert!(cache.peek(&b).is_none());
    }
}
