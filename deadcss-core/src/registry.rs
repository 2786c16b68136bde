//! The shared rule registry.
//!
//! Every page worker registers the atomic selectors it encounters here and
//! claims usage when its page contains a match. Two guarantees hold under
//! any number of concurrent workers:
//!
//! - **Insert-once**: a [`RuleKey`] maps to exactly one canonical [`Rule`];
//!   later candidates with the same key are discarded in favour of it.
//! - **Claim-once**: a rule's usage URL goes from absent to present at most
//!   once. The first claimant wins, everyone else observes it as used.
//!
//! Identity is immutable and lives in the map key. The usage slot is a
//! separate `OnceLock`, so marking a rule used never touches the map.
//! The map is split into shards by key hash; a worker only ever locks the
//! shard of the rule it is touching, and claims take no map lock at all.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Number of independently locked shards.
const SHARD_COUNT: usize = 32;

/// Label printed for stylesheets that have no URL.
pub const INLINE_LABEL: &str = "<inline>";

/// Identity of a rule: owning stylesheet and atomic selector text.
///
/// Ordering sorts by stylesheet first (inline, `None`, before any URL),
/// then by selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleKey {
    pub stylesheet: Option<String>,
    pub selector: String,
}

impl RuleKey {
    pub fn new(stylesheet: Option<&str>, selector: impl Into<String>) -> Self {
        Self {
            stylesheet: stylesheet.map(str::to_string),
            selector: selector.into(),
        }
    }

    /// Stylesheet URL, or [`INLINE_LABEL`].
    pub fn stylesheet_label(&self) -> &str {
        self.stylesheet.as_deref().unwrap_or(INLINE_LABEL)
    }
}

/// Usage status of one atomic selector within one stylesheet.
#[derive(Debug)]
pub struct Rule {
    key: RuleKey,
    query_text: String,
    rule_text: String,
    used_on: OnceLock<String>,
}

impl Rule {
    /// Build an unused rule.
    ///
    /// `query_text` is the normalized selector matched against documents,
    /// `rule_text` the full selector list of the style rule it came from.
    pub fn new(key: RuleKey, query_text: impl Into<String>, rule_text: impl Into<String>) -> Self {
        Self {
            key,
            query_text: query_text.into(),
            rule_text: rule_text.into(),
            used_on: OnceLock::new(),
        }
    }

    pub fn key(&self) -> &RuleKey {
        &self.key
    }

    pub fn selector(&self) -> &str {
        &self.key.selector
    }

    pub fn stylesheet(&self) -> Option<&str> {
        self.key.stylesheet.as_deref()
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn rule_text(&self) -> &str {
        &self.rule_text
    }

    /// First page URL observed to contain a matching element.
    pub fn used_on(&self) -> Option<&str> {
        self.used_on.get().map(String::as_str)
    }

    pub fn is_used(&self) -> bool {
        self.used_on.get().is_some()
    }

    /// Record that `url` contains a match.
    ///
    /// Returns `true` only for the single caller whose claim was stored.
    pub fn claim(&self, url: &str) -> bool {
        self.used_on.set(url.to_string()).is_ok()
    }

    /// Serializable snapshot of this rule.
    pub fn to_record(&self) -> RuleRecord {
        RuleRecord {
            stylesheet: self.key.stylesheet.clone(),
            selector: self.key.selector.clone(),
            query: self.query_text.clone(),
            rule_text: self.rule_text.clone(),
            used_on: self.used_on().map(str::to_string),
        }
    }
}

/// Plain-data view of a [`Rule`], as written to reports and dumps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Stylesheet URL; `null` for inline stylesheets
    pub stylesheet: Option<String>,
    /// Atomic selector as written
    pub selector: String,
    /// Selector actually matched against pages
    pub query: String,
    /// Full selector list of the declaring style rule
    pub rule_text: String,
    /// First page containing a match; `null` when unused
    pub used_on: Option<String>,
}

impl RuleRecord {
    pub fn is_used(&self) -> bool {
        self.used_on.is_some()
    }

    pub fn stylesheet_label(&self) -> &str {
        self.stylesheet.as_deref().unwrap_or(INLINE_LABEL)
    }
}

type Shard = RwLock<HashMap<RuleKey, Arc<Rule>>>;

/// Concurrent insert-once map from [`RuleKey`] to canonical [`Rule`].
pub struct RuleRegistry {
    shards: Vec<Shard>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, key: &RuleKey) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shards.len()]
    }

    /// Return the canonical rule for `candidate`'s key, inserting
    /// `candidate` if the key is new.
    ///
    /// Lock poisoning is ignored: every mutation under the lock is a single
    /// `HashMap` insert, so a panicking holder cannot leave it half-written.
    pub fn get_or_insert(&self, candidate: Rule) -> Arc<Rule> {
        let shard = self.shard(&candidate.key);

        if let Some(existing) = shard
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&candidate.key)
        {
            return Arc::clone(existing);
        }

        let mut map = shard.write().unwrap_or_else(PoisonError::into_inner);
        // Re-check under the write lock: another worker may have won
        Arc::clone(
            map.entry(candidate.key.clone())
                .or_insert_with(|| Arc::new(candidate)),
        )
    }

    /// Look up a rule by identity.
    pub fn get(&self, key: &RuleKey) -> Option<Arc<Rule>> {
        self.shard(key)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Total number of distinct rules.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.read().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot all rules, sorted by stylesheet then selector.
    pub fn records(&self) -> Vec<RuleRecord> {
        let mut records: Vec<RuleRecord> = self
            .shards
            .iter()
            .flat_map(|s| {
                s.read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .map(|r| r.to_record())
                    .collect::<Vec<_>>()
            })
            .collect();
        sort_records(&mut records);
        records
    }

    /// Snapshot unused rules, sorted by stylesheet then selector.
    pub fn unused(&self) -> Vec<RuleRecord> {
        self.records().into_iter().filter(|r| !r.is_used()).collect()
    }
}

/// Sort records ascending by stylesheet (inline first), then selector.
pub fn sort_records(records: &mut [RuleRecord]) {
    records.sort_by(|a, b| {
        a.stylesheet
            .cmp(&b.stylesheet)
            .then_with(|| a.selector.cmp(&b.selector))
    });
}
