//! Per-run cache of match reports keyed by match id.
//!
//! Many players reference the same match, and a report is expensive to fetch.
//! Concurrent requests for one match id wait on a single in-flight fetch, and a
//! match id whose fetch failed is not requested again.

use once_cell::sync::OnceCell;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    error::FetchError,
    match_report::extract_goal_events_with,
    types::{GoalEvent, MatchDocument},
    vocabulary::Vocabulary,
};

/// A fetched match report with its goal events, extracted once.
#[derive(Debug)]
pub struct CachedMatch {
    pub document: MatchDocument,
    pub goals: Vec<GoalEvent>,
}

impl CachedMatch {
    pub fn from_markup(raw: &str, vocabulary: &Vocabulary) -> Result<Self, FetchError> {
        let document = MatchDocument::new(raw)?;
        let goals = extract_goal_events_with(&document, vocabulary);
        Ok(Self { document, goals })
    }
}

#[derive(Default)]
pub struct MatchCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<Arc<CachedMatch>>>>>,
    failures: Mutex<HashMap<String, String>>,
    vocabulary: Vocabulary,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vocabulary(vocabulary: Vocabulary) -> Self {
        Self {
            entries: Mutex::default(),
            failures: Mutex::default(),
            vocabulary,
        }
    }

    /// Returns the cached report for `match_id`, calling `fetch` at most once
    /// per id. After a failed fetch every later call returns
    /// [`FetchError::PreviouslyFailed`] without calling `fetch`.
    pub fn get_or_fetch<F>(&self, match_id: &str, fetch: F) -> Result<Arc<CachedMatch>, FetchError>
    where
        F: FnOnce() -> Result<String, FetchError>,
    {
        let cell = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(match_id.to_string()).or_default())
        };
        // Waiters on a failed init run this closure in turn, so the failure
        // check happens under the cell's lock.
        cell.get_or_try_init(|| {
            if let Some(reason) = self.failure(match_id) {
                return Err(FetchError::PreviouslyFailed {
                    match_id: match_id.to_string(),
                    reason,
                });
            }
            let result = fetch().and_then(|raw| CachedMatch::from_markup(&raw, &self.vocabulary));
            match result {
                Ok(entry) => Ok(Arc::new(entry)),
                Err(e) => {
                    let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
                    failures.insert(match_id.to_string(), e.to_string());
                    Err(e)
                }
            }
        })
        .map(Arc::clone)
    }

    /// Error message of the failed fetch for `match_id`, if any.
    pub fn failure(&self, match_id: &str) -> Option<String> {
        let failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        failures.get(match_id).cloned()
    }

    /// Number of match ids whose fetch failed.
    pub fn failed_len(&self) -> usize {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn get(&self, match_id: &str) -> Option<Arc<CachedMatch>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(match_id).and_then(|cell| cell.get().cloned())
    }

    /// Number of match ids with a successfully fetched report.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|cell| cell.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
