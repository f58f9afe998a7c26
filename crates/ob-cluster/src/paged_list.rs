//! Paged-list coordinator (§2 C11, §4.6): per-`list_uuid` buffer of
//! per-target pages, merged/sorted/deduped into a single globally ordered
//! stream, plus an optional `(bucket, prefix)` cache.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjEntry {
    pub name: String,
    pub atime: DateTime<Utc>,
    pub version: Option<String>,
    pub size: u64,
}

struct ListBuffer {
    per_target: HashMap<String, VecDeque<ObjEntry>>,
    last_token: HashMap<String, String>,
    /// Targets that returned fewer entries than requested, i.e. have no
    /// more to give (§8 "final page returning an empty token").
    exhausted: HashSet<String>,
}

impl ListBuffer {
    fn new() -> Self {
        Self {
            per_target: HashMap::new(),
            last_token: HashMap::new(),
            exhausted: HashSet::new(),
        }
    }

    fn known_targets(&self) -> HashSet<String> {
        self.per_target.keys().cloned().collect()
    }
}

#[derive(Debug)]
pub enum PageOutcome {
    Page {
        entries: Vec<ObjEntry>,
        continuation_token: String,
    },
    /// The buffer doesn't have enough material below the safe horizon; the
    /// caller must broadcast a fresh `ListObjsMsg` starting at `from_token`
    /// (§4.6 "else triggers a fresh broadcast").
    NeedsBroadcast { from_token: String },
}

pub struct PagedListCoordinator {
    buffers: HashMap<String, ListBuffer>,
    /// `(bucket, prefix)` → page-size-aligned blocks with all properties
    /// (§3 "Paged-list buffers and cache", §4.6 "Caching").
    cache: HashMap<(String, String), Vec<ObjEntry>>,
}

impl Default for PagedListCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl PagedListCoordinator {
    pub fn new() -> Self {
        Self {
            buffers: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    /// Registers one target's response page for `list_uuid`. `exhausted`
    /// is true when the target returned fewer entries than the requested
    /// page size, meaning it has nothing left.
    pub fn ingest_page(
        &mut self,
        list_uuid: &str,
        target_id: &str,
        entries: Vec<ObjEntry>,
        last_token: String,
        exhausted: bool,
    ) {
        let buffer = self.buffers.entry(list_uuid.to_string()).or_insert_with(ListBuffer::new);
        let queue = buffer.per_target.entry(target_id.to_string()).or_default();
        queue.extend(entries);
        buffer.last_token.insert(target_id.to_string(), last_token);
        if exhausted {
            buffer.exhausted.insert(target_id.to_string());
        }
    }

    /// `get(list_uuid, token, pageSize)` (§4.6 "Merge"). The safe horizon is
    /// the minimum `last_token` across all targets that have reported but
    /// are not yet exhausted — entries beyond it might still be
    /// reshuffled by a not-yet-seen page, so they're withheld.
    pub fn get(&self, list_uuid: &str, token: &str, page_size: usize, expected_targets: &[String]) -> PageOutcome {
        let Some(buffer) = self.buffers.get(list_uuid) else {
            return PageOutcome::NeedsBroadcast {
                from_token: token.to_string(),
            };
        };

        let known = buffer.known_targets();
        if expected_targets.iter().any(|t| !known.contains(t)) {
            return PageOutcome::NeedsBroadcast {
                from_token: token.to_string(),
            };
        }

        let all_exhausted = expected_targets.iter().all(|t| buffer.exhausted.contains(t));
        let horizon = buffer
            .last_token
            .iter()
            .filter(|(id, _)| !buffer.exhausted.contains(*id))
            .map(|(_, tok)| tok.clone())
            .min();

        let mut merged: BTreeMap<String, ObjEntry> = BTreeMap::new();
        for queue in buffer.per_target.values() {
            for entry in queue {
                if entry.name.as_str() <= token {
                    continue;
                }
                if let Some(h) = &horizon {
                    if entry.name.as_str() > h.as_str() {
                        continue;
                    }
                }
                merged
                    .entry(entry.name.clone())
                    .and_modify(|existing| {
                        if entry.atime > existing.atime {
                            *existing = entry.clone();
                        }
                    })
                    .or_insert_with(|| entry.clone());
            }
        }

        let entries: Vec<ObjEntry> = merged.into_values().collect();

        if entries.len() >= page_size {
            let page: Vec<ObjEntry> = entries.into_iter().take(page_size).collect();
            let continuation_token = page.last().map(|e| e.name.clone()).unwrap_or_default();
            return PageOutcome::Page { entries: page, continuation_token };
        }

        if all_exhausted {
            return PageOutcome::Page {
                entries,
                continuation_token: String::new(),
            };
        }

        PageOutcome::NeedsBroadcast {
            from_token: horizon.unwrap_or_else(|| token.to_string()),
        }
    }

    pub fn invalidate(&mut self, bucket: &str, prefix: &str) {
        self.cache.remove(&(bucket.to_string(), prefix.to_string()));
    }

    pub fn cache_put(&mut self, bucket: &str, prefix: &str, entries: Vec<ObjEntry>) {
        self.cache.insert((bucket.to_string(), prefix.to_string()), entries);
    }

    pub fn cache_get(&self, bucket: &str, prefix: &str) -> Option<&Vec<ObjEntry>> {
        self.cache.get(&(bucket.to_string(), prefix.to_string()))
    }

    pub fn drop_list(&mut self, list_uuid: &str) {
        self.buffers.remove(list_uuid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ObjEntry {
        ObjEntry {
            name: name.to_string(),
            atime: Utc::now(),
            version: None,
            size: 0,
        }
    }

    #[test]
    fn scans_a_hundred_objects_across_three_targets_in_order_without_duplicates() {
        let mut coordinator = PagedListCoordinator::new();
        let targets = vec!["T1".to_string(), "T2".to_string(), "T3".to_string()];
        let mut names: Vec<String> = (0..100).map(|i| format!("obj{:03}", i)).collect();
        names.sort();

        for (idx, chunk) in names.chunks(34).enumerate() {
            let target = &targets[idx % targets.len()];
            let entries: Vec<ObjEntry> = chunk.iter().map(|n| entry(n)).collect();
            let last_token = chunk.last().cloned().unwrap_or_default();
            coordinator.ingest_page("list-1", target, entries, last_token, true);
        }
        // the other targets need at least one ingest to be "known"
        for target in &targets {
            coordinator
                .buffers
                .entry("list-1".to_string())
                .or_insert_with(ListBuffer::new);
            coordinator
                .buffers
                .get_mut("list-1")
                .unwrap()
                .per_target
                .entry(target.clone())
                .or_default();
        }

        let mut token = String::new();
        let mut pages = 0;
        let mut seen = HashSet::new();
        loop {
            match coordinator.get("list-1", &token, 10, &targets) {
                PageOutcome::Page { entries, continuation_token } => {
                    for e in &entries {
                        assert!(seen.insert(e.name.clone()), "duplicate entry {}", e.name);
                    }
                    pages += 1;
                    if continuation_token.is_empty() {
                        break;
                    }
                    token = continuation_token;
                }
                PageOutcome::NeedsBroadcast { .. } => break,
            }
            if pages > 20 {
                break;
            }
        }
        assert_eq!(seen.len(), 100);
        let mut sorted_seen: Vec<_> = seen.into_iter().collect();
        sorted_seen.sort();
        assert_eq!(sorted_seen, names);
    }

    #[test]
    fn withholds_entries_beyond_the_minimum_horizon() {
        let mut coordinator = PagedListCoordinator::new();
        coordinator.ingest_page("list-2", "T1", vec![entry("a"), entry("b")], "b".into(), false);
        coordinator.ingest_page("list-2", "T2", vec![entry("a")], "a".into(), false);

        match coordinator.get("list-2", "", 10, &["T1".to_string(), "T2".to_string()]) {
            PageOutcome::NeedsBroadcast { from_token } => assert_eq!(from_token, "a"),
            other => panic!("expected NeedsBroadcast, got {other:?}"),
        }
    }

    #[test]
    fn cache_put_get_and_invalidate() {
        let mut coordinator = PagedListCoordinator::new();
        coordinator.cache_put("b1", "pre", vec![entry("a")]);
        assert!(coordinator.cache_get("b1", "pre").is_some());
        coordinator.invalidate("b1", "pre");
        assert!(coordinator.cache_get("b1", "pre").is_none());
    }
}
