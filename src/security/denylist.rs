//! Denylist of identities flagged by threat detection.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Why and when an identity was denylisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenylistEntry {
    pub reason: String,
    pub added_at: Instant,
    /// `None` when entries never expire.
    pub expires_at: Option<Instant>,
}

impl DenylistEntry {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Shared set of denylisted identities.
///
/// Inserts are idempotent: re-flagging a live entry keeps the original
/// timestamp and reason.
#[derive(Debug, Default)]
pub struct Denylist {
    entries: DashMap<String, DenylistEntry>,
}

impl Denylist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `identity` is currently denylisted. Expired entries are
    /// removed as they are found.
    pub fn contains(&self, identity: &str, now: Instant) -> bool {
        let expired = match self.entries.get(identity) {
            None => return false,
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            self.entries.remove_if(identity, |_, entry| entry.is_expired(now));
            return false;
        }
        true
    }

    /// Add `identity`. Returns `true` when a new entry was created.
    ///
    /// A TTL that reaches past the clock's range yields a permanent entry.
    pub fn insert(
        &self,
        identity: &str,
        reason: &str,
        now: Instant,
        ttl: Option<Duration>,
    ) -> bool {
        let entry = DenylistEntry {
            reason: reason.to_string(),
            added_at: now,
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
        };

        match self.entries.entry(identity.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(entry);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                true
            }
        }
    }

    /// Remove `identity`. Returns `true` if it was present.
    pub fn remove(&self, identity: &str) -> bool {
        self.entries.remove(identity).is_some()
    }

    pub fn get(&self, identity: &str) -> Option<DenylistEntry> {
        self.entries.get(identity).map(|e| e.value().clone())
    }

    /// All entries, sorted by identity.
    pub fn snapshot(&self) -> Vec<(String, DenylistEntry)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_entry() {
        let denylist = Denylist::new();
        let now = Instant::now();

        assert!(!denylist.contains("198.51.100.9", now));
        assert!(denylist.insert("198.51.100.9", "sql_injection", now, None));
        assert!(denylist.contains("198.51.100.9", now + Duration::from_secs(86_400 * 365)));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let denylist = Denylist::new();
        let now = Instant::now();

        assert!(denylist.insert("a", "xss", now, None));
        assert!(!denylist.insert("a", "sql_injection", now + Duration::from_secs(5), None));

        let entry = denylist.get("a").unwrap();
        assert_eq!(entry.reason, "xss");
        assert_eq!(entry.added_at, now);
        assert_eq!(denylist.len(), 1);
    }

    #[test]
    fn test_ttl_expiry() {
        let denylist = Denylist::new();
        let now = Instant::now();
        let ttl = Some(Duration::from_secs(60));

        denylist.insert("a", "xss", now, ttl);
        assert!(denylist.contains("a", now + Duration::from_secs(59)));
        assert!(!denylist.contains("a", now + Duration::from_secs(60)));
        // Lazily removed on lookup.
        assert!(denylist.is_empty());

        // An expired entry is replaced by a fresh one.
        denylist.insert("b", "xss", now, ttl);
        let later = now + Duration::from_secs(120);
        assert!(denylist.insert("b", "path_traversal", later, ttl));
        assert_eq!(denylist.get("b").unwrap().reason, "path_traversal");
    }

    #[test]
    fn test_sweep_and_remove() {
        let denylist = Denylist::new();
        let now = Instant::now();

        denylist.insert("temp", "xss", now, Some(Duration::from_secs(1)));
        denylist.insert("perm", "xss", now, None);

        assert_eq!(denylist.sweep_expired(now + Duration::from_secs(2)), 1);
        assert_eq!(denylist.snapshot().len(), 1);

        assert!(denylist.remove("perm"));
        assert!(!denylist.remove("perm"));
        assert!(denylist.is_empty());
    }

    #[test]
    fn test_unrepresentable_ttl_is_permanent() {
        let denylist = Denylist::new();
        let now = Instant::now();

        assert!(denylist.insert("a", "xss", now, Some(Duration::MAX)));
        assert_eq!(denylist.get("a").unwrap().expires_at, None);
        assert!(denylist.contains("a", now + Duration::from_secs(86_400 * 365)));
    }
}
