//! Page cache for incremental regeneration
//!
//! Rendered pages are kept in memory keyed by route. A page is fresh for the
//! revalidate window; after that the stale copy keeps being served while a
//! single background regeneration replaces it. Routes never rendered before
//! go through a fallback: the first requester triggers the render and gets a
//! loading page, later requesters get the loading page until it lands.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// State of one cached route
#[derive(Debug)]
enum Slot {
    /// First render in flight
    Rendering,
    Ready {
        html: Arc<String>,
        generated_at: Instant,
        regenerating: bool,
    },
    /// The content API had nothing for this route
    NotFound { generated_at: Instant },
}

/// What the caller should do with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Serve `html`. When `regenerate` is set the page is stale and the
    /// caller owns its background regeneration.
    Hit { html: Arc<String>, regenerate: bool },
    /// Known missing; serve a 404
    NotFound,
    /// Nothing cached. When `render` is set the caller owns the first render;
    /// otherwise one is already in flight.
    Miss { render: bool },
}

/// Not-found slots kept at most; any path can produce one
pub const DEFAULT_NOT_FOUND_LIMIT: usize = 1024;

/// In-memory cache of rendered pages
#[derive(Debug)]
pub struct PageCache {
    entries: Mutex<HashMap<String, Slot>>,
    revalidate: Duration,
    not_found_limit: usize,
}

impl PageCache {
    pub fn new(revalidate: Duration) -> Self {
        Self::with_not_found_limit(revalidate, DEFAULT_NOT_FOUND_LIMIT)
    }

    pub fn with_not_found_limit(revalidate: Duration, not_found_limit: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            revalidate,
            not_found_limit,
        }
    }

    pub fn revalidate(&self) -> Duration {
        self.revalidate
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // A panic while holding the lock leaves the map consistent
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up `key` and claim any render or regeneration it needs
    pub fn lookup(&self, key: &str) -> Lookup {
        let mut entries = self.entries();

        match entries.get_mut(key) {
            Some(Slot::Ready {
                html,
                generated_at,
                regenerating,
            }) => {
                let stale = generated_at.elapsed() >= self.revalidate;
                let regenerate = stale && !*regenerating;
                if regenerate {
                    *regenerating = true;
                    tracing::debug!(key, "stale page, regenerating");
                } else {
                    tracing::debug!(key, "cache hit");
                }
                Lookup::Hit {
                    html: Arc::clone(html),
                    regenerate,
                }
            }
            Some(Slot::NotFound { generated_at }) if generated_at.elapsed() < self.revalidate => {
                Lookup::NotFound
            }
            Some(Slot::Rendering) => Lookup::Miss { render: false },
            Some(Slot::NotFound { .. }) | None => {
                entries.insert(key.to_string(), Slot::Rendering);
                tracing::debug!(key, "cache miss, rendering");
                Lookup::Miss { render: true }
            }
        }
    }

    /// Store a freshly rendered page
    pub fn store(&self, key: &str, html: String) -> Arc<String> {
        let html = Arc::new(html);
        self.entries().insert(
            key.to_string(),
            Slot::Ready {
                html: Arc::clone(&html),
                generated_at: Instant::now(),
                regenerating: false,
            },
        );
        html
    }

    /// Record that `key` has no content.
    ///
    /// Past the not-found limit, expired not-found slots are dropped first,
    /// then the oldest ones.
    pub fn store_not_found(&self, key: &str) {
        let mut entries = self.entries();
        entries.insert(
            key.to_string(),
            Slot::NotFound {
                generated_at: Instant::now(),
            },
        );

        // Older not-found slots, the one just stored excluded
        let mut older: Vec<(Instant, String)> = entries
            .iter()
            .filter(|(other, _)| other.as_str() != key)
            .filter_map(|(other, slot)| match slot {
                Slot::NotFound { generated_at } => Some((*generated_at, other.clone())),
                _ => None,
            })
            .collect();
        let budget = self.not_found_limit.saturating_sub(1);
        if older.len() <= budget {
            return;
        }

        let revalidate = self.revalidate;
        older.retain(|(generated_at, other)| {
            let expired = generated_at.elapsed() >= revalidate;
            if expired {
                entries.remove(other);
            }
            !expired
        });

        if older.len() > budget {
            older.sort();
            let excess = older.len() - budget;
            for (_, other) in older.into_iter().take(excess) {
                entries.remove(&other);
            }
        }
        tracing::debug!(entries = entries.len(), "evicted not-found pages");
    }

    /// Release a claimed render after a failure.
    ///
    /// A first render is forgotten so the next request retries; a stale page
    /// stays in place and becomes eligible for regeneration again.
    pub fn abandon(&self, key: &str) {
        let mut entries = self.entries();
        match entries.get_mut(key) {
            Some(Slot::Rendering) => {
                entries.remove(key);
            }
            Some(Slot::Ready { regenerating, .. }) => *regenerating = false,
            _ => {}
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
