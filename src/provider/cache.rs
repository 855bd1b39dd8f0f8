//! Response cache with in-flight request de-duplication.
//!
//! Guarantees:
//! - At most one network request per cache key is in flight at a time.
//! - Every caller that joins an in-flight request observes its exact
//!   outcome, value or error.
//! - A failed request leaves no entry behind, so the next caller retries
//!   from scratch instead of replaying a remembered failure.
//!
//! The lookup-or-publish decision happens under a single lock acquisition,
//! so no second task can slip between a miss check and the publish. The
//! lock is never held across an `.await`; the terminal mutation (resolve
//! or evict) runs inside the shared future itself, driven by whichever
//! caller polls it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::MarketDataError;

/// Handle to the sole in-flight request for a key. Cheap to clone; all
/// clones resolve to the same outcome.
pub type SharedFetch = Shared<BoxFuture<'static, Result<Arc<Value>, MarketDataError>>>;

enum Slot {
    /// Resolved payload, fresh until `expires_at`.
    Ready {
        value: Arc<Value>,
        expires_at: Instant,
    },
    /// The key's sole request, still executing.
    InFlight(SharedFetch),
}

/// What a lookup decided, under one lock acquisition.
pub enum Lookup {
    /// Fresh entry; no network access needed.
    Hit(Arc<Value>),
    /// Another caller's request is executing; await the same outcome.
    Joined(SharedFetch),
    /// This caller's fetch was published as the key's in-flight request.
    Started(SharedFetch),
}

#[derive(Default)]
pub struct ResponseCache {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the fresh value for `key`, join its in-flight request, or
    /// publish `fetch` as that request.
    ///
    /// Expired entries are treated as absent and overwritten. The caller
    /// must await the returned future for `Joined` and `Started`; the
    /// future records the result (with a fresh expiry stamped at
    /// resolution time) or evicts the entry on failure.
    pub fn lookup_or_start<F>(&self, key: &str, ttl: Duration, fetch: F) -> Lookup
    where
        F: Future<Output = Result<Value, MarketDataError>> + Send + 'static,
    {
        let mut slots = self.slots.lock();

        match slots.get(key) {
            Some(Slot::Ready { value, expires_at }) if *expires_at > Instant::now() => {
                return Lookup::Hit(Arc::clone(value));
            }
            Some(Slot::InFlight(fut)) => {
                return Lookup::Joined(fut.clone());
            }
            _ => {}
        }

        let shared = self.resolve_into_slot(key.to_string(), ttl, fetch);
        slots.insert(key.to_string(), Slot::InFlight(shared.clone()));

        Lookup::Started(shared)
    }

    /// Wrap `fetch` so that completing it also performs the terminal slot
    /// mutation exactly once: success stores `Ready`, failure evicts.
    fn resolve_into_slot<F>(&self, key: String, ttl: Duration, fetch: F) -> SharedFetch
    where
        F: Future<Output = Result<Value, MarketDataError>> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);

        async move {
            match fetch.await {
                Ok(value) => {
                    let value = Arc::new(value);
                    slots.lock().insert(
                        key,
                        Slot::Ready {
                            value: Arc::clone(&value),
                            expires_at: Instant::now() + ttl,
                        },
                    );
                    Ok(value)
                }
                Err(err) => {
                    slots.lock().remove(&key);
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Deterministic request signature: endpoint path plus query parameters
/// serialized in name order, so parameter order never splits the cache.
pub fn cache_key(path: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }

    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("{path}?{joined}")
}
