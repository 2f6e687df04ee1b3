//! Cache version state.
//!
//! The delivery CDN keys cached responses on the `cv` parameter. The space
//! endpoint reports the current version; sending it makes the CDN bypass
//! entries older than the last publish. There is no expiry: the token stays
//! until the next `refresh`.
//!
//! The token lives behind a mutex so one client can be shared across
//! threads. The network round-trip happens outside the lock. Every write is
//! stamped with a generation taken before the request goes out, and a write
//! only lands if no later one already has, so a slow refresh can never
//! replace the token a newer refresh stored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::client::DeliveryApi;
use crate::error::{ApiError, Result};
use crate::http::Transport;

/// Observable state of the cache version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    NoVersion,
    HasVersion(String),
}

#[derive(Debug, Default)]
struct Slot {
    token: Option<String>,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct CacheVersion {
    slot: Mutex<Slot>,
    issued: AtomicU64,
}

impl CacheVersion {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_generation(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Stores `token` unless a write issued later has already landed.
    fn store(&self, generation: u64, token: Option<String>) {
        let mut slot = self.lock();
        if generation > slot.generation {
            slot.generation = generation;
            slot.token = token;
        }
    }

    pub fn current(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn state(&self) -> CacheState {
        match self.current() {
            Some(token) => CacheState::HasVersion(token),
            None => CacheState::NoVersion,
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        let generation = self.next_generation();
        self.store(generation, Some(token.into()));
    }

    pub fn clear(&self) {
        let generation = self.next_generation();
        self.store(generation, None);
    }

    /// Fetch the current version from the space endpoint and store it.
    ///
    /// Returns the token in effect once the refresh completes. That is the
    /// fetched one unless a write issued later landed first, in which case
    /// the newer token is kept and returned.
    ///
    /// On failure the previous state is kept and the error is a
    /// `CacheRefresh`, whether the request or the decoding failed.
    pub fn refresh<T: Transport>(&self, api: &DeliveryApi, transport: &T) -> Result<String> {
        let generation = self.next_generation();
        let request = api.build_space();
        debug!(path = %request.path, "refreshing cache version");
        let response = transport.execute(&request).map_err(|e| match e {
            ApiError::CacheRefresh(_) => e,
            other => ApiError::CacheRefresh(other.to_string()),
        })?;
        let token = api.parse_space_version(response)?;

        let mut slot = self.lock();
        if generation <= slot.generation {
            debug!(fetched = %token, "newer cache version already stored");
            return Ok(slot.token.clone().unwrap_or(token));
        }
        if slot.token.as_deref() != Some(token.as_str()) {
            info!(cache_version = %token, "cache version updated");
        }
        slot.generation = generation;
        slot.token = Some(token.clone());
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpRequest, HttpResponse};
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::thread;

    struct Fixed(u16, &'static str);

    impl Transport for Fixed {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse> {
            Ok(HttpResponse {
                status: self.0,
                headers: Vec::new(),
                body: self.1.to_string(),
            })
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse> {
            Err(ApiError::Transport {
                status: None,
                message: "connection refused".to_string(),
            })
        }
    }

    fn api() -> DeliveryApi {
        DeliveryApi::new("https://cdn.test/v1/cdn", "t")
    }

    #[test]
    fn starts_without_version() {
        let cache = CacheVersion::new();
        assert_eq!(cache.state(), CacheState::NoVersion);
        assert!(cache.current().is_none());
    }

    #[test]
    fn refresh_stores_token() {
        let cache = CacheVersion::new();
        let token = cache
            .refresh(&api(), &Fixed(200, r#"{"space":{"version":42}}"#))
            .unwrap();
        assert_eq!(token, "42");
        assert_eq!(cache.state(), CacheState::HasVersion("42".to_string()));
    }

    #[test]
    fn failed_refresh_keeps_previous_token() {
        let cache = CacheVersion::new();
        cache.set("7");
        let err = cache
            .refresh(&api(), &Fixed(200, r#"{"space":{}}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::CacheRefresh(_)));
        assert_eq!(cache.current().as_deref(), Some("7"));
    }

    #[test]
    fn network_failure_becomes_cache_refresh_error() {
        let cache = CacheVersion::new();
        let err = cache.refresh(&api(), &Unreachable).unwrap_err();
        match err {
            ApiError::CacheRefresh(msg) => assert!(msg.contains("connection refused")),
            other => panic!("expected CacheRefresh, got {other:?}"),
        }
    }

    /// Holds the first request until the test releases it; later requests
    /// answer immediately with a newer version.
    struct Staggered {
        calls: AtomicUsize,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Transport for Staggered {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse> {
            let body = if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.entered.lock().unwrap().send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
                r#"{"space":{"version":1}}"#
            } else {
                r#"{"space":{"version":2}}"#
            };
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: body.to_string(),
            })
        }
    }

    #[test]
    fn slow_earlier_refresh_does_not_overwrite_newer_token() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let transport = Staggered {
            calls: AtomicUsize::new(0),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let cache = CacheVersion::new();
        let api = api();

        thread::scope(|s| {
            let slow = s.spawn(|| cache.refresh(&api, &transport));
            entered_rx.recv().unwrap();

            assert_eq!(cache.refresh(&api, &transport).unwrap(), "2");
            release_tx.send(()).unwrap();

            assert_eq!(slow.join().unwrap().unwrap(), "2");
        });
        assert_eq!(cache.current().as_deref(), Some("2"));
    }

    #[test]
    fn set_during_refresh_wins() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let transport = Staggered {
            calls: AtomicUsize::new(0),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let cache = CacheVersion::new();
        let api = api();

        thread::scope(|s| {
            let slow = s.spawn(|| cache.refresh(&api, &transport));
            entered_rx.recv().unwrap();
            cache.set("9");
            release_tx.send(()).unwrap();
            assert_eq!(slow.join().unwrap().unwrap(), "9");
        });
        assert_eq!(cache.current().as_deref(), Some("9"));
    }

    #[test]
    fn clear_returns_to_no_version() {
        let cache = CacheVersion::new();
        cache.set("1");
        cache.clear();
        assert_eq!(cache.state(), CacheState::NoVersion);
    }
}
