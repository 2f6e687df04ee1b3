//! Request orchestration: cache version policy, request building, one
//! transport call, response classification.
//!
//! # Design
//! `ContentClient` owns a `DeliveryApi`, a `Transport` and the client-scoped
//! `CacheVersion`. A fetch suspends at most twice, in order: the optional
//! cache version refresh, then the content request. Argument checks run
//! before either. Nothing is retried.

use tracing::{debug, warn};

use crate::cache::{CacheState, CacheVersion};
use crate::client::DeliveryApi;
use crate::config::{CacheRefreshFailure, ClientConfig};
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::options::{StoriesQuery, StoryQuery};
use crate::params::CACHE_VERSION;
use crate::types::{StoriesPage, Story};

#[cfg(feature = "ureq")]
use crate::http::UreqTransport;

pub struct ContentClient<T> {
    api: DeliveryApi,
    transport: T,
    cache: CacheVersion,
    auto_cache_invalidation: bool,
    cache_refresh_failure: CacheRefreshFailure,
}

#[cfg(feature = "ureq")]
impl ContentClient<UreqTransport> {
    /// Client over a default `ureq` agent.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> ContentClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            api: DeliveryApi::from_config(&config),
            transport,
            cache: CacheVersion::new(),
            auto_cache_invalidation: config.auto_cache_invalidation,
            cache_refresh_failure: config.cache_refresh_failure,
        })
    }

    pub fn api(&self) -> &DeliveryApi {
        &self.api
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache_version(&self) -> Option<String> {
        self.cache.current()
    }

    pub fn cache_state(&self) -> CacheState {
        self.cache.state()
    }

    /// Fetch a fresh cache version and use it for subsequent requests.
    pub fn invalidate(&self) -> Result<String> {
        self.cache.refresh(&self.api, &self.transport)
    }

    /// Fetch exactly one story.
    ///
    /// Fails with `InvalidArgument` before any request when the selector is
    /// missing or ambiguous, `NotFound` on 404, `Transport` on any other
    /// failed status, `Decode` on an unexpected body.
    pub fn fetch_one(&self, query: &StoryQuery) -> Result<Story> {
        // Checked here too so a bad selector never triggers the space request.
        query.selector()?;
        let cache_version = self.prepare_cache_version()?;
        let request = self.api.build_story(query, cache_version.as_deref())?;
        let response = self.send(&request)?;
        self.api.parse_story(response)
    }

    /// Fetch one page of stories. An empty page is a success; a failed
    /// status never is.
    pub fn fetch_multiple(&self, query: &StoriesQuery) -> Result<StoriesPage> {
        let cache_version = self.prepare_cache_version()?;
        let request = self.api.build_stories(query, cache_version.as_deref());
        let response = self.send(&request)?;
        self.api.parse_stories(response)
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        debug!(
            path = %request.path,
            params = request.query.len(),
            cache_version = request.query_value(CACHE_VERSION).is_some(),
            "sending request"
        );
        self.transport.execute(request)
    }

    /// Cache version to attach to the next content request.
    fn prepare_cache_version(&self) -> Result<Option<String>> {
        if self.auto_cache_invalidation {
            match self.invalidate() {
                Ok(token) => return Ok(Some(token)),
                Err(err) => match self.cache_refresh_failure {
                    CacheRefreshFailure::Propagate => return Err(err),
                    CacheRefreshFailure::Degrade => {
                        warn!(error = %err, "cache version refresh failed, using last known version");
                    }
                },
            }
        }

        let current = self.cache.current();
        if current.is_none() {
            warn!("no cache version available, the CDN may serve stale content");
        }
        Ok(current)
    }
}
