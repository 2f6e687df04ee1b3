//! Stateless request builder and response parser for the delivery API.
//!
//! # Design
//! `DeliveryApi` holds only the base URL and the API token. Each operation is
//! split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`. `ContentClient` drives
//! these through a `Transport`; a host with its own runtime can execute the
//! round-trip itself and stay fully in control of I/O.

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::options::{StoriesQuery, StoryQuery};
use crate::params::{self, QueryParams};
use crate::types::{SpaceEnvelope, StoriesEnvelope, StoriesPage, Story, StoryEnvelope};

pub const SPACE_RESOURCE: &str = "spaces/me";
pub const STORIES_RESOURCE: &str = "stories";

pub const TOTAL_HEADER: &str = "Total";
pub const PER_PAGE_HEADER: &str = "Per-Page";

/// Synchronous, stateless builder/parser for the delivery API.
#[derive(Debug, Clone)]
pub struct DeliveryApi {
    base_url: String,
    token: String,
}

impl DeliveryApi {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url, &config.token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request for the space metadata that carries the cache version.
    /// Never carries a `cv` parameter.
    pub fn build_space(&self) -> HttpRequest {
        self.request(SPACE_RESOURCE, QueryParams::new(), None)
    }

    /// Request for a single story. Fails before anything is built when the
    /// selector is missing or ambiguous.
    pub fn build_story(
        &self,
        query: &StoryQuery,
        cache_version: Option<&str>,
    ) -> Result<HttpRequest> {
        let selector = query.selector()?;
        let params = params::story_params(query, &selector);
        let segment: Vec<String> = selector
            .path_segment()
            .split('/')
            .map(|part| urlencoding::encode(part).into_owned())
            .collect();
        let resource = format!("{STORIES_RESOURCE}/{}", segment.join("/"));
        Ok(self.request(&resource, params, cache_version))
    }

    pub fn build_stories(&self, query: &StoriesQuery, cache_version: Option<&str>) -> HttpRequest {
        self.request(STORIES_RESOURCE, params::stories_params(query), cache_version)
    }

    /// Token and cache version are written last so they win over anything
    /// the options produced.
    fn request(
        &self,
        resource: &str,
        mut params: QueryParams,
        cache_version: Option<&str>,
    ) -> HttpRequest {
        params.remove(params::CACHE_VERSION);
        if let Some(cv) = cache_version {
            params.insert(params::CACHE_VERSION, cv);
        }
        params.insert(params::TOKEN, self.token.as_str());
        HttpRequest {
            path: format!("{}/{resource}", self.base_url),
            query: params.into_pairs(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }

    /// Extract the cache version from a space response. Every failure is a
    /// `CacheRefresh` error.
    pub fn parse_space_version(&self, response: HttpResponse) -> Result<String> {
        if !response.is_success() {
            return Err(ApiError::CacheRefresh(format!(
                "space endpoint returned HTTP {}",
                response.status
            )));
        }
        let envelope: SpaceEnvelope = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::CacheRefresh(format!("malformed space response: {e}")))?;
        match envelope.space.version {
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s),
            _ => Err(ApiError::CacheRefresh(
                "space response has no version".to_string(),
            )),
        }
    }

    pub fn parse_story(&self, response: HttpResponse) -> Result<Story> {
        if response.status == 404 {
            return Err(ApiError::NotFound);
        }
        check_status(&response)?;
        let envelope: StoryEnvelope = decode(&response.body)?;
        Ok(envelope.story)
    }

    /// A failed status is always an error, never an empty page.
    pub fn parse_stories(&self, response: HttpResponse) -> Result<StoriesPage> {
        check_status(&response)?;
        let envelope: StoriesEnvelope = decode(&response.body)?;
        Ok(StoriesPage {
            stories: envelope.stories,
            rels: envelope.rels,
            total: header_count(&response, TOTAL_HEADER),
            per_page: header_count(&response, PER_PAGE_HEADER),
        })
    }
}

fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Transport {
        status: Some(response.status),
        message: response.body.clone(),
    })
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn header_count(response: &HttpResponse, name: &str) -> u64 {
    response
        .header(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Version;
    use crate::query::RelationDirective;
    use uuid::Uuid;

    const STORY: &str = r#"{"id":1,"uuid":"00000000-0000-0000-0000-000000000001","name":"Home","slug":"home","full_slug":"home"}"#;

    fn api() -> DeliveryApi {
        DeliveryApi::new("https://cdn.test/v1/cdn", "secret")
    }

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_space_has_token_and_no_cache_version() {
        let req = api().build_space();
        assert_eq!(req.path, "https://cdn.test/v1/cdn/spaces/me");
        assert_eq!(req.query, vec![("token".to_string(), "secret".to_string())]);
    }

    #[test]
    fn build_story_by_slug() {
        let req = api().build_story(&StoryQuery::by_slug("blog/first post"), Some("42")).unwrap();
        assert_eq!(req.path, "https://cdn.test/v1/cdn/stories/blog/first%20post");
        assert_eq!(req.query_value("cv"), Some("42"));
        assert_eq!(req.query_value("token"), Some("secret"));
        assert_eq!(req.query_value("find_by"), None);
    }

    #[test]
    fn build_story_by_uuid_sets_find_by() {
        let uuid = Uuid::parse_str("aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee").unwrap();
        let req = api().build_story(&StoryQuery::by_uuid(uuid), None).unwrap();
        assert_eq!(
            req.path,
            "https://cdn.test/v1/cdn/stories/aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee"
        );
        assert_eq!(req.query_value("find_by"), Some("uuid"));
        assert_eq!(req.query_value("cv"), None);
    }

    #[test]
    fn build_story_with_options() {
        let query = StoryQuery {
            version: Some(Version::Draft),
            resolve_links: Some(true),
            resolve_relations: vec![RelationDirective::new("author", "ref").unwrap()],
            ..StoryQuery::by_id(17)
        };
        let req = api().build_story(&query, None).unwrap();
        assert_eq!(req.path, "https://cdn.test/v1/cdn/stories/17");
        assert_eq!(req.query_value("version"), Some("draft"));
        assert_eq!(req.query_value("resolve_links"), Some("1"));
        assert_eq!(req.query_value("resolve_relations"), Some("author.ref,"));
    }

    #[test]
    fn build_story_rejects_two_selectors() {
        let query = StoryQuery {
            uuid: Some(Uuid::nil()),
            ..StoryQuery::by_id(1)
        };
        let err = api().build_story(&query, None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn build_stories_paginated() {
        let query = StoriesQuery {
            page: Some(3),
            per_page: Some(10),
            ..Default::default()
        };
        let req = api().build_stories(&query, Some("7"));
        assert_eq!(req.path, "https://cdn.test/v1/cdn/stories");
        assert_eq!(
            req.url(),
            "https://cdn.test/v1/cdn/stories?cv=7&page=3&per_page=10&token=secret"
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let api = DeliveryApi::new("https://cdn.test/v1/cdn/", "t");
        assert_eq!(api.build_space().path, "https://cdn.test/v1/cdn/spaces/me");
    }

    #[test]
    fn parse_space_version_number_and_string() {
        let v = api()
            .parse_space_version(response(200, &[], r#"{"space":{"id":1,"version":42}}"#))
            .unwrap();
        assert_eq!(v, "42");
        let v = api()
            .parse_space_version(response(200, &[], r#"{"space":{"version":"1700000000"}}"#))
            .unwrap();
        assert_eq!(v, "1700000000");
    }

    #[test]
    fn parse_space_version_missing_field() {
        let err = api()
            .parse_space_version(response(200, &[], r#"{"space":{"id":1}}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::CacheRefresh(_)));
    }

    #[test]
    fn parse_space_version_bad_status() {
        let err = api()
            .parse_space_version(response(401, &[], "unauthorized"))
            .unwrap_err();
        assert!(matches!(err, ApiError::CacheRefresh(_)));
    }

    #[test]
    fn parse_story_success() {
        let story = api()
            .parse_story(response(200, &[], &format!(r#"{{"story":{STORY}}}"#)))
            .unwrap();
        assert_eq!(story.full_slug, "home");
    }

    #[test]
    fn parse_story_not_found() {
        let err = api().parse_story(response(404, &[], "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_story_server_error() {
        let err = api().parse_story(response(500, &[], "boom")).unwrap_err();
        assert!(matches!(err, ApiError::Transport { status: Some(500), .. }));
    }

    #[test]
    fn parse_story_bad_json() {
        let err = api().parse_story(response(200, &[], "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn parse_stories_reads_pagination_headers() {
        let page = api()
            .parse_stories(response(
                200,
                &[("total", "31"), ("per-page", "25")],
                &format!(r#"{{"stories":[{STORY}]}}"#),
            ))
            .unwrap();
        assert_eq!(page.stories.len(), 1);
        assert_eq!(page.total, 31);
        assert_eq!(page.per_page, 25);
        assert!(page.rels.is_empty());
    }

    #[test]
    fn parse_stories_defaults_bad_headers_to_zero() {
        let page = api()
            .parse_stories(response(200, &[("Total", "many")], r#"{"stories":[]}"#))
            .unwrap();
        assert!(page.stories.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.per_page, 0);
    }

    #[test]
    fn parse_stories_404_is_transport_error() {
        let err = api().parse_stories(response(404, &[], "")).unwrap_err();
        assert!(matches!(err, ApiError::Transport { status: Some(404), .. }));
    }

    #[test]
    fn parse_stories_missing_key_is_decode_error() {
        let err = api().parse_stories(response(200, &[], r#"{"story":{}}"#)).unwrap_err();
        match err {
            ApiError::Decode(msg) => assert!(msg.contains("stories")),
            other => panic!("expected Decode, got {other:?}"),
        }
    }
}
