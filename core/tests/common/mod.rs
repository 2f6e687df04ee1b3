//! Shared test helpers: a scripted transport that records requests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use cdn_core::{ApiError, HttpRequest, HttpResponse, Transport};

/// Replays queued responses in order and records every request it sees.
/// Running out of responses is reported as a network failure.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.respond_with_headers(status, &[], body)
    }

    pub fn respond_with_headers(self, status: u16, headers: &[(&str, &str)], body: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses.lock().unwrap().push_back(Err(ApiError::Transport {
            status: None,
            message: message.to_string(),
        }));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Paths of the recorded requests, base URL stripped.
    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.path.trim_start_matches(BASE_URL).to_string())
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ApiError::Transport {
                    status: None,
                    message: "no scripted response left".to_string(),
                })
            })
    }
}

pub const BASE_URL: &str = "https://cdn.test/v1/cdn";
pub const TOKEN: &str = "secret";

pub fn space_body(version: &str) -> String {
    format!(r#"{{"space":{{"id":1,"name":"test","version":{version}}}}}"#)
}

pub fn story_json(id: u64, full_slug: &str) -> String {
    format!(
        r#"{{"id":{id},"uuid":"00000000-0000-0000-0000-{id:012}","name":"Story {id}","slug":"{slug}","full_slug":"{full_slug}"}}"#,
        slug = full_slug.rsplit('/').next().unwrap_or(full_slug),
    )
}

pub fn story_body(id: u64, full_slug: &str) -> String {
    format!(r#"{{"story":{}}}"#, story_json(id, full_slug))
}

pub fn stories_body(stories: &[(u64, &str)]) -> String {
    let items: Vec<String> = stories.iter().map(|(id, s)| story_json(*id, s)).collect();
    format!(r#"{{"stories":[{}]}}"#, items.join(","))
}
