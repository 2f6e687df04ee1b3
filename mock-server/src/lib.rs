use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering as AtomicOrdering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{header::HeaderName, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Token every request to the mock must carry.
pub const MOCK_TOKEN: &str = "mock-token";

/// Cache version reported before the first publish.
pub const INITIAL_VERSION: u64 = 1_700_000_000;

const DEFAULT_PER_PAGE: usize = 25;
const MAX_PER_PAGE: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Story {
    pub id: u64,
    pub uuid: Uuid,
    pub name: String,
    pub slug: String,
    pub full_slug: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub is_startpage: bool,
    #[serde(default)]
    pub tag_list: Vec<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

pub type Db = Arc<RwLock<Vec<Story>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub version: Arc<AtomicU64>,
    pub token: Arc<str>,
}

impl AppState {
    pub fn new(stories: Vec<Story>) -> Self {
        Self {
            db: Arc::new(RwLock::new(stories)),
            version: Arc::new(AtomicU64::new(INITIAL_VERSION)),
            token: Arc::from(MOCK_TOKEN),
        }
    }
}

/// A small site: a start page, a folder of blog posts and an author.
pub fn seed_stories() -> Vec<Story> {
    let story = |id: u64, name: &str, full_slug: &str, content: Value, tags: &[&str]| Story {
        id,
        uuid: Uuid::from_u128(id as u128),
        name: name.to_string(),
        slug: full_slug.rsplit('/').next().unwrap_or(full_slug).to_string(),
        full_slug: full_slug.to_string(),
        content,
        is_startpage: false,
        tag_list: tags.iter().map(|t| t.to_string()).collect(),
        published_at: Some(format!("2024-03-{:02} 10:00", id)),
    };
    let mut home = story(1, "Home", "home", json!({"component": "page"}), &[]);
    home.is_startpage = true;
    vec![
        home,
        story(2, "First post", "blog/first-post", json!({"component": "post", "category": "news", "rating": "3"}), &["featured"]),
        story(3, "Second post", "blog/second-post", json!({"component": "post", "category": "howto", "rating": "10"}), &[]),
        story(4, "Third post", "blog/third-post", json!({"component": "post", "category": "news", "rating": "7"}), &["featured", "archive"]),
        story(5, "Jane Doe", "authors/jane", json!({"component": "author"}), &[]),
    ]
}

pub fn app() -> Router {
    app_with(AppState::new(seed_stories()))
}

fn app_with(state: AppState) -> Router {
    Router::new()
        .route("/v1/cdn/spaces/me", get(get_space))
        .route("/v1/cdn/stories", get(list_stories))
        .route("/v1/cdn/stories/{*path}", get(get_story))
        .route("/admin/publish", post(publish))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type Params = HashMap<String, String>;

fn authorize(state: &AppState, params: &Params) -> Result<(), (StatusCode, Json<Value>)> {
    match params.get("token") {
        Some(token) if token.as_str() == &*state.token => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Unauthorized"})),
        )),
    }
}

async fn get_space(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorize(&state, &params)?;
    let version = state.version.load(AtomicOrdering::SeqCst);
    debug!(version, "space requested");
    Ok(Json(json!({
        "space": {"id": 1, "name": "mock", "domain": "http://localhost/", "version": version}
    })))
}

async fn publish(State(state): State<AppState>) -> Json<Value> {
    let version = state.version.fetch_add(1, AtomicOrdering::SeqCst) + 1;
    info!(version, "published");
    Json(json!({"version": version}))
}

async fn get_story(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorize(&state, &params)?;
    let stories = state.db.read().await;
    let found = if params.get("find_by").map(String::as_str) == Some("uuid") {
        let uuid = Uuid::parse_str(&path).map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid uuid"})),
            )
        })?;
        stories.iter().find(|s| s.uuid == uuid)
    } else if let Ok(id) = path.parse::<u64>() {
        stories.iter().find(|s| s.id == id)
    } else {
        let slug = path.trim_matches('/');
        stories.iter().find(|s| s.full_slug == slug)
    };
    debug!(%path, found = found.is_some(), "story requested");
    found
        .map(|story| Json(json!({ "story": story })))
        .ok_or((StatusCode::NOT_FOUND, Json(json!({"error": "This record could not be found"}))))
}

async fn list_stories(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<(HeaderMap, Json<Value>), (StatusCode, Json<Value>)> {
    authorize(&state, &params)?;
    let stories = state.db.read().await;
    let mut matched: Vec<&Story> = stories.iter().filter(|s| matches_params(s, &params)).collect();

    if let Some(sort_by) = params.get("sort_by") {
        sort_stories(&mut matched, sort_by);
    }

    let per_page = params
        .get("per_page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let page = params
        .get("page")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let total = matched.len();
    let page_items: Vec<&Story> = matched
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("total"), HeaderValue::from(total));
    headers.insert(HeaderName::from_static("per-page"), HeaderValue::from(per_page));
    debug!(total, page, per_page, "stories listed");
    Ok((headers, Json(json!({ "stories": page_items }))))
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').filter(|s| !s.is_empty())
}

fn matches_params(story: &Story, params: &Params) -> bool {
    for (key, value) in params {
        let ok = match key.as_str() {
            "starts_with" => story.full_slug.starts_with(value.trim_start_matches('/')),
            "by_uuids" | "by_uuids_ordered" => {
                split_list(value).any(|u| u == story.uuid.to_string())
            }
            "excluding_ids" => !split_list(value).any(|id| id == story.id.to_string()),
            "with_tag" => split_list(value).any(|t| story.tag_list.iter().any(|tag| tag == t)),
            "is_startpage" => story.is_startpage == (value == "1"),
            "search_term" => story.name.to_lowercase().contains(&value.to_lowercase()),
            other => match parse_filter_key(other) {
                Some((attr, op)) => matches_filter(story, attr, op, value),
                None => true,
            },
        };
        if !ok {
            return false;
        }
    }
    true
}

/// `filter_query[<attr>][<op>]` -> `(attr, op)`.
fn parse_filter_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix("filter_query[")?.strip_suffix(']')?;
    rest.split_once("][")
}

fn content_str<'a>(story: &'a Story, attr: &str) -> Option<&'a str> {
    story.content.get(attr).and_then(Value::as_str)
}

/// Supports the string operations the mock needs; anything else matches.
fn matches_filter(story: &Story, attr: &str, op: &str, value: &str) -> bool {
    let field = content_str(story, attr);
    match op {
        "in" => field.is_some_and(|f| split_list(value).any(|v| v == f)),
        "not_in" => !field.is_some_and(|f| split_list(value).any(|v| v == f)),
        "like" => field.is_some_and(|f| f.contains(value.trim_matches('*'))),
        "not_like" => !field.is_some_and(|f| f.contains(value.trim_matches('*'))),
        "gt_int" => int_field(story, attr).zip(value.parse().ok()).is_some_and(|(f, v): (i64, i64)| f > v),
        "lt_int" => int_field(story, attr).zip(value.parse().ok()).is_some_and(|(f, v): (i64, i64)| f < v),
        _ => true,
    }
}

fn int_field(story: &Story, attr: &str) -> Option<i64> {
    content_str(story, attr).and_then(|v| v.parse().ok())
}

/// `<field>[:asc|desc][:string|int|float]`, field bare or `content.<name>`.
fn sort_stories(stories: &mut [&Story], sort_by: &str) {
    let mut parts = sort_by.split(':');
    let field = parts.next().unwrap_or_default();
    let desc = parts.next() == Some("desc");
    let numeric = matches!(parts.next(), Some("int") | Some("float"));

    let key = |story: &Story| -> String {
        match field.strip_prefix("content.") {
            Some(name) => content_str(story, name).unwrap_or_default().to_string(),
            None => match field {
                "name" => story.name.clone(),
                "full_slug" | "slug" => story.full_slug.clone(),
                "id" => story.id.to_string(),
                _ => story.published_at.clone().unwrap_or_default(),
            },
        }
    };
    stories.sort_by(|a, b| {
        let (ka, kb) = (key(a), key(b));
        let ord = if numeric {
            let (na, nb) = (ka.parse::<f64>().unwrap_or(0.0), kb.parse::<f64>().unwrap_or(0.0));
            na.partial_cmp(&nb).unwrap_or(Ordering::Equal)
        } else {
            ka.cmp(&kb)
        };
        if desc {
            ord.reverse()
        } else {
            ord
        }
    });
}
