//! axum HTTP surface for link topics, topic edits, categories and views
//!
//! The acting user is named by the `Api-Username` header. Authentication is
//! done upstream; an unknown username is refused with 403.

mod error;

pub use error::ApiError;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{REFERER, USER_AGENT};
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use links_category_domain::usecases::{
    CategoryAdmin, CategoryChanges, CreateLinkError, CreateLinkRequest, CreateLinkTopic,
    FieldError, Presenter, TopicChanges, TopicEditor,
};
use links_category_domain::{
    Actor, CategoryId, CategoryPolicyCache, CategorySetCache, CategoryStore, Clock,
    LinksCategorySettings, NewCategory, Post, RequestMetadata, TopicId, TopicStore, TrackingInfo,
    UserStore,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub const USERNAME_HEADER: &str = "Api-Username";
const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";

const DEFAULT_LATEST_LIMIT: usize = 30;
const MAX_LATEST_LIMIT: usize = 100;
const DIGEST_LIMIT: usize = 20;

/// Error key for a request body that does not parse
const INVALID_PARAMETERS_KEY: &str = "invalid_parameters";

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    users: Arc<dyn UserStore>,
    create_link: Arc<CreateLinkTopic>,
    editor: Arc<TopicEditor>,
    categories: Arc<CategoryAdmin>,
    presenter: Arc<Presenter>,
}

impl AppState {
    /// Wire the use cases over one store and one policy cache backend
    pub fn new<S>(
        settings: LinksCategorySettings,
        store: Arc<S>,
        cache: Arc<dyn CategorySetCache>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        S: CategoryStore + UserStore + TopicStore + 'static,
    {
        let category_store: Arc<dyn CategoryStore> = store.clone();
        let users: Arc<dyn UserStore> = store.clone();
        let topics: Arc<dyn TopicStore> = store;
        let policy = Arc::new(CategoryPolicyCache::new(cache, category_store.clone()));

        Self {
            create_link: Arc::new(CreateLinkTopic::new(
                settings.clone(),
                policy.clone(),
                topics.clone(),
                clock,
            )),
            editor: Arc::new(TopicEditor::new(
                settings.clone(),
                policy.clone(),
                category_store.clone(),
                topics.clone(),
            )),
            categories: Arc::new(CategoryAdmin::new(policy.clone(), category_store.clone())),
            presenter: Arc::new(Presenter::new(
                settings,
                policy,
                category_store,
                topics,
                users.clone(),
            )),
            users,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/links", post(create_link))
        .route("/site", get(site))
        .route("/latest", get(latest))
        .route("/t/{id}", get(show_topic).put(update_topic))
        .route("/categories", post(create_category))
        .route("/categories/{id}", put(update_category))
        .route("/user_actions", get(user_actions))
        .route("/digest", get(digest))
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(addr = %addr, "HTTP server listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

/// The user named by `Api-Username`, or anonymous without the header
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let Some(value) = parts.headers.get(USERNAME_HEADER) else {
            return Ok(Self(Actor::Anonymous));
        };
        let username = value.to_str().map_err(|_| ApiError::invalid_access())?;

        match state.users.find_by_username(username).await? {
            Some(user) => Ok(Self(Actor::User(user))),
            None => {
                tracing::warn!(username, "Unknown API username");
                Err(ApiError::invalid_access())
            }
        }
    }
}

/// Client IP, user agent and referrer of the request
pub struct ClientMetadata(pub RequestMetadata);

impl<S: Send + Sync> FromRequestParts<S> for ClientMetadata {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let forwarded = header(FORWARDED_FOR_HEADER).and_then(|v| {
            v.split(',')
                .next()
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_string)
        });
        let ip_address = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

        Ok(Self(RequestMetadata {
            ip_address,
            user_agent: header(USER_AGENT.as_str()),
            referrer: header(REFERER.as_str()),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct CreateLinkBody {
    featured_link: String,
    category: Option<CategoryId>,
    #[serde(default)]
    title: String,
    raw: Option<String>,
    archetype: Option<String>,
    auto_track: Option<bool>,
    typing_duration_msecs: Option<u64>,
    composer_open_duration_msecs: Option<u64>,
}

#[derive(Debug, Serialize)]
struct CreatedPost {
    id: i64,
    topic_id: TopicId,
    post_number: u32,
    raw: String,
    featured_link: Option<String>,
}

/// Post-creation result envelope
#[derive(Debug, Serialize)]
struct PostCreationResult {
    action: &'static str,
    success: bool,
    errors: Vec<String>,
    error_keys: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    post: Option<CreatedPost>,
}

impl PostCreationResult {
    const ACTION: &'static str = "create_post";

    fn created(post: Post, featured_link: Option<String>) -> Self {
        Self {
            action: Self::ACTION,
            success: true,
            errors: vec![],
            error_keys: vec![],
            post: Some(CreatedPost {
                id: post.id,
                topic_id: post.topic_id,
                post_number: post.post_number,
                raw: post.raw,
                featured_link,
            }),
        }
    }

    fn failed(err: &CreateLinkError) -> Self {
        let message = match err {
            CreateLinkError::Store(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        Self {
            action: Self::ACTION,
            success: false,
            errors: vec![message],
            error_keys: vec![err.key()],
            post: None,
        }
    }

    fn rejected(rejection: &JsonRejection) -> Self {
        Self {
            action: Self::ACTION,
            success: false,
            errors: vec![rejection.body_text()],
            error_keys: vec![INVALID_PARAMETERS_KEY],
            post: None,
        }
    }
}

async fn create_link(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ClientMetadata(metadata): ClientMetadata,
    body: Result<Json<CreateLinkBody>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected link topic body");
            let result = PostCreationResult::rejected(&rejection);
            return (rejection.status(), Json(result)).into_response();
        }
    };

    let request = CreateLinkRequest {
        featured_link: body.featured_link,
        category_id: body.category,
        title: body.title,
        raw: body.raw,
        tracking: TrackingInfo {
            archetype: body.archetype,
            auto_track: body.auto_track,
            typing_duration_msecs: body.typing_duration_msecs,
            composer_open_duration_msecs: body.composer_open_duration_msecs,
        },
        metadata,
    };

    match state.create_link.execute(&actor, request).await {
        Ok(created) => (
            StatusCode::OK,
            Json(PostCreationResult::created(
                created.post,
                created.topic.featured_link,
            )),
        )
            .into_response(),
        Err(err) => {
            if let CreateLinkError::Store(e) = &err {
                tracing::error!(error = %e, "Link topic creation failed");
            }
            let result = PostCreationResult::failed(&err);
            let status = ApiError::from(err).status();
            (status, Json(result)).into_response()
        }
    }
}

async fn site(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(Json(state.presenter.site().await?).into_response())
}

#[derive(Debug, Deserialize)]
struct LatestQuery {
    limit: Option<usize>,
}

async fn latest(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<LatestQuery>,
) -> Result<Response, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LATEST_LIMIT)
        .min(MAX_LATEST_LIMIT);
    let topics = state.presenter.latest(&actor, limit).await?;
    Ok(Json(serde_json::json!({ "topic_list": { "topics": topics } })).into_response())
}

async fn show_topic(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<TopicId>,
) -> Result<Response, ApiError> {
    let view = state
        .presenter
        .topic_view(&actor, id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(view).into_response())
}

#[derive(Debug, Serialize)]
struct BasicTopic {
    id: TopicId,
    title: String,
    category_id: Option<CategoryId>,
    featured_link: Option<String>,
}

#[derive(Debug, Serialize)]
struct TopicUpdateResult {
    success: bool,
    basic_topic: BasicTopic,
    errors: Vec<String>,
    error_keys: Vec<&'static str>,
    field_errors: Vec<FieldError>,
}

async fn update_topic(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<TopicId>,
    Json(changes): Json<TopicChanges>,
) -> Result<Response, ApiError> {
    let outcome = state.editor.update(&actor, id, changes).await?;

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let result = TopicUpdateResult {
        success: outcome.is_success(),
        errors: outcome.errors.iter().map(|e| e.message.clone()).collect(),
        error_keys: outcome.errors.iter().map(|e| e.key).collect(),
        basic_topic: BasicTopic {
            id: outcome.topic.id,
            title: outcome.topic.title,
            category_id: outcome.topic.category_id,
            featured_link: outcome.topic.featured_link,
        },
        field_errors: outcome.errors,
    };
    Ok((status, Json(result)).into_response())
}

#[derive(Debug, Deserialize)]
struct CategoryBody {
    name: String,
    #[serde(default)]
    links_only: bool,
}

async fn create_category(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<CategoryBody>,
) -> Result<Response, ApiError> {
    let category = state
        .categories
        .create(
            &actor,
            NewCategory {
                name: body.name,
                links_only: body.links_only,
            },
        )
        .await?;
    Ok(Json(category).into_response())
}

async fn update_category(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<CategoryId>,
    Json(changes): Json<CategoryChanges>,
) -> Result<Response, ApiError> {
    let category = state.categories.update(&actor, id, changes).await?;
    Ok(Json(category).into_response())
}

#[derive(Debug, Deserialize)]
struct UserActionsQuery {
    username: String,
}

async fn user_actions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<UserActionsQuery>,
) -> Result<Response, ApiError> {
    let actions = state
        .presenter
        .user_actions(&actor, &query.username)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(serde_json::json!({ "user_actions": actions })).into_response())
}

async fn digest(State(state): State<AppState>) -> Result<Response, ApiError> {
    let anchors = state.presenter.digest_anchors(DIGEST_LIMIT).await?;
    Ok(Html(anchors.join("\n")).into_response())
}
