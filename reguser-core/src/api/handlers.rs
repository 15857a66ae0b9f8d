//! HTTP API handlers

use super::state::AppState;
use super::types::*;
use crate::model::{Group, GroupId, User, UserId};
use crate::repos::RepoError;
use crate::store::{EntityStream, ErrorKind};
use axum::{
    body::{Body, Bytes},
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Error type for API responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Repo(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Cancelled | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        if status == StatusCode::UNAUTHORIZED {
            return (
                status,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"reguser\"")],
                body,
            )
                .into_response();
        }
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Parse a required, non-nil UUID query parameter
fn parse_id(raw: Option<&str>, name: &'static str) -> ApiResult<Uuid> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing {}", name)))?;
    let id = Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("invalid {}: {}", name, e)))?;
    if id.is_nil() {
        return Err(ApiError::BadRequest(format!("{} must not be nil", name)));
    }
    Ok(id)
}

fn parse_query(raw: Option<String>) -> ApiResult<String> {
    raw.filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing q".to_string()))
}

/// Stream entities as one JSON array, written as items arrive.
///
/// The array is always well formed: a truncated stream still ends with `]`.
/// Dropping the body (client gone) drops the entity stream, which cancels
/// its producers.
fn json_array<T, D>(entities: EntityStream<T>, to_dto: fn(T) -> D) -> Response
where
    T: Send + 'static,
    D: Serialize + 'static,
{
    let open = stream::once(async { Ok::<_, serde_json::Error>(Bytes::from_static(b"[")) });
    let items = entities
        .enumerate()
        .map(move |(i, entity)| -> Result<Bytes, serde_json::Error> {
            let mut buf = if i == 0 { Vec::new() } else { vec![b','] };
            serde_json::to_writer(&mut buf, &to_dto(entity))?;
            Ok(Bytes::from(buf))
        });
    let close = stream::once(async { Ok::<_, serde_json::Error>(Bytes::from_static(b"]\n")) });

    (
        [(header::CONTENT_TYPE, "application/json")],
        Body::from_stream(open.chain(items).chain(close)),
    )
        .into_response()
}

// ============================================================================
// User Handlers
// ============================================================================

/// POST /user/create
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserDto>)> {
    let Json(req) = payload?;
    let token = state.request_token();
    let user = state
        .registry
        .users
        .create(&token, User::new(req.name, req.data))
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /user/read?uid=
pub async fn read_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<UserDto>> {
    let id = UserId::from(parse_id(query.uid.as_deref(), "uid")?);
    let token = state.request_token();
    let user = state.registry.users.read(&token, id).await?;
    Ok(Json(user.into()))
}

/// DELETE /user/delete?uid=
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<UserDto>> {
    let id = UserId::from(parse_id(query.uid.as_deref(), "uid")?);
    let token = state.request_token();
    let user = state.registry.users.delete(&token, id).await?;
    Ok(Json(user.into()))
}

/// GET /user/search?q=
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Response> {
    let q = parse_query(query.q)?;
    let token = state.request_token();
    let users = state.registry.users.search(&token, &q).await?;
    Ok(json_array(users, UserDto::from))
}

/// GET /user/get_groups?uid=
pub async fn groups_of_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Response> {
    let id = UserId::from(parse_id(query.uid.as_deref(), "uid")?);
    let token = state.request_token();
    let groups = state.registry.membership.groups_of_user(&token, id).await?;
    Ok(json_array(groups, GroupDto::from))
}

// ============================================================================
// Group Handlers
// ============================================================================

/// POST /group/create
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<GroupDto>)> {
    let Json(req) = payload?;
    let token = state.request_token();
    let group = state
        .registry
        .groups
        .create(&token, Group::new(req.name))
        .await?;
    Ok((StatusCode::CREATED, Json(group.into())))
}

/// GET /group/read?uid=
pub async fn read_group(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<GroupDto>> {
    let id = GroupId::from(parse_id(query.uid.as_deref(), "uid")?);
    let token = state.request_token();
    let group = state.registry.groups.read(&token, id).await?;
    Ok(Json(group.into()))
}

/// DELETE /group/delete?uid=
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<GroupDto>> {
    let id = GroupId::from(parse_id(query.uid.as_deref(), "uid")?);
    let token = state.request_token();
    let group = state.registry.groups.delete(&token, id).await?;
    Ok(Json(group.into()))
}

/// GET /group/search?q=
pub async fn search_groups(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Response> {
    let q = parse_query(query.q)?;
    let token = state.request_token();
    let groups = state.registry.groups.search(&token, &q).await?;
    Ok(json_array(groups, GroupDto::from))
}

/// GET /group/get_users?uid=
pub async fn users_of_group(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Response> {
    let id = GroupId::from(parse_id(query.uid.as_deref(), "uid")?);
    let token = state.request_token();
    let users = state.registry.membership.users_of_group(&token, id).await?;
    Ok(json_array(users, UserDto::from))
}

// ============================================================================
// Membership Handlers
// ============================================================================

/// Both ids must name existing entities before the link is touched.
async fn resolve_pair(state: &AppState, query: &LinkQuery) -> ApiResult<(UserId, GroupId)> {
    let user = UserId::from(parse_id(query.uid.as_deref(), "uid")?);
    let group = GroupId::from(parse_id(query.gid.as_deref(), "gid")?);

    let token = state.request_token();
    state.registry.users.read(&token, user).await?;
    state.registry.groups.read(&token, group).await?;
    Ok((user, group))
}

/// GET /user/add_group?uid=&gid=, GET /group/add_user?uid=&gid=
pub async fn add_user_to_group(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LinkQuery>,
) -> ApiResult<Json<StatusResponse>> {
    let (user, group) = resolve_pair(&state, &query).await?;
    let token = state.request_token();
    state
        .registry
        .membership
        .add_user_to_group(&token, user, group)
        .await?;
    Ok(Json(StatusResponse::ok()))
}

/// GET /user/delete_group?uid=&gid=, GET /group/delete_user?uid=&gid=
pub async fn remove_user_from_group(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LinkQuery>,
) -> ApiResult<Json<StatusResponse>> {
    let (user, group) = resolve_pair(&state, &query).await?;
    let token = state.request_token();
    state
        .registry
        .membership
        .remove_user_from_group(&token, user, group)
        .await?;
    Ok(Json(StatusResponse::ok()))
}
