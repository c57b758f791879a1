//! Group endpoints: create, join, view, submit preferences, live events.

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use tokio_stream::{Stream, StreamExt};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateGroupRequest, Group, Identity, PreferenceFields};
use crate::AppState;

/// POST /api/groups - Create a group with the caller as founding member.
pub async fn create_group(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<CreateGroupRequest>,
) -> ApiResult<Group> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Group name is required".to_string(),
        ));
    }

    let group = state.repo.create_group(&identity, name).await?;
    success(group)
}

/// POST /api/groups/{code}/join - Join a group by code. Joining a group
/// the caller already belongs to is a no-op success.
pub async fn join_group(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
) -> ApiResult<Group> {
    let group = state.repo.join_group(&code, &identity).await?;
    state.watch.publish(&group).await;
    success(group)
}

/// GET /api/groups/{code} - A group snapshot, for members only.
pub async fn get_group(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
) -> ApiResult<Group> {
    let group = member_group(&state, &code, &identity).await?;
    success(group)
}

/// PUT /api/groups/{code}/preferences - Replace the caller's preferences.
pub async fn submit_preferences(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
    Json(fields): Json<PreferenceFields>,
) -> ApiResult<Group> {
    let group = state
        .repo
        .submit_preferences(&code, &identity, &fields)
        .await?;
    state.watch.publish(&group).await;
    success(group)
}

/// GET /api/groups/{code}/events - Live group snapshots as server-sent
/// events. The first event is the current snapshot; closing the
/// connection unsubscribes.
pub async fn group_events(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    member_group(&state, &code, &identity).await?;

    let snapshots = state.watch.subscribe(&state.repo, &code).await?;
    let events = snapshots.map(|group| Event::default().json_data(&group));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Fetch a group and require the caller to be a member of it.
pub(super) async fn member_group(
    state: &AppState,
    code: &str,
    identity: &Identity,
) -> Result<Group, AppError> {
    let group = state
        .repo
        .get_group(code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", code)))?;

    if group.member(&identity.uid).is_none() {
        return Err(AppError::NotAMember(format!(
            "You are not a member of group {}",
            group.code
        )));
    }

    Ok(group)
}
