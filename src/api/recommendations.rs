//! Recommendation endpoint.

use axum::{
    extract::{Path, State},
    Extension,
};

use super::groups::member_group;
use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Identity, Recommendation};
use crate::AppState;

/// GET /api/groups/{code}/recommendations - Generated activity
/// suggestions, for members of a ready group only.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
) -> ApiResult<Recommendation> {
    let group = member_group(&state, &code, &identity).await?;

    if !group.is_ready() {
        return Err(AppError::Validation(
            "Recommendations unlock once the group has at least two members and everyone has submitted preferences".to_string(),
        ));
    }

    let recommendation = state.recs.recommendations_for(&group).await?;
    success(recommendation)
}
