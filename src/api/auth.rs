//! Sign-up, sign-in and session endpoints.

use axum::{extract::State, http::HeaderMap, Extension, Json};

use super::{success, ApiResult};
use crate::auth;
use crate::errors::AppError;
use crate::models::{Identity, SessionResponse, SignInRequest, SignUpRequest};
use crate::AppState;

/// POST /api/auth/signup - Create an account and start a session.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> ApiResult<SessionResponse> {
    let name = request.name.trim();
    let email = request.email.trim();

    if name.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&request.password)?;
    let profile = state.repo.create_user(name, email, &password_hash).await?;

    let identity = Identity {
        uid: profile.uid,
        name: profile.name,
        email: profile.email,
        photo_url: profile.profile_picture,
    };
    let token = start_session(&state, &identity.uid).await?;

    success(SessionResponse { identity, token })
}

/// POST /api/auth/signin - Verify credentials and start a session.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> ApiResult<SessionResponse> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    // Unknown email and wrong password are indistinguishable to the caller.
    let Some((profile, password_hash)) =
        state.repo.get_user_by_email(request.email.trim()).await?
    else {
        return Err(AppError::Auth("Invalid email or password".to_string()));
    };

    if !auth::verify_password(&request.password, &password_hash)? {
        return Err(AppError::Auth("Invalid email or password".to_string()));
    }

    let identity = Identity {
        uid: profile.uid,
        name: profile.name,
        email: profile.email,
        photo_url: profile.profile_picture,
    };
    let token = start_session(&state, &identity.uid).await?;

    success(SessionResponse { identity, token })
}

/// POST /api/auth/signout - End the caller's session, if any.
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<()> {
    if let Some(raw) = auth::bearer_token(&headers) {
        state
            .repo
            .delete_session(&auth::hash_session_token(raw))
            .await?;
    }
    success(())
}

/// GET /api/auth/me - The caller's identity.
pub async fn me(Extension(identity): Extension<Identity>) -> ApiResult<Identity> {
    success(identity)
}

async fn start_session(state: &AppState, uid: &str) -> Result<String, AppError> {
    let token = auth::generate_session_token();
    state
        .repo
        .create_session(
            &auth::hash_session_token(&token),
            uid,
            state.config.session_ttl_hours,
        )
        .await?;
    Ok(token)
}
