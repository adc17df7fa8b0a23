//! Authentication handlers.

use actix_web::{HttpResponse, web};

use postboard_core::domain::NewUser;
use postboard_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn issue_token(state: &AppState, user_id: i32, username: &str) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user_id, username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse::bearer(
        token,
        state.tokens.expiration_seconds().max(0) as u64,
    ))
}

/// POST /auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate().map_err(AppError::Validation)?;

    if state.users.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = state
        .passwords
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = state
        .users
        .create(NewUser::new(req.username, password_hash))
        .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(HttpResponse::Created().json(issue_token(&state, user.id, &user.username)?))
}

/// POST /auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = state
        .passwords
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        tracing::warn!(user_id = user.id, "Rejected login");
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(issue_token(&state, user.id, &user.username)?))
}

/// GET /auth/me - Protected route
pub async fn me(identity: Identity, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", identity.user_id)))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id,
        username: user.username,
        created_at: user.created_at,
    }))
}
