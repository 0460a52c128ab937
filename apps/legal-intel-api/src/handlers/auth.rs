//! Account handlers: register, login, profile, password, user listing

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{jwt, password, AdminUser, AuthUser, Role};
use crate::error::ApiError;
use crate::models::{
    ChangePasswordRequest, DbUser, LoginRequest, MessageResponse, RegisterRequest, TokenResponse,
    UpdateUserRequest, UserResponse,
};
use crate::state::AppState;

const USER_COLUMNS: &str = "id, email, full_name, role, password_hash, created_at, last_login";

async fn find_by_email(state: &AppState, email: &str) -> Result<Option<DbUser>, ApiError> {
    let user = sqlx::query_as(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(email)
        .fetch_optional(&state.db)
        .await?;
    Ok(user)
}

async fn find_by_id(state: &AppState, id: &str) -> Result<DbUser, ApiError> {
    let user: Option<DbUser> =
        sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    user.ok_or(ApiError::UserNotFound)
}

fn validate_full_name(full_name: &str) -> Result<String, ApiError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(ApiError::InvalidRequest("full_name is required".to_string()));
    }
    Ok(full_name.to_string())
}

/// Handler: POST /api/auth/register
///
/// The first account created becomes the admin.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let email = password::normalize_email(&req.email).map_err(ApiError::InvalidRequest)?;
    password::validate_password_strength(&req.password).map_err(ApiError::InvalidRequest)?;
    let full_name = validate_full_name(&req.full_name)?;

    if find_by_email(&state, &email).await?.is_some() {
        return Err(ApiError::Conflict(format!("User {} already exists", email)));
    }

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await?;
    let role = if existing == 0 { Role::Admin } else { Role::User };

    let user = DbUser {
        id: Uuid::new_v4().to_string(),
        email,
        full_name,
        role: role.as_str().to_string(),
        password_hash: password::hash_password(&req.password)?,
        created_at: Utc::now(),
        last_login: None,
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, email, full_name, role, password_hash, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.full_name)
    .bind(&user.role)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
            ApiError::Conflict(format!("User {} already exists", user.email))
        } else {
            ApiError::Database(e)
        }
    })?;

    tracing::info!("Registered {} as {}", user.email, role);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Handler: POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let invalid = || ApiError::Unauthorized("Incorrect email or password".to_string());

    let email = password::normalize_email(&req.email).map_err(|_| invalid())?;
    let mut user = find_by_email(&state, &email).await?.ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash) {
        tracing::warn!("Failed login for {}", email);
        return Err(invalid());
    }

    let now = Utc::now();
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(now)
        .bind(&user.id)
        .execute(&state.db)
        .await?;
    user.last_login = Some(now);

    let ttl = state.config.token_ttl_seconds();
    let access_token = jwt::issue_token(
        &user.id,
        &user.email,
        user.role(),
        &state.config.jwt_secret,
        ttl,
    )
    .map_err(|e| ApiError::Internal(e.into()))?;

    tracing::info!("User {} logged in", user.email);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_in: ttl,
        user: user.into(),
    }))
}

/// Handler: GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(find_by_id(&state, &user.id).await?.into()))
}

/// Handler: PUT /api/auth/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let full_name = validate_full_name(&req.full_name)?;

    let result = sqlx::query("UPDATE users SET full_name = ? WHERE id = ?")
        .bind(&full_name)
        .bind(&user.id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::UserNotFound);
    }

    Ok(Json(find_by_id(&state, &user.id).await?.into()))
}

/// Handler: POST /api/auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let stored = find_by_id(&state, &user.id).await?;

    if !password::verify_password(&req.current_password, &stored.password_hash) {
        return Err(ApiError::InvalidRequest(
            "Current password is incorrect".to_string(),
        ));
    }
    password::validate_password_strength(&req.new_password).map_err(ApiError::InvalidRequest)?;

    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(password::hash_password(&req.new_password)?)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    tracing::info!("Password changed for {}", user.email);

    Ok(Json(MessageResponse::ok("Password changed successfully")))
}

/// Handler: GET /api/auth/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users: Vec<DbUser> = sqlx::query_as(&format!(
        "SELECT {} FROM users ORDER BY created_at ASC",
        USER_COLUMNS
    ))
    .fetch_all(&state.db)
    .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
