//! Authentication routes: register, login, refresh, logout, and MFA.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    response::IntoResponse,
    routing::post,
};
use serde_json::json;
use tracing::{error, info};

use crate::AppState;
use crate::middleware::auth::AuthUser;
use novafin_core::auth::{
    generate_mfa_secret, hash_password, otpauth_url, verify_mfa_code, verify_password,
};
use novafin_db::entities::users;
use novafin_shared::auth::{
    LoginRequest, LoginResponse, LogoutRequest, MfaCodeRequest, MfaSetupResponse, RefreshRequest,
    RegisterRequest, UserInfo,
};

/// Creates the public auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

/// Creates the auth routes that require an authenticated user.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/mfa/setup", post(mfa_setup))
        .route("/auth/mfa/enable", post(mfa_enable))
        .route("/auth/mfa/disable", post(mfa_disable))
}

fn user_info(user: &users::Model) -> UserInfo {
    UserInfo {
        id: user.id,
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        client_id: user.client_id.clone(),
        account_number: user.account_number.clone(),
        role: user.role.clone(),
        mfa_enabled: user.mfa_enabled,
    }
}

fn internal_error(context: &str) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": format!("An error occurred during {context}")
        })),
    )
        .into_response()
}

fn invalid_credentials() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "invalid_credentials",
            "message": "Invalid email or password"
        })),
    )
        .into_response()
}

/// POST /auth/register - Register a new client account.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    let user_repo = state.users();

    match user_repo.email_exists(&payload.email).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "email_exists",
                    "message": "An account with this email already exists"
                })),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, "Database error checking email");
            return internal_error("registration");
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return internal_error("registration");
        }
    };

    let user = match user_repo
        .create(
            &payload.email,
            &password_hash,
            &payload.first_name,
            &payload.last_name,
        )
        .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "Failed to create user");
            return internal_error("registration");
        }
    };

    info!(user_id = %user.id, client_id = %user.client_id, "New client registered");

    (StatusCode::CREATED, Json(json!({ "user": user_info(&user) }))).into_response()
}

/// POST /auth/login - Authenticate and return a token pair.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user_repo = state.users();

    let user = match user_repo.find_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(email = %payload.email, "Login attempt for non-existent user");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return internal_error("login");
        }
    };

    if !user.is_active {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "account_disabled",
                "message": "This account has been disabled"
            })),
        )
            .into_response();
    }

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Failed login attempt - invalid password");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return internal_error("login");
        }
    }

    if user.mfa_enabled {
        let Some(secret) = user.mfa_secret.as_deref() else {
            error!(user_id = %user.id, "MFA enabled without a stored secret");
            return internal_error("login");
        };
        let Some(code) = payload.mfa_code.as_deref() else {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "mfa_required",
                    "message": "A TOTP code is required for this account"
                })),
            )
                .into_response();
        };
        match verify_mfa_code(secret, &user.email, code) {
            Ok(true) => {}
            Ok(false) => {
                info!(user_id = %user.id, "Failed login attempt - invalid MFA code");
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "invalid_mfa_code",
                        "message": "Invalid TOTP code"
                    })),
                )
                    .into_response();
            }
            Err(e) => {
                error!(error = %e, "MFA verification error");
                return internal_error("login");
            }
        }
    }

    let access_token = match state.jwt_service.generate_access_token(user.id, &user.role) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate access token");
            return internal_error("login");
        }
    };
    let refresh_token = match state.jwt_service.generate_refresh_token(user.id, &user.role) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate refresh token");
            return internal_error("login");
        }
    };

    let ttl_days = i64::try_from(state.config.jwt.refresh_token_expiry_secs / 86_400).unwrap_or(7);
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    if let Err(e) = state
        .sessions()
        .create(user.id, &refresh_token, ttl_days, user_agent, None)
        .await
    {
        error!(error = %e, "Failed to record session");
        return internal_error("login");
    }

    info!(user_id = %user.id, "User logged in successfully");

    let response = LoginResponse {
        user: user_info(&user),
        access_token,
        refresh_token,
        expires_in: state.jwt_service.access_token_expiry_secs(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// POST /auth/refresh - Exchange a refresh token for a new access token.
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> impl IntoResponse {
    let claims = match state.jwt_service.validate_token(&payload.refresh_token) {
        Ok(c) => c,
        Err(e) => {
            let (error, message) = match e {
                novafin_shared::JwtError::Expired => ("token_expired", "Refresh token has expired"),
                _ => ("invalid_token", "Invalid refresh token"),
            };
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": error, "message": message })),
            )
                .into_response();
        }
    };

    // The session must still be live; revocation beats token validity.
    match state.sessions().find_valid(&payload.refresh_token).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "session_revoked",
                    "message": "This session is no longer valid"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during refresh");
            return internal_error("token refresh");
        }
    }

    let access_token = match state
        .jwt_service
        .generate_access_token(claims.user_id(), &claims.role)
    {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate access token");
            return internal_error("token refresh");
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "access_token": access_token,
            "expires_in": state.jwt_service.access_token_expiry_secs()
        })),
    )
        .into_response()
}

/// POST /auth/logout - Revoke the session behind a refresh token.
async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutRequest>,
) -> impl IntoResponse {
    if let Err(e) = state.sessions().revoke(&payload.refresh_token).await {
        error!(error = %e, "Failed to revoke session");
        return internal_error("logout");
    }
    (StatusCode::NO_CONTENT, ()).into_response()
}

/// POST /auth/mfa/setup - Provision a TOTP secret for the account.
async fn mfa_setup(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    let user_repo = state.users();
    let account = match user_repo.find_by_id(user.user_id()).await {
        Ok(Some(u)) => u,
        Ok(None) => return internal_error("MFA setup"),
        Err(e) => {
            error!(error = %e, "Database error during MFA setup");
            return internal_error("MFA setup");
        }
    };

    let secret = generate_mfa_secret();
    let url = match otpauth_url(&secret, &account.email) {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "Failed to build otpauth URL");
            return internal_error("MFA setup");
        }
    };

    if let Err(e) = user_repo.set_mfa_secret(account.id, &secret).await {
        error!(error = %e, "Failed to store MFA secret");
        return internal_error("MFA setup");
    }

    (
        StatusCode::OK,
        Json(MfaSetupResponse {
            secret,
            otpauth_url: url,
        }),
    )
        .into_response()
}

/// POST /auth/mfa/enable - Enable MFA after verifying a code.
async fn mfa_enable(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<MfaCodeRequest>,
) -> impl IntoResponse {
    verify_and_toggle_mfa(&state, user.user_id(), &payload.code, true).await
}

/// POST /auth/mfa/disable - Disable MFA; requires a valid current code.
async fn mfa_disable(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<MfaCodeRequest>,
) -> impl IntoResponse {
    verify_and_toggle_mfa(&state, user.user_id(), &payload.code, false).await
}

async fn verify_and_toggle_mfa(
    state: &AppState,
    user_id: uuid::Uuid,
    code: &str,
    enable: bool,
) -> axum::response::Response {
    let user_repo = state.users();
    let account = match user_repo.find_by_id(user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => return internal_error("MFA update"),
        Err(e) => {
            error!(error = %e, "Database error during MFA update");
            return internal_error("MFA update");
        }
    };

    let Some(secret) = account.mfa_secret.as_deref() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "mfa_not_provisioned",
                "message": "Run MFA setup before enabling or disabling"
            })),
        )
            .into_response();
    };

    match verify_mfa_code(secret, &account.email, code) {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_mfa_code",
                    "message": "Invalid TOTP code"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "MFA verification error");
            return internal_error("MFA update");
        }
    }

    let result = if enable {
        user_repo.enable_mfa(account.id).await
    } else {
        user_repo.disable_mfa(account.id).await
    };
    if let Err(e) = result {
        error!(error = %e, "Failed to update MFA state");
        return internal_error("MFA update");
    }

    info!(user_id = %account.id, enabled = enable, "MFA state changed");
    (StatusCode::OK, Json(json!({ "mfa_enabled": enable }))).into_response()
}
