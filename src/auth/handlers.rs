use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        credentials::{hash_password, verify_password},
        dto::{
            LoginRequest, OtpResponse, ResetRequest, SignupRequest, SignupResponse, TokenResponse,
            UpdateProfileRequest, VerifyOtpRequest,
        },
        jwt::{AuthUser, JwtKeys},
        repo::User,
        reset,
    },
    error::{is_unique_violation, ApiError},
    response::{envelope, messages, Envelope},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Envelope<SignupResponse>>), ApiError> {
    payload.email = payload.email.trim().to_string();
    payload.name = payload.name.trim().to_string();

    if payload.name.is_empty() {
        return Err(ApiError::InvalidInput("Missing required fields.".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::InvalidInput("Invalid email.".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::InvalidInput("Password too short.".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("User already exists.".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.name, &payload.email, &hash)
        .await
        .map_err(|e| {
            // A concurrent signup for the same email loses here.
            if is_unique_violation(&e) {
                ApiError::Conflict("User already exists.".into())
            } else {
                e.into()
            }
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(envelope(
            messages::REGISTERED,
            SignupResponse { user_id: user.id },
        )),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<Envelope<TokenResponse>>, ApiError> {
    payload.email = payload.email.trim().to_string();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::InvalidInput("Invalid email or password.".into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidInput("Invalid email or password.".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(envelope(messages::LOGGED_IN, TokenResponse { token })))
}

/// Shared by /forget-password and /send-otp: the resend path is the same
/// issue-and-supersede flow.
async fn issue_otp_for(
    state: &AppState,
    email: &str,
) -> Result<Json<Envelope<OtpResponse>>, ApiError> {
    let user = User::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "otp request for unknown email");
            ApiError::NotFound("User not found.".into())
        })?;

    let otp = reset::issue_code(state.otp_cache.as_ref(), &state.config.otp, &user.email).await?;

    info!(email = %user.email, "otp issued for password reset");
    Ok(Json(envelope(messages::NOTIFICATION_SENT, OtpResponse { otp })))
}

#[instrument(skip(state, payload))]
pub async fn forget_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<Envelope<OtpResponse>>, ApiError> {
    issue_otp_for(&state, payload.email.trim()).await
}

#[instrument(skip(state, payload))]
pub async fn send_otp(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<Envelope<OtpResponse>>, ApiError> {
    issue_otp_for(&state, payload.email.trim()).await
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<Envelope<serde_json::Value>>, ApiError> {
    let email = payload.email.trim();

    // Atomic compare-and-delete: of two racing verifications, one consumes
    // the code and the other sees it as gone.
    reset::consume_code(state.otp_cache.as_ref(), email, &payload.otp)
        .await
        .map_err(|e| {
            warn!(email = %email, "otp verification failed");
            e
        })?;

    let hash = hash_password(&payload.new_password)?;
    let updated = User::update_password(&state.db, email, &hash).await?;
    if updated == 0 {
        warn!(email = %email, "password reset for unknown user");
        return Err(ApiError::NotFound("User not found.".into()));
    }

    info!(email = %email, "password reset completed");
    Ok(Json(envelope(messages::PASSWORD_RESET, serde_json::json!({}))))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Envelope<User>>, ApiError> {
    let user = User::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".into()))?;

    info!(user_id = %user.id, "profile retrieved");
    Ok(Json(envelope(messages::PROFILE_FETCHED, user)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Envelope<User>>, ApiError> {
    if let Some(email) = payload.email.as_deref() {
        if !is_valid_email(email) {
            warn!(user_id = %auth.id, "profile update with invalid email");
            return Err(ApiError::InvalidInput("Invalid email.".into()));
        }
    }

    // A new password is re-hashed before it touches the store.
    let password_hash = match payload.password.as_deref() {
        Some(plain) => Some(hash_password(plain)?),
        None => None,
    };

    let user = User::update_profile(
        &state.db,
        auth.id,
        payload.name.as_deref(),
        payload.email.as_deref(),
        password_hash.as_deref(),
        payload.profile_picture.as_deref(),
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("User already exists.".into())
        } else {
            ApiError::from(e)
        }
    })?
    .ok_or_else(|| ApiError::NotFound("User not found.".into()))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(envelope(messages::PROFILE_UPDATED, user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("someone@example.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn email_is_matched_case_sensitively_as_stored() {
        // Both forms are valid; they are distinct identities in the store.
        assert!(is_valid_email("Someone@Example.com"));
        assert!(is_valid_email("someone@example.com"));
    }
}
