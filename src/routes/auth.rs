use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use serde_json::json;

use crate::auth;
use crate::db::models::{User, USER_COLUMNS};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me).delete(delete_me))
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Handlers --

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Response> {
    let email = req.email.trim().to_lowercase();

    let mut messages = Vec::new();
    if email.is_empty() {
        messages.push("Email is required".to_string());
    } else if !is_valid_email(&email) {
        messages.push("Email is invalid".to_string());
    }
    if req.password.len() < 6 {
        messages.push("Password must be at least 6 characters".to_string());
    }
    if !messages.is_empty() {
        return Err(AppError::Validation(messages));
    }

    let display_name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_display_name(&email));
    let phone_number = req
        .phone_number
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = {
        let conn = state.db.get()?;
        let user_id = uuid::Uuid::now_v7().to_string();

        let inserted = conn.execute(
            "INSERT INTO users (id, email, password_hash, display_name, phone_number)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, email, password_hash, display_name, phone_number],
        );
        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                return Err(AppError::Validation(vec![
                    "Email is already registered".to_string(),
                ]));
            }
            return Err(e.into());
        }

        fetch_user(&conn, &user_id)?.ok_or(AppError::NotFound)?
    };

    Ok((StatusCode::CREATED, Json(json!({ "user": user }))).into_response())
}

/// Login with lockout. The failed-attempt increment and the lock decision
/// happen in a single conditional UPDATE, so two concurrent failures cannot
/// under-count the threshold.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    let email = req.email.trim().to_lowercase();
    let max_attempts = state.config.auth.max_login_attempts;

    let conn = state.db.get()?;

    // Inactive accounts are excluded here on purpose: a locked account is
    // indistinguishable from a nonexistent one at this endpoint.
    let user = conn
        .query_row(
            &format!(
                "SELECT {} FROM users WHERE email = ?1 AND is_active = 1",
                USER_COLUMNS
            ),
            params![email],
            User::from_row,
        )
        .optional()?;

    let Some(user) = user else {
        return Err(AppError::InvalidCredentials { remaining: None });
    };

    let password_ok = bcrypt::verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !password_ok {
        let (attempts, still_active): (i64, bool) = conn.query_row(
            "UPDATE users SET
                 login_attempts = login_attempts + 1,
                 is_active = CASE WHEN login_attempts + 1 >= ?1 THEN 0 ELSE is_active END,
                 updated_at = datetime('now')
             WHERE id = ?2
             RETURNING login_attempts, is_active",
            params![max_attempts, user.id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        if !still_active {
            return Err(AppError::Locked);
        }
        return Err(AppError::InvalidCredentials {
            remaining: Some(max_attempts - attempts),
        });
    }

    conn.execute(
        "UPDATE users SET login_attempts = 0, last_login_at = datetime('now'),
             updated_at = datetime('now')
         WHERE id = ?1",
        params![user.id],
    )?;
    let user = fetch_user(&conn, &user.id)?.ok_or(AppError::NotFound)?;

    let token = auth::issue_token(
        &user,
        &state.config.auth.jwt_secret,
        state.config.auth.token_days,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "user": user, "token": token, "loginAttempts": 0 })).into_response())
}

/// Unlike other token-gated routes, this one re-queries the account so a
/// deactivated user stops resolving here even with a live token.
async fn me(State(state): State<AppState>, caller: CurrentUser) -> AppResult<Response> {
    let conn = state.db.get()?;
    let user = conn
        .query_row(
            &format!(
                "SELECT {} FROM users WHERE id = ?1 AND is_active = 1",
                USER_COLUMNS
            ),
            params![caller.id],
            User::from_row,
        )
        .optional()?
        .ok_or(AppError::NotFound)?;

    Ok(Json(json!({ "user": user })).into_response())
}

/// Self-service account deletion. Owned photos and their children go with
/// the row via foreign-key cascades; stored images are removed best-effort.
async fn delete_me(State(state): State<AppState>, caller: CurrentUser) -> AppResult<Response> {
    let image_urls: Vec<String> = {
        let conn = state.db.get()?;

        let urls = {
            let mut stmt = conn.prepare("SELECT image_url FROM photos WHERE user_id = ?1")?;
            let urls: Vec<String> = stmt
                .query_map(params![caller.id], |row| row.get(0))?
                .filter_map(|r| r.ok())
                .collect();
            urls
        };

        let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![caller.id])?;
        if deleted == 0 {
            return Err(AppError::NotFound);
        }
        urls
    };

    for url in &image_urls {
        state.media.remove_by_url(url).await;
    }

    Ok(Json(json!({ "message": "Account deleted" })).into_response())
}

// -- Helpers --

fn fetch_user(conn: &Connection, id: &str) -> AppResult<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        User::from_row,
    )
    .optional()
    .map_err(Into::into)
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plain"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@x.com."));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[test]
    fn display_name_defaults_to_local_part() {
        assert_eq!(default_display_name("alice@x.com"), "alice");
    }
}
