use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};
use serde::Deserialize;
use serde_json::json;

use crate::db::models::{User, USER_COLUMNS};
use crate::error::{AppError, AppResult};
use crate::extractors::AdminUser;
use crate::moderation::{ReportAction, ReportStatus};
use crate::query;
use crate::routes::reports::ReportView;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", put(update_user))
        .route("/admin/stats", get(stats))
        .route("/admin/reports", get(list_reports))
        .route("/admin/reports/{id}", put(transition_report))
}

// -- Users --

async fn list_users(State(state): State<AppState>, _admin: AdminUser) -> AppResult<Response> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users ORDER BY created_at DESC, id DESC",
        USER_COLUMNS
    ))?;
    let users: Vec<User> = stmt
        .query_map([], User::from_row)?
        .filter_map(|r| r.ok())
        .collect();

    Ok(Json(users).into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub display_name: Option<String>,
}

async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<Response> {
    if let Some(ref role) = req.role {
        if role != "user" && role != "admin" {
            return Err(AppError::Validation(vec![
                "Role must be user or admin".to_string(),
            ]));
        }
    }
    if let Some(ref name) = req.display_name {
        if name.trim().is_empty() {
            return Err(AppError::Validation(vec![
                "Display name cannot be empty".to_string(),
            ]));
        }
    }

    let conn = state.db.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            User::from_row,
        )
        .optional()?
        .ok_or(AppError::NotFound)?;

    let role = req.role.unwrap_or(user.role);
    let is_active = req.is_active.unwrap_or(user.is_active);
    let display_name = req
        .display_name
        .map(|n| n.trim().to_string())
        .unwrap_or(user.display_name);
    // Re-activating an account also clears its failed-login counter
    let login_attempts = if is_active && !user.is_active {
        0
    } else {
        user.login_attempts
    };

    conn.execute(
        "UPDATE users SET role = ?1, is_active = ?2, display_name = ?3, \
         login_attempts = ?4, updated_at = datetime('now')
         WHERE id = ?5",
        params![role, is_active, display_name, login_attempts, id],
    )?;

    let user = conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        User::from_row,
    )?;
    Ok(Json(json!({ "user": user })).into_response())
}

// -- Stats --

/// Dashboard counters, each computed by a direct aggregate query at
/// request time. "Today" is the current UTC calendar day.
async fn stats(State(state): State<AppState>, _admin: AdminUser) -> AppResult<Response> {
    let conn = state.db.get()?;

    let total_users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
    let new_users_today: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE date(created_at) = date('now')",
        [],
        |r| r.get(0),
    )?;
    let total_photos: i64 = conn.query_row("SELECT COUNT(*) FROM photos", [], |r| r.get(0))?;
    let pending_reports: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reports WHERE status = 'pending'",
        [],
        |r| r.get(0),
    )?;

    Ok(Json(json!({
        "totalUsers": total_users,
        "newUsersToday": new_users_today,
        "totalPhotos": total_photos,
        "pendingReports": pending_reports,
        // No deletion audit trail exists, so this is always zero
        "usersDeletedToday": 0,
    }))
    .into_response())
}

// -- Reports --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportListParams {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

const REPORT_VIEW_SQL: &str = "SELECT r.id, r.reporter_id, r.target_type, r.target_id, \
     r.photo_id, r.reason, r.status, r.resolved_by, r.resolved_at, r.created_at, \
     CASE r.target_type \
         WHEN 'photo' THEN (SELECT p.name FROM photos p WHERE p.id = r.target_id) \
         ELSE (SELECT c.body FROM comments c WHERE c.id = r.target_id) \
     END AS target_preview \
     FROM reports r";

fn report_view_from_row(row: &rusqlite::Row) -> rusqlite::Result<ReportView> {
    Ok(ReportView {
        id: row.get("id")?,
        reporter_id: row.get("reporter_id")?,
        target_type: row.get("target_type")?,
        target_id: row.get("target_id")?,
        photo_id: row.get("photo_id")?,
        reason: row.get("reason")?,
        status: row.get("status")?,
        resolved_by: row.get("resolved_by")?,
        resolved_at: row.get("resolved_at")?,
        created_at: row.get("created_at")?,
        target_preview: row.get("target_preview")?,
    })
}

async fn list_reports(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<ReportListParams>,
) -> AppResult<Response> {
    let status = params
        .status
        .as_deref()
        .map(str::trim)
        .and_then(ReportStatus::parse);
    let page = query::parse_positive(&params.page, query::DEFAULT_PAGE);
    let limit = query::parse_positive(&params.limit, query::DEFAULT_LIMIT);
    let offset = (page - 1) * limit;

    let (where_sql, mut bind): (&str, Vec<Value>) = match status {
        Some(status) => (
            " WHERE r.status = ?",
            vec![Value::Text(status.as_str().to_string())],
        ),
        None => ("", Vec::new()),
    };

    let conn = state.db.get()?;
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM reports r{}", where_sql),
        params_from_iter(bind.iter()),
        |r| r.get(0),
    )?;

    bind.push(Value::Integer(limit));
    bind.push(Value::Integer(offset));
    let mut stmt = conn.prepare(&format!(
        "{}{} ORDER BY r.created_at DESC, r.id DESC LIMIT ? OFFSET ?",
        REPORT_VIEW_SQL, where_sql
    ))?;
    let reports: Vec<ReportView> = stmt
        .query_map(params_from_iter(bind.iter()), report_view_from_row)?
        .filter_map(|r| r.ok())
        .collect();

    Ok(Json(json!({
        "reports": reports,
        "totalCount": total,
        "totalPages": query::total_pages(total, limit),
        "currentPage": page,
    }))
    .into_response())
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub action: String,
}

/// Pending reports move exactly once, to resolved or dismissed. Resolving
/// leaves the reported content in place; only the report row changes.
async fn transition_report(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> AppResult<Response> {
    let action = ReportAction::parse(req.action.trim())
        .ok_or_else(|| AppError::BadRequest("Action must be resolve or dismiss".to_string()))?;

    let conn = state.db.get()?;

    let current: String = conn
        .query_row(
            "SELECT status FROM reports WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(AppError::NotFound)?;

    let current = ReportStatus::parse(&current)
        .ok_or_else(|| AppError::Internal(format!("unknown report status {}", current)))?;
    if current.is_terminal() {
        return Err(AppError::BadRequest(
            "Report has already been handled".to_string(),
        ));
    }

    conn.execute(
        "UPDATE reports SET status = ?1, resolved_by = ?2, resolved_at = datetime('now')
         WHERE id = ?3",
        params![action.target_status().as_str(), admin.id, id],
    )?;

    let report = conn.query_row(
        &format!("{} WHERE r.id = ?1", REPORT_VIEW_SQL),
        params![id],
        report_view_from_row,
    )?;
    Ok(Json(json!({ "report": report })).into_response())
}
