use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::models::Report;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::moderation::{validate_reason, TargetType};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/reports", post(create_report))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub target_type: String,
    pub target_id: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: String,
    pub reporter_id: String,
    pub target_type: String,
    pub target_id: String,
    pub photo_id: String,
    pub reason: String,
    pub status: String,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<String>,
    pub created_at: String,
    /// Photo name or comment text, resolved at query time. Absent when the
    /// target has since been deleted.
    pub target_preview: Option<String>,
}

impl ReportView {
    pub fn from_report(report: Report, target_preview: Option<String>) -> Self {
        ReportView {
            id: report.id,
            reporter_id: report.reporter_id,
            target_type: report.target_type,
            target_id: report.target_id,
            photo_id: report.photo_id,
            reason: report.reason,
            status: report.status,
            resolved_by: report.resolved_by,
            resolved_at: report.resolved_at,
            created_at: report.created_at,
            target_preview,
        }
    }
}

/// Any authenticated user may report a photo or a comment. The owning
/// photo id is derived here and stored on the report, so later lookups
/// never have to traverse from the comment.
async fn create_report(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<CreateReportRequest>,
) -> AppResult<Response> {
    let target_type = TargetType::parse(req.target_type.trim())
        .ok_or_else(|| AppError::Validation(vec!["Target type must be photo or comment".into()]))?;
    let reason = validate_reason(&req.reason).map_err(|msg| AppError::Validation(vec![msg]))?;

    let conn = state.db.get()?;

    let (photo_id, target_preview) = resolve_target(&conn, target_type, &req.target_id)?;

    let report_id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO reports (id, reporter_id, target_type, target_id, photo_id, reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            report_id,
            caller.id,
            target_type.as_str(),
            req.target_id,
            photo_id,
            reason,
        ],
    )?;

    let report = conn.query_row(
        "SELECT id, reporter_id, target_type, target_id, photo_id, reason, status, \
         resolved_by, resolved_at, created_at FROM reports WHERE id = ?1",
        params![report_id],
        Report::from_row,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "report": ReportView::from_report(report, target_preview) })),
    )
        .into_response())
}

fn resolve_target(
    conn: &Connection,
    target_type: TargetType,
    target_id: &str,
) -> AppResult<(String, Option<String>)> {
    match target_type {
        TargetType::Photo => {
            let name: Option<String> = conn
                .query_row(
                    "SELECT name FROM photos WHERE id = ?1",
                    params![target_id],
                    |row| row.get(0),
                )
                .optional()?;
            match name {
                Some(name) => Ok((target_id.to_string(), Some(name))),
                None => Err(AppError::NotFound),
            }
        }
        TargetType::Comment => {
            let row: Option<(String, String)> = conn
                .query_row(
                    "SELECT photo_id, body FROM comments WHERE id = ?1",
                    params![target_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            match row {
                Some((photo_id, body)) => Ok((photo_id, Some(body))),
                None => Err(AppError::NotFound),
            }
        }
    }
}
