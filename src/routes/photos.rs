use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::models::{Photo, PHOTO_COLUMNS};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::query::{self, build_photo_query, ListParams, PhotoQuery, Scope, PRICE_RANGES};
use crate::state::AppState;
use crate::storage::MediaStore;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/photos", get(list_photos).post(create_photo))
        .route("/photos/feed", get(public_feed))
        .route("/photos/public/{user_id}", get(public_profile))
        .route(
            "/photos/{id}",
            get(get_photo).put(update_photo).delete(delete_photo),
        )
        .route("/photos/{id}/like", post(toggle_like))
        .route("/photos/{id}/comments", post(create_comment))
        .route(
            "/photos/{id}/comments/{comment_id}",
            delete(delete_comment),
        )
}

// -- View structs --

/// The nested location object. Accepted from clients as a JSON-encoded
/// form field; a bare string is treated as an address without coordinates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoView {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub memo: String,
    pub address: Location,
    pub rating: i64,
    pub image_url: String,
    pub tags: Vec<String>,
    pub visited: bool,
    pub is_public: bool,
    pub price_range: Option<String>,
    pub visited_date: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_me: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub text: String,
    pub created_at: String,
}

/// Public profile header returned next to a user's public feed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: String,
    pub display_name: String,
    pub created_at: String,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

// -- Listing handlers --

async fn list_photos(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Response> {
    let q = build_photo_query(Scope::Owner(caller.id.clone()), &params);
    let conn = state.db.get()?;
    let (photos, total) = load_photo_page(&conn, &q, Some(&caller.id))?;
    Ok(Json(listing_body(photos, &q, total)).into_response())
}

async fn public_feed(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(params): Query<ListParams>,
) -> AppResult<Response> {
    let q = build_photo_query(Scope::Public, &params);
    let conn = state.db.get()?;
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let (photos, total) = load_photo_page(&conn, &q, viewer_id)?;
    Ok(Json(listing_body(photos, &q, total)).into_response())
}

async fn public_profile(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(user_id): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<Response> {
    let conn = state.db.get()?;

    let profile = conn
        .query_row(
            "SELECT id, display_name, created_at FROM users WHERE id = ?1 AND is_active = 1",
            params![user_id],
            |row| {
                Ok(ProfileView {
                    id: row.get(0)?,
                    display_name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .optional()?
        .ok_or(AppError::NotFound)?;

    let q = build_photo_query(Scope::PublicOf(user_id), &params);
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let (photos, total) = load_photo_page(&conn, &q, viewer_id)?;

    let mut body = listing_body(photos, &q, total);
    body["user"] = serde_json::to_value(profile).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(body).into_response())
}

async fn get_photo(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());

    let photo = load_photo_view(&conn, &id, viewer_id)?.ok_or(AppError::NotFound)?;
    if !photo.is_public && viewer_id != Some(photo.user_id.as_str()) {
        // A private photo someone else owns looks like a missing one
        return Err(AppError::NotFound);
    }

    let comments = load_comments(&conn, &id)?;
    Ok(Json(json!({ "photo": photo, "comments": comments })).into_response())
}

// -- Mutating handlers --

async fn create_photo(
    State(state): State<AppState>,
    caller: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let form = read_photo_form(&mut multipart, state.config.storage.max_upload_bytes).await?;

    let input = resolve_photo_input(&form, None).map_err(AppError::Validation)?;

    // Field validation happens before the image touches disk
    let (image_bytes, content_type) = match &form.image {
        Some((bytes, content_type)) => {
            if MediaStore::extension_for(content_type).is_none() {
                return Err(AppError::Validation(vec![format!(
                    "Unsupported image type {}",
                    content_type
                )]));
            }
            (bytes.as_slice(), content_type.as_str())
        }
        None => {
            return Err(AppError::Validation(vec!["Image is required".to_string()]));
        }
    };

    let image_url = state.media.save(image_bytes, content_type).await?;

    let photo_id = uuid::Uuid::now_v7().to_string();
    {
        let mut conn = state.db.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO photos (id, user_id, name, memo, address, latitude, longitude, \
             rating, image_url, visited, is_public, price_range, visited_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                photo_id,
                caller.id,
                input.name,
                input.memo,
                input.location.address,
                input.location.latitude,
                input.location.longitude,
                input.rating,
                image_url,
                input.visited,
                input.is_public,
                input.price_range,
                input.visited_date,
            ],
        )?;
        replace_tags(&tx, &photo_id, &input.tags)?;
        tx.commit()?;
    }

    let conn = state.db.get()?;
    let photo = load_photo_view(&conn, &photo_id, Some(&caller.id))?.ok_or(AppError::NotFound)?;
    Ok((StatusCode::CREATED, Json(json!({ "photo": photo }))).into_response())
}

async fn update_photo(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    // Ownership scoping: someone else's photo is indistinguishable from a
    // missing one.
    let existing = {
        let conn = state.db.get()?;
        let photo = conn
            .query_row(
                &format!(
                    "SELECT {} FROM photos p WHERE p.id = ?1 AND p.user_id = ?2",
                    PHOTO_COLUMNS
                ),
                params![id, caller.id],
                Photo::from_row,
            )
            .optional()?
            .ok_or(AppError::NotFound)?;
        let tags = load_tags(&conn, &photo.id)?;
        input_from_existing(&photo, tags)
    };
    let old_image_url = existing.image_url.clone();

    let form = read_photo_form(&mut multipart, state.config.storage.max_upload_bytes).await?;
    let input = resolve_photo_input(&form, Some(&existing)).map_err(AppError::Validation)?;

    let new_image_url = match &form.image {
        Some((bytes, content_type)) => {
            if MediaStore::extension_for(content_type).is_none() {
                return Err(AppError::Validation(vec![format!(
                    "Unsupported image type {}",
                    content_type
                )]));
            }
            Some(state.media.save(bytes, content_type).await?)
        }
        None => None,
    };
    let image_url = new_image_url.clone().unwrap_or_else(|| old_image_url.clone());

    {
        let mut conn = state.db.get()?;
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE photos SET name = ?1, memo = ?2, address = ?3, latitude = ?4, \
             longitude = ?5, rating = ?6, image_url = ?7, visited = ?8, is_public = ?9, \
             price_range = ?10, visited_date = ?11, updated_at = datetime('now')
             WHERE id = ?12 AND user_id = ?13",
            params![
                input.name,
                input.memo,
                input.location.address,
                input.location.latitude,
                input.location.longitude,
                input.rating,
                image_url,
                input.visited,
                input.is_public,
                input.price_range,
                input.visited_date,
                id,
                caller.id,
            ],
        )?;
        if updated == 0 {
            return Err(AppError::NotFound);
        }
        tx.execute("DELETE FROM photo_tags WHERE photo_id = ?1", params![id])?;
        replace_tags(&tx, &id, &input.tags)?;
        tx.commit()?;
    }

    if new_image_url.is_some() {
        state.media.remove_by_url(&old_image_url).await;
    }

    let conn = state.db.get()?;
    let photo = load_photo_view(&conn, &id, Some(&caller.id))?.ok_or(AppError::NotFound)?;
    Ok(Json(json!({ "photo": photo })).into_response())
}

async fn delete_photo(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let image_url: String = {
        let conn = state.db.get()?;
        conn.query_row(
            "DELETE FROM photos WHERE id = ?1 AND user_id = ?2 RETURNING image_url",
            params![id, caller.id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(AppError::NotFound)?
    };

    state.media.remove_by_url(&image_url).await;
    Ok(Json(json!({ "message": "Photo deleted" })).into_response())
}

async fn toggle_like(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    ensure_visible(&conn, &id, Some(&caller.id))?;

    let removed = conn.execute(
        "DELETE FROM photo_likes WHERE photo_id = ?1 AND user_id = ?2",
        params![id, caller.id],
    )?;
    if removed == 0 {
        conn.execute(
            "INSERT INTO photo_likes (photo_id, user_id) VALUES (?1, ?2)",
            params![id, caller.id],
        )?;
    }

    let like_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM photo_likes WHERE photo_id = ?1",
        params![id],
        |row| row.get(0),
    )?;

    Ok(Json(json!({ "liked": removed == 0, "likeCount": like_count })).into_response())
}

async fn create_comment(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<Response> {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation(vec![
            "Comment text is required".to_string(),
        ]));
    }
    if text.chars().count() > 500 {
        return Err(AppError::Validation(vec![
            "Comment must be at most 500 characters".to_string(),
        ]));
    }

    let conn = state.db.get()?;
    ensure_visible(&conn, &id, Some(&caller.id))?;

    let display_name: String = conn
        .query_row(
            "SELECT display_name FROM users WHERE id = ?1",
            params![caller.id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(AppError::NotFound)?;

    let comment_id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO comments (id, photo_id, user_id, body) VALUES (?1, ?2, ?3, ?4)",
        params![comment_id, id, caller.id, text],
    )?;

    let created_at: String = conn.query_row(
        "SELECT created_at FROM comments WHERE id = ?1",
        params![comment_id],
        |row| row.get(0),
    )?;

    let comment = CommentView {
        id: comment_id,
        user_id: caller.id,
        display_name,
        text,
        created_at,
    };
    Ok((StatusCode::CREATED, Json(json!({ "comment": comment }))).into_response())
}

async fn delete_comment(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path((photo_id, comment_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let conn = state.db.get()?;

    let author_id: String = conn
        .query_row(
            "SELECT user_id FROM comments WHERE id = ?1 AND photo_id = ?2",
            params![comment_id, photo_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(AppError::NotFound)?;

    if author_id != caller.id && !caller.is_admin() {
        return Err(AppError::NotFound);
    }

    conn.execute("DELETE FROM comments WHERE id = ?1", params![comment_id])?;
    Ok(Json(json!({ "message": "Comment deleted" })).into_response())
}

// -- Query helpers --

fn view_select_list() -> String {
    format!(
        "{}, \
         (SELECT COUNT(*) FROM photo_likes l WHERE l.photo_id = p.id) AS like_count, \
         (SELECT COUNT(*) FROM comments c WHERE c.photo_id = p.id) AS comment_count, \
         EXISTS (SELECT 1 FROM photo_likes l WHERE l.photo_id = p.id AND l.user_id = ?) \
             AS liked_by_me",
        PHOTO_COLUMNS
    )
}

fn photo_view_from_row(row: &rusqlite::Row) -> rusqlite::Result<PhotoView> {
    let photo = Photo::from_row(row)?;
    Ok(PhotoView {
        id: photo.id,
        user_id: photo.user_id,
        name: photo.name,
        memo: photo.memo,
        address: Location {
            address: photo.address,
            latitude: photo.latitude,
            longitude: photo.longitude,
        },
        rating: photo.rating,
        image_url: photo.image_url,
        tags: Vec::new(),
        visited: photo.visited,
        is_public: photo.is_public,
        price_range: photo.price_range,
        visited_date: photo.visited_date,
        like_count: row.get("like_count")?,
        comment_count: row.get("comment_count")?,
        liked_by_me: row.get("liked_by_me")?,
        created_at: photo.created_at,
        updated_at: photo.updated_at,
    })
}

/// Run a built listing query: pre-pagination total plus the page of views
/// with tags attached.
fn load_photo_page(
    conn: &Connection,
    q: &PhotoQuery,
    viewer: Option<&str>,
) -> AppResult<(Vec<PhotoView>, i64)> {
    let total: i64 = conn.query_row(&q.count_sql(), params_from_iter(q.params.iter()), |row| {
        row.get(0)
    })?;

    // The viewer placeholder in the select list binds first, the window last
    let mut bind: Vec<Value> = Vec::with_capacity(q.params.len() + 3);
    bind.push(Value::Text(viewer.unwrap_or("").to_string()));
    bind.extend(q.params.iter().cloned());
    bind.push(Value::Integer(q.limit));
    bind.push(Value::Integer(q.offset));

    let mut photos: Vec<PhotoView> = {
        let mut stmt = conn.prepare(&q.page_sql(&view_select_list()))?;
        let rows = stmt.query_map(params_from_iter(bind.iter()), photo_view_from_row)?;
        rows.collect::<Result<_, _>>()?
    };

    for photo in &mut photos {
        photo.tags = load_tags(conn, &photo.id)?;
    }

    Ok((photos, total))
}

fn load_photo_view(
    conn: &Connection,
    id: &str,
    viewer: Option<&str>,
) -> AppResult<Option<PhotoView>> {
    let sql = format!("SELECT {} FROM photos p WHERE p.id = ?", view_select_list());
    let photo = conn
        .query_row(
            &sql,
            params![viewer.unwrap_or(""), id],
            photo_view_from_row,
        )
        .optional()?;

    match photo {
        Some(mut photo) => {
            photo.tags = load_tags(conn, &photo.id)?;
            Ok(Some(photo))
        }
        None => Ok(None),
    }
}

fn load_tags(conn: &Connection, photo_id: &str) -> AppResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT tag FROM photo_tags WHERE photo_id = ?1 ORDER BY position ASC")?;
    let tags = stmt
        .query_map(params![photo_id], |row| row.get(0))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(tags)
}

fn load_comments(conn: &Connection, photo_id: &str) -> AppResult<Vec<CommentView>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.user_id, u.display_name, c.body, c.created_at
         FROM comments c
         JOIN users u ON u.id = c.user_id
         WHERE c.photo_id = ?1
         ORDER BY c.created_at ASC, c.id ASC",
    )?;
    let comments = stmt
        .query_map(params![photo_id], |row| {
            Ok(CommentView {
                id: row.get(0)?,
                user_id: row.get(1)?,
                display_name: row.get(2)?,
                text: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();
    Ok(comments)
}

fn replace_tags(conn: &Connection, photo_id: &str, tags: &[String]) -> AppResult<()> {
    for (position, tag) in tags.iter().enumerate() {
        conn.execute(
            "INSERT INTO photo_tags (photo_id, position, tag) VALUES (?1, ?2, ?3)",
            params![photo_id, position as i64, tag],
        )?;
    }
    Ok(())
}

/// 404 unless the photo exists and is either public or owned by the viewer.
fn ensure_visible(conn: &Connection, photo_id: &str, viewer: Option<&str>) -> AppResult<()> {
    let row: Option<(String, bool)> = conn
        .query_row(
            "SELECT user_id, is_public FROM photos WHERE id = ?1",
            params![photo_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match row {
        Some((_, true)) => Ok(()),
        Some((owner, false)) if viewer == Some(owner.as_str()) => Ok(()),
        _ => Err(AppError::NotFound),
    }
}

fn listing_body(photos: Vec<PhotoView>, q: &PhotoQuery, total: i64) -> serde_json::Value {
    json!({
        "photos": photos,
        "totalCount": total,
        "totalPages": query::total_pages(total, q.limit),
        "currentPage": q.page,
    })
}

// -- Form parsing --

#[derive(Debug, Default)]
struct PhotoForm {
    name: Option<String>,
    address: Option<String>,
    rating: Option<String>,
    memo: Option<String>,
    tags: Option<String>,
    visited: Option<String>,
    is_public: Option<String>,
    price_range: Option<String>,
    visited_date: Option<String>,
    image: Option<(Vec<u8>, String)>,
}

async fn read_photo_form(multipart: &mut Multipart, max_bytes: usize) -> AppResult<PhotoForm> {
    let mut form = PhotoForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => {
                let content_type = field.content_type().unwrap_or("").to_string();
                let bytes = field.bytes().await?;
                if bytes.len() > max_bytes {
                    return Err(AppError::Validation(vec![format!(
                        "Image exceeds the maximum upload size of {} bytes",
                        max_bytes
                    )]));
                }
                form.image = Some((bytes.to_vec(), content_type));
            }
            "name" => form.name = Some(field.text().await?),
            "address" => form.address = Some(field.text().await?),
            "rating" => form.rating = Some(field.text().await?),
            "memo" => form.memo = Some(field.text().await?),
            "tags" => form.tags = Some(field.text().await?),
            "visited" => form.visited = Some(field.text().await?),
            "isPublic" => form.is_public = Some(field.text().await?),
            "priceRange" => form.price_range = Some(field.text().await?),
            "visitedDate" => form.visited_date = Some(field.text().await?),
            _ => {
                // Drain and ignore unknown parts
                let _ = field.bytes().await?;
            }
        }
    }

    Ok(form)
}

/// Validated field set for an insert or update.
#[derive(Debug, Clone)]
struct PhotoInput {
    name: String,
    location: Location,
    rating: i64,
    memo: String,
    tags: Vec<String>,
    visited: bool,
    is_public: bool,
    price_range: Option<String>,
    visited_date: Option<String>,
    image_url: String,
}

fn input_from_existing(photo: &Photo, tags: Vec<String>) -> PhotoInput {
    PhotoInput {
        name: photo.name.clone(),
        location: Location {
            address: photo.address.clone(),
            latitude: photo.latitude,
            longitude: photo.longitude,
        },
        rating: photo.rating,
        memo: photo.memo.clone(),
        tags,
        visited: photo.visited,
        is_public: photo.is_public,
        price_range: photo.price_range.clone(),
        visited_date: photo.visited_date.clone(),
        image_url: photo.image_url.clone(),
    }
}

/// Merge submitted fields over the existing record (update) or over
/// creation defaults, collecting every validation failure.
fn resolve_photo_input(
    form: &PhotoForm,
    existing: Option<&PhotoInput>,
) -> Result<PhotoInput, Vec<String>> {
    let mut messages = Vec::new();

    let name = match form.name.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        Some(_) => {
            messages.push("Name is required".to_string());
            String::new()
        }
        None => match existing {
            Some(e) => e.name.clone(),
            None => {
                messages.push("Name is required".to_string());
                String::new()
            }
        },
    };

    let location = match form.address.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match parse_location(raw) {
            Some(location) => location,
            None => {
                messages.push("Address is invalid".to_string());
                Location::default()
            }
        },
        Some(_) => {
            messages.push("Address is required".to_string());
            Location::default()
        }
        None => match existing {
            Some(e) => e.location.clone(),
            None => {
                messages.push("Address is required".to_string());
                Location::default()
            }
        },
    };

    let rating = match form.rating.as_deref().map(str::trim) {
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if (1..=5).contains(&n) => n,
            _ => {
                messages.push("Rating must be between 1 and 5".to_string());
                0
            }
        },
        None => match existing {
            Some(e) => e.rating,
            None => {
                messages.push("Rating is required".to_string());
                0
            }
        },
    };

    let memo = match form.memo.as_deref() {
        Some(m) => m.trim().to_string(),
        None => existing.map(|e| e.memo.clone()).unwrap_or_default(),
    };

    let tags = match form.tags.as_deref().map(str::trim) {
        Some("") | None => existing.map(|e| e.tags.clone()).unwrap_or_default(),
        Some(raw) => match parse_tags(raw) {
            Ok(tags) => tags,
            Err(()) => {
                messages.push("Tags must be a JSON array of strings".to_string());
                Vec::new()
            }
        },
    };

    let visited = parse_bool(
        form.visited.as_deref(),
        existing.map(|e| e.visited).unwrap_or(true),
    );
    let is_public = parse_bool(
        form.is_public.as_deref(),
        existing.map(|e| e.is_public).unwrap_or(false),
    );

    let price_range = match form.price_range.as_deref().map(str::trim) {
        Some("") => None,
        Some(raw) => {
            if PRICE_RANGES.contains(&raw) {
                Some(raw.to_string())
            } else {
                messages.push("Price range is invalid".to_string());
                None
            }
        }
        None => existing.and_then(|e| e.price_range.clone()),
    };

    let visited_date = match form.visited_date.as_deref().map(str::trim) {
        Some("") => None,
        Some(raw) => {
            if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
                Some(raw.to_string())
            } else {
                messages.push("Visited date must be formatted YYYY-MM-DD".to_string());
                None
            }
        }
        None => existing.and_then(|e| e.visited_date.clone()),
    };

    if !messages.is_empty() {
        return Err(messages);
    }

    Ok(PhotoInput {
        name,
        location,
        rating,
        memo,
        tags,
        visited,
        is_public,
        price_range,
        visited_date,
        image_url: existing.map(|e| e.image_url.clone()).unwrap_or_default(),
    })
}

fn parse_location(raw: &str) -> Option<Location> {
    if raw.starts_with('{') {
        serde_json::from_str::<Location>(raw)
            .ok()
            .filter(|l| !l.address.trim().is_empty())
            .map(|mut l| {
                l.address = l.address.trim().to_string();
                l
            })
    } else {
        Some(Location {
            address: raw.to_string(),
            latitude: None,
            longitude: None,
        })
    }
}

/// Tags arrive as a JSON-encoded array string. Entries are trimmed and
/// blanks dropped; duplicates and order are kept as submitted.
fn parse_tags(raw: &str) -> Result<Vec<String>, ()> {
    serde_json::from_str::<Vec<String>>(raw)
        .map(|tags| {
            tags.into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        })
        .map_err(|_| ())
}

/// Booleans arrive as the strings "true"/"false"; anything else keeps the
/// fallback value.
fn parse_bool(raw: Option<&str>, fallback: bool) -> bool {
    match raw.map(str::trim) {
        Some("true") => true,
        Some("false") => false,
        _ => fallback,
    }
}
