use rusqlite::Row;
use serde::Serialize;

/// An account row. `password_hash` never reaches clients: it is excluded
/// from serialization, so handlers can return the struct directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub phone_number: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub login_attempts: i64,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub const USER_COLUMNS: &str = "id, email, password_hash, display_name, phone_number, role, \
     is_active, login_attempts, last_login_at, created_at, updated_at";

impl User {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get("id")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            display_name: row.get("display_name")?,
            phone_number: row.get("phone_number")?,
            role: row.get("role")?,
            is_active: row.get("is_active")?,
            login_attempts: row.get("login_attempts")?,
            last_login_at: row.get("last_login_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// A restaurant record row. Tags, likes and comments live in child tables;
/// response shaping happens in the route layer.
#[derive(Debug, Clone)]
pub struct Photo {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub memo: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: i64,
    pub image_url: String,
    pub visited: bool,
    pub is_public: bool,
    pub price_range: Option<String>,
    pub visited_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub const PHOTO_COLUMNS: &str = "p.id, p.user_id, p.name, p.memo, p.address, p.latitude, \
     p.longitude, p.rating, p.image_url, p.visited, p.is_public, p.price_range, \
     p.visited_date, p.created_at, p.updated_at";

impl Photo {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Photo {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            memo: row.get("memo")?,
            address: row.get("address")?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            rating: row.get("rating")?,
            image_url: row.get("image_url")?,
            visited: row.get("visited")?,
            is_public: row.get("is_public")?,
            price_range: row.get("price_range")?,
            visited_date: row.get("visited_date")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Report {
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
}

impl Report {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Report {
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
        })
    }
}
