//! Listing query construction.
//!
//! Translates the photo-listing request parameters (search, tag, visited,
//! price range, sort preset, page/limit) plus a base scope into a SQL
//! filter + sort + pagination triple. The base scope is non-overridable:
//! request parameters can only narrow it.

use rusqlite::types::Value;
use serde::Deserialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 12;

pub const PRICE_RANGES: [&str; 4] = ["$", "$$", "$$$", "$$$$"];

/// Base filter for a photo listing.
#[derive(Debug, Clone)]
pub enum Scope {
    /// "My records" — everything owned by the caller, public or not.
    Owner(String),
    /// The global public feed.
    Public,
    /// One user's public profile feed.
    PublicOf(String),
}

/// Raw query-string parameters. Page and limit arrive as strings so that
/// junk values fall back to defaults instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListParams {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub visited: Option<String>,
    pub price_range: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    Newest,
    RatingAsc,
    RatingDesc,
    NameAsc,
    PriceAsc,
    PriceDesc,
}

const PRICE_RANK: &str =
    "CASE p.price_range WHEN '$' THEN 1 WHEN '$$' THEN 2 WHEN '$$$' THEN 3 \
     WHEN '$$$$' THEN 4 ELSE 5 END";

impl Sort {
    /// Unrecognized presets fall back to newest-first.
    pub fn parse(value: Option<&str>) -> Sort {
        match value {
            Some("ratingAsc") => Sort::RatingAsc,
            Some("ratingDesc") => Sort::RatingDesc,
            Some("nameAsc") => Sort::NameAsc,
            Some("priceAsc") => Sort::PriceAsc,
            Some("priceDesc") => Sort::PriceDesc,
            _ => Sort::Newest,
        }
    }

    /// Every non-default preset carries creation time descending as the
    /// tie-break key, so page ordering is deterministic among equal values.
    pub fn order_sql(self) -> String {
        match self {
            Sort::Newest => "p.created_at DESC".to_string(),
            Sort::RatingAsc => "p.rating ASC, p.created_at DESC".to_string(),
            Sort::RatingDesc => "p.rating DESC, p.created_at DESC".to_string(),
            Sort::NameAsc => "p.name COLLATE NOCASE ASC, p.created_at DESC".to_string(),
            Sort::PriceAsc => format!("{} ASC, p.created_at DESC", PRICE_RANK),
            Sort::PriceDesc => format!("{} DESC, p.created_at DESC", PRICE_RANK),
        }
    }
}

/// The built triple: WHERE clause + bound values, ORDER BY clause, and the
/// page window.
#[derive(Debug)]
pub struct PhotoQuery {
    pub where_sql: String,
    pub params: Vec<Value>,
    pub order_sql: String,
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl PhotoQuery {
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM photos p WHERE {}", self.where_sql)
    }

    /// Page query over the given select list. Placeholders in the select
    /// list bind before `params`; LIMIT and OFFSET bind after.
    pub fn page_sql(&self, select_list: &str) -> String {
        format!(
            "SELECT {} FROM photos p WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            select_list, self.where_sql, self.order_sql
        )
    }
}

pub fn build_photo_query(scope: Scope, params: &ListParams) -> PhotoQuery {
    let mut clauses: Vec<String> = Vec::new();
    let mut bind: Vec<Value> = Vec::new();

    match scope {
        Scope::Owner(user_id) => {
            clauses.push("p.user_id = ?".to_string());
            bind.push(Value::Text(user_id));
        }
        Scope::Public => {
            clauses.push("p.is_public = 1".to_string());
        }
        Scope::PublicOf(user_id) => {
            clauses.push("p.user_id = ?".to_string());
            bind.push(Value::Text(user_id));
            clauses.push("p.is_public = 1".to_string());
        }
    }

    if let Some(search) = trimmed(&params.search) {
        let pattern = format!("%{}%", escape_like(search));
        clauses.push(
            "(p.name LIKE ? ESCAPE '\\' OR p.address LIKE ? ESCAPE '\\' \
             OR p.memo LIKE ? ESCAPE '\\' OR EXISTS (SELECT 1 FROM photo_tags t \
             WHERE t.photo_id = p.id AND t.tag LIKE ? ESCAPE '\\'))"
                .to_string(),
        );
        for _ in 0..4 {
            bind.push(Value::Text(pattern.clone()));
        }
    }

    if let Some(tag) = trimmed(&params.tag) {
        clauses.push(
            "EXISTS (SELECT 1 FROM photo_tags t WHERE t.photo_id = p.id AND t.tag = ?)"
                .to_string(),
        );
        bind.push(Value::Text(tag.to_string()));
    }

    // Only the exact strings "true"/"false" filter; anything else is ignored
    match params.visited.as_deref() {
        Some("true") => {
            clauses.push("p.visited = 1".to_string());
        }
        Some("false") => {
            clauses.push("p.visited = 0".to_string());
        }
        _ => {}
    }

    if let Some(price) = trimmed(&params.price_range) {
        if PRICE_RANGES.contains(&price) {
            clauses.push("p.price_range = ?".to_string());
            bind.push(Value::Text(price.to_string()));
        }
    }

    let page = parse_positive(&params.page, DEFAULT_PAGE);
    let limit = parse_positive(&params.limit, DEFAULT_LIMIT);

    PhotoQuery {
        where_sql: clauses.join(" AND "),
        params: bind,
        order_sql: Sort::parse(params.sort.as_deref()).order_sql(),
        page,
        limit,
        offset: (page - 1) * limit,
    }
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Escape LIKE wildcards so user input matches literally.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Positive-integer parse with fallback; junk and non-positive values take
/// the default.
pub fn parse_positive(value: &Option<String>, default: i64) -> i64 {
    value
        .as_deref()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DbPool;
    use r2d2::Pool;
    use r2d2_sqlite::SqliteConnectionManager;
    use rusqlite::params_from_iter;

    fn test_pool() -> DbPool {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        crate::db::run_migrations(&pool).unwrap();
        pool
    }

    fn seed_user(pool: &DbPool, id: &str) {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (id, email, password_hash) VALUES (?1, ?2, 'h')",
            rusqlite::params![id, format!("{}@x.com", id)],
        )
        .unwrap();
    }

    #[allow(clippy::too_many_arguments)]
    fn seed_photo(
        pool: &DbPool,
        id: &str,
        user: &str,
        name: &str,
        rating: i64,
        public: bool,
        visited: bool,
        price: Option<&str>,
        created_at: &str,
        tags: &[&str],
    ) {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO photos (id, user_id, name, memo, address, rating, image_url, \
             visited, is_public, price_range, created_at, updated_at)
             VALUES (?1, ?2, ?3, '', 'Main Street 1', ?4, '/uploads/x.jpg', ?5, ?6, ?7, ?8, ?8)",
            rusqlite::params![id, user, name, rating, visited, public, price, created_at],
        )
        .unwrap();
        for (i, tag) in tags.iter().enumerate() {
            conn.execute(
                "INSERT INTO photo_tags (photo_id, position, tag) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, i as i64, tag],
            )
            .unwrap();
        }
    }

    fn run(pool: &DbPool, q: &PhotoQuery) -> (Vec<String>, i64) {
        let conn = pool.get().unwrap();
        let total: i64 = conn
            .query_row(&q.count_sql(), params_from_iter(q.params.iter()), |r| {
                r.get(0)
            })
            .unwrap();

        let mut page_params = q.params.clone();
        page_params.push(Value::Integer(q.limit));
        page_params.push(Value::Integer(q.offset));

        let mut stmt = conn.prepare(&q.page_sql("p.id")).unwrap();
        let ids = stmt
            .query_map(params_from_iter(page_params.iter()), |r| {
                r.get::<_, String>(0)
            })
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();
        (ids, total)
    }

    fn owner(user: &str) -> Scope {
        Scope::Owner(user.to_string())
    }

    #[test]
    fn sort_parse_falls_back_to_newest() {
        assert_eq!(Sort::parse(None), Sort::Newest);
        assert_eq!(Sort::parse(Some("newest")), Sort::Newest);
        assert_eq!(Sort::parse(Some("bogus")), Sort::Newest);
        assert_eq!(Sort::parse(Some("RATINGASC")), Sort::Newest);
        assert_eq!(Sort::parse(Some("ratingDesc")), Sort::RatingDesc);
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        assert_eq!(total_pages(0, 12), 0);
        assert_eq!(total_pages(1, 12), 1);
        assert_eq!(total_pages(12, 12), 1);
        assert_eq!(total_pages(13, 12), 2);
        assert_eq!(total_pages(25, 5), 5);
    }

    #[test]
    fn owner_scope_excludes_other_users() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_user(&pool, "bob");
        seed_photo(&pool, "p1", "alice", "A", 3, true, true, None, "2025-01-01 10:00:00", &[]);
        seed_photo(&pool, "p2", "bob", "B", 3, true, true, None, "2025-01-02 10:00:00", &[]);

        let q = build_photo_query(owner("alice"), &ListParams::default());
        let (ids, total) = run(&pool, &q);
        assert_eq!(ids, vec!["p1"]);
        assert_eq!(total, 1);
    }

    #[test]
    fn public_scope_only_matches_public_rows() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "Open", 3, true, true, None, "2025-01-01 10:00:00", &[]);
        seed_photo(&pool, "p2", "alice", "Hidden", 3, false, true, None, "2025-01-02 10:00:00", &[]);

        let q = build_photo_query(Scope::Public, &ListParams::default());
        let (ids, _) = run(&pool, &q);
        assert_eq!(ids, vec!["p1"]);
    }

    #[test]
    fn public_of_scope_hides_private_rows_of_that_user() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_user(&pool, "bob");
        seed_photo(&pool, "p1", "alice", "Open", 3, true, true, None, "2025-01-01 10:00:00", &[]);
        seed_photo(&pool, "p2", "alice", "Hidden", 3, false, true, None, "2025-01-02 10:00:00", &[]);
        seed_photo(&pool, "p3", "bob", "Other", 3, true, true, None, "2025-01-03 10:00:00", &[]);

        let q = build_photo_query(Scope::PublicOf("alice".into()), &ListParams::default());
        let (ids, total) = run(&pool, &q);
        assert_eq!(ids, vec!["p1"]);
        assert_eq!(total, 1);
    }

    #[test]
    fn search_matches_name_address_memo_and_tags() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "Sushi Omakase", 4, false, true, None, "2025-01-01 10:00:00", &[]);
        seed_photo(&pool, "p2", "alice", "Burger Bar", 4, false, true, None, "2025-01-02 10:00:00", &["sushi"]);
        seed_photo(&pool, "p3", "alice", "Noodle House", 4, false, true, None, "2025-01-03 10:00:00", &[]);

        let params = ListParams {
            search: Some("sushi".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &params);
        let (ids, _) = run(&pool, &q);
        // Newest first: the tag match (p2) precedes the name match (p1)
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "Sushi Omakase", 4, false, true, None, "2025-01-01 10:00:00", &[]);

        let params = ListParams {
            search: Some("SUSHI".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &params);
        let (ids, _) = run(&pool, &q);
        assert_eq!(ids, vec!["p1"]);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "100% Vegan", 4, false, true, None, "2025-01-01 10:00:00", &[]);
        seed_photo(&pool, "p2", "alice", "100x Vegan", 4, false, true, None, "2025-01-02 10:00:00", &[]);

        let params = ListParams {
            search: Some("100%".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &params);
        let (ids, _) = run(&pool, &q);
        assert_eq!(ids, vec!["p1"]);
    }

    #[test]
    fn search_and_tag_filters_combine_with_and() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "Sushi North", 4, false, true, None, "2025-01-01 10:00:00", &["date-night"]);
        seed_photo(&pool, "p2", "alice", "Sushi South", 4, false, true, None, "2025-01-02 10:00:00", &["lunch"]);

        let params = ListParams {
            search: Some("sushi".into()),
            tag: Some("date-night".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &params);
        let (ids, _) = run(&pool, &q);
        assert_eq!(ids, vec!["p1"]);
    }

    #[test]
    fn tag_filter_requires_exact_match() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "A", 4, false, true, None, "2025-01-01 10:00:00", &["ramen"]);
        seed_photo(&pool, "p2", "alice", "B", 4, false, true, None, "2025-01-02 10:00:00", &["ramen-adjacent"]);

        let params = ListParams {
            tag: Some("ramen".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &params);
        let (ids, _) = run(&pool, &q);
        assert_eq!(ids, vec!["p1"]);
    }

    #[test]
    fn visited_filter_accepts_only_true_and_false() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "Been", 4, false, true, None, "2025-01-01 10:00:00", &[]);
        seed_photo(&pool, "p2", "alice", "Wish", 4, false, false, None, "2025-01-02 10:00:00", &[]);

        let visited = ListParams {
            visited: Some("true".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &visited);
        let (ids, _) = run(&pool, &q);
        assert_eq!(ids, vec!["p1"]);

        let wishlist = ListParams {
            visited: Some("false".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &wishlist);
        let (ids, _) = run(&pool, &q);
        assert_eq!(ids, vec!["p2"]);

        // Junk value applies no filter at all
        let junk = ListParams {
            visited: Some("yes".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &junk);
        let (_, total) = run(&pool, &q);
        assert_eq!(total, 2);
    }

    #[test]
    fn price_range_filter_matches_exactly() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "Cheap", 4, false, true, Some("$"), "2025-01-01 10:00:00", &[]);
        seed_photo(&pool, "p2", "alice", "Fancy", 4, false, true, Some("$$$$"), "2025-01-02 10:00:00", &[]);

        let params = ListParams {
            price_range: Some("$".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &params);
        let (ids, _) = run(&pool, &q);
        assert_eq!(ids, vec!["p1"]);

        // Unknown symbol is ignored rather than matching nothing
        let junk = ListParams {
            price_range: Some("$$$$$".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &junk);
        let (_, total) = run(&pool, &q);
        assert_eq!(total, 2);
    }

    #[test]
    fn default_sort_is_newest_first() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "Old", 4, false, true, None, "2025-01-01 10:00:00", &[]);
        seed_photo(&pool, "p2", "alice", "New", 4, false, true, None, "2025-01-03 10:00:00", &[]);
        seed_photo(&pool, "p3", "alice", "Mid", 4, false, true, None, "2025-01-02 10:00:00", &[]);

        let q = build_photo_query(owner("alice"), &ListParams::default());
        let (ids, _) = run(&pool, &q);
        assert_eq!(ids, vec!["p2", "p3", "p1"]);
    }

    #[test]
    fn rating_sort_breaks_ties_by_newest() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "A", 5, false, true, None, "2025-01-01 10:00:00", &[]);
        seed_photo(&pool, "p2", "alice", "B", 3, false, true, None, "2025-01-02 10:00:00", &[]);
        seed_photo(&pool, "p3", "alice", "C", 5, false, true, None, "2025-01-03 10:00:00", &[]);

        let params = ListParams {
            sort: Some("ratingDesc".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &params);
        let (ids, _) = run(&pool, &q);
        // Both fives first, newer five before older five
        assert_eq!(ids, vec!["p3", "p1", "p2"]);
    }

    #[test]
    fn price_sort_puts_unset_prices_last() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "NoPrice", 4, false, true, None, "2025-01-01 10:00:00", &[]);
        seed_photo(&pool, "p2", "alice", "Fancy", 4, false, true, Some("$$$$"), "2025-01-02 10:00:00", &[]);
        seed_photo(&pool, "p3", "alice", "Cheap", 4, false, true, Some("$"), "2025-01-03 10:00:00", &[]);

        let params = ListParams {
            sort: Some("priceAsc".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &params);
        let (ids, _) = run(&pool, &q);
        assert_eq!(ids, vec!["p3", "p2", "p1"]);
    }

    #[test]
    fn name_sort_ignores_case() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        seed_photo(&pool, "p1", "alice", "zebra grill", 4, false, true, None, "2025-01-01 10:00:00", &[]);
        seed_photo(&pool, "p2", "alice", "Apple Diner", 4, false, true, None, "2025-01-02 10:00:00", &[]);

        let params = ListParams {
            sort: Some("nameAsc".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &params);
        let (ids, _) = run(&pool, &q);
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[test]
    fn pagination_slices_and_counts_pre_slice_total() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        for i in 0..7 {
            seed_photo(
                &pool,
                &format!("p{}", i),
                "alice",
                &format!("Spot {}", i),
                3,
                false,
                true,
                None,
                &format!("2025-01-0{} 10:00:00", i + 1),
                &[],
            );
        }

        let params = ListParams {
            page: Some("2".into()),
            limit: Some("3".into()),
            ..Default::default()
        };
        let q = build_photo_query(owner("alice"), &params);
        assert_eq!(q.page, 2);
        assert_eq!(q.limit, 3);
        assert_eq!(q.offset, 3);

        let (ids, total) = run(&pool, &q);
        assert_eq!(total, 7);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids, vec!["p3", "p2", "p1"]);
        assert_eq!(total_pages(total, q.limit), 3);
    }

    #[test]
    fn junk_page_and_limit_fall_back_to_defaults() {
        let params = ListParams {
            page: Some("abc".into()),
            limit: Some("-5".into()),
            ..Default::default()
        };
        let q = build_photo_query(Scope::Public, &params);
        assert_eq!(q.page, DEFAULT_PAGE);
        assert_eq!(q.limit, DEFAULT_LIMIT);
        assert_eq!(q.offset, 0);

        let zero = ListParams {
            page: Some("0".into()),
            limit: Some("0".into()),
            ..Default::default()
        };
        let q = build_photo_query(Scope::Public, &zero);
        assert_eq!(q.page, DEFAULT_PAGE);
        assert_eq!(q.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn blank_filters_are_ignored() {
        let params = ListParams {
            search: Some("   ".into()),
            tag: Some("".into()),
            price_range: Some(" ".into()),
            ..Default::default()
        };
        let q = build_photo_query(Scope::Public, &params);
        assert_eq!(q.where_sql, "p.is_public = 1");
        assert!(q.params.is_empty());
    }
}
