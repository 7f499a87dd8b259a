//! Link directory operations.
//!
//! The `links` table is the public directory; every row is keyed by its
//! unique `url` and carries a nullable `icon`. It doubles as the favicon
//! record store, with `icon_cache` holding icons for urls that have no
//! directory row so that resolving arbitrary urls never adds listings.

use super::connection::Database;
use super::{RecordStore, RecordWriteMode};
use crate::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension, Row};

const DEFAULT_CATEGORY: &str = "uncategorized";

const LINK_COLUMNS: &str = "id, title, url, description, category, sort_order, icon, created_at, updated_at";

/// A directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub category: String,
    pub sort_order: i64,
    pub icon: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Link {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            description: row.get(3)?,
            category: row.get(4)?,
            sort_order: row.get(5)?,
            icon: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.into()
}

/// Fields for creating a link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLink {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub sort_order: i64,
}

/// Partial update of a link. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkPatch {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sort_order: Option<i64>,
}

/// Number of links in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

fn validate_title(title: &str) -> Result<String, Error> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("title cannot be empty".into()));
    }
    Ok(title.to_string())
}

fn validate_url(url: &str) -> Result<String, Error> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }
    let parsed = url::Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(url.to_string()),
        scheme => Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }
}

fn normalize_category(category: &str) -> String {
    let category = category.trim();
    if category.is_empty() { default_category() } else { category.to_string() }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

/// Map a unique-constraint violation on `links.url` to `Error::Conflict`.
fn conflict_or(err: rusqlite::Error, url: &str) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Error::Conflict(format!("link already exists: {url}"))
        }
        _ => err.into(),
    }
}

/// LIKE pattern matching `query` anywhere, with wildcards escaped.
///
/// Folds ASCII only, matching SQLite's built-in `lower()`. Non-ASCII
/// letters compare case-sensitively.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .to_ascii_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl Database {
    /// List links ordered by category, sort order and title.
    ///
    /// A non-empty `query` keeps links whose title, url, description or
    /// category contains it, ignoring ASCII case.
    pub async fn list_links(&self, query: Option<&str>) -> Result<Vec<Link>, Error> {
        let pattern = query.map(str::trim).filter(|q| !q.is_empty()).map(like_pattern);
        self.conn
            .call(move |conn| -> Result<Vec<Link>, Error> {
                let sql = format!(
                    "SELECT {LINK_COLUMNS} FROM links
                     WHERE ?1 IS NULL
                        OR lower(title) LIKE ?1 ESCAPE '\\'
                        OR lower(url) LIKE ?1 ESCAPE '\\'
                        OR lower(COALESCE(description, '')) LIKE ?1 ESCAPE '\\'
                        OR lower(category) LIKE ?1 ESCAPE '\\'
                     ORDER BY category ASC, sort_order ASC, title ASC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let links = stmt
                    .query_map(params![pattern], Link::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(links)
            })
            .await
            .map_err(Error::from)
    }

    /// Get a link by id.
    pub async fn get_link(&self, id: i64) -> Result<Option<Link>, Error> {
        self.conn
            .call(move |conn| -> Result<Option<Link>, Error> {
                let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = ?1");
                let link = conn.query_row(&sql, params![id], Link::from_row).optional()?;
                Ok(link)
            })
            .await
            .map_err(Error::from)
    }

    /// Create a link.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput`/`Error::InvalidUrl` for bad fields,
    /// `Error::Conflict` if the url is already in the directory.
    pub async fn create_link(&self, new: NewLink) -> Result<Link, Error> {
        let title = validate_title(&new.title)?;
        let url = validate_url(&new.url)?;
        let description = normalize_description(new.description);
        let category = normalize_category(&new.category);
        let sort_order = new.sort_order;
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<Link, Error> {
                conn.execute(
                    "INSERT INTO links (title, url, description, category, sort_order, icon, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?6)",
                    params![title, url, description, category, sort_order, now],
                )
                .map_err(|e| conflict_or(e, &url))?;

                let id = conn.last_insert_rowid();
                let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = ?1");
                let link = conn.query_row(&sql, params![id], Link::from_row)?;
                Ok(link)
            })
            .await
            .map_err(Error::from)
    }

    /// Apply a partial update to a link.
    ///
    /// Changing the url clears the cached icon, since the icon was resolved
    /// for the old url.
    pub async fn update_link(&self, id: i64, patch: LinkPatch) -> Result<Link, Error> {
        let title = patch.title.as_deref().map(validate_title).transpose()?;
        let url = patch.url.as_deref().map(validate_url).transpose()?;
        let category = patch.category.as_deref().map(normalize_category);
        let description = patch.description.map(|d| normalize_description(Some(d)));
        let sort_order = patch.sort_order;
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<Link, Error> {
                let select = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = ?1");
                let current = conn
                    .query_row(&select, params![id], Link::from_row)
                    .optional()?
                    .ok_or_else(|| Error::NotFound(format!("link {id}")))?;

                let url_changed = url.as_ref().is_some_and(|u| *u != current.url);
                let next = Link {
                    title: title.unwrap_or(current.title),
                    url: url.unwrap_or(current.url),
                    description: description.unwrap_or(current.description),
                    category: category.unwrap_or(current.category),
                    sort_order: sort_order.unwrap_or(current.sort_order),
                    icon: if url_changed { None } else { current.icon },
                    updated_at: now,
                    ..current
                };

                conn.execute(
                    "UPDATE links SET title = ?2, url = ?3, description = ?4, category = ?5,
                        sort_order = ?6, icon = ?7, updated_at = ?8
                     WHERE id = ?1",
                    params![
                        id,
                        &next.title,
                        &next.url,
                        &next.description,
                        &next.category,
                        next.sort_order,
                        &next.icon,
                        &next.updated_at,
                    ],
                )
                .map_err(|e| conflict_or(e, &next.url))?;

                Ok(next)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a link by id.
    pub async fn delete_link(&self, id: i64) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let count = conn.execute("DELETE FROM links WHERE id = ?1", params![id])?;
                if count == 0 {
                    return Err(Error::NotFound(format!("link {id}")));
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Link counts per category, ordered by category name.
    pub async fn list_categories(&self) -> Result<Vec<CategoryCount>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<CategoryCount>, Error> {
                let mut stmt =
                    conn.prepare("SELECT category, COUNT(*) FROM links GROUP BY category ORDER BY category ASC")?;
                let counts = stmt
                    .query_map([], |row| Ok(CategoryCount { category: row.get(0)?, count: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(counts)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl RecordStore for Database {
    async fn find_icon(&self, url: &str) -> Result<Option<String>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let listed: Option<Option<String>> = conn
                    .query_row("SELECT icon FROM links WHERE url = ?1", params![url], |row| row.get(0))
                    .optional()?;
                if let Some(icon) = listed.flatten() {
                    return Ok(Some(icon));
                }
                let cached = conn
                    .query_row("SELECT icon FROM icon_cache WHERE url = ?1", params![url], |row| row.get(0))
                    .optional()?;
                Ok(cached)
            })
            .await
            .map_err(Error::from)
    }

    async fn write_icon(&self, url: &str, icon: &str, mode: RecordWriteMode) -> Result<bool, Error> {
        let url = url.to_string();
        let icon = icon.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let listed = conn.execute(
                    "UPDATE links SET icon = ?2, updated_at = ?3 WHERE url = ?1",
                    params![url, icon, now],
                )?;
                if listed > 0 || mode == RecordWriteMode::Update {
                    return Ok(listed > 0);
                }
                let cached = conn.execute(
                    "INSERT INTO icon_cache (url, icon, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(url) DO UPDATE SET
                         icon = excluded.icon,
                         updated_at = excluded.updated_at",
                    params![url, icon, now],
                )?;
                Ok(cached > 0)
            })
            .await
            .map_err(Error::from)
    }
}
