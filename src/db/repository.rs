//! Database repository for CRUD and aggregation queries.
//!
//! Uses prepared statements; writes are whole-row create/update/delete with
//! last-write-wins semantics.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    CreatePostRequest, Post, PostFilters, SubscribeOutcome, Subscriber, UpdatePostRequest,
    VisitorDay,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

const POST_COLUMNS: &str = "id, title, excerpt, content, category, image_id, image_url, \
                            featured, published, created_at, updated_at";

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== POST OPERATIONS ====================

    /// List posts matching the given filters, newest first.
    pub async fn list_posts(&self, filters: &PostFilters) -> Result<Vec<Post>, AppError> {
        let mut sql = format!("SELECT {} FROM posts", POST_COLUMNS);
        let mut conditions: Vec<&str> = Vec::new();

        if filters.category.is_some() {
            conditions.push("category = ?");
        }
        if filters.featured.is_some() {
            conditions.push("featured = ?");
        }
        if filters.published.is_some() {
            conditions.push("published = ?");
        }
        if filters.search.is_some() {
            conditions.push("LOWER(title) LIKE ?");
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(category) = &filters.category {
            query = query.bind(category);
        }
        if let Some(featured) = filters.featured {
            query = query.bind(featured as i32);
        }
        if let Some(published) = filters.published {
            query = query.bind(published as i32);
        }
        if let Some(search) = &filters.search {
            query = query.bind(format!("%{}%", search.to_lowercase()));
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(post_from_row).collect())
    }

    /// Get a post by ID.
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let sql = format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(post_from_row))
    }

    /// Create a new post.
    pub async fn create_post(&self, request: &CreatePostRequest) -> Result<Post, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO posts (id, title, excerpt, content, category, image_id, image_url, \
             featured, published, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.title)
        .bind(&request.excerpt)
        .bind(&request.content)
        .bind(&request.category)
        .bind(&request.image_id)
        .bind(&request.image_url)
        .bind(request.featured as i32)
        .bind(request.published as i32)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Post {
            id,
            created_at: now.clone(),
            updated_at: now,
            title: request.title.clone(),
            excerpt: request.excerpt.clone(),
            content: request.content.clone(),
            category: request.category.clone(),
            image_id: request.image_id.clone(),
            image_url: request.image_url.clone(),
            featured: request.featured,
            published: request.published,
        })
    }

    /// Update a post. Omitted fields keep their current values.
    pub async fn update_post(
        &self,
        id: &str,
        request: &UpdatePostRequest,
    ) -> Result<Post, AppError> {
        let existing = self
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let merged = Post {
            id: id.to_string(),
            created_at: existing.created_at,
            updated_at: now,
            title: request.title.clone().unwrap_or(existing.title),
            excerpt: request.excerpt.clone().unwrap_or(existing.excerpt),
            content: request.content.clone().unwrap_or(existing.content),
            category: request.category.clone().unwrap_or(existing.category),
            image_id: request.image_id.clone().or(existing.image_id),
            image_url: request.image_url.clone().or(existing.image_url),
            featured: request.featured.unwrap_or(existing.featured),
            published: request.published.unwrap_or(existing.published),
        };

        sqlx::query(
            "UPDATE posts SET title = ?, excerpt = ?, content = ?, category = ?, image_id = ?, \
             image_url = ?, featured = ?, published = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&merged.title)
        .bind(&merged.excerpt)
        .bind(&merged.content)
        .bind(&merged.category)
        .bind(&merged.image_id)
        .bind(&merged.image_url)
        .bind(merged.featured as i32)
        .bind(merged.published as i32)
        .bind(&merged.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(merged)
    }

    /// Delete a post.
    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Post {} not found", id)));
        }
        Ok(())
    }

    /// Distinct categories across published posts, sorted alphabetically.
    pub async fn list_categories(&self) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query(
            "SELECT DISTINCT category FROM posts WHERE published = 1 ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("category")).collect())
    }

    // ==================== VISITOR OPERATIONS ====================

    /// Record one page view for the given date key (`YYYY-MM-DD`).
    ///
    /// Read-then-write: two concurrent calls can both observe the same prior
    /// count and lose one increment. Accepted for approximate analytics.
    pub async fn track_visit(&self, date: &str) -> Result<(), AppError> {
        let existing = sqlx::query("SELECT id, count FROM visitor_days WHERE date = ?")
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        match existing {
            Some(row) => {
                let id: String = row.get("id");
                let count: i64 = row.get("count");
                sqlx::query("UPDATE visitor_days SET count = ? WHERE id = ?")
                    .bind(count + 1)
                    .bind(&id)
                    .execute(&self.pool)
                    .await?;
            }
            None => {
                sqlx::query("INSERT INTO visitor_days (id, date, count) VALUES (?, ?, 1)")
                    .bind(uuid::Uuid::new_v4().to_string())
                    .bind(date)
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(())
    }

    /// Day counters with `start <= date < end`, ascending by date.
    pub async fn visitor_days_between(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<VisitorDay>, AppError> {
        let rows = sqlx::query(
            "SELECT id, date, count FROM visitor_days WHERE date >= ? AND date < ? ORDER BY date",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| VisitorDay {
                id: row.get("id"),
                date: row.get("date"),
                count: row.get("count"),
            })
            .collect())
    }

    /// Sum of all day counters.
    pub async fn total_visitors(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COALESCE(SUM(count), 0) AS total FROM visitor_days")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }

    /// Counter value for the given date key, 0 when absent.
    pub async fn visitors_on(&self, date: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT count FROM visitor_days WHERE date = ?")
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("count")).unwrap_or(0))
    }

    /// Years with visitor data, descending.
    pub async fn visitor_years(&self) -> Result<Vec<i32>, AppError> {
        let rows = sqlx::query(
            "SELECT DISTINCT substr(date, 1, 4) AS year FROM visitor_days ORDER BY year DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get::<String, _>("year").parse().ok())
            .collect())
    }

    // ==================== SUBSCRIBER OPERATIONS ====================

    /// Register or reactivate a newsletter subscription by email.
    ///
    /// At most one record per email: an active record declines the signup, an
    /// inactive one is flipped back to active, otherwise a new record is
    /// created.
    pub async fn subscribe(&self, email: &str) -> Result<SubscribeOutcome, AppError> {
        let existing = sqlx::query("SELECT id, active FROM subscribers WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = existing {
            let id: String = row.get("id");
            let active: i32 = row.get("active");
            if active != 0 {
                return Ok(SubscribeOutcome::already_subscribed());
            }
            sqlx::query("UPDATE subscribers SET active = 1 WHERE id = ?")
                .bind(&id)
                .execute(&self.pool)
                .await?;
            return Ok(SubscribeOutcome::reactivated());
        }

        sqlx::query(
            "INSERT INTO subscribers (id, email, subscribed_at, active) VALUES (?, ?, ?, 1)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(email)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(SubscribeOutcome::created())
    }

    /// All active subscribers, newest first.
    pub async fn list_active_subscribers(&self) -> Result<Vec<Subscriber>, AppError> {
        let rows = sqlx::query(
            "SELECT id, email, subscribed_at, active FROM subscribers WHERE active = 1 \
             ORDER BY subscribed_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(subscriber_from_row).collect())
    }

    /// Count of active subscribers.
    pub async fn total_active_subscribers(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM subscribers WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }

    /// Subscribers with `start <= subscribed_at < end`, ascending.
    pub async fn subscribers_between(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<Subscriber>, AppError> {
        let rows = sqlx::query(
            "SELECT id, email, subscribed_at, active FROM subscribers \
             WHERE subscribed_at >= ? AND subscribed_at < ? ORDER BY subscribed_at",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(subscriber_from_row).collect())
    }

    /// Deactivate a subscription. Deactivation is not deletion.
    pub async fn unsubscribe(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE subscribers SET active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Subscriber {} not found", id)));
        }
        Ok(())
    }

    /// Remove a subscriber record entirely.
    pub async fn delete_subscriber(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subscribers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Subscriber {} not found", id)));
        }
        Ok(())
    }

    /// Years with signup data, descending.
    pub async fn subscriber_years(&self) -> Result<Vec<i32>, AppError> {
        let rows = sqlx::query(
            "SELECT DISTINCT substr(subscribed_at, 1, 4) AS year FROM subscribers \
             ORDER BY year DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get::<String, _>("year").parse().ok())
            .collect())
    }
}

// Helper functions for row conversion

fn post_from_row(row: &sqlx::sqlite::SqliteRow) -> Post {
    let featured: i32 = row.get("featured");
    let published: i32 = row.get("published");
    Post {
        id: row.get("id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        title: row.get("title"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        category: row.get("category"),
        image_id: row.get("image_id"),
        image_url: row.get("image_url"),
        featured: featured != 0,
        published: published != 0,
    }
}

fn subscriber_from_row(row: &sqlx::sqlite::SqliteRow) -> Subscriber {
    let active: i32 = row.get("active");
    Subscriber {
        id: row.get("id"),
        email: row.get("email"),
        subscribed_at: row.get("subscribed_at"),
        active: active != 0,
    }
}
