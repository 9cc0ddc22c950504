use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::categories::models::Category;

/// Repository for category lookups
pub struct CategoryRepository {
    pool: MySqlPool,
}

impl CategoryRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, created_at
            FROM categories
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch category: {}", e)))
    }

    /// Fetch several categories at once, for attaching names to loan
    /// listings without per-row lookups.
    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!(
            "SELECT id, user_id, name, created_at FROM categories WHERE id IN ({})",
            placeholders
        );

        let mut q = sqlx::query_as::<_, Category>(&query);
        for id in ids {
            q = q.bind(id);
        }

        q.fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to fetch categories: {}", e)))
    }
}
