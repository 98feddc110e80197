//! Category repository.

use apotek_core::types::Category;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};

/// Repository for medicine categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Creates a new category. Names are unique.
    pub async fn create(&self, name: &str, description: Option<&str>) -> DbResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DbError::QueryFailed("category name is required".to_string()));
        }

        let result = sqlx::query(
            "INSERT INTO categories (name, description, created_at) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get(result.last_insert_rowid()).await
    }

    /// Fetches a category by id.
    pub async fn get(&self, id: i64) -> DbResult<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Fetches a category by name (case-insensitive).
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let found = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE name = ? COLLATE NOCASE",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(found)
    }

    /// Returns the category with the given name, creating it when absent.
    pub async fn get_or_create(&self, name: &str) -> DbResult<Category> {
        if let Some(existing) = self.find_by_name(name).await? {
            return Ok(existing);
        }
        match self.create(name, None).await {
            // Lost a race with a concurrent insert of the same name
            Err(DbError::UniqueViolation { .. }) => self
                .find_by_name(name)
                .await?
                .ok_or_else(|| DbError::not_found("Category", name)),
            other => other,
        }
    }

    /// Renames a category or changes its description.
    pub async fn update(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> DbResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DbError::QueryFailed("category name is required".to_string()));
        }

        let result = sqlx::query("UPDATE categories SET name = ?, description = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        self.get(id).await
    }

    /// Deletes a category. Refused while any medicine still references it;
    /// reassign or deactivate those first.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let in_use: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM medicines WHERE category_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if in_use > 0 {
            return Err(DbError::ForeignKeyViolation {
                message: format!("category is still used by {in_use} medicine(s)"),
            });
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        Ok(())
    }

    /// Lists all categories, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        repo.create("Antibiotik", Some("Obat antibiotik")).await.unwrap();
        repo.create("Analgesik", None).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        // Ordered by name
        assert_eq!(all[0].name, "Analgesik");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        repo.create("Vitamin", None).await.unwrap();
        let err = repo.create("Vitamin", None).await.unwrap_err();
        assert!(matches!(err, crate::error::DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_refused_while_in_use() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let category = db.categories().create("Vitamin", None).await.unwrap();

        db.medicines()
            .create(crate::repository::medicine::NewMedicine {
                barcode_id: None,
                name: "Vitamin C".to_string(),
                generic_name: None,
                category_id: category.id,
                manufacturer: None,
                unit: "tablet".to_string(),
                capacity: None,
                minimum_stock: None,
                purchase_price_cents: 1_000_00,
                selling_price_cents: 2_000_00,
                description: None,
                storage_location: None,
                image_url: None,
            })
            .await
            .unwrap();

        let err = db.categories().delete(category.id).await.unwrap_err();
        assert!(matches!(err, crate::error::DbError::ForeignKeyViolation { .. }));

        // An unused category deletes cleanly
        let empty = db.categories().create("Sirup", None).await.unwrap();
        db.categories().delete(empty.id).await.unwrap();
        assert!(db.categories().get(empty.id).await.is_err());
    }

    #[tokio::test]
    async fn test_update_renames() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let category = db.categories().create("Vitamn", None).await.unwrap();

        let fixed = db
            .categories()
            .update(category.id, "Vitamin", Some("Suplemen"))
            .await
            .unwrap();
        assert_eq!(fixed.name, "Vitamin");
        assert_eq!(fixed.description.as_deref(), Some("Suplemen"));
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        let a = repo.get_or_create("Sirup").await.unwrap();
        let b = repo.get_or_create("sirup").await.unwrap();
        assert_eq!(a.id, b.id);
    }
}
