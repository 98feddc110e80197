//! # Customer Repository
//!
//! Customers are keyed by NIK (national identity number). The POS never
//! asks "create or update?": every sale goes through [`upsert_by_nik`],
//! which refreshes contact details for a known NIK and inserts otherwise.
//! WhatsApp numbers are normalized to international `62...` form on write.
//!
//! [`upsert_by_nik`]: CustomerRepository::upsert_by_nik

use apotek_core::phone::normalize_whatsapp;
use apotek_core::types::Customer;
use apotek_core::validation::{validate_name, validate_nik};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, DbResult};

/// Customer details as captured at the counter.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub nik: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
}

/// Repository for customers.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts the customer or, when the NIK is already known, refreshes
    /// name/contact details in place.
    pub async fn upsert_by_nik(&self, info: &CustomerInfo) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert_by_nik_on(&mut conn, info).await
    }

    /// Transaction-scoped variant of [`upsert_by_nik`], used by the sale
    /// flow so the customer write commits or rolls back with the sale.
    ///
    /// [`upsert_by_nik`]: CustomerRepository::upsert_by_nik
    pub async fn upsert_by_nik_on(
        conn: &mut SqliteConnection,
        info: &CustomerInfo,
    ) -> DbResult<Customer> {
        validate_name("customer_name", &info.name)?;
        validate_nik(&info.nik)?;

        let whatsapp = info.whatsapp.as_deref().and_then(normalize_whatsapp);
        let now = Utc::now();

        // COALESCE keeps existing contact fields when the new sale omits them
        let customer = sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (name, nik, phone, whatsapp, address, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (nik) DO UPDATE SET \
                 name = excluded.name, \
                 phone = COALESCE(excluded.phone, phone), \
                 whatsapp = COALESCE(excluded.whatsapp, whatsapp), \
                 address = COALESCE(excluded.address, address), \
                 updated_at = excluded.updated_at \
             RETURNING *",
        )
        .bind(info.name.trim())
        .bind(info.nik.trim())
        .bind(&info.phone)
        .bind(&whatsapp)
        .bind(&info.address)
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await?;

        Ok(customer)
    }

    /// Fetches a customer by id.
    pub async fn get(&self, id: i64) -> DbResult<Customer> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Fetches a customer by NIK.
    pub async fn find_by_nik(&self, nik: &str) -> DbResult<Option<Customer>> {
        let found = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE nik = ?")
            .bind(nik.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(found)
    }

    /// Substring search over name and NIK, for the POS customer picker.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Customer>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{query}%");
        let rows = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE name LIKE ? OR nik LIKE ? ORDER BY name LIMIT 20",
        )
        .bind(&pattern)
        .bind(&pattern)
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
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sari() -> CustomerInfo {
        CustomerInfo {
            name: "Ibu Sari".to_string(),
            nik: "3201011503900001".to_string(),
            phone: Some("08123456789".to_string()),
            whatsapp: Some("08123456789".to_string()),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_normalizes_whatsapp() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let c = db.customers().upsert_by_nik(&sari()).await.unwrap();
        assert_eq!(c.whatsapp.as_deref(), Some("628123456789"));
    }

    #[tokio::test]
    async fn test_upsert_same_nik_updates_in_place() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = db.customers().upsert_by_nik(&sari()).await.unwrap();

        let mut changed = sari();
        changed.name = "Sari Dewi".to_string();
        changed.phone = None; // omitted contact field is kept, not cleared
        let second = db.customers().upsert_by_nik(&changed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Sari Dewi");
        assert_eq!(second.phone.as_deref(), Some("08123456789"));

        let all = db.customers().search("sari").await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_rejects_bad_nik() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut bad = sari();
        bad.nik = "12345".to_string();
        let err = db.customers().upsert_by_nik(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_by_nik_fragment() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.customers().upsert_by_nik(&sari()).await.unwrap();

        let hits = db.customers().search("32010115").await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
