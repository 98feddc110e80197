//! # Medicine Repository
//!
//! Catalog CRUD, unified search, and the tiered alternative matcher.
//!
//! ## Stock Is Derived
//! Medicines never store a stock column. Every read that needs availability
//! computes it from batches on the fly:
//! ```sql
//! COALESCE((SELECT SUM(b.quantity) FROM medicine_batches b
//!           WHERE b.medicine_id = m.id
//!             AND b.quantity > 0
//!             AND b.expiry_date > :today), 0) AS total_quantity
//! ```
//! A batch expiring today is already unsellable, so the comparison is
//! strict.
//!
//! ## Alternative Matching Tiers
//! ```text
//! Tier 1: same category + identical capacity string
//! Tier 2: same category + numeric capacity within ±20% (same unit)
//! Tier 3: generic name partial match (not category-restricted)
//! Tier 4: same category, any capacity (capped at 10)
//! ```
//! Tiers are tried in order; the first tier with hits wins and later tiers
//! are never consulted. All tiers require active, in-stock medicines and
//! exclude the source medicine itself.
//!
//! Search and matcher results go out as [`MedicineHit`] rows: the field
//! names the POS frontend renders (`stock`, `price`, `category`) are part
//! of the JSON contract and must stay stable.

use apotek_core::capacity::Capacity;
use apotek_core::types::MedicineStock;
use apotek_core::validation::{validate_name, validate_price_cents};
use apotek_core::DEFAULT_MINIMUM_STOCK;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Attempts before giving up on generating a unique barcode id.
const BARCODE_ATTEMPTS: u32 = 5;

/// Maximum rows returned by free-text search.
const SEARCH_LIMIT: i64 = 50;

/// Cap on tier-4 (same category, any capacity) alternative hits.
const CATEGORY_FALLBACK_LIMIT: i64 = 10;

/// Maximum rows returned by the flat alternative search.
const ALTERNATIVES_SEARCH_LIMIT: i64 = 20;

// =============================================================================
// DTOs
// =============================================================================

/// Input for creating a medicine.
///
/// `barcode_id = None` auto-generates one; `capacity` is parsed into
/// numeric/unit columns on write so matching never re-parses at read time.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMedicine {
    pub barcode_id: Option<String>,
    pub name: String,
    pub generic_name: Option<String>,
    pub category_id: i64,
    pub manufacturer: Option<String>,
    pub unit: String,
    pub capacity: Option<String>,
    pub minimum_stock: Option<i64>,
    pub purchase_price_cents: i64,
    pub selling_price_cents: i64,
    pub description: Option<String>,
    pub storage_location: Option<String>,
    pub image_url: Option<String>,
}

/// Partial update for a medicine; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMedicine {
    pub name: Option<String>,
    pub generic_name: Option<String>,
    pub category_id: Option<i64>,
    pub manufacturer: Option<String>,
    pub unit: Option<String>,
    pub capacity: Option<String>,
    pub minimum_stock: Option<i64>,
    pub purchase_price_cents: Option<i64>,
    pub selling_price_cents: Option<i64>,
    pub description: Option<String>,
    pub storage_location: Option<String>,
    pub image_url: Option<String>,
}

/// Which columns a free-text search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    /// Name, generic name, or barcode id.
    #[default]
    All,
    Name,
    Generic,
    Barcode,
    Capacity,
}

/// Search/matcher result in the wire shape the POS frontend renders:
/// catalog fields plus derived `stock`, the selling price as `price`, and
/// the category name instead of its id.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MedicineHit {
    pub id: i64,
    pub barcode_id: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub capacity: Option<String>,
    pub manufacturer: Option<String>,
    pub unit: String,
    pub stock: i64,
    pub price: i64,
    pub storage_location: Option<String>,
    pub image_url: Option<String>,
    pub category: String,
    pub is_low_stock: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Select list that joins the derived stock total onto each medicine row.
/// First bind is always today's date.
const STOCK_SELECT: &str = "\
    SELECT m.*, \
           COALESCE((SELECT SUM(b.quantity) FROM medicine_batches b \
                     WHERE b.medicine_id = m.id \
                       AND b.quantity > 0 \
                       AND b.expiry_date > ?), 0) AS total_quantity \
    FROM medicines m";

/// Select list producing [`MedicineHit`] rows: every medicine column, the
/// selling price aliased to `price`, the category name, and derived stock.
/// First bind is always today's date.
const HIT_SELECT: &str = "\
    SELECT m.*, m.selling_price_cents AS price, c.name AS category, \
           COALESCE((SELECT SUM(b.quantity) FROM medicine_batches b \
                     WHERE b.medicine_id = m.id \
                       AND b.quantity > 0 \
                       AND b.expiry_date > ?), 0) AS stock \
    FROM medicines m \
    JOIN categories c ON c.id = m.category_id";

/// Wraps [`HIT_SELECT`] so the `stock` alias is visible to the filter, and
/// derives `is_low_stock` on the way out.
fn hit_sql(condition: &str, tail: &str) -> String {
    format!(
        "SELECT *, (stock <= minimum_stock) AS is_low_stock FROM ({HIT_SELECT}) \
         WHERE {condition} {tail}"
    )
}

/// Builds one alternative-matching tier's SQL: the shared active/in-stock/
/// not-self filter, the tier condition, and an optional row cap. Expected
/// binds: today, self id, then the condition's.
fn tier_sql(condition: &str, limit: Option<i64>) -> String {
    let tail = match limit {
        Some(n) => format!("ORDER BY name LIMIT {n}"),
        None => "ORDER BY name".to_string(),
    };
    hit_sql(
        &format!("is_active = 1 AND stock > 0 AND id != ? AND {condition}"),
        &tail,
    )
}

/// Repository for the medicine catalog.
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Creates a medicine.
    ///
    /// When no barcode id is supplied, generates `APT` + 6 digits + 2-digit
    /// year and retries on the (unlikely) collision; uniqueness is enforced
    /// by the database, not by a pre-check.
    pub async fn create(&self, new: NewMedicine) -> DbResult<MedicineStock> {
        validate_name("name", &new.name)?;
        validate_price_cents("purchase_price_cents", new.purchase_price_cents)?;
        validate_price_cents("selling_price_cents", new.selling_price_cents)?;

        let parsed = new.capacity.as_deref().and_then(Capacity::parse);
        let minimum_stock = new.minimum_stock.unwrap_or(DEFAULT_MINIMUM_STOCK);
        let year_suffix = Utc::now().format("%y").to_string();

        let mut attempt = 0;
        loop {
            let barcode_id = match &new.barcode_id {
                Some(explicit) => explicit.trim().to_string(),
                None => {
                    apotek_core::barcode::barcode_id_candidate(&mut rand::thread_rng(), &year_suffix)
                }
            };

            let now = Utc::now();
            let result = sqlx::query(
                "INSERT INTO medicines \
                 (barcode_id, name, generic_name, category_id, manufacturer, unit, \
                  capacity, capacity_numeric, capacity_unit, minimum_stock, \
                  purchase_price_cents, selling_price_cents, description, \
                  storage_location, image_url, is_active, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
            )
            .bind(&barcode_id)
            .bind(new.name.trim())
            .bind(&new.generic_name)
            .bind(new.category_id)
            .bind(&new.manufacturer)
            .bind(&new.unit)
            .bind(&new.capacity)
            .bind(parsed.as_ref().map(|c| c.value))
            .bind(parsed.as_ref().map(|c| c.unit.as_str()))
            .bind(minimum_stock)
            .bind(new.purchase_price_cents)
            .bind(new.selling_price_cents)
            .bind(&new.description)
            .bind(&new.storage_location)
            .bind(&new.image_url)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await;

            match result {
                Ok(done) => {
                    debug!(barcode_id, "Medicine created");
                    return self.get(done.last_insert_rowid()).await;
                }
                // Generated id collided with an existing one: try a fresh one.
                // An explicit barcode id collision is the caller's error.
                Err(sqlx::Error::Database(db_err))
                    if db_err.message().contains("medicines.barcode_id")
                        && new.barcode_id.is_none()
                        && attempt < BARCODE_ATTEMPTS =>
                {
                    attempt += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Fetches a medicine with its stock total.
    pub async fn get(&self, id: i64) -> DbResult<MedicineStock> {
        let sql = format!("{STOCK_SELECT} WHERE m.id = ?");
        sqlx::query_as::<_, MedicineStock>(&sql)
            .bind(Utc::now().date_naive())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Medicine", id))
    }

    /// Fetches a medicine by its barcode id.
    pub async fn get_by_barcode(&self, barcode_id: &str) -> DbResult<MedicineStock> {
        let sql = format!("{STOCK_SELECT} WHERE m.barcode_id = ?");
        sqlx::query_as::<_, MedicineStock>(&sql)
            .bind(Utc::now().date_naive())
            .bind(barcode_id.trim())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Medicine", barcode_id))
    }

    /// Lists active medicines with stock totals, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<MedicineStock>> {
        let sql = format!("{STOCK_SELECT} WHERE m.is_active = 1 ORDER BY m.name");
        let rows = sqlx::query_as::<_, MedicineStock>(&sql)
            .bind(Utc::now().date_naive())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Applies a partial update. Supplying `capacity` re-parses the
    /// numeric/unit pair; the other fields update independently.
    pub async fn update(&self, id: i64, update: UpdateMedicine) -> DbResult<MedicineStock> {
        let current = self.get(id).await?.medicine;

        if let Some(name) = &update.name {
            validate_name("name", name)?;
        }
        if let Some(cents) = update.purchase_price_cents {
            validate_price_cents("purchase_price_cents", cents)?;
        }
        if let Some(cents) = update.selling_price_cents {
            validate_price_cents("selling_price_cents", cents)?;
        }

        let capacity = update.capacity.or(current.capacity);
        let parsed = capacity.as_deref().and_then(Capacity::parse);

        sqlx::query(
            "UPDATE medicines SET \
             name = ?, generic_name = ?, category_id = ?, manufacturer = ?, \
             unit = ?, capacity = ?, capacity_numeric = ?, capacity_unit = ?, \
             minimum_stock = ?, purchase_price_cents = ?, selling_price_cents = ?, \
             description = ?, storage_location = ?, image_url = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(update.name.unwrap_or(current.name).trim())
        .bind(update.generic_name.or(current.generic_name))
        .bind(update.category_id.unwrap_or(current.category_id))
        .bind(update.manufacturer.or(current.manufacturer))
        .bind(update.unit.unwrap_or(current.unit))
        .bind(&capacity)
        .bind(parsed.as_ref().map(|c| c.value))
        .bind(parsed.as_ref().map(|c| c.unit.as_str()))
        .bind(update.minimum_stock.unwrap_or(current.minimum_stock))
        .bind(update.purchase_price_cents.unwrap_or(current.purchase_price_cents))
        .bind(update.selling_price_cents.unwrap_or(current.selling_price_cents))
        .bind(update.description.or(current.description))
        .bind(update.storage_location.or(current.storage_location))
        .bind(update.image_url.or(current.image_url))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    /// Soft-deletes a medicine. Sale history keeps referencing it; it just
    /// stops appearing in search, matching, and new sales.
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE medicines SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", id));
        }
        Ok(())
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Free-text search over the active catalog.
    ///
    /// Matching is substring, ASCII-case-insensitive (SQLite `LIKE`), and
    /// includes out-of-stock medicines so the cashier can see a hit exists
    /// and offer alternatives.
    pub async fn search(&self, query: &str, kind: SearchKind) -> DbResult<Vec<MedicineHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let condition = match kind {
            SearchKind::All => "(name LIKE ? OR generic_name LIKE ? OR barcode_id LIKE ?)",
            SearchKind::Name => "name LIKE ?",
            SearchKind::Generic => "generic_name LIKE ?",
            SearchKind::Barcode => "barcode_id LIKE ?",
            SearchKind::Capacity => "capacity LIKE ?",
        };

        let sql = hit_sql(
            &format!("is_active = 1 AND {condition}"),
            "ORDER BY name LIMIT ?",
        );
        let pattern = format!("%{query}%");

        let mut q = sqlx::query_as::<_, MedicineHit>(&sql).bind(Utc::now().date_naive());
        let binds = if kind == SearchKind::All { 3 } else { 1 };
        for _ in 0..binds {
            q = q.bind(pattern.clone());
        }

        let rows = q.bind(SEARCH_LIMIT).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    // =========================================================================
    // Alternative Matching
    // =========================================================================

    /// Finds substitute candidates for a medicine, trying each tier in order
    /// and returning the first tier that produces hits.
    pub async fn alternatives_for(&self, medicine_id: i64) -> DbResult<Vec<MedicineHit>> {
        let source = self.get(medicine_id).await?.medicine;
        let today = Utc::now().date_naive();

        // Tier 1: same category, identical capacity string
        if let Some(capacity) =
            source.capacity.as_deref().map(str::trim).filter(|c| !c.is_empty())
        {
            let sql = tier_sql("category_id = ? AND capacity = ? COLLATE NOCASE", None);
            let hits = sqlx::query_as::<_, MedicineHit>(&sql)
                .bind(today)
                .bind(source.id)
                .bind(source.category_id)
                .bind(capacity)
                .fetch_all(&self.pool)
                .await?;
            if !hits.is_empty() {
                debug!(medicine_id, tier = 1, hits = hits.len(), "Alternatives matched");
                return Ok(hits);
            }
        }

        // Tier 2: same category, numeric capacity within tolerance, same unit
        if let (Some(value), Some(unit)) =
            (source.capacity_numeric, source.capacity_unit.as_deref())
        {
            let (lo, hi) = Capacity {
                value,
                unit: unit.to_string(),
            }
            .tolerance_bounds();
            let sql = tier_sql(
                "category_id = ? AND capacity_unit = ? AND capacity_numeric BETWEEN ? AND ?",
                None,
            );
            let hits = sqlx::query_as::<_, MedicineHit>(&sql)
                .bind(today)
                .bind(source.id)
                .bind(source.category_id)
                .bind(unit)
                .bind(lo)
                .bind(hi)
                .fetch_all(&self.pool)
                .await?;
            if !hits.is_empty() {
                debug!(medicine_id, tier = 2, hits = hits.len(), "Alternatives matched");
                return Ok(hits);
            }
        }

        // Tier 3: partial generic name match, any category
        if let Some(generic) = &source.generic_name {
            let sql = tier_sql("generic_name LIKE ?", None);
            let hits = sqlx::query_as::<_, MedicineHit>(&sql)
                .bind(today)
                .bind(source.id)
                .bind(format!("%{generic}%"))
                .fetch_all(&self.pool)
                .await?;
            if !hits.is_empty() {
                debug!(medicine_id, tier = 3, hits = hits.len(), "Alternatives matched");
                return Ok(hits);
            }
        }

        // Tier 4: same category, any capacity, capped
        let sql = tier_sql("category_id = ?", Some(CATEGORY_FALLBACK_LIMIT));
        let hits = sqlx::query_as::<_, MedicineHit>(&sql)
            .bind(today)
            .bind(source.id)
            .bind(source.category_id)
            .fetch_all(&self.pool)
            .await?;
        debug!(medicine_id, tier = 4, hits = hits.len(), "Alternatives matched");
        Ok(hits)
    }

    /// Flat free-text alternative search: substring over name, generic name,
    /// manufacturer, and capacity, optionally scoped to a category. Unlike
    /// [`alternatives_for`] this is not tiered; only active, in-stock
    /// medicines are offered.
    ///
    /// [`alternatives_for`]: MedicineRepository::alternatives_for
    pub async fn search_alternatives(
        &self,
        query: &str,
        category_id: Option<i64>,
    ) -> DbResult<Vec<MedicineHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut condition = String::from(
            "is_active = 1 AND stock > 0 AND \
             (name LIKE ? OR generic_name LIKE ? OR manufacturer LIKE ? OR capacity LIKE ?)",
        );
        if category_id.is_some() {
            condition.push_str(" AND category_id = ?");
        }
        let sql = hit_sql(&condition, "ORDER BY name LIMIT ?");
        let pattern = format!("%{query}%");

        let mut q = sqlx::query_as::<_, MedicineHit>(&sql).bind(Utc::now().date_naive());
        for _ in 0..4 {
            q = q.bind(pattern.clone());
        }
        if let Some(category) = category_id {
            q = q.bind(category);
        }
        let rows = q.bind(ALTERNATIVES_SEARCH_LIMIT).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    // =========================================================================
    // Stock Reports
    // =========================================================================

    /// Active medicines at or below their minimum stock threshold
    /// (out-of-stock rows included).
    pub async fn list_low_stock(&self) -> DbResult<Vec<MedicineStock>> {
        let sql = format!(
            "SELECT * FROM ({STOCK_SELECT}) \
             WHERE is_active = 1 AND total_quantity <= minimum_stock \
             ORDER BY total_quantity, name"
        );
        let rows = sqlx::query_as::<_, MedicineStock>(&sql)
            .bind(Utc::now().date_naive())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Active medicines with no sellable stock at all.
    pub async fn list_out_of_stock(&self) -> DbResult<Vec<MedicineStock>> {
        let sql = format!(
            "SELECT * FROM ({STOCK_SELECT}) \
             WHERE is_active = 1 AND total_quantity = 0 \
             ORDER BY name"
        );
        let rows = sqlx::query_as::<_, MedicineStock>(&sql)
            .bind(Utc::now().date_naive())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
