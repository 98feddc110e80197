//! # Doctor Repository
//!
//! Prescribers are keyed by STR number (the Indonesian medical license).
//! A prescription sale naming a doctor the system does not know MUST carry
//! an STR number; the sale flow refuses to mint placeholder identities for
//! unverifiable prescribers.

use apotek_core::phone::normalize_whatsapp;
use apotek_core::types::Doctor;
use apotek_core::validation::validate_name;
use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Doctor details as captured from a prescription.
#[derive(Debug, Clone, Deserialize)]
pub struct DoctorInfo {
    pub name: String,
    /// Required for doctors not yet on file.
    pub str_number: Option<String>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub hospital_clinic: Option<String>,
}

/// Repository for prescribing doctors.
#[derive(Debug, Clone)]
pub struct DoctorRepository {
    pool: SqlitePool,
}

impl DoctorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DoctorRepository { pool }
    }

    /// Registers a doctor. The STR number is mandatory here; prescription
    /// intake without one goes through [`resolve_on`] which rejects unknown
    /// names instead.
    ///
    /// [`resolve_on`]: DoctorRepository::resolve_on
    pub async fn create(&self, info: &DoctorInfo) -> DbResult<Doctor> {
        let mut conn = self.pool.acquire().await?;
        let Some(str_number) = info.str_number.as_deref().map(str::trim).filter(|s| !s.is_empty())
        else {
            return Err(DbError::DoctorIdentityRequired {
                name: info.name.clone(),
            });
        };
        Self::insert_on(&mut conn, info, str_number).await
    }

    /// Fetches a doctor by id.
    pub async fn get(&self, id: i64) -> DbResult<Doctor> {
        sqlx::query_as::<_, Doctor>("SELECT * FROM doctors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Doctor", id))
    }

    /// Substring search over name, STR number, specialization, and clinic.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Doctor>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{query}%");
        let rows = sqlx::query_as::<_, Doctor>(
            "SELECT * FROM doctors \
             WHERE name LIKE ? OR str_number LIKE ? OR specialization LIKE ? \
                OR hospital_clinic LIKE ? \
             ORDER BY name LIMIT 20",
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Resolves a prescription's doctor inside the sale transaction.
    ///
    /// ## Resolution Order
    /// 1. Exact name match (case-insensitive) → existing record
    /// 2. No match, STR number supplied → register the doctor now
    /// 3. No match, no STR number → [`DbError::DoctorIdentityRequired`]
    pub async fn resolve_on(conn: &mut SqliteConnection, info: &DoctorInfo) -> DbResult<Doctor> {
        validate_name("doctor_name", &info.name)?;

        let existing = sqlx::query_as::<_, Doctor>(
            "SELECT * FROM doctors WHERE name = ? COLLATE NOCASE",
        )
        .bind(info.name.trim())
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(doctor) = existing {
            return Ok(doctor);
        }

        match info.str_number.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(str_number) => Self::insert_on(conn, info, str_number).await,
            None => Err(DbError::DoctorIdentityRequired {
                name: info.name.trim().to_string(),
            }),
        }
    }

    async fn insert_on(
        conn: &mut SqliteConnection,
        info: &DoctorInfo,
        str_number: &str,
    ) -> DbResult<Doctor> {
        validate_name("doctor_name", &info.name)?;
        let whatsapp = info.whatsapp.as_deref().and_then(normalize_whatsapp);
        let now = Utc::now();

        let doctor = sqlx::query_as::<_, Doctor>(
            "INSERT INTO doctors \
             (name, str_number, specialization, phone, whatsapp, hospital_clinic, \
              created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING *",
        )
        .bind(info.name.trim())
        .bind(str_number)
        .bind(&info.specialization)
        .bind(&info.phone)
        .bind(&whatsapp)
        .bind(&info.hospital_clinic)
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await?;

        debug!(doctor = %doctor.name, "Doctor registered");
        Ok(doctor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn budi(str_number: Option<&str>) -> DoctorInfo {
        DoctorInfo {
            name: "dr. Budi Santoso".to_string(),
            str_number: str_number.map(String::from),
            specialization: Some("Umum".to_string()),
            phone: None,
            whatsapp: None,
            hospital_clinic: Some("Klinik Sehat".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_requires_str() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.doctors().create(&budi(None)).await.unwrap_err();
        assert!(matches!(err, DbError::DoctorIdentityRequired { .. }));

        db.doctors().create(&budi(Some("STR-12345"))).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_finds_existing_case_insensitive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.doctors().create(&budi(Some("STR-12345"))).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let mut lookup = budi(None);
        lookup.name = "DR. BUDI SANTOSO".to_string();
        let resolved = DoctorRepository::resolve_on(&mut conn, &lookup).await.unwrap();
        assert_eq!(resolved.id, created.id);
    }

    #[tokio::test]
    async fn test_resolve_unknown_without_str_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let err = DoctorRepository::resolve_on(&mut conn, &budi(None)).await.unwrap_err();
        assert!(matches!(err, DbError::DoctorIdentityRequired { .. }));
    }

    #[tokio::test]
    async fn test_resolve_registers_with_str() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let doctor = DoctorRepository::resolve_on(&mut conn, &budi(Some("STR-99")))
            .await
            .unwrap();
        assert_eq!(doctor.str_number, "STR-99");

        // Second resolve hits the existing record
        let again = DoctorRepository::resolve_on(&mut conn, &budi(None)).await.unwrap();
        assert_eq!(again.id, doctor.id);
    }

    #[tokio::test]
    async fn test_duplicate_str_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.doctors().create(&budi(Some("STR-1"))).await.unwrap();

        let mut other = budi(Some("STR-1"));
        other.name = "dr. Andi".to_string();
        let err = db.doctors().create(&other).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
