//! SQLite-backed record store.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::info;

use nscan_models::PatientRecord;

use crate::error::{StoreError, StoreResult};

/// Insert-only store for patient classification records plus the patient
/// identifier sequence.
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Open (or create) the database at the given URL and prepare the
    /// schema.
    ///
    /// The pool is pinned to a single connection: SQLite serializes
    /// writers anyway, and an in-memory database exists per connection.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS patients (
                patient_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                age INTEGER NOT NULL,
                blood_type TEXT NOT NULL,
                tumor_result TEXT NOT NULL,
                confidence_score TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS patient_sequence (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                value INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("INSERT OR IGNORE INTO patient_sequence (id, value) VALUES (1, 0)")
            .execute(&self.pool)
            .await?;

        // Re-sync with any records written before the sequence table
        // existed so the next identifier never collides.
        sqlx::query(
            r#"
            UPDATE patient_sequence
            SET value = MAX(
                value,
                (SELECT COALESCE(MAX(CAST(substr(patient_id, 3) AS INTEGER)), 0) FROM patients)
            )
            WHERE id = 1
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Record store schema ready");
        Ok(())
    }

    /// Mint the next patient identifier.
    ///
    /// The sequence is advanced with a single atomic statement; there is
    /// no read-then-write window, so concurrent requests cannot observe
    /// the same value. The numeric suffix is zero-padded to two digits and
    /// widens arithmetically past 99 (`P_99` is followed by `P_100`).
    pub async fn next_patient_id(&self) -> StoreResult<String> {
        let row =
            sqlx::query("UPDATE patient_sequence SET value = value + 1 WHERE id = 1 RETURNING value")
                .fetch_one(&self.pool)
                .await?;

        let sequence: i64 = row.try_get(0)?;
        Ok(format_patient_id(sequence))
    }

    /// Append one classification record. Records are never updated or
    /// deleted.
    pub async fn insert_record(&self, record: &PatientRecord) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO patients
                (patient_id, name, phone, age, blood_type, tumor_result, confidence_score, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.patient_id)
        .bind(&record.name)
        .bind(&record.phone)
        .bind(record.age)
        .bind(&record.blood_type)
        .bind(&record.tumor_result)
        .bind(&record.confidence_score)
        .bind(record.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateIdentifier(record.patient_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a record by its patient identifier.
    pub async fn fetch_record(&self, patient_id: &str) -> StoreResult<Option<PatientRecord>> {
        let row = sqlx::query(
            r#"
            SELECT patient_id, name, phone, age, blood_type, tumor_result, confidence_score, created_at
            FROM patients
            WHERE patient_id = ?
            "#,
        )
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(PatientRecord {
                patient_id: row.try_get("patient_id")?,
                name: row.try_get("name")?,
                phone: row.try_get("phone")?,
                age: row.try_get("age")?,
                blood_type: row.try_get("blood_type")?,
                tumor_result: row.try_get("tumor_result")?,
                confidence_score: row.try_get("confidence_score")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    /// Cheap connectivity probe for readiness checks.
    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// `P_<NN>`: zero-padded to width 2, widening numerically beyond 99.
fn format_patient_id(sequence: i64) -> String {
    format!("P_{sequence:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nscan_models::PatientRecord;

    async fn memory_store() -> RecordStore {
        RecordStore::connect("sqlite::memory:").await.unwrap()
    }

    fn record(patient_id: &str) -> PatientRecord {
        PatientRecord {
            patient_id: patient_id.to_string(),
            name: "Jane Doe".to_string(),
            phone: "555-0100".to_string(),
            age: 42,
            blood_type: "O+".to_string(),
            tumor_result: "Tumor -ve".to_string(),
            confidence_score: "100.00%".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn identifier_format_widens_past_two_digits() {
        assert_eq!(format_patient_id(1), "P_01");
        assert_eq!(format_patient_id(9), "P_09");
        assert_eq!(format_patient_id(99), "P_99");
        assert_eq!(format_patient_id(100), "P_100");
        assert_eq!(format_patient_id(1234), "P_1234");
    }

    #[tokio::test]
    async fn first_identifier_is_p_01() {
        let store = memory_store().await;
        assert_eq!(store.next_patient_id().await.unwrap(), "P_01");
    }

    #[tokio::test]
    async fn identifiers_increase_by_one() {
        let store = memory_store().await;
        let mut previous = 0;
        for _ in 0..5 {
            let id = store.next_patient_id().await.unwrap();
            let suffix: i64 = id.strip_prefix("P_").unwrap().parse().unwrap();
            assert_eq!(suffix, previous + 1);
            previous = suffix;
        }
    }

    #[tokio::test]
    async fn hundredth_identifier_widens() {
        let store = memory_store().await;
        sqlx::query("UPDATE patient_sequence SET value = 99 WHERE id = 1")
            .execute(&store.pool)
            .await
            .unwrap();
        assert_eq!(store.next_patient_id().await.unwrap(), "P_100");
    }

    #[tokio::test]
    async fn insert_and_fetch_round_trip() {
        let store = memory_store().await;
        let record = record("P_01");
        store.insert_record(&record).await.unwrap();

        let fetched = store.fetch_record("P_01").await.unwrap().unwrap();
        assert_eq!(fetched.patient_id, record.patient_id);
        assert_eq!(fetched.name, record.name);
        assert_eq!(fetched.age, record.age);
        assert_eq!(fetched.tumor_result, record.tumor_result);
        assert_eq!(fetched.confidence_score, record.confidence_score);
    }

    #[tokio::test]
    async fn fetch_unknown_identifier_is_none() {
        let store = memory_store().await;
        assert!(store.fetch_record("P_404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_identifier_is_rejected() {
        let store = memory_store().await;
        store.insert_record(&record("P_01")).await.unwrap();

        let err = store.insert_record(&record("P_01")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentifier(id) if id == "P_01"));
    }

    #[tokio::test]
    async fn sequence_resyncs_past_preexisting_records() {
        let store = memory_store().await;
        store.insert_record(&record("P_07")).await.unwrap();

        // Re-running schema init must pick up the existing max suffix.
        store.init_schema().await.unwrap();
        assert_eq!(store.next_patient_id().await.unwrap(), "P_08");
    }

    #[tokio::test]
    async fn ping_succeeds_on_open_store() {
        let store = memory_store().await;
        store.ping().await.unwrap();
    }
}
