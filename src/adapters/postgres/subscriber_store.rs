//! PostgreSQL implementation of the subscriber ports.
//!
//! Reads and writes the `subscribers` table:
//!
//! ```sql
//! user_id          TEXT PRIMARY KEY
//! email            TEXT NULL
//! subscribed       BOOLEAN NOT NULL
//! subscription_end TIMESTAMPTZ NULL
//! is_trial         BOOLEAN NOT NULL
//! trial_started_at TIMESTAMPTZ NULL
//! trial_ends_at    TIMESTAMPTZ NULL
//! ```
//!
//! The schema is managed outside this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::access::SubscriberRecord;
use crate::domain::foundation::{normalize_email, DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{LookupError, SubscriberReader, SubscriberRepository};

const SELECT_COLUMNS: &str = "user_id, email, subscribed, subscription_end, is_trial, \
                              trial_started_at, trial_ends_at";

/// Lowest `user_id` wins when several rows match.
fn select_first_sql(condition: &str) -> String {
    format!(
        "SELECT {} FROM subscribers WHERE {} ORDER BY user_id LIMIT 1",
        SELECT_COLUMNS, condition
    )
}

/// PostgreSQL implementation of `SubscriberReader` and `SubscriberRepository`.
#[derive(Clone)]
pub struct PostgresSubscriberStore {
    pool: PgPool,
}

impl PostgresSubscriberStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        value: &str,
    ) -> Result<Option<SubscriberRecord>, LookupError> {
        let sql = select_first_sql(condition);
        let row: Option<SubscriberRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;

        row.map(SubscriberRecord::try_from).transpose()
    }
}

/// Database row representation of a subscriber.
#[derive(Debug, sqlx::FromRow)]
struct SubscriberRow {
    user_id: String,
    email: Option<String>,
    subscribed: bool,
    subscription_end: Option<DateTime<Utc>>,
    is_trial: bool,
    trial_started_at: Option<DateTime<Utc>>,
    trial_ends_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriberRow> for SubscriberRecord {
    type Error = LookupError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let user_id =
            UserId::new(row.user_id).map_err(|e| LookupError::malformed("user_id", e.to_string()))?;

        if let (Some(start), Some(end)) = (row.trial_started_at, row.trial_ends_at) {
            if start > end {
                return Err(LookupError::malformed(
                    "trial_ends_at",
                    format!("trial ends ({}) before it starts ({})", end, start),
                ));
            }
        }

        Ok(SubscriberRecord {
            user_id,
            email: row.email,
            subscribed: row.subscribed,
            subscription_end: row.subscription_end.map(Timestamp::from_datetime),
            is_trial: row.is_trial,
            trial_started_at: row.trial_started_at.map(Timestamp::from_datetime),
            trial_ends_at: row.trial_ends_at.map(Timestamp::from_datetime),
        })
    }
}

/// Decode failures mean the row is bad; everything else is the store's fault.
fn classify_sqlx_error(err: sqlx::Error) -> LookupError {
    match err {
        sqlx::Error::ColumnDecode { index, source } => {
            LookupError::malformed(index, source.to_string())
        }
        sqlx::Error::ColumnNotFound(column) => {
            LookupError::malformed(column, "column missing from result")
        }
        sqlx::Error::Decode(source) => LookupError::malformed("row", source.to_string()),
        other => LookupError::unavailable(other.to_string()),
    }
}

fn to_domain_error(err: LookupError) -> DomainError {
    match err {
        LookupError::Unavailable(message) => DomainError::database(message),
        LookupError::Malformed { field, reason } => {
            DomainError::new(ErrorCode::MalformedRecord, reason).with_detail("field", field)
        }
    }
}

fn to_datetime(ts: Option<Timestamp>) -> Option<DateTime<Utc>> {
    ts.map(|t| *t.as_datetime())
}

#[async_trait]
impl SubscriberReader for PostgresSubscriberStore {
    async fn get_subscriber(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriberRecord>, LookupError> {
        self.fetch_one_where("user_id = $1", user_id.as_str()).await
    }
}

#[async_trait]
impl SubscriberRepository for PostgresSubscriberStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriberRecord>, DomainError> {
        self.get_subscriber(user_id).await.map_err(to_domain_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRecord>, DomainError> {
        self.fetch_one_where("lower(trim(email)) = $1", &normalize_email(email))
            .await
            .map_err(to_domain_error)
    }

    async fn insert_if_absent(&self, record: &SubscriberRecord) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscribers (
                user_id, email, subscribed, subscription_end,
                is_trial, trial_started_at, trial_ends_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(record.user_id.as_str())
        .bind(record.email.as_deref())
        .bind(record.subscribed)
        .bind(to_datetime(record.subscription_end))
        .bind(record.is_trial)
        .bind(to_datetime(record.trial_started_at))
        .bind(to_datetime(record.trial_ends_at))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert subscriber: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn update(&self, record: &SubscriberRecord) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscribers SET
                email = $2,
                subscribed = $3,
                subscription_end = $4,
                is_trial = $5,
                trial_started_at = $6,
                trial_ends_at = $7
            WHERE user_id = $1
            "#,
        )
        .bind(record.user_id.as_str())
        .bind(record.email.as_deref())
        .bind(record.subscribed)
        .bind(to_datetime(record.subscription_end))
        .bind(record.is_trial)
        .bind(to_datetime(record.trial_started_at))
        .bind(to_datetime(record.trial_ends_at))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update subscriber: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriberNotFound,
                format!("No subscriber for user {}", record.user_id),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SubscriberRow {
        let start = "2025-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        SubscriberRow {
            user_id: "user-1".to_string(),
            email: Some("a@b.c".to_string()),
            subscribed: false,
            subscription_end: None,
            is_trial: true,
            trial_started_at: Some(start),
            trial_ends_at: Some(start + chrono::Duration::days(30)),
        }
    }

    #[test]
    fn lookups_pick_lowest_user_id() {
        let sql = select_first_sql("lower(trim(email)) = $1");

        assert!(sql.ends_with("WHERE lower(trim(email)) = $1 ORDER BY user_id LIMIT 1"));
    }

    #[test]
    fn row_converts_to_record() {
        let record = SubscriberRecord::try_from(row()).unwrap();

        assert_eq!(record.user_id.as_str(), "user-1");
        assert!(record.is_trial);
        assert_eq!(
            record.trial_ends_at,
            Some(Timestamp::parse_rfc3339("2025-01-31T00:00:00Z").unwrap())
        );
    }

    #[test]
    fn blank_user_id_is_malformed() {
        let bad = SubscriberRow {
            user_id: "  ".to_string(),
            ..row()
        };
        assert!(matches!(
            SubscriberRecord::try_from(bad),
            Err(LookupError::Malformed { ref field, .. }) if field == "user_id"
        ));
    }

    #[test]
    fn inverted_trial_window_is_malformed() {
        let r = row();
        let bad = SubscriberRow {
            trial_started_at: r.trial_ends_at,
            trial_ends_at: r.trial_started_at,
            ..r
        };
        assert!(matches!(
            SubscriberRecord::try_from(bad),
            Err(LookupError::Malformed { .. })
        ));
    }

    #[test]
    fn connection_errors_are_unavailable() {
        let err = classify_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, LookupError::Unavailable(_)));
    }

    #[test]
    fn missing_column_is_malformed() {
        let err = classify_sqlx_error(sqlx::Error::ColumnNotFound("trial_ends_at".to_string()));
        assert_eq!(
            err,
            LookupError::malformed("trial_ends_at", "column missing from result")
        );
    }

    #[test]
    fn malformed_lookup_maps_to_malformed_domain_error() {
        let err = to_domain_error(LookupError::malformed("subscribed", "not a bool"));
        assert_eq!(err.code, ErrorCode::MalformedRecord);
        assert_eq!(err.details.get("field").map(String::as_str), Some("subscribed"));
    }
}
