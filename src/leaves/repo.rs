use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Closed set of bookable leave kinds, stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum LeaveType {
    PlannedLeave,
    EmergencyLeave,
}

impl LeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::PlannedLeave => "PlannedLeave",
            LeaveType::EmergencyLeave => "EmergencyLeave",
        }
    }
}

impl std::str::FromStr for LeaveType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PlannedLeave" => Ok(LeaveType::PlannedLeave),
            "EmergencyLeave" => Ok(LeaveType::EmergencyLeave),
            _ => Err(()),
        }
    }
}

/// One stored leave booking. Immutable once created; dates are inclusive day
/// boundaries.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Leave {
    pub id: Uuid,
    pub user_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: Date,
    pub end_date: Date,
    pub reason: Option<String>,
    pub created_at: OffsetDateTime,
}

const LEAVE_COLUMNS: &str = "id, user_id, leave_type, start_date, end_date, reason, created_at";

impl Leave {
    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        leave_type: LeaveType,
        start_date: Date,
        end_date: Date,
        reason: Option<&str>,
    ) -> sqlx::Result<Leave> {
        sqlx::query_as::<_, Leave>(&format!(
            r#"
            INSERT INTO leaves (user_id, leave_type, start_date, end_date, reason)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LEAVE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(leave_type)
        .bind(start_date)
        .bind(end_date)
        .bind(reason)
        .fetch_one(db)
        .await
    }

    /// First stored booking for `user_id` whose day range intersects
    /// `[start_date, end_date]`, if any.
    pub async fn find_overlapping(
        db: &PgPool,
        user_id: Uuid,
        start_date: Date,
        end_date: Date,
    ) -> sqlx::Result<Option<Leave>> {
        sqlx::query_as::<_, Leave>(&format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leaves
            WHERE user_id = $1 AND start_date <= $3 AND end_date >= $2
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_optional(db)
        .await
    }

    /// One page of a user's bookings, oldest first. Ordering is pinned so
    /// pagination is deterministic.
    pub async fn list_page(
        db: &PgPool,
        user_id: Uuid,
        leave_type: Option<LeaveType>,
        limit: i64,
        offset: i64,
    ) -> sqlx::Result<Vec<Leave>> {
        sqlx::query_as::<_, Leave>(&format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leaves
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR leave_type = $2)
            ORDER BY created_at ASC, id ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(user_id)
        .bind(leave_type.map(|t| t.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn count_for_user(
        db: &PgPool,
        user_id: Uuid,
        leave_type: Option<LeaveType>,
    ) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM leaves
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR leave_type = $2)
            "#,
        )
        .bind(user_id)
        .bind(leave_type.map(|t| t.as_str()))
        .fetch_one(db)
        .await
    }

    /// Lookup restricted to the owner: a caller can only read their own
    /// bookings.
    pub async fn find_for_user(db: &PgPool, id: Uuid, user_id: Uuid) -> sqlx::Result<Option<Leave>> {
        sqlx::query_as::<_, Leave>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leaves WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn leave_type_round_trips_through_str() {
        for t in [LeaveType::PlannedLeave, LeaveType::EmergencyLeave] {
            assert_eq!(t.as_str().parse::<LeaveType>(), Ok(t));
        }
        assert!("Sabbatical".parse::<LeaveType>().is_err());
    }

    #[test]
    fn leave_serializes_with_camel_case_keys_and_iso_dates() {
        let leave = Leave {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            leave_type: LeaveType::PlannedLeave,
            start_date: date!(2025 - 03 - 10),
            end_date: date!(2025 - 03 - 12),
            reason: Some("vacation".into()),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };

        let json = serde_json::to_string(&leave).unwrap();
        assert!(json.contains("\"userId\""));
        assert!(json.contains("\"leaveType\":\"PlannedLeave\""));
        assert!(json.contains("\"startDate\":\"2025-03-10\""));
        assert!(json.contains("\"endDate\":\"2025-03-12\""));
    }
}
