use sqlx::PgPool;
use time::{macros::format_description, Date, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::{is_exclusion_violation, ApiError};
use crate::leaves::repo::{Leave, LeaveType};

/// Applications may be backdated at most this many days.
const BACKDATE_GRACE_DAYS: i64 = 3;

/// Defensive ceiling on page size; requests above it are clamped.
const MAX_PAGE_LIMIT: i64 = 100;
const DEFAULT_PAGE_LIMIT: i64 = 10;

const CONFLICT_MESSAGE: &str = "Cannot apply for more than one leave on the same day.";

pub fn parse_date(s: &str) -> Result<Date, ApiError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(s, &format).map_err(|_| ApiError::InvalidInput("Invalid date format.".into()))
}

pub fn parse_leave_type(s: &str) -> Result<LeaveType, ApiError> {
    s.parse()
        .map_err(|_| ApiError::InvalidInput("Invalid leave type.".into()))
}

/// Business rules on the requested range, checked in order: backdating beyond
/// the grace window first, then range inversion.
pub fn validate_range(start: Date, end: Date, today: Date) -> Result<(), ApiError> {
    if start < today - Duration::days(BACKDATE_GRACE_DAYS) {
        return Err(ApiError::PolicyViolation(
            "Backdated leave applications older than 3 days are not allowed.".into(),
        ));
    }
    if start > end {
        return Err(ApiError::PolicyViolation(
            "End date must be after the start date.".into(),
        ));
    }
    Ok(())
}

/// Inclusive day-range intersection.
pub fn ranges_overlap(start_a: Date, end_a: Date, start_b: Date, end_b: Date) -> bool {
    start_a <= end_b && start_b <= end_a
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

pub fn page_plan(page: Option<i64>, limit: Option<i64>) -> PagePlan {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    PagePlan {
        page,
        limit,
        offset: (page - 1) * limit,
    }
}

/// Total page count for `total` records at `limit` per page.
pub fn pages_for(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

/// Validate and persist a leave application. Validation fully precedes the
/// store write; the first failing rule wins.
pub async fn apply_leave(
    db: &PgPool,
    user_id: Uuid,
    leave_type: &str,
    start_date: &str,
    end_date: &str,
    reason: Option<&str>,
) -> Result<Leave, ApiError> {
    let leave_type = parse_leave_type(leave_type)?;
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;

    let today = OffsetDateTime::now_utc().date();
    validate_range(start, end, today)?;

    if let Some(existing) = Leave::find_overlapping(db, user_id, start, end).await? {
        debug_assert!(ranges_overlap(
            start,
            end,
            existing.start_date,
            existing.end_date
        ));
        return Err(ApiError::Conflict(CONFLICT_MESSAGE.into()));
    }

    // Two racing applications can both pass the check above; the exclusion
    // constraint rejects the loser.
    Leave::insert(db, user_id, leave_type, start, end, reason)
        .await
        .map_err(|e| {
            if is_exclusion_violation(&e) {
                ApiError::Conflict(CONFLICT_MESSAGE.into())
            } else {
                e.into()
            }
        })
}
