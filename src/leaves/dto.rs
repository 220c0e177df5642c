use serde::{Deserialize, Serialize};

use crate::leaves::repo::Leave;

/// Request body for POST /leave. Fields arrive as strings and are validated
/// by the scheduler so malformed input surfaces as a 400, not a framework
/// rejection. The caller's identity comes from the bearer token, never the
/// body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeaveRequest {
    pub leave_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub reason: Option<String>,
}

/// Query parameters for GET /leave.
#[derive(Debug, Deserialize)]
pub struct LeaveQuery {
    #[serde(rename = "type")]
    pub leave_type: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LeaveListResponse {
    pub leaves: Vec<Leave>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_request_accepts_camel_case_fields() {
        let body: ApplyLeaveRequest = serde_json::from_str(
            r#"{"leaveType":"PlannedLeave","startDate":"2025-03-10","endDate":"2025-03-12"}"#,
        )
        .unwrap();
        assert_eq!(body.leave_type.as_deref(), Some("PlannedLeave"));
        assert_eq!(body.start_date.as_deref(), Some("2025-03-10"));
        assert!(body.reason.is_none());
    }

    #[test]
    fn list_response_shape() {
        let body = LeaveListResponse {
            leaves: vec![],
            total: 12,
            page: 2,
            pages: 3,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"total\":12"));
        assert!(json.contains("\"pages\":3"));
    }
}
