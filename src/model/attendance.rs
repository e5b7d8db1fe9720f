use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Status assigned to an attendance row at creation time.
///
/// `present`/`late` come from the time policy at check-in; `absent` rows
/// are created administratively and never transition to the other two.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 42,
        "user_id": 7,
        "date": "2025-06-02",
        "check_in": "2025-06-02T08:03:11",
        "check_out": "2025-06-02T17:12:40",
        "status": "present",
        "notes": null
    })
)]
pub struct Attendance {
    #[schema(example = 42)]
    pub id: u64,

    #[schema(example = 7)]
    pub user_id: u64,

    #[schema(example = "2025-06-02", value_type = String, format = "date")]
    pub date: NaiveDate,

    /// Midnight of `date` for absent-marked rows.
    #[schema(example = "2025-06-02T08:03:11", value_type = String, format = "date-time")]
    pub check_in: NaiveDateTime,

    #[schema(example = "2025-06-02T17:12:40", value_type = Option<String>, format = "date-time", nullable = true)]
    pub check_out: Option<NaiveDateTime>,

    pub status: AttendanceStatus,

    #[schema(example = "sick leave", nullable = true)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(AttendanceStatus::Present.to_string(), "present");
        assert_eq!(AttendanceStatus::Late.to_string(), "late");
        assert_eq!(AttendanceStatus::Absent.to_string(), "absent");
    }

    #[test]
    fn status_parses_from_stored_strings() {
        assert_eq!(
            AttendanceStatus::from_str("late").unwrap(),
            AttendanceStatus::Late
        );
        assert!(AttendanceStatus::from_str("on_leave").is_err());
    }
}
