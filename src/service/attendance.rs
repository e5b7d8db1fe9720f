use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::policy::TimePolicy;
use crate::service::error::{map_duplicate, AttendanceError};

/// Per-user counts for a stats query. COUNT(*) columns come back signed.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "total_days": 25,
    "present_days": 20,
    "late_days": 3,
    "absent_days": 2
}))]
pub struct AttendanceStats {
    pub total_days: i64,
    pub present_days: i64,
    pub late_days: i64,
    pub absent_days: i64,
}

/// Org-wide breakdown for a single day.
#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "total_records": 5,
    "present": 3,
    "late": 1,
    "absent": 1,
    "not_checked_in": 5
}))]
pub struct AttendanceSummary {
    pub total_records: i64,
    pub present: i64,
    pub late: i64,
    pub absent: i64,
    /// Employees with no attendance row for the day, counted against
    /// the full roster rather than just existing rows.
    pub not_checked_in: i64,
}

/// Count a day's rows by status and derive `not_checked_in` from the
/// roster size. Rows beyond the roster (stale employees) clamp to zero.
pub fn summarize(records: &[Attendance], roster_total: i64) -> AttendanceSummary {
    let count = |status: AttendanceStatus| {
        records.iter().filter(|r| r.status == status).count() as i64
    };

    AttendanceSummary {
        total_records: records.len() as i64,
        present: count(AttendanceStatus::Present),
        late: count(AttendanceStatus::Late),
        absent: count(AttendanceStatus::Absent),
        not_checked_in: (roster_total - records.len() as i64).max(0),
    }
}

/// Default history window: first of the current month through today.
pub fn month_to_date(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today.with_day(1).unwrap_or(today), today)
}

/// Decide whether today's record can take a check-out at `now`.
///
/// Absent rows have no check-in/out flow, so they report the same
/// `NoCheckInFound` as a missing row. Returns the record to update.
fn ready_for_check_out(
    existing: Option<Attendance>,
    now: chrono::NaiveDateTime,
) -> Result<Attendance, AttendanceError> {
    let record = existing.ok_or(AttendanceError::NoCheckInFound)?;

    if record.status == AttendanceStatus::Absent {
        return Err(AttendanceError::NoCheckInFound);
    }
    if record.check_out.is_some() {
        return Err(AttendanceError::AlreadyCheckedOut);
    }
    if now <= record.check_in {
        return Err(AttendanceError::Validation(
            "Check-out must be after check-in".to_string(),
        ));
    }

    Ok(record)
}

/// Orchestrates check-in/check-out, absence marking and reporting over
/// the `attendances` table. Stateless apart from the pool handle and the
/// work policy, so it is cloned freely into actix workers.
#[derive(Clone)]
pub struct AttendanceService {
    pool: MySqlPool,
    policy: TimePolicy,
}

const SELECT_COLS: &str =
    "SELECT id, user_id, date, check_in, check_out, status, notes FROM attendances";

impl AttendanceService {
    pub fn new(pool: MySqlPool, policy: TimePolicy) -> Self {
        Self { pool, policy }
    }

    pub fn policy(&self) -> &TimePolicy {
        &self.policy
    }

    /// Record a check-in for today. The status is classified up front and
    /// written in a single INSERT; the unique (user_id, date) index turns
    /// a concurrent duplicate into `AlreadyCheckedIn`.
    pub async fn check_in(&self, user_id: u64) -> Result<Attendance, AttendanceError> {
        let now = Local::now().naive_local();
        let status = self.policy.classify(now);

        let result = sqlx::query(
            "INSERT INTO attendances (user_id, date, check_in, status) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(now.date())
        .bind(now)
        .bind(status)
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => self.fetch_by_id(res.last_insert_id()).await,
            Err(e) => Err(map_duplicate(e, AttendanceError::AlreadyCheckedIn)),
        }
    }

    /// Set today's check-out. Absent rows have no check-in/out flow, so
    /// they surface as `NoCheckInFound`. The UPDATE keeps the
    /// `check_out IS NULL` guard; losing a race to another check-out
    /// reports `AlreadyCheckedOut` instead of overwriting.
    pub async fn check_out(&self, user_id: u64) -> Result<Attendance, AttendanceError> {
        let now = Local::now().naive_local();

        let existing = ready_for_check_out(self.today_attendance(user_id).await?, now)?;

        let res = sqlx::query("UPDATE attendances SET check_out = ? WHERE id = ? AND check_out IS NULL")
            .bind(now)
            .bind(existing.id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(AttendanceError::AlreadyCheckedOut);
        }

        self.fetch_by_id(existing.id).await
    }

    /// Administrative absence marking: a terminal `absent` row with a
    /// synthetic midnight check-in for the given date.
    pub async fn mark_absent(
        &self,
        user_id: u64,
        date: NaiveDate,
        reason: Option<String>,
    ) -> Result<Attendance, AttendanceError> {
        let midnight = date.and_time(NaiveTime::MIN);

        let result = sqlx::query(
            "INSERT INTO attendances (user_id, date, check_in, status, notes) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(date)
        .bind(midnight)
        .bind(AttendanceStatus::Absent)
        .bind(reason)
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => self.fetch_by_id(res.last_insert_id()).await,
            Err(e) => Err(map_duplicate(e, AttendanceError::DuplicateRecord)),
        }
    }

    pub async fn today_attendance(
        &self,
        user_id: u64,
    ) -> Result<Option<Attendance>, AttendanceError> {
        let today = Local::now().date_naive();

        let record = sqlx::query_as::<_, Attendance>(&format!(
            "{SELECT_COLS} WHERE user_id = ? AND date = ?"
        ))
        .bind(user_id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// One user's records in [start, end], most recent first.
    pub async fn user_attendance(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Attendance>, AttendanceError> {
        let records = sqlx::query_as::<_, Attendance>(&format!(
            "{SELECT_COLS} WHERE user_id = ? AND date BETWEEN ? AND ? ORDER BY date DESC"
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// All users' records in [start, end], most recent first.
    pub async fn all_attendance(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Attendance>, AttendanceError> {
        let records = sqlx::query_as::<_, Attendance>(&format!(
            "{SELECT_COLS} WHERE date BETWEEN ? AND ? ORDER BY date DESC, user_id"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Count-by-status for one user. Month and year restrict the range
    /// independently; an omitted dimension is unrestricted.
    pub async fn attendance_stats(
        &self,
        user_id: u64,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<AttendanceStats, AttendanceError> {
        let mut sql = String::from(
            "SELECT COUNT(*) AS total_days, \
             COUNT(CASE WHEN status = 'present' THEN 1 END) AS present_days, \
             COUNT(CASE WHEN status = 'late' THEN 1 END) AS late_days, \
             COUNT(CASE WHEN status = 'absent' THEN 1 END) AS absent_days \
             FROM attendances WHERE user_id = ?",
        );
        if month.is_some() {
            sql.push_str(" AND MONTH(date) = ?");
        }
        if year.is_some() {
            sql.push_str(" AND YEAR(date) = ?");
        }

        let mut query = sqlx::query_as::<_, AttendanceStats>(&sql).bind(user_id);
        if let Some(m) = month {
            query = query.bind(m);
        }
        if let Some(y) = year {
            query = query.bind(y);
        }

        Ok(query.fetch_one(&self.pool).await?)
    }

    /// Per-status breakdown for one day plus the day's rows. The
    /// `not_checked_in` count cross-references the full employee roster
    /// so users without any row are included.
    pub async fn attendance_summary(
        &self,
        date: NaiveDate,
    ) -> Result<(AttendanceSummary, Vec<Attendance>), AttendanceError> {
        let records = sqlx::query_as::<_, Attendance>(&format!(
            "{SELECT_COLS} WHERE date = ? ORDER BY check_in"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        let roster_total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;

        Ok((summarize(&records, roster_total), records))
    }

    /// Explicit administrative delete, the only way a row leaves the table.
    pub async fn delete_attendance(&self, id: u64) -> Result<(), AttendanceError> {
        let res = sqlx::query("DELETE FROM attendances WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(AttendanceError::NotFound);
        }
        Ok(())
    }

    async fn fetch_by_id(&self, id: u64) -> Result<Attendance, AttendanceError> {
        sqlx::query_as::<_, Attendance>(&format!("{SELECT_COLS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AttendanceError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(date: &str, h: u32, m: u32, s: u32) -> NaiveDateTime {
        date.parse::<NaiveDate>()
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn record(id: u64, date: &str, status: AttendanceStatus) -> Attendance {
        let date: NaiveDate = date.parse().unwrap();
        Attendance {
            id,
            user_id: id,
            date,
            check_in: date.and_hms_opt(8, 0, 0).unwrap(),
            check_out: None,
            status,
            notes: None,
        }
    }

    #[test]
    fn summary_counts_each_status_and_the_missing() {
        let rows = vec![
            record(1, "2025-06-02", AttendanceStatus::Present),
            record(2, "2025-06-02", AttendanceStatus::Present),
            record(3, "2025-06-02", AttendanceStatus::Present),
            record(4, "2025-06-02", AttendanceStatus::Late),
            record(5, "2025-06-02", AttendanceStatus::Absent),
        ];

        let summary = summarize(&rows, 10);
        assert_eq!(summary.total_records, 5);
        assert_eq!(summary.present, 3);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.absent, 1);
        assert_eq!(summary.not_checked_in, 5);
    }

    #[test]
    fn summary_of_empty_day_is_all_roster() {
        let summary = summarize(&[], 8);
        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.not_checked_in, 8);
    }

    #[test]
    fn summary_never_reports_negative_missing() {
        let rows = vec![record(1, "2025-06-02", AttendanceStatus::Present)];
        assert_eq!(summarize(&rows, 0).not_checked_in, 0);
    }

    #[test]
    fn default_period_runs_from_first_of_month() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 18).unwrap();
        let (start, end) = month_to_date(today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(end, today);
    }

    #[test]
    fn default_period_handles_month_edges() {
        let first = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(month_to_date(first), (first, first));

        let leap_day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, end) = month_to_date(leap_day);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, leap_day);
    }

    #[test]
    fn check_out_without_a_record_reports_no_check_in() {
        let now = at("2025-06-02", 17, 0, 0);
        assert!(matches!(
            ready_for_check_out(None, now),
            Err(AttendanceError::NoCheckInFound)
        ));
    }

    #[test]
    fn check_out_against_an_absent_row_reports_no_check_in() {
        // Absence marking is terminal; the check-in/out flow never
        // applies to it.
        let mut absent = record(1, "2025-06-02", AttendanceStatus::Absent);
        absent.check_in = at("2025-06-02", 0, 0, 0);

        let now = at("2025-06-02", 17, 0, 0);
        assert!(matches!(
            ready_for_check_out(Some(absent), now),
            Err(AttendanceError::NoCheckInFound)
        ));
    }

    #[test]
    fn first_check_out_succeeds_second_reports_already_checked_out() {
        let open = record(1, "2025-06-02", AttendanceStatus::Present);
        let now = at("2025-06-02", 17, 0, 0);

        let accepted = ready_for_check_out(Some(open), now).unwrap();
        assert_eq!(accepted.id, 1);

        let mut closed = record(1, "2025-06-02", AttendanceStatus::Present);
        closed.check_out = Some(now);
        assert!(matches!(
            ready_for_check_out(Some(closed), at("2025-06-02", 18, 0, 0)),
            Err(AttendanceError::AlreadyCheckedOut)
        ));
    }

    #[test]
    fn check_out_must_be_after_check_in() {
        let open = record(1, "2025-06-02", AttendanceStatus::Present);

        // Exactly at the check-in instant is rejected too.
        assert!(matches!(
            ready_for_check_out(Some(open), at("2025-06-02", 8, 0, 0)),
            Err(AttendanceError::Validation(_))
        ));

        let open = record(1, "2025-06-02", AttendanceStatus::Present);
        assert!(matches!(
            ready_for_check_out(Some(open), at("2025-06-02", 7, 59, 0)),
            Err(AttendanceError::Validation(_))
        ));
    }

    #[test]
    fn late_rows_check_out_like_present_ones() {
        let open = record(3, "2025-06-02", AttendanceStatus::Late);
        let accepted = ready_for_check_out(Some(open), at("2025-06-02", 17, 0, 0)).unwrap();
        assert_eq!(accepted.status, AttendanceStatus::Late);
    }

    #[test]
    fn absent_rows_carry_a_midnight_check_in() {
        // Shape check for the synthetic timestamp used by mark_absent.
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let midnight: NaiveDateTime = date.and_time(NaiveTime::MIN);
        assert_eq!(midnight.to_string(), "2025-06-02 00:00:00");
    }
}
