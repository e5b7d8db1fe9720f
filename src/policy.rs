use chrono::{NaiveDateTime, NaiveTime, Timelike};

use crate::model::attendance::AttendanceStatus;

/// Work-schedule policy used to classify check-ins.
///
/// Built once from configuration and handed to the attendance service;
/// there is no global default that tests or deployments could mutate.
#[derive(Debug, Clone, Copy)]
pub struct TimePolicy {
    pub work_start: NaiveTime,
    pub late_threshold_minutes: u32,
    /// Nominal end of the workday. Informational only, nothing enforces it.
    pub work_end: NaiveTime,
}

impl Default for TimePolicy {
    fn default() -> Self {
        Self {
            work_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            late_threshold_minutes: 15,
            work_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        }
    }
}

impl TimePolicy {
    /// Classify a check-in instant as `present` or `late`.
    ///
    /// Only the time-of-day is inspected; the caller is responsible for
    /// the instant falling on the intended attendance date. A check-in at
    /// exactly `work_start + late_threshold_minutes` is still `present`.
    pub fn classify(&self, check_in: NaiveDateTime) -> AttendanceStatus {
        let cutoff =
            self.work_start.num_seconds_from_midnight() + self.late_threshold_minutes * 60;

        if check_in.time().num_seconds_from_midnight() <= cutoff {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Late
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn on_time_is_present() {
        let policy = TimePolicy::default();
        assert_eq!(policy.classify(at(7, 30, 0)), AttendanceStatus::Present);
        assert_eq!(policy.classify(at(8, 0, 0)), AttendanceStatus::Present);
        assert_eq!(policy.classify(at(8, 14, 59)), AttendanceStatus::Present);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let policy = TimePolicy::default();
        assert_eq!(policy.classify(at(8, 15, 0)), AttendanceStatus::Present);
        assert_eq!(policy.classify(at(8, 15, 1)), AttendanceStatus::Late);
    }

    #[test]
    fn after_grace_period_is_late() {
        let policy = TimePolicy::default();
        assert_eq!(policy.classify(at(8, 16, 0)), AttendanceStatus::Late);
        assert_eq!(policy.classify(at(12, 0, 0)), AttendanceStatus::Late);
    }

    #[test]
    fn custom_policy_shifts_the_cutoff() {
        let policy = TimePolicy {
            work_start: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            late_threshold_minutes: 5,
            work_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        };
        assert_eq!(policy.classify(at(9, 35, 0)), AttendanceStatus::Present);
        assert_eq!(policy.classify(at(9, 35, 1)), AttendanceStatus::Late);
    }

    #[test]
    fn date_component_is_ignored() {
        let policy = TimePolicy::default();
        let other_day = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(8, 10, 0)
            .unwrap();
        assert_eq!(policy.classify(other_day), AttendanceStatus::Present);
    }
}
