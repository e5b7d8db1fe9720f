use derive_more::Display;

/// Failure modes of the attendance service.
///
/// The first five are expected, caller-recoverable domain conditions and
/// map to 4xx at the HTTP layer. `Storage` is the generic fault path.
#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn,

    #[display(fmt = "Already checked out today")]
    AlreadyCheckedOut,

    #[display(fmt = "No check-in record found for today")]
    NoCheckInFound,

    #[display(fmt = "Attendance record already exists for this date")]
    DuplicateRecord,

    #[display(fmt = "Record not found")]
    NotFound,

    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "storage error: {}", _0)]
    Storage(sqlx::Error),
}

impl std::error::Error for AttendanceError {}

impl From<sqlx::Error> for AttendanceError {
    fn from(e: sqlx::Error) -> Self {
        AttendanceError::Storage(e)
    }
}

/// MySQL signals unique-index violations with SQLSTATE 23000. The unique
/// index over (user_id, date) turns duplicate check-ins into this error.
pub fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

/// Collapse an INSERT failure into the caller's duplicate signal when the
/// unique index rejected the row; anything else is a storage fault.
pub fn map_duplicate(e: sqlx::Error, duplicate: AttendanceError) -> AttendanceError {
    if is_duplicate_key(&e) {
        duplicate
    } else {
        AttendanceError::Storage(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct StubDbError {
        code: &'static str,
    }

    impl fmt::Display for StubDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "SQLSTATE {}", self.code)
        }
    }

    impl StdError for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "stub database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(self.code.into())
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn db_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(StubDbError { code }))
    }

    #[test]
    fn domain_errors_render_user_facing_messages() {
        assert_eq!(
            AttendanceError::AlreadyCheckedIn.to_string(),
            "Already checked in today"
        );
        assert_eq!(
            AttendanceError::NoCheckInFound.to_string(),
            "No check-in record found for today"
        );
        assert_eq!(
            AttendanceError::Validation("User ID and date are required".into()).to_string(),
            "User ID and date are required"
        );
    }

    #[test]
    fn unique_violation_is_a_duplicate_key() {
        assert!(is_duplicate_key(&db_error("23000")));
        assert!(!is_duplicate_key(&db_error("42S02")));
        assert!(!is_duplicate_key(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn second_check_in_collapses_to_already_checked_in() {
        // A check-in racing an existing row for the same (user, date) —
        // including one created by mark-absent — loses on the unique
        // index and must surface as the domain error.
        let mapped = map_duplicate(db_error("23000"), AttendanceError::AlreadyCheckedIn);
        assert!(matches!(mapped, AttendanceError::AlreadyCheckedIn));
    }

    #[test]
    fn duplicate_absence_marking_collapses_to_duplicate_record() {
        let mapped = map_duplicate(db_error("23000"), AttendanceError::DuplicateRecord);
        assert!(matches!(mapped, AttendanceError::DuplicateRecord));
    }

    #[test]
    fn non_duplicate_insert_failures_stay_on_the_fault_path() {
        let mapped = map_duplicate(db_error("40001"), AttendanceError::AlreadyCheckedIn);
        assert!(matches!(mapped, AttendanceError::Storage(_)));
    }
}
