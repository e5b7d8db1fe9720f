pub mod attendance;
pub mod error;

pub use attendance::AttendanceService;
pub use error::AttendanceError;
