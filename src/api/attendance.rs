use crate::auth::auth::AuthUser;
use crate::service::attendance::month_to_date;
use crate::service::{AttendanceError, AttendanceService};
use actix_web::{web, HttpResponse, Responder};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct HistoryQuery {
    #[schema(example = "2025-06-01", value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2025-06-18", value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatsQuery {
    #[schema(example = 6)]
    pub month: Option<u32>,
    #[schema(example = 2025)]
    pub year: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkAbsentReq {
    #[schema(example = 7)]
    pub user_id: Option<u64>,
    #[schema(example = "2025-06-02", value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    #[schema(example = "sick leave", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct WorkConfigResponse {
    #[schema(example = "08:00:00")]
    pub work_start_time: String,
    #[schema(example = 15)]
    pub late_threshold_minutes: u32,
    #[schema(example = "17:00:00")]
    pub work_end_time: String,
}

/// Map service failures to responses. Domain errors are expected caller
/// conditions; only storage faults hit the log and the 500 path.
fn error_response(err: AttendanceError) -> HttpResponse {
    match &err {
        AttendanceError::AlreadyCheckedIn
        | AttendanceError::AlreadyCheckedOut
        | AttendanceError::NoCheckInFound
        | AttendanceError::DuplicateRecord
        | AttendanceError::Validation(_) => HttpResponse::BadRequest().json(json!({
            "message": err.to_string()
        })),
        AttendanceError::NotFound => HttpResponse::NotFound().json(json!({
            "message": err.to_string()
        })),
        AttendanceError::Storage(e) => {
            error!(error = %e, "Attendance storage failure");
            HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }))
        }
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(auth: AuthUser, svc: web::Data<AttendanceService>) -> impl Responder {
    match svc.check_in(auth.user_id).await {
        Ok(record) => HttpResponse::Ok().json(json!({
            "message": "Checked in successfully",
            "attendance": record
        })),
        Err(e) => error_response(e),
    }
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No check-in record found for today / Already checked out today"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(auth: AuthUser, svc: web::Data<AttendanceService>) -> impl Responder {
    match svc.check_out(auth.user_id).await {
        Ok(record) => HttpResponse::Ok().json(json!({
            "message": "Checked out successfully",
            "attendance": record
        })),
        Err(e) => error_response(e),
    }
}

/// Today's attendance record, if any
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's record (null when none exists)"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, svc: web::Data<AttendanceService>) -> impl Responder {
    match svc.today_attendance(auth.user_id).await {
        Ok(record) => HttpResponse::Ok().json(json!({ "attendance": record })),
        Err(e) => error_response(e),
    }
}

/// Attendance history for the authenticated user
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(
        ("start_date" = Option<String>, Query, description = "Defaults to the first of the current month"),
        ("end_date" = Option<String>, Query, description = "Defaults to today")
    ),
    responses(
        (status = 200, description = "Records ordered most recent first"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    svc: web::Data<AttendanceService>,
    query: web::Query<HistoryQuery>,
) -> impl Responder {
    let (default_start, default_end) = month_to_date(Local::now().date_naive());
    let start = query.start_date.unwrap_or(default_start);
    let end = query.end_date.unwrap_or(default_end);

    match svc.user_attendance(auth.user_id, start, end).await {
        Ok(records) => {
            let total = records.len();
            HttpResponse::Ok().json(json!({
                "data": records,
                "period": { "start_date": start, "end_date": end },
                "total": total
            }))
        }
        Err(e) => error_response(e),
    }
}

/// Monthly stats for the authenticated user
#[utoipa::path(
    get,
    path = "/api/attendance/stats",
    params(
        ("month" = Option<u32>, Query, description = "Defaults to the current month"),
        ("year" = Option<i32>, Query, description = "Defaults to the current year")
    ),
    responses(
        (status = 200, description = "Counts by status", body = crate::service::attendance::AttendanceStats),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn stats(
    auth: AuthUser,
    svc: web::Data<AttendanceService>,
    query: web::Query<StatsQuery>,
) -> impl Responder {
    let now = Local::now().date_naive();
    let month = query.month.unwrap_or(now.month());
    let year = query.year.unwrap_or(now.year());

    match svc
        .attendance_stats(auth.user_id, Some(month), Some(year))
        .await
    {
        Ok(stats) => HttpResponse::Ok().json(json!({
            "stats": stats,
            "period": { "month": month, "year": year }
        })),
        Err(e) => error_response(e),
    }
}

/// Active work-schedule configuration
#[utoipa::path(
    get,
    path = "/api/attendance/config",
    responses(
        (status = 200, description = "Work schedule", body = WorkConfigResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn work_config(svc: web::Data<AttendanceService>) -> impl Responder {
    let policy = svc.policy();
    HttpResponse::Ok().json(WorkConfigResponse {
        work_start_time: policy.work_start.to_string(),
        late_threshold_minutes: policy.late_threshold_minutes,
        work_end_time: policy.work_end.to_string(),
    })
}

/// All users' attendance for a date range (admin)
#[utoipa::path(
    get,
    path = "/api/attendance/all",
    params(
        ("start_date" = Option<String>, Query, description = "Defaults to the first of the current month"),
        ("end_date" = Option<String>, Query, description = "Defaults to today")
    ),
    responses(
        (status = 200, description = "Records ordered most recent first"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn all_attendance(
    auth: AuthUser,
    svc: web::Data<AttendanceService>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (default_start, default_end) = month_to_date(Local::now().date_naive());
    let start = query.start_date.unwrap_or(default_start);
    let end = query.end_date.unwrap_or(default_end);

    Ok(match svc.all_attendance(start, end).await {
        Ok(records) => {
            let total = records.len();
            HttpResponse::Ok().json(json!({
                "data": records,
                "period": { "start_date": start, "end_date": end },
                "total": total
            }))
        }
        Err(e) => error_response(e),
    })
}

/// Mark a user absent for a date (admin)
#[utoipa::path(
    post,
    path = "/api/attendance/mark-absent",
    request_body = MarkAbsentReq,
    responses(
        (status = 200, description = "Marked absent", body = Object, example = json!({
            "message": "Employee marked as absent"
        })),
        (status = 400, description = "Missing fields or record already exists"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_absent(
    auth: AuthUser,
    svc: web::Data<AttendanceService>,
    payload: web::Json<MarkAbsentReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (user_id, date) = match (payload.user_id, payload.date) {
        (Some(user_id), Some(date)) => (user_id, date),
        _ => {
            return Ok(error_response(AttendanceError::Validation(
                "User ID and date are required".to_string(),
            )))
        }
    };

    Ok(match svc.mark_absent(user_id, date, payload.reason.clone()).await {
        Ok(record) => HttpResponse::Ok().json(json!({
            "message": "Employee marked as absent",
            "attendance": record
        })),
        Err(e) => error_response(e),
    })
}

/// Today's per-status breakdown across the roster (admin)
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    responses(
        (status = 200, description = "Daily summary", body = crate::service::attendance::AttendanceSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn summary(
    auth: AuthUser,
    svc: web::Data<AttendanceService>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let today = Local::now().date_naive();

    Ok(match svc.attendance_summary(today).await {
        Ok((summary, records)) => HttpResponse::Ok().json(json!({
            "summary": summary,
            "date": today,
            "attendances": records
        })),
        Err(e) => error_response(e),
    })
}

/// Delete an attendance record (admin)
#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(
        ("id", Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Record not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    svc: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    Ok(match svc.delete_attendance(id).await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "message": "Successfully deleted"
        })),
        Err(e) => error_response(e),
    })
}
