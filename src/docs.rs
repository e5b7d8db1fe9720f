use crate::api::attendance::{HistoryQuery, MarkAbsentReq, StatsQuery, WorkConfigResponse};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::user::User;
use crate::service::attendance::{AttendanceStats, AttendanceSummary};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{openapi, Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance HRM API",
        version = "1.0.0",
        description = r#"
## Employee Attendance & HR-Record System

This API powers an employee attendance system with late-arrival
classification and monthly statistics.

### 🔹 Key Features
- **Attendance Tracking**
  - Daily check-in/check-out with present/late classification against a
    configurable work schedule
  - Administrative absence marking, daily summaries and monthly stats
- **Employee Management**
  - Create, update, list, and view employee profiles

### 🔐 Security
Endpoints are protected using **JWT Bearer authentication**. Roster-wide
queries and absence marking require the **Admin** role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::stats,
        crate::api::attendance::work_config,
        crate::api::attendance::all_attendance,
        crate::api::attendance::mark_absent,
        crate::api::attendance::summary,
        crate::api::attendance::delete_attendance,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::my_profile,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            Attendance,
            AttendanceStatus,
            AttendanceStats,
            AttendanceSummary,
            WorkConfigResponse,
            HistoryQuery,
            StatsQuery,
            MarkAbsentReq,
            Employee,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            User
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Employee", description = "Employee management APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
