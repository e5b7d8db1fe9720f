use crate::{
    auth::{auth::AuthUser, password::hash_password},
    model::{employee::Employee, role::Role},
    utils::{
        db_utils::{build_update_sql, execute_update},
        email_cache, email_filter,
    },
};
use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

const EMPLOYEE_COLS: &str = "SELECT e.id, e.user_id, e.employee_code, e.position, e.department, \
     e.salary, e.hire_date, u.name, u.email \
     FROM employees e JOIN users u ON e.user_id = u.id";

/// Columns the dynamic update endpoint may touch. The owning user row
/// (name, email, password) is managed through the auth endpoints.
const UPDATABLE_COLS: &[&str] = &["employee_code", "position", "department", "salary", "hire_date"];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john@email.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "changeme")]
    pub password: String,
    #[schema(example = "Backend Engineer")]
    pub position: String,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = 52000.0, nullable = true)]
    pub salary: Option<f64>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>, nullable = true)]
    pub hire_date: Option<NaiveDate>,
    #[schema(example = "EMP-001", nullable = true)]
    pub employee_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

/// Create Employee
///
/// Creates the user account and the employee record in one transaction.
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Employee),
        (status = 409, description = "Email already registered"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let email = payload.email.trim().to_lowercase();
    let hashed = hash_password(&payload.password);

    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, "Failed to begin transaction");
        ErrorInternalServerError("Database error")
    })?;

    let user_res = sqlx::query("INSERT INTO users (name, email, password, role_id) VALUES (?, ?, ?, ?)")
        .bind(&payload.name)
        .bind(&email)
        .bind(&hashed)
        .bind(Role::Employee as u8)
        .execute(&mut *tx)
        .await;

    let user_id = match user_res {
        Ok(res) => res.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Email already registered"
                    })));
                }
            }
            error!(error = %e, "Failed to create user for employee");
            return Err(ErrorInternalServerError("Database error"));
        }
    };

    let employee_code = payload
        .employee_code
        .clone()
        .unwrap_or_else(|| format!("EMP{}", Utc::now().timestamp_millis()));
    let hire_date = payload.hire_date.unwrap_or_else(|| Local::now().date_naive());

    let emp_res = sqlx::query(
        "INSERT INTO employees (user_id, employee_code, position, department, salary, hire_date) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&employee_code)
    .bind(&payload.position)
    .bind(&payload.department)
    .bind(payload.salary.unwrap_or(0.0))
    .bind(hire_date)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, user_id, "Failed to create employee record");
        ErrorInternalServerError("Database error")
    })?;

    let employee_id = emp_res.last_insert_id();

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit employee creation");
        ErrorInternalServerError("Database error")
    })?;

    email_filter::insert(&email);
    email_cache::mark_taken(&email).await;

    let employee = fetch_employee(pool.get_ref(), employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch created employee");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created successfully",
        "employee": employee
    })))
}

/// List Employees (paginated, filterable)
#[utoipa::path(
    get,
    path = "/api/employees",
    params(
        ("page",  Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("department", Query, description = "Filter by department"),
        ("search", Query, description = "Search by name, email or position")
    ),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(department) = &query.department {
        conditions.push("e.department = ?");
        bindings.push(department.clone());
    }

    if let Some(search) = &query.search {
        conditions.push("(u.name LIKE ? OR u.email LIKE ? OR e.position LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone());
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!(
        "SELECT COUNT(*) FROM employees e JOIN users u ON e.user_id = u.id {}",
        where_clause
    );
    debug!(sql = %count_sql, bindings = ?bindings, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "{} {} ORDER BY e.id DESC LIMIT ? OFFSET ?",
        EMPLOYEE_COLS, where_clause
    );
    debug!(sql = %data_sql, bindings = ?bindings, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>(&format!("{} WHERE e.id = ?", EMPLOYEE_COLS))
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Current user's employee profile
#[utoipa::path(
    get,
    path = "/api/employees/me",
    responses(
        (status = 200, description = "Employee profile", body = Employee),
        (status = 404, description = "Employee profile not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee = sqlx::query_as::<_, Employee>(&format!("{} WHERE e.user_id = ?", EMPLOYEE_COLS))
        .bind(auth.user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to fetch employee profile");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee profile not found"
        }))),
    }
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee updated successfully"),
        (status = 400, description = "Unknown or missing fields"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    let update = build_update_sql("employees", &body, UPDATABLE_COLS, "id", employee_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to update employee");
            ErrorInternalServerError("Database error")
        })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// Delete Employee
///
/// Removes the employee record together with its owning user account.
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    let owner = sqlx::query_as::<_, (u64, String)>(
        "SELECT e.user_id, u.email FROM employees e JOIN users u ON e.user_id = u.id WHERE e.id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to look up employee owner");
        ErrorInternalServerError("Database error")
    })?;

    let (user_id, email) = match owner {
        Some(o) => o,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Employee not found"
            })))
        }
    };

    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, "Failed to begin transaction");
        ErrorInternalServerError("Database error")
    })?;

    sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to delete employee");
            ErrorInternalServerError("Database error")
        })?;

    // Attendance history references the user row; clear it before the user.
    sqlx::query("DELETE FROM attendances WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to delete attendance history");
            ErrorInternalServerError("Database error")
        })?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to delete user");
            ErrorInternalServerError("Database error")
        })?;

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit employee deletion");
        ErrorInternalServerError("Database error")
    })?;

    email_filter::remove(&email);
    email_cache::invalidate(&email).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

async fn fetch_employee(pool: &MySqlPool, id: u64) -> Result<Employee, sqlx::Error> {
    sqlx::query_as::<_, Employee>(&format!("{} WHERE e.id = ?", EMPLOYEE_COLS))
        .bind(id)
        .fetch_one(pool)
        .await
}
