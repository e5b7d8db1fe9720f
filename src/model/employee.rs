use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Employee row joined with the owning user's name and email.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "user_id": 7,
        "employee_code": "EMP-001",
        "position": "Backend Engineer",
        "department": "Engineering",
        "salary": 52000.0,
        "hire_date": "2024-01-01",
        "name": "John Doe",
        "email": "john.doe@company.com"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 7)]
    pub user_id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "Backend Engineer")]
    pub position: String,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = 52000.0)]
    pub salary: f64,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub hire_date: NaiveDate,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,
}
