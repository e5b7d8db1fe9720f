use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public view of a user row. The password hash never leaves the auth layer.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct User {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = 2)]
    pub role_id: u8,

    #[schema(example = "2024-01-01T09:00:00", value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
