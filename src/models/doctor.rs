use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A row of the doctors table. `search_count` is the popularity counter,
/// incremented in-store on every detail fetch.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub gender: String,
    pub age: i32,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub institute_name: String,
    pub degree_name: String,
    pub speciality: String,
    pub yoe: i32,
    pub consultation_fee: Decimal,
    pub profile_picture: Option<String>,
    pub search_count: i32,
}

/// Registration payload. Everything except the profile picture is required;
/// the picture falls back to a client-side placeholder when absent.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDoctorRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "gender is required"))]
    pub gender: String,
    #[validate(range(min = 18, max = 120, message = "age must be between 18 and 120"))]
    pub age: i32,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "institute_name is required"))]
    pub institute_name: String,
    #[validate(length(min = 1, message = "degree_name is required"))]
    pub degree_name: String,
    #[validate(length(min = 1, message = "speciality is required"))]
    pub speciality: String,
    #[validate(range(min = 0, max = 80, message = "yoe must be between 0 and 80"))]
    pub yoe: i32,
    pub consultation_fee: Decimal,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateDoctorResponse {
    pub message: String,
    #[serde(rename = "doctorId")]
    pub doctor_id: i64,
}

/// Normalized listing filters. All constraints compose conjunctively;
/// an absent filter constrains nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorFilters {
    pub search: Option<String>,
    pub cities: Vec<String>,
    pub specialities: Vec<String>,
    /// 1-based page number, already coerced positive.
    pub page: i64,
    pub limit: i64,
}

impl DoctorFilters {
    pub fn offset(&self) -> i64 {
        // Saturate so an absurd but numerically valid page cannot overflow;
        // a huge offset just yields an empty page.
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Serialize)]
pub struct DoctorListResponse {
    pub doctors: Vec<Doctor>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}
