use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::AppState;

/// Static taxonomies backing the client's filter pickers. Listing filters do
/// not validate against these; unknown values simply match nothing.
const CITIES: [&str; 10] = [
    "Mumbai",
    "Delhi",
    "Bangalore",
    "Hyderabad",
    "Chennai",
    "Pune",
    "Kolkata",
    "Ahmedabad",
    "Jaipur",
    "Chandigarh",
];

const SPECIALITIES: [&str; 10] = [
    "General Physician",
    "Cardiologist",
    "Dermatologist",
    "Pediatrician",
    "Orthopedic",
    "Gynecologist",
    "Neurologist",
    "Psychiatrist",
    "ENT Specialist",
    "Ophthalmologist",
];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cities", get(get_cities))
        .route("/specialities", get(get_specialities))
}

pub async fn get_cities() -> Json<Value> {
    Json(json!({ "cities": CITIES }))
}

pub async fn get_specialities() -> Json<Value> {
    Json(json!({ "specialities": SPECIALITIES }))
}
