use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use sqlx::{Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    errors::{AppError, Result},
    models::{CreateDoctorRequest, CreateDoctorResponse, Doctor, DoctorFilters, DoctorListResponse},
    AppState,
};

const DOCTOR_COLUMNS: &str = "id, name, gender, age, email, phone, city, institute_name, \
     degree_name, speciality, yoe, consultation_fee, profile_picture, search_count";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_doctors).post(create_doctor))
        .route("/top", get(top_doctors))
        .route("/:id", get(get_doctor))
}

/// Coerce a raw query value to a positive integer, falling back to `default`
/// when missing, non-numeric, or non-positive.
fn coerce_positive(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

/// Split repeated and comma-delimited values into one trimmed, non-empty list.
fn parse_list_values(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Parse the raw listing query string into normalized filters.
///
/// City and speciality accept both a singular and plural key, each as
/// repeated parameters or comma lists; the singular key wins when both are
/// present. Page defaults to 1 and limit to 10 whenever the supplied value
/// does not coerce to a positive integer.
fn parse_filter_params(query: &str) -> DoctorFilters {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
        params.entry(k.into_owned()).or_default().push(v.into_owned());
    }

    let get_list = |primary: &str, alias: &str| -> Vec<String> {
        params
            .get(primary)
            .or_else(|| params.get(alias))
            .map(|values| parse_list_values(values))
            .unwrap_or_default()
    };

    let last = |key: &str| params.get(key).and_then(|v| v.last());

    let search = last("search")
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty());

    DoctorFilters {
        search,
        cities: get_list("city", "cities"),
        specialities: get_list("speciality", "specialities"),
        page: coerce_positive(last("page").map(String::as_str), 1),
        limit: coerce_positive(last("limit").map(String::as_str), 10),
    }
}

/// Push the conjunctive filter predicate onto a builder whose SQL already
/// ends in `WHERE 1=1`. Both the count and the page query go through here so
/// they observe the same predicate.
fn push_filter_conditions<'a>(
    query_builder: &mut QueryBuilder<'a, Postgres>,
    filters: &DoctorFilters,
) {
    if let Some(search) = &filters.search {
        query_builder.push(" AND name LIKE ");
        query_builder.push_bind(format!("%{}%", search));
    }

    if !filters.cities.is_empty() {
        query_builder.push(" AND city = ANY(");
        query_builder.push_bind(filters.cities.clone());
        query_builder.push(")");
    }

    if !filters.specialities.is_empty() {
        query_builder.push(" AND speciality = ANY(");
        query_builder.push_bind(filters.specialities.clone());
        query_builder.push(")");
    }
}

fn has_more(offset: i64, returned: usize, total: i64) -> bool {
    offset + (returned as i64) < total
}

/// GET /api/doctors - Filtered, paginated doctor listing
///
/// Parameters:
/// - search: substring match on the doctor's name
/// - city / cities: one or more city names (repeated or comma-delimited)
/// - speciality / specialities: same shape as cities
/// - page: 1-based page number (default 1)
/// - limit: page size (default 10)
///
/// Returns `{doctors, total, page, limit, hasMore}`. The total counts every
/// match regardless of pagination; count and page run as two statements
/// against the same predicate, so a concurrent insert between them can skew
/// hasMore by one. That is accepted behavior.
pub async fn list_doctors(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> Result<Json<DoctorListResponse>> {
    let filters = parse_filter_params(request.uri().query().unwrap_or(""));

    tracing::debug!(
        "doctor search: search={:?}, cities={:?}, specialities={:?}, page={}, limit={}",
        filters.search,
        filters.cities,
        filters.specialities,
        filters.page,
        filters.limit
    );

    let mut count_builder =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM doctors WHERE 1=1");
    push_filter_conditions(&mut count_builder, &filters);

    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(&state.db)
        .await?;

    let mut page_builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM doctors WHERE 1=1",
        DOCTOR_COLUMNS
    ));
    push_filter_conditions(&mut page_builder, &filters);
    page_builder.push(" ORDER BY id ASC LIMIT ");
    page_builder.push_bind(filters.limit);
    page_builder.push(" OFFSET ");
    page_builder.push_bind(filters.offset());

    let doctors: Vec<Doctor> = page_builder
        .build_query_as()
        .fetch_all(&state.db)
        .await?;

    let has_more = has_more(filters.offset(), doctors.len(), total);

    Ok(Json(DoctorListResponse {
        doctors,
        total,
        page: filters.page,
        limit: filters.limit,
        has_more,
    }))
}

/// POST /api/doctors - Register a new doctor
pub async fn create_doctor(
    State(state): State<AppState>,
    Json(payload): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<CreateDoctorResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Validation error: {}", e)))?;

    let doctor_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO doctors
        (name, gender, age, email, phone, city, institute_name, degree_name, speciality, yoe, consultation_fee, profile_picture)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.gender)
    .bind(payload.age)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.city)
    .bind(&payload.institute_name)
    .bind(&payload.degree_name)
    .bind(&payload.speciality)
    .bind(payload.yoe)
    .bind(payload.consultation_fee)
    .bind(&payload.profile_picture)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert doctor: {}", e);
        AppError::DatabaseError("Failed to create doctor".to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateDoctorResponse {
            message: "Doctor created successfully".to_string(),
            doctor_id,
        }),
    ))
}

/// GET /api/doctors/top - Most-viewed doctors
///
/// Returns up to `limit` rows ordered by search_count descending (default 4;
/// missing, non-numeric, or non-positive values fall back). Tie order is
/// whatever the store yields.
pub async fn top_doctors(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Doctor>>> {
    let limit = coerce_positive(params.get("limit").map(String::as_str), 4);

    let doctors = sqlx::query_as::<_, Doctor>(&format!(
        "SELECT {} FROM doctors ORDER BY search_count DESC LIMIT $1",
        DOCTOR_COLUMNS
    ))
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(doctors))
}

/// GET /api/doctors/:id - Doctor detail, counting the view
///
/// The popularity counter is bumped with a single in-store increment so
/// concurrent views never lose updates; the RETURNING clause hands back the
/// row as of that statement. Zero rows updated means the id does not exist,
/// which is the not-found path rather than an error.
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Doctor>> {
    let doctor = sqlx::query_as::<_, Doctor>(&format!(
        "UPDATE doctors SET search_count = search_count + 1 WHERE id = $1 RETURNING {}",
        DOCTOR_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&state.db)
    .await?;

    match doctor {
        Some(doctor) => Ok(Json(doctor)),
        None => Err(AppError::NotFound("Doctor not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_query_is_empty() {
        let filters = parse_filter_params("");
        assert_eq!(filters.search, None);
        assert!(filters.cities.is_empty());
        assert!(filters.specialities.is_empty());
        assert_eq!(filters.page, 1);
        assert_eq!(filters.limit, 10);
    }

    #[test]
    fn zero_negative_and_garbage_pages_fall_back_to_one() {
        for query in ["page=0", "page=-5", "page=abc", "page="] {
            let filters = parse_filter_params(query);
            assert_eq!(filters.page, 1, "query {:?}", query);
        }
    }

    #[test]
    fn limit_follows_the_same_fallback_rule() {
        for query in ["limit=0", "limit=-3", "limit=ten", "limit="] {
            let filters = parse_filter_params(query);
            assert_eq!(filters.limit, 10, "query {:?}", query);
        }
        assert_eq!(parse_filter_params("limit=25").limit, 25);
    }

    #[test]
    fn repeated_keys_and_comma_lists_both_parse() {
        let filters = parse_filter_params("city=Mumbai&city=Pune");
        assert_eq!(filters.cities, vec!["Mumbai", "Pune"]);

        let filters = parse_filter_params("city=Mumbai,Pune,%20Delhi%20");
        assert_eq!(filters.cities, vec!["Mumbai", "Pune", "Delhi"]);
    }

    #[test]
    fn blank_list_entries_are_dropped() {
        let filters = parse_filter_params("speciality=Cardiologist,,%20");
        assert_eq!(filters.specialities, vec!["Cardiologist"]);
    }

    #[test]
    fn singular_key_wins_over_plural_alias() {
        let filters = parse_filter_params("city=Mumbai&cities=Delhi");
        assert_eq!(filters.cities, vec!["Mumbai"]);

        let filters = parse_filter_params("cities=Delhi,Jaipur");
        assert_eq!(filters.cities, vec!["Delhi", "Jaipur"]);
    }

    #[test]
    fn empty_search_means_no_name_constraint() {
        assert_eq!(parse_filter_params("search=").search, None);
        assert_eq!(parse_filter_params("search=%20%20").search, None);
        assert_eq!(
            parse_filter_params("search=rao").search,
            Some("rao".to_string())
        );
    }

    #[test]
    fn no_filters_push_no_conditions() {
        let filters = parse_filter_params("");
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM doctors WHERE 1=1");
        push_filter_conditions(&mut qb, &filters);
        assert_eq!(qb.into_sql(), "SELECT COUNT(*) FROM doctors WHERE 1=1");
    }

    #[test]
    fn all_filters_compose_conjunctively() {
        let filters =
            parse_filter_params("search=rao&city=Mumbai,Pune&speciality=Cardiologist");
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM doctors WHERE 1=1");
        push_filter_conditions(&mut qb, &filters);
        assert_eq!(
            qb.into_sql(),
            "SELECT COUNT(*) FROM doctors WHERE 1=1 \
             AND name LIKE $1 AND city = ANY($2) AND speciality = ANY($3)"
        );
    }

    #[test]
    fn count_and_page_builders_share_the_predicate() {
        let filters = parse_filter_params("city=Mumbai");

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM doctors WHERE 1=1");
        push_filter_conditions(&mut count_qb, &filters);

        let mut page_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM doctors WHERE 1=1");
        push_filter_conditions(&mut page_qb, &filters);

        assert_eq!(count_qb.into_sql(), page_qb.into_sql());
    }

    #[test]
    fn has_more_matches_offset_arithmetic() {
        // 12 matches, limit 5: page 2 returns rows 6-10 with more remaining,
        // page 3 returns rows 11-12 and drains the set.
        assert!(has_more(5, 5, 12));
        assert!(!has_more(10, 2, 12));
        assert!(!has_more(0, 0, 0));
    }

    #[test]
    fn top_limit_coercion_defaults_to_four() {
        assert_eq!(coerce_positive(None, 4), 4);
        assert_eq!(coerce_positive(Some("abc"), 4), 4);
        assert_eq!(coerce_positive(Some("0"), 4), 4);
        assert_eq!(coerce_positive(Some("-2"), 4), 4);
        assert_eq!(coerce_positive(Some("7"), 4), 7);
    }
}
