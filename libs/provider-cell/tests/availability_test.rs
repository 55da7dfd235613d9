use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use provider_cell::models::{
    AvailabilityDayInput, DayOfWeek, ProviderError, UpsertAvailabilityRequest,
};
use provider_cell::services::availability::{parse_time_of_day, AvailabilityService};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

const TOKEN: &str = "test-token";

fn day(day_of_week: DayOfWeek, start: &str, end: &str) -> AvailabilityDayInput {
    AvailabilityDayInput {
        day_of_week,
        start_time: start.to_string(),
        end_time: end.to_string(),
        is_active: true,
    }
}

#[test]
fn time_parsing_accepts_both_store_and_api_forms() {
    assert!(parse_time_of_day("09:00:00").is_some());
    assert!(parse_time_of_day("09:00").is_some());
    assert_eq!(parse_time_of_day("09:00:00"), parse_time_of_day("09:00"));
    assert!(parse_time_of_day("9 am").is_none());
}

#[tokio::test]
async fn weekly_upsert_is_keyed_on_provider_and_day() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let provider_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/provider_availability"))
        .and(query_param("on_conflict", "provider_id,day_of_week"))
        .and(headers("Prefer", vec!["return=representation", "resolution=merge-duplicates"]))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::availability_response(
                &provider_id.to_string(),
                "Monday",
                "09:00:00",
                "17:00:00",
            )
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let request = UpsertAvailabilityRequest {
        days: vec![day(DayOfWeek::Monday, "09:00", "17:00")],
    };

    let rows = AvailabilityService::new(&config)
        .upsert_weekly(provider_id, request, TOKEN)
        .await
        .expect("upsert should succeed");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].day_of_week, DayOfWeek::Monday);
    assert_eq!(rows[0].start_time, "09:00:00");
}

#[tokio::test]
async fn inverted_window_is_rejected_before_any_write() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();

    let request = UpsertAvailabilityRequest {
        days: vec![day(DayOfWeek::Tuesday, "17:00", "09:00")],
    };

    let result = AvailabilityService::new(&config)
        .upsert_weekly(Uuid::new_v4(), request, TOKEN)
        .await;

    assert_matches!(result, Err(ProviderError::ValidationError(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_upsert_is_a_validation_error() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();

    let result = AvailabilityService::new(&config)
        .upsert_weekly(Uuid::new_v4(), UpsertAvailabilityRequest { days: vec![] }, TOKEN)
        .await;

    assert_matches!(result, Err(ProviderError::ValidationError(_)));
}

#[tokio::test]
async fn inactive_days_are_filtered_from_the_day_lookup() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let provider_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/provider_availability"))
        .and(query_param("provider_id", format!("eq.{}", provider_id)))
        .and(query_param("day_of_week", "eq.Sunday"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let window = AvailabilityService::new(&config)
        .get_active_for_day(provider_id, DayOfWeek::Sunday, TOKEN)
        .await
        .expect("lookup should succeed");

    assert!(window.is_none());
}
