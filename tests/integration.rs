//! Integration tests for the attendance API.
//!
//! This suite drives the full router over in-memory stores and covers:
//! - Check-in/check-out lifecycle and geofence validation
//! - The monthly meal-allowance claim workflow
//! - History, CSV export and dashboards
//! - Role checks, error envelopes and the audit trail

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use uuid::Uuid;

use attendance_engine::api::{AppState, Stores, USER_ID_HEADER, USER_ROLE_HEADER, create_router};
use attendance_engine::audit::AuditLogger;
use attendance_engine::config::ConfigLoader;
use attendance_engine::storage::{FixedClock, MemoryAuditSink, MemoryPhotoStore, MemoryStore};

// =============================================================================
// Test Helpers
// =============================================================================

const BOUNDARY: &str = "attendance-test-boundary";

const HEAD_OFFICE: (f64, f64) = (-6.2249, 106.8093);
const FAR_AWAY: (f64, f64) = (-6.3000, 106.9000);

/// Local Jakarta time in 2025 as UTC.
fn jakarta(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    FixedOffset::east_opt(7 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, month, day, hour, minute, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal serialized as string")).unwrap()
}

#[derive(Clone, Copy)]
struct Identity {
    id: Uuid,
    role: &'static str,
}

struct Harness {
    router: Router,
    clock: Arc<FixedClock>,
    sink: Arc<MemoryAuditSink>,
    worker: JoinHandle<()>,
    admin: Identity,
    ani: Identity,
    budi: Identity,
}

impl Harness {
    /// Default configuration, seeded users and locations; Monday 2 June 2025, 08:45.
    fn new() -> Self {
        let config = ConfigLoader::load("./config/default").expect("Failed to load config");
        let store = Arc::new(MemoryStore::new());
        for user in config.seed_users() {
            store.add_user(user.clone()).unwrap();
        }
        let find = |email: &str| {
            config
                .seed_users()
                .iter()
                .find(|u| u.email == email)
                .map(|u| u.id)
                .unwrap()
        };
        let admin = Identity {
            id: find("admin@example.com"),
            role: "admin",
        };
        let ani = Identity {
            id: find("ani@example.com"),
            role: "employee",
        };
        let budi = Identity {
            id: find("budi@example.com"),
            role: "employee",
        };

        let clock = Arc::new(FixedClock::new(jakarta(6, 2, 8, 45)));
        let sink = Arc::new(MemoryAuditSink::new());
        let (audit, worker) = AuditLogger::spawn(sink.clone(), 256);

        let seeds = config.seed_locations().to_vec();
        let state = AppState::new(
            config,
            Stores::memory(store, Arc::new(MemoryPhotoStore::new())),
            clock.clone(),
            audit,
        );
        state.locations().seed(&seeds).unwrap();

        Self {
            router: create_router(state),
            clock,
            sink,
            worker,
            admin,
            ani,
            budi,
        }
    }

    async fn raw(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body.to_vec())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.raw(request).await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        (status, json)
    }

    async fn get(&self, who: Identity, uri: &str) -> (StatusCode, Value) {
        self.send(request("GET", uri, Some(who)).body(Body::empty()).unwrap())
            .await
    }

    async fn json(&self, method: &str, who: Identity, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            request(method, uri, Some(who))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn check_in(&self, who: Identity, at: (f64, f64), photo: Option<&str>) -> (StatusCode, Value) {
        let body = multipart(
            &[
                ("latitude", at.0.to_string()),
                ("longitude", at.1.to_string()),
                ("notes", "on site".to_string()),
            ],
            photo,
        );
        self.send(
            request("POST", "/attendance/check-in", Some(who))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn check_out(&self, who: Identity) -> (StatusCode, Value) {
        self.send(
            request("POST", "/attendance/check-out", Some(who))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// One valid day for `who` on the given June date, 08:45-17:00.
    async fn full_day(&self, who: Identity, day: u32) {
        self.clock.set(jakarta(6, day, 8, 45));
        let (status, _) = self.check_in(who, HEAD_OFFICE, Some("face.jpg")).await;
        assert_eq!(status, StatusCode::OK);
        self.clock.set(jakarta(6, day, 17, 0));
        let (status, _) = self.check_out(who).await;
        assert_eq!(status, StatusCode::OK);
    }
}

fn request(method: &str, uri: &str, who: Option<Identity>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(who) = who {
        builder = builder
            .header(USER_ID_HEADER, who.id.to_string())
            .header(USER_ROLE_HEADER, who.role)
            .header(header::USER_AGENT, "integration-test");
    }
    builder
}

fn multipart(fields: &[(&str, String)], photo: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(file_name) = photo {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

// =============================================================================
// Attendance lifecycle
// =============================================================================

#[tokio::test]
async fn test_end_to_end_check_in_check_out_and_claim() {
    let h = Harness::new();

    let (status, body) = h.check_in(h.ani, HEAD_OFFICE, Some("face.jpg")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["is_valid"], true);
    assert_eq!(body["data"]["address"], "Jl. Jend. Sudirman Kav. 52-53, Jakarta");

    let (_, today) = h.get(h.ani, "/attendance/today").await;
    assert_eq!(today["data"]["checked_in"], true);
    assert_eq!(today["data"]["is_late"], false);

    h.clock.set(jakarta(6, 2, 17, 0));
    let (status, _) = h.check_out(h.ani).await;
    assert_eq!(status, StatusCode::OK);

    let (_, today) = h.get(h.ani, "/attendance/today").await;
    assert_eq!(today["data"]["checked_out"], true);
    assert_eq!(decimal(&today["data"]["working_hours"]), Decimal::new(825, 2));

    h.clock.set(jakarta(6, 30, 12, 0));
    let (status, preview) = h.get(h.ani, "/meal-allowance/preview?month=6&year=2025").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["data"]["total_days"], 1);
    assert_eq!(preview["data"]["valid_days"], 1);
    assert_eq!(decimal(&preview["data"]["total_amount"]), Decimal::from(15000));
    assert_eq!(preview["data"]["can_claim"], true);

    let (status, claim) = h
        .json("POST", h.ani, "/meal-allowance/claim", json!({"month": 6, "year": 2025}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(claim["data"]["status"], "pending");
    assert_eq!(decimal(&claim["data"]["total_amount"]), Decimal::from(15000));
    let claim_id = claim["data"]["id"].as_str().unwrap().to_string();

    let (status, approved) = h
        .json("PUT", h.admin, &format!("/meal-allowance/{}/approve", claim_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["data"]["status"], "approved");
    assert_eq!(approved["data"]["approved_by"], h.admin.id.to_string());

    let (status, claimed) = h
        .json("PUT", h.admin, &format!("/meal-allowance/{}/claimed", claim_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claimed["data"]["status"], "claimed");
}

#[tokio::test]
async fn test_second_check_in_same_day_conflicts() {
    let h = Harness::new();
    let (status, _) = h.check_in(h.ani, HEAD_OFFICE, Some("face.jpg")).await;
    assert_eq!(status, StatusCode::OK);

    h.clock.set(jakarta(6, 2, 13, 0));
    let (status, body) = h.check_in(h.ani, HEAD_OFFICE, Some("face.jpg")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "ALREADY_CHECKED_IN");
}

#[tokio::test]
async fn test_check_out_without_open_check_in() {
    let h = Harness::new();
    let (status, body) = h.check_out(h.ani).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "NO_ACTIVE_CHECK_IN");

    h.full_day(h.ani, 3).await;
    let (status, _) = h.check_out(h.ani).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_check_in_outside_geofence_is_recorded_invalid() {
    let h = Harness::new();
    let (status, body) = h.check_in(h.budi, FAR_AWAY, Some("face.png")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_valid"], false);
    assert_eq!(body["message"], "Check-in recorded outside approved locations");
}

#[tokio::test]
async fn test_check_in_photo_rules() {
    let h = Harness::new();

    let (status, body) = h.check_in(h.ani, HEAD_OFFICE, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "PHOTO_REQUIRED");

    let (status, body) = h.check_in(h.ani, HEAD_OFFICE, Some("notes.pdf")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PHOTO_FORMAT");

    // rejected attempts leave the day open
    let (status, _) = h.check_in(h.ani, HEAD_OFFICE, Some("FACE.JPEG")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_check_in_rejects_out_of_range_coordinate() {
    let h = Harness::new();
    let (status, body) = h.check_in(h.ani, (95.0, 106.8), Some("face.jpg")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_COORDINATE");
}

#[tokio::test]
async fn test_admin_corrects_and_deletes_attendance() {
    let h = Harness::new();
    let (_, body) = h.check_in(h.ani, HEAD_OFFICE, Some("face.jpg")).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = h
        .json("PUT", h.ani, &format!("/attendance/{}", id), json!({"notes": "edited"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let check_out = jakarta(6, 2, 17, 30).to_rfc3339();
    let (status, body) = h
        .json(
            "PUT",
            h.admin,
            &format!("/attendance/{}", id),
            json!({"notes": "forgot to check out", "check_out_time": check_out}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notes"], "forgot to check out");

    let (status, _) = h
        .send(
            request("DELETE", &format!("/attendance/{}", id), Some(h.admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, today) = h.get(h.ani, "/attendance/today").await;
    assert_eq!(today["data"]["checked_in"], false);
}

// =============================================================================
// Meal allowance
// =============================================================================

#[tokio::test]
async fn test_rejected_claim_still_occupies_period() {
    let h = Harness::new();
    h.full_day(h.ani, 2).await;

    let (_, claim) = h
        .json("POST", h.ani, "/meal-allowance/claim", json!({"month": 6, "year": 2025}))
        .await;
    let claim_id = claim["data"]["id"].as_str().unwrap().to_string();

    let (status, rejected) = h
        .json(
            "PUT",
            h.admin,
            &format!("/meal-allowance/{}/reject", claim_id),
            json!({"reason": "missing receipts"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["data"]["rejection_reason"], "missing receipts");

    let (status, body) = h
        .json("POST", h.ani, "/meal-allowance/claim", json!({"month": 6, "year": 2025}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_CLAIMED");

    let (status, body) = h
        .json("PUT", h.admin, &format!("/meal-allowance/{}/approve", claim_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_PROCESSED");
}

#[tokio::test]
async fn test_mark_claimed_requires_approval() {
    let h = Harness::new();
    h.full_day(h.ani, 2).await;
    let (_, claim) = h
        .json("POST", h.ani, "/meal-allowance/claim", json!({"month": 6, "year": 2025}))
        .await;
    let claim_id = claim["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = h
        .json("PUT", h.admin, &format!("/meal-allowance/{}/claimed", claim_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "NOT_APPROVED");
}

#[tokio::test]
async fn test_claim_without_valid_days_is_rejected() {
    let h = Harness::new();
    let (status, body) = h
        .json("POST", h.budi, "/meal-allowance/claim", json!({"month": 6, "year": 2025}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "NO_ELIGIBLE_DAYS");
}

#[tokio::test]
async fn test_preview_rejects_out_of_range_period() {
    let h = Harness::new();
    let (status, body) = h.get(h.ani, "/meal-allowance/preview?month=13&year=2025").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PERIOD");

    let (status, _) = h.get(h.ani, "/meal-allowance/preview?month=6&year=2019").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_direct_approve_and_duplicate() {
    let h = Harness::new();
    let body = json!({"user_id": h.budi.id, "month": 5, "year": 2025, "amount": "250000"});

    let (status, created) = h.json("POST", h.admin, "/meal-allowance/direct-approve", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["status"], "claimed");
    assert_eq!(decimal(&created["data"]["total_amount"]), Decimal::from(250000));

    let (status, duplicate) = h.json("POST", h.admin, "/meal-allowance/direct-approve", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(duplicate["error"]["code"], "DUPLICATE_CLAIM");

    let (status, _) = h
        .json(
            "POST",
            h.admin,
            "/meal-allowance/direct-approve",
            json!({"user_id": h.budi.id, "month": 6, "year": 2025, "amount": "0"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_claim_listings_and_stats() {
    let h = Harness::new();
    h.full_day(h.ani, 2).await;
    h.full_day(h.budi, 3).await;
    for who in [h.ani, h.budi] {
        let (status, _) = h
            .json("POST", who, "/meal-allowance/claim", json!({"month": 6, "year": 2025}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, mine) = h.get(h.ani, "/meal-allowance/my").await;
    assert_eq!(mine["meta"]["total"], 1);
    assert_eq!(mine["data"][0]["user_id"], h.ani.id.to_string());

    let (_, all) = h.get(h.admin, "/meal-allowance/all?status=pending&limit=1").await;
    assert_eq!(all["meta"]["total"], 2);
    assert_eq!(all["meta"]["total_pages"], 2);
    assert_eq!(all["data"].as_array().unwrap().len(), 1);

    let (_, stats) = h.get(h.admin, "/meal-allowance/stats?month=6&year=2025").await;
    assert_eq!(stats["data"]["total_claims"], 2);
    assert_eq!(stats["data"]["pending_claims"], 2);

    let (status, report) = h.get(h.admin, "/meal-allowance/management?month=6&year=2025").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["data"]["summary"]["total_employees"], 2);
    assert_eq!(report["data"]["summary"]["claimed_count"], 2);
}

#[tokio::test]
async fn test_policy_update_changes_new_claims() {
    let h = Harness::new();
    let (status, policy) = h
        .json(
            "PUT",
            h.admin,
            "/meal-allowance/policy",
            json!({"amount_per_day": "20000", "min_working_hours": "8", "max_claims_per_month": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&policy["data"]["amount_per_day"]), Decimal::from(20000));

    h.full_day(h.ani, 2).await;
    let (_, preview) = h.get(h.ani, "/meal-allowance/preview?month=6&year=2025").await;
    assert_eq!(decimal(&preview["data"]["total_amount"]), Decimal::from(20000));

    let (status, body) = h
        .json(
            "PUT",
            h.admin,
            "/meal-allowance/policy",
            json!({"amount_per_day": "0", "min_working_hours": "8", "max_claims_per_month": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_POLICY");
}

// =============================================================================
// History, export and dashboards
// =============================================================================

#[tokio::test]
async fn test_history_is_scoped_and_paginated() {
    let h = Harness::new();
    for day in 2..=4 {
        h.full_day(h.ani, day).await;
    }
    h.full_day(h.budi, 2).await;

    let (_, own) = h.get(h.ani, &format!("/attendance/history?user_id={}", h.budi.id)).await;
    assert_eq!(own["meta"]["total"], 3);

    let (_, all) = h.get(h.admin, "/attendance/history?month=6&year=2025&limit=2&page=2").await;
    assert_eq!(all["meta"]["total"], 4);
    assert_eq!(all["meta"]["page"], 2);
    assert_eq!(all["data"].as_array().unwrap().len(), 2);
    assert!(all["data"][0]["user_name"].is_string());
}

#[tokio::test]
async fn test_history_export_is_csv() {
    let h = Harness::new();
    h.full_day(h.ani, 2).await;
    h.clock.set(jakarta(6, 3, 9, 30));
    h.check_in(h.ani, HEAD_OFFICE, Some("face.jpg")).await;

    let (status, headers, body) = h
        .raw(
            request("GET", "/attendance/history/export?month=6&year=2025", Some(h.ani))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
    assert!(
        headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("attendance_history_")
    );

    let csv = String::from_utf8(body).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "Name,Email,Date,Check In,Check Out,Working Hours,Status,Notes"
    );
    assert_eq!(lines.len(), 3);
    // newest first; the open record shows no check-out
    assert!(lines[1].contains("\"-\""));
    assert!(lines[1].contains("\"incomplete\""));
    assert!(lines[2].contains("\"8.25\""));
}

#[tokio::test]
async fn test_attendance_stats_for_month() {
    let h = Harness::new();
    h.full_day(h.ani, 2).await;
    h.clock.set(jakarta(6, 3, 9, 30));
    h.check_in(h.ani, HEAD_OFFICE, Some("face.jpg")).await;
    h.clock.set(jakarta(6, 3, 18, 0));
    h.check_out(h.ani).await;

    let (status, stats) = h.get(h.ani, "/attendance/stats?month=2025-06").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["total_days"], 2);
    assert_eq!(stats["data"]["present_days"], 1);
    assert_eq!(stats["data"]["late_days"], 1);
    assert_eq!(decimal(&stats["data"]["attendance_rate"]), Decimal::from(100));

    let (status, _) = h.get(h.ani, "/attendance/stats?month=June").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_months_beyond_the_calendar_are_bad_requests() {
    let h = Harness::new();

    for month in ["2147483647-12", "300000-06"] {
        let (status, body) = h.get(h.ani, &format!("/attendance/stats?month={}", month)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", month);
        assert_eq!(body["error"]["code"], "INVALID_PERIOD");

        let (status, body) = h.get(h.admin, &format!("/dashboard/monthly?month={}", month)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", month);
        assert_eq!(body["error"]["code"], "INVALID_PERIOD");
    }
}

#[tokio::test]
async fn test_dashboards() {
    let h = Harness::new();
    h.full_day(h.ani, 2).await;
    h.clock.set(jakarta(6, 2, 17, 5));

    let (status, daily) = h.get(h.admin, "/dashboard/today").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(daily["data"]["stats"]["total_employees"], 2);
    assert_eq!(daily["data"]["stats"]["present"], 1);
    assert_eq!(daily["data"]["stats"]["absent"], 1);

    let (_, dated) = h.get(h.admin, "/dashboard/date?date=2025-06-03").await;
    assert_eq!(dated["data"]["stats"]["present"], 0);

    let (_, monthly) = h.get(h.admin, "/dashboard/monthly?month=2025-06&search=ani").await;
    assert_eq!(monthly["data"]["working_days"], 21);
    assert_eq!(monthly["data"]["employees"]["total"], 1);

    let (status, overview) = h.get(h.admin, "/dashboard/admin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["data"]["present_today"], 1);

    let (status, mine) = h.get(h.ani, "/dashboard/employee").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["data"]["today"]["checked_out"], true);
    assert_eq!(mine["data"]["meal_allowance"]["attendance_count"], 1);
}

// =============================================================================
// Locations
// =============================================================================

#[tokio::test]
async fn test_location_administration() {
    let h = Harness::new();
    let body = json!({"name": "Surabaya Branch", "latitude": -7.2575, "longitude": 112.7521, "type": "branch"});

    let (status, _) = h.json("POST", h.ani, "/locations", body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = h.json("POST", h.admin, "/locations", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["radius"], 100);
    assert_eq!(created["data"]["created_by"], h.admin.id.to_string());
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (_, updated) = h
        .json("PUT", h.admin, &format!("/locations/{}", id), json!({"is_active": false}))
        .await;
    assert_eq!(updated["data"]["is_active"], false);

    let (_, active) = h.get(h.ani, "/locations?is_active=true").await;
    assert_eq!(active["meta"]["total"], 2);

    let (status, _) = h
        .send(
            request("DELETE", &format!("/locations/{}", id), Some(h.admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h.get(h.ani, &format!("/locations/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "LOCATION_NOT_FOUND");
}

#[tokio::test]
async fn test_nearby_and_validate() {
    let h = Harness::new();

    let (status, nearby) = h
        .get(h.ani, "/locations/nearby?latitude=-6.2249&longitude=106.8093")
        .await;
    assert_eq!(status, StatusCode::OK);
    let nearby = nearby["data"].as_array().unwrap();
    assert_eq!(nearby.len(), 2);
    assert_eq!(nearby[0]["name"], "Head Office");
    assert_eq!(nearby[0]["is_within_geofence"], true);
    assert_eq!(nearby[1]["is_within_radius"], false);

    let (status, valid) = h
        .json(
            "POST",
            h.ani,
            "/locations/validate",
            json!({"latitude": HEAD_OFFICE.0, "longitude": HEAD_OFFICE.1}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(valid["data"]["is_valid"], true);

    let (_, invalid) = h
        .json(
            "POST",
            h.ani,
            "/locations/validate",
            json!({"latitude": FAR_AWAY.0, "longitude": FAR_AWAY.1}),
        )
        .await;
    assert_eq!(invalid["data"]["is_valid"], false);
    assert_eq!(invalid["message"], "Location is not within any allowed radius");
}

// =============================================================================
// Access control, errors and audit
// =============================================================================

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let h = Harness::new();
    let (status, body) = h
        .send(request("GET", "/attendance/today", None).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_employee_blocked_from_admin_routes() {
    let h = Harness::new();
    for uri in [
        "/dashboard/today",
        "/dashboard/admin",
        "/dashboard/monthly",
        "/meal-allowance/all",
        "/meal-allowance/management",
    ] {
        let (status, body) = h.get(h.ani, uri).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let h = Harness::new();
    let (status, body) = h
        .send(
            request("POST", "/meal-allowance/claim", Some(h.ani))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"month\": 6,"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MALFORMED_JSON");

    let (status, body) = h.json("POST", h.ani, "/meal-allowance/claim", json!({"month": 6})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_claim_is_not_found() {
    let h = Harness::new();
    let (status, body) = h
        .json(
            "PUT",
            h.admin,
            &format!("/meal-allowance/{}/approve", Uuid::new_v4()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "CLAIM_NOT_FOUND");

    let (status, _) = h
        .json("PUT", h.admin, "/meal-allowance/not-a-uuid/approve", json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_identified_requests_are_audited() {
    let h = Harness::new();
    h.get(h.ani, "/attendance/today").await;
    h.get(h.admin, "/meal-allowance/policy").await;
    h.send(request("GET", "/attendance/today", None).body(Body::empty()).unwrap())
        .await;

    let Harness {
        router, sink, worker, ani, ..
    } = h;
    drop(router);
    worker.await.unwrap();

    let entries = sink.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].user_id, ani.id);
    assert_eq!(entries[0].action, "GET");
    assert_eq!(entries[0].resource, "/attendance/today");
    assert_eq!(entries[0].user_agent.as_deref(), Some("integration-test"));
}
