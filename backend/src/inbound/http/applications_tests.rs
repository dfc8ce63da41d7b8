//! Handler tests for the application endpoints.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};
use url::Url;

use crate::domain::ChangeKind;
use crate::domain::ports::ApplicationChangeFeed;
use crate::inbound::http::test_utils::{login_request, session_cookie, test_app, test_portal};
use crate::test_support::applications::clearance_id;
use crate::test_support::users::{admin, other_resident, resident};

const RESIDENT: &str = "juan@example.ph";
const ADMIN: &str = "kapitan@example.ph";

fn submission(purpose: &str) -> Value {
    json!({
        "documentTypeId": clearance_id().to_string(),
        "purpose": purpose,
        "attachments": [
            { "fileName": "valid-id.pdf", "fileType": "application/pdf", "fileSize": 204800 }
        ]
    })
}

/// Sign `$email` in and evaluate to the session cookie.
macro_rules! sign_in {
    ($app:expr, $email:expr) => {
        session_cookie(&actix_test::call_service(&$app, login_request($email).to_request()).await)
    };
}

/// Submit an application as `$cookie` and evaluate to the response body.
macro_rules! submit {
    ($app:expr, $cookie:expr) => {{
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/applications")
            .cookie($cookie.clone())
            .set_json(submission("Employment requirement"))
            .to_request();
        let response = actix_test::call_service(&$app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        actix_test::read_body_json::<Value, _>(response).await
    }};
}

#[rstest]
#[actix_web::test]
async fn resident_submits_and_reads_back() {
    let portal = test_portal(&[resident()]).await;
    let app = actix_test::init_service(test_app(portal.state)).await;
    let cookie = sign_in!(app, RESIDENT);

    let created = submit!(app, cookie);
    assert_eq!(created["status"], "pending");
    let tracking = created["trackingNumber"].as_str().expect("tracking number");
    assert_eq!(tracking.len(), 14);
    assert!(tracking.starts_with("BA"));
    assert_eq!(created["attachments"][0]["fileType"], "application/pdf");

    let id = created["id"].as_str().expect("id");
    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/v1/applications/{id}"))
        .cookie(cookie.clone())
        .to_request();
    let fetched: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(fetched["id"], created["id"]);

    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/v1/applications/track/{tracking}"))
        .cookie(cookie)
        .to_request();
    let tracked: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(tracked["id"], created["id"]);
}

#[rstest]
#[case(submission("short"), "purpose")]
#[case(
    json!({ "documentTypeId": "not-a-uuid", "purpose": "Employment requirement", "attachments": [] }),
    "documentTypeId"
)]
#[actix_web::test]
async fn invalid_submissions_name_the_field(#[case] body: Value, #[case] field: &str) {
    let portal = test_portal(&[resident()]).await;
    let app = actix_test::init_service(test_app(portal.state)).await;
    let cookie = sign_in!(app, RESIDENT);

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/applications")
        .cookie(cookie)
        .set_json(body)
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn admin_approves_then_completes() {
    let portal = test_portal(&[resident(), admin()]).await;
    let app = actix_test::init_service(test_app(portal.state)).await;
    let resident_cookie = sign_in!(app, RESIDENT);
    let created = submit!(app, resident_cookie);
    let id = created["id"].as_str().expect("id");
    let admin_cookie = sign_in!(app, ADMIN);

    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/applications/{id}/process"))
        .cookie(admin_cookie.clone())
        .set_json(json!({ "action": "approve", "notes": "Pick up at the hall" }))
        .to_request();
    let approved: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["processedBy"], admin().id().to_string());
    assert_eq!(approved["notes"], "Pick up at the hall");

    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/applications/{id}/complete"))
        .cookie(admin_cookie)
        .to_request();
    let completed: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(completed["status"], "completed");
    assert!(completed["completedAt"].is_string());
}

#[rstest]
#[actix_web::test]
async fn residents_cannot_process() {
    let portal = test_portal(&[resident()]).await;
    let app = actix_test::init_service(test_app(portal.state)).await;
    let cookie = sign_in!(app, RESIDENT);
    let created = submit!(app, cookie);
    let id = created["id"].as_str().expect("id");

    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/applications/{id}/process"))
        .cookie(cookie)
        .set_json(json!({ "action": "approve" }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn rejection_requires_a_reason() {
    let portal = test_portal(&[resident(), admin()]).await;
    let app = actix_test::init_service(test_app(portal.state)).await;
    let resident_cookie = sign_in!(app, RESIDENT);
    let created = submit!(app, resident_cookie);
    let id = created["id"].as_str().expect("id");
    let admin_cookie = sign_in!(app, ADMIN);

    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/applications/{id}/process"))
        .cookie(admin_cookie)
        .set_json(json!({ "action": "reject", "rejectionReason": "   " }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["code"], "missing_reason");
}

#[rstest]
#[actix_web::test]
async fn cancelling_twice_conflicts() {
    let portal = test_portal(&[resident()]).await;
    let app = actix_test::init_service(test_app(portal.state)).await;
    let cookie = sign_in!(app, RESIDENT);
    let created = submit!(app, cookie);
    let id = created["id"].as_str().expect("id");
    let uri = format!("/api/v1/applications/{id}/cancel");

    let request = actix_test::TestRequest::post()
        .uri(&uri)
        .cookie(cookie.clone())
        .to_request();
    let cancelled: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(cancelled["status"], "cancelled");

    let request = actix_test::TestRequest::post()
        .uri(&uri)
        .cookie(cookie)
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["code"], "invalid_state_transition");
}

#[rstest]
#[actix_web::test]
async fn foreign_applications_read_as_not_found() {
    let portal = test_portal(&[resident(), other_resident()]).await;
    let app = actix_test::init_service(test_app(portal.state)).await;
    let owner = sign_in!(app, RESIDENT);
    let created = submit!(app, owner);
    let id = created["id"].as_str().expect("id");
    let stranger = sign_in!(app, "ana@example.ph");

    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/v1/applications/{id}"))
        .cookie(stranger)
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn listing_pages_with_cursor_links() {
    let portal = test_portal(&[resident()]).await;
    let app = actix_test::init_service(test_app(portal.state)).await;
    let cookie = sign_in!(app, RESIDENT);
    for _ in 0..3 {
        submit!(app, cookie);
    }

    let request = actix_test::TestRequest::get()
        .uri("/api/v1/applications?status=pending&limit=2")
        .cookie(cookie.clone())
        .to_request();
    let first: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(first["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(first["limit"], 2);
    let next = first["links"]["next"].as_str().expect("next link");
    let next = Url::parse(next).expect("absolute link");
    assert!(next.query_pairs().any(|(key, value)| key == "status" && value == "pending"));

    let uri = format!("{}?{}", next.path(), next.query().unwrap_or_default());
    let request = actix_test::TestRequest::get()
        .uri(&uri)
        .cookie(cookie)
        .to_request();
    let second: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(second["data"].as_array().map(Vec::len), Some(1));
    assert!(second["links"].get("next").is_none());
    assert_ne!(second["data"][0]["id"], first["data"][0]["id"]);
    assert_ne!(second["data"][0]["id"], first["data"][1]["id"]);
}

#[rstest]
#[case("status=archived")]
#[case("limit=0")]
#[case("limit=51")]
#[case("documentTypeId=nope")]
#[actix_web::test]
async fn malformed_list_queries_are_rejected(#[case] query: &str) {
    let portal = test_portal(&[resident()]).await;
    let app = actix_test::init_service(test_app(portal.state)).await;
    let cookie = sign_in!(app, RESIDENT);

    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/v1/applications?{query}"))
        .cookie(cookie)
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn stats_report_user_count_to_admins_only() {
    let portal = test_portal(&[resident(), admin()]).await;
    let app = actix_test::init_service(test_app(portal.state)).await;
    let resident_cookie = sign_in!(app, RESIDENT);
    submit!(app, resident_cookie);

    let request = actix_test::TestRequest::get()
        .uri("/api/v1/applications/stats")
        .cookie(resident_cookie)
        .to_request();
    let own: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(own["total"], 1);
    assert_eq!(own["pending"], 1);
    assert!(own.get("userCount").is_none());

    let admin_cookie = sign_in!(app, ADMIN);
    let request = actix_test::TestRequest::get()
        .uri("/api/v1/applications/stats")
        .cookie(admin_cookie)
        .to_request();
    let all: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(all["total"], 1);
    assert_eq!(all["userCount"], 2);
    assert_eq!(all["recent"].as_array().map(Vec::len), Some(1));
}

#[rstest]
#[actix_web::test]
async fn submissions_reach_live_subscribers() {
    let portal = test_portal(&[resident()]).await;
    let mut subscription = portal.changes.subscribe();
    let app = actix_test::init_service(test_app(portal.state)).await;
    let cookie = sign_in!(app, RESIDENT);

    let created = submit!(app, cookie);

    let change = subscription.next().await.expect("change delivered");
    assert_eq!(change.kind, ChangeKind::Inserted);
    assert_eq!(
        change.application.tracking_number().as_str(),
        created["trackingNumber"].as_str().expect("tracking number")
    );
}
