//! End-to-end tests driving the REST API over a real socket.
#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};

use booking_desk::api;
use booking_desk::app_state::AppState;
use booking_desk::domain::{RolePolicy, SystemClock};
use booking_desk::persistence::memory::MemoryStore;
use booking_desk::service::{BookingService, CatalogService, EmployeeService, UserService};

struct TestServer {
    addr: SocketAddr,
    client: Client,
}

impl TestServer {
    async fn start() -> Self {
        let store = Arc::new(MemoryStore::new());
        let authorizer = Arc::new(RolePolicy);
        let state = AppState {
            booking_service: Arc::new(BookingService::new(
                Arc::clone(&store) as _,
                Arc::new(SystemClock),
                Arc::clone(&authorizer) as _,
            )),
            catalog_service: Arc::new(CatalogService::new(
                Arc::clone(&store) as _,
                Arc::clone(&authorizer) as _,
            )),
            user_service: Arc::new(UserService::new(
                Arc::clone(&store) as _,
                Arc::new(SystemClock),
                Arc::clone(&authorizer) as _,
            )),
            employee_service: Arc::new(EmployeeService::new(
                store,
                Arc::new(SystemClock),
                authorizer,
            )),
            default_page_size: 100,
            storage_backend: "memory",
        };
        let app = api::build_router().with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            addr,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn as_role(&self, builder: RequestBuilder, role: &str, user_id: &str) -> RequestBuilder {
        builder
            .header("user-role", role)
            .header("user-id", user_id)
            .header("user-name", format!("{role}-{user_id}"))
    }

    fn get(&self, path: &str, role: &str, user_id: &str) -> RequestBuilder {
        self.as_role(self.client.get(self.url(path)), role, user_id)
    }

    fn post(&self, path: &str, role: &str, user_id: &str) -> RequestBuilder {
        self.as_role(self.client.post(self.url(path)), role, user_id)
    }

    fn patch(&self, path: &str, role: &str, user_id: &str) -> RequestBuilder {
        self.as_role(self.client.patch(self.url(path)), role, user_id)
    }

    fn put(&self, path: &str, role: &str, user_id: &str) -> RequestBuilder {
        self.as_role(self.client.put(self.url(path)), role, user_id)
    }

    fn delete(&self, path: &str, role: &str, user_id: &str) -> RequestBuilder {
        self.as_role(self.client.delete(self.url(path)), role, user_id)
    }

    async fn create_booking(&self, owner: &str) -> Value {
        let response = self
            .post("/api/v1/bookings", "srdev", "dev-1")
            .json(&booking_body(owner))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }
}

fn booking_body(owner: &str) -> Value {
    json!({
        "user_id": owner,
        "bdm": "Ravi",
        "branch_name": "Pune",
        "company_name": "Acme Pvt Ltd",
        "contact_person": "Meera",
        "email": "meera@acme.test",
        "contact_no": 9876543210_i64,
        "services": ["gst", "audit"],
        "total_amount": 25000.0,
        "pan": "ABCDE1234F",
        "state": "Maharashtra",
        "date": "2024-05-01",
        "status": "Pending",
        "bank": "Cash"
    })
}

fn error_code(body: &Value) -> u64 {
    body["error"]["code"].as_u64().unwrap()
}

#[tokio::test]
async fn health_reports_storage_backend() {
    let server = TestServer::start().await;
    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn missing_identity_headers_are_unauthorized() {
    let server = TestServer::start().await;
    let response = server
        .client
        .get(server.url("/api/v1/bookings"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_reports_every_missing_field() {
    let server = TestServer::start().await;
    let response = server
        .post("/api/v1/bookings", "srdev", "dev-1")
        .json(&json!({"user_id": "u-1", "bdm": "Ravi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(error_code(&body), 1002);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("branch_name"));
    assert!(message.contains("pan"));
}

#[tokio::test]
async fn update_appends_history_and_no_op_is_rejected() {
    let server = TestServer::start().await;
    let booking = server.create_booking("u-1").await;
    let path = format!("/api/v1/bookings/{}", booking["id"].as_str().unwrap());

    let response = server
        .patch(&path, "admin", "adm-1")
        .json(&json!({"status": "Completed", "bank": "Cash", "updated_by": "alice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["status"], "Completed");
    assert_eq!(updated["version"], 2);
    let history = updated["change_history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["actor"], "alice");
    let changed = history[0]["field_changes"].as_object().unwrap();
    assert_eq!(changed.keys().collect::<Vec<_>>(), vec!["status"]);

    let again = server
        .patch(&path, "admin", "adm-1")
        .json(&json!({"status": "Completed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
    let body: Value = again.json().await.unwrap();
    assert_eq!(error_code(&body), 1003);
}

#[tokio::test]
async fn stale_expected_version_conflicts() {
    let server = TestServer::start().await;
    let booking = server.create_booking("u-1").await;
    let path = format!("/api/v1/bookings/{}", booking["id"].as_str().unwrap());

    let first = server
        .patch(&path, "admin", "adm-1")
        .json(&json!({"remark": "one", "expected_version": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = server
        .patch(&path, "admin", "adm-1")
        .json(&json!({"remark": "two", "expected_version": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn trash_lifecycle_over_http() {
    let server = TestServer::start().await;
    let booking = server.create_booking("u-1").await;
    let id = booking["id"].as_str().unwrap().to_string();
    let path = format!("/api/v1/bookings/{id}");

    let early_delete = server.delete(&path, "srdev", "dev-1").send().await.unwrap();
    assert_eq!(early_delete.status(), StatusCode::CONFLICT);

    let member_trash = server
        .post(&format!("{path}/trash"), "bdm", "u-1")
        .send()
        .await
        .unwrap();
    assert_eq!(member_trash.status(), StatusCode::FORBIDDEN);

    let trashed = server
        .post(&format!("{path}/trash"), "admin", "adm-1")
        .send()
        .await
        .unwrap();
    assert_eq!(trashed.status(), StatusCode::OK);
    let trashed: Value = trashed.json().await.unwrap();
    assert_eq!(trashed["is_deleted"], true);
    assert_eq!(trashed["deleted_by"], "admin-adm-1");

    let listing: Value = server
        .get("/api/v1/bookings", "admin", "adm-1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["pagination"]["total"], 0);

    let trash: Value = server
        .get("/api/v1/bookings/trash", "srdev", "dev-1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(trash.as_array().unwrap().len(), 1);

    let restored = server
        .post(&format!("{path}/restore"), "srdev", "dev-1")
        .send()
        .await
        .unwrap();
    assert_eq!(restored.status(), StatusCode::OK);
    let restored: Value = restored.json().await.unwrap();
    assert_eq!(restored["is_deleted"], false);
    assert_eq!(restored["deleted_at"], Value::Null);

    let trash_again = server
        .post(&format!("{path}/trash"), "srdev", "dev-1")
        .send()
        .await
        .unwrap();
    assert_eq!(trash_again.status(), StatusCode::OK);
    let gone = server.delete(&path, "srdev", "dev-1").send().await.unwrap();
    assert_eq!(gone.status(), StatusCode::NO_CONTENT);
    let missing = server.get(&path, "srdev", "dev-1").send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn members_are_scoped_to_their_own_bookings() {
    let server = TestServer::start().await;
    server.create_booking("u-1").await;
    let other = server.create_booking("u-2").await;

    let listing: Value = server
        .get("/api/v1/bookings?user_id=u-2", "bdm", "u-1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["pagination"]["total"], 1);
    assert_eq!(listing["data"][0]["user_id"], "u-1");

    let foreign = server
        .get(
            &format!("/api/v1/bookings/{}", other["id"].as_str().unwrap()),
            "bdm",
            "u-1",
        )
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn list_filters_validate_and_apply() {
    let server = TestServer::start().await;
    server.create_booking("u-1").await;

    let bad = server
        .get("/api/v1/bookings?status=Shipped", "admin", "adm-1")
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let hit: Value = server
        .get(
            "/api/v1/bookings?status=pending&service=gst&start_date=2024-05-01&end_date=2024-05-01",
            "admin",
            "adm-1",
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hit["pagination"]["total"], 1);

    let miss: Value = server
        .get("/api/v1/bookings?bdm_name=zzz", "admin", "adm-1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(miss["pagination"]["total"], 0);
}

#[tokio::test]
async fn catalog_round_trip() {
    let server = TestServer::start().await;
    let created = server
        .post("/api/v1/catalog", "bdm", "u-1")
        .json(&json!({"name": "GST Filing", "value": "gst"}))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let entry: Value = created.json().await.unwrap();
    assert_eq!(entry["active"], true);
    let path = format!("/api/v1/catalog/{}", entry["id"].as_str().unwrap());

    let duplicate = server
        .post("/api/v1/catalog", "bdm", "u-1")
        .json(&json!({"name": "GST", "value": "gst"}))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let denied = server
        .patch(&path, "admin", "adm-1")
        .json(&json!({"active": false}))
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let edited: Value = server
        .patch(&path, "dev", "dev-1")
        .json(&json!({"active": false}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(edited["active"], false);

    let removed = server.delete(&path, "dev", "dev-1").send().await.unwrap();
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);
    let listing: Value = server
        .get("/api/v1/catalog", "bdm", "u-1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn numeric_strings_are_accepted_for_amounts() {
    let server = TestServer::start().await;
    let mut body = booking_body("u-1");
    body["total_amount"] = json!("25000");
    body["contact_no"] = json!("9876543210");
    let response = server
        .post("/api/v1/bookings", "srdev", "dev-1")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["total_amount"], 25000.0);
}

#[tokio::test]
async fn malformed_json_uses_the_error_envelope() {
    let server = TestServer::start().await;
    let response = server
        .post("/api/v1/bookings", "srdev", "dev-1")
        .header("content-type", "application/json")
        .body("{\"user_id\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(error_code(&body), 1001);

    let wrong_type = server
        .post("/api/v1/bookings", "srdev", "dev-1")
        .json(&json!({"user_id": "u-1", "services": "gst"}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_type.status(), StatusCode::BAD_REQUEST);
    let body: Value = wrong_type.json().await.unwrap();
    assert_eq!(error_code(&body), 1001);
}

#[tokio::test]
async fn srdev_manages_accounts_and_users_own_their_session() {
    let server = TestServer::start().await;
    let response = server
        .post("/api/v1/users", "srdev", "root")
        .json(&json!({"name": "Asha", "email": "Asha@Example.com", "user_role": "admin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["email"], "asha@example.com");
    assert_eq!(user["is_active"], false);
    let id = user["id"].as_str().unwrap().to_string();

    let duplicate = server
        .post("/api/v1/users", "srdev", "root")
        .json(&json!({"name": "Asha 2", "email": "asha@example.com", "user_role": "dev"}))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(&duplicate.json().await.unwrap()), 2104);

    let forbidden = server.get("/api/v1/users", "dev", "d-1").send().await.unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let session = server
        .put(&format!("/api/v1/users/{id}/session"), "admin", &id)
        .json(&json!({"active": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(session.status(), StatusCode::OK);
    let signed_in: Value = session.json().await.unwrap();
    assert_eq!(signed_in["is_active"], true);

    server.create_booking(&id).await;
    server.create_booking("someone-else").await;
    let bookings = server
        .get(&format!("/api/v1/users/{id}/bookings"), "admin", &id)
        .send()
        .await
        .unwrap();
    assert_eq!(bookings.status(), StatusCode::OK);
    let listed: Value = bookings.json().await.unwrap();
    assert_eq!(listed["pagination"]["total"], 1);
    assert_eq!(listed["data"][0]["user_id"], id.as_str());

    let deleted = server
        .delete(&format!("/api/v1/users/{id}"), "srdev", "root")
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    let gone = server
        .get(&format!("/api/v1/users/{id}"), "srdev", "root")
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&gone.json().await.unwrap()), 2003);
}

fn profile_body(tag: &str) -> Value {
    json!({
        "full_name": "Meera Joshi",
        "designation": "Account Manager",
        "department": "Legal",
        "branch": "808",
        "gender": "Female",
        "marital_status": "Married",
        "date_of_birth": "1992-08-20",
        "personal_contact_number": "9876543210",
        "personal_email": format!("meera.{tag}@example.com"),
        "work_email": format!("meera.{tag}@work.example.com"),
        "work_phone_number": "9123456780",
        "permanent_address": "4 Hill Road, Mumbai",
        "current_address": "4 Hill Road, Mumbai",
        "emergency_contact_name": "Ravi Joshi",
        "emergency_contact_number": "9988776655",
        "emergency_contact_relationship": "Spouse",
        "date_of_joining": "2023-01-09",
        "reporting_manager": "Arun",
        "offered_salary": "700000",
        "education_qualification": "LLB",
        "total_work_experience": "6 years",
        "account_number": "556677889900",
        "bank_name": "ICICI Bank",
        "ifsc_code": "ICIC0000456",
        "pan_number": "PQRSX6789Z",
        "aadhar_number": "123412341234"
    })
}

#[tokio::test]
async fn employee_profile_review_flow() {
    let server = TestServer::start().await;
    let response = server
        .post("/api/v1/employees", "member", "emp-1")
        .json(&profile_body("emp-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    let code = created["employee_code"].as_str().unwrap();
    assert!(code.starts_with("LG"));
    assert!(code.ends_with("0001"));
    assert_eq!(created["status"], "pending_review");

    let peer = server
        .get("/api/v1/employees/emp-1", "member", "emp-2")
        .send()
        .await
        .unwrap();
    assert_eq!(peer.status(), StatusCode::FORBIDDEN);

    let updated = server
        .patch("/api/v1/employees/emp-1", "hr", "hr-1")
        .json(&json!({"designation": "Counsel", "update_reason": "Promotion"}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);
    let updated: Value = updated.json().await.unwrap();
    assert_eq!(updated["designation"], "Counsel");
    assert_eq!(updated["update_history"][0]["reason"], "Promotion");

    let fixed = server
        .patch("/api/v1/employees/emp-1", "hr", "hr-1")
        .json(&json!({"offered_salary": "900000"}))
        .send()
        .await
        .unwrap();
    assert_eq!(fixed.status(), StatusCode::BAD_REQUEST);

    let approved = server
        .post("/api/v1/employees/emp-1/approve", "hr", "hr-1")
        .send()
        .await
        .unwrap();
    assert_eq!(approved.status(), StatusCode::OK);
    let approved: Value = approved.json().await.unwrap();
    assert_eq!(approved["status"], "approved");

    let stats = server
        .get("/api/v1/employees/stats", "hr", "hr-1")
        .send()
        .await
        .unwrap();
    let stats: Value = stats.json().await.unwrap();
    assert_eq!(stats["total_employees"], 1);
    assert_eq!(stats["by_department"][0]["key"], "Legal");

    let export = server
        .get("/api/v1/employees/export", "hr", "hr-1")
        .send()
        .await
        .unwrap();
    assert_eq!(export.status(), StatusCode::OK);
    assert!(
        export.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let csv = export.text().await.unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains("Meera Joshi,Counsel,Legal,808"));

    let deactivated = server
        .delete("/api/v1/employees/emp-1", "hr", "hr-1")
        .send()
        .await
        .unwrap();
    assert_eq!(deactivated.status(), StatusCode::OK);
    let hidden = server
        .get("/api/v1/employees/emp-1", "member", "emp-1")
        .send()
        .await
        .unwrap();
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&hidden.json().await.unwrap()), 2004);
}
