mod common;

use actix_web::{
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test, App,
};
use serde_json::{json, Value};

use mindwatch_service::handlers::configure;

async fn send<S>(app: &S, req: actix_http::Request) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn registration(email: &str) -> Value {
    json!({
        "nom": "Martin",
        "prenom": "Claire",
        "email": email,
        "password": "correct horse battery",
        "specialite": "Psychiatrie"
    })
}

/// Registers a doctor and returns (id, bearer header value).
async fn sign_up<S>(app: &S, email: &str) -> (String, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/register/doctor")
        .set_json(registration(email))
        .to_request();
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/login/doctor")
        .set_json(json!({"email": email, "password": "correct horse battery"}))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    (
        body["doctorId"].as_str().unwrap().to_string(),
        format!("Bearer {}", body["access_token"].as_str().unwrap()),
    )
}

fn empty_analysis() -> Value {
    json!({
        "username": "alice",
        "tweets_analyzed": 0,
        "overall_summary": {
            "Normal": 0.0,
            "Stressed": 0.0,
            "Anxiety": 0.0,
            "Depression": 0.0,
            "Potential Suicide Post": 0.0
        },
        "predictions": []
    })
}

#[actix_web::test]
async fn test_register_and_login() {
    let app = test::init_service(App::new().app_data(common::state()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/register/doctor")
        .set_json(registration("Claire@Example.com"))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "claire@example.com");
    assert!(body["doctorId"].is_string());
    assert!(body.get("password_hash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/register/doctor")
        .set_json(registration("claire@example.com"))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let req = test::TestRequest::post()
        .uri("/api/login/doctor")
        .set_json(json!({"email": "claire@example.com", "password": "correct horse battery"}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].as_str().unwrap().len() > 20);

    let req = test::TestRequest::post()
        .uri("/api/login/doctor")
        .set_json(json!({"email": "claire@example.com", "password": "wrong password"}))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_registration_validation() {
    let app = test::init_service(App::new().app_data(common::state()).configure(configure)).await;

    let mut weak = registration("weak@example.com");
    weak["password"] = json!("short");
    let req = test::TestRequest::post()
        .uri("/api/register/doctor")
        .set_json(weak)
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("password"));
}

#[actix_web::test]
async fn test_protected_routes_need_token() {
    let app = test::init_service(App::new().app_data(common::state()).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/patients").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);

    let req = test::TestRequest::get()
        .uri("/api/doctors")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_patient_lifecycle() {
    let app = test::init_service(App::new().app_data(common::state()).configure(configure)).await;
    let (doctor_id, token) = sign_up(&app, "owner@example.com").await;

    let req = test::TestRequest::post()
        .uri("/api/patients")
        .insert_header(("Authorization", token.clone()))
        .set_json(json!({"patient_name": "Jean Dupont", "twitter_username": "jdupont"}))
        .to_request();
    let (status, created) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["doctor_id"], doctor_id.as_str());
    let patient_uri = format!("/api/patients/{}", created["id"].as_str().unwrap());

    let req = test::TestRequest::get()
        .uri("/api/patients")
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let (status, list) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let req = test::TestRequest::put()
        .uri(&patient_uri)
        .insert_header(("Authorization", token.clone()))
        .set_json(json!({"notes": "Weekly follow-up"}))
        .to_request();
    let (status, updated) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["notes"], "Weekly follow-up");
    assert_eq!(updated["patient_name"], "Jean Dupont");

    let req = test::TestRequest::delete()
        .uri(&patient_uri)
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&patient_uri)
        .insert_header(("Authorization", token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_patients_are_scoped_to_their_doctor() {
    let app = test::init_service(App::new().app_data(common::state()).configure(configure)).await;
    let (_, owner) = sign_up(&app, "owner@example.com").await;
    let (_, other) = sign_up(&app, "other@example.com").await;

    let req = test::TestRequest::post()
        .uri("/api/patients")
        .insert_header(("Authorization", owner))
        .set_json(json!({"patient_name": "Private"}))
        .to_request();
    let (_, created) = send(&app, req).await;
    let patient_uri = format!("/api/patients/{}", created["id"].as_str().unwrap());

    let req = test::TestRequest::get()
        .uri(&patient_uri)
        .insert_header(("Authorization", other.clone()))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/patients")
        .insert_header(("Authorization", other.clone()))
        .to_request();
    let (_, list) = send(&app, req).await;
    assert!(list.as_array().unwrap().is_empty());

    let req = test::TestRequest::get()
        .uri("/api/patients/not-a-uuid")
        .insert_header(("Authorization", other))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_save_analysis_upserts_by_name() {
    let app = test::init_service(App::new().app_data(common::state()).configure(configure)).await;
    let (_, token) = sign_up(&app, "owner@example.com").await;

    let body = json!({"patient_name": "Alice", "analysis_data": empty_analysis()});

    let req = test::TestRequest::post()
        .uri("/api/patients/save_analysis")
        .insert_header(("Authorization", token.clone()))
        .set_json(body.clone())
        .to_request();
    let (status, first) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["created"], true);

    let req = test::TestRequest::post()
        .uri("/api/patients/save_analysis")
        .insert_header(("Authorization", token.clone()))
        .set_json(body)
        .to_request();
    let (_, second) = send(&app, req).await;
    assert_eq!(second["created"], false);
    assert_eq!(second["patient_id"], first["patient_id"]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/patients/{}", first["patient_id"].as_str().unwrap()))
        .insert_header(("Authorization", token))
        .to_request();
    let (_, patient) = send(&app, req).await;
    assert_eq!(patient["twitter_username"], "alice");
    assert_eq!(patient["last_analysis"]["tweets_analyzed"], 0);
}

#[actix_web::test]
async fn test_doctor_account_management() {
    let app = test::init_service(App::new().app_data(common::state()).configure(configure)).await;
    let (owner_id, owner) = sign_up(&app, "owner@example.com").await;
    let (other_id, other) = sign_up(&app, "other@example.com").await;

    let req = test::TestRequest::get()
        .uri("/api/doctors")
        .insert_header(("Authorization", owner.clone()))
        .to_request();
    let (status, list) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);

    let req = test::TestRequest::put()
        .uri(&format!("/api/doctors/{}", other_id))
        .insert_header(("Authorization", owner.clone()))
        .set_json(json!({"specialite": "Neurologie"}))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/doctors/{}", owner_id))
        .insert_header(("Authorization", owner.clone()))
        .set_json(json!({"specialite": "Neurologie"}))
        .to_request();
    let (status, updated) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["specialite"], "Neurologie");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/doctors/{}", owner_id))
        .insert_header(("Authorization", other.clone()))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/doctors/{}", owner_id))
        .insert_header(("Authorization", owner))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/doctors/{}", owner_id))
        .insert_header(("Authorization", other))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_deleted_doctor_token_is_rejected() {
    let app = test::init_service(App::new().app_data(common::state()).configure(configure)).await;
    let (doctor_id, token) = sign_up(&app, "leaving@example.com").await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/doctors/{}", doctor_id))
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/api/patients")
        .insert_header(("Authorization", token.clone()))
        .set_json(json!({"patient_name": "Orphan"}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);

    let req = test::TestRequest::post()
        .uri("/api/patients/save_analysis")
        .insert_header(("Authorization", token))
        .set_json(json!({"patient_name": "Orphan", "analysis_data": empty_analysis()}))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_save_analysis_rejects_malformed_username() {
    let app = test::init_service(App::new().app_data(common::state()).configure(configure)).await;
    let (_, token) = sign_up(&app, "owner@example.com").await;

    let mut analysis = empty_analysis();
    analysis["username"] = json!("a_username_that_is_far_too_long_for_any_twitter_handle");
    let req = test::TestRequest::post()
        .uri("/api/patients/save_analysis")
        .insert_header(("Authorization", token.clone()))
        .set_json(json!({"patient_name": "Alice", "analysis_data": analysis}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let req = test::TestRequest::get()
        .uri("/api/patients")
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let (_, list) = send(&app, req).await;
    assert!(list.as_array().unwrap().is_empty());

    let mut analysis = empty_analysis();
    analysis["username"] = json!(" @alice ");
    let req = test::TestRequest::post()
        .uri("/api/patients/save_analysis")
        .insert_header(("Authorization", token.clone()))
        .set_json(json!({"patient_name": "Alice", "analysis_data": analysis}))
        .to_request();
    let (status, saved) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/patients/{}", saved["patient_id"].as_str().unwrap()))
        .insert_header(("Authorization", token))
        .to_request();
    let (_, patient) = send(&app, req).await;
    assert_eq!(patient["twitter_username"], "alice");
}
