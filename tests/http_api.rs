use std::sync::Arc;

use actix_web::{App, ResponseError, http::StatusCode, test, web};
use chrono::{Duration, Utc};
use promotion_backend::handlers;
use promotion_backend::middlewares::AuthMiddleware;
use promotion_backend::models::*;
use promotion_backend::repositories::{MemoryPromotionRepository, PromotionRepository};
use promotion_backend::services::*;
use promotion_backend::utils::JwtService;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use uuid::Uuid;

const SECRET: &str = "http-test-secret";

macro_rules! init_app {
    () => {{
        let store = MemoryPromotionRepository::new();
        let repo: Arc<dyn PromotionRepository> = Arc::new(store);
        let promotion_service = PromotionService::new(repo.clone(), DiscountCalculator::default());
        let detail_service = PromotionDetailService::new(repo.clone());
        let usage_service = PromotionUsageService::new(repo);
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(JwtService::new(SECRET, 3600)))
                .app_data(web::Data::new(promotion_service))
                .app_data(web::Data::new(detail_service))
                .app_data(web::Data::new(usage_service))
                .service(web::scope("/api/v1").configure(handlers::promotion_config)),
        )
        .await
    }};
}

fn token(role: Role) -> String {
    JwtService::new(SECRET, 3600)
        .generate_access_token(Uuid::new_v4(), role)
        .unwrap()
}

fn create_body(code: &str) -> Value {
    json!({
        "code": code,
        "name": "Capped ten percent",
        "discount_type": "percentage",
        "discount_value": "10",
        "max_discount_amount": "40000",
        "valid_from": (Utc::now() - Duration::days(1)).to_rfc3339(),
        "valid_until": (Utc::now() + Duration::days(7)).to_rfc3339(),
        "usage_limit": 100
    })
}

#[actix_web::test]
async fn create_and_validate_over_http() {
    let app = init_app!();
    let admin = token(Role::Admin);

    let req = test::TestRequest::post()
        .uri("/api/v1/promotions")
        .insert_header(("Authorization", format!("Bearer {admin}")))
        .set_json(create_body("HTTP10"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let customer = token(Role::Customer);
    let req = test::TestRequest::post()
        .uri("/api/v1/promotions/validate")
        .insert_header(("Authorization", format!("Bearer {customer}")))
        .set_json(json!({ "code": "http10", "bookingTotal": "500000" }))
        .to_request();
    let body: ApiResponse<ValidatePromotionResponse> = test::call_and_read_body_json(&app, req).await;
    let data = body.data.unwrap();
    assert!(data.is_valid);
    assert_eq!(data.discount_value, dec!(10));
    assert_eq!(data.discount_amount, dec!(40000));
    assert_eq!(data.final_amount, dec!(460000));
}

macro_rules! post_json {
    ($app:expr, $uri:expr, $bearer:expr, $body:expr $(,)?) => {{
        let req = test::TestRequest::post()
            .uri($uri)
            .insert_header(("Authorization", format!("Bearer {}", $bearer)))
            .set_json($body)
            .to_request();
        let resp = test::call_service(&$app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

#[actix_web::test]
async fn unknown_code_is_404() {
    let app = init_app!();
    let customer = token(Role::Customer);

    let (status, body) = post_json!(
        app,
        "/api/v1/promotions/validate",
        &customer,
        json!({ "code": "MISSING", "bookingTotal": "100000" }),
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("PROMOTION_NOT_FOUND"));
}

#[actix_web::test]
async fn unusable_code_is_400_with_reason() {
    let app = init_app!();
    let admin = token(Role::Admin);
    let customer = token(Role::Customer);

    let mut create = create_body("MIN10");
    create["min_booking_price"] = json!("200000");
    let (status, _) = post_json!(app, "/api/v1/promotions", &admin, create);
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json!(
        app,
        "/api/v1/promotions/validate",
        &customer,
        json!({ "code": "MIN10", "bookingTotal": "100000" }),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("PROMOTION_BELOW_MINIMUM"));
}

#[actix_web::test]
async fn oversized_total_is_rejected_without_panic() {
    let app = init_app!();
    let admin = token(Role::Admin);
    let customer = token(Role::Customer);

    let mut create = create_body("BIG10");
    create["max_discount_amount"] = Value::Null;
    let (status, _) = post_json!(app, "/api/v1/promotions", &admin, create);
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json!(
        app,
        "/api/v1/promotions/validate",
        &customer,
        json!({ "code": "BIG10", "bookingTotal": "79228162514264337593543950335" }),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[actix_web::test]
async fn public_reads_and_protected_writes() {
    let app = init_app!();

    let req = test::TestRequest::get().uri("/api/v1/promotions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/promotions")
        .set_json(create_body("NOAUTH"))
        .to_request();
    let err = test::try_call_service(&app, req).await.err().unwrap();
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );

    let customer = token(Role::Customer);
    let req = test::TestRequest::post()
        .uri("/api/v1/promotions")
        .insert_header(("Authorization", format!("Bearer {customer}")))
        .set_json(create_body("CUSTOMER"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unknown_promotion_is_404() {
    let app = init_app!();
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/promotions/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
}
