mod common;

use axum::extract::{Form, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tutorbook::config::ClientConfig;
use tutorbook::domain::payment::{ClientSecret, PaymentElement, ProcessorConfig};
use tutorbook::domain::ports::PaymentProcessor;
use tutorbook::error::BookingError;
use tutorbook::infrastructure::stripe::StripeProcessor;

async fn confirm(
    Path(intent): Path<String>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    // Publishable key as the basic-auth user, empty password.
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(auth, "Basic cGtfdGVzdF8xOg==");
    assert_eq!(form["client_secret"], format!("{intent}_secret_abc"));
    assert_eq!(form["return_url"], "http://localhost:5000/");

    match form["payment_method"].as_str() {
        "pm_card_visa" => (
            StatusCode::OK,
            Json(json!({"id": intent, "object": "payment_intent", "status": "succeeded"})),
        ),
        "pm_card_threeDSecure2Required" => (
            StatusCode::OK,
            Json(json!({"id": intent, "object": "payment_intent", "status": "requires_action"})),
        ),
        _ => (
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({"error": {
                "type": "card_error",
                "code": "card_declined",
                "message": "Your card was declined."
            }})),
        ),
    }
}

async fn processor() -> StripeProcessor {
    let app = Router::new().route("/v1/payment_intents/{intent}/confirm", post(confirm));
    let base = common::serve(app).await;
    let config = ClientConfig::default().with_stripe_api_base(format!("{base}/v1"));
    StripeProcessor::new(
        ProcessorConfig {
            publishable_key: "pk_test_1".into(),
        },
        &config,
    )
    .unwrap()
}

fn element(payment_method: &str) -> PaymentElement {
    let mut element = PaymentElement::new(ClientSecret::new("pi_42_secret_abc"));
    element.payment_method = Some(payment_method.into());
    element
}

#[tokio::test]
async fn test_confirm_succeeds() {
    let stripe = processor().await;
    let intent = stripe
        .confirm(&element("pm_card_visa"), "http://localhost:5000/")
        .await
        .unwrap();
    assert_eq!(intent.id, "pi_42");
    assert!(intent.succeeded());
}

#[tokio::test]
async fn test_decline_message_is_passed_through() {
    let stripe = processor().await;
    let err = stripe
        .confirm(&element("pm_card_chargeDeclined"), "http://localhost:5000/")
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::Processor("Your card was declined.".into()));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_pending_authentication_is_reported_as_status() {
    let stripe = processor().await;
    let intent = stripe
        .confirm(
            &element("pm_card_threeDSecure2Required"),
            "http://localhost:5000/",
        )
        .await
        .unwrap();
    assert_eq!(intent.status, "requires_action");
    assert!(!intent.succeeded());
}

#[tokio::test]
async fn test_stalled_processor_times_out() {
    async fn stall() -> StatusCode {
        tokio::time::sleep(Duration::from_secs(30)).await;
        StatusCode::OK
    }
    let app = Router::new().route("/v1/payment_intents/{intent}/confirm", post(stall));
    let base = common::serve(app).await;
    let config = ClientConfig::default()
        .with_stripe_api_base(format!("{base}/v1"))
        .with_timeout(Duration::from_millis(200));
    let stripe = StripeProcessor::new(
        ProcessorConfig {
            publishable_key: "pk_test_1".into(),
        },
        &config,
    )
    .unwrap();

    let started = Instant::now();
    let err = stripe
        .confirm(&element("pm_card_visa"), "http://localhost:5000/")
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Network(_)), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
}
