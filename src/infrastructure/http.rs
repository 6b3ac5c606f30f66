use crate::config::ClientConfig;
use crate::domain::auth::{AuthSession, AuthToken, LoginRequest, RegisterRequest};
use crate::domain::booking::CreateIntentRequest;
use crate::domain::payment::{
    BookingConfirmation, ConfirmPaymentRequest, IntentCreated, ProcessorConfig, SessionId,
};
use crate::domain::ports::{AuthApi, BookingApi, ConfigSource, TutorDirectory};
use crate::domain::tutor::{TutorId, TutorSummary};
use crate::error::{BookingError, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// The `{success, data, error}` wrapper every endpoint answers with.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// JSON-over-HTTP client for the marketplace API.
///
/// One instance serves every port the remote API backs. `Clone` shares the
/// underlying connection pool.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BookingError::Config(format!("could not build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.config.endpoint(path))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.config.endpoint(path))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "api response");
        let body = response.bytes().await?;
        decode_envelope(status, &body)
    }
}

/// Turns a raw response into the payload or the matching error.
pub fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(BookingError::Unauthorized);
    }

    let envelope: Option<Envelope> = serde_json::from_slice(body).ok();
    let message = envelope.as_ref().and_then(|e| e.error.clone());

    if status == StatusCode::NOT_FOUND {
        return Err(BookingError::NotFound(
            message.unwrap_or_else(|| "resource not found".to_string()),
        ));
    }

    match envelope {
        Some(Envelope {
            success: true,
            data,
            ..
        }) if status.is_success() => {
            serde_json::from_value(data.unwrap_or(serde_json::Value::Null))
                .map_err(|e| BookingError::Api(format!("Malformed server response: {e}")))
        }
        _ => Err(BookingError::Api(
            message.unwrap_or_else(|| fallback_message(status)),
        )),
    }
}

fn fallback_message(status: StatusCode) -> String {
    if status == StatusCode::FORBIDDEN {
        "Access denied. Insufficient permissions.".to_string()
    } else if status.is_server_error() {
        "Server error. Please try again later.".to_string()
    } else {
        format!("Request failed ({status})")
    }
}

#[async_trait]
impl TutorDirectory for ApiClient {
    async fn list_tutors(&self, token: &AuthToken) -> Result<Vec<TutorSummary>> {
        self.send(self.get("/tutors").header(AUTHORIZATION, token.bearer()))
            .await
    }

    async fn get_tutor(&self, id: TutorId, token: &AuthToken) -> Result<TutorSummary> {
        self.send(
            self.get(&format!("/tutors/{id}"))
                .header(AUTHORIZATION, token.bearer()),
        )
        .await
    }
}

#[async_trait]
impl BookingApi for ApiClient {
    async fn create_payment_intent(
        &self,
        request: &CreateIntentRequest,
        token: &AuthToken,
    ) -> Result<IntentCreated> {
        self.send(
            self.post("/sessions/create-payment-intent")
                .header(AUTHORIZATION, token.bearer())
                .json(request),
        )
        .await
    }

    async fn confirm_payment(
        &self,
        session_id: &SessionId,
        payment_intent_id: &str,
        token: &AuthToken,
    ) -> Result<BookingConfirmation> {
        let body = ConfirmPaymentRequest {
            payment_intent_id: payment_intent_id.to_string(),
        };
        self.send(
            self.post(&format!("/sessions/{session_id}/confirm-payment"))
                .header(AUTHORIZATION, token.bearer())
                .json(&body),
        )
        .await
    }
}

#[async_trait]
impl ConfigSource for ApiClient {
    async fn processor_config(&self) -> Result<ProcessorConfig> {
        self.send(self.get("/config/stripe")).await
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthSession> {
        self.send(self.post("/auth/login").json(request)).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthSession> {
        self.send(self.post("/auth/register").json(request)).await
    }
}
