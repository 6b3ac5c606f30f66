#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tutorbook::application::orchestrator::PaymentOrchestrator;
use tutorbook::domain::auth::{
    AuthSession, AuthToken, LoginRequest, RegisterRequest, Role, UserProfile,
};
use tutorbook::domain::booking::{BookingDraft, CreateIntentRequest};
use tutorbook::domain::payment::{
    BookingConfirmation, ClientSecret, IntentCreated, PaymentElement, ProcessorConfig,
    ProcessorIntent, SessionId,
};
use tutorbook::domain::ports::{
    AuthApi, BookingApi, ConfigSource, Notification, Notifier, PaymentProcessor, TutorDirectory,
};
use tutorbook::domain::tutor::{TutorId, TutorSummary};
use tutorbook::error::{BookingError, Result};

pub const SECRET: &str = "pi_test_secret_abc";

pub fn tutor(id: i64, rate: &str) -> TutorSummary {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": format!("Tutor {id}"),
        "bio": "Patient and thorough",
        "hourly_rate": rate,
        "subjects": ["Math", "Physics"],
        "avg_rating": "4.5",
        "review_count": 3,
        "email": format!("tutor{id}@example.com")
    }))
    .unwrap()
}

pub fn session() -> AuthSession {
    AuthSession {
        token: AuthToken::new("test-token"),
        user: UserProfile {
            id: 1.into(),
            name: "Sam Student".into(),
            email: "sam@example.com".into(),
            role: Role::Student,
        },
    }
}

/// A complete draft for tutor 1: Math, 2026-10-20 14:00 UTC, one hour.
pub fn draft() -> BookingDraft {
    let mut draft = BookingDraft::new(TutorId(1), dec!(40)).unwrap();
    draft.subject = Some("Math".into());
    draft.session_start = Some(Utc.with_ymd_and_hms(2026, 10, 20, 14, 0, 0).unwrap());
    draft
}

pub fn intent_created() -> IntentCreated {
    IntentCreated {
        client_secret: ClientSecret::new(SECRET),
        session_id: SessionId("77".into()),
    }
}

pub fn succeeded() -> ProcessorIntent {
    ProcessorIntent {
        id: "pi_test".into(),
        status: "succeeded".into(),
    }
}

/// Booking API with scripted answers. An empty script answers with success.
/// Every call yields once before answering, like a real request would.
/// With a gate, every call waits for a permit instead.
#[derive(Default)]
pub struct FakeBookingApi {
    pub intents: Mutex<VecDeque<Result<IntentCreated>>>,
    pub confirmations: Mutex<VecDeque<Result<BookingConfirmation>>>,
    pub intent_calls: AtomicUsize,
    pub confirm_calls: AtomicUsize,
    pub last_request: Mutex<Option<CreateIntentRequest>>,
    pub last_confirmed: Mutex<Option<(SessionId, String)>>,
    pub gate: Option<Arc<Notify>>,
}

impl FakeBookingApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(gate),
            ..Self::default()
        })
    }

    async fn answer_later(&self) {
        match &self.gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }
    }

    pub fn push_intent(&self, result: Result<IntentCreated>) {
        self.intents.lock().unwrap().push_back(result);
    }

    pub fn push_confirmation(&self, result: Result<BookingConfirmation>) {
        self.confirmations.lock().unwrap().push_back(result);
    }

    pub fn intent_calls(&self) -> usize {
        self.intent_calls.load(Ordering::SeqCst)
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookingApi for FakeBookingApi {
    async fn create_payment_intent(
        &self,
        request: &CreateIntentRequest,
        _token: &AuthToken,
    ) -> Result<IntentCreated> {
        self.intent_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.answer_later().await;
        let next = self.intents.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(intent_created()))
    }

    async fn confirm_payment(
        &self,
        session_id: &SessionId,
        payment_intent_id: &str,
        _token: &AuthToken,
    ) -> Result<BookingConfirmation> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_confirmed.lock().unwrap() =
            Some((session_id.clone(), payment_intent_id.to_string()));
        self.answer_later().await;
        let next = self.confirmations.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(BookingConfirmation(
                serde_json::json!({"id": session_id.0, "status": "confirmed"}),
            ))
        })
    }
}

/// Processor with scripted confirmation results. With a gate, `confirm`
/// waits for `release` before answering.
#[derive(Default)]
pub struct FakeProcessor {
    pub results: Mutex<VecDeque<Result<ProcessorIntent>>>,
    pub mount_calls: AtomicUsize,
    pub confirm_calls: AtomicUsize,
    pub seen_elements: Mutex<Vec<PaymentElement>>,
    pub gate: Option<Arc<Notify>>,
}

impl FakeProcessor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(gate),
            ..Self::default()
        })
    }

    pub fn push(&self, result: Result<ProcessorIntent>) {
        self.results.lock().unwrap().push_back(result);
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn mount_calls(&self) -> usize {
        self.mount_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    fn mount(&self, client_secret: &ClientSecret) -> Result<PaymentElement> {
        self.mount_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentElement::new(client_secret.clone()))
    }

    async fn confirm(
        &self,
        element: &PaymentElement,
        _return_url: &str,
    ) -> Result<ProcessorIntent> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_elements.lock().unwrap().push(element.clone());
        match &self.gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }
        let next = self.results.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(succeeded()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Directory backed by a fixed list.
pub struct FakeDirectory {
    pub tutors: Mutex<Result<Vec<TutorSummary>>>,
    pub list_calls: AtomicUsize,
}

impl FakeDirectory {
    pub fn new(tutors: Vec<TutorSummary>) -> Arc<Self> {
        Arc::new(Self {
            tutors: Mutex::new(Ok(tutors)),
            list_calls: AtomicUsize::new(0),
        })
    }

    pub fn fail_with(&self, err: BookingError) {
        *self.tutors.lock().unwrap() = Err(err);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TutorDirectory for FakeDirectory {
    async fn list_tutors(&self, _token: &AuthToken) -> Result<Vec<TutorSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.tutors.lock().unwrap().clone()
    }

    async fn get_tutor(&self, id: TutorId, _token: &AuthToken) -> Result<TutorSummary> {
        let tutors = self.tutors.lock().unwrap().clone()?;
        tutors
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| BookingError::NotFound(format!("tutor {id}")))
    }
}

/// Accepts any email with the password `secret`.
#[derive(Default)]
pub struct FakeAuth;

#[async_trait]
impl AuthApi for FakeAuth {
    async fn login(&self, request: &LoginRequest) -> Result<AuthSession> {
        if request.password != "secret" {
            return Err(BookingError::Unauthorized);
        }
        let mut session = session();
        session.user.email = request.email.clone();
        Ok(session)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthSession> {
        let mut session = session();
        session.user.name = request.name.clone();
        session.user.email = request.email.clone();
        session.user.role = request.role;
        Ok(session)
    }
}

/// Serves a publishable key, or fails when `available` is false.
pub struct FakeConfigSource {
    pub available: bool,
}

#[async_trait]
impl ConfigSource for FakeConfigSource {
    async fn processor_config(&self) -> Result<ProcessorConfig> {
        if self.available {
            Ok(ProcessorConfig {
                publishable_key: "pk_test_1".into(),
            })
        } else {
            Err(BookingError::Network("connection refused".into()))
        }
    }
}

pub fn orchestrator(
    api: Arc<FakeBookingApi>,
    processor: Arc<FakeProcessor>,
    notifier: Arc<RecordingNotifier>,
) -> PaymentOrchestrator {
    PaymentOrchestrator::new(
        api,
        processor,
        notifier,
        AuthToken::new("test-token"),
        "http://localhost/return",
    )
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
