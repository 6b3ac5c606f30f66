use super::auth::{AuthSession, AuthToken, LoginRequest, RegisterRequest};
use super::booking::CreateIntentRequest;
use super::payment::{
    BookingConfirmation, ClientSecret, IntentCreated, PaymentElement, ProcessorConfig,
    ProcessorIntent, SessionId,
};
use super::tutor::{TutorId, TutorSummary};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait TutorDirectory: Send + Sync {
    async fn list_tutors(&self, token: &AuthToken) -> Result<Vec<TutorSummary>>;
    async fn get_tutor(&self, id: TutorId, token: &AuthToken) -> Result<TutorSummary>;
}

#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: &CreateIntentRequest,
        token: &AuthToken,
    ) -> Result<IntentCreated>;

    /// Reconciliation: links a processor-confirmed payment to the booking.
    async fn confirm_payment(
        &self,
        session_id: &SessionId,
        payment_intent_id: &str,
        token: &AuthToken,
    ) -> Result<BookingConfirmation>;
}

#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn processor_config(&self) -> Result<ProcessorConfig>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthSession>;
    async fn register(&self, request: &RegisterRequest) -> Result<AuthSession>;
}

/// The third-party payment processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Initializes the payment UI for an intent. Local only, no network.
    fn mount(&self, client_secret: &ClientSecret) -> Result<PaymentElement>;

    /// Confirms the payment collected by `element`. Processor-side failures
    /// come back as `BookingError::Processor` carrying the processor message.
    async fn confirm(&self, element: &PaymentElement, return_url: &str)
    -> Result<ProcessorIntent>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn save(&self, session: &AuthSession) -> Result<()>;
    async fn load(&self) -> Result<Option<AuthSession>>;
    async fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    /// A charge may have happened but the booking is not confirmed.
    ChargeUnconfirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Where user-visible outcomes go.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub type TutorDirectoryRef = Arc<dyn TutorDirectory>;
pub type BookingApiRef = Arc<dyn BookingApi>;
pub type PaymentProcessorRef = Arc<dyn PaymentProcessor>;
pub type NotifierRef = Arc<dyn Notifier>;
pub type CredentialStoreBox = Box<dyn CredentialStore>;
