use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque token that authorizes completing one specific payment intent.
///
/// `Debug` is redacted so secrets never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The processor-side intent id: everything before `_secret_`.
    pub fn intent_id(&self) -> &str {
        self.0
            .split_once("_secret_")
            .map_or(self.0.as_str(), |(id, _)| id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientSecret({}_secret_***)", self.intent_id())
    }
}

/// Server-side booking session id. The API serves it as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Success payload of the intent-creation call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentCreated {
    pub client_secret: ClientSecret,
    pub session_id: SessionId,
}

/// Body of `POST /sessions/{id}/confirm-payment`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
}

/// The booking record returned by reconciliation. Its shape belongs to the
/// backend, so it is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct BookingConfirmation(pub serde_json::Value);

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorConfig {
    pub publishable_key: String,
}

/// What the processor reports back after a confirmation attempt.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessorIntent {
    pub id: String,
    pub status: String,
}

impl ProcessorIntent {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

/// Payment UI bound to one client secret.
///
/// Created by the processor at mount time and kept across failed
/// confirmation attempts so the same intent can be retried.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentElement {
    pub client_secret: ClientSecret,
    pub payment_method: Option<String>,
}

impl PaymentElement {
    pub fn new(client_secret: ClientSecret) -> Self {
        Self {
            client_secret,
            payment_method: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentStatus {
    #[default]
    Uninitialized,
    IntentCreated,
    Confirming,
    Succeeded,
    Failed,
}

/// The one payment attempt of an open booking dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSession {
    pub session_id: SessionId,
    pub client_secret: ClientSecret,
    pub status: PaymentStatus,
    pub element: PaymentElement,
    /// Intent id the processor already confirmed but the backend has not
    /// recorded yet. Set only after a reconciliation call failed in transit.
    pub pending_reconciliation: Option<String>,
}

impl PaymentSession {
    pub fn new(created: IntentCreated, element: PaymentElement) -> Self {
        Self {
            session_id: created.session_id,
            client_secret: created.client_secret,
            status: PaymentStatus::IntentCreated,
            element,
            pending_reconciliation: None,
        }
    }
}

/// States of the booking state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingState {
    #[default]
    Idle,
    IntentRequested,
    AwaitingPaymentDetails,
    Confirming,
    Succeeded,
    Failed,
}

impl BookingState {
    /// States in which a client secret must be held.
    pub fn holds_secret(self) -> bool {
        matches!(
            self,
            Self::AwaitingPaymentDetails | Self::Confirming | Self::Succeeded
        )
    }
}
