use crate::domain::auth::AuthToken;
use crate::domain::booking::{BookingDraft, CreateIntentRequest};
use crate::domain::payment::{
    BookingConfirmation, BookingState, PaymentElement, PaymentSession, PaymentStatus, SessionId,
};
use crate::domain::ports::{
    BookingApiRef, Notification, NotificationLevel, NotifierRef, PaymentProcessorRef,
};
use crate::error::{BookingError, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Result of one submit command.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The submit control was disabled; nothing was sent.
    Ignored,
    /// The intent exists and the payment UI is mounted.
    PaymentDetailsRequired,
    Booked(BookingConfirmation),
    /// The step failed. The error was already sent to the notifier.
    Rejected(BookingError),
    /// The dialog was closed while the call was in flight; its response was dropped.
    Discarded,
}

/// Typed view-model binding for the dialog's submit area.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingView {
    pub state: BookingState,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    pub payment_mounted: bool,
    pub has_client_secret: bool,
    pub session_id: Option<SessionId>,
}

#[derive(Default)]
struct Inner {
    state: BookingState,
    session: Option<PaymentSession>,
    generation: u64,
    token_rejected: bool,
}

enum Step {
    CreateIntent(CreateIntentRequest),
    Confirm(PaymentElement, SessionId),
    Reconcile(SessionId, String),
}

/// Owns the booking state machine and the payment session of one dialog.
///
/// Commands take `&self`. The state lock is never held across an `.await`:
/// each network or processor call is stamped with the generation it started
/// in, and its response is dropped if `close` bumped the generation meanwhile.
pub struct PaymentOrchestrator {
    api: BookingApiRef,
    processor: PaymentProcessorRef,
    notifier: NotifierRef,
    token: AuthToken,
    return_url: String,
    inner: Mutex<Inner>,
}

impl PaymentOrchestrator {
    pub fn new(
        api: BookingApiRef,
        processor: PaymentProcessorRef,
        notifier: NotifierRef,
        token: AuthToken,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            api,
            processor,
            notifier,
            token,
            return_url: return_url.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn state(&self) -> BookingState {
        self.lock().state
    }

    /// Whether the backend answered any call of this dialog with a 401.
    ///
    /// Set even when the error reached the user wrapped in another variant,
    /// as after a refused reconciliation.
    pub fn token_rejected(&self) -> bool {
        self.lock().token_rejected
    }

    pub fn view(&self) -> BookingView {
        let inner = self.lock();
        let session = inner.session.as_ref();
        let (submit_enabled, submit_label) = match inner.state {
            BookingState::Idle => (true, "Continue to Payment"),
            BookingState::IntentRequested => (false, "Processing..."),
            BookingState::AwaitingPaymentDetails => (true, "Complete Payment"),
            BookingState::Confirming => (false, "Processing Payment..."),
            BookingState::Succeeded => (false, "Booked"),
            BookingState::Failed => (false, "Payment Unconfirmed"),
        };

        BookingView {
            state: inner.state,
            submit_enabled,
            submit_label,
            payment_mounted: session.is_some(),
            has_client_secret: session.is_some_and(|s| !s.client_secret.is_empty()),
            session_id: session.map(|s| s.session_id.clone()),
        }
    }

    /// Attaches collected payment details to the mounted payment element.
    pub fn attach_payment_method(&self, payment_method: impl Into<String>) -> Result<()> {
        let mut inner = self.lock();
        if inner.state != BookingState::AwaitingPaymentDetails {
            return Err(BookingError::Validation(
                "payment details can only be entered once the payment form is shown".into(),
            ));
        }
        match inner.session.as_mut() {
            Some(session) => {
                session.element.payment_method = Some(payment_method.into());
                Ok(())
            }
            None => Err(BookingError::Validation("no payment in progress".into())),
        }
    }

    /// The submit command. The first submission creates the payment intent;
    /// the next one confirms the payment and reconciles it with the backend.
    pub async fn submit(&self, draft: &BookingDraft) -> SubmitOutcome {
        let (step, generation) = {
            let mut inner = self.lock();
            let state = inner.state;
            let step = match state {
                BookingState::Idle => match draft.to_intent_request() {
                    Ok(request) => {
                        inner.state = BookingState::IntentRequested;
                        Step::CreateIntent(request)
                    }
                    Err(err) => {
                        drop(inner);
                        return self.reject(err);
                    }
                },
                BookingState::AwaitingPaymentDetails => {
                    let Some(session) = inner.session.as_mut() else {
                        return SubmitOutcome::Ignored;
                    };
                    let step = match session.pending_reconciliation.clone() {
                        Some(intent_id) => Step::Reconcile(session.session_id.clone(), intent_id),
                        None => {
                            session.status = PaymentStatus::Confirming;
                            Step::Confirm(session.element.clone(), session.session_id.clone())
                        }
                    };
                    inner.state = BookingState::Confirming;
                    step
                }
                // A call is in flight or the attempt is over.
                _ => return SubmitOutcome::Ignored,
            };
            (step, inner.generation)
        };

        match step {
            Step::CreateIntent(request) => self.create_intent(request, generation).await,
            Step::Confirm(element, session_id) => {
                self.confirm(element, session_id, generation).await
            }
            Step::Reconcile(session_id, intent_id) => {
                self.reconcile(session_id, intent_id, generation).await
            }
        }
    }

    /// Closes the dialog: releases the payment session and returns to `Idle`.
    ///
    /// Returns the state the dialog was in, so callers can tell a completed
    /// booking from a cancellation.
    pub fn close(&self) -> BookingState {
        let mut inner = self.lock();
        let previous = inner.state;
        inner.generation += 1;
        inner.state = BookingState::Idle;
        inner.session = None;
        debug!(?previous, generation = inner.generation, "booking dialog closed");
        previous
    }

    async fn create_intent(&self, request: CreateIntentRequest, generation: u64) -> SubmitOutcome {
        let result = self.api.create_payment_intent(&request, &self.token).await;

        let mut inner = self.lock();
        inner.token_rejected |= matches!(result, Err(BookingError::Unauthorized));
        if inner.generation != generation {
            debug!("dropping intent response for a closed dialog");
            return SubmitOutcome::Discarded;
        }

        let session = result.and_then(|created| {
            let element = self.processor.mount(&created.client_secret)?;
            Ok(PaymentSession::new(created, element))
        });
        match session {
            Ok(session) => {
                info!(session_id = %session.session_id, tutor_id = %request.tutor_id, "payment intent created");
                inner.session = Some(session);
                inner.state = BookingState::AwaitingPaymentDetails;
                SubmitOutcome::PaymentDetailsRequired
            }
            Err(err) => {
                inner.state = BookingState::Idle;
                drop(inner);
                self.reject(err)
            }
        }
    }

    async fn confirm(
        &self,
        element: PaymentElement,
        session_id: SessionId,
        generation: u64,
    ) -> SubmitOutcome {
        let result = self.processor.confirm(&element, &self.return_url).await;

        {
            let mut inner = self.lock();
            if inner.generation != generation {
                warn!(%session_id, "dropping processor response for a closed dialog");
                return SubmitOutcome::Discarded;
            }

            let failure = match &result {
                Ok(intent) if intent.succeeded() => None,
                Ok(intent) => Some(BookingError::Processor(format!(
                    "Payment was not completed (status: {})",
                    intent.status
                ))),
                Err(err) => Some(err.clone()),
            };
            if let Some(err) = failure {
                // Same intent, same mounted element: the user may try again.
                inner.state = BookingState::AwaitingPaymentDetails;
                if let Some(session) = inner.session.as_mut() {
                    session.status = PaymentStatus::Failed;
                }
                drop(inner);
                return self.reject(err);
            }
        }

        match result {
            Ok(intent) => {
                info!(%session_id, payment_intent = %intent.id, "processor confirmed payment");
                self.reconcile(session_id, intent.id, generation).await
            }
            Err(err) => self.reject(err),
        }
    }

    async fn reconcile(
        &self,
        session_id: SessionId,
        intent_id: String,
        generation: u64,
    ) -> SubmitOutcome {
        let result = self
            .api
            .confirm_payment(&session_id, &intent_id, &self.token)
            .await;

        let mut inner = self.lock();
        inner.token_rejected |= matches!(result, Err(BookingError::Unauthorized));
        if inner.generation != generation {
            warn!(%session_id, payment_intent = %intent_id, "reconciliation settled after the dialog closed");
            return SubmitOutcome::Discarded;
        }

        match result {
            Ok(confirmation) => {
                inner.state = BookingState::Succeeded;
                if let Some(session) = inner.session.as_mut() {
                    session.status = PaymentStatus::Succeeded;
                    session.pending_reconciliation = None;
                }
                drop(inner);
                info!(%session_id, "booking confirmed");
                self.notifier
                    .notify(Notification::success("Session booked successfully!"));
                SubmitOutcome::Booked(confirmation)
            }
            Err(BookingError::Network(msg)) => {
                // The charge went through; retry only the backend call next time.
                error!(%session_id, payment_intent = %intent_id, %msg, "reconciliation did not reach the server");
                inner.state = BookingState::AwaitingPaymentDetails;
                if let Some(session) = inner.session.as_mut() {
                    session.pending_reconciliation = Some(intent_id);
                }
                drop(inner);
                self.reject(BookingError::Reconciliation(msg))
            }
            Err(err) => {
                error!(%session_id, payment_intent = %intent_id, %err, "backend refused the payment confirmation");
                inner.state = BookingState::Failed;
                inner.session = None;
                drop(inner);
                let message = match err {
                    BookingError::Api(msg) | BookingError::NotFound(msg) => msg,
                    other => other.to_string(),
                };
                self.reject(BookingError::Reconciliation(message))
            }
        }
    }

    fn reject(&self, err: BookingError) -> SubmitOutcome {
        let level = match err {
            BookingError::Reconciliation(_) => NotificationLevel::ChargeUnconfirmed,
            _ => NotificationLevel::Error,
        };
        self.notifier.notify(Notification {
            level,
            message: err.to_string(),
        });
        SubmitOutcome::Rejected(err)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
