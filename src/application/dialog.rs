use super::booking_form::BookingForm;
use super::orchestrator::{PaymentOrchestrator, SubmitOutcome};
use crate::domain::payment::BookingState;
use crate::domain::ports::{Notification, NotifierRef};
use crate::error::{BookingError, Result};
use chrono::{DateTime, Utc};

/// One open booking dialog: the form for a tutor plus the orchestrator that
/// owns its payment attempt.
pub struct BookingDialog {
    form: BookingForm,
    orchestrator: PaymentOrchestrator,
    notifier: NotifierRef,
}

impl BookingDialog {
    pub fn new(form: BookingForm, orchestrator: PaymentOrchestrator, notifier: NotifierRef) -> Self {
        Self {
            form,
            orchestrator,
            notifier,
        }
    }

    pub fn form(&self) -> &BookingForm {
        &self.form
    }

    /// Form fields stay editable until the intent is requested: the intent
    /// is priced from the fields as they were at that point.
    pub fn form_mut(&mut self) -> Result<&mut BookingForm> {
        if self.orchestrator.state() != BookingState::Idle {
            return Err(BookingError::Validation(
                "booking details cannot change once payment has started".into(),
            ));
        }
        Ok(&mut self.form)
    }

    pub fn orchestrator(&self) -> &PaymentOrchestrator {
        &self.orchestrator
    }

    pub async fn submit(&self) -> SubmitOutcome {
        self.submit_at(Utc::now()).await
    }

    /// Submit handler. The form is validated only before the intent exists;
    /// later submissions act on the intent already created.
    pub async fn submit_at(&self, now: DateTime<Utc>) -> SubmitOutcome {
        if self.orchestrator.state() == BookingState::Idle
            && let Err(err) = self.form.validate(now)
        {
            self.notifier.notify(Notification::error(err.to_string()));
            return SubmitOutcome::Rejected(err);
        }
        self.orchestrator.submit(self.form.draft()).await
    }

    /// Closes the dialog and reports whether it ended with a booking.
    pub fn close(self) -> bool {
        self.orchestrator.close() == BookingState::Succeeded
    }
}
