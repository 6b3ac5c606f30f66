use super::booking_form::BookingForm;
use super::dialog::BookingDialog;
use super::orchestrator::{PaymentOrchestrator, SubmitOutcome};
use crate::config::ClientConfig;
use crate::domain::auth::{AuthSession, LoginRequest, RegisterRequest, UserProfile};
use crate::domain::payment::ProcessorConfig;
use crate::domain::ports::{
    AuthApi, BookingApiRef, ConfigSource, CredentialStoreBox, Notification, NotifierRef,
    PaymentProcessorRef, TutorDirectoryRef,
};
use crate::domain::tutor::{TutorId, TutorSummary};
use crate::error::{BookingError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Builds the payment processor once its public configuration is known.
pub type ProcessorFactory =
    Box<dyn Fn(ProcessorConfig) -> Result<PaymentProcessorRef> + Send + Sync>;

/// The remote services the context talks to.
#[derive(Clone)]
pub struct Services {
    pub directory: TutorDirectoryRef,
    pub booking: BookingApiRef,
    pub auth: Arc<dyn AuthApi>,
    pub config: Arc<dyn ConfigSource>,
}

/// Application context: the current user, the remote services and the
/// payment processor.
///
/// Created at startup, populated at login, emptied at logout. Components get
/// what they need from here instead of reading global state.
pub struct AppContext {
    config: ClientConfig,
    services: Services,
    credentials: CredentialStoreBox,
    notifier: NotifierRef,
    processor_factory: ProcessorFactory,
    processor: Option<PaymentProcessorRef>,
    session: Option<AuthSession>,
}

impl AppContext {
    pub fn new(
        config: ClientConfig,
        services: Services,
        credentials: CredentialStoreBox,
        notifier: NotifierRef,
        processor_factory: ProcessorFactory,
    ) -> Self {
        Self {
            config,
            services,
            credentials,
            notifier,
            processor_factory,
            processor: None,
            session: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Restores a persisted login and loads the processor configuration.
    ///
    /// Neither step is fatal: a broken credential file means "logged out",
    /// and a missing processor only disables booking.
    pub async fn startup(&mut self) {
        self.restore_login().await;
        self.load_processor().await;
    }

    pub async fn restore_login(&mut self) {
        match self.credentials.load().await {
            Ok(session) => self.session = session,
            Err(err) => warn!(%err, "could not restore saved login"),
        }
    }

    pub async fn load_processor(&mut self) {
        let processor = self
            .services
            .config
            .processor_config()
            .await
            .and_then(|config| (self.processor_factory)(config));
        match processor {
            Ok(processor) => self.processor = Some(processor),
            Err(err) => warn!(%err, "payment processor unavailable"),
        }
    }

    pub fn current_user(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn processor_ready(&self) -> bool {
        self.processor.is_some()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<&UserProfile> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session = self.services.auth.login(&request).await?;
        self.start_session(session, "Login successful!").await
    }

    pub async fn register(&mut self, request: &RegisterRequest) -> Result<&UserProfile> {
        let session = self.services.auth.register(request).await?;
        self.start_session(session, "Account created successfully!").await
    }

    /// Forgets the current user, in memory and on disk.
    pub async fn logout(&mut self) -> Result<()> {
        self.session = None;
        self.credentials.clear().await?;
        self.notifier
            .notify(Notification::success("Logged out successfully"));
        Ok(())
    }

    pub async fn list_tutors(&mut self) -> Result<Vec<TutorSummary>> {
        let session = self.session.as_ref().ok_or(BookingError::NotLoggedIn)?;
        let result = self.services.directory.list_tutors(&session.token).await;
        self.expire_on_unauthorized(result).await
    }

    pub async fn get_tutor(&mut self, id: TutorId) -> Result<TutorSummary> {
        let session = self.session.as_ref().ok_or(BookingError::NotLoggedIn)?;
        let result = self.services.directory.get_tutor(id, &session.token).await;
        self.expire_on_unauthorized(result).await
    }

    /// Opens a booking dialog for a tutor, starting from a fresh form and an
    /// idle payment state.
    pub async fn open_booking(&mut self, id: TutorId) -> Result<BookingDialog> {
        let tutor = self.get_tutor(id).await.inspect_err(|err| {
            self.notifier.notify(Notification::error(format!(
                "Error loading tutor details: {err}"
            )))
        })?;
        let processor = self.processor.clone().ok_or_else(|| {
            BookingError::Config("payment processor is not available".into())
        })?;
        let token = self
            .session
            .as_ref()
            .map(|s| s.token.clone())
            .ok_or(BookingError::NotLoggedIn)?;

        let orchestrator = PaymentOrchestrator::new(
            self.services.booking.clone(),
            processor,
            self.notifier.clone(),
            token,
            self.config.return_url.clone(),
        );
        let form = BookingForm::new(tutor, self.config.utc_offset).inspect_err(|err| {
            self.notifier
                .notify(Notification::error(format!("Cannot book this tutor: {err}")))
        })?;
        Ok(BookingDialog::new(form, orchestrator, self.notifier.clone()))
    }

    /// Submits an open dialog. A token the backend rejected during the
    /// booking ends the login, as on every other 401.
    pub async fn submit_booking(&mut self, dialog: &BookingDialog) -> SubmitOutcome {
        self.submit_booking_at(dialog, Utc::now()).await
    }

    pub async fn submit_booking_at(
        &mut self,
        dialog: &BookingDialog,
        now: DateTime<Utc>,
    ) -> SubmitOutcome {
        let outcome = dialog.submit_at(now).await;
        if dialog.orchestrator().token_rejected() && self.session.is_some() {
            warn!("token rejected during booking, logging out");
            self.expire_session().await;
        }
        outcome
    }

    /// Closes a dialog. After a completed booking the directory is reloaded
    /// and returned.
    pub async fn close_booking(
        &mut self,
        dialog: BookingDialog,
    ) -> Result<Option<Vec<TutorSummary>>> {
        if dialog.close() {
            return self.list_tutors().await.map(Some);
        }
        Ok(None)
    }

    async fn start_session(&mut self, session: AuthSession, message: &str) -> Result<&UserProfile> {
        self.credentials.save(&session).await?;
        info!(user = %session.user.email, role = %session.user.role, "logged in");
        self.notifier.notify(Notification::success(message));
        Ok(&self.session.insert(session).user)
    }

    async fn expire_on_unauthorized<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(BookingError::Unauthorized) = result {
            warn!("token rejected, logging out");
            self.expire_session().await;
        }
        result
    }

    async fn expire_session(&mut self) {
        self.session = None;
        if let Err(err) = self.credentials.clear().await {
            warn!(%err, "could not clear saved login");
        }
    }
}
