use crate::application::booking_form::PaymentSummary;
use crate::domain::booking::display_amount;
use crate::domain::ports::{Notification, NotificationLevel, Notifier};
use crate::domain::tutor::TutorSummary;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::Mutex;

pub const EMPTY_DIRECTORY: &str = "No tutors available at the moment.";

/// Prints notifications as single lines on a terminal stream.
pub struct ConsoleNotifier<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleNotifier<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> Notifier for ConsoleNotifier<W> {
    fn notify(&self, notification: Notification) {
        let tag = match notification.level {
            NotificationLevel::Success => "[ok]",
            NotificationLevel::Error => "[error]",
            NotificationLevel::ChargeUnconfirmed => "[payment unconfirmed]",
        };
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // A closed terminal is not worth failing the booking over.
        let _ = writeln!(out, "{tag} {}", notification.message);
    }
}

/// One tutor card as plain text.
pub fn render_tutor(tutor: &TutorSummary) -> String {
    let stars = usize::from(tutor.stars());
    let mut card = String::new();
    let _ = writeln!(
        card,
        "#{} {}  {}{} {} ({} reviews)  {}/hr",
        tutor.id,
        tutor.name,
        "★".repeat(stars),
        "☆".repeat(5 - stars),
        tutor.rating_label(),
        tutor.review_count,
        display_amount(tutor.hourly_rate),
    );
    let _ = writeln!(
        card,
        "    {}",
        tutor.bio.as_deref().unwrap_or("No bio available")
    );
    if !tutor.subjects.is_empty() {
        let subjects: Vec<&str> = tutor.subjects.iter().map(String::as_str).collect();
        let _ = writeln!(card, "    Subjects: {}", subjects.join(", "));
    }
    let _ = writeln!(card, "    Email: {}", tutor.email);
    card
}

/// The whole directory, or the empty-state message.
pub fn render_directory(tutors: &[TutorSummary]) -> String {
    if tutors.is_empty() {
        return format!("{EMPTY_DIRECTORY}\n");
    }
    tutors.iter().map(render_tutor).collect()
}

pub fn render_summary(summary: &PaymentSummary) -> String {
    format!(
        "Payment Summary\n  Hourly Rate: {}\n  Duration:    {}\n  Total:       {}\n",
        summary.hourly_rate, summary.duration, summary.total
    )
}
