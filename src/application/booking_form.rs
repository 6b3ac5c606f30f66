use crate::domain::booking::{BookingDraft, SessionLength, display_amount, session_price};
use crate::domain::tutor::TutorSummary;
use crate::error::{BookingError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// What the payment summary panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSummary {
    pub hourly_rate: String,
    pub duration: String,
    pub total: String,
}

/// Controller behind the booking form of one dialog.
///
/// Date and time are entered as local wall-clock values and turned into a UTC
/// instant with the user's offset.
#[derive(Debug, Clone)]
pub struct BookingForm {
    tutor: TutorSummary,
    draft: BookingDraft,
    offset: FixedOffset,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
}

impl BookingForm {
    /// Fails when the tutor's rate cannot be priced.
    pub fn new(tutor: TutorSummary, offset: FixedOffset) -> Result<Self> {
        let draft = BookingDraft::new(tutor.id, tutor.hourly_rate)?;
        Ok(Self {
            tutor,
            draft,
            offset,
            date: None,
            time: None,
        })
    }

    pub fn tutor(&self) -> &TutorSummary {
        &self.tutor
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// An empty string clears the selection.
    pub fn set_subject(&mut self, subject: &str) {
        let subject = subject.trim();
        self.draft.subject = (!subject.is_empty()).then(|| subject.to_string());
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = Some(date);
        self.refresh_start();
    }

    pub fn set_time(&mut self, time: NaiveTime) {
        self.time = Some(time);
        self.refresh_start();
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.draft.notes = notes.to_string();
    }

    /// Changes the session length and recomputes the total.
    pub fn set_duration(&mut self, minutes: u32) -> Result<()> {
        let length = SessionLength::try_from(minutes)?;
        let total = session_price(self.tutor.hourly_rate, length)?;
        self.draft.duration = length;
        self.draft.computed_total = total;
        Ok(())
    }

    pub fn summary(&self) -> PaymentSummary {
        PaymentSummary {
            hourly_rate: display_amount(self.tutor.hourly_rate),
            duration: self.draft.duration.to_string(),
            total: display_amount(self.draft.computed_total),
        }
    }

    /// Earliest selectable date: today in the user's offset.
    pub fn min_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// Checks the draft before anything is sent.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        let subject = self
            .draft
            .subject
            .as_deref()
            .ok_or_else(|| BookingError::Validation("Please select a subject".into()))?;
        if !self.tutor.teaches(subject) {
            return Err(BookingError::Validation(format!(
                "{} does not teach {subject}",
                self.tutor.name
            )));
        }

        let date = self
            .date
            .ok_or_else(|| BookingError::Validation("Please pick a date".into()))?;
        if self.time.is_none() {
            return Err(BookingError::Validation("Please pick a time".into()));
        }
        if date < self.min_date(now) {
            return Err(BookingError::Validation(
                "The session date cannot be in the past".into(),
            ));
        }

        Ok(())
    }

    fn refresh_start(&mut self) {
        self.draft.session_start = match (self.date, self.time) {
            (Some(date), Some(time)) => self
                .offset
                .from_local_datetime(&NaiveDateTime::new(date, time))
                .single()
                .map(|local| local.with_timezone(&Utc)),
            _ => None,
        };
    }
}
