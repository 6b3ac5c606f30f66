use super::tutor::TutorId;
use crate::error::{BookingError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Serialize, Serializer};
use std::fmt;

/// The session lengths a tutor can be booked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionLength {
    HalfHour,
    #[default]
    OneHour,
    NinetyMinutes,
    TwoHours,
}

impl SessionLength {
    pub const ALL: [SessionLength; 4] = [
        Self::HalfHour,
        Self::OneHour,
        Self::NinetyMinutes,
        Self::TwoHours,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            Self::HalfHour => 30,
            Self::OneHour => 60,
            Self::NinetyMinutes => 90,
            Self::TwoHours => 120,
        }
    }
}

impl TryFrom<u32> for SessionLength {
    type Error = BookingError;

    fn try_from(minutes: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|len| len.minutes() == minutes)
            .ok_or_else(|| {
                BookingError::Validation(format!(
                    "duration must be 30, 60, 90 or 120 minutes, got {minutes}"
                ))
            })
    }
}

impl fmt::Display for SessionLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minutes", self.minutes())
    }
}

impl Serialize for SessionLength {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.minutes())
    }
}

/// Exact advisory price of a session: `hourly_rate * minutes / 60`.
///
/// Every allowed length is a multiple of half an hour, so the division is
/// exact in decimal arithmetic. A rate too large to multiply is rejected.
pub fn session_price(hourly_rate: Decimal, length: SessionLength) -> Result<Decimal> {
    hourly_rate
        .checked_mul(Decimal::from(length.minutes()))
        .and_then(|total| total.checked_div(dec!(60)))
        .ok_or_else(|| {
            BookingError::Validation(format!(
                "hourly rate {hourly_rate} is out of range for a {length} session"
            ))
        })
}

/// Formats an amount the way the payment summary shows it: `$60.00`.
pub fn display_amount(amount: Decimal) -> String {
    format!("${}", fixed_point(amount, 2))
}

/// Rounds half away from zero and always prints exactly `dp` decimals.
pub fn fixed_point(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded.to_string()
}

/// Form state of an open booking dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub tutor_id: TutorId,
    pub subject: Option<String>,
    pub session_start: Option<DateTime<Utc>>,
    pub duration: SessionLength,
    pub notes: String,
    pub computed_total: Decimal,
}

impl BookingDraft {
    pub fn new(tutor_id: TutorId, hourly_rate: Decimal) -> Result<Self> {
        let duration = SessionLength::default();
        Ok(Self {
            tutor_id,
            subject: None,
            session_start: None,
            duration,
            notes: String::new(),
            computed_total: session_price(hourly_rate, duration)?,
        })
    }

    /// Shapes the draft into the intent-creation request body.
    pub fn to_intent_request(&self) -> Result<CreateIntentRequest> {
        let subject = self
            .subject
            .clone()
            .ok_or_else(|| BookingError::Validation("a subject is required".into()))?;
        let session_date = self
            .session_start
            .ok_or_else(|| BookingError::Validation("a date and time are required".into()))?;

        Ok(CreateIntentRequest {
            tutor_id: self.tutor_id,
            subject,
            session_date,
            duration: self.duration,
            notes: self.notes.clone(),
        })
    }
}

/// Body of `POST /sessions/create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub tutor_id: TutorId,
    pub subject: String,
    #[serde(serialize_with = "iso_millis")]
    pub session_date: DateTime<Utc>,
    pub duration: SessionLength,
    pub notes: String,
}

fn iso_millis<S: Serializer>(
    instant: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}
