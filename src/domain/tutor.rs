use super::booking::fixed_point;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TutorId(pub i64);

impl fmt::Display for TutorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only snapshot of a tutor as served by the directory endpoints.
///
/// The backend serves rows straight from SQL, so numeric columns may arrive
/// as strings and optional columns as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorSummary {
    pub id: TutorId,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    pub hourly_rate: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subjects: BTreeSet<String>,
    #[serde(default)]
    pub avg_rating: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub review_count: u32,
    pub email: String,
}

impl TutorSummary {
    pub fn teaches(&self, subject: &str) -> bool {
        self.subjects.contains(subject)
    }

    /// Average rating rounded to whole stars, clamped to 0..=5.
    pub fn stars(&self) -> u8 {
        self.avg_rating
            .and_then(|r| {
                r.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .to_u8()
            })
            .map_or(0, |s| s.min(5))
    }

    /// `"4.5"` for rated tutors, `"New"` otherwise.
    pub fn rating_label(&self) -> String {
        match self.avg_rating {
            Some(r) if !r.is_zero() => fixed_point(r, 1),
            _ => "New".to_string(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Count::Number(n)) => Ok(n),
        Some(Count::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
