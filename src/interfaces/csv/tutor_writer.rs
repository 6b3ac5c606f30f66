use crate::domain::booking::fixed_point;
use crate::domain::tutor::TutorSummary;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct TutorRow<'a> {
    id: i64,
    name: &'a str,
    email: &'a str,
    hourly_rate: String,
    subjects: String,
    avg_rating: String,
    review_count: u32,
}

/// Writes the tutor directory as CSV, one tutor per row.
pub struct TutorWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TutorWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Subjects are joined with `;` so each tutor stays on one row.
    pub fn write_tutors<'a>(
        &mut self,
        tutors: impl IntoIterator<Item = &'a TutorSummary>,
    ) -> Result<()> {
        for tutor in tutors {
            self.writer.serialize(TutorRow {
                id: tutor.id.0,
                name: &tutor.name,
                email: &tutor.email,
                hourly_rate: fixed_point(tutor.hourly_rate, 2),
                subjects: tutor
                    .subjects
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(";"),
                avg_rating: tutor
                    .avg_rating
                    .map(|r| fixed_point(r, 1))
                    .unwrap_or_default(),
                review_count: tutor.review_count,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
