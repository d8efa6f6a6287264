//! Schedule slot parsing and overlap detection.
//!
//! A schedule slot is a recurring weekly time window expressed as
//! "Weekday HH:MM" (e.g. "Lunes 20:00"); the window's length comes from the
//! activity's fixed duration in minutes. Two reservations of the same user
//! conflict when their windows intersect on the same weekday.
//!
//! Malformed slot strings fail closed: a slot that cannot be parsed is a
//! validation error, never silently skipped.

use crate::error::AdmissionError;

/// A parsed schedule slot: normalized weekday plus minutes since midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    /// Weekday, lowercased with Spanish accents stripped ("miércoles" → "miercoles").
    pub day: String,
    /// Slot start in minutes since midnight (e.g. "20:00" → 1200).
    pub start: u32,
}

impl ScheduleSlot {
    /// Parse a "Weekday HH:MM" slot string.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::Validation`] when the string is not exactly
    /// a weekday followed by a `HH:MM` time, or the time is out of range.
    pub fn parse(schedule: &str) -> Result<Self, AdmissionError> {
        let mut parts = schedule.split_whitespace();
        let (Some(day), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AdmissionError::Validation(format!(
                "invalid schedule format: '{schedule}'"
            )));
        };

        let Some((hour, minute)) = time.split_once(':') else {
            return Err(AdmissionError::Validation(format!(
                "invalid time format: '{time}'"
            )));
        };

        let hour: u32 = hour
            .parse()
            .map_err(|_| AdmissionError::Validation(format!("invalid hour: '{hour}'")))?;
        let minute: u32 = minute
            .parse()
            .map_err(|_| AdmissionError::Validation(format!("invalid minute: '{minute}'")))?;

        if hour >= 24 || minute >= 60 {
            return Err(AdmissionError::Validation(format!(
                "time out of range: '{time}'"
            )));
        }

        Ok(Self {
            day: normalize_day(day),
            start: hour * 60 + minute,
        })
    }

    /// End of the window, given the activity's duration in minutes.
    #[must_use]
    pub const fn end(&self, duration: u32) -> u32 {
        self.start + duration
    }

    /// Whether two windows intersect on the same weekday.
    ///
    /// Each side brings its own activity duration. Windows are half-open
    /// `[start, start + duration)`, so back-to-back slots do not overlap.
    #[must_use]
    pub fn overlaps(&self, duration: u32, other: &Self, other_duration: u32) -> bool {
        if self.day != other.day {
            return false;
        }
        self.start < other.end(other_duration) && other.start < self.end(duration)
    }
}

/// Normalize a weekday for comparison: lowercase, Spanish accents stripped.
fn normalize_day(day: &str) -> String {
    day.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        })
        .collect()
}
