//! Date windows for the release calendar.

use chrono::{Days, Local, NaiveDate};

use crate::config::MAX_WINDOW_DAYS;
use crate::springio::error::{SpringIoError, SpringIoResult};

/// An inclusive range of calendar days sent to the calendar API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarWindow {
    /// First day of the window.
    pub start: NaiveDate,
    /// Last day of the window.
    pub end: NaiveDate,
}

impl CalendarWindow {
    /// Builds the window `[start, start + days]`.
    ///
    /// Days are calendar days, so the result does not depend on time zone
    /// offsets or daylight saving transitions.
    ///
    /// # Errors
    ///
    /// Returns [`SpringIoError::InvalidArgument`] if `days` is zero, above
    /// the configured maximum, or the end date overflows.
    pub fn starting_at(start: NaiveDate, days: u32) -> SpringIoResult<Self> {
        if days == 0 || days > MAX_WINDOW_DAYS {
            return Err(SpringIoError::invalid_argument(
                "windowDays",
                format!("must be between 1 and {MAX_WINDOW_DAYS}, got {days}"),
            ));
        }

        let end = start
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| {
                SpringIoError::invalid_argument("windowDays", "window end is out of range")
            })?;

        Ok(Self { start, end })
    }

    /// Builds a window starting at today's local date.
    ///
    /// # Errors
    ///
    /// See [`CalendarWindow::starting_at`].
    pub fn from_today(days: u32) -> SpringIoResult<Self> {
        Self::starting_at(Local::now().date_naive(), days)
    }

    /// Query parameters in `YYYY-MM-DD` form.
    #[must_use]
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("start", self.start.format("%Y-%m-%d").to_string()),
            ("end", self.end.format("%Y-%m-%d").to_string()),
        ]
    }
}
