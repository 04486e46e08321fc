use chrono::NaiveDate;
use thiserror::Error;

/// Raised before any grid is produced when a request cannot be honoured.
///
/// Callers driving the grid from a UI should treat this as a programming
/// error in their configuration rather than something to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
  #[error(
    "week start must be between 0 (Sunday) and 6 (Saturday), got {0}"
  )]
  WeekStartOutOfRange(u8),

  #[error("month count must be at least 1")]
  EmptyMonthCount,

  #[error("week rows must be at least 1")]
  EmptyWeekRows,

  #[error("cannot parse date {input:?} with format {format:?}")]
  UnparseableDate { input: String, format: String },

  #[error(
    "shifting {anchor} by {months} month(s) leaves the supported date range"
  )]
  DateOutOfRange { anchor: NaiveDate, months: i64 }
}
