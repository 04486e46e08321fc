use chrono::NaiveDate;

use crate::error::InvalidInputError;
use crate::grid::{
  self,
  CalendarRequest,
  MonthView
};

/// Picker state held between renders.
///
/// The grid itself is rebuilt from a fresh [`CalendarRequest`] on every
/// step; only the offset lives here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
  reference_date: NaiveDate,
  month_count:    u32,
  week_rows:      u32,
  week_start:     u8,
  offset:         i64
}

impl Navigator {
  #[must_use]
  pub fn new(
    reference_date: NaiveDate,
    month_count: u32,
    week_rows: u32,
    week_start: u8
  ) -> Self {
    Self {
      reference_date,
      month_count,
      week_rows,
      week_start,
      offset: 0
    }
  }

  #[must_use]
  pub fn with_offset(
    mut self,
    offset: i64
  ) -> Self {
    self.offset = offset;
    self
  }

  #[must_use]
  pub fn offset(&self) -> i64 {
    self.offset
  }

  /// Moves the first displayed month forward by one.
  pub fn next(&mut self) {
    self.offset =
      self.offset.saturating_add(1);
    tracing::debug!(
      offset = self.offset,
      "navigated to next month"
    );
  }

  /// Moves the first displayed month back by one.
  pub fn prev(&mut self) {
    self.offset =
      self.offset.saturating_sub(1);
    tracing::debug!(
      offset = self.offset,
      "navigated to previous month"
    );
  }

  #[must_use]
  pub fn request(
    &self,
    today: NaiveDate
  ) -> CalendarRequest {
    CalendarRequest {
      reference_date: self.reference_date,
      month_offset: self.offset,
      month_count: self.month_count,
      week_rows: self.week_rows,
      week_start: self.week_start,
      today
    }
  }

  pub fn render(
    &self,
    today: NaiveDate
  ) -> Result<Vec<MonthView>, InvalidInputError>
  {
    grid::build(&self.request(today))
  }

  /// Date of the cell at `(month, row, col)` of a rendered grid.
  ///
  /// Selecting a spillover cell yields its real date in the adjacent
  /// month.
  #[must_use]
  pub fn select(
    months: &[MonthView],
    month: usize,
    row: usize,
    col: usize
  ) -> Option<NaiveDate> {
    months
      .get(month)?
      .cell(row, col)?
      .date()
  }
}
