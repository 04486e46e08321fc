//! Month grid construction.
//!
//! A grid is built from three runs of consecutive dates: the tail of the
//! previous month that fills the first row up to day 1, the whole current
//! month, and as many days of the following month as needed to complete
//! `week_rows` rows of seven cells.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::datetime;
use crate::error::InvalidInputError;

pub const DAYS_PER_WEEK: usize = 7;

const WEEKDAY_LABELS: [&str; DAYS_PER_WEEK] =
  ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarRequest {
  pub reference_date: NaiveDate,
  pub month_offset:   i64,
  pub month_count:    u32,
  pub week_rows:      u32,
  /// 0 (Sunday) through 6 (Saturday).
  pub week_start:     u8,
  pub today:          NaiveDate
}

impl CalendarRequest {
  pub fn validate(
    &self
  ) -> Result<(), InvalidInputError> {
    if self.week_start > 6 {
      return Err(
        InvalidInputError::WeekStartOutOfRange(
          self.week_start
        )
      );
    }
    if self.month_count == 0 {
      return Err(
        InvalidInputError::EmptyMonthCount
      );
    }
    if self.week_rows == 0 {
      return Err(
        InvalidInputError::EmptyWeekRows
      );
    }
    Ok(())
  }

  fn cell_count(&self) -> usize {
    self.week_rows as usize * DAYS_PER_WEEK
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize,
)]
pub struct MonthId {
  pub month: u32,
  pub year:  i32,
  pub name:  &'static str
}

impl MonthId {
  #[must_use]
  pub fn of(date: NaiveDate) -> Self {
    Self {
      month: date.month(),
      year:  date.year(),
      name:  datetime::month_name(
        date.month()
      )
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
  Previous,
  Current,
  Next
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize,
)]
pub struct DayCell {
  pub day:        u32,
  pub weekday:    u8,
  pub month:      u32,
  pub year:       i32,
  pub membership: Membership,
  pub is_today:   bool
}

impl DayCell {
  /// The calendar date this cell stands for.
  #[must_use]
  pub fn date(&self) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
      self.year, self.month, self.day
    )
  }
}

pub type Week = [DayCell; DAYS_PER_WEEK];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthView {
  #[serde(flatten)]
  pub id:    MonthId,
  pub prev:  MonthId,
  pub next:  MonthId,
  pub weeks: Vec<Week>
}

impl MonthView {
  pub fn cells(
    &self
  ) -> impl Iterator<Item = &DayCell> {
    self.weeks.iter().flatten()
  }

  #[must_use]
  pub fn cell(
    &self,
    row: usize,
    col: usize
  ) -> Option<&DayCell> {
    self
      .weeks
      .get(row)
      .and_then(|week| week.get(col))
  }
}

/// Two-letter weekday labels in column order for `week_start`.
#[must_use]
pub fn weekday_labels(
  week_start: u8
) -> [&'static str; DAYS_PER_WEEK] {
  std::array::from_fn(|col| {
    WEEKDAY_LABELS
      [(col + week_start as usize) % DAYS_PER_WEEK]
  })
}

/// Number of previous-month cells placed before day 1.
#[must_use]
pub fn leading_count(
  start_weekday: u8,
  week_start: u8
) -> u32 {
  (u32::from(start_weekday) + 7
    - u32::from(week_start) % 7)
    % 7
}

/// Last `count` days of the month before `first`, ending on its last day.
pub fn leading_run(
  first: NaiveDate,
  count: u32
) -> impl Iterator<Item = NaiveDate> {
  first
    .checked_sub_days(chrono::Days::new(
      u64::from(count)
    ))
    .into_iter()
    .flat_map(|start| start.iter_days())
    .take(count as usize)
}

/// Every day of the month starting at `first`.
pub fn current_run(
  first: NaiveDate
) -> impl Iterator<Item = NaiveDate> {
  first
    .iter_days()
    .take(datetime::days_in_month(first) as usize)
}

/// Consecutive days starting at day 1 of the following month.
pub fn trailing_run(
  next_first: NaiveDate
) -> impl Iterator<Item = NaiveDate> {
  next_first.iter_days()
}

/// Builds `request.month_count` month views.
///
/// Fails before producing anything when the request is invalid.
#[tracing::instrument(skip_all, fields(
  reference = %request.reference_date,
  offset = request.month_offset,
  months = request.month_count
))]
pub fn build(
  request: &CalendarRequest
) -> Result<Vec<MonthView>, InvalidInputError> {
  request.validate()?;

  let first_index = request.month_offset;
  let last_index = first_index
    .checked_add(i64::from(
      request.month_count
    ))
    .ok_or(
      InvalidInputError::DateOutOfRange {
        anchor: request.reference_date,
        months: first_index
      }
    )?;

  let mut months = (first_index..last_index)
    .map(|index| build_month(request, index))
    .collect::<Result<Vec<_>, _>>()?;

  keep_single_today(&mut months);
  Ok(months)
}

/// Adjacent views repeat dates in their spillover runs. Only one cell per
/// build stays marked as today: the one in its own month if rendered,
/// otherwise the first spillover occurrence.
fn keep_single_today(
  months: &mut [MonthView]
) {
  let marked: Vec<(usize, usize, usize)> =
    months
      .iter()
      .enumerate()
      .flat_map(|(m, view)| {
        view.weeks.iter().enumerate().flat_map(
          move |(r, week)| {
            week
              .iter()
              .enumerate()
              .filter(|(_, cell)| cell.is_today)
              .map(move |(c, _)| (m, r, c))
          }
        )
      })
      .collect();

  if marked.len() <= 1 {
    return;
  }

  let keep = marked
    .iter()
    .copied()
    .find(|&(m, r, c)| {
      months[m].weeks[r][c].membership
        == Membership::Current
    })
    .unwrap_or(marked[0]);

  for (m, r, c) in marked {
    if (m, r, c) != keep {
      months[m].weeks[r][c].is_today = false;
    }
  }
}

fn build_month(
  request: &CalendarRequest,
  index: i64
) -> Result<MonthView, InvalidInputError> {
  let anchor = request.reference_date;
  let current =
    datetime::shift_months(anchor, index)?;
  let prev = datetime::shift_months(
    anchor,
    index.saturating_sub(1)
  )?;
  let next = datetime::shift_months(
    anchor,
    index + 1
  )?;

  let first = datetime::first_of_month(current);
  let next_first =
    datetime::first_of_month(next);
  let leading = leading_count(
    datetime::weekday_index(first),
    request.week_start
  );

  tracing::debug!(
    month = %first,
    leading,
    days = datetime::days_in_month(first),
    "laying out month"
  );

  let id = MonthId::of(current);
  let prev_id = MonthId::of(prev);
  let next_id = MonthId::of(next);

  let tagged = leading_run(first, leading)
    .map(|date| (date, Membership::Previous))
    .chain(
      current_run(first)
        .map(|date| (date, Membership::Current))
    )
    .chain(
      trailing_run(next_first)
        .map(|date| (date, Membership::Next))
    );

  let cells: Vec<DayCell> = tagged
    .take(request.cell_count())
    .enumerate()
    .map(|(position, (date, membership))| {
      DayCell {
        day: date.day(),
        weekday: ((position
          + request.week_start as usize)
          % DAYS_PER_WEEK)
          as u8,
        month: date.month(),
        year: date.year(),
        membership,
        is_today: date == request.today
      }
    })
    .collect();

  let weeks = cells
    .chunks_exact(DAYS_PER_WEEK)
    .filter_map(|chunk| {
      Week::try_from(chunk).ok()
    })
    .collect::<Vec<_>>();

  // Only reachable when the grid runs into NaiveDate::MAX.
  if weeks.len() != request.week_rows as usize
  {
    return Err(
      InvalidInputError::DateOutOfRange {
        anchor,
        months: index + 1
      }
    );
  }

  Ok(MonthView {
    id,
    prev: prev_id,
    next: next_id,
    weeks
  })
}
