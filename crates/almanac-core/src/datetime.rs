use std::fmt::Write as _;

use anyhow::anyhow;
use chrono::{
  Datelike,
  Month,
  Months,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;

use crate::error::InvalidInputError;

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Resolves the configured IANA zone id; UTC when none is configured.
pub fn resolve_timezone(
  raw: Option<&str>
) -> anyhow::Result<Tz> {
  match raw {
    | Some(raw) => parse_timezone(raw),
    | None => Ok(chrono_tz::UTC)
  }
}

pub fn parse_timezone(
  raw: &str
) -> anyhow::Result<Tz> {
  let trimmed = raw.trim();
  let tz = trimmed.parse::<Tz>().map_err(
    |_| anyhow!("invalid timezone: {raw}")
  )?;
  tracing::debug!(
    timezone = %trimmed,
    "resolved timezone"
  );
  Ok(tz)
}

#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
  Utc::now()
    .with_timezone(&tz)
    .date_naive()
}

/// Moves `anchor` by whole months. The day of month is clamped to the
/// length of the target month, so Jan 31 + 1 month is Feb 28/29.
pub fn shift_months(
  anchor: NaiveDate,
  months: i64
) -> Result<NaiveDate, InvalidInputError> {
  let out_of_range = || {
    InvalidInputError::DateOutOfRange {
      anchor,
      months
    }
  };

  let magnitude =
    u32::try_from(months.unsigned_abs())
      .map_err(|_| out_of_range())?;

  let shifted = if months >= 0 {
    anchor.checked_add_months(
      Months::new(magnitude)
    )
  } else {
    anchor.checked_sub_months(
      Months::new(magnitude)
    )
  };

  shifted.ok_or_else(out_of_range)
}

#[must_use]
pub fn first_of_month(
  date: NaiveDate
) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

/// Number of days in the month containing `date`.
#[must_use]
pub fn days_in_month(
  date: NaiveDate
) -> u32 {
  first_of_month(date)
    .checked_add_months(Months::new(1))
    .and_then(|next| next.pred_opt())
    // December of the last representable year.
    .map_or(31, |last| last.day())
}

/// Weekday of `date` as 0 (Sunday) through 6 (Saturday).
#[must_use]
pub fn weekday_index(
  date: NaiveDate
) -> u8 {
  date.weekday().num_days_from_sunday()
    as u8
}

#[must_use]
pub fn month_name(
  month: u32
) -> &'static str {
  u8::try_from(month)
    .ok()
    .and_then(|m| Month::try_from(m).ok())
    .map_or("", |m| m.name())
}

/// Parses a user supplied date.
///
/// Accepts `today`, the configured input `format`, and ISO `YYYY-MM-DD`
/// in that order.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  format: &str,
  today: NaiveDate
) -> Result<NaiveDate, InvalidInputError> {
  let token = input.trim();

  if token.eq_ignore_ascii_case("today") {
    return Ok(today);
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(token, format)
  {
    return Ok(date);
  }

  NaiveDate::parse_from_str(
    token,
    ISO_DATE_FORMAT
  )
  .map_err(|err| {
    tracing::debug!(
      error = %err,
      format,
      "date did not match any accepted format"
    );
    InvalidInputError::UnparseableDate {
      input: token.to_string(),
      format: format.to_string()
    }
  })
}

/// Formats `date` for writing back into the input field.
pub fn format_date(
  date: NaiveDate,
  format: &str
) -> anyhow::Result<String> {
  let mut out = String::new();
  write!(out, "{}", date.format(format))
    .map_err(|_| {
      anyhow!(
        "invalid date format: {format}"
      )
    })?;
  Ok(out)
}

/// Accepts `0`-`6` (Sunday based) or an English weekday name.
pub fn parse_week_start(
  raw: &str
) -> Option<u8> {
  let token =
    raw.trim().to_ascii_lowercase();

  if let Ok(index) = token.parse::<u8>()
  {
    return (index <= 6).then_some(index);
  }

  parse_weekday_name(&token).map(
    |weekday| {
      weekday.num_days_from_sunday()
        as u8
    }
  )
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    Utc
  };

  use super::{
    days_in_month,
    format_date,
    month_name,
    parse_date_expr,
    parse_week_start,
    resolve_timezone,
    shift_months,
    today_in,
    weekday_index
  };
  use crate::error::InvalidInputError;

  fn ymd(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn shifts_across_year_boundaries() {
    assert_eq!(
      shift_months(ymd(2024, 12, 10), 1)
        .expect("shift forward"),
      ymd(2025, 1, 10)
    );
    assert_eq!(
      shift_months(ymd(2024, 1, 10), -1)
        .expect("shift back"),
      ymd(2023, 12, 10)
    );
  }

  #[test]
  fn clamps_day_to_month_end() {
    assert_eq!(
      shift_months(ymd(2024, 1, 31), 1)
        .expect("shift to leap february"),
      ymd(2024, 2, 29)
    );
    assert_eq!(
      shift_months(ymd(2023, 3, 31), -1)
        .expect("shift to february"),
      ymd(2023, 2, 28)
    );
  }

  #[test]
  fn rejects_unrepresentable_shift() {
    let err =
      shift_months(NaiveDate::MAX, 1)
        .expect_err("beyond max date");
    assert!(matches!(
      err,
      InvalidInputError::DateOutOfRange {
        ..
      }
    ));
  }

  #[test]
  fn counts_days_in_month() {
    assert_eq!(
      days_in_month(ymd(2024, 2, 15)),
      29
    );
    assert_eq!(
      days_in_month(ymd(2023, 2, 1)),
      28
    );
    assert_eq!(
      days_in_month(ymd(2024, 12, 31)),
      31
    );
    assert_eq!(
      days_in_month(ymd(2024, 4, 30)),
      30
    );
  }

  #[test]
  fn weekday_is_sunday_based() {
    assert_eq!(
      weekday_index(ymd(2024, 3, 3)),
      0
    );
    assert_eq!(
      weekday_index(ymd(2024, 3, 1)),
      5
    );
  }

  #[test]
  fn parses_configured_format_and_iso() {
    let today = ymd(2026, 2, 17);
    assert_eq!(
      parse_date_expr(
        "15.02.2024",
        "%d.%m.%Y",
        today
      )
      .expect("configured format"),
      ymd(2024, 2, 15)
    );
    assert_eq!(
      parse_date_expr(
        "2024-02-15",
        "%d.%m.%Y",
        today
      )
      .expect("iso fallback"),
      ymd(2024, 2, 15)
    );
    assert_eq!(
      parse_date_expr(
        " Today ", "%d.%m.%Y", today
      )
      .expect("today keyword"),
      today
    );
  }

  #[test]
  fn rejects_impossible_dates() {
    let err = parse_date_expr(
      "30.02.2024",
      "%d.%m.%Y",
      ymd(2026, 2, 17)
    )
    .expect_err("february 30th");
    assert_eq!(
      err,
      InvalidInputError::UnparseableDate {
        input:  "30.02.2024".to_string(),
        format: "%d.%m.%Y".to_string()
      }
    );
  }

  #[test]
  fn formats_for_input_field() {
    assert_eq!(
      format_date(
        ymd(2024, 2, 29),
        "%d.%m.%Y"
      )
      .expect("format"),
      "29.02.2024"
    );
    assert!(
      format_date(ymd(2024, 2, 29), "%Q")
        .is_err()
    );
  }

  #[test]
  fn parses_week_start_forms() {
    assert_eq!(
      parse_week_start("1"),
      Some(1)
    );
    assert_eq!(
      parse_week_start("Sunday"),
      Some(0)
    );
    assert_eq!(
      parse_week_start("wed"),
      Some(3)
    );
    assert_eq!(
      parse_week_start("7"),
      None
    );
    assert_eq!(
      parse_week_start("someday"),
      None
    );
  }

  #[test]
  fn names_months() {
    assert_eq!(month_name(2), "February");
    assert_eq!(month_name(13), "");
  }

  #[test]
  fn resolves_configured_timezone() {
    assert_eq!(
      resolve_timezone(None)
        .expect("default zone"),
      chrono_tz::UTC
    );
    assert_eq!(
      resolve_timezone(Some(
        " Europe/Zurich "
      ))
      .expect("known zone"),
      chrono_tz::Europe::Zurich
    );
    let err =
      resolve_timezone(Some("Mars/Olympus"))
        .expect_err("unknown zone");
    assert!(
      err
        .to_string()
        .contains("invalid timezone")
    );
  }

  #[test]
  fn today_follows_zone() {
    let tz = chrono_tz::Pacific::Kiritimati;
    let before =
      Utc::now().with_timezone(&tz).date_naive();
    let today = today_in(tz);
    let after =
      Utc::now().with_timezone(&tz).date_naive();
    assert!(today == before || today == after);
  }
}
