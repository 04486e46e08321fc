use std::io::{IsTerminal, Write};

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::grid::{DAYS_PER_WEEK, DayCell, Membership, MonthView, weekday_labels};

const CELL_WIDTH: usize = 2;
const MONTH_WIDTH: usize = DAYS_PER_WEEK * (CELL_WIDTH + 1) - 1;
const MONTH_GAP: &str = "   ";

/// The payload handed to template collaborators.
#[derive(Debug, Serialize)]
pub struct Sheet<'a> {
    pub weekdays: [&'static str; DAYS_PER_WEEK],
    pub months: &'a [MonthView],
}

impl<'a> Sheet<'a> {
    pub fn new(week_start: u8, months: &'a [MonthView]) -> Self {
        Self {
            weekdays: weekday_labels(week_start),
            months,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.color && std::io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Writes the months side by side, `cal` style.
    #[tracing::instrument(skip_all, fields(months = sheet.months.len()))]
    pub fn write_text<W: Write>(&self, mut writer: W, sheet: &Sheet<'_>) -> anyhow::Result<()> {
        let blocks: Vec<Vec<String>> = sheet
            .months
            .iter()
            .map(|month| self.month_lines(month, &sheet.weekdays))
            .collect();

        let height = blocks.iter().map(Vec::len).max().unwrap_or(0);
        for line_idx in 0..height {
            let line = blocks
                .iter()
                .map(|block| {
                    block
                        .get(line_idx)
                        .cloned()
                        .unwrap_or_else(|| " ".repeat(MONTH_WIDTH))
                })
                .collect::<Vec<_>>()
                .join(MONTH_GAP);
            writeln!(writer, "{}", line.trim_end())?;
        }

        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn write_json<W: Write>(&self, mut writer: W, sheet: &Sheet<'_>) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut writer, sheet)?;
        writeln!(writer)?;
        Ok(())
    }

    fn month_lines(&self, month: &MonthView, labels: &[&str; DAYS_PER_WEEK]) -> Vec<String> {
        let mut lines = Vec::with_capacity(month.weeks.len() + 2);

        let title = format!("{} {}", month.id.name, month.id.year);
        lines.push(center(&title, MONTH_WIDTH));
        lines.push(
            labels
                .iter()
                .map(|label| format!("{label:>CELL_WIDTH$}"))
                .collect::<Vec<_>>()
                .join(" "),
        );

        for week in &month.weeks {
            let row = week
                .iter()
                .map(|cell| self.paint_cell(cell))
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(row);
        }

        lines
    }

    fn paint_cell(&self, cell: &DayCell) -> String {
        let text = format!("{:>CELL_WIDTH$}", cell.day);
        if cell.is_today {
            self.paint(&text, "7")
        } else if cell.membership != Membership::Current {
            self.paint(&text, "2")
        } else {
            text
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn center(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    let total = width.saturating_sub(visible);
    let left = total / 2;
    let right = total - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Renderer, Sheet, center};
    use crate::grid::{CalendarRequest, build};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn february_2024(month_count: u32) -> Vec<crate::grid::MonthView> {
        build(&CalendarRequest {
            reference_date: ymd(2024, 2, 15),
            month_offset: 0,
            month_count,
            week_rows: 6,
            week_start: 1,
            today: ymd(2024, 2, 15),
        })
        .expect("build")
    }

    #[test]
    fn centers_titles() {
        assert_eq!(center("ab", 6), "  ab  ");
        assert_eq!(center("abc", 6), " abc  ");
        assert_eq!(center("too long", 4), "too long");
    }

    #[test]
    fn renders_single_month_text() {
        let months = february_2024(1);
        let sheet = Sheet::new(1, &months);
        let mut out = Vec::new();
        Renderer::plain()
            .write_text(&mut out, &sheet)
            .expect("render text");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "   February 2024");
        assert_eq!(lines[1], "Mo Tu We Th Fr Sa Su");
        assert_eq!(lines[2], "29 30 31  1  2  3  4");
        assert_eq!(lines[6], "26 27 28 29  1  2  3");
        assert_eq!(lines[7], " 4  5  6  7  8  9 10");
    }

    #[test]
    fn renders_months_side_by_side() {
        let months = february_2024(2);
        let sheet = Sheet::new(1, &months);
        let mut out = Vec::new();
        Renderer::plain()
            .write_text(&mut out, &sheet)
            .expect("render text");
        let text = String::from_utf8(out).expect("utf8");
        let first = text.lines().next().expect("title line");

        assert!(first.contains("February 2024"));
        assert!(first.contains("March 2024"));
    }

    #[test]
    fn renders_json_payload() {
        let months = february_2024(1);
        let sheet = Sheet::new(1, &months);
        let mut out = Vec::new();
        Renderer::plain()
            .write_json(&mut out, &sheet)
            .expect("render json");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("valid json");

        assert_eq!(value["weekdays"][0], "Mo");
        assert_eq!(value["months"][0]["month"], 2);
        assert_eq!(value["months"][0]["name"], "February");
        assert_eq!(value["months"][0]["next"]["month"], 3);
        assert_eq!(value["months"][0]["weeks"][0][0]["membership"], "previous");
        assert_eq!(value["months"][0]["weeks"][2][3]["is_today"], true);
    }
}
