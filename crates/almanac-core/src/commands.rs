use std::io::Write;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde_json::json;
use tracing::info;

use crate::cli::Command;
use crate::config::Config;
use crate::datetime;
use crate::nav::Navigator;
use crate::render::{Renderer, Sheet};

#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

#[tracing::instrument(skip(writer, nav, cfg, renderer))]
pub fn dispatch<W: Write>(
    mut writer: W,
    mut nav: Navigator,
    cfg: &Config,
    renderer: &Renderer,
    command: Command,
    today: NaiveDate,
    output: Output,
) -> anyhow::Result<()> {
    match command {
        Command::Show => {}
        Command::Next => nav.next(),
        Command::Prev => nav.prev(),
        Command::Pick { month, row, col } => {
            let months = nav.render(today)?;
            let date = Navigator::select(&months, month, row, col)
                .ok_or_else(|| anyhow!("no day at month {month}, row {row}, column {col}"))?;
            let value = datetime::format_date(date, &cfg.format)?;
            info!(%date, value = %value, "picked date");
            if output.json {
                serde_json::to_writer(&mut writer, &json!({ "date": date, "value": value }))?;
                writeln!(writer)?;
            } else {
                writeln!(writer, "{value}")?;
            }
            return Ok(());
        }
    }

    let months = nav.render(today)?;
    let sheet = Sheet::new(cfg.week_start, &months);
    if output.json {
        renderer.write_json(&mut writer, &sheet)
    } else {
        renderer.write_text(&mut writer, &sheet)
    }
}
