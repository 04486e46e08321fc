pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod grid;
pub mod nav;
pub mod render;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use error::InvalidInputError;
pub use grid::{
  CalendarRequest,
  DayCell,
  Membership,
  MonthId,
  MonthView,
  build
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  let flag_overrides =
    cli.flag_overrides();
  cfg
    .apply_overrides(
      pre
        .rc_overrides
        .into_iter()
        .chain(
          cli
            .rc_overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value))
        )
        .chain(flag_overrides)
    )
    .context(
      "failed to apply config \
       overrides"
    )?;

  let tz = datetime::resolve_timezone(
    cfg.timezone.as_deref()
  )?;
  let clock_today = datetime::today_in(tz);

  let today = match cli.today.as_deref() {
    | Some(raw) => {
      datetime::parse_date_expr(
        raw,
        &cfg.format,
        clock_today
      )
      .context("invalid --today")?
    }
    | None => clock_today
  };
  let reference = match cli.date.as_deref()
  {
    | Some(raw) => {
      datetime::parse_date_expr(
        raw,
        &cfg.format,
        today
      )
      .context("invalid --date")?
    }
    | None => today
  };
  debug!(%today, %reference, "resolved dates");

  let nav = nav::Navigator::new(
    reference,
    cfg.months,
    cfg.weeks,
    cfg.week_start
  )
  .with_offset(cli.offset);
  let renderer =
    render::Renderer::new(&cfg);

  commands::dispatch(
    std::io::stdout().lock(),
    nav,
    &cfg,
    &renderer,
    cli.command.unwrap_or(
      cli::Command::Show
    ),
    today,
    commands::Output {
      json: cli.json
    }
  )?;

  info!("done");
  Ok(())
}
