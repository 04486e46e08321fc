use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::NaiveDate;
use serde::{
  Deserialize,
  Deserializer
};
use tracing::{
  debug,
  info,
  warn
};

use crate::datetime;

const CONFIG_ENV_VAR: &str =
  "ALMANAC_CONFIG";
const CONFIG_DIR_NAME: &str = "almanac";
const CONFIG_FILE_NAME: &str =
  "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Months shown side by side.
  pub months:       u32,
  /// Week rows per month, always rendered in full.
  pub weeks:        u32,
  #[serde(
    deserialize_with = "deserialize_week_start"
  )]
  pub week_start:   u8,
  /// chrono format string of the input field.
  pub format:       String,
  pub timezone:     Option<String>,
  pub color:        bool,
  #[serde(skip)]
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      months:       2,
      weeks:        6,
      week_start:   1,
      format:       "%d.%m.%Y".to_string(),
      timezone:     None,
      color:        true,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) = resolve_config_path(
      config_override
    ) else {
      debug!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let text = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;

    let mut cfg = Self::from_toml_str(
      &text
    )
    .with_context(|| {
      format!(
        "invalid config file {}",
        path.display()
      )
    })?;
    cfg.loaded_files.push(path);
    Ok(cfg)
  }

  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let cfg: Self = toml::from_str(text)?;
    cfg.check_format()?;
    cfg.check_timezone()?;
    Ok(cfg)
  }

  /// Applies `key=value` overrides on top of the loaded file. Keys may
  /// carry an `rc.` prefix.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .trim()
        .to_string();
      let value = v.trim();
      debug!(key = %key, value = %value, "applying override");

      match key.as_str() {
        | "months" => {
          self.months =
            parse_count(&key, value)?;
        }
        | "weeks" => {
          self.weeks =
            parse_count(&key, value)?;
        }
        | "week_start" | "week.start" => {
          self.week_start =
            datetime::parse_week_start(
              value
            )
            .ok_or_else(|| {
              anyhow!(
                "invalid week start: \
                 {value}"
              )
            })?;
        }
        | "format" | "date.format" => {
          self.format = value.to_string();
          self.check_format()?;
        }
        | "timezone" => {
          self.timezone =
            if value.is_empty() {
              None
            } else {
              Some(value.to_string())
            };
          self.check_timezone()?;
        }
        | "color" => {
          self.color = parse_bool(value)
            .ok_or_else(|| {
              anyhow!(
                "invalid color setting: \
                 {value}"
              )
            })?;
        }
        | other => {
          return Err(anyhow!(
            "unknown config key: {other}"
          ));
        }
      }
    }

    Ok(())
  }

  fn check_format(
    &self
  ) -> anyhow::Result<()> {
    let sample =
      NaiveDate::from_ymd_opt(2000, 1, 1)
        .ok_or_else(|| {
          anyhow!("invalid sample date")
        })?;
    datetime::format_date(
      sample,
      &self.format
    )
    .map(|_| ())
  }

  fn check_timezone(
    &self
  ) -> anyhow::Result<()> {
    datetime::resolve_timezone(
      self.timezone.as_deref()
    )
    .map(|_| ())
  }
}

fn deserialize_week_start<'de, D>(
  deserializer: D
) -> Result<u8, D::Error>
where
  D: Deserializer<'de>
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Index(i64),
    Name(String)
  }

  let parsed = match Raw::deserialize(
    deserializer
  )? {
    | Raw::Index(index) => {
      u8::try_from(index)
        .ok()
        .filter(|index| *index <= 6)
    }
    | Raw::Name(name) => {
      datetime::parse_week_start(&name)
    }
  };

  parsed.ok_or_else(|| {
    serde::de::Error::custom(
      "week_start must be 0-6 or a \
       weekday name"
    )
  })
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  locate_config(
    override_path,
    std::env::var(CONFIG_ENV_VAR).ok(),
    dirs::config_dir()
  )
}

/// Picks the config file: explicit path, then the environment variable
/// (`/dev/null` disables the file), then `<config_dir>/almanac/config.toml`
/// when it exists.
fn locate_config(
  override_path: Option<&Path>,
  config_env: Option<String>,
  config_dir: Option<PathBuf>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Some(config_env) = config_env {
    if config_env == "/dev/null" {
      return None;
    }
    return Some(PathBuf::from(config_env));
  }

  let Some(config_dir) = config_dir
  else {
    warn!(
      "cannot determine config \
       directory; using defaults"
    );
    return None;
  };

  let candidate = config_dir
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  candidate.exists().then_some(candidate)
}

fn parse_count(
  key: &str,
  value: &str
) -> anyhow::Result<u32> {
  value.parse::<u32>().with_context(
    || {
      format!(
        "invalid value for {key}: \
         {value}"
      )
    }
  )
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}
