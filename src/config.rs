use crate::sheets::SheetsAuth;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// Defaults
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 10000;
const DEFAULT_PROGRAM_WORKSHEET: &str = "Programlar";
const DEFAULT_COURSE_PLAN_WORKSHEET: &str = "Ders Planı";
const DEFAULT_LOCAL_WORKBOOK: &str = "toplantı tablo 1.xlsx";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_SHEETS_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub sheet_id: Option<String>,
    pub access_token: Option<String>,
    pub api_key: Option<String>,
    pub program_worksheet: String,
    pub course_plan_worksheet: String,
    pub local_workbook: PathBuf,
    pub static_dir: PathBuf,
    pub sheets_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            sheet_id: None,
            access_token: None,
            api_key: None,
            program_worksheet: DEFAULT_PROGRAM_WORKSHEET.to_string(),
            course_plan_worksheet: DEFAULT_COURSE_PLAN_WORKSHEET.to_string(),
            local_workbook: PathBuf::from(DEFAULT_LOCAL_WORKBOOK),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            sheets_timeout: Duration::from_secs(DEFAULT_SHEETS_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Config::default();

        let port = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: v.clone(),
            })?,
            None => defaults.port,
        };
        let sheets_timeout = match get("SHEETS_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(v.parse().map_err(|_| ConfigError::Invalid {
                name: "SHEETS_TIMEOUT_SECS",
                value: v.clone(),
            })?),
            None => defaults.sheets_timeout,
        };

        Ok(Config {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            sheet_id: get("GOOGLE_SHEET_ID"),
            access_token: get("GOOGLE_ACCESS_TOKEN"),
            api_key: get("GOOGLE_API_KEY"),
            program_worksheet: get("PROGRAM_WORKSHEET").unwrap_or(defaults.program_worksheet),
            course_plan_worksheet: get("COURSE_PLAN_WORKSHEET")
                .unwrap_or(defaults.course_plan_worksheet),
            local_workbook: get("LOCAL_WORKBOOK")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_workbook),
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            sheets_timeout,
        })
    }

    /// Spreadsheet id and credentials, when Google Sheets is configured.
    ///
    /// An access token wins over an API key since only it allows writes.
    pub fn sheets_auth(&self) -> Option<(String, SheetsAuth)> {
        let id = self.sheet_id.clone()?;
        if let Some(token) = &self.access_token {
            return Some((id, SheetsAuth::AccessToken(token.clone())));
        }
        self.api_key
            .as_ref()
            .map(|key| (id, SheetsAuth::ApiKey(key.clone())))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
