use crate::domain::backend::BackendKind;
use crate::domain::chart::DEFAULT_TIME_FORMAT;
use crate::domain::query::DEFAULT_PAGE_SIZE;
use anyhow::Context;
use chrono::format::{Item, StrftimeItems};
use chrono::FixedOffset;
use serde::Deserialize;
use std::collections::HashMap;

pub const SPARQL_TEMPLATE: &str = "SELECT * WHERE { ?s ?p ?o }";
pub const SQL_TEMPLATE: &str = "SELECT time, val FROM observations ORDER BY time LIMIT ${limit}";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
    #[serde(default)]
    pub console: ConsoleSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplaySettings {
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            time_format: default_time_format(),
        }
    }
}

impl DisplaySettings {
    pub fn offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).with_context(|| {
            format!("utc_offset_minutes out of range: {}", self.utc_offset_minutes)
        })
    }

    /// The axis label format, rejected up front when chrono cannot render it.
    pub fn time_format(&self) -> anyhow::Result<&str> {
        if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            anyhow::bail!("invalid time_format: {:?}", self.time_format);
        }
        Ok(&self.time_format)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
    pub kind: BackendKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleSettings {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_console_backend")]
    pub default_backend: BackendKind,
    #[serde(default = "default_console_backends")]
    pub backends: Vec<ConsoleBackendConfig>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_backend: default_console_backend(),
            backends: default_console_backends(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleBackendConfig {
    pub kind: BackendKind,
    pub base_url: String,
    pub template: Option<String>,
}

impl ConsoleSettings {
    /// `default_backend` when it has a base URL, otherwise the first
    /// configured backend.
    pub fn initial_backend(&self) -> BackendKind {
        if self.base_url(self.default_backend).is_some() {
            return self.default_backend;
        }
        self.backends
            .first()
            .map_or(self.default_backend, |b| b.kind)
    }

    pub fn base_url(&self, kind: BackendKind) -> Option<&str> {
        self.backends
            .iter()
            .find(|b| b.kind == kind)
            .map(|b| b.base_url.trim_end_matches('/'))
    }

    /// Default query text shown after selecting `kind`.
    pub fn template(&self, kind: BackendKind) -> String {
        let raw = self
            .backends
            .iter()
            .find(|b| b.kind == kind)
            .and_then(|b| b.template.as_deref())
            .unwrap_or(match kind {
                BackendKind::Sql => SQL_TEMPLATE,
                _ => SPARQL_TEMPLATE,
            });

        let mut vars = HashMap::new();
        vars.insert("backend".to_string(), kind.to_string());
        vars.insert("limit".to_string(), self.page_size.to_string());
        prepare_query(raw, &vars)
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_console_backend() -> BackendKind {
    BackendKind::Ldes
}

fn default_console_backends() -> Vec<ConsoleBackendConfig> {
    [
        (BackendKind::Ldes, "http://localhost:3000/virtuoso/ldes"),
        (BackendKind::LdesTss, "http://localhost:3000/virtuoso/ldestss"),
        (BackendKind::Ttl, "http://localhost:3000/virtuoso/ttl"),
    ]
    .into_iter()
    .map(|(kind, url)| ConsoleBackendConfig {
        kind,
        base_url: url.to_string(),
        template: None,
    })
    .collect()
}

/// Reads `config/dashboard.toml` (or the file named by `DASHBOARD_CONFIG_FILE`)
/// when present, then `DASHBOARD__*` environment overrides.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let path =
        std::env::var("DASHBOARD_CONFIG_FILE").unwrap_or_else(|_| "config/dashboard".to_string());
    let settings = config::Config::builder()
        .add_source(config::File::with_name(&path).required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace template variables in a query string
pub fn prepare_query(query: &str, vars: &HashMap<String, String>) -> String {
    let mut result = query.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_query() {
        let mut vars = HashMap::new();
        vars.insert("backend".to_string(), "SQL".to_string());
        vars.insert("limit".to_string(), "100".to_string());

        let query = "SELECT * FROM observations /* ${backend} */ LIMIT ${limit} OFFSET ${offset}";
        let result = prepare_query(query, &vars);

        assert_eq!(
            result,
            "SELECT * FROM observations /* SQL */ LIMIT 100 OFFSET ${offset}"
        );
    }

    #[test]
    fn test_default_settings() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.console.page_size, 100);
        assert_eq!(
            config.console.base_url(BackendKind::LdesTss),
            Some("http://localhost:3000/virtuoso/ldestss")
        );
        assert_eq!(config.console.base_url(BackendKind::Sql), None);
        assert_eq!(config.console.template(BackendKind::Ttl), SPARQL_TEMPLATE);
        assert_eq!(config.console.initial_backend(), BackendKind::Ldes);
    }

    #[test]
    fn test_parse_toml_file() {
        let config: AppConfig = toml::from_str(
            r#"
            [display]
            utc_offset_minutes = 60

            [[charts]]
            id = "stage"
            title = "River Stage"
            url = "http://localhost:3000/ldes/observations"
            kind = "LDES"

            [[charts]]
            id = "sql"
            url = "http://localhost:3000/sql/observations"
            kind = "sql"

            [console]
            page_size = 50

            [[console.backends]]
            kind = "SQL"
            base_url = "http://localhost:3000/postgres/"
            template = "SELECT * FROM readings LIMIT ${limit}"
            "#,
        )
        .unwrap();

        assert_eq!(config.charts.len(), 2);
        assert_eq!(config.charts[1].kind, BackendKind::Sql);
        assert_eq!(config.charts[1].title, "");
        assert_eq!(config.display.offset().unwrap().local_minus_utc(), 3600);
        assert_eq!(config.display.time_format, DEFAULT_TIME_FORMAT);
        assert_eq!(
            config.console.base_url(BackendKind::Sql),
            Some("http://localhost:3000/postgres")
        );
        assert_eq!(
            config.console.template(BackendKind::Sql),
            "SELECT * FROM readings LIMIT 50"
        );
    }

    #[test]
    fn test_offset_out_of_range() {
        let display = DisplaySettings {
            utc_offset_minutes: 24 * 60,
            ..DisplaySettings::default()
        };
        assert!(display.offset().is_err());
    }

    #[test]
    fn test_invalid_time_format() {
        let display = DisplaySettings {
            time_format: "%Y-%Q".to_string(),
            ..DisplaySettings::default()
        };
        assert!(display.time_format().is_err());

        let display = DisplaySettings {
            time_format: "%d.%m. %H:%M".to_string(),
            ..DisplaySettings::default()
        };
        assert_eq!(display.time_format().unwrap(), "%d.%m. %H:%M");
        assert_eq!(
            DisplaySettings::default().time_format().unwrap(),
            DEFAULT_TIME_FORMAT
        );
    }
}
