use chrono::{DateTime, Duration, SecondsFormat, Utc};
use clap::{Arg, Command};
use llm_log_protocol::LogStatus;
use server::config::{ConfigError, ServerConfig};
use server::db::{OpenMode, Storage};
use server::repo::NewLogEntry;
use tracing::{error, info};

fn validate_rows(value: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .map_err(|_| "Row count must be a non-negative integer".to_owned())
}

/// `count` rows one minute apart starting at `start`, alternating
/// success and fail.
fn sample_entries(count: u32, start: DateTime<Utc>) -> Vec<NewLogEntry> {
    (0..count)
        .map(|i| {
            let status = if i % 2 == 0 {
                LogStatus::Success
            } else {
                LogStatus::Fail
            };
            let output = match status {
                LogStatus::Success => format!("sample completion #{}", i + 1),
                LogStatus::Fail => "upstream returned an error".to_owned(),
            };
            NewLogEntry {
                timestamp: (start + Duration::minutes(i64::from(i)))
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                status,
                input: format!("sample prompt #{}", i + 1),
                output,
            }
        })
        .collect()
}

/// Server configuration with `--database-url` taking precedence over
/// `DATABASE_URL`.
fn seed_config<F>(url_override: Option<String>, lookup: F) -> Result<ServerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    ServerConfig::from_lookup(|key| {
        if key == "DATABASE_URL" && url_override.is_some() {
            return url_override.clone();
        }
        lookup(key)
    })
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let matches = Command::new("LLM log seed")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Create the llm_call_logs schema and optionally insert sample rows")
        .arg(
            Arg::new("rows")
                .help("Number of sample rows to insert")
                .short('n')
                .long("rows")
                .value_parser(validate_rows)
                .default_value("0"),
        )
        .arg(
            Arg::new("database_url")
                .help("Overrides DATABASE_URL (postgres://... or sqlite:path)")
                .long("database-url"),
        )
        .get_matches();

    let rows = *matches.get_one::<u32>("rows").expect("rows has a default");
    let url_override = matches.get_one::<String>("database_url").cloned();

    let config = match seed_config(url_override, |key| std::env::var(key).ok()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_level))
        .init();

    if let Err(e) = seed(&config, rows).await {
        error!(error = %e, "seeding failed");
        std::process::exit(1);
    }
}

async fn seed(config: &ServerConfig, rows: u32) -> Result<(), server::repo::StoreError> {
    info!(storage = %config.storage.describe(), "opening database");
    let storage = Storage::open(&config.storage, &config.pool, OpenMode::Create).await?;
    storage.migrate().await?;
    info!(backend = storage.backend_name(), "schema ready");

    let start = Utc::now() - Duration::minutes(i64::from(rows));
    for entry in sample_entries(rows, start) {
        storage.insert(&entry).await?;
    }
    if rows > 0 {
        info!(rows, "sample rows inserted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use server::config::StorageConfig;

    #[test]
    fn sample_entries_alternate_status_and_advance_time() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let entries = sample_entries(3, start);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].status, LogStatus::Success);
        assert_eq!(entries[1].status, LogStatus::Fail);
        assert_eq!(entries[0].timestamp, "2024-01-01T00:00:00Z");
        assert_eq!(entries[2].timestamp, "2024-01-01T00:02:00Z");
        assert!(entries[0].timestamp < entries[1].timestamp);
    }

    #[test]
    fn zero_rows_inserts_nothing() {
        assert!(sample_entries(0, Utc::now()).is_empty());
    }

    #[test]
    fn log_level_comes_from_environment() {
        let config = seed_config(None, |key| match key {
            "DATABASE_URL" => Some("sqlite:seed.db".to_owned()),
            "LOG_LEVEL" => Some("debug".to_owned()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.log_level, "debug");

        let config = seed_config(None, |key| {
            (key == "DATABASE_URL").then(|| "sqlite:seed.db".to_owned())
        })
        .unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn database_url_flag_overrides_environment() {
        let config = seed_config(Some("sqlite:override.db".to_owned()), |key| {
            (key == "DATABASE_URL").then(|| "sqlite:env.db".to_owned())
        })
        .unwrap();
        assert!(matches!(
            config.storage,
            StorageConfig::Sqlite { ref path } if path.ends_with("override.db")
        ));
    }

    #[test]
    fn row_count_must_be_numeric() {
        assert_eq!(validate_rows("12"), Ok(12));
        assert!(validate_rows("-1").is_err());
        assert!(validate_rows("many").is_err());
    }
}
