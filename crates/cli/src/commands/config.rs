use std::env;
use std::fs;
use std::path::Path;

use rental_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct Field {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field {
            key_path: "database.url",
            value: redact_url(&config.database.url),
            env_keys: &["RENTAL_DATABASE_URL"],
        },
        Field {
            key_path: "database.max_connections",
            value: config.database.max_connections.to_string(),
            env_keys: &["RENTAL_DATABASE_MAX_CONNECTIONS"],
        },
        Field {
            key_path: "database.timeout_secs",
            value: config.database.timeout_secs.to_string(),
            env_keys: &["RENTAL_DATABASE_TIMEOUT_SECS"],
        },
        Field {
            key_path: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["RENTAL_SERVER_BIND_ADDRESS"],
        },
        Field {
            key_path: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["RENTAL_SERVER_PORT"],
        },
        Field {
            key_path: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["RENTAL_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key_path: "booking.max_rental_days",
            value: config.booking.max_rental_days.to_string(),
            env_keys: &["RENTAL_BOOKING_MAX_RENTAL_DAYS"],
        },
        Field {
            key_path: "booking.featured_limit",
            value: config.booking.featured_limit.to_string(),
            env_keys: &["RENTAL_BOOKING_FEATURED_LIMIT"],
        },
        Field {
            key_path: "auth.session_ttl_hours",
            value: config.auth.session_ttl_hours.to_string(),
            env_keys: &["RENTAL_AUTH_SESSION_TTL_HOURS"],
        },
        Field {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["RENTAL_LOGGING_LEVEL", "RENTAL_LOG_LEVEL"],
        },
        Field {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["RENTAL_LOGGING_FORMAT", "RENTAL_LOG_FORMAT"],
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Query strings may carry credentials for file-backed databases; keep only the location.
fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((location, _)) => format!("{location}?<redacted>"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_url};

    #[test]
    fn contains_path_walks_nested_tables() {
        let doc: toml::Value = "[booking]\nmax_rental_days = 30\n".parse().expect("valid toml");

        assert!(contains_path(&doc, "booking.max_rental_days"));
        assert!(!contains_path(&doc, "booking.featured_limit"));
        assert!(!contains_path(&doc, "server.port"));
    }

    #[test]
    fn database_url_query_is_redacted() {
        assert_eq!(redact_url("sqlite://rental.db?mode=rwc"), "sqlite://rental.db?<redacted>");
        assert_eq!(redact_url("sqlite::memory:"), "sqlite::memory:");
    }
}
