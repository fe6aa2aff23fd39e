use std::env;
use std::fs;
use std::path::Path;

use carewise_core::config::{resolve_config_path, AppConfig, LoadOptions, ENV_PREFIX};
use toml::Value;

pub fn run(options: LoadOptions) -> String {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = config_file_path.as_deref().and_then(load_config_file_doc);
    let sources = SourceLookup { doc: config_file_doc.as_ref(), path: config_file_path.as_deref() };

    let fields: [(&str, String, &[&str]); 9] = [
        ("database.url", redact_url(&config.database.url), &[]),
        ("database.max_connections", config.database.max_connections.to_string(), &[]),
        ("database.timeout_secs", config.database.timeout_secs.to_string(), &[]),
        ("engine.order_item_limit", config.engine.order_item_limit.to_string(), &[]),
        ("engine.store_timeout_ms", config.engine.store_timeout_ms.to_string(), &[]),
        ("engine.widget_top_n", config.engine.widget_top_n.to_string(), &[]),
        ("engine.page_top_n", config.engine.page_top_n.to_string(), &[]),
        ("logging.level", config.logging.level.clone(), &["LOG_LEVEL"]),
        ("logging.format", format!("{:?}", config.logging.format), &["LOG_FORMAT"]),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, aliases) in &fields {
        lines.push(render_line(key, value, sources.field_source(key, aliases)));
    }

    lines.join("\n")
}

struct SourceLookup<'a> {
    doc: Option<&'a Value>,
    path: Option<&'a Path>,
}

impl SourceLookup<'_> {
    /// `database.url` is driven by `CAREWISE_DATABASE_URL`; aliases are suffixes after the prefix.
    fn field_source(&self, key_path: &str, aliases: &[&str]) -> String {
        let primary = env_key_for(key_path);
        let env_keys = std::iter::once(primary)
            .chain(aliases.iter().map(|alias| format!("{ENV_PREFIX}{alias}")));
        for env_key in env_keys {
            if env::var_os(&env_key).is_some() {
                return format!("env ({env_key})");
            }
        }

        if let Some(doc) = self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn env_key_for(key_path: &str) -> String {
    format!("{ENV_PREFIX}{}", key_path.replace('.', "_").to_ascii_uppercase())
}

fn load_config_file_doc(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
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

/// Hides a password embedded in a connection URL. SQLite paths pass through unchanged.
fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.split_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}
