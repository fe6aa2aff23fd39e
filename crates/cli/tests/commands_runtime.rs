use std::env;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

use carewise_cli::commands::{config, insights, migrate, patterns, profile, recommend, seed};
use carewise_core::config::{ConfigOverrides, LoadOptions};
use carewise_core::recommendations::RecommendationView;
use serde_json::Value;

fn options_for(db_path: &Path) -> LoadOptions {
    LoadOptions {
        overrides: ConfigOverrides {
            database_url: Some(format!("sqlite://{}?mode=rwc", db_path.display())),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    }
}

fn seeded_database() -> (tempfile::TempDir, LoadOptions) {
    let dir = tempfile::tempdir().expect("temp dir");
    let options = options_for(&dir.path().join("carewise.db"));

    let result = seed::run(options.clone());
    assert_eq!(result.exit_code, 0, "seed failed: {}", result.output);
    (dir, options)
}

#[test]
fn migrate_returns_success_for_fresh_database() {
    let _guard = env_guard();
    let dir = tempfile::tempdir().expect("temp dir");

    let result = migrate::run(options_for(&dir.path().join("fresh.db")));
    assert_eq!(result.exit_code, 0, "expected successful migrate run");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "migrate");
    assert_eq!(payload["status"], "ok");
}

#[test]
fn migrate_rejects_non_sqlite_url() {
    let _guard = env_guard();
    let options = LoadOptions {
        overrides: ConfigOverrides {
            database_url: Some("postgres://localhost/carewise".to_string()),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    };

    let result = migrate::run(options);
    assert_eq!(result.exit_code, 2, "expected config validation failure code");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "config_validation");
}

#[test]
fn seed_is_idempotent_across_runs() {
    let _guard = env_guard();
    let (_dir, options) = seeded_database();

    let second = seed::run(options);
    assert_eq!(second.exit_code, 0, "expected second seed invocation success");
    let payload = parse_payload(&second.output);
    let message = payload["message"].as_str().unwrap_or_default();
    assert!(message.starts_with("demo dataset loaded for 3 customers"));
    assert!(message.contains("  - cust-maria: "));
}

#[test]
fn patterns_recompute_and_list_categories() {
    let _guard = env_guard();
    let (_dir, options) = seeded_database();

    let result = patterns::run(options, "cust-maria");
    assert_eq!(result.exit_code, 0, "{}", result.output);

    let payload = parse_payload(&result.output);
    let categories: Vec<&str> = payload["data"]
        .as_array()
        .expect("pattern list")
        .iter()
        .filter_map(|pattern| pattern["product_category"].as_str())
        .collect();
    assert_eq!(categories.len(), 3);
    assert!(categories.contains(&"Diabetes"));
}

#[test]
fn recommend_honours_view_and_explicit_top() {
    let _guard = env_guard();
    let (_dir, options) = seeded_database();

    let widget = recommend::run(options.clone(), "cust-maria", RecommendationView::Widget, None);
    assert_eq!(widget.exit_code, 0, "{}", widget.output);
    let widget_items = parse_payload(&widget.output)["data"].as_array().map(Vec::len);
    assert!(matches!(widget_items, Some(1..=3)));

    let explicit = recommend::run(options, "cust-maria", RecommendationView::Widget, Some(1));
    let explicit_payload = parse_payload(&explicit.output);
    assert_eq!(explicit_payload["data"].as_array().map(Vec::len), Some(1));
}

#[test]
fn unknown_customer_is_a_bad_request() {
    let _guard = env_guard();
    let (_dir, options) = seeded_database();

    let result = insights::run(options, "cust-nobody");
    assert_eq!(result.exit_code, 7);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["error_class"], "bad_request");
    assert!(payload["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[test]
fn insights_and_profile_render_for_seeded_customer() {
    let _guard = env_guard();
    let (_dir, options) = seeded_database();

    let insights = parse_payload(&insights::run(options.clone(), "cust-maria").output);
    let kinds: Vec<&str> = insights["data"]
        .as_array()
        .expect("insight list")
        .iter()
        .filter_map(|insight| insight["kind"].as_str())
        .collect();
    assert!(!kinds.is_empty());

    let profile = parse_payload(&profile::run(options, "cust-maria").output);
    assert_eq!(profile["status"], "ok");
    assert_eq!(profile["data"]["profile"]["name"], "Maria Lopez");
    assert_eq!(profile["data"]["orders"].as_array().map(Vec::len), Some(6));
}

#[test]
fn config_reports_env_sources() {
    with_env(&[("CAREWISE_ENGINE_WIDGET_TOP_N", "4"), ("CAREWISE_LOG_LEVEL", "debug")], || {
        let output = config::run(LoadOptions::default());

        assert!(output.contains(
            "- engine.widget_top_n = 4 (source: env (CAREWISE_ENGINE_WIDGET_TOP_N))"
        ));
        assert!(output.contains("- logging.level = debug (source: env (CAREWISE_LOG_LEVEL))"));
        assert!(output.contains("- engine.page_top_n = 12 (source: default)"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

/// Every command reads `CAREWISE_*` variables, so tests serialize against env mutation.
fn env_guard() -> MutexGuard<'static, ()> {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    let _guard = env_guard();

    let keys = [
        "CAREWISE_DATABASE_URL",
        "CAREWISE_DATABASE_MAX_CONNECTIONS",
        "CAREWISE_DATABASE_TIMEOUT_SECS",
        "CAREWISE_ENGINE_ORDER_ITEM_LIMIT",
        "CAREWISE_ENGINE_STORE_TIMEOUT_MS",
        "CAREWISE_ENGINE_WIDGET_TOP_N",
        "CAREWISE_ENGINE_PAGE_TOP_N",
        "CAREWISE_LOGGING_LEVEL",
        "CAREWISE_LOGGING_FORMAT",
        "CAREWISE_LOG_LEVEL",
        "CAREWISE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
