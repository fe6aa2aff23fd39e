pub mod config;
pub mod insights;
pub mod migrate;
pub mod patterns;
pub mod profile;
pub mod recommend;
pub mod seed;

use carewise_core::config::{AppConfig, LoadOptions};
use carewise_core::domain::customer::CustomerId;
use carewise_core::errors::{ApplicationError, DomainError, InterfaceError};
use carewise_core::service::PersonalizationService;
use carewise_core::store::HealthOrderStore;
use carewise_db::connection::connect_with_config;
use carewise_db::SqlHealthOrderStore;
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Success envelope carrying a serialized result under `data`.
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: &impl Serialize,
    ) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), EXIT_INTERNAL)
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure envelope for an error that crossed the interface boundary. Only the user-facing
    /// message is printed; the detail stays in the logs under the correlation id.
    pub fn from_interface(command: &str, error: &InterfaceError) -> Self {
        let exit_code = match error {
            InterfaceError::BadRequest { .. } => EXIT_BAD_REQUEST,
            InterfaceError::ServiceUnavailable { .. } => EXIT_DB_CONNECTIVITY,
            InterfaceError::Internal { .. } => EXIT_INTERNAL,
        };
        let correlation_id = match error {
            InterfaceError::BadRequest { correlation_id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id, .. }
            | InterfaceError::Internal { correlation_id, .. } => correlation_id.clone(),
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error.error_class().to_string()),
            message: error.user_message().to_string(),
            correlation_id: Some(correlation_id),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_RUNTIME_INIT: u8 = 3;
pub const EXIT_DB_CONNECTIVITY: u8 = 4;
pub const EXIT_MIGRATION: u8 = 5;
pub const EXIT_SEED_VERIFICATION: u8 = 6;
pub const EXIT_BAD_REQUEST: u8 = 7;
pub const EXIT_INTERNAL: u8 = 8;

/// Validated config plus a single-threaded runtime, shared by every database-backed command.
pub(crate) struct CommandContext {
    pub config: AppConfig,
    pub runtime: Runtime,
}

impl CommandContext {
    pub fn prepare(command: &str, options: LoadOptions) -> Result<Self, CommandResult> {
        let config = AppConfig::load(options).map_err(|error| {
            CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            )
        })?;

        let runtime =
            tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
                CommandResult::failure(
                    command,
                    "runtime_init",
                    format!("failed to initialize async runtime: {error}"),
                    EXIT_RUNTIME_INIT,
                )
            })?;

        Ok(Self { config, runtime })
    }
}

/// Connects to the configured database and wraps it in the personalization service.
pub(crate) async fn open_service(
    command: &str,
    config: &AppConfig,
) -> Result<PersonalizationService<SqlHealthOrderStore>, CommandResult> {
    let pool = connect_with_config(&config.database).await.map_err(|error| {
        CommandResult::failure(command, "db_connectivity", error.to_string(), EXIT_DB_CONNECTIVITY)
    })?;

    Ok(PersonalizationService::new(SqlHealthOrderStore::new(pool), config.engine.clone()))
}

/// The service treats unknown customers as empty results; commands report them explicitly.
pub(crate) async fn require_customer<S: HealthOrderStore>(
    command: &str,
    service: &PersonalizationService<S>,
    customer_id: &CustomerId,
) -> Result<(), CommandResult> {
    let correlation_id = Uuid::new_v4().to_string();
    let failure = match service.store().customer_by_id(customer_id).await {
        Ok(Some(_)) => return Ok(()),
        Ok(None) => ApplicationError::from(DomainError::UnknownCustomer(customer_id.to_string())),
        Err(error) => ApplicationError::from(error),
    };

    warn!(
        event_name = "cli.customer.rejected",
        correlation_id = %correlation_id,
        customer_id = %customer_id,
        command,
        error = %failure,
        "customer lookup failed"
    );
    Err(CommandResult::from_interface(command, &failure.into_interface(correlation_id)))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
