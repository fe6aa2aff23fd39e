use crate::commands::{CommandContext, CommandResult, EXIT_DB_CONNECTIVITY, EXIT_MIGRATION};
use carewise_core::config::LoadOptions;
use carewise_db::{connection::connect_with_config, migrations};

pub fn run(options: LoadOptions) -> CommandResult {
    let context = match CommandContext::prepare("migrate", options) {
        Ok(context) => context,
        Err(result) => return result,
    };
    let config = &context.config;

    let result = context.runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DB_CONNECTIVITY))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;
        pool.close().await;
        Ok::<(), (&'static str, String, u8)>(())
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
