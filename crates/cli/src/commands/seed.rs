use crate::commands::{
    CommandContext, CommandResult, EXIT_DB_CONNECTIVITY, EXIT_MIGRATION, EXIT_SEED_VERIFICATION,
};
use carewise_core::config::LoadOptions;
use carewise_db::fixtures::CustomerSeedInfo;
use carewise_db::{connection::connect_with_config, migrations, DemoSeedDataset};

pub fn run(options: LoadOptions) -> CommandResult {
    let context = match CommandContext::prepare("seed", options) {
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

        let seed_result = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;

        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), EXIT_SEED_VERIFICATION))?;

        let run_result = if verification.all_present {
            Ok(seed_result.customers_seeded)
        } else {
            Err((
                "seed_verification",
                verification_failure_message(&verification.checks),
                EXIT_SEED_VERIFICATION,
            ))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(customers) => CommandResult::success("seed", seed_summary(&customers)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_summary(customers: &[CustomerSeedInfo]) -> String {
    let lines: Vec<String> = customers
        .iter()
        .map(|customer| format!("  - {}: {}", customer.customer_id, customer.description))
        .collect();
    format!("demo dataset loaded for {} customers:\n{}", customers.len(), lines.join("\n"))
}

fn verification_failure_message(checks: &[(&str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_failure_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [("products", true), ("maria-order-items", false), ("cust-priya", false)];

        assert_eq!(
            verification_failure_message(&checks),
            "Seed verification failed for checks: maria-order-items, cust-priya"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let checks = [("products", true), ("cust-maria", true)];

        assert_eq!(verification_failure_message(&checks), "Some seed data failed to load");
    }
}
