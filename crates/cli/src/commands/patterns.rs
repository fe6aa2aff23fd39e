use carewise_core::config::LoadOptions;
use carewise_core::domain::customer::CustomerId;
use carewise_core::errors::ApplicationError;
use carewise_core::store::HealthOrderStore;
use uuid::Uuid;

use crate::commands::{open_service, require_customer, CommandContext, CommandResult};

/// Recomputes the customer's purchase patterns and prints the stored result.
pub fn run(options: LoadOptions, customer_id: &str) -> CommandResult {
    let context = match CommandContext::prepare("patterns", options) {
        Ok(context) => context,
        Err(result) => return result,
    };
    let customer_id = CustomerId(customer_id.to_string());

    let result = context.runtime.block_on(async {
        let service = open_service("patterns", &context.config).await?;
        require_customer("patterns", &service, &customer_id).await?;

        if !service.recompute_purchase_patterns(&customer_id).await {
            let error = ApplicationError::Persistence("pattern recompute failed".to_string());
            return Err(CommandResult::from_interface(
                "patterns",
                &error.into_interface(Uuid::new_v4().to_string()),
            ));
        }

        service.store().purchase_patterns(&customer_id).await.map_err(|error| {
            CommandResult::from_interface(
                "patterns",
                &ApplicationError::from(error).into_interface(Uuid::new_v4().to_string()),
            )
        })
    });

    match result {
        Ok(patterns) => CommandResult::success_with_data(
            "patterns",
            format!("recomputed {} purchase patterns for {customer_id}", patterns.len()),
            &patterns,
        ),
        Err(result) => result,
    }
}
