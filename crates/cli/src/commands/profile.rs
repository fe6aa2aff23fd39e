use carewise_core::config::LoadOptions;
use carewise_core::domain::customer::CustomerId;
use carewise_core::errors::ApplicationError;
use carewise_core::history::OrderHistory;
use carewise_core::profile::CustomerProfile;
use serde::Serialize;
use uuid::Uuid;

use crate::commands::{open_service, require_customer, CommandContext, CommandResult};

#[derive(Debug, Serialize)]
struct ProfileOutput {
    profile: CustomerProfile,
    orders: Vec<OrderHistory>,
}

/// Prints the assembled profile together with the grouped order history.
pub fn run(options: LoadOptions, customer_id: &str) -> CommandResult {
    let context = match CommandContext::prepare("profile", options) {
        Ok(context) => context,
        Err(result) => return result,
    };
    let customer_id = CustomerId(customer_id.to_string());

    let result = context.runtime.block_on(async {
        let service = open_service("profile", &context.config).await?;
        require_customer("profile", &service, &customer_id).await?;

        let (profile, orders) = tokio::join!(
            service.get_customer_profile(&customer_id),
            service.get_order_history(&customer_id)
        );
        // A customer that exists but whose data failed to load.
        profile.map(|profile| ProfileOutput { profile, orders }).ok_or_else(|| {
            let error = ApplicationError::Persistence("customer profile unavailable".to_string());
            CommandResult::from_interface(
                "profile",
                &error.into_interface(Uuid::new_v4().to_string()),
            )
        })
    });

    match result {
        Ok(output) => CommandResult::success_with_data(
            "profile",
            format!("profile for {customer_id} with {} orders", output.orders.len()),
            &output,
        ),
        Err(result) => result,
    }
}
