use carewise_core::config::LoadOptions;
use carewise_core::domain::customer::CustomerId;

use crate::commands::{open_service, require_customer, CommandContext, CommandResult};

pub fn run(options: LoadOptions, customer_id: &str) -> CommandResult {
    let context = match CommandContext::prepare("insights", options) {
        Ok(context) => context,
        Err(result) => return result,
    };
    let customer_id = CustomerId(customer_id.to_string());

    let result = context.runtime.block_on(async {
        let service = open_service("insights", &context.config).await?;
        require_customer("insights", &service, &customer_id).await?;
        Ok::<_, CommandResult>(service.get_health_insights(&customer_id).await)
    });

    match result {
        Ok(insights) => CommandResult::success_with_data(
            "insights",
            format!("{} health insights for {customer_id}", insights.len()),
            &insights,
        ),
        Err(result) => result,
    }
}
