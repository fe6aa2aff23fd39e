use carewise_core::config::LoadOptions;
use carewise_core::domain::customer::CustomerId;
use carewise_core::errors::ApplicationError;
use carewise_core::recommendations::RecommendationView;
use carewise_core::store::HealthOrderStore;
use uuid::Uuid;

use crate::commands::{open_service, require_customer, CommandContext, CommandResult};

/// `top` overrides the view's configured size; the catalog is still loaded from the store.
pub fn run(
    options: LoadOptions,
    customer_id: &str,
    view: RecommendationView,
    top: Option<usize>,
) -> CommandResult {
    let context = match CommandContext::prepare("recommend", options) {
        Ok(context) => context,
        Err(result) => return result,
    };
    let customer_id = CustomerId(customer_id.to_string());

    let result = context.runtime.block_on(async {
        let service = open_service("recommend", &context.config).await?;
        require_customer("recommend", &service, &customer_id).await?;

        let recommendations = match top {
            None => service.get_recommendations_for_view(&customer_id, view).await,
            Some(top_n) => {
                let catalog = service.store().product_catalog().await.map_err(|error| {
                    CommandResult::from_interface(
                        "recommend",
                        &ApplicationError::from(error).into_interface(Uuid::new_v4().to_string()),
                    )
                })?;
                service.get_recommendations(&customer_id, &catalog, top_n).await
            }
        };
        Ok::<_, CommandResult>(recommendations)
    });

    match result {
        Ok(recommendations) => CommandResult::success_with_data(
            "recommend",
            format!("{} recommendations for {customer_id}", recommendations.len()),
            &recommendations,
        ),
        Err(result) => result,
    }
}
