//! Request-scoped façade over a [`HealthOrderStore`].
//!
//! Every public operation is infallible from the caller's point of view: store failures and
//! timeouts are logged with a per-call correlation id and surface as an empty result, `None` or
//! `false`.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::clinical::ClinicalTables;
use crate::config::EngineConfig;
use crate::domain::customer::CustomerId;
use crate::domain::product::Product;
use crate::history::{analyze_order_history, OrderHistory};
use crate::insights::{HealthInsight, InsightGenerator};
use crate::patterns::{aggregate_patterns, carry_forward_timestamps};
use crate::profile::{build_profile, CustomerProfile};
use crate::recommendations::{ProductRecommendation, RecommendationEngine, RecommendationView};
use crate::store::{HealthOrderStore, StoreError};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct PersonalizationService<S> {
    store: S,
    config: EngineConfig,
    engine: RecommendationEngine,
    insights: InsightGenerator,
    clock: Clock,
}

struct CustomerContext {
    profile: CustomerProfile,
    history: Vec<OrderHistory>,
}

impl<S: HealthOrderStore> PersonalizationService<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self::with_tables(store, config, ClinicalTables::standard())
    }

    pub fn with_tables(store: S, config: EngineConfig, tables: ClinicalTables) -> Self {
        Self {
            store,
            config,
            engine: RecommendationEngine::with_tables(tables.clone()),
            insights: InsightGenerator::with_tables(tables),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock, mainly so seasonal scoring is reproducible in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rebuilds the stored purchase patterns from the customer's order items.
    ///
    /// Returns `false` when loading or persisting failed; the previous pattern set is then left
    /// untouched.
    pub async fn recompute_purchase_patterns(&self, customer_id: &CustomerId) -> bool {
        let correlation_id = Uuid::new_v4().to_string();
        let now = (self.clock)();

        let result = async {
            let items = self
                .bounded(
                    "customer_order_items",
                    self.store.customer_order_items(customer_id, self.config.order_item_limit),
                )
                .await?;
            let previous =
                self.bounded("purchase_patterns", self.store.purchase_patterns(customer_id)).await?;
            let mut patterns = aggregate_patterns(customer_id, &items, now);
            carry_forward_timestamps(&mut patterns, &previous);
            let count = patterns.len();
            self.bounded(
                "replace_purchase_patterns",
                self.store.replace_purchase_patterns(customer_id, patterns),
            )
            .await?;
            Ok::<_, StoreError>((items.len(), count))
        }
        .await;

        match result {
            Ok((item_count, pattern_count)) => {
                info!(
                    event_name = "personalization.patterns.recomputed",
                    correlation_id = %correlation_id,
                    customer_id = %customer_id,
                    item_count,
                    pattern_count,
                    "purchase patterns recomputed"
                );
                true
            }
            Err(error) => {
                warn!(
                    event_name = "personalization.patterns.recompute_failed",
                    correlation_id = %correlation_id,
                    customer_id = %customer_id,
                    error = %error,
                    "purchase pattern recompute failed"
                );
                false
            }
        }
    }

    pub async fn get_recommendations(
        &self,
        customer_id: &CustomerId,
        catalog: &[Product],
        top_n: usize,
    ) -> Vec<ProductRecommendation> {
        let correlation_id = Uuid::new_v4().to_string();
        let now = (self.clock)();

        let Some(context) = self.load_context(customer_id, &correlation_id, now).await else {
            return Vec::new();
        };

        let recommendations =
            self.engine.recommend(&context.profile, &context.history, catalog, now, top_n);
        info!(
            event_name = "personalization.recommendations.generated",
            correlation_id = %correlation_id,
            customer_id = %customer_id,
            catalog_size = catalog.len(),
            recommendation_count = recommendations.len(),
            "recommendations generated"
        );
        recommendations
    }

    /// Loads the catalog from the store and sizes the result for `view`.
    pub async fn get_recommendations_for_view(
        &self,
        customer_id: &CustomerId,
        view: RecommendationView,
    ) -> Vec<ProductRecommendation> {
        let top_n = match view {
            RecommendationView::Widget => self.config.widget_top_n,
            RecommendationView::Page => self.config.page_top_n,
        };

        match self.bounded("product_catalog", self.store.product_catalog()).await {
            Ok(catalog) => self.get_recommendations(customer_id, &catalog, top_n).await,
            Err(error) => {
                warn!(
                    event_name = "personalization.catalog.load_failed",
                    customer_id = %customer_id,
                    error = %error,
                    "product catalog could not be loaded"
                );
                Vec::new()
            }
        }
    }

    pub async fn get_health_insights(&self, customer_id: &CustomerId) -> Vec<HealthInsight> {
        let correlation_id = Uuid::new_v4().to_string();
        let now = (self.clock)();

        let Some(context) = self.load_context(customer_id, &correlation_id, now).await else {
            return Vec::new();
        };

        let insights = self.insights.generate(&context.profile, &context.history);
        info!(
            event_name = "personalization.insights.generated",
            correlation_id = %correlation_id,
            customer_id = %customer_id,
            insight_count = insights.len(),
            "health insights generated"
        );
        insights
    }

    pub async fn get_customer_profile(&self, customer_id: &CustomerId) -> Option<CustomerProfile> {
        let correlation_id = Uuid::new_v4().to_string();
        let now = (self.clock)();

        self.load_context(customer_id, &correlation_id, now).await.map(|context| context.profile)
    }

    pub async fn get_order_history(&self, customer_id: &CustomerId) -> Vec<OrderHistory> {
        let correlation_id = Uuid::new_v4().to_string();
        let now = (self.clock)();

        self.load_context(customer_id, &correlation_id, now)
            .await
            .map(|context| context.history)
            .unwrap_or_default()
    }

    /// Builds profile and history, or `None` when the customer is unknown or the store failed.
    async fn load_context(
        &self,
        customer_id: &CustomerId,
        correlation_id: &str,
        now: DateTime<Utc>,
    ) -> Option<CustomerContext> {
        match self.try_load_context(customer_id, now).await {
            Ok(Some(context)) => Some(context),
            Ok(None) => {
                info!(
                    event_name = "personalization.customer.not_found",
                    correlation_id = %correlation_id,
                    customer_id = %customer_id,
                    "customer not found"
                );
                None
            }
            Err(error) => {
                warn!(
                    event_name = "personalization.customer.load_failed",
                    correlation_id = %correlation_id,
                    customer_id = %customer_id,
                    error = %error,
                    "customer data could not be loaded"
                );
                None
            }
        }
    }

    async fn try_load_context(
        &self,
        customer_id: &CustomerId,
        now: DateTime<Utc>,
    ) -> Result<Option<CustomerContext>, StoreError> {
        let Some(record) =
            self.bounded("customer_by_id", self.store.customer_by_id(customer_id)).await?
        else {
            return Ok(None);
        };

        let (health, items, patterns) = tokio::try_join!(
            self.bounded("customer_health_info", self.store.customer_health_info(customer_id)),
            self.bounded(
                "customer_order_items",
                self.store.customer_order_items(customer_id, self.config.order_item_limit),
            ),
            self.bounded("purchase_patterns", self.store.purchase_patterns(customer_id)),
        )?;

        let history = analyze_order_history(&items, &patterns);
        let profile = build_profile(record, health, &items, patterns, now.date_naive());

        Ok(Some(CustomerContext { profile, history }))
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.config.store_timeout(), call).await {
            Ok(result) => result,
            Err(_) => {
                Err(StoreError::Timeout { operation, timeout_ms: self.config.store_timeout_ms })
            }
        }
    }
}
