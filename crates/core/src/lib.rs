pub mod clinical;
pub mod config;
pub mod domain;
pub mod errors;
pub mod history;
pub mod insights;
pub mod patterns;
pub mod profile;
pub mod recommendations;
pub mod service;
pub mod store;

pub use clinical::ClinicalTables;
pub use domain::customer::{CustomerId, CustomerRecord};
pub use domain::health::{CustomerHealthData, EmergencyContact, InsuranceInfo, Medication};
pub use domain::order::{CustomerOrderItem, OrderId, OrderStatus};
pub use domain::pattern::{CustomerPurchasePattern, SeasonalPattern};
pub use domain::product::{Product, ProductId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use history::{analyze_order_history, OrderFrequency, OrderHistory, OrderLine};
pub use insights::{HealthInsight, InsightGenerator, InsightKind, Severity};
pub use patterns::aggregate_patterns;
pub use profile::{build_profile, CustomerProfile};
pub use recommendations::{
    ProductRecommendation, RecommendationEngine, RecommendationType, RecommendationView,
};
pub use service::PersonalizationService;
pub use store::{HealthOrderStore, StoreError};
