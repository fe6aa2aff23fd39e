use carewise_core::config::EngineConfig;
use carewise_core::domain::customer::CustomerId;
use carewise_core::insights::InsightKind;
use carewise_core::recommendations::RecommendationView;
use carewise_core::service::PersonalizationService;
use carewise_core::store::HealthOrderStore;
use carewise_db::{connect_with_settings, migrations, DemoSeedDataset, SqlHealthOrderStore};
use chrono::{TimeZone, Utc};

type FlowTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

async fn seeded_service() -> FlowTestResult<PersonalizationService<SqlHealthOrderStore>> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    DemoSeedDataset::load(&pool).await.map_err(|error| format!("seed: {error}"))?;

    let now = Utc
        .with_ymd_and_hms(2026, 12, 10, 9, 0, 0)
        .single()
        .ok_or_else(|| "invalid fixed clock".to_string())?;
    Ok(PersonalizationService::new(SqlHealthOrderStore::new(pool), EngineConfig::default())
        .with_clock(move || now))
}

fn customer(id: &str) -> CustomerId {
    CustomerId(id.to_string())
}

#[tokio::test]
async fn recompute_replaces_patterns_per_category() -> FlowTestResult {
    let service = seeded_service().await?;
    let maria = customer("cust-maria");

    require!(service.recompute_purchase_patterns(&maria).await);
    require!(service.recompute_purchase_patterns(&maria).await, "recompute is repeatable");

    let patterns = service
        .store()
        .purchase_patterns(&maria)
        .await
        .map_err(|error| format!("patterns: {error}"))?;
    let mut categories: Vec<&str> =
        patterns.iter().map(|pattern| pattern.product_category.as_str()).collect();
    categories.sort_unstable();
    require_eq!(categories, vec!["Blood Pressure", "Diabetes", "Vitamins"]);

    let diabetes = patterns
        .iter()
        .find(|pattern| pattern.product_category == "Diabetes")
        .ok_or_else(|| "missing Diabetes pattern".to_string())?;
    require_eq!(diabetes.purchase_frequency, 6);
    require_eq!(diabetes.total_quantity, 12);
    Ok(())
}

#[tokio::test]
async fn profile_prefers_dedicated_health_record() -> FlowTestResult {
    let service = seeded_service().await?;

    let profile = service
        .get_customer_profile(&customer("cust-maria"))
        .await
        .ok_or_else(|| "profile should exist".to_string())?;
    require_eq!(profile.chronic_conditions, vec!["Diabetes".to_string()]);
    require_eq!(profile.age, Some(68));
    require_eq!(profile.total_orders, 6);

    let priya = service
        .get_customer_profile(&customer("cust-priya"))
        .await
        .ok_or_else(|| "profile should exist".to_string())?;
    require!(priya.allergies.is_empty(), "malformed legacy allergies decode as empty");

    require!(service.get_customer_profile(&customer("cust-nobody")).await.is_none());
    Ok(())
}

#[tokio::test]
async fn recommendations_respect_view_sizes_and_stock() -> FlowTestResult {
    let service = seeded_service().await?;
    let maria = customer("cust-maria");

    let widget = service.get_recommendations_for_view(&maria, RecommendationView::Widget).await;
    let page = service.get_recommendations_for_view(&maria, RecommendationView::Page).await;

    require!(!widget.is_empty() && widget.len() <= 3, "widget size {}", widget.len());
    require!(page.len() >= widget.len() && page.len() <= 12, "page size {}", page.len());
    require!(page.iter().all(|r| r.product.stock_quantity > 0), "out-of-stock product recommended");
    require!(
        page.iter().any(|r| r.product.id.0 == "prod-glipizide"),
        "diabetic customer should see an antidiabetic suggestion"
    );
    require!(page.windows(2).all(|pair| pair[0].score >= pair[1].score));
    Ok(())
}

#[tokio::test]
async fn insights_cover_conditions_medication_and_wellness() -> FlowTestResult {
    let service = seeded_service().await?;

    let maria = service.get_health_insights(&customer("cust-maria")).await;
    require!(maria.iter().any(|insight| insight.kind == InsightKind::ChronicCondition));
    require!(maria.iter().any(|insight| insight.kind == InsightKind::RegularMedication
        && insight.condition == "Antidiabetic"));

    let priya = service.get_health_insights(&customer("cust-priya")).await;
    require!(priya.iter().any(|insight| insight.kind == InsightKind::Wellness));

    require!(service.get_health_insights(&customer("cust-nobody")).await.is_empty());
    Ok(())
}
