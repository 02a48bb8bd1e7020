//! The refresh pipeline: fetch both upstreams, merge, persist, render.

use crate::storage::Database;
use crate::summary;
use country_cache_core::{
    merge, CountryApi, CountryFilter, ExchangeRates, RatesApi, Result, StoredCountry,
    UpstreamPolicy,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub struct RefreshPipeline {
    country_api: CountryApi,
    rates_api: RatesApi,
    db: Arc<Database>,
    policy: UpstreamPolicy,
    image_path: PathBuf,
}

impl RefreshPipeline {
    pub fn new(
        country_api: CountryApi,
        rates_api: RatesApi,
        db: Arc<Database>,
        policy: UpstreamPolicy,
        image_path: PathBuf,
    ) -> Self {
        Self {
            country_api,
            rates_api,
            db,
            policy,
            image_path,
        }
    }

    /// Run a full refresh and return the resulting table.
    ///
    /// Both upstream fetches run concurrently. Under the `Degrade` policy
    /// a failed country fetch becomes an empty list and a failed rate
    /// fetch becomes an absent table (all exchange rates come out None);
    /// under `Fail` the first upstream error aborts the refresh. The
    /// upsert batch is transactional, and summary rendering afterwards is
    /// best-effort.
    pub async fn run(&self) -> Result<Vec<StoredCountry>> {
        let (countries, rates) = tokio::join!(
            self.country_api.fetch_countries(),
            self.rates_api.fetch_rates()
        );

        let countries = match countries {
            Ok(list) => list,
            Err(e) => match self.policy {
                UpstreamPolicy::Degrade => {
                    warn!("Country fetch failed, continuing with empty list: {e}");
                    Vec::new()
                }
                UpstreamPolicy::Fail => return Err(e),
            },
        };

        let rates: Option<ExchangeRates> = match rates {
            Ok(table) => Some(table),
            Err(e) => match self.policy {
                UpstreamPolicy::Degrade => {
                    warn!("Rate fetch failed, continuing without exchange rates: {e}");
                    None
                }
                UpstreamPolicy::Fail => return Err(e),
            },
        };

        let enriched = merge(&countries, rates.as_ref());
        info!("Merged {} countries (rates present: {})", enriched.len(), rates.is_some());

        self.db.upsert_all(&enriched).await?;

        if let Err(e) = summary::render_summary(&self.db, &self.image_path).await {
            warn!("Summary render failed: {e}");
        }

        self.db.list(&CountryFilter::default(), None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use country_cache_core::CacheError;
    use serde_json::json;

    // Nothing listens on port 1, so both fetches fail immediately.
    const DEAD_ENDPOINT: &str = "http://127.0.0.1:1/";

    /// Local server with canned payloads for both upstreams.
    async fn fixture_server() -> String {
        let app = Router::new()
            .route(
                "/countries",
                get(|| async {
                    Json(json!([
                        {"name": "A", "population": 1000, "currencies": [{"code": "USD"}]},
                        {"name": "B", "population": 2000, "currencies": [{"code": "EUR"}]}
                    ]))
                }),
            )
            .route(
                "/rates",
                get(|| async {
                    Json(json!({"base": "USD", "rates": {"USD": 1.0, "EUR": 0.9}}))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn pipeline(policy: UpstreamPolicy) -> RefreshPipeline {
        let db = Arc::new(Database::in_memory().await.unwrap());
        RefreshPipeline::new(
            CountryApi::new().with_url(DEAD_ENDPOINT.to_string()),
            RatesApi::new().with_url(DEAD_ENDPOINT.to_string()),
            db,
            policy,
            std::env::temp_dir().join(format!(
                "country-cache-refresh-{}.svg",
                std::process::id()
            )),
        )
    }

    #[tokio::test]
    async fn successful_refresh_persists_and_renders() {
        let base = fixture_server().await;
        let db = Arc::new(Database::in_memory().await.unwrap());
        let image_path = std::env::temp_dir().join(format!(
            "country-cache-success-{}.svg",
            std::process::id()
        ));
        let _ = tokio::fs::remove_file(&image_path).await;

        // Fail policy so a fixture problem surfaces instead of degrading
        let pipeline = RefreshPipeline::new(
            CountryApi::new().with_url(format!("{base}/countries")),
            RatesApi::new().with_url(format!("{base}/rates")),
            db.clone(),
            UpstreamPolicy::Fail,
            image_path.clone(),
        );

        // No artifact before the first refresh
        assert!(!tokio::fs::try_exists(&image_path).await.unwrap());

        let table = pipeline.run().await.unwrap();
        assert_eq!(table.len(), 2);

        let a = db.get_by_name("A").await.unwrap().unwrap();
        assert_eq!(a.exchange_rate, Some(1.0));
        assert_eq!(a.population, Some(1000));
        assert!(a.estimated_gdp >= 0.0);

        let b = table.iter().find(|r| r.name == "B").unwrap();
        assert_eq!(b.exchange_rate, Some(0.9));
        assert!(b.estimated_gdp >= 0.0);

        // Artifact exists after a successful refresh
        assert!(tokio::fs::try_exists(&image_path).await.unwrap());
        let _ = tokio::fs::remove_file(&image_path).await;
    }

    #[tokio::test]
    async fn degrade_policy_completes_on_upstream_failure() {
        let pipeline = pipeline(UpstreamPolicy::Degrade).await;
        let table = pipeline.run().await.unwrap();
        // Both upstreams were down: empty table, but the refresh (and the
        // best-effort render) still completed.
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn fail_policy_surfaces_upstream_error() {
        let pipeline = pipeline(UpstreamPolicy::Fail).await;
        match pipeline.run().await {
            Err(CacheError::CountryUpstream(_)) | Err(CacheError::RatesUpstream(_)) => {}
            other => panic!("expected an upstream error, got {other:?}"),
        }
    }
}
