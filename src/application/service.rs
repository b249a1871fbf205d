use crate::application::ranking::{highest_normalized_for_date, rank_by_normalized_range};
use crate::application::statistics::compute_statistics;
use crate::application::validation::{validate_currency, validate_date};
use crate::domain::{
    CurrencySeries, NormalizedRange, PriceError, PriceSource, Statistics, SupportedCurrencies,
};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Configuration in effect for a request: the allow-list and the source the
/// histories are read from. Replaced as a whole on reload.
struct Snapshot {
    supported: SupportedCurrencies,
    source: Arc<dyn PriceSource>,
}

/// Entry point for the three price queries.
///
/// Every call reads a fresh copy of the histories it needs; nothing is cached
/// between requests.
pub struct CryptoService {
    snapshot: RwLock<Arc<Snapshot>>,
}

impl CryptoService {
    pub fn new(supported: SupportedCurrencies, source: Arc<dyn PriceSource>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot { supported, source })),
        }
    }

    /// Swap in a new configuration. Requests already running finish with the
    /// snapshot they started with.
    pub async fn reload(&self, supported: SupportedCurrencies, source: Arc<dyn PriceSource>) {
        info!("Reloading currency configuration: {:?}", supported.symbols());
        *self.snapshot.write().await = Arc::new(Snapshot { supported, source });
    }

    async fn current(&self) -> Arc<Snapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn supported_currencies(&self) -> Vec<String> {
        self.current().await.supported.symbols().to_vec()
    }

    /// Whether the configured price source can be reached, for health checks
    pub async fn is_source_available(&self) -> bool {
        self.current().await.source.is_available()
    }

    /// Oldest/newest/min/max price for one supported currency.
    pub async fn fetch_statistics(&self, currency: &str) -> Result<Statistics, PriceError> {
        debug!("Processing currency {}", currency);
        let snapshot = self.current().await;

        validate_currency(currency, &snapshot.supported)?;

        let observations = snapshot.source.observations(currency).await?;
        compute_statistics(&observations)
    }

    /// The currency with the highest normalized price on `date` (`YYYY-MM-DD`).
    pub async fn find_highest_normalized_crypto(
        &self,
        date: &str,
    ) -> Result<NormalizedRange, PriceError> {
        let date = validate_date(date)?;
        let snapshot = self.current().await;

        debug!("Finding highest normalized currency for {}", date);
        let series = Self::load_all(&snapshot).await;
        highest_normalized_for_date(date, series)
    }

    /// Every supported currency ranked by normalized range, highest first.
    pub async fn sorted_normalized_list(&self) -> Result<Vec<NormalizedRange>, PriceError> {
        let snapshot = self.current().await;

        let series = Self::load_all(&snapshot).await;
        rank_by_normalized_range(series)
    }

    /// Load every supported currency concurrently. Results come back in
    /// configured order so the ranking engine sees failures deterministically.
    async fn load_all(snapshot: &Snapshot) -> Vec<Result<CurrencySeries, PriceError>> {
        let loads = snapshot.supported.symbols().iter().map(|currency| {
            let source = snapshot.source.clone();
            async move {
                debug!("Processing history for {}", currency);
                source
                    .observations(currency)
                    .await
                    .map(|observations| CurrencySeries {
                        currency: currency.clone(),
                        observations,
                    })
            }
        });
        join_all(loads).await
    }
}
