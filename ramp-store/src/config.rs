//! Configuration documents
//!
//! A missing file reads as the documented default. A file that exists but
//! does not decode is an error.

use crate::document::JsonDocument;
use crate::error::StoreResult;
use crate::repository::ConfigRepository;
use async_trait::async_trait;
use chrono::Utc;
use ramp_domain::{
    AppModeConfig, AppModePatch, ConfigDocument, ExchangeRates, ExchangeRatesPatch, SwapConfig,
    SwapConfigPatch,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

fn document<D: ConfigDocument>(data_dir: &Path, timeout: Duration) -> JsonDocument<D> {
    JsonDocument::new(D::NAME, data_dir.join(D::FILE_NAME), timeout)
}

async fn load<D: ConfigDocument>(doc: &JsonDocument<D>) -> StoreResult<D> {
    doc.read_or("get", || D::default_document(Utc::now())).await
}

async fn update<D: ConfigDocument>(doc: &JsonDocument<D>, patch: D::Patch) -> StoreResult<D> {
    let updated = doc
        .mutate(
            "update",
            || D::default_document(Utc::now()),
            move |current| {
                let next = current.apply(&patch, Utc::now())?;
                *current = next.clone();
                Ok(next)
            },
        )
        .await?;

    info!(document = D::NAME, last_updated = %updated.last_updated(), "Configuration updated");
    Ok(updated)
}

/// File-backed swap, exchange rate and app mode documents
pub struct ConfigStore {
    swap: JsonDocument<SwapConfig>,
    rates: JsonDocument<ExchangeRates>,
    app_mode: JsonDocument<AppModeConfig>,
}

impl ConfigStore {
    /// Documents under `data_dir`
    pub fn new(data_dir: &Path, timeout: Duration) -> Self {
        Self {
            swap: document(data_dir, timeout),
            rates: document(data_dir, timeout),
            app_mode: document(data_dir, timeout),
        }
    }

    /// Write defaults for any document that has no file yet
    pub(crate) async fn initialize(&self) -> StoreResult<Vec<&'static str>> {
        let now = Utc::now();
        let mut created = Vec::new();

        if self.swap.init_if_missing(|| SwapConfig::default_document(now)).await? {
            created.push(SwapConfig::FILE_NAME);
        }
        if self.rates.init_if_missing(|| ExchangeRates::default_document(now)).await? {
            created.push(ExchangeRates::FILE_NAME);
        }
        if self.app_mode.init_if_missing(|| AppModeConfig::default_document(now)).await? {
            created.push(AppModeConfig::FILE_NAME);
        }

        Ok(created)
    }
}

#[async_trait]
impl ConfigRepository for ConfigStore {
    async fn swap_config(&self) -> StoreResult<SwapConfig> {
        load(&self.swap).await
    }

    async fn update_swap_config(&self, patch: SwapConfigPatch) -> StoreResult<SwapConfig> {
        update(&self.swap, patch).await
    }

    async fn exchange_rates(&self) -> StoreResult<ExchangeRates> {
        load(&self.rates).await
    }

    async fn update_exchange_rates(&self, patch: ExchangeRatesPatch) -> StoreResult<ExchangeRates> {
        update(&self.rates, patch).await
    }

    async fn app_mode(&self) -> StoreResult<AppModeConfig> {
        load(&self.app_mode).await
    }

    async fn update_app_mode(&self, patch: AppModePatch) -> StoreResult<AppModeConfig> {
        update(&self.app_mode, patch).await
    }
}
