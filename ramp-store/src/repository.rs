//! Repository trait definitions (Ports)
//!
//! These traits define the storage interface the daemon and any outer
//! request layer program against. [`crate::FileStore`] is the production
//! implementation.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ramp_domain::analytics::{AnalyticsSummary, Dashboard};
use ramp_domain::{
    AnalyticsData, AppModeConfig, AppModePatch, EventRecord, ExchangeRates, ExchangeRatesPatch,
    InstallRecord, NewEvent, NewInstall, NewOrder, Order, OrderFilter, OrderId, OrderPage,
    OrderStats, OrderStatus, OrderType, SwapConfig, SwapConfigPatch, UtmQuery, UtmStats,
};
use rust_decimal::Decimal;

/// Repository for deposit and withdraw orders.
///
/// Every call names the collection it works on; lookups never fall through
/// to the other order type.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Validate and append a new pending order
    async fn append(&self, order_type: OrderType, submission: NewOrder) -> Result<Order, StoreError>;

    /// Newest first, then `offset`/`limit`
    async fn list(
        &self,
        order_type: OrderType,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Order>, StoreError>;

    /// Status and wallet filtered listing with the total match count
    async fn list_filtered(
        &self,
        order_type: OrderType,
        filter: &OrderFilter,
    ) -> Result<OrderPage, StoreError>;

    /// Find an order by ID
    async fn get(&self, order_type: OrderType, id: OrderId) -> Result<Order, StoreError>;

    /// Set status and operator notes
    async fn update_status(
        &self,
        order_type: OrderType,
        id: OrderId,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, StoreError>;

    /// Remove one order, returning it
    async fn delete_one(&self, order_type: OrderType, id: OrderId) -> Result<Order, StoreError>;

    /// Remove every listed order that exists; fails only if none matched
    async fn delete_many(
        &self,
        order_type: OrderType,
        ids: &[OrderId],
    ) -> Result<Vec<Order>, StoreError>;

    /// Counts and totals, optionally limited to orders created at or after `since`
    async fn aggregate_stats(
        &self,
        order_type: OrderType,
        since: Option<DateTime<Utc>>,
    ) -> Result<OrderStats, StoreError>;

    /// Number of orders in the collection
    async fn count(&self, order_type: OrderType) -> Result<usize, StoreError>;
}

/// Repository for the three configuration documents
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Current swap parameters (defaults if never written)
    async fn swap_config(&self) -> Result<SwapConfig, StoreError>;

    /// Merge a swap patch
    async fn update_swap_config(&self, patch: SwapConfigPatch) -> Result<SwapConfig, StoreError>;

    /// Current exchange rate (defaults if never written)
    async fn exchange_rates(&self) -> Result<ExchangeRates, StoreError>;

    /// Merge a rate patch
    async fn update_exchange_rates(
        &self,
        patch: ExchangeRatesPatch,
    ) -> Result<ExchangeRates, StoreError>;

    /// Current app mode flags (defaults if never written)
    async fn app_mode(&self) -> Result<AppModeConfig, StoreError>;

    /// Merge an app mode patch
    async fn update_app_mode(&self, patch: AppModePatch) -> Result<AppModeConfig, StoreError>;
}

/// Totals reported after seeding sample analytics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleReport {
    /// Installs generated
    pub installs: usize,
    /// Events generated
    pub events: usize,
    /// Sum of generated event values
    pub total_revenue: Decimal,
}

/// Repository for install/event analytics
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Append an install
    async fn record_install(&self, install: NewInstall) -> Result<InstallRecord, StoreError>;

    /// Append an event
    async fn record_event(&self, event: NewEvent) -> Result<EventRecord, StoreError>;

    /// UTM attribution for a range or window
    async fn utm_stats(&self, query: UtmQuery) -> Result<UtmStats, StoreError>;

    /// Full dashboard view
    async fn dashboard(&self) -> Result<Dashboard, StoreError>;

    /// Counts plus most recent records
    async fn summary(&self) -> Result<AnalyticsSummary, StoreError>;

    /// The whole document as stored
    async fn snapshot(&self) -> Result<AnalyticsData, StoreError>;

    /// Drop all records
    async fn clear(&self) -> Result<(), StoreError>;

    /// Replace all records with generated sample data
    async fn seed_sample_data(&self, seed: Option<u64>) -> Result<SampleReport, StoreError>;
}

/// Combined store interface
pub trait Store: Send + Sync {
    /// Get order repository
    fn orders(&self) -> &dyn OrderRepository;

    /// Get config repository
    fn config(&self) -> &dyn ConfigRepository;

    /// Get analytics repository
    fn analytics(&self) -> &dyn AnalyticsRepository;
}
