//! Admin service: boundary facade over the stores.
//!
//! Request handlers talk to this type instead of the repositories. It owns
//! the few behaviours that span more than one document:
//!
//! - Order lookup and status updates by id alone (tries deposits, then
//!   withdraws). The stores themselves always require an order type.
//! - Dashboard and period views combining both collections and config.
//! - Public rate, fee and swap checks built on the swap config.

use crate::error::{DaemonError, DaemonResult};
use chrono::{DateTime, Duration, Utc};
use ramp_domain::{
    sort_newest_first, ExchangeRates, FeeQuote, Order, OrderFilter, OrderId, OrderPage,
    OrderStats, OrderStatus, OrderType, SwapConfig, SwapRequest, SwapValidation,
};
use ramp_store::{Store, StoreError};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Orders shown per type on the admin dashboard
pub const RECENT_ORDERS: usize = 10;

// =============================================================================
// Views
// =============================================================================

/// Headline counts for the admin dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub total_deposits: usize,
    pub total_withdraws: usize,
    pub pending_deposits: usize,
    pub pending_withdraws: usize,
    #[serde(rename = "totalUSDTDeposited")]
    pub total_usdt_deposited: Decimal,
    #[serde(rename = "totalUSDTWithdrawn")]
    pub total_usdt_withdrawn: Decimal,
}

/// Most recent orders of each type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentOrders {
    pub deposits: Vec<Order>,
    pub withdraws: Vec<Order>,
}

/// Config documents shown alongside the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    pub swap_config: SwapConfig,
    pub exchange_rates: ExchangeRates,
}

/// Admin dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub summary: DashboardTotals,
    pub recent_orders: RecentOrders,
    pub config: DashboardConfig,
}

/// Reporting period for order statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsPeriod {
    /// Last 24 hours
    Day,
    /// Last 7 days
    #[default]
    Week,
    /// Last 30 days
    Month,
}

impl StatsPeriod {
    /// Map a period code; unrecognised codes select the week
    pub fn from_code(code: &str) -> Self {
        match code {
            "1d" => StatsPeriod::Day,
            "30d" => StatsPeriod::Month,
            _ => StatsPeriod::Week,
        }
    }

    /// Short code
    pub fn code(&self) -> &'static str {
        match self {
            StatsPeriod::Day => "1d",
            StatsPeriod::Week => "7d",
            StatsPeriod::Month => "30d",
        }
    }

    /// Length of the period
    pub fn duration(&self) -> Duration {
        match self {
            StatsPeriod::Day => Duration::days(1),
            StatsPeriod::Week => Duration::days(7),
            StatsPeriod::Month => Duration::days(30),
        }
    }
}

/// Order statistics for both collections over one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub period: &'static str,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub deposits: OrderStats,
    pub withdraws: OrderStats,
}

/// Rate information exposed to the mobile client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRates {
    pub usd_to_vnd: Decimal,
    pub platform_fee_percentage: Decimal,
    pub last_updated: DateTime<Utc>,
    pub source: String,
}

// =============================================================================
// Service
// =============================================================================

/// Facade used by the request layer
pub struct AdminService<S: Store + 'static> {
    store: Arc<S>,
}

impl<S: Store + 'static> Clone for AdminService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store + 'static> AdminService<S> {
    /// Wrap a shared store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Find an order by id in either collection (deposits first)
    pub async fn find_order_any(&self, id: OrderId) -> DaemonResult<Order> {
        for order_type in OrderType::ALL {
            match self.store.orders().get(order_type, id).await {
                Ok(order) => return Ok(order),
                Err(StoreError::NotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(DaemonError::OrderNotFound(id))
    }

    /// Update an order's status by id alone (deposits first)
    pub async fn update_status_any(
        &self,
        id: OrderId,
        status: OrderStatus,
        notes: Option<String>,
    ) -> DaemonResult<Order> {
        for order_type in OrderType::ALL {
            match self
                .store
                .orders()
                .update_status(order_type, id, status, notes.clone())
                .await
            {
                Ok(order) => return Ok(order),
                Err(StoreError::NotFound { .. }) => {
                    debug!(order_id = %id, order_type = %order_type, "Order not in collection");
                },
                Err(e) => return Err(e.into()),
            }
        }
        Err(DaemonError::OrderNotFound(id))
    }

    /// Filtered listing of one collection, or of both merged when `order_type` is `None`
    pub async fn list_orders(
        &self,
        order_type: Option<OrderType>,
        filter: &OrderFilter,
    ) -> DaemonResult<OrderPage> {
        if let Some(order_type) = order_type {
            return Ok(self.store.orders().list_filtered(order_type, filter).await?);
        }

        let everything = OrderFilter {
            limit: usize::MAX,
            offset: 0,
            ..filter.clone()
        };
        let mut orders = Vec::new();
        for order_type in OrderType::ALL {
            orders.extend(self.store.orders().list_filtered(order_type, &everything).await?.orders);
        }
        sort_newest_first(&mut orders);

        let total = orders.len();
        Ok(OrderPage {
            orders: orders.into_iter().skip(filter.offset).take(filter.limit).collect(),
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    /// Totals, recent orders and config in one view
    pub async fn dashboard(&self) -> DaemonResult<AdminDashboard> {
        let orders = self.store.orders();
        let deposits = orders.aggregate_stats(OrderType::Deposit, None).await?;
        let withdraws = orders.aggregate_stats(OrderType::Withdraw, None).await?;

        Ok(AdminDashboard {
            summary: DashboardTotals {
                total_deposits: deposits.count,
                total_withdraws: withdraws.count,
                pending_deposits: deposits.status_count(OrderStatus::Pending),
                pending_withdraws: withdraws.status_count(OrderStatus::Pending),
                total_usdt_deposited: deposits.total_usdt,
                total_usdt_withdrawn: withdraws.total_usdt,
            },
            recent_orders: RecentOrders {
                deposits: orders.list(OrderType::Deposit, RECENT_ORDERS, 0).await?,
                withdraws: orders.list(OrderType::Withdraw, RECENT_ORDERS, 0).await?,
            },
            config: DashboardConfig {
                swap_config: self.store.config().swap_config().await?,
                exchange_rates: self.store.config().exchange_rates().await?,
            },
        })
    }

    /// Statistics for orders created within `period` of now
    pub async fn period_stats(&self, period: StatsPeriod) -> DaemonResult<PeriodStats> {
        let end = Utc::now();
        let start = end - period.duration();
        let orders = self.store.orders();

        Ok(PeriodStats {
            period: period.code(),
            start,
            end,
            deposits: orders.aggregate_stats(OrderType::Deposit, Some(start)).await?,
            withdraws: orders.aggregate_stats(OrderType::Withdraw, Some(start)).await?,
        })
    }

    /// Current exchange rate with the platform fee
    pub async fn public_rates(&self) -> DaemonResult<PublicRates> {
        let rates = self.store.config().exchange_rates().await?;
        let swap = self.store.config().swap_config().await?;

        Ok(PublicRates {
            usd_to_vnd: rates.usd_to_vnd,
            platform_fee_percentage: swap.platform_fee_percentage,
            last_updated: rates.last_updated,
            source: rates.source,
        })
    }

    /// Tokens currently enabled for swaps
    pub async fn supported_tokens(&self) -> DaemonResult<Vec<String>> {
        Ok(self.store.config().swap_config().await?.enabled_tokens)
    }

    /// Platform fee for a swap of `amount`
    pub async fn quote_fee(&self, amount: Decimal) -> DaemonResult<FeeQuote> {
        let swap = self.store.config().swap_config().await?;
        Ok(swap.calculate_fee(amount)?)
    }

    /// Check a swap against the current limits and token list
    pub async fn validate_swap(&self, request: &SwapRequest) -> DaemonResult<SwapValidation> {
        let swap = self.store.config().swap_config().await?;
        let validation = swap.validate_swap(request)?;

        info!(
            from = %validation.from_token,
            to = %validation.to_token,
            amount = %validation.amount,
            fee = %validation.platform_fee,
            "Swap validated"
        );
        Ok(validation)
    }
}
