//! Ramp Domain Layer
//!
//! Pure domain logic with zero I/O dependencies.
//! Contains order entities, configuration documents, analytics records and
//! the value objects that guard them.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod analytics;
pub mod config;
pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use analytics::{
    AnalyticsData, AnalyticsSummary, Dashboard, DashboardSummary, DateWindow, EventRecord,
    InstallRecord, NewEvent, NewInstall, TimeRange, UtmQuery, UtmStats,
};
pub use config::{
    AppModeConfig, AppModePatch, ConfigDocument, ExchangeRates, ExchangeRatesPatch, FeeQuote,
    SwapConfig, SwapConfigPatch, SwapRequest, SwapValidation,
};
pub use entities::{
    sort_newest_first, NewOrder, Order, OrderDetails, OrderFilter, OrderId, OrderPage,
    OrderStats, OrderStatus, OrderType,
};
pub use value_objects::{Amount, BankAccount, DomainError, WalletAddress};
