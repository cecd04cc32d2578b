//! Configuration documents
//!
//! Each document is a single mutable JSON object. Updates are partial: a
//! patch names only the fields it changes and the rest are preserved. Every
//! applied patch refreshes `lastUpdated`.

use crate::value_objects::{DomainError, WalletAddress};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A named configuration document with a documented default and a patch type.
pub trait ConfigDocument:
    Serialize + DeserializeOwned + Clone + Send + Sync + std::fmt::Debug + 'static
{
    /// Partial update accepted by [`ConfigDocument::apply`]
    type Patch: Send + Sync + std::fmt::Debug;

    /// Logical name, used in logs and errors
    const NAME: &'static str;

    /// File name under the data directory
    const FILE_NAME: &'static str;

    /// Default document used when nothing has been persisted yet
    fn default_document(now: DateTime<Utc>) -> Self;

    /// Merge `patch` into a copy of `self`, validating the result
    fn apply(&self, patch: &Self::Patch, now: DateTime<Utc>) -> Result<Self, DomainError>;

    /// Timestamp of the last applied update
    fn last_updated(&self) -> DateTime<Utc>;
}

// =============================================================================
// Swap Config
// =============================================================================

/// Maximum platform fee, in percent
pub const MAX_PLATFORM_FEE_PERCENT: Decimal = dec!(5);

/// Swap fee parameters and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapConfig {
    pub platform_fee_percentage: Decimal,
    pub referrer_address: String,
    pub min_swap_amount: Decimal,
    pub max_swap_amount: Decimal,
    pub enabled_tokens: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

/// Partial update for [`SwapConfig`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_fee_percentage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_swap_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_swap_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_tokens: Option<Vec<String>>,
}

impl ConfigDocument for SwapConfig {
    type Patch = SwapConfigPatch;

    const NAME: &'static str = "swap_config";
    const FILE_NAME: &'static str = "swap_config.json";

    fn default_document(now: DateTime<Utc>) -> Self {
        Self {
            platform_fee_percentage: dec!(0.7),
            referrer_address: "0x62EC88A97156233cdB416024AC5011C5B9A6f361".to_string(),
            min_swap_amount: dec!(1),
            max_swap_amount: dec!(100000),
            enabled_tokens: ["USDT", "BNB", "ETH", "BTC"].iter().map(|t| t.to_string()).collect(),
            last_updated: now,
        }
    }

    fn apply(&self, patch: &SwapConfigPatch, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let mut next = self.clone();

        if let Some(fee) = patch.platform_fee_percentage {
            if fee < Decimal::ZERO || fee > MAX_PLATFORM_FEE_PERCENT {
                return Err(DomainError::InvalidConfig(format!(
                    "platform fee must be between 0% and {}%, got {}",
                    MAX_PLATFORM_FEE_PERCENT, fee
                )));
            }
            next.platform_fee_percentage = fee;
        }
        if let Some(referrer) = &patch.referrer_address {
            next.referrer_address = WalletAddress::parse(referrer.clone())?.into();
        }
        if let Some(min) = patch.min_swap_amount {
            next.min_swap_amount = min;
        }
        if let Some(max) = patch.max_swap_amount {
            next.max_swap_amount = max;
        }
        if let Some(tokens) = &patch.enabled_tokens {
            next.enabled_tokens = tokens.clone();
        }

        if next.min_swap_amount < Decimal::ZERO {
            return Err(DomainError::InvalidConfig("minSwapAmount must not be negative".to_string()));
        }
        if next.min_swap_amount > next.max_swap_amount {
            return Err(DomainError::InvalidConfig(format!(
                "minSwapAmount {} exceeds maxSwapAmount {}",
                next.min_swap_amount, next.max_swap_amount
            )));
        }

        next.last_updated = now;
        Ok(next)
    }

    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// Platform fee breakdown for a swap amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub original_amount: Decimal,
    pub platform_fee_percentage: Decimal,
    pub platform_fee_amount: Decimal,
    pub net_amount: Decimal,
    pub referrer_address: String,
}

/// A swap the client is about to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub from_token: String,
    pub to_token: String,
    pub amount: Decimal,
    pub wallet_address: String,
}

/// Accepted swap with the fee applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapValidation {
    pub from_token: String,
    pub to_token: String,
    pub amount: Decimal,
    pub platform_fee: Decimal,
    pub net_amount: Decimal,
    pub wallet_address: WalletAddress,
    pub referrer_address: String,
}

impl SwapConfig {
    /// Compute the platform fee on `amount`
    pub fn calculate_fee(&self, amount: Decimal) -> Result<FeeQuote, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount("amount must be a positive number".to_string()));
        }
        let fee = amount * self.platform_fee_percentage / dec!(100);
        Ok(FeeQuote {
            original_amount: amount,
            platform_fee_percentage: self.platform_fee_percentage,
            platform_fee_amount: fee,
            net_amount: amount - fee,
            referrer_address: self.referrer_address.clone(),
        })
    }

    /// Whether `symbol` is currently enabled for swaps
    pub fn is_token_enabled(&self, symbol: &str) -> bool {
        self.enabled_tokens.iter().any(|t| t == symbol)
    }

    /// Check a swap against the limits and token list
    pub fn validate_swap(&self, request: &SwapRequest) -> Result<SwapValidation, DomainError> {
        let wallet_address = WalletAddress::parse(request.wallet_address.clone())?;

        if request.amount < self.min_swap_amount {
            return Err(DomainError::InvalidSwap(format!(
                "minimum swap amount is {} USDT",
                self.min_swap_amount
            )));
        }
        if request.amount > self.max_swap_amount {
            return Err(DomainError::InvalidSwap(format!(
                "maximum swap amount is {} USDT",
                self.max_swap_amount
            )));
        }
        if !self.is_token_enabled(&request.from_token) || !self.is_token_enabled(&request.to_token) {
            return Err(DomainError::InvalidSwap(format!(
                "token pair {}/{} not supported, enabled: {}",
                request.from_token,
                request.to_token,
                self.enabled_tokens.join(", ")
            )));
        }

        let quote = self.calculate_fee(request.amount)?;
        Ok(SwapValidation {
            from_token: request.from_token.clone(),
            to_token: request.to_token.clone(),
            amount: request.amount,
            platform_fee: quote.platform_fee_amount,
            net_amount: quote.net_amount,
            wallet_address,
            referrer_address: quote.referrer_address,
        })
    }
}

// =============================================================================
// Exchange Rates
// =============================================================================

/// Fiat exchange rate used to quote deposits, withdraws and swaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRates {
    #[serde(rename = "USD_TO_VND")]
    pub usd_to_vnd: Decimal,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

/// Partial update for [`ExchangeRates`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRatesPatch {
    #[serde(rename = "USD_TO_VND", default, skip_serializing_if = "Option::is_none")]
    pub usd_to_vnd: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ExchangeRatesPatch {
    /// Operator-entered rate; source defaults to `admin`
    pub fn admin(usd_to_vnd: Decimal, source: Option<String>) -> Self {
        Self {
            usd_to_vnd: Some(usd_to_vnd),
            source: Some(source.unwrap_or_else(|| "admin".to_string())),
        }
    }
}

impl ConfigDocument for ExchangeRates {
    type Patch = ExchangeRatesPatch;

    const NAME: &'static str = "exchange_rates";
    const FILE_NAME: &'static str = "exchange_rates.json";

    fn default_document(now: DateTime<Utc>) -> Self {
        Self {
            usd_to_vnd: dec!(24500),
            source: "manual".to_string(),
            last_updated: now,
        }
    }

    fn apply(&self, patch: &ExchangeRatesPatch, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let mut next = self.clone();
        if let Some(rate) = patch.usd_to_vnd {
            if rate <= Decimal::ZERO {
                return Err(DomainError::InvalidConfig(format!(
                    "USD_TO_VND must be a positive number, got {}",
                    rate
                )));
            }
            next.usd_to_vnd = rate;
        }
        if let Some(source) = &patch.source {
            next.source = source.clone();
        }
        next.last_updated = now;
        Ok(next)
    }

    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

// =============================================================================
// App Mode
// =============================================================================

/// Feature-mode flags consumed by the mobile client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppModeConfig {
    pub is_review_mode: bool,
    pub is_production_mode: bool,
    pub updated_by: String,
    pub last_updated: DateTime<Utc>,
}

/// Partial update for [`AppModeConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppModePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_review_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_production_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl ConfigDocument for AppModeConfig {
    type Patch = AppModePatch;

    const NAME: &'static str = "app_mode_config";
    const FILE_NAME: &'static str = "app_mode_config.json";

    fn default_document(now: DateTime<Utc>) -> Self {
        Self {
            is_review_mode: true,
            is_production_mode: false,
            updated_by: "system".to_string(),
            last_updated: now,
        }
    }

    fn apply(&self, patch: &AppModePatch, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let mut next = self.clone();
        if let Some(review) = patch.is_review_mode {
            next.is_review_mode = review;
        }
        if let Some(production) = patch.is_production_mode {
            next.is_production_mode = production;
        }
        if let Some(by) = &patch.updated_by {
            next.updated_by = by.clone();
        }
        next.last_updated = now;
        Ok(next)
    }

    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

// =============================================================================
// Tests
// =============================================================================
