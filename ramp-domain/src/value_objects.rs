//! Value Objects for the ramp domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time, including when
//! they are read back from persisted JSON.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Amount must be positive
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Wallet address must be 0x followed by 40 hex characters
    #[error("Invalid wallet address: {0}")]
    InvalidWalletAddress(String),

    /// Bank account fields must be non-empty
    #[error("Invalid bank account: {0}")]
    InvalidBankAccount(String),

    /// A required field was missing or blank
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Unknown order status string
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    /// Unknown order type string
    #[error("Invalid order type: {0}")]
    InvalidOrderType(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Swap request rejected by the current swap configuration
    #[error("Invalid swap: {0}")]
    InvalidSwap(String),

    /// Malformed date or time range
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
}

// =============================================================================
// Amount
// =============================================================================

/// Amount represents a strictly positive decimal quantity (USDT or VND)
///
/// # Invariants
/// - Must be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new Amount with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidAmount` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "amount must be greater than 0, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| DomainError::InvalidAmount(format!("not a decimal: {}", s)))?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// WalletAddress
// =============================================================================

/// EVM-style wallet address: `0x` followed by exactly 40 hex characters.
///
/// Case is preserved as submitted; comparisons for filtering are done
/// case-insensitively via [`WalletAddress::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and validate a wallet address
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let valid = value.len() == 42
            && value.starts_with("0x")
            && value[2..].bytes().all(|b| b.is_ascii_hexdigit());

        if !valid {
            return Err(DomainError::InvalidWalletAddress(value));
        }
        Ok(Self(value))
    }

    /// Get the address as submitted
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw address string
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}

impl FromStr for WalletAddress {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// BankAccount
// =============================================================================

/// Destination bank account for a withdraw order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub account_number: String,
    pub account_name: String,
    pub bank_name: String,
}

impl BankAccount {
    /// Create a bank account, rejecting blank fields
    pub fn new(
        account_number: impl Into<String>,
        account_name: impl Into<String>,
        bank_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let account = Self {
            account_number: account_number.into(),
            account_name: account_name.into(),
            bank_name: bank_name.into(),
        };
        account.validate()?;
        Ok(account)
    }

    /// Check that every field is non-empty
    pub fn validate(&self) -> Result<(), DomainError> {
        let missing: Vec<&str> = [
            ("accountNumber", &self.account_number),
            ("accountName", &self.account_name),
            ("bankName", &self.bank_name),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::InvalidBankAccount(format!("missing {}", missing.join(", "))))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
