//! Order entities
//!
//! A deposit or withdraw order is created once, mutated only through status
//! updates, and removed only by explicit deletion. The order type is carried
//! by the type-specific [`OrderDetails`], so it cannot drift from the fields
//! that belong to it.

use crate::value_objects::{Amount, BankAccount, DomainError, WalletAddress};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an Order
pub type OrderId = Uuid;

// =============================================================================
// Order Type
// =============================================================================

/// Which collection an order belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Fiat in, USDT out
    Deposit,
    /// USDT in, fiat out
    Withdraw,
}

impl OrderType {
    /// Both order types, in a fixed order
    pub const ALL: [OrderType; 2] = [OrderType::Deposit, OrderType::Withdraw];

    /// Lowercase name as persisted
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Deposit => "deposit",
            OrderType::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(OrderType::Deposit),
            "withdraw" => Ok(OrderType::Withdraw),
            other => Err(DomainError::InvalidOrderType(other.to_string())),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Review status of an order.
///
/// Any status may move to any other; the operator decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Submitted, awaiting review
    Pending,
    /// Funds settled
    Completed,
    /// Settlement failed
    Failed,
    /// Withdrawn by the user or operator
    Cancelled,
}

impl OrderStatus {
    /// Every status, in display order
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Completed,
        OrderStatus::Failed,
        OrderStatus::Cancelled,
    ];

    /// Lowercase name as persisted
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidStatus(s.to_string()))
    }
}

// =============================================================================
// Order Details
// =============================================================================

/// Type-specific order fields. The serde tag doubles as the persisted `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrderDetails {
    /// Deposit: the user has sent fiat and quotes the bank transaction
    #[serde(rename_all = "camelCase")]
    Deposit {
        transaction_id: String,
        #[serde(default)]
        bank_info: Option<serde_json::Value>,
    },
    /// Withdraw: fiat is paid out to this account
    #[serde(rename_all = "camelCase")]
    Withdraw { bank_account: BankAccount },
}

impl OrderDetails {
    /// The order type these details belong to
    pub fn order_type(&self) -> OrderType {
        match self {
            OrderDetails::Deposit { .. } => OrderType::Deposit,
            OrderDetails::Withdraw { .. } => OrderType::Withdraw,
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        match self {
            OrderDetails::Deposit { transaction_id, .. } => {
                if transaction_id.trim().is_empty() {
                    return Err(DomainError::MissingField("transactionId".to_string()));
                }
                Ok(())
            },
            OrderDetails::Withdraw { bank_account } => bank_account.validate(),
        }
    }
}

// =============================================================================
// New Order (submission)
// =============================================================================

/// Fields supplied when an order is submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub wallet_address: WalletAddress,
    pub usdt_amount: Amount,
    pub vnd_amount: Amount,
    #[serde(flatten)]
    pub details: OrderDetails,
    #[serde(default)]
    pub user_note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl NewOrder {
    /// Build a deposit submission
    pub fn deposit(
        wallet_address: WalletAddress,
        usdt_amount: Amount,
        vnd_amount: Amount,
        transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            wallet_address,
            usdt_amount,
            vnd_amount,
            details: OrderDetails::Deposit {
                transaction_id: transaction_id.into(),
                bank_info: None,
            },
            user_note: String::new(),
            client_ip: None,
            user_agent: None,
        }
    }

    /// Build a withdraw submission
    pub fn withdraw(
        wallet_address: WalletAddress,
        usdt_amount: Amount,
        vnd_amount: Amount,
        bank_account: BankAccount,
    ) -> Self {
        Self {
            wallet_address,
            usdt_amount,
            vnd_amount,
            details: OrderDetails::Withdraw { bank_account },
            user_note: String::new(),
            client_ip: None,
            user_agent: None,
        }
    }

    /// Attach the submitting client's note
    pub fn with_user_note(mut self, note: impl Into<String>) -> Self {
        self.user_note = note.into();
        self
    }

    /// Attach request metadata
    pub fn with_client(mut self, client_ip: Option<String>, user_agent: Option<String>) -> Self {
        self.client_ip = client_ip;
        self.user_agent = user_agent;
        self
    }

    /// The type implied by the submission's details
    pub fn order_type(&self) -> OrderType {
        self.details.order_type()
    }

    /// Validate the submission for the collection it is being appended to.
    ///
    /// Amounts and wallet address are already valid by construction; this
    /// checks the type-specific fields and that the details match `expected`.
    pub fn validate_for(&self, expected: OrderType) -> Result<(), DomainError> {
        if self.order_type() != expected {
            return Err(DomainError::InvalidOrderType(format!(
                "{} details submitted to the {} collection",
                self.order_type(),
                expected
            )));
        }
        self.details.validate()
    }
}

// =============================================================================
// Order
// =============================================================================

/// A persisted deposit or withdraw order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub wallet_address: WalletAddress,
    pub usdt_amount: Amount,
    pub vnd_amount: Amount,
    #[serde(flatten)]
    pub details: OrderDetails,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub user_note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    // Audit
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a pending order from a submission
    pub fn new(submission: NewOrder) -> Self {
        Self::with_id(Uuid::now_v7(), submission, Utc::now())
    }

    /// Create a pending order with an explicit id and creation time
    pub fn with_id(id: OrderId, submission: NewOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            wallet_address: submission.wallet_address,
            usdt_amount: submission.usdt_amount,
            vnd_amount: submission.vnd_amount,
            details: submission.details,
            status: OrderStatus::Pending,
            notes: None,
            user_note: submission.user_note,
            client_ip: submission.client_ip,
            user_agent: submission.user_agent,
            created_at,
            updated_at: None,
        }
    }

    /// The collection this order belongs to
    pub fn order_type(&self) -> OrderType {
        self.details.order_type()
    }

    /// Apply an operator status change.
    ///
    /// `updated_at` is always strictly after `created_at`, even if the clock
    /// has not advanced since creation.
    pub fn apply_status(&mut self, status: OrderStatus, notes: Option<String>, now: DateTime<Utc>) {
        let floor = self.created_at + Duration::microseconds(1);
        self.status = status;
        self.notes = notes;
        self.updated_at = Some(now.max(floor));
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Filter and page applied when listing a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub wallet_address: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl OrderFilter {
    /// Default page size used by the admin listing
    pub const DEFAULT_LIMIT: usize = 50;

    /// Check whether an order passes the status and wallet filters
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status {
            if order.status != status {
                return false;
            }
        }
        match &self.wallet_address {
            Some(wallet) => order.wallet_address.matches(wallet),
            None => true,
        }
    }
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            status: None,
            wallet_address: None,
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// One page of a filtered listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Sort newest first. Ties on `created_at` fall back to the time-ordered id.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

// =============================================================================
// Statistics
// =============================================================================

/// Aggregate statistics over one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub order_type: OrderType,
    pub count: usize,
    pub by_status: BTreeMap<OrderStatus, usize>,
    pub total_usdt: Decimal,
    pub total_vnd: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
}

impl OrderStats {
    /// Scan `orders`, keeping those created at or after `since`
    pub fn compute<'a>(
        order_type: OrderType,
        orders: impl IntoIterator<Item = &'a Order>,
        since: Option<DateTime<Utc>>,
    ) -> Self {
        let mut by_status: BTreeMap<OrderStatus, usize> =
            OrderStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut count = 0;
        let mut total_usdt = Decimal::ZERO;
        let mut total_vnd = Decimal::ZERO;

        for order in orders {
            if since.is_some_and(|since| order.created_at < since) {
                continue;
            }
            count += 1;
            *by_status.entry(order.status).or_insert(0) += 1;
            total_usdt += order.usdt_amount.as_decimal();
            total_vnd += order.vnd_amount.as_decimal();
        }

        Self {
            order_type,
            count,
            by_status,
            total_usdt,
            total_vnd,
            since,
        }
    }

    /// Number of orders currently in `status`
    pub fn status_count(&self, status: OrderStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const WALLET: &str = "0x62EC88A97156233cdB416024AC5011C5B9A6f361";

    fn deposit() -> NewOrder {
        NewOrder::deposit(
            WalletAddress::parse(WALLET).unwrap(),
            Amount::new(dec!(100)).unwrap(),
            Amount::new(dec!(2450000)).unwrap(),
            "FT2401010001",
        )
    }

    fn withdraw() -> NewOrder {
        NewOrder::withdraw(
            WalletAddress::parse(WALLET).unwrap(),
            Amount::new(dec!(50)).unwrap(),
            Amount::new(dec!(1225000)).unwrap(),
            BankAccount::new("0123456789", "NGUYEN VAN A", "Vietcombank").unwrap(),
        )
    }

    #[test]
    fn test_new_order_is_pending() {
        let order = Order::new(deposit());
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_type(), OrderType::Deposit);
        assert!(order.notes.is_none());
        assert!(order.updated_at.is_none());
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!(matches!("shipped".parse::<OrderStatus>(), Err(DomainError::InvalidStatus(_))));
        assert!("Deposit".parse::<OrderType>().is_err());
    }

    #[test]
    fn test_validate_for_rejects_type_mismatch() {
        assert!(deposit().validate_for(OrderType::Deposit).is_ok());
        assert!(matches!(
            deposit().validate_for(OrderType::Withdraw),
            Err(DomainError::InvalidOrderType(_))
        ));
    }

    #[test]
    fn test_validate_for_requires_transaction_id() {
        let mut submission = deposit();
        submission.details = OrderDetails::Deposit {
            transaction_id: "  ".to_string(),
            bank_info: None,
        };
        assert_eq!(
            submission.validate_for(OrderType::Deposit),
            Err(DomainError::MissingField("transactionId".to_string()))
        );
    }

    #[test]
    fn test_validate_for_checks_bank_account() {
        let mut submission = withdraw();
        submission.details = OrderDetails::Withdraw {
            bank_account: BankAccount {
                account_number: "1".to_string(),
                account_name: String::new(),
                bank_name: "B".to_string(),
            },
        };
        assert!(matches!(
            submission.validate_for(OrderType::Withdraw),
            Err(DomainError::InvalidBankAccount(_))
        ));
    }

    #[test]
    fn test_apply_status_updated_after_created() {
        let mut order = Order::new(deposit());
        let created = order.created_at;

        // A clock reading equal to creation still yields a later timestamp
        order.apply_status(OrderStatus::Completed, Some("verified".to_string()), created);

        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.notes.as_deref(), Some("verified"));
        assert!(order.updated_at.unwrap() > created);
    }

    #[test]
    fn test_order_json_shape() {
        let order = Order::new(withdraw());
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["type"], "withdraw");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["walletAddress"], WALLET);
        assert_eq!(json["bankAccount"]["bankName"], "Vietcombank");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("transactionId").is_none());

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn test_order_reads_numeric_amounts() {
        let json = serde_json::json!({
            "id": Uuid::now_v7(),
            "type": "deposit",
            "walletAddress": WALLET,
            "usdtAmount": 100,
            "vndAmount": 2450000,
            "transactionId": "FT1",
            "bankInfo": null,
            "userNote": "",
            "status": "completed",
            "createdAt": "2024-05-01T10:00:00.000Z"
        });

        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.usdt_amount.as_decimal(), dec!(100));
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.order_type(), OrderType::Deposit);
    }

    #[test]
    fn test_sort_newest_first() {
        let now = Utc::now();
        let old = Order::with_id(Uuid::now_v7(), deposit(), now - Duration::hours(2));
        let mid = Order::with_id(Uuid::now_v7(), deposit(), now - Duration::hours(1));
        let new = Order::with_id(Uuid::now_v7(), deposit(), now);

        let mut orders = vec![mid.clone(), old.clone(), new.clone()];
        sort_newest_first(&mut orders);

        let ids: Vec<_> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![new.id, mid.id, old.id]);
    }

    #[test]
    fn test_filter_matches() {
        let mut order = Order::new(deposit());
        order.status = OrderStatus::Failed;

        let filter = OrderFilter {
            status: Some(OrderStatus::Failed),
            wallet_address: Some(WALLET.to_lowercase()),
            ..OrderFilter::default()
        };
        assert!(filter.matches(&order));

        let filter = OrderFilter {
            status: Some(OrderStatus::Pending),
            ..OrderFilter::default()
        };
        assert!(!filter.matches(&order));
    }

    #[test]
    fn test_stats_compute_with_since() {
        let now = Utc::now();
        let mut recent = Order::with_id(Uuid::now_v7(), deposit(), now);
        recent.status = OrderStatus::Completed;
        let stale = Order::with_id(Uuid::now_v7(), deposit(), now - Duration::days(10));

        let all = OrderStats::compute(OrderType::Deposit, [&recent, &stale], None);
        assert_eq!(all.count, 2);
        assert_eq!(all.total_usdt, dec!(200));
        assert_eq!(all.status_count(OrderStatus::Pending), 1);
        assert_eq!(all.status_count(OrderStatus::Completed), 1);

        let week = OrderStats::compute(
            OrderType::Deposit,
            [&recent, &stale],
            Some(now - Duration::days(7)),
        );
        assert_eq!(week.count, 1);
        assert_eq!(week.total_vnd, dec!(2450000));
        assert_eq!(week.status_count(OrderStatus::Pending), 0);
        assert_eq!(week.status_count(OrderStatus::Cancelled), 0);
    }
}
