//! Deposit and withdraw order collections
//!
//! Each order type lives in its own JSON array file. Every operation is a
//! full read (and, for mutations, a full rewrite) of that one file under its
//! document lock.

use crate::document::JsonDocument;
use crate::error::{StoreError, StoreResult};
use crate::repository::OrderRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ramp_domain::{
    sort_newest_first, NewOrder, Order, OrderFilter, OrderId, OrderPage, OrderStats, OrderStatus,
    OrderType,
};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// File name of the collection holding `order_type`
pub fn collection_file(order_type: OrderType) -> &'static str {
    match order_type {
        OrderType::Deposit => "deposit_orders.json",
        OrderType::Withdraw => "withdraw_orders.json",
    }
}

fn entity_name(order_type: OrderType) -> String {
    format!("{} order", order_type)
}

/// Reject a loaded collection holding an order of the wrong type
fn ensure_homogeneous(order_type: OrderType, path: &Path, orders: &[Order]) -> StoreResult<()> {
    match orders.iter().find(|o| o.order_type() != order_type) {
        Some(stray) => Err(StoreError::Corrupted {
            path: path.to_path_buf(),
            reason: format!(
                "{} order {} found in the {} collection",
                stray.order_type(),
                stray.id,
                order_type
            ),
        }),
        None => Ok(()),
    }
}

/// One order type's backing file
struct Collection {
    order_type: OrderType,
    doc: JsonDocument<Vec<Order>>,
}

impl Collection {
    fn new(order_type: OrderType, data_dir: &Path, timeout: Duration) -> Self {
        let name = match order_type {
            OrderType::Deposit => "deposit_orders",
            OrderType::Withdraw => "withdraw_orders",
        };
        Self {
            order_type,
            doc: JsonDocument::new(name, data_dir.join(collection_file(order_type)), timeout),
        }
    }

    async fn read(&self, operation: &str) -> StoreResult<Vec<Order>> {
        let orders = self.doc.read_or(operation, Vec::new).await?;
        ensure_homogeneous(self.order_type, self.doc.path(), &orders)?;
        Ok(orders)
    }

    async fn mutate<R, F>(&self, operation: &str, f: F) -> StoreResult<R>
    where
        R: Send,
        F: FnOnce(&mut Vec<Order>) -> StoreResult<R> + Send,
    {
        let order_type = self.order_type;
        let path = self.doc.path();
        self.doc
            .mutate(operation, Vec::new, move |orders| {
                ensure_homogeneous(order_type, path, orders)?;
                f(orders)
            })
            .await
    }
}

/// File-backed deposit and withdraw collections
pub struct OrderStore {
    deposits: Collection,
    withdrawals: Collection,
}

impl OrderStore {
    /// Collections under `data_dir`
    pub fn new(data_dir: &Path, timeout: Duration) -> Self {
        Self {
            deposits: Collection::new(OrderType::Deposit, data_dir, timeout),
            withdrawals: Collection::new(OrderType::Withdraw, data_dir, timeout),
        }
    }

    fn collection(&self, order_type: OrderType) -> &Collection {
        match order_type {
            OrderType::Deposit => &self.deposits,
            OrderType::Withdraw => &self.withdrawals,
        }
    }

    /// Create any missing collection file as an empty array
    pub(crate) async fn initialize(&self) -> StoreResult<Vec<&'static str>> {
        let mut created = Vec::new();
        for order_type in OrderType::ALL {
            if self.collection(order_type).doc.init_if_missing(Vec::new).await? {
                created.push(collection_file(order_type));
            }
        }
        Ok(created)
    }
}

#[async_trait]
impl OrderRepository for OrderStore {
    async fn append(&self, order_type: OrderType, submission: NewOrder) -> StoreResult<Order> {
        submission.validate_for(order_type)?;

        let order = self
            .collection(order_type)
            .mutate("append", move |orders| {
                let mut order = Order::new(submission);
                while orders.iter().any(|o| o.id == order.id) {
                    order.id = Uuid::now_v7();
                }
                orders.push(order.clone());
                Ok(order)
            })
            .await?;

        info!(
            order_id = %order.id,
            order_type = %order_type,
            usdt_amount = %order.usdt_amount,
            vnd_amount = %order.vnd_amount,
            "Order appended"
        );
        Ok(order)
    }

    async fn list(
        &self,
        order_type: OrderType,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<Order>> {
        let mut orders = self.collection(order_type).read("list").await?;
        sort_newest_first(&mut orders);
        Ok(orders.into_iter().skip(offset).take(limit).collect())
    }

    async fn list_filtered(
        &self,
        order_type: OrderType,
        filter: &OrderFilter,
    ) -> StoreResult<OrderPage> {
        let mut orders: Vec<Order> = self
            .collection(order_type)
            .read("list_filtered")
            .await?
            .into_iter()
            .filter(|o| filter.matches(o))
            .collect();
        sort_newest_first(&mut orders);

        let total = orders.len();
        let orders = orders.into_iter().skip(filter.offset).take(filter.limit).collect();

        Ok(OrderPage {
            orders,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    async fn get(&self, order_type: OrderType, id: OrderId) -> StoreResult<Order> {
        self.collection(order_type)
            .read("get")
            .await?
            .into_iter()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::not_found(entity_name(order_type), id.to_string()))
    }

    async fn update_status(
        &self,
        order_type: OrderType,
        id: OrderId,
        status: OrderStatus,
        notes: Option<String>,
    ) -> StoreResult<Order> {
        let (previous, order) = self
            .collection(order_type)
            .mutate("update_status", move |orders| {
                let order = orders
                    .iter_mut()
                    .find(|o| o.id == id)
                    .ok_or_else(|| StoreError::not_found(entity_name(order_type), id.to_string()))?;
                let previous = order.status;
                order.apply_status(status, notes, Utc::now());
                Ok((previous, order.clone()))
            })
            .await?;

        info!(
            order_id = %id,
            order_type = %order_type,
            from = %previous,
            to = %status,
            "Order status updated"
        );
        Ok(order)
    }

    async fn delete_one(&self, order_type: OrderType, id: OrderId) -> StoreResult<Order> {
        let order = self
            .collection(order_type)
            .mutate("delete_one", move |orders| {
                let index = orders
                    .iter()
                    .position(|o| o.id == id)
                    .ok_or_else(|| StoreError::not_found(entity_name(order_type), id.to_string()))?;
                Ok(orders.remove(index))
            })
            .await?;

        info!(order_id = %id, order_type = %order_type, "Order deleted");
        Ok(order)
    }

    async fn delete_many(&self, order_type: OrderType, ids: &[OrderId]) -> StoreResult<Vec<Order>> {
        if ids.is_empty() {
            return Err(StoreError::Validation("no order ids given".to_string()));
        }
        let wanted: HashSet<OrderId> = ids.iter().copied().collect();

        let deleted = self
            .collection(order_type)
            .mutate("delete_many", move |orders| {
                let (deleted, kept): (Vec<Order>, Vec<Order>) =
                    orders.drain(..).partition(|o| wanted.contains(&o.id));
                if deleted.is_empty() {
                    let ids: Vec<String> = wanted.iter().map(|id| id.to_string()).collect();
                    return Err(StoreError::not_found(entity_name(order_type), ids.join(",")));
                }
                *orders = kept;
                Ok(deleted)
            })
            .await?;

        info!(
            order_type = %order_type,
            requested = ids.len(),
            deleted = deleted.len(),
            "Orders deleted"
        );
        Ok(deleted)
    }

    async fn aggregate_stats(
        &self,
        order_type: OrderType,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<OrderStats> {
        let orders = self.collection(order_type).read("aggregate_stats").await?;
        let stats = OrderStats::compute(order_type, &orders, since);
        debug!(order_type = %order_type, count = stats.count, "Order stats computed");
        Ok(stats)
    }

    async fn count(&self, order_type: OrderType) -> StoreResult<usize> {
        Ok(self.collection(order_type).read("count").await?.len())
    }
}

// =============================================================================
// Tests
// =============================================================================
