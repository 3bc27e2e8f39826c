use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;

use crate::domain::errors::StoreError;
use crate::domain::order::{FinalState, ListResult, NewOrder, Order, OrderStatus};
use crate::domain::ports::OrderStore;

/// Process-local order store with the same conflict and finalize rules as the
/// Postgres store.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<HashMap<String, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_pending(&self, order: &NewOrder) -> Result<Order, StoreError> {
        let mut orders = self.orders.lock();
        if orders.contains_key(&order.invoice) {
            return Err(StoreError::Conflict(order.invoice.clone()));
        }
        let created = Order::pending(order.clone(), Utc::now());
        orders.insert(created.invoice.clone(), created.clone());
        Ok(created)
    }

    async fn finalize(
        &self,
        invoice: &str,
        state: FinalState,
        provider_response: Value,
    ) -> Result<Order, StoreError> {
        let mut orders = self.orders.lock();
        let order = orders
            .get_mut(invoice)
            .ok_or_else(|| StoreError::NotFound(invoice.to_string()))?;
        if order.status.is_terminal() {
            log::error!(
                "refusing to finalize order {} as {:?}: already {}",
                invoice,
                state,
                order.status
            );
            return Err(StoreError::AlreadyFinalized {
                invoice: invoice.to_string(),
                status: order.status.to_string(),
            });
        }
        order.status = state.into();
        order.provider_response = Some(provider_response);
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn find_by_invoice(&self, invoice: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.lock().get(invoice).cloned())
    }

    async fn list(
        &self,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, StoreError> {
        let orders = self.orders.lock();
        let mut matching: Vec<&Order> = orders
            .values()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.invoice.cmp(&b.invoice))
        });

        let offset = page.saturating_sub(1).saturating_mul(limit).max(0) as usize;
        Ok(ListResult {
            total: matching.len() as i64,
            items: matching
                .into_iter()
                .skip(offset)
                .take(limit.max(0) as usize)
                .cloned()
                .collect(),
        })
    }
}
