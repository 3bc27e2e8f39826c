use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::domain::errors::{StoreError, ValidationErrors};
use crate::domain::order::{FinalState, NewOrder};
use crate::domain::ports::{CourierDispatch, OrderStore};
use crate::domain::validation::{self, OrderSubmission};

/// Final state reported to whoever submitted the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacementState {
    Confirmed,
    Failed,
    Rejected,
    Errored,
}

/// Why a placement did not end `CONFIRMED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Conflict,
    BusinessRejection,
    Provider,
    Store,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub state: PlacementState,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub provider_response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_fields: Vec<String>,
    #[serde(skip)]
    pub failure: Option<FailureKind>,
}

impl PlacementResult {
    fn rejected(order_id: Option<String>, err: ValidationErrors) -> Self {
        PlacementResult {
            order_id,
            state: PlacementState::Rejected,
            provider_response: None,
            reason: Some(err.to_string()),
            invalid_fields: err.fields,
            failure: Some(FailureKind::Validation),
        }
    }

    fn errored(order_id: String, kind: FailureKind, reason: String) -> Self {
        PlacementResult {
            order_id: Some(order_id),
            state: PlacementState::Errored,
            provider_response: None,
            reason: Some(reason),
            invalid_fields: Vec::new(),
            failure: Some(kind),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Received,
    Validated,
    PersistedPending,
    Dispatched,
    Finalized(FinalState),
    Rejected,
    Errored,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Received => f.write_str("RECEIVED"),
            Stage::Validated => f.write_str("VALIDATED"),
            Stage::PersistedPending => f.write_str("PERSISTED_PENDING"),
            Stage::Dispatched => f.write_str("DISPATCHED"),
            Stage::Finalized(FinalState::Confirmed) => f.write_str("FINALIZED(CONFIRMED)"),
            Stage::Finalized(FinalState::Failed) => f.write_str("FINALIZED(FAILED)"),
            Stage::Rejected => f.write_str("REJECTED"),
            Stage::Errored => f.write_str("ERRORED"),
        }
    }
}

fn transition(invoice: &str, from: Stage, to: Stage) {
    log::info!("order {}: {} -> {}", invoice, from, to);
}

/// Runs the validate → persist → dispatch → finalize sequence for one order.
///
/// Every path ends in `REJECTED`, `ERRORED` or a finalized order; once the
/// pending record is written the courier's outcome is always recorded,
/// including transport failures.
#[derive(Clone)]
pub struct OrderPlacement {
    store: Arc<dyn OrderStore>,
    courier: Arc<dyn CourierDispatch>,
}

impl OrderPlacement {
    pub fn new(store: Arc<dyn OrderStore>, courier: Arc<dyn CourierDispatch>) -> Self {
        Self { store, courier }
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    pub async fn place(&self, submission: &OrderSubmission) -> PlacementResult {
        match validation::validate(submission) {
            Ok(order) => {
                transition(&order.invoice, Stage::Received, Stage::Validated);
                self.place_validated(order).await
            }
            Err(err) => {
                let invoice = submission.invoice().unwrap_or_default();
                log::warn!("order {}: rejected, invalid fields [{}]", invoice, err.fields.join(", "));
                transition(&invoice, Stage::Received, Stage::Rejected);
                PlacementResult::rejected(submission.invoice().map(str::to_string), err)
            }
        }
    }

    async fn place_validated(&self, order: NewOrder) -> PlacementResult {
        let invoice = order.invoice.clone();

        if let Err(err) = self.store.create_pending(&order).await {
            let kind = match err {
                StoreError::Conflict(_) => {
                    log::warn!("order {}: {}", invoice, err);
                    FailureKind::Conflict
                }
                _ => {
                    log::error!("order {}: could not persist pending order: {}", invoice, err);
                    FailureKind::Store
                }
            };
            transition(&invoice, Stage::Validated, Stage::Errored);
            return PlacementResult::errored(invoice, kind, err.to_string());
        }
        transition(&invoice, Stage::Validated, Stage::PersistedPending);

        let (state, response, reason, failure) = match self.courier.submit(&order).await {
            Ok(result) => {
                transition(&invoice, Stage::PersistedPending, Stage::Dispatched);
                if result.is_accepted() {
                    (FinalState::Confirmed, result.body, None, None)
                } else {
                    let reason = result
                        .body
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("Courier declined the order")
                        .to_string();
                    log::warn!("order {}: courier declined: {}", invoice, reason);
                    (
                        FinalState::Failed,
                        result.body,
                        Some(reason),
                        Some(FailureKind::BusinessRejection),
                    )
                }
            }
            Err(err) => {
                log::warn!("order {}: courier dispatch failed: {}", invoice, err);
                let reason = err.to_string();
                (
                    FinalState::Failed,
                    json!({ "error": reason }),
                    Some(reason),
                    Some(FailureKind::Provider),
                )
            }
        };

        let from = match failure {
            Some(FailureKind::Provider) => Stage::PersistedPending,
            _ => Stage::Dispatched,
        };
        match self.store.finalize(&invoice, state, response).await {
            Ok(order) => {
                transition(&invoice, from, Stage::Finalized(state));
                PlacementResult {
                    order_id: Some(order.invoice),
                    state: match state {
                        FinalState::Confirmed => PlacementState::Confirmed,
                        FinalState::Failed => PlacementState::Failed,
                    },
                    provider_response: order.provider_response,
                    reason,
                    invalid_fields: Vec::new(),
                    failure,
                }
            }
            Err(err) => {
                log::error!(
                    "order {}: could not finalize, order left PENDING: {}",
                    invoice,
                    err
                );
                transition(&invoice, from, Stage::Errored);
                PlacementResult::errored(invoice, FailureKind::Store, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::domain::errors::ProviderError;
    use crate::domain::order::{ListResult, Order, OrderStatus};
    use crate::domain::ports::ProviderResult;
    use crate::infrastructure::memory_store::InMemoryOrderStore;

    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryOrderStore,
        creates: AtomicUsize,
        finalizes: AtomicUsize,
        fail_create: bool,
        fail_finalize: bool,
    }

    #[async_trait]
    impl OrderStore for CountingStore {
        async fn create_pending(&self, order: &NewOrder) -> Result<Order, StoreError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if self.fail_create {
                return Err(StoreError::Internal("connection refused".into()));
            }
            self.inner.create_pending(order).await
        }

        async fn finalize(
            &self,
            invoice: &str,
            state: FinalState,
            provider_response: Value,
        ) -> Result<Order, StoreError> {
            self.finalizes.fetch_add(1, Ordering::SeqCst);
            if self.fail_finalize {
                return Err(StoreError::Internal("connection reset".into()));
            }
            self.inner.finalize(invoice, state, provider_response).await
        }

        async fn find_by_invoice(&self, invoice: &str) -> Result<Option<Order>, StoreError> {
            self.inner.find_by_invoice(invoice).await
        }

        async fn list(
            &self,
            status: Option<OrderStatus>,
            page: i64,
            limit: i64,
        ) -> Result<ListResult, StoreError> {
            self.inner.list(status, page, limit).await
        }
    }

    enum Reply {
        Body(Value),
        Timeout,
    }

    struct StubCourier {
        reply: Reply,
        calls: AtomicUsize,
        seen_pending: Mutex<Option<OrderStatus>>,
        store: Option<Arc<CountingStore>>,
    }

    impl StubCourier {
        fn new(reply: Reply) -> Self {
            StubCourier {
                reply,
                calls: AtomicUsize::new(0),
                seen_pending: Mutex::new(None),
                store: None,
            }
        }
    }

    #[async_trait]
    impl CourierDispatch for StubCourier {
        async fn submit(&self, order: &NewOrder) -> Result<ProviderResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(store) = &self.store {
                let persisted = store.find_by_invoice(&order.invoice).await.unwrap();
                *self.seen_pending.lock() = persisted.map(|o| o.status);
            }
            match &self.reply {
                Reply::Body(body) => Ok(ProviderResult::from_body(body.clone())),
                Reply::Timeout => Err(ProviderError::Timeout(
                    "operation timed out after 30s".into(),
                )),
            }
        }
    }

    fn submission() -> OrderSubmission {
        OrderSubmission {
            invoice: Some("INV-1".to_string().into()),
            user_id: Some("u1".to_string().into()),
            recipient_name: Some("Jane".to_string().into()),
            recipient_phone: Some("555".to_string().into()),
            recipient_address: Some("1 Main St".to_string().into()),
            cod_amount: Some(validation::Field::Valid(42.5)),
            ..Default::default()
        }
    }

    fn setup(store: CountingStore, reply: Reply) -> (Arc<CountingStore>, Arc<StubCourier>, OrderPlacement) {
        let store = Arc::new(store);
        let mut courier = StubCourier::new(reply);
        courier.store = Some(store.clone());
        let courier = Arc::new(courier);
        let placement = OrderPlacement::new(store.clone(), courier.clone());
        (store, courier, placement)
    }

    #[tokio::test]
    async fn accepted_order_is_confirmed() {
        let (store, courier, placement) = setup(
            CountingStore::default(),
            Reply::Body(json!({"consignment": "C123", "status": "success"})),
        );

        let result = placement.place(&submission()).await;

        assert_eq!(result.state, PlacementState::Confirmed);
        assert_eq!(result.order_id.as_deref(), Some("INV-1"));
        assert_eq!(result.failure, None);
        assert_eq!(courier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*courier.seen_pending.lock(), Some(OrderStatus::Pending));

        let order = store.find_by_invoice("INV-1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.provider_response.unwrap()["consignment"], "C123");
    }

    #[tokio::test]
    async fn declined_order_is_failed_with_courier_message() {
        let (store, _courier, placement) = setup(
            CountingStore::default(),
            Reply::Body(json!({"status": "failed", "message": "invalid address"})),
        );

        let result = placement.place(&submission()).await;

        assert_eq!(result.state, PlacementState::Failed);
        assert_eq!(result.failure, Some(FailureKind::BusinessRejection));
        assert_eq!(result.reason.as_deref(), Some("invalid address"));

        let order = store.find_by_invoice("INV-1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.provider_response.unwrap()["message"], "invalid address");
    }

    #[tokio::test]
    async fn courier_timeout_still_finalizes_as_failed() {
        let (store, courier, placement) = setup(CountingStore::default(), Reply::Timeout);

        let result = placement.place(&submission()).await;

        assert_eq!(result.state, PlacementState::Failed);
        assert_eq!(result.failure, Some(FailureKind::Provider));
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
        assert_eq!(store.finalizes.load(Ordering::SeqCst), 1);
        assert_eq!(courier.calls.load(Ordering::SeqCst), 1);

        let order = store.find_by_invoice("INV-1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
        let error = order.provider_response.unwrap()["error"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(error.contains("timed out"), "{error}");
    }

    #[tokio::test]
    async fn invalid_submission_touches_nothing() {
        let (store, courier, placement) = setup(
            CountingStore::default(),
            Reply::Body(json!({"consignment": "C123"})),
        );
        let mut incomplete = submission();
        incomplete.recipient_phone = None;

        let result = placement.place(&incomplete).await;

        assert_eq!(result.state, PlacementState::Rejected);
        assert_eq!(result.invalid_fields, vec!["recipientPhone"]);
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
        assert_eq!(store.finalizes.load(Ordering::SeqCst), 0);
        assert_eq!(courier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_invoice_is_not_dispatched_again() {
        let (store, courier, placement) = setup(
            CountingStore::default(),
            Reply::Body(json!({"consignment": "C123"})),
        );
        placement.place(&submission()).await;

        let mut resubmitted = submission();
        resubmitted.recipient_name = Some("Mallory".to_string().into());
        let result = placement.place(&resubmitted).await;

        assert_eq!(result.state, PlacementState::Errored);
        assert_eq!(result.failure, Some(FailureKind::Conflict));
        assert_eq!(courier.calls.load(Ordering::SeqCst), 1);

        let order = store.find_by_invoice("INV-1").await.unwrap().unwrap();
        assert_eq!(order.recipient_name, "Jane");
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn store_failure_on_create_skips_dispatch() {
        let (_store, courier, placement) = setup(
            CountingStore {
                fail_create: true,
                ..Default::default()
            },
            Reply::Body(json!({"consignment": "C123"})),
        );

        let result = placement.place(&submission()).await;

        assert_eq!(result.state, PlacementState::Errored);
        assert_eq!(result.failure, Some(FailureKind::Store));
        assert_eq!(courier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_failure_on_finalize_is_surfaced() {
        let (store, _courier, placement) = setup(
            CountingStore {
                fail_finalize: true,
                ..Default::default()
            },
            Reply::Body(json!({"consignment": "C123"})),
        );

        let result = placement.place(&submission()).await;

        assert_eq!(result.state, PlacementState::Errored);
        assert_eq!(result.failure, Some(FailureKind::Store));
        let order = store.find_by_invoice("INV-1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.provider_response.is_none());
    }

    #[test]
    fn result_serializes_with_camel_case_keys() {
        let result = PlacementResult::rejected(
            None,
            ValidationErrors {
                fields: vec!["recipientPhone".into()],
            },
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["state"], "REJECTED");
        assert_eq!(value["invalidFields"], json!(["recipientPhone"]));
        assert!(value.get("orderId").is_none());
        assert!(value.get("failure").is_none());
    }
}
