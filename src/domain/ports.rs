use async_trait::async_trait;
use serde_json::Value;

use super::errors::{AuthError, ProviderError, StoreError};
use super::order::{FinalState, ListResult, NewOrder, Order, OrderStatus};

/// Durable home of [`Order`] records. `create_pending` and `finalize` are the
/// only mutations.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Insert `order` as `PENDING`. Fails with [`StoreError::Conflict`] when
    /// the invoice already exists; the existing record is left untouched.
    async fn create_pending(&self, order: &NewOrder) -> Result<Order, StoreError>;

    /// Move a `PENDING` order to `state` and attach the courier's response.
    async fn finalize(
        &self,
        invoice: &str,
        state: FinalState,
        provider_response: Value,
    ) -> Result<Order, StoreError>;

    async fn find_by_invoice(&self, invoice: &str) -> Result<Option<Order>, StoreError>;

    async fn list(
        &self,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, StoreError>;
}

/// What the courier said about a submitted order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResult {
    /// Present only when the courier accepted the shipment.
    pub consignment: Option<Value>,
    /// The full response body, as returned.
    pub body: Value,
}

impl ProviderResult {
    pub fn from_body(body: Value) -> Self {
        let consignment = body.get("consignment").filter(|c| is_truthy(c)).cloned();
        ProviderResult { consignment, body }
    }

    pub fn is_accepted(&self) -> bool {
        self.consignment.is_some()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[async_trait]
pub trait CourierDispatch: Send + Sync + 'static {
    /// Submit `order` to the courier. Exactly one outbound call, no retry.
    async fn submit(&self, order: &NewOrder) -> Result<ProviderResult, ProviderError>;
}

/// Turns an opaque bearer token into the id of the user it was issued to.
pub trait IdentityVerifier: Send + Sync + 'static {
    fn verify(&self, token: &str) -> Result<String, AuthError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn consignment_string_counts_as_accepted() {
        let result = ProviderResult::from_body(json!({"consignment": "C123", "status": "success"}));
        assert!(result.is_accepted());
        assert_eq!(result.consignment, Some(json!("C123")));
    }

    #[test]
    fn consignment_object_counts_as_accepted() {
        let result = ProviderResult::from_body(json!({
            "status": 200,
            "consignment": {"consignment_id": 1424107, "tracking_code": "15BAEB8A"}
        }));
        assert!(result.is_accepted());
    }

    #[test]
    fn missing_or_falsy_consignment_is_a_rejection() {
        for body in [
            json!({"status": "failed", "message": "invalid address"}),
            json!({"consignment": null}),
            json!({"consignment": ""}),
            json!({"consignment": false}),
            json!({"consignment": 0}),
            json!({"consignment": {}}),
            json!([1, 2, 3]),
        ] {
            let result = ProviderResult::from_body(body.clone());
            assert!(!result.is_accepted(), "{body} should not be accepted");
            assert_eq!(result.body, body);
        }
    }
}
