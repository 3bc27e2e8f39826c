//! Inbound submission shapes and their mapping onto [`OrderSubmission`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::AuthError;
use crate::domain::ports::IdentityVerifier;
use crate::domain::validation::{Field, OrderSubmission};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCheckout {
    pub token: Option<String>,
    pub order: LegacyOrder,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LegacyOrder {
    #[serde(default)]
    pub items: Vec<LegacyItem>,
    #[serde(default)]
    pub customer_info: CustomerInfo,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub shipping: Option<f64>,
    #[schema(value_type = Option<f64>)]
    pub total: Option<Field<f64>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LegacyItem {
    pub name: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub price: Option<f64>,
    pub size: Option<String>,
    pub color: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CustomerInfo {
    #[schema(value_type = Option<String>)]
    pub name: Option<Field<String>>,
    #[schema(value_type = Option<String>)]
    pub mobile: Option<Field<String>>,
    #[schema(value_type = Option<String>)]
    pub address: Option<Field<String>>,
    #[schema(value_type = Option<String>)]
    pub note: Option<Field<String>>,
}

/// Every accepted shape of an order submission.
#[derive(Debug, Clone)]
pub enum Submission {
    Canonical(OrderSubmission),
    LegacyNested(LegacyCheckout),
}

impl Submission {
    /// Map onto the canonical flat submission. Only the legacy shape needs an
    /// identity check; its invoice is generated here.
    pub fn into_canonical(
        self,
        verifier: Option<&dyn IdentityVerifier>,
        now: DateTime<Utc>,
    ) -> Result<OrderSubmission, AuthError> {
        match self {
            Submission::Canonical(submission) => Ok(submission),
            Submission::LegacyNested(checkout) => {
                let token = checkout
                    .token
                    .as_deref()
                    .filter(|t| !t.trim().is_empty())
                    .ok_or(AuthError::MissingToken)?;
                let verifier = verifier.ok_or(AuthError::NotConfigured)?;
                let user_id = verifier.verify(token)?;

                let order = checkout.order;
                Ok(OrderSubmission {
                    invoice: Some(generate_invoice(now).into()),
                    user_id: Some(user_id.into()),
                    recipient_name: order.customer_info.name,
                    recipient_phone: order.customer_info.mobile,
                    recipient_address: order.customer_info.address,
                    cod_amount: order.total,
                    note: order.customer_info.note,
                    item_description: describe_items(&order.items).map(Field::from),
                    delivery_type: Some(Field::Valid(0)),
                })
            }
        }
    }
}

/// `INV-<yyyymmdd>-<8 hex>`, e.g. `INV-20250301-9F2C41AB`.
pub fn generate_invoice(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "INV-{}-{}",
        now.format("%Y%m%d"),
        suffix[..8].to_ascii_uppercase()
    )
}

fn describe_items(items: &[LegacyItem]) -> Option<String> {
    let lines: Vec<String> = items
        .iter()
        .filter_map(|item| {
            let name = item.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
            let variants: Vec<&str> = [item.size.as_deref(), item.color.as_deref()]
                .into_iter()
                .flatten()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect();
            Some(if variants.is_empty() {
                format!("{} x {}", item.quantity, name)
            } else {
                format!("{} x {} ({})", item.quantity, name, variants.join(", "))
            })
        })
        .collect();
    (!lines.is_empty()).then(|| lines.join(", "))
}
