//! Completeness checks run on an inbound order before any side effect.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use utoipa::ToSchema;

use super::errors::ValidationErrors;
use super::order::{DeliveryType, NewOrder};

// Widths of the varchar columns in `orders`.
pub const MAX_INVOICE_LEN: usize = 64;
pub const MAX_USER_ID_LEN: usize = 128;
pub const MAX_PHONE_LEN: usize = 32;

/// A submitted field: a value of the expected JSON type, or whatever arrived
/// in its place.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Valid(T),
    Malformed(Value),
}

impl<T> Field<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Field::Valid(value) => Some(value),
            Field::Malformed(_) => None,
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Valid(value)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(match T::deserialize(&raw) {
            Ok(value) => Field::Valid(value),
            Err(_) => Field::Malformed(raw),
        })
    }
}

/// The canonical flat order submission, as received. Every field is optional
/// and loosely typed here so that missing or mistyped fields can be reported
/// by name.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    #[schema(value_type = Option<String>)]
    pub invoice: Option<Field<String>>,
    #[serde(alias = "user_id")]
    #[schema(value_type = Option<String>)]
    pub user_id: Option<Field<String>>,
    #[serde(alias = "recipient_name")]
    #[schema(value_type = Option<String>)]
    pub recipient_name: Option<Field<String>>,
    #[serde(alias = "recipient_phone")]
    #[schema(value_type = Option<String>)]
    pub recipient_phone: Option<Field<String>>,
    #[serde(alias = "recipient_address")]
    #[schema(value_type = Option<String>)]
    pub recipient_address: Option<Field<String>>,
    #[serde(alias = "cod_amount")]
    #[schema(value_type = Option<f64>)]
    pub cod_amount: Option<Field<f64>>,
    #[schema(value_type = Option<String>)]
    pub note: Option<Field<String>>,
    #[serde(alias = "item_description")]
    #[schema(value_type = Option<String>)]
    pub item_description: Option<Field<String>>,
    #[serde(alias = "delivery_type")]
    #[schema(value_type = Option<i64>)]
    pub delivery_type: Option<Field<i64>>,
}

impl OrderSubmission {
    /// The invoice as submitted, if it arrived as a string.
    pub fn invoice(&self) -> Option<&str> {
        self.invoice.as_ref().and_then(Field::valid).map(String::as_str)
    }
}

/// Check `submission` and turn it into a [`NewOrder`].
///
/// Pure: no I/O. All offending fields are collected, in declaration order.
pub fn validate(submission: &OrderSubmission) -> Result<NewOrder, ValidationErrors> {
    let mut fields = Vec::new();

    let invoice = required_text(&submission.invoice, "invoice", MAX_INVOICE_LEN, &mut fields);
    let user_id = required_text(&submission.user_id, "userId", MAX_USER_ID_LEN, &mut fields);
    let recipient_name =
        required_text(&submission.recipient_name, "recipientName", usize::MAX, &mut fields);
    let recipient_phone =
        required_text(&submission.recipient_phone, "recipientPhone", MAX_PHONE_LEN, &mut fields);
    let recipient_address = required_text(
        &submission.recipient_address,
        "recipientAddress",
        usize::MAX,
        &mut fields,
    );

    let cod_amount = match submission.cod_amount.as_ref().and_then(Field::valid) {
        Some(&amount) if amount.is_finite() && amount >= 0.0 => {
            BigDecimal::from_str(&amount.to_string()).ok()
        }
        _ => None,
    };
    if cod_amount.is_none() {
        fields.push("codAmount".to_string());
    }

    let note = optional_text(&submission.note, "note", &mut fields);
    let item_description =
        optional_text(&submission.item_description, "itemDescription", &mut fields);

    let delivery_type = match &submission.delivery_type {
        None => Some(DeliveryType::default()),
        Some(Field::Valid(code)) => DeliveryType::try_from(*code).ok(),
        Some(Field::Malformed(_)) => None,
    };
    if delivery_type.is_none() {
        fields.push("deliveryType".to_string());
    }

    match (
        invoice,
        user_id,
        recipient_name,
        recipient_phone,
        recipient_address,
        cod_amount,
        delivery_type,
    ) {
        (
            Some(invoice),
            Some(user_id),
            Some(recipient_name),
            Some(recipient_phone),
            Some(recipient_address),
            Some(cod_amount),
            Some(delivery_type),
        ) if fields.is_empty() => Ok(NewOrder {
            invoice,
            user_id,
            recipient_name,
            recipient_phone,
            recipient_address,
            cod_amount,
            note,
            item_description,
            delivery_type,
        }),
        _ => Err(ValidationErrors { fields }),
    }
}

fn required_text(
    value: &Option<Field<String>>,
    name: &str,
    max_len: usize,
    fields: &mut Vec<String>,
) -> Option<String> {
    let text = value
        .as_ref()
        .and_then(Field::valid)
        .and_then(|s| non_blank(s))
        .filter(|s| s.chars().count() <= max_len);
    if text.is_none() {
        fields.push(name.to_string());
    }
    text
}

fn optional_text(
    value: &Option<Field<String>>,
    name: &str,
    fields: &mut Vec<String>,
) -> Option<String> {
    match value {
        None => None,
        Some(Field::Valid(s)) => non_blank(s),
        Some(Field::Malformed(_)) => {
            fields.push(name.to_string());
            None
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
