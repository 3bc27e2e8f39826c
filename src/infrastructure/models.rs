use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use crate::domain::errors::StoreError;
use crate::domain::order::{DeliveryType, NewOrder, Order};
use crate::schema::orders;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(primary_key(invoice))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub invoice: String,
    pub user_id: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub cod_amount: BigDecimal,
    pub note: Option<String>,
    pub item_description: Option<String>,
    pub delivery_type: i16,
    pub status: String,
    pub provider_response: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub invoice: &'a str,
    pub user_id: &'a str,
    pub recipient_name: &'a str,
    pub recipient_phone: &'a str,
    pub recipient_address: &'a str,
    pub cod_amount: &'a BigDecimal,
    pub note: Option<&'a str>,
    pub item_description: Option<&'a str>,
    pub delivery_type: i16,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewOrderRow<'a> {
    pub fn pending(order: &'a NewOrder, now: DateTime<Utc>) -> Self {
        NewOrderRow {
            invoice: &order.invoice,
            user_id: &order.user_id,
            recipient_name: &order.recipient_name,
            recipient_phone: &order.recipient_phone,
            recipient_address: &order.recipient_address,
            cod_amount: &order.cod_amount,
            note: order.note.as_deref(),
            item_description: order.item_description.as_deref(),
            delivery_type: order.delivery_type.code(),
            status: "PENDING",
            created_at: now,
            updated_at: now,
        }
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(StoreError::Internal)?;
        let delivery_type = DeliveryType::try_from(i64::from(row.delivery_type)).map_err(|code| {
            StoreError::Internal(format!(
                "order {} has unknown delivery type {}",
                row.invoice, code
            ))
        })?;
        Ok(Order {
            invoice: row.invoice,
            user_id: row.user_id,
            recipient_name: row.recipient_name,
            recipient_phone: row.recipient_phone,
            recipient_address: row.recipient_address,
            cod_amount: row.cod_amount,
            note: row.note,
            item_description: row.item_description,
            delivery_type,
            status,
            provider_response: row.provider_response,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
