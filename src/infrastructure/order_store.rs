use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::Value;

use crate::db::DbPool;
use crate::domain::errors::StoreError;
use crate::domain::order::{FinalState, ListResult, NewOrder, Order, OrderStatus};
use crate::domain::ports::OrderStore;
use crate::schema::orders;

use super::models::{NewOrderRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for StoreError {
    fn from(e: DieselError) -> Self {
        StoreError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        StoreError::Internal(e.to_string())
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DieselOrderStore {
    pool: DbPool,
}

impl DieselOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run a blocking diesel call on the blocking thread pool.
    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?
    }
}

#[async_trait]
impl OrderStore for DieselOrderStore {
    async fn create_pending(&self, order: &NewOrder) -> Result<Order, StoreError> {
        let order = order.clone();
        self.run(move |conn| {
            let inserted = diesel::insert_into(orders::table)
                .values(&NewOrderRow::pending(&order, Utc::now()))
                .returning(OrderRow::as_returning())
                .get_result::<OrderRow>(conn);

            match inserted {
                Ok(row) => Order::try_from(row),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    Err(StoreError::Conflict(order.invoice))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn finalize(
        &self,
        invoice: &str,
        state: FinalState,
        provider_response: Value,
    ) -> Result<Order, StoreError> {
        let invoice = invoice.to_string();
        let status = OrderStatus::from(state);
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let current: Option<String> = orders::table
                    .find(&invoice)
                    .select(orders::status)
                    .for_update()
                    .first(conn)
                    .optional()?;

                let Some(current) = current else {
                    return Err(StoreError::NotFound(invoice.clone()));
                };
                if current != OrderStatus::Pending.as_str() {
                    log::error!(
                        "refusing to finalize order {} as {}: already {}",
                        invoice,
                        status,
                        current
                    );
                    return Err(StoreError::AlreadyFinalized {
                        invoice: invoice.clone(),
                        status: current,
                    });
                }

                let row: OrderRow = diesel::update(orders::table.find(&invoice))
                    .set((
                        orders::status.eq(status.as_str()),
                        orders::provider_response.eq(Some(provider_response)),
                        orders::updated_at.eq(Utc::now()),
                    ))
                    .returning(OrderRow::as_returning())
                    .get_result(conn)?;
                Order::try_from(row)
            })
        })
        .await
    }

    async fn find_by_invoice(&self, invoice: &str) -> Result<Option<Order>, StoreError> {
        let invoice = invoice.to_string();
        self.run(move |conn| {
            orders::table
                .find(&invoice)
                .select(OrderRow::as_select())
                .first::<OrderRow>(conn)
                .optional()?
                .map(Order::try_from)
                .transpose()
        })
        .await
    }

    async fn list(
        &self,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, StoreError> {
        let offset = page.saturating_sub(1).saturating_mul(limit);
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let mut count_query = orders::table
                    .select(diesel::dsl::count_star())
                    .into_boxed::<Pg>();
                let mut rows_query = orders::table
                    .select(OrderRow::as_select())
                    .into_boxed::<Pg>();
                if let Some(status) = status {
                    count_query = count_query.filter(orders::status.eq(status.as_str()));
                    rows_query = rows_query.filter(orders::status.eq(status.as_str()));
                }

                let total: i64 = count_query.get_result(conn)?;
                let rows: Vec<OrderRow> = rows_query
                    .order((orders::created_at.desc(), orders::invoice.asc()))
                    .limit(limit)
                    .offset(offset)
                    .load(conn)?;

                Ok(ListResult {
                    items: rows
                        .into_iter()
                        .map(Order::try_from)
                        .collect::<Result<_, _>>()?,
                    total,
                })
            })
        })
        .await
    }
}
