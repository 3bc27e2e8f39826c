use actix_web::{http::StatusCode, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::application::order_placement::{FailureKind, PlacementResult, PlacementState};
use crate::application::submission::Submission;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::validation::OrderSubmission;
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub invoice: String,
    pub user_id: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    /// Decimal amount as a string, e.g. "42.50"
    pub cod_amount: String,
    pub note: Option<String>,
    pub item_description: Option<String>,
    pub delivery_type: i16,
    pub status: String,
    #[schema(value_type = Option<Object>)]
    pub provider_response: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        OrderResponse {
            invoice: o.invoice,
            user_id: o.user_id,
            recipient_name: o.recipient_name,
            recipient_phone: o.recipient_phone,
            recipient_address: o.recipient_address,
            cod_amount: o.cod_amount.to_string(),
            note: o.note,
            item_description: o.item_description,
            delivery_type: o.delivery_type.code(),
            status: o.status.to_string(),
            provider_response: o.provider_response,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Only return orders in this state (PENDING, CONFIRMED or FAILED).
    pub status: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Placement responses ──────────────────────────────────────────────────────

/// HTTP status for a finished placement. A courier-side failure is still a
/// successfully handled request.
pub fn placement_status(result: &PlacementResult) -> StatusCode {
    match (result.state, result.failure) {
        (PlacementState::Confirmed, _) => StatusCode::CREATED,
        (PlacementState::Failed, _) => StatusCode::OK,
        (PlacementState::Rejected, _) => StatusCode::BAD_REQUEST,
        (PlacementState::Errored, Some(FailureKind::Conflict)) => StatusCode::CONFLICT,
        (PlacementState::Errored, _) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn placement_response(mut result: PlacementResult) -> HttpResponse {
    let status = placement_status(&result);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        result.reason = Some("Internal server error".to_string());
    }
    HttpResponse::build(status).json(result)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Validates the submission, records it as PENDING, hands it to the courier
/// and records the courier's verdict before answering.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = OrderSubmission,
    responses(
        (status = 201, description = "Order confirmed by the courier", body = PlacementResult),
        (status = 200, description = "Order recorded but declined or unreachable courier", body = PlacementResult),
        (status = 400, description = "Missing or invalid fields", body = PlacementResult),
        (status = 409, description = "Invoice already exists", body = PlacementResult),
        (status = 500, description = "Internal server error", body = PlacementResult),
    ),
    tag = "orders"
)]
pub async fn place_order(
    state: web::Data<AppState>,
    body: web::Json<OrderSubmission>,
) -> Result<HttpResponse, AppError> {
    let submission = Submission::Canonical(body.into_inner())
        .into_canonical(state.identity.as_deref(), chrono::Utc::now())?;
    let result = state.placement.place(&submission).await;
    Ok(placement_response(result))
}

/// GET /orders/{invoice}
#[utoipa::path(
    get,
    path = "/orders/{invoice}",
    params(
        ("invoice" = String, Path, description = "Order invoice"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let invoice = path.into_inner();
    match state.placement.store().find_by_invoice(&invoice).await? {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
        None => Err(AppError::NotFound),
    }
}

/// GET /orders
///
/// Returns a paginated list of orders, newest first.
/// Use `page` (1-based) and `limit` to control pagination and `status` to
/// look for orders stuck in a given state.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("status" = Option<String>, Query, description = "PENDING, CONFIRMED or FAILED"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let status = params
        .status
        .as_deref()
        .map(|s| s.trim().to_ascii_uppercase().parse::<OrderStatus>())
        .transpose()
        .map_err(AppError::BadRequest)?;

    let result = state.placement.store().list(status, page, limit).await?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}
