use actix_web::{web, HttpResponse};

use crate::application::order_placement::PlacementResult;
use crate::application::submission::{LegacyCheckout, Submission};
use crate::errors::AppError;
use crate::handlers::orders::placement_response;
use crate::state::AppState;

/// POST /checkout
///
/// Storefront checkout payload: `{ token, order: { items, customerInfo, total, … } }`.
/// The token is verified, an invoice is generated, and the order then goes
/// through the same placement as `POST /orders`.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = LegacyCheckout,
    responses(
        (status = 201, description = "Order confirmed by the courier", body = PlacementResult),
        (status = 200, description = "Order recorded but declined or unreachable courier", body = PlacementResult),
        (status = 400, description = "Missing or invalid fields", body = PlacementResult),
        (status = 401, description = "Missing or invalid identity token"),
        (status = 500, description = "Internal server error", body = PlacementResult),
    ),
    tag = "checkout"
)]
pub async fn checkout(
    state: web::Data<AppState>,
    body: web::Json<LegacyCheckout>,
) -> Result<HttpResponse, AppError> {
    let submission = Submission::LegacyNested(body.into_inner())
        .into_canonical(state.identity.as_deref(), chrono::Utc::now())?;
    let result = state.placement.place(&submission).await;
    Ok(placement_response(result))
}
