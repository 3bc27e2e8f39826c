pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod state;

use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, run_migrations, DbPool, MIGRATIONS};
pub use state::AppState;

use errors::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::place_order,
        handlers::orders::get_order,
        handlers::orders::list_orders,
        handlers::checkout::checkout,
    ),
    components(schemas(
        domain::validation::OrderSubmission,
        application::submission::LegacyCheckout,
        application::submission::LegacyOrder,
        application::submission::LegacyItem,
        application::submission::CustomerInfo,
        application::order_placement::PlacementResult,
        application::order_placement::PlacementState,
        handlers::orders::OrderResponse,
        handlers::orders::ListOrdersResponse,
    )),
    tags(
        (name = "orders", description = "Order placement and lookup"),
        (name = "checkout", description = "Storefront checkout"),
    )
)]
pub struct ApiDoc;

/// Register every route on `cfg`. Shared by the server and by tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }))
    .route(
        "/health",
        web::get().to(|| async { HttpResponse::Ok().json(serde_json::json!({"status": "ok"})) }),
    )
    .service(
        web::scope("/orders")
            .route("", web::post().to(handlers::orders::place_order))
            .route("", web::get().to(handlers::orders::list_orders))
            .route("/{invoice}", web::get().to(handlers::orders::get_order)),
    )
    .route("/checkout", web::post().to(handlers::checkout::checkout));
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
