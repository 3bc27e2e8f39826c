use std::io;
use std::sync::Arc;

use checkout_service::application::order_placement::OrderPlacement;
use checkout_service::config::AppConfig;
use checkout_service::domain::ports::IdentityVerifier;
use checkout_service::infrastructure::identity::JwtIdentityVerifier;
use checkout_service::infrastructure::order_store::DieselOrderStore;
use checkout_service::infrastructure::steadfast::SteadfastClient;
use checkout_service::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    let pool = create_pool(config.database_url.expose()).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;

    let courier = SteadfastClient::new(&config.courier).map_err(io::Error::other)?;
    let identity = config.auth_jwt_secret.as_ref().map(|secret| {
        Arc::new(JwtIdentityVerifier::new(secret)) as Arc<dyn IdentityVerifier>
    });
    if identity.is_none() {
        log::warn!("AUTH_JWT_SECRET is not set; POST /checkout will refuse every request");
    }

    let state = AppState {
        placement: OrderPlacement::new(
            Arc::new(DieselOrderStore::new(pool)),
            Arc::new(courier),
        ),
        identity,
    };

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
