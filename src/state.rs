use std::sync::Arc;

use crate::application::order_placement::OrderPlacement;
use crate::domain::ports::IdentityVerifier;

/// Shared request state, built once in `main` from the loaded config.
#[derive(Clone)]
pub struct AppState {
    pub placement: OrderPlacement,
    pub identity: Option<Arc<dyn IdentityVerifier>>,
}
