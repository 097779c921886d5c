//! Route definitions for printing and the spooler queue.
//!
//! ```text
//! POST /print/{id}     print_file
//! GET  /queue          get_queue
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::printing;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/print/{id}", post(printing::print_file))
        .route("/queue", get(printing::get_queue))
}
