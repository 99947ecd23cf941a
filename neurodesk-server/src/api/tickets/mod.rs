//! Ticket API Module
//!
//! The only write path for tickets: every mutation goes through the
//! lifecycle manager, which owns validation, the state machine and the
//! audit trail. Creation triggers the AI assignment resolver when no
//! technician was supplied and a service endpoint is configured.

mod handler;

use axum::{
    Router,
    routing::{delete, get, patch, put},
};

use crate::core::ServerState;

/// Ticket router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/tickets", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/all", get(handler::list_simple))
        .route("/by-skills", get(handler::list_by_skills))
        .route("/user/{user_id}", get(handler::list_by_user))
        .route("/technician/{technician_id}", get(handler::list_by_technician))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::cancel),
        )
        .route("/{id}/close", put(handler::close))
        .route("/{id}/permanent", delete(handler::delete_permanent))
        .route("/{id}/reactivate", patch(handler::reactivate))
}
