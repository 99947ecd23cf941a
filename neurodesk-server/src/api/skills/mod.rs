//! Skill API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Skill router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/skills", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
