//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册 / 登录
//! - [`users`] - 用户管理接口
//! - [`skills`] - 技能管理接口
//! - [`technicians`] - 技师管理接口
//! - [`tickets`] - 工单接口 (创建时触发 AI 派单)

pub mod convert;

pub mod auth;
pub mod health;
pub mod pagination;
pub mod skills;
pub mod technicians;
pub mod tickets;
pub mod users;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
pub use pagination::Pagination;

/// Assemble the full application router with its middleware stack
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(users::router())
        .merge(skills::router())
        .merge(technicians::router())
        .merge(tickets::router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
