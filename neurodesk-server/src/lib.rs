//! NeuroDesk Server - ITSM 工单管理后端
//!
//! # 架构概述
//!
//! 本模块是 NeuroDesk 后端的主入口，提供以下核心功能：
//!
//! - **工单生命周期** (`tickets`): 状态机、派生时间戳、审计追踪
//! - **AI 辅助派单** (`ai`): 外部 AI 服务客户端 + 容错响应解析
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! neurodesk-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (模型、仓储)
//! ├── tickets/       # 工单领域核心 (生命周期、派单、审计)
//! ├── ai/            # AI 服务客户端
//! └── utils/         # 错误、日志、校验工具
//! ```

pub mod ai;
pub mod api;
pub mod core;
pub mod db;
pub mod tickets;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use tickets::{AuditAction, AuditEntry, TicketLifecycle};
pub use utils::{AppError, AppResult};

/// 设置运行环境: dotenv + 日志
pub fn setup_environment() -> anyhow::Result<()> {
    // Load .env if present (ignored when missing)
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    utils::logger::init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    _   __                     ____            __
   / | / /__  __  ___________ / __ \___  _____/ /__
  /  |/ / _ \/ / / / ___/ __ \/ / / / _ \/ ___/ //_/
 / /|  /  __/ /_/ / /  / /_/ / /_/ /  __(__  ) ,<
/_/ |_/\___/\__,_/_/   \____/_____/\___/____/_/|_|
    "#
    );
}
