use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::ai::AiServiceClient;
use crate::core::Config;
use crate::db::DbService;
use crate::tickets::TicketLifecycle;

/// 服务器状态 - 持有所有服务的单例引用
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | lifecycle | TicketLifecycle | 工单状态机 + 审计编排 |
/// | ai | Option<Arc<AiServiceClient>> | AI 派单/评估服务客户端 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 工单生命周期管理器 (唯一的工单写入方)
    pub lifecycle: TicketLifecycle,
    /// AI 服务客户端 (未配置时为 None，自动派单禁用)
    pub ai: Option<Arc<AiServiceClient>>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/neurodesk.db)
    /// 3. AI 服务客户端 (如果配置了 AI_SERVICE_URL)
    /// 4. 工单生命周期管理器
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("neurodesk.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        Self::with_db(config, db_service.db)
    }

    /// 用内存数据库初始化 (测试场景)
    pub async fn initialize_in_memory(config: &Config) -> Self {
        let db_service = DbService::open_in_memory()
            .await
            .expect("Failed to initialize in-memory database");
        Self::with_db(config, db_service.db)
    }

    fn with_db(config: &Config, db: Surreal<Db>) -> Self {
        let ai = config.ai_service_url.as_ref().map(|url| {
            let timeout = Duration::from_millis(config.ai_timeout_ms);
            Arc::new(
                AiServiceClient::new(url.clone(), timeout)
                    .expect("Failed to build AI service client"),
            )
        });

        match &config.ai_service_url {
            Some(url) => tracing::info!(url = %url, "AI assignment service enabled"),
            None => tracing::info!("AI assignment service not configured — automatic assignment disabled"),
        }

        let lifecycle = TicketLifecycle::new(db.clone(), ai.clone(), config.restrict_reactivate);

        Self {
            config: config.clone(),
            db,
            lifecycle,
            ai,
        }
    }
}
