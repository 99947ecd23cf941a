/// 服务器配置 - 所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/neurodesk | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | AI_SERVICE_URL | (未设置) | AI 派单服务地址；未设置则禁用自动派单 |
/// | AI_TIMEOUT_MS | 30000 | AI 服务调用超时(毫秒) |
/// | RESTRICT_REACTIVATE | false | 仅允许从 cancelled 状态重新激活 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/neurodesk AI_SERVICE_URL=http://localhost:8000 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// AI 派单/评估服务 URL (None → 自动派单禁用)
    pub ai_service_url: Option<String>,
    /// AI 服务调用超时 (毫秒) — 限制创建工单阻塞在 AI 调用上的时长
    pub ai_timeout_ms: u64,
    /// 重新激活策略：true 时仅允许 cancelled → new
    pub restrict_reactivate: bool,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/neurodesk".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            ai_service_url: std::env::var("AI_SERVICE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            ai_timeout_ms: std::env::var("AI_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30_000),
            restrict_reactivate: std::env::var("RESTRICT_REACTIVATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库目录: work_dir/database
    pub fn database_dir(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录: work_dir/logs
    pub fn logs_dir(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
