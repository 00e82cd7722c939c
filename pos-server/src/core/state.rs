use std::sync::Arc;

use dashmap::DashMap;
use shared::message::SyncPayload;
use sqlx::SqlitePool;
use tokio::sync::{Mutex, broadcast};

use crate::auth::JwtService;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::sales::StaleDraftWatcher;

/// 事件广播通道容量 (慢订阅者丢弃最旧的事件)
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// 资源版本管理器
///
/// 使用 DashMap 实现无锁并发的版本号管理，每种资源类型维护独立的版本号。
/// broadcast_sync 时自动递增，客户端据此判断数据新旧。
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 递增指定资源的版本号并返回新值 (从 1 开始)
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号，不存在返回 0
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

/// 服务器状态 - 持有所有服务的共享引用
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | pool | SQLite 连接池 |
/// | jwt_service | JWT 认证服务 |
/// | resource_versions | 资源版本管理 |
/// | events | 同步事件广播 (SSE 订阅) |
/// | sales_lock | 串行化草稿单/结账写操作 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub resource_versions: Arc<ResourceVersions>,
    pub events: broadcast::Sender<SyncPayload>,
    pub sales_lock: Arc<Mutex<()>>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 工作目录结构
    /// 2. 数据库 (迁移)
    /// 3. 首次启动数据 (分店、桌台、设置、管理员)
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_path();
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;
        Self::with_pool(config.clone(), db_service.pool).await
    }

    /// 使用已打开的连接池构造状态 (测试使用内存数据库)
    pub async fn with_pool(config: Config, pool: SqlitePool) -> Result<Self> {
        crate::db::seed::bootstrap(&pool, &config)
            .await
            .map_err(|e| ServerError::Database(e.to_string()))?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Ok(Self {
            config,
            pool,
            jwt_service,
            resource_versions: Arc::new(ResourceVersions::new()),
            events,
            sales_lock: Arc::new(Mutex::new(())),
        })
    }

    /// 启动后台任务
    ///
    /// - 滞留草稿单检测 (Periodic)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let watcher = StaleDraftWatcher::new(self.clone(), tasks.shutdown_token());
        tasks.spawn("stale_draft_watcher", TaskKind::Periodic, watcher.run());

        tasks.log_summary();
        tasks
    }

    /// 获取 JWT 服务
    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    /// 业务时区
    pub fn tz(&self) -> chrono_tz::Tz {
        self.config.timezone
    }

    /// 订阅同步事件
    pub fn subscribe(&self) -> broadcast::Receiver<SyncPayload> {
        self.events.subscribe()
    }

    /// 广播同步消息 (全局资源)
    ///
    /// 向所有 SSE 订阅者广播资源变更通知，版本号由 ResourceVersions 递增。
    ///
    /// - `resource`: 资源类型 ("settings", "menu", "payment", ...)
    /// - `action`: 变更类型 ("created", "updated", "deleted", ...)
    /// - `id`: 资源 ID
    /// - `data`: 资源数据 (deleted 时为 None)
    pub async fn broadcast_sync<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        data: Option<&T>,
    ) {
        self.publish(resource, action, id, None, data);
    }

    /// 广播分店范围的同步消息 (草稿单、桌台、发票、布局)
    ///
    /// 订阅端只把它转发给在 `branch` 有查看权限的用户。
    pub async fn broadcast_branch_sync<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        branch: &str,
        data: Option<&T>,
    ) {
        self.publish(resource, action, id, Some(branch), data);
    }

    fn publish<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        branch: Option<&str>,
        data: Option<&T>,
    ) {
        let version = self.resource_versions.increment(resource);
        let payload = SyncPayload {
            resource: resource.to_string(),
            version,
            action: action.to_string(),
            id: id.to_string(),
            branch: branch.map(str::to_string),
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        // 无订阅者时 send 返回 Err，忽略即可
        if self.events.send(payload).is_err() {
            tracing::trace!(resource, action, "No event subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_versions_increment_independently() {
        let versions = ResourceVersions::new();
        assert_eq!(versions.get("draft"), 0);
        assert_eq!(versions.increment("draft"), 1);
        assert_eq!(versions.increment("draft"), 2);
        assert_eq!(versions.increment("table"), 1);
        assert_eq!(versions.get("draft"), 2);
    }
}
