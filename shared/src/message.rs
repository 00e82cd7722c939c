//! Sync event payload (服务端 -> 客户端)

use serde::{Deserialize, Serialize};

/// 资源变更通知
///
/// 通过 `/api/events` (SSE) 推送给 POS 与桌台页面，替代轮询。
///
/// # 示例
///
/// - `resource`: "table"
/// - `version`: 42
/// - `action`: "occupied"
/// - `id`: "china_town:7"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    /// 资源类型 (例如: "draft", "table", "invoice")
    pub resource: String,
    /// 版本号 (每种资源独立递增)
    pub version: u64,
    /// 变更类型 (例如: "created", "updated", "deleted")
    pub action: String,
    /// 资源 ID
    pub id: String,
    /// 所属分店 (分店范围的资源才有，订阅端据此过滤)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// 资源数据 (可选，deleted 时为 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
