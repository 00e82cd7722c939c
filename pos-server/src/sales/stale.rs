//! 滞留草稿单检测
//!
//! 周期扫描超过 `DRAFT_STALE_MINUTES` 未更新的 open 草稿单，
//! 广播 `draft`/`stale` 通知前端提示。每个 (草稿单, 版本) 只通知一次。

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::DRAFT_RESOURCE;
use crate::core::ServerState;
use crate::db::repository::draft_order;

/// 滞留草稿单检测器
///
/// 注册为 `TaskKind::Periodic`，在 `start_background_tasks()` 中启动。
pub struct StaleDraftWatcher {
    state: ServerState,
    shutdown: CancellationToken,
    /// draft id → 已通知的版本
    notified: Mutex<HashMap<i64, i64>>,
}

impl StaleDraftWatcher {
    pub fn new(state: ServerState, shutdown: CancellationToken) -> Self {
        Self {
            state,
            shutdown,
            notified: Mutex::new(HashMap::new()),
        }
    }

    /// 主循环：启动扫描 + 固定间隔扫描
    pub async fn run(self) {
        let interval = Duration::from_secs(self.state.config.stale_check_interval_secs.max(1));
        tracing::info!(
            interval_secs = interval.as_secs(),
            stale_minutes = self.state.config.draft_stale_minutes,
            "Stale draft watcher started"
        );

        loop {
            self.scan().await;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Stale draft watcher received shutdown signal");
                    return;
                }
            }
        }
    }

    /// 扫描一次，返回本次新通知的数量
    pub async fn scan(&self) -> usize {
        let cutoff = shared::util::now_millis() - self.state.config.draft_stale_minutes * 60_000;
        let drafts = match draft_order::find_stale(&self.state.pool, cutoff).await {
            Ok(drafts) => drafts,
            Err(e) => {
                tracing::error!("Failed to scan stale drafts: {}", e);
                return 0;
            }
        };

        let fresh: Vec<_> = {
            let mut notified = self.notified.lock();
            notified.retain(|id, _| drafts.iter().any(|d| d.id == *id));
            drafts
                .into_iter()
                .filter(|d| notified.insert(d.id, d.version) != Some(d.version))
                .collect()
        };

        if fresh.is_empty() {
            tracing::debug!("No new stale drafts");
            return 0;
        }

        tracing::info!("Detected {} stale draft(s)", fresh.len());
        for draft in &fresh {
            tracing::info!(
                draft_id = draft.id,
                branch = %draft.branch_code,
                table = draft.table_number,
                version = draft.version,
                "Draft is stale"
            );
            self.state
                .broadcast_branch_sync(DRAFT_RESOURCE, "stale", &draft.id.to_string(), &draft.branch_code, Some(draft))
                .await;
        }
        fresh.len()
    }
}
