//! 实时同步推送 (Server-Sent Events)
//!
//! `GET /api/events` 需要登录。每条 [`SyncPayload`] 以 `event: sync` 推送，
//! 客户端按 `resource` + `version` 判断是否需要刷新。
//! 订阅者落后时发送一条 `event: resync`，客户端应整体重新拉取。
//!
//! 分店范围的消息只推送给在该分店有查看权限的用户；没有分店的
//! 草稿/发票/付款消息对分店受限用户去掉 `data`。

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Extension, Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::{self, Stream};
use shared::message::SyncPayload;
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::auth::CurrentUser;
use crate::core::ServerState;

const KEEP_ALIVE_SECS: u64 = 15;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/events", get(events))
}

async fn events(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(user = %user.username, "Event stream opened");
    let stream = stream::unfold((state.subscribe(), user), |(mut rx, user)| async move {
        let event = next_event(&mut rx, &user).await?;
        Some((Ok(event), (rx, user)))
    });
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(KEEP_ALIVE_SECS)))
}

#[derive(Debug, PartialEq)]
enum Update {
    Sync(SyncPayload),
    Resync(u64),
}

/// `None` ends the stream (sender dropped on shutdown)
async fn next_event(rx: &mut Receiver<SyncPayload>, user: &CurrentUser) -> Option<Event> {
    loop {
        let event = match next_update(rx, user).await? {
            Update::Sync(payload) => match Event::default().event("sync").json_data(&payload) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(resource = %payload.resource, error = %e, "Failed to encode sync event");
                    continue;
                }
            },
            Update::Resync(skipped) => Event::default().event("resync").data(skipped.to_string()),
        };
        return Some(event);
    }
}

async fn next_update(rx: &mut Receiver<SyncPayload>, user: &CurrentUser) -> Option<Update> {
    loop {
        match rx.recv().await {
            Ok(payload) => {
                if let Some(payload) = scope_for(user, payload) {
                    return Some(Update::Sync(payload));
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, user = %user.username, "Event subscriber lagged");
                return Some(Update::Resync(skipped));
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

fn view_permission(resource: &str) -> Option<&'static str> {
    match resource {
        "draft" | "invoice" | "payment" => Some("sales:view"),
        "table" | "layout" => Some("tables:view"),
        _ => None,
    }
}

/// 按订阅者的分店权限裁剪消息，`None` 表示不推送
fn scope_for(user: &CurrentUser, payload: SyncPayload) -> Option<SyncPayload> {
    let Some(permission) = view_permission(&payload.resource) else {
        return Some(payload);
    };
    let branch = payload.branch.as_deref().unwrap_or("all");
    let permitted = user.has_branch_permission(permission, branch);
    match (permitted, payload.branch.is_some()) {
        (true, _) => Some(payload),
        (false, true) => None,
        (false, false) => Some(SyncPayload { data: None, ..payload }),
    }
}
