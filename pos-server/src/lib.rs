//! POS Server - 餐厅收银与后台管理 HTTP 服务
//!
//! # 架构概述
//!
//! - **HTTP API** (`api`): JSON 接口 (axum)
//! - **认证** (`auth`): JWT + Argon2，屏幕级与分店级权限
//! - **数据库** (`db`): 嵌入式 SQLite (sqlx)，启动时迁移
//! - **销售** (`sales`): 桌台草稿单、结账、发票、作废
//! - **账务** (`billing`): 金额计算、付款、采购与费用发票、ZATCA 二维码
//! - **工资** (`payroll`) 与 **报表** (`reports`)
//! - **实时同步**: 变更通过广播通道推送到 `/api/events` (SSE)
//!
//! # 模块结构
//!
//! ```text
//! pos-server/src/
//! ├── core/          # 配置、状态、后台任务
//! ├── auth/          # JWT 认证、权限
//! ├── services/      # 路由装配与中间件
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 连接池、迁移、仓储
//! ├── sales/         # 草稿单与结账
//! ├── billing/       # 金额、付款、单据
//! ├── payroll/       # 工资
//! ├── reports/       # 报表
//! └── utils/         # 错误、日志、时间、校验
//! ```

pub mod api;
pub mod auth;
pub mod billing;
pub mod core;
pub mod db;
pub mod payroll;
pub mod reports;
pub mod sales;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

pub use utils::logger::init_logger_with_file;

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
