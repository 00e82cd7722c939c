//! 服务层 - HTTP 路由装配
//!
//! - [`https::build_app`] - 合并所有 API 路由
//! - [`https::build_router`] - 绑定状态并挂载中间件

pub mod https;

pub use https::{build_app, build_router};
