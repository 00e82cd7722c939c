//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 登录、当前用户、修改密码
//! - [`users`] - 用户与屏幕权限管理
//! - [`settings`] - 系统设置、分店标签、主管密码
//! - [`tables`] - 分店、桌台状态与布局
//! - [`raw_materials`] / [`meals`] / [`menu`] - 原料、餐品、菜单
//! - [`customers`] - 顾客
//! - [`drafts`] - 桌台草稿单、结账、预打印
//! - [`invoices`] / [`sales`] - 销售发票、直接结账、作废校验
//! - [`employees`] / [`payroll`] - 员工与工资
//! - [`purchases`] / [`expenses`] / [`payments`] - 采购、费用、付款
//! - [`reports`] - 报表
//! - [`events`] - SSE 同步推送

pub mod auth;
pub mod health;
pub mod users;
pub mod settings;
pub mod tables;
pub mod events;

// Catalogue
pub mod raw_materials;
pub mod meals;
pub mod menu;
pub mod customers;

// Sales
pub mod drafts;
pub mod invoices;
pub mod sales;

// Back office
pub mod employees;
pub mod payroll;
pub mod purchases;
pub mod expenses;
pub mod payments;
pub mod reports;
