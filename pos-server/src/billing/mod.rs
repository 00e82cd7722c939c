//! 金额计算、票据与付款
//!
//! - [`money`] - Decimal 金额计算 (订单合计、采购/费用行、工资)
//! - [`zatca`] - 收据二维码 TLV 编码
//! - [`documents`] - 采购/费用发票
//! - [`payments`] - 付款登记与查询

pub mod documents;
pub mod money;
pub mod payments;
pub mod zatca;
