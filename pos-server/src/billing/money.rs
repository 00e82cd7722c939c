//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic runs on `Decimal`; values are converted back to `f64`
//! (2 dp, half away from zero) for storage and serialization.

use rust_decimal::prelude::*;
use shared::models::{OrderTotals, PaymentStatus, SalaryStatus};
use shared::{AppError, ErrorCode};

/// Rounding precision for monetary values
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed unit price / amount
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i64 = 9999;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value, "Non-finite money value, treating as zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 dp
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Round an f64 amount to 2 dp
#[inline]
pub fn round_money(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Compare two monetary values within [`MONEY_TOLERANCE`]
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() < MONEY_TOLERANCE
}

/// Validate a line quantity (1..=9999)
pub fn validate_quantity(quantity: i64) -> Result<(), AppError> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!("quantity must be between 1 and {}, got {}", MAX_QUANTITY, quantity),
        )
        .with_detail("quantity", quantity));
    }
    Ok(())
}

/// Validate a positive payment amount
pub fn validate_payment_amount(amount: f64) -> Result<(), AppError> {
    if !amount.is_finite() || amount <= 0.0 || amount > MAX_PRICE {
        return Err(AppError::with_message(
            ErrorCode::PaymentInvalidAmount,
            format!("amount must be greater than 0 and at most {}", MAX_PRICE),
        ));
    }
    Ok(())
}

/// Per-line amounts: subtotal, tax, discount, total
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineAmounts {
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub total: f64,
}

/// subtotal → tax = subtotal × tax% → discount = (subtotal + tax) × discount%
fn apply_tax_then_discount(subtotal: Decimal, tax: Decimal, discount_pct: f64) -> LineAmounts {
    let discount = (subtotal + tax) * to_decimal(discount_pct) / HUNDRED;
    LineAmounts {
        subtotal: to_f64(subtotal),
        tax: to_f64(tax),
        discount: to_f64(discount),
        total: to_f64(subtotal + tax - discount),
    }
}

/// Order-level totals for a list of `(unit_price, quantity)` lines
///
/// ```text
/// subtotal = Σ unit × qty
/// tax      = subtotal × tax% / 100
/// discount = (subtotal + tax) × discount% / 100
/// total    = subtotal + tax − discount
/// ```
pub fn order_totals(lines: &[(f64, i64)], tax_pct: f64, discount_pct: f64) -> OrderTotals {
    let subtotal: Decimal = lines
        .iter()
        .map(|(unit, qty)| to_decimal(*unit) * Decimal::from(*qty))
        .sum();
    let tax = subtotal * to_decimal(tax_pct) / HUNDRED;
    let amounts = apply_tax_then_discount(subtotal, tax, discount_pct);
    OrderTotals {
        subtotal: amounts.subtotal,
        tax_amount: amounts.tax,
        discount_amount: amounts.discount,
        total_amount: amounts.total,
    }
}

/// Informational per-line breakdown of a sales line (invoice item snapshot)
pub fn sales_line(unit_price: f64, quantity: i64, tax_pct: f64, discount_pct: f64) -> LineAmounts {
    let subtotal = to_decimal(unit_price) * Decimal::from(quantity);
    let tax = subtotal * to_decimal(tax_pct) / HUNDRED;
    apply_tax_then_discount(subtotal, tax, discount_pct)
}

/// Purchase line: tax from the VAT rate
pub fn purchase_line(quantity: f64, unit_price: f64, vat_pct: f64, discount_pct: f64) -> LineAmounts {
    let subtotal = to_decimal(quantity) * to_decimal(unit_price);
    let tax = subtotal * to_decimal(vat_pct) / HUNDRED;
    apply_tax_then_discount(subtotal, tax, discount_pct)
}

/// Expense line: tax is an absolute amount
pub fn expense_line(quantity: f64, unit_price: f64, tax: f64, discount_pct: f64) -> LineAmounts {
    let subtotal = to_decimal(quantity) * to_decimal(unit_price);
    apply_tax_then_discount(subtotal, to_decimal(tax), discount_pct)
}

/// Sum line amounts into a document total
pub fn sum_lines(lines: &[LineAmounts]) -> LineAmounts {
    let sum = |f: fn(&LineAmounts) -> f64| to_f64(lines.iter().map(|l| to_decimal(f(l))).sum());
    LineAmounts {
        subtotal: sum(|l| l.subtotal),
        tax: sum(|l| l.tax),
        discount: sum(|l| l.discount),
        total: sum(|l| l.total),
    }
}

/// Invoice settlement status from paid vs total
pub fn settlement_status(paid: f64, total: f64) -> PaymentStatus {
    let paid = to_decimal(paid);
    if paid >= to_decimal(total) - MONEY_TOLERANCE {
        PaymentStatus::Paid
    } else if paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Unpaid
    }
}

/// Salary total = max(0, basic + allowances − deductions + previous due)
pub fn salary_total(basic: f64, allowances: f64, deductions: f64, previous_due: f64) -> f64 {
    let total = to_decimal(basic) + to_decimal(allowances) - to_decimal(deductions)
        + to_decimal(previous_due);
    to_f64(total.max(Decimal::ZERO))
}

/// Salary status from paid vs total
pub fn salary_status(paid: f64, total: f64) -> SalaryStatus {
    match settlement_status(paid, total) {
        PaymentStatus::Paid => SalaryStatus::Paid,
        PaymentStatus::Partial => SalaryStatus::Partial,
        PaymentStatus::Unpaid => SalaryStatus::Due,
    }
}

/// Remaining balance, never negative
pub fn remaining(total: f64, paid: f64) -> f64 {
    to_f64((to_decimal(total) - to_decimal(paid)).max(Decimal::ZERO))
}

/// Meal cost = Σ ingredient qty × raw material cost per unit
pub fn meal_cost(ingredients: &[(f64, f64)]) -> f64 {
    to_f64(
        ingredients
            .iter()
            .map(|(qty, cost)| to_decimal(*qty) * to_decimal(*cost))
            .sum(),
    )
}

/// Selling price = cost × (1 + margin / 100)
pub fn selling_price(cost: f64, margin_pct: f64) -> f64 {
    to_f64(to_decimal(cost) * (Decimal::ONE + to_decimal(margin_pct) / HUNDRED))
}

/// Weighted average cost after receiving `qty` units at `unit_price`
///
/// `(old_cost × old_stock + unit × qty) / (old_stock + qty)`; falls back to
/// the incoming unit price when the resulting stock is not positive.
pub fn weighted_average_cost(old_cost: f64, old_stock: f64, unit_price: f64, qty: f64) -> f64 {
    let old_stock = to_decimal(old_stock).max(Decimal::ZERO);
    let qty = to_decimal(qty);
    let new_stock = old_stock + qty;
    if new_stock <= Decimal::ZERO {
        return round_money(unit_price);
    }
    let value = to_decimal(old_cost) * old_stock + to_decimal(unit_price) * qty;
    to_f64(value / new_stock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_decimal_precision() {
        let sum = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum), 0.3);
    }

    #[test]
    fn test_order_totals_tax_then_discount() {
        // 2 × 10.00 + 1 × 5.50 = 25.50; tax 15% = 3.825 → 3.83
        // discount 10% of 29.325 = 2.9325 → 2.93; total 26.39
        let totals = order_totals(&[(10.0, 2), (5.5, 1)], 15.0, 10.0);
        assert_eq!(totals.subtotal, 25.5);
        assert_eq!(totals.tax_amount, 3.83);
        assert_eq!(totals.discount_amount, 2.93);
        assert_eq!(totals.total_amount, 26.39);
    }

    #[test]
    fn test_order_totals_empty() {
        let totals = order_totals(&[], 15.0, 0.0);
        assert_eq!(totals, OrderTotals::default());
    }

    #[test]
    fn test_expense_line_absolute_tax() {
        let line = expense_line(2.0, 50.0, 15.0, 10.0);
        assert_eq!(line.subtotal, 100.0);
        assert_eq!(line.tax, 15.0);
        assert_eq!(line.discount, 11.5);
        assert_eq!(line.total, 103.5);
    }

    #[test]
    fn test_purchase_line_vat() {
        let line = purchase_line(4.0, 12.5, 15.0, 0.0);
        assert_eq!(line.subtotal, 50.0);
        assert_eq!(line.tax, 7.5);
        assert_eq!(line.total, 57.5);
    }

    #[test]
    fn test_settlement_status_tolerance() {
        assert_eq!(settlement_status(99.995, 100.0), PaymentStatus::Paid);
        assert_eq!(settlement_status(50.0, 100.0), PaymentStatus::Partial);
        assert_eq!(settlement_status(0.0, 100.0), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_salary_total_floors_at_zero() {
        assert_eq!(salary_total(3000.0, 500.0, 200.0, 100.0), 3400.0);
        assert_eq!(salary_total(100.0, 0.0, 500.0, 0.0), 0.0);
        assert_eq!(salary_status(0.0, 3400.0), SalaryStatus::Due);
        assert_eq!(salary_status(3400.0, 3400.0), SalaryStatus::Paid);
    }

    #[test]
    fn test_meal_pricing() {
        let cost = meal_cost(&[(0.25, 8.0), (2.0, 1.5)]);
        assert_eq!(cost, 5.0);
        assert_eq!(selling_price(cost, 30.0), 6.5);
    }

    #[test]
    fn test_weighted_average_cost() {
        // 10 @ 4.00 + 10 @ 6.00 → 5.00
        assert_eq!(weighted_average_cost(4.0, 10.0, 6.0, 10.0), 5.0);
        // empty stock takes the incoming price
        assert_eq!(weighted_average_cost(4.0, 0.0, 7.25, 3.0), 7.25);
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(9999).is_ok());
        assert_eq!(validate_quantity(0).unwrap_err().code, ErrorCode::InvalidQuantity);
        assert!(validate_quantity(10_000).is_err());
    }

    #[test]
    fn test_money_eq() {
        assert!(money_eq(10.001, 10.0));
        assert!(!money_eq(10.02, 10.0));
    }
}
