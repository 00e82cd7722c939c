//! Unified error codes
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Menu errors (meals, categories, raw materials, customers)
//! - 4xxx: Draft order errors
//! - 5xxx: Payment errors
//! - 6xxx: Invoice errors (sales, purchase, expense)
//! - 7xxx: Table / layout errors
//! - 8xxx: Employee / payroll / user errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the POS front-end can
/// switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Business rule violation
    BusinessRule = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Password too short
    PasswordTooShort = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,
    /// Cannot modify admin user
    CannotModifyAdmin = 2004,
    /// Cannot delete admin user
    CannotDeleteAdmin = 2005,
    /// Branch outside the user's scope
    BranchNotPermitted = 2006,
    /// Supervisor password is required for this action
    SupervisorPasswordRequired = 2101,
    /// Supervisor password is wrong
    SupervisorPasswordInvalid = 2102,

    // ==================== 3xxx: Menu ====================
    /// Meal not found
    MealNotFound = 3001,
    /// Meal is inactive
    MealInactive = 3002,
    /// Meal name already exists
    MealNameExists = 3003,
    /// Menu category not found
    MenuCategoryNotFound = 3101,
    /// Menu category name already exists
    MenuCategoryNameExists = 3102,
    /// Meal already listed in this category
    MenuItemExists = 3103,
    /// Menu item not found
    MenuItemNotFound = 3104,
    /// Raw material not found
    RawMaterialNotFound = 3201,
    /// Raw material is used by meals or purchases
    RawMaterialInUse = 3202,
    /// Customer not found
    CustomerNotFound = 3301,

    // ==================== 4xxx: Draft ====================
    /// Draft order not found
    DraftNotFound = 4001,
    /// Draft was modified by another terminal
    DraftVersionConflict = 4002,
    /// Draft has no items
    DraftEmpty = 4003,
    /// Draft is no longer open
    DraftNotOpen = 4004,
    /// Quantity out of range
    InvalidQuantity = 4005,

    // ==================== 5xxx: Payment ====================
    /// Invalid payment method
    PaymentInvalidMethod = 5003,
    /// Invalid payment amount
    PaymentInvalidAmount = 5006,
    /// Invoice already fully paid
    PaymentAlreadySettled = 5007,

    // ==================== 6xxx: Invoice ====================
    /// Invoice not found
    InvoiceNotFound = 6001,
    /// Invoice has already been voided
    InvoiceAlreadyVoided = 6002,
    /// Invoice is not awaiting print confirmation
    InvoiceNotPending = 6003,
    /// Purchase invoice not found
    PurchaseNotFound = 6101,
    /// Expense invoice not found
    ExpenseNotFound = 6201,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table is occupied
    TableOccupied = 7002,
    /// Branch not found
    BranchNotFound = 7101,
    /// Layout is invalid
    LayoutInvalid = 7102,
    /// Section name already exists in layout
    SectionNameExists = 7103,
    /// Table appears twice in layout
    TableDuplicatedInLayout = 7104,

    // ==================== 8xxx: Employee ====================
    /// Employee not found
    EmployeeNotFound = 8001,
    /// Employee code or national id already exists
    EmployeeCodeExists = 8002,
    /// User not found
    UserNotFound = 8101,
    /// Username already exists
    UsernameExists = 8102,
    /// Cannot delete self
    UserCannotDeleteSelf = 8103,
    /// Salary row not found
    SalaryNotFound = 8201,
    /// No salary row or default for the month
    SalaryNotInitialized = 8202,
    /// Salary already fully paid
    SalaryAlreadyPaid = 8203,
    /// Month is in the future
    FutureMonthNotAllowed = 8204,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::BusinessRule => "Business rule violation",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::PasswordTooShort => "Password is too short",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::CannotModifyAdmin => "Cannot modify administrator user",
            ErrorCode::CannotDeleteAdmin => "Cannot delete administrator user",
            ErrorCode::BranchNotPermitted => "Branch is outside your scope",
            ErrorCode::SupervisorPasswordRequired => "Supervisor password is required",
            ErrorCode::SupervisorPasswordInvalid => "Supervisor password is incorrect",

            // Menu
            ErrorCode::MealNotFound => "Meal not found",
            ErrorCode::MealInactive => "Meal is not active",
            ErrorCode::MealNameExists => "Meal name already exists",
            ErrorCode::MenuCategoryNotFound => "Menu category not found",
            ErrorCode::MenuCategoryNameExists => "Menu category name already exists",
            ErrorCode::MenuItemExists => "Meal is already listed in this category",
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::RawMaterialNotFound => "Raw material not found",
            ErrorCode::RawMaterialInUse => "Raw material is in use",
            ErrorCode::CustomerNotFound => "Customer not found",

            // Draft
            ErrorCode::DraftNotFound => "Draft order not found",
            ErrorCode::DraftVersionConflict => "Draft order was changed by another terminal",
            ErrorCode::DraftEmpty => "Draft order has no items",
            ErrorCode::DraftNotOpen => "Draft order is no longer open",
            ErrorCode::InvalidQuantity => "Quantity is out of range",

            // Payment
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::PaymentInvalidAmount => "Invalid payment amount",
            ErrorCode::PaymentAlreadySettled => "Invoice is already fully paid",

            // Invoice
            ErrorCode::InvoiceNotFound => "Invoice not found",
            ErrorCode::InvoiceAlreadyVoided => "Invoice has already been voided",
            ErrorCode::InvoiceNotPending => "Invoice is not awaiting print confirmation",
            ErrorCode::PurchaseNotFound => "Purchase invoice not found",
            ErrorCode::ExpenseNotFound => "Expense invoice not found",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableOccupied => "Table is occupied",
            ErrorCode::BranchNotFound => "Branch not found",
            ErrorCode::LayoutInvalid => "Table layout is invalid",
            ErrorCode::SectionNameExists => "Section name already exists",
            ErrorCode::TableDuplicatedInLayout => "Table appears more than once in layout",

            // Employee
            ErrorCode::EmployeeNotFound => "Employee not found",
            ErrorCode::EmployeeCodeExists => "Employee code or national id already exists",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UsernameExists => "Username already exists",
            ErrorCode::UserCannotDeleteSelf => "Cannot delete own account",
            ErrorCode::SalaryNotFound => "Salary not found",
            ErrorCode::SalaryNotInitialized => "Salary is not initialized for this month",
            ErrorCode::SalaryAlreadyPaid => "Salary is already fully paid",
            ErrorCode::FutureMonthNotAllowed => "Future months are not allowed",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::BusinessRule),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::PasswordTooShort),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),
            2004 => Ok(ErrorCode::CannotModifyAdmin),
            2005 => Ok(ErrorCode::CannotDeleteAdmin),
            2006 => Ok(ErrorCode::BranchNotPermitted),
            2101 => Ok(ErrorCode::SupervisorPasswordRequired),
            2102 => Ok(ErrorCode::SupervisorPasswordInvalid),

            // Menu
            3001 => Ok(ErrorCode::MealNotFound),
            3002 => Ok(ErrorCode::MealInactive),
            3003 => Ok(ErrorCode::MealNameExists),
            3101 => Ok(ErrorCode::MenuCategoryNotFound),
            3102 => Ok(ErrorCode::MenuCategoryNameExists),
            3103 => Ok(ErrorCode::MenuItemExists),
            3104 => Ok(ErrorCode::MenuItemNotFound),
            3201 => Ok(ErrorCode::RawMaterialNotFound),
            3202 => Ok(ErrorCode::RawMaterialInUse),
            3301 => Ok(ErrorCode::CustomerNotFound),

            // Draft
            4001 => Ok(ErrorCode::DraftNotFound),
            4002 => Ok(ErrorCode::DraftVersionConflict),
            4003 => Ok(ErrorCode::DraftEmpty),
            4004 => Ok(ErrorCode::DraftNotOpen),
            4005 => Ok(ErrorCode::InvalidQuantity),

            // Payment
            5003 => Ok(ErrorCode::PaymentInvalidMethod),
            5006 => Ok(ErrorCode::PaymentInvalidAmount),
            5007 => Ok(ErrorCode::PaymentAlreadySettled),

            // Invoice
            6001 => Ok(ErrorCode::InvoiceNotFound),
            6002 => Ok(ErrorCode::InvoiceAlreadyVoided),
            6003 => Ok(ErrorCode::InvoiceNotPending),
            6101 => Ok(ErrorCode::PurchaseNotFound),
            6201 => Ok(ErrorCode::ExpenseNotFound),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableOccupied),
            7101 => Ok(ErrorCode::BranchNotFound),
            7102 => Ok(ErrorCode::LayoutInvalid),
            7103 => Ok(ErrorCode::SectionNameExists),
            7104 => Ok(ErrorCode::TableDuplicatedInLayout),

            // Employee
            8001 => Ok(ErrorCode::EmployeeNotFound),
            8002 => Ok(ErrorCode::EmployeeCodeExists),
            8101 => Ok(ErrorCode::UserNotFound),
            8102 => Ok(ErrorCode::UsernameExists),
            8103 => Ok(ErrorCode::UserCannotDeleteSelf),
            8201 => Ok(ErrorCode::SalaryNotFound),
            8202 => Ok(ErrorCode::SalaryNotInitialized),
            8203 => Ok(ErrorCode::SalaryAlreadyPaid),
            8204 => Ok(ErrorCode::FutureMonthNotAllowed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip_through_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::DraftVersionConflict,
            ErrorCode::SupervisorPasswordInvalid,
            ErrorCode::FutureMonthNotAllowed,
            ErrorCode::DatabaseError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&ErrorCode::DraftVersionConflict).unwrap();
        assert_eq!(json, "4002");
        let code: ErrorCode = serde_json::from_str("7001").unwrap();
        assert_eq!(code, ErrorCode::TableNotFound);
    }
}
