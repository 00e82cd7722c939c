//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::MealNotFound
            | Self::MenuCategoryNotFound
            | Self::MenuItemNotFound
            | Self::RawMaterialNotFound
            | Self::CustomerNotFound
            | Self::DraftNotFound
            | Self::InvoiceNotFound
            | Self::PurchaseNotFound
            | Self::ExpenseNotFound
            | Self::TableNotFound
            | Self::BranchNotFound
            | Self::EmployeeNotFound
            | Self::UserNotFound
            | Self::SalaryNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::MealNameExists
            | Self::MenuCategoryNameExists
            | Self::MenuItemExists
            | Self::RawMaterialInUse
            | Self::DraftVersionConflict
            | Self::DraftNotOpen
            | Self::InvoiceAlreadyVoided
            | Self::InvoiceNotPending
            | Self::PaymentAlreadySettled
            | Self::TableOccupied
            | Self::EmployeeCodeExists
            | Self::UsernameExists
            | Self::SalaryAlreadyPaid => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::AdminRequired
            | Self::CannotModifyAdmin
            | Self::CannotDeleteAdmin
            | Self::BranchNotPermitted
            | Self::SupervisorPasswordRequired
            | Self::SupervisorPasswordInvalid
            | Self::UserCannotDeleteSelf => StatusCode::FORBIDDEN,

            // 422 Unprocessable Entity
            Self::BusinessRule
            | Self::DraftEmpty
            | Self::SalaryNotInitialized
            | Self::FutureMonthNotAllowed => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError | Self::Unknown => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
