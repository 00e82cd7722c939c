//! 统一错误处理
//!
//! 错误类型统一来自 `shared::error`，这里负责把仓储层和数据库错误
//! 映射为带错误码的 [`AppError`]。
//!
//! | 来源 | 映射 |
//! |------|------|
//! | `RepoError::NotFound` | 0003 NotFound (404) |
//! | `RepoError::Duplicate` | 0004 AlreadyExists (409) |
//! | `RepoError::Validation` | 0002 ValidationFailed (400) |
//! | `RepoError::Business(code, ..)` | 携带的错误码 |
//! | `RepoError::Database` | 9002 DatabaseError (500) |

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

use crate::db::repository::RepoError;

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Business(code, msg) => AppError::with_message(code, msg),
            RepoError::Database(msg) => {
                tracing::error!(target: "database", error = %msg, "Database error occurred");
                AppError::database("Database error")
            }
        }
    }
}

/// 数据库错误直接映射 (处理函数中的事务等)
pub fn db_error(err: sqlx::Error) -> AppError {
    AppError::from(RepoError::from(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_errors_map_to_codes() {
        let e: AppError = RepoError::NotFound("Meal 3 not found".into()).into();
        assert_eq!(e.code, ErrorCode::NotFound);
        assert_eq!(e.message, "Meal 3 not found");

        let e: AppError = RepoError::Business(ErrorCode::TableOccupied, "busy".into()).into();
        assert_eq!(e.code, ErrorCode::TableOccupied);
        assert_eq!(e.http_status(), http::StatusCode::CONFLICT);

        let e: AppError = RepoError::Database("disk I/O".into()).into();
        assert_eq!(e.code, ErrorCode::DatabaseError);
        assert_eq!(e.message, "Database error");
    }
}
