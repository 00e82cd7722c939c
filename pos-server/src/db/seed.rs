//! 首次启动数据
//!
//! 每次启动都会执行，全部操作幂等：
//! - 配置中的分店与桌台 (1..=TABLES_PER_BRANCH)
//! - 设置单行 (含主管密码哈希)
//! - 无任何用户时创建管理员

use shared::models::{UserCreate, UserRole};
use sqlx::SqlitePool;

use super::repository::{RepoError, RepoResult, branch, settings, user};
use crate::auth::password;
use crate::core::Config;

pub async fn bootstrap(pool: &SqlitePool, config: &Config) -> RepoResult<()> {
    for (idx, b) in config.branches.iter().enumerate() {
        branch::ensure(pool, &b.code, &b.label, idx as i32).await?;
        branch::ensure_tables(pool, &b.code, config.tables_per_branch).await?;
    }

    if settings::supervisor_hash(pool).await?.is_none() {
        let hash = password::hash_password(&config.supervisor_password)
            .map_err(|e| RepoError::Database(format!("Failed to hash supervisor password: {e}")))?;
        settings::ensure(pool, &hash).await?;
        settings::set_supervisor_hash(pool, &hash).await?;
        tracing::info!("Supervisor password initialized");
    }

    if user::count(pool).await? == 0 {
        let admin = user::create(
            pool,
            &UserCreate {
                username: config.admin_username.clone(),
                password: config.admin_password.clone(),
                role: UserRole::Admin,
            },
        )
        .await?;
        tracing::info!(user_id = admin.id, username = %admin.username, "Initial admin user created");
    }

    tracing::info!(
        branches = config.branches.len(),
        tables_per_branch = config.tables_per_branch,
        "Bootstrap data ensured"
    );
    Ok(())
}
