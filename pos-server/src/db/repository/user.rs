//! User / permission database operations

use shared::ErrorCode;
use shared::models::{ScreenPermission, User, UserCreate, UserRole, UserUpdate};
use sqlx::{SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult};
use crate::auth::password::hash_password;

const USER_COLUMNS: &str = "id, username, role, is_active, created_at, updated_at";

fn hash(password: &str) -> RepoResult<String> {
    hash_password(password).map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM app_user ORDER BY username"
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM app_user WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// User plus password hash, for login
pub async fn find_with_hash(
    pool: &SqlitePool,
    username: &str,
) -> RepoResult<Option<(User, String)>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM app_user WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    let Some(user) = user else {
        return Ok(None);
    };
    let hash = find_password_hash(pool, user.id).await?;
    Ok(hash.map(|h| (user, h)))
}

pub async fn find_password_hash(pool: &SqlitePool, id: i64) -> RepoResult<Option<String>> {
    let hash: Option<String> =
        sqlx::query_scalar("SELECT password_hash FROM app_user WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(hash)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_user")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

pub async fn count_active_admins(pool: &SqlitePool) -> RepoResult<i64> {
    let n: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM app_user WHERE role = 'admin' AND is_active = 1",
    )
    .fetch_one(pool)
    .await?;
    Ok(n)
}

pub async fn create(pool: &SqlitePool, data: &UserCreate) -> RepoResult<User> {
    create_with_permissions(pool, data, &[]).await
}

/// Insert a user and its initial permission rows in one transaction
pub async fn create_with_permissions(
    pool: &SqlitePool,
    data: &UserCreate,
    permissions: &[ScreenPermission],
) -> RepoResult<User> {
    let mut tx = pool.begin().await?;
    let user = insert(&mut tx, data).await?;
    write_permissions(&mut tx, user.id, permissions).await?;
    tx.commit().await?;
    Ok(user)
}

async fn insert(conn: &mut SqliteConnection, data: &UserCreate) -> RepoResult<User> {
    let password_hash = hash(&data.password)?;
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO app_user (username, password_hash, role, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, 1, ?, ?)",
    )
    .bind(data.username.trim())
    .bind(&password_hash)
    .bind(data.role)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::business(
            ErrorCode::UsernameExists,
            format!("Username '{}' already exists", data.username.trim()),
        ),
        other => other,
    })?;

    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM app_user WHERE id = ?"))
        .bind(result.last_insert_rowid())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &UserUpdate) -> RepoResult<User> {
    let password_hash = match &data.password {
        Some(p) => Some(hash(p)?),
        None => None,
    };
    let rows = sqlx::query(
        "UPDATE app_user SET \
            password_hash = COALESCE(?, password_hash), \
            role = COALESCE(?, role), \
            is_active = COALESCE(?, is_active), \
            updated_at = ? \
         WHERE id = ?",
    )
    .bind(password_hash)
    .bind(data.role)
    .bind(data.is_active)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::business(
            ErrorCode::UserNotFound,
            format!("User {id} not found"),
        ));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::business(ErrorCode::UserNotFound, format!("User {id} not found")))
}

pub async fn set_password(pool: &SqlitePool, id: i64, password: &str) -> RepoResult<()> {
    let password_hash = hash(password)?;
    sqlx::query("UPDATE app_user SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM app_user WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

// ── Permissions ──

pub async fn find_permissions(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<ScreenPermission>> {
    let rows = sqlx::query_as::<_, ScreenPermission>(
        "SELECT screen, branch_scope, can_view, can_add, can_edit, can_delete, can_print \
         FROM user_permission WHERE user_id = ? ORDER BY screen, branch_scope",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Replace the full permission set of a user
pub async fn replace_permissions(
    pool: &SqlitePool,
    user_id: i64,
    permissions: &[ScreenPermission],
) -> RepoResult<Vec<ScreenPermission>> {
    let mut tx = pool.begin().await?;
    write_permissions(&mut tx, user_id, permissions).await?;
    tx.commit().await?;
    find_permissions(pool, user_id).await
}

async fn write_permissions(
    conn: &mut SqliteConnection,
    user_id: i64,
    permissions: &[ScreenPermission],
) -> RepoResult<()> {
    sqlx::query("DELETE FROM user_permission WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    for p in permissions {
        sqlx::query(
            "INSERT INTO user_permission \
             (user_id, screen, branch_scope, can_view, can_add, can_edit, can_delete, can_print) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (user_id, screen, branch_scope) DO UPDATE SET \
                can_view = excluded.can_view, can_add = excluded.can_add, \
                can_edit = excluded.can_edit, can_delete = excluded.can_delete, \
                can_print = excluded.can_print",
        )
        .bind(user_id)
        .bind(&p.screen)
        .bind(&p.branch_scope)
        .bind(p.can_view)
        .bind(p.can_add)
        .bind(p.can_edit)
        .bind(p.can_delete)
        .bind(p.can_print)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Permission strings carried in the JWT
pub async fn permission_strings(pool: &SqlitePool, user: &User) -> RepoResult<Vec<String>> {
    if user.role == UserRole::Admin {
        return Ok(vec!["all".to_string()]);
    }
    let rows = find_permissions(pool, user.id).await?;
    Ok(crate::auth::permissions::flatten(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    async fn pool() -> SqlitePool {
        DbService::memory().await.unwrap().pool
    }

    fn staff(name: &str) -> UserCreate {
        UserCreate {
            username: name.into(),
            password: "secret1".into(),
            role: UserRole::Staff,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_username() {
        let pool = pool().await;
        create(&pool, &staff("cashier")).await.unwrap();
        let err = create(&pool, &staff("cashier")).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::UsernameExists, _)));
    }

    #[tokio::test]
    async fn password_hash_is_verifiable() {
        let pool = pool().await;
        create(&pool, &staff("cashier")).await.unwrap();
        let (_, hash) = find_with_hash(&pool, "cashier").await.unwrap().unwrap();
        assert!(crate::auth::password::verify_password("secret1", &hash).unwrap());
    }

    #[tokio::test]
    async fn replace_permissions_overwrites_previous_set() {
        let pool = pool().await;
        let user = create(&pool, &staff("cashier")).await.unwrap();
        let first = vec![ScreenPermission {
            screen: "sales".into(),
            branch_scope: "all".into(),
            can_view: true,
            can_add: true,
            can_edit: false,
            can_delete: false,
            can_print: false,
        }];
        replace_permissions(&pool, user.id, &first).await.unwrap();

        let second = vec![ScreenPermission {
            screen: "reports".into(),
            branch_scope: "china_town".into(),
            can_view: true,
            can_add: false,
            can_edit: false,
            can_delete: false,
            can_print: false,
        }];
        let saved = replace_permissions(&pool, user.id, &second).await.unwrap();
        assert_eq!(saved, second);
        assert_eq!(
            permission_strings(&pool, &user).await.unwrap(),
            vec!["reports:view@china_town"]
        );
    }

    #[tokio::test]
    async fn create_with_permissions_stores_both() {
        let pool = pool().await;
        let rows = crate::auth::permissions::rows_from_strings(&["sales:view", "tables:view@china_town"]);
        let user = create_with_permissions(&pool, &staff("cashier"), &rows).await.unwrap();
        let mut strings = permission_strings(&pool, &user).await.unwrap();
        strings.sort();
        assert_eq!(strings, vec!["sales:view", "tables:view@china_town"]);
    }

    #[tokio::test]
    async fn failed_permission_write_rolls_back_user() {
        let pool = pool().await;
        sqlx::query("DROP TABLE user_permission").execute(&pool).await.unwrap();
        let rows = crate::auth::permissions::rows_from_strings(&["sales:view"]);

        assert!(create_with_permissions(&pool, &staff("cashier"), &rows).await.is_err());
        assert!(find_with_hash(&pool, "cashier").await.unwrap().is_none());
    }
}
