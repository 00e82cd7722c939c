//! Shared fixtures for service-level tests

use shared::models::{MealCreate, UserRole};

use crate::auth::CurrentUser;
use crate::core::config::parse_branches;
use crate::core::{Config, ServerState};
use crate::db::DbService;
use crate::db::repository::meal;

pub const SUPERVISOR: &str = "1991";

pub fn test_config() -> Config {
    let mut config = Config::with_overrides("/tmp/pos-server-test", 0);
    config.branches = parse_branches("china_town:China Town,place_india:Place India");
    config.tables_per_branch = 10;
    config.supervisor_password = SUPERVISOR.into();
    config.admin_username = "admin".into();
    config.admin_password = "admin123".into();
    config.timezone = chrono_tz::Asia::Riyadh;
    config
}

pub struct TestEnv {
    pub state: ServerState,
}

impl TestEnv {
    pub async fn new() -> Self {
        let pool = DbService::memory().await.unwrap().pool;
        let state = ServerState::with_pool(test_config(), pool).await.unwrap();
        Self { state }
    }

    /// Active meal with an explicit price
    pub async fn meal(&self, name: &str, price: f64) -> i64 {
        meal::create(
            &self.state.pool,
            &MealCreate {
                name: name.into(),
                name_ar: None,
                description: None,
                category: None,
                profit_margin_percent: None,
                selling_price: Some(price),
                ingredients: vec![],
            },
        )
        .await
        .unwrap()
        .id
    }
}

pub fn admin() -> CurrentUser {
    CurrentUser {
        id: 1,
        username: "admin".into(),
        role: UserRole::Admin.as_str().into(),
        permissions: vec![],
    }
}

pub fn staff(permissions: &[&str]) -> CurrentUser {
    CurrentUser {
        id: 2,
        username: "cashier".into(),
        role: UserRole::Staff.as_str().into(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
    }
}
