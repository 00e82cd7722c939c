//! User / Screen Permission Model

use serde::{Deserialize, Serialize};

/// User role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum UserRole {
    Admin,
    #[default]
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
        }
    }
}

/// Back-office / POS user (password hash never serialized)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Update user payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserUpdate {
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

/// Per-screen permission row
///
/// `branch_scope` is `"all"` or a branch code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ScreenPermission {
    pub screen: String,
    #[serde(default = "default_scope")]
    pub branch_scope: String,
    #[serde(default)]
    pub can_view: bool,
    #[serde(default)]
    pub can_add: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default)]
    pub can_print: bool,
}

fn default_scope() -> String {
    "all".to_string()
}

impl ScreenPermission {
    /// Flatten into `screen:action[@branch]` strings
    pub fn to_permission_strings(&self) -> Vec<String> {
        let suffix = if self.branch_scope == "all" {
            String::new()
        } else {
            format!("@{}", self.branch_scope)
        };
        [
            ("view", self.can_view),
            ("add", self.can_add),
            ("edit", self.can_edit),
            ("delete", self.can_delete),
            ("print", self.can_print),
        ]
        .into_iter()
        .filter(|(_, granted)| *granted)
        .map(|(action, _)| format!("{}:{}{}", self.screen, action, suffix))
        .collect()
    }
}

/// Replace a user's permissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsUpdate {
    pub permissions: Vec<ScreenPermission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_scoped_permissions() {
        let perm = ScreenPermission {
            screen: "sales".into(),
            branch_scope: "china_town".into(),
            can_view: true,
            can_add: true,
            can_edit: false,
            can_delete: false,
            can_print: true,
        };
        assert_eq!(
            perm.to_permission_strings(),
            vec![
                "sales:view@china_town",
                "sales:add@china_town",
                "sales:print@china_town"
            ]
        );
    }

    #[test]
    fn unscoped_permissions_have_no_suffix() {
        let perm: ScreenPermission =
            serde_json::from_str(r#"{"screen":"reports","can_view":true}"#).unwrap();
        assert_eq!(perm.branch_scope, "all");
        assert_eq!(perm.to_permission_strings(), vec!["reports:view"]);
    }
}
