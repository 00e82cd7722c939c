//! Permission Definitions
//!
//! 权限格式: `screen:action[@branch]`
//!
//! - 无分店后缀表示所有分店
//! - `screen:*` 表示该页面的全部操作
//! - `all` 与 admin 角色拥有全部权限

use shared::models::ScreenPermission;

/// 可授权的页面
pub const SCREENS: &[&str] = &[
    "sales",
    "tables",
    "menu",
    "customers",
    "purchases",
    "expenses",
    "payments",
    "employees",
    "salaries",
    "reports",
    "settings",
    "users",
];

/// 页面操作
pub const ACTIONS: &[&str] = &["view", "add", "edit", "delete", "print"];

/// 新建员工账号的默认权限 (POS 收银)
pub const DEFAULT_STAFF_PERMISSIONS: &[&str] = &["sales:view", "sales:add", "sales:print", "tables:view"];

pub fn is_valid_screen(screen: &str) -> bool {
    SCREENS.contains(&screen)
}

/// Validate a permission string
pub fn is_valid_permission(permission: &str) -> bool {
    if permission == "all" {
        return true;
    }
    let base = permission
        .split_once('@')
        .map(|(base, scope)| if scope.is_empty() { "" } else { base })
        .unwrap_or(permission);
    match base.split_once(':') {
        Some((screen, action)) => {
            is_valid_screen(screen) && (action == "*" || ACTIONS.contains(&action))
        }
        None => false,
    }
}

/// Flatten permission rows into the strings carried by the token
pub fn flatten(rows: &[ScreenPermission]) -> Vec<String> {
    rows.iter()
        .flat_map(ScreenPermission::to_permission_strings)
        .collect()
}

/// Group `screen:action[@branch]` strings back into permission rows
///
/// Invalid strings and `all` are skipped; `screen:*` grants every action.
pub fn rows_from_strings(permissions: &[&str]) -> Vec<ScreenPermission> {
    let mut rows: Vec<ScreenPermission> = Vec::new();
    for permission in permissions.iter().filter(|p| is_valid_permission(p)) {
        let (base, scope) = permission.split_once('@').unwrap_or((permission, "all"));
        let Some((screen, action)) = base.split_once(':') else {
            continue;
        };
        let idx = match rows
            .iter()
            .position(|r| r.screen == screen && r.branch_scope == scope)
        {
            Some(idx) => idx,
            None => {
                rows.push(ScreenPermission {
                    screen: screen.to_string(),
                    branch_scope: scope.to_string(),
                    can_view: false,
                    can_add: false,
                    can_edit: false,
                    can_delete: false,
                    can_print: false,
                });
                rows.len() - 1
            }
        };
        let row = &mut rows[idx];
        let all = action == "*";
        row.can_view |= all || action == "view";
        row.can_add |= all || action == "add";
        row.can_edit |= all || action == "edit";
        row.can_delete |= all || action == "delete";
        row.can_print |= all || action == "print";
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_round_into_rows() {
        let rows = rows_from_strings(DEFAULT_STAFF_PERMISSIONS);
        assert_eq!(rows.len(), 2);
        let sales = rows.iter().find(|r| r.screen == "sales").unwrap();
        assert!(sales.can_view && sales.can_add && sales.can_print);
        assert!(!sales.can_delete);
        let mut flat = flatten(&rows);
        flat.sort();
        let mut expected: Vec<String> = DEFAULT_STAFF_PERMISSIONS.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(flat, expected);
    }

    #[test]
    fn wildcard_and_scope() {
        let rows = rows_from_strings(&["menu:*@china_town", "bogus"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].branch_scope, "china_town");
        assert!(rows[0].can_delete && rows[0].can_print);
    }

    #[test]
    fn validates_permission_strings() {
        assert!(is_valid_permission("all"));
        assert!(is_valid_permission("sales:add"));
        assert!(is_valid_permission("sales:*"));
        assert!(is_valid_permission("reports:view@place_india"));
        assert!(!is_valid_permission("sales:fly"));
        assert!(!is_valid_permission("kitchen:view"));
        assert!(!is_valid_permission("sales:view@"));
        assert!(!is_valid_permission("sales"));
    }

    #[test]
    fn default_staff_permissions_are_valid() {
        assert!(DEFAULT_STAFF_PERMISSIONS.iter().all(|p| is_valid_permission(p)));
    }
}
