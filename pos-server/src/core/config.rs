use std::path::PathBuf;

use chrono_tz::Tz;

use crate::auth::JwtConfig;

/// 分店配置 (code + 显示名)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchConfig {
    pub code: String,
    pub label: String,
}

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量 (或 `.env`) 覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./pos-data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 8000 | HTTP 服务端口 |
/// | DATABASE_PATH | {WORK_DIR}/database/pos.db | SQLite 文件 |
/// | ENVIRONMENT | development | 运行环境 |
/// | TIMEZONE | Asia/Riyadh | 业务时区 |
/// | BRANCHES | china_town:China Town,place_india:Place India | 分店列表 |
/// | TABLES_PER_BRANCH | 50 | 每个分店初始化的桌台数 |
/// | ADMIN_USERNAME / ADMIN_PASSWORD | admin / admin123 | 首次启动的管理员 |
/// | SUPERVISOR_PASSWORD | 1991 | 首次启动的主管密码 |
/// | DRAFT_STALE_MINUTES | 720 | 草稿单超时阈值 |
/// | STALE_CHECK_INTERVAL_SECS | 600 | 草稿单超时扫描间隔 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | LOG_LEVEL / LOG_JSON | info / false | 日志 |
///
/// JWT 相关 (`JWT_SECRET`, `JWT_EXPIRATION_MINUTES`) 见 [`JwtConfig`]。
///
/// ```ignore
/// WORK_DIR=/data/pos HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// SQLite 文件路径 (None = {work_dir}/database/pos.db)
    pub database_path: Option<String>,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 业务时区 (营业日、报表区间、发票日期)
    pub timezone: Tz,
    /// 分店列表
    pub branches: Vec<BranchConfig>,
    /// 每个分店初始化的桌台数
    pub tables_per_branch: i64,
    pub admin_username: String,
    pub admin_password: String,
    pub supervisor_password: String,
    /// 草稿单超过该时长未更新视为滞留
    pub draft_stale_minutes: i64,
    pub stale_check_interval_secs: u64,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
    pub log_level: String,
    pub log_json: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(default)
}

const DEFAULT_BRANCHES: &str = "china_town:China Town,place_india:Place India";

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        let timezone = std::env::var("TIMEZONE")
            .ok()
            .and_then(|tz| match tz.parse::<Tz>() {
                Ok(tz) => Some(tz),
                Err(_) => {
                    tracing::warn!("Unknown TIMEZONE '{}', falling back to Asia/Riyadh", tz);
                    None
                }
            })
            .unwrap_or(chrono_tz::Asia::Riyadh);

        let branches = parse_branches(
            &std::env::var("BRANCHES").unwrap_or_else(|_| DEFAULT_BRANCHES.into()),
        );

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./pos-data".into()),
            http_port: env_or("HTTP_PORT", 8000),
            database_path: std::env::var("DATABASE_PATH").ok().filter(|p| !p.is_empty()),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            timezone,
            branches: if branches.is_empty() {
                parse_branches(DEFAULT_BRANCHES)
            } else {
                branches
            },
            tables_per_branch: env_or("TABLES_PER_BRANCH", 50),
            admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
            admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into()),
            supervisor_password: std::env::var("SUPERVISOR_PASSWORD")
                .unwrap_or_else(|_| "1991".into()),
            draft_stale_minutes: env_or("DRAFT_STALE_MINUTES", 720),
            stale_check_interval_secs: env_or("STALE_CHECK_INTERVAL_SECS", 600),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30000),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
        }
    }

    /// 使用自定义工作目录和端口覆盖配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config.database_path = None;
        config
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// SQLite 文件路径
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.database_dir().join("pos.db"))
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        if let Some(parent) = self.database_path().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// 分店显示名
    pub fn branch_label(&self, code: &str) -> Option<&str> {
        self.branches
            .iter()
            .find(|b| b.code == code)
            .map(|b| b.label.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// 解析 `code:Label,code2:Label 2`; 无 label 时用 code
pub fn parse_branches(raw: &str) -> Vec<BranchConfig> {
    let mut branches: Vec<BranchConfig> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (code, label) = match entry.split_once(':') {
            Some((code, label)) => (code.trim(), label.trim()),
            None => (entry, entry),
        };
        if code.is_empty() || branches.iter().any(|b| b.code == code) {
            continue;
        }
        branches.push(BranchConfig {
            code: code.to_string(),
            label: if label.is_empty() { code } else { label }.to_string(),
        });
    }
    branches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_branch_list() {
        let branches = parse_branches("china_town:China Town, place_india , china_town:dup,");
        assert_eq!(
            branches,
            vec![
                BranchConfig {
                    code: "china_town".into(),
                    label: "China Town".into()
                },
                BranchConfig {
                    code: "place_india".into(),
                    label: "place_india".into()
                },
            ]
        );
    }

    #[test]
    fn database_path_defaults_under_work_dir() {
        let mut config = Config::with_overrides("/tmp/pos-test", 9000);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/pos-test/database/pos.db")
        );
        config.database_path = Some("/data/other.db".into());
        assert_eq!(config.database_path(), PathBuf::from("/data/other.db"));
    }
}
