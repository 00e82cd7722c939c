//! JWT 令牌服务
//!
//! 处理 JWT 令牌的生成、验证和解析。

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PRINTABLE_KEY_CHARS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+[]{}|;:,.<>?";

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// JWT 密钥 (至少 32 字节)
    pub secret: String,
    /// 令牌过期时间 (分钟)
    pub expiration_minutes: i64,
    /// 令牌签发者
    pub issuer: String,
    /// 令牌受众
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        let secret = match load_jwt_secret() {
            Ok(secret) => secret,
            Err(e) => {
                // Tokens issued with a per-boot key do not survive a restart
                tracing::error!("JWT configuration error: {}, using a per-boot key", e);
                generate_secure_printable_jwt_secret()
            }
        };

        Self {
            secret,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(720), // 默认 12 小时 (一个营业日)
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "pos-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "pos-clients".to_string()),
        }
    }
}

/// 存储在令牌中的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 ID (Subject)
    pub sub: String,
    /// 用户名
    pub username: String,
    /// 角色名称 (admin | staff)
    pub role: String,
    /// 权限列表 (逗号分隔, `screen:action[@branch]`)
    pub permissions: String,
    /// 令牌类型
    pub token_type: String,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("无效令牌: {0}")]
    InvalidToken(String),

    #[error("令牌已过期")]
    ExpiredToken,

    #[error("无效签名")]
    InvalidSignature,

    #[error("令牌生成失败: {0}")]
    GenerationFailed(String),

    #[error("配置错误: {0}")]
    ConfigError(String),
}

/// 生成可打印的安全 JWT 密钥 (64 字符)
pub fn generate_secure_printable_jwt_secret() -> String {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 64];
    if rng.fill(&mut bytes).is_err() {
        tracing::error!("System RNG unavailable, falling back to time-derived JWT key");
        let seed = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = (seed.rotate_left(i as u32) & 0xff) as u8;
        }
    }

    bytes
        .iter()
        .map(|b| PRINTABLE_KEY_CHARS[*b as usize % PRINTABLE_KEY_CHARS.len()] as char)
        .collect()
}

/// 从环境变量加载 JWT 密钥
fn load_jwt_secret() -> Result<String, JwtError> {
    match std::env::var("JWT_SECRET") {
        Ok(secret) => {
            if secret.len() < 32 {
                return Err(JwtError::ConfigError(
                    "JWT_SECRET must be at least 32 characters long".to_string(),
                ));
            }
            Ok(secret)
        }
        Err(_) => {
            tracing::warn!("⚠️  JWT_SECRET not set! Generating temporary key for this boot.");
            Ok(generate_secure_printable_jwt_secret())
        }
    }
}

/// JWT 令牌服务
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("expiration_minutes", &self.config.expiration_minutes)
            .finish()
    }
}

impl JwtService {
    /// 使用指定配置创建 JWT 服务
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为用户生成新令牌
    pub fn generate_token(
        &self,
        user_id: i64,
        username: &str,
        role: &str,
        permissions: &[String],
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            permissions: permissions.join(","),
            token_type: "access".to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// 验证并解码令牌
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }

    /// 令牌有效期 (秒)
    pub fn expires_in_secs(&self) -> i64 {
        self.config.expiration_minutes * 60
    }
}

/// 当前用户上下文 (从 JWT Claims 解析)
///
/// 由认证中间件注入请求扩展，处理函数通过 `Extension<CurrentUser>` 获取。
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// 用户 ID
    pub id: i64,
    /// 用户名
    pub username: String,
    /// 角色名称
    pub role: String,
    /// 权限列表 (`screen:action[@branch]`)
    pub permissions: Vec<String>,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| JwtError::InvalidToken(format!("Invalid subject: {}", claims.sub)))?;
        let permissions = if claims.permissions.is_empty() {
            vec![]
        } else {
            claims
                .permissions
                .split(',')
                .map(|s| s.to_string())
                .collect()
        };

        Ok(Self {
            id,
            username: claims.username,
            role: claims.role,
            permissions,
        })
    }
}

/// 拆分权限字符串: `sales:add@china_town` -> (`sales:add`, Some(`china_town`))
fn split_scope(permission: &str) -> (&str, Option<&str>) {
    match permission.split_once('@') {
        Some((base, scope)) => (base, Some(scope)),
        None => (permission, None),
    }
}

/// `sales:*` 匹配 `sales:add`
fn matches_action(granted: &str, required: &str) -> bool {
    if granted == required {
        return true;
    }
    match granted.strip_suffix(":*") {
        Some(screen) => required
            .split_once(':')
            .is_some_and(|(required_screen, _)| required_screen == screen),
        None => false,
    }
}

impl CurrentUser {
    /// 是否管理员
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    fn is_superuser(&self) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == "all")
    }

    /// 检查是否拥有指定权限 (任一分店)
    ///
    /// 1. 管理员与 `all` 拥有所有权限
    /// 2. 精确匹配或 `screen:*` 通配符
    /// 3. 分店范围的权限 (`sales:add@china_town`) 也满足路由级检查，
    ///    具体分店由 [`has_branch_permission`](Self::has_branch_permission) 校验
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_superuser() {
            return true;
        }
        self.permissions
            .iter()
            .any(|p| matches_action(split_scope(p).0, permission))
    }

    /// 检查在指定分店是否拥有权限
    pub fn has_branch_permission(&self, permission: &str, branch: &str) -> bool {
        if self.is_superuser() {
            return true;
        }
        self.permissions.iter().any(|p| {
            let (base, scope) = split_scope(p);
            matches_action(base, permission) && scope.is_none_or(|s| s == branch)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "test-secret-key-that-is-long-enough-for-hs256".to_string(),
            expiration_minutes: 60,
            issuer: "pos-server".to_string(),
            audience: "pos-clients".to_string(),
        })
    }

    fn user(role: &str, permissions: &[&str]) -> CurrentUser {
        CurrentUser {
            id: 7,
            username: "cashier".to_string(),
            role: role.to_string(),
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = test_service();
        let permissions = vec!["sales:view".to_string(), "sales:add@china_town".to_string()];

        let token = service
            .generate_token(42, "cashier", "staff", &permissions)
            .expect("Failed to generate test token");
        let claims = service
            .validate_token(&token)
            .expect("Failed to validate test token");

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.permissions, "sales:view,sales:add@china_town");

        let current = CurrentUser::try_from(claims).unwrap();
        assert_eq!(current.id, 42);
        assert_eq!(current.permissions.len(), 2);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = test_service()
            .generate_token(1, "admin", "admin", &[])
            .unwrap();
        let other = JwtService::with_config(JwtConfig {
            secret: "a-completely-different-secret-value-0123456789".to_string(),
            ..test_service().config
        });
        assert!(matches!(
            other.validate_token(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wildcard_and_scope() {
        let u = user("staff", &["sales:*@china_town", "reports:view"]);

        assert!(u.has_permission("sales:add"));
        assert!(u.has_permission("reports:view"));
        assert!(!u.has_permission("purchases:view"));

        assert!(u.has_branch_permission("sales:delete", "china_town"));
        assert!(!u.has_branch_permission("sales:delete", "place_india"));
        assert!(u.has_branch_permission("reports:view", "place_india"));
    }

    #[test]
    fn test_admin_and_all_pass_everything() {
        assert!(user("admin", &[]).has_branch_permission("users:delete", "x"));
        assert!(user("staff", &["all"]).has_permission("settings:edit"));
    }

    #[test]
    fn test_printable_secret_is_long_enough() {
        let a = generate_secure_printable_jwt_secret();
        let b = generate_secure_printable_jwt_secret();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
