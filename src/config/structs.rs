use serde::{Deserialize, Serialize};

use crate::errors::{QuotalinkError, Result};
use crate::services::CodeStrategy;
use crate::storage::MAX_CLICK_QUOTA;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 有效期上限（小时，约十年）
pub const MAX_TTL_HOURS: u32 = 87_600;

/// 清理间隔上限（分钟，一周）
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 10_080;

/// 应用配置（启动时加载一次，之后只读）
///
/// 包含：
/// - link: 短码生成、有效期、默认点击配额
/// - notification: 通知开关
/// - cleanup: 过期清理任务
/// - security: 所有权检查、用户会话
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：QL，分隔符：__
    /// 示例：QL__LINK__DEFAULT_TTL_HOURS=48
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        let settings = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 QL，分隔符 __
            .add_source(
                Environment::with_prefix("QL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the core cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.link.short_code_length == 0 || self.link.short_code_length > 64 {
            return Err(QuotalinkError::config(format!(
                "link.short_code_length must be within 1..=64, got {}",
                self.link.short_code_length
            )));
        }
        if self.link.default_ttl_hours == 0 || self.link.default_ttl_hours > MAX_TTL_HOURS {
            return Err(QuotalinkError::config(format!(
                "link.default_ttl_hours must be within 1..={}, got {}",
                MAX_TTL_HOURS, self.link.default_ttl_hours
            )));
        }
        if self.link.default_max_clicks == 0 || self.link.default_max_clicks > MAX_CLICK_QUOTA {
            return Err(QuotalinkError::config(format!(
                "link.default_max_clicks must be within 1..={}, got {}",
                MAX_CLICK_QUOTA, self.link.default_max_clicks
            )));
        }
        if self.notification.near_limit_threshold_percent > 100 {
            return Err(QuotalinkError::config(
                "notification.near_limit_threshold_percent cannot exceed 100",
            ));
        }
        if self.cleanup.check_interval_minutes == 0
            || self.cleanup.check_interval_minutes > MAX_CHECK_INTERVAL_MINUTES
        {
            return Err(QuotalinkError::config(format!(
                "cleanup.check_interval_minutes must be within 1..={}, got {}",
                MAX_CHECK_INTERVAL_MINUTES, self.cleanup.check_interval_minutes
            )));
        }
        if self.security.user_session_ttl_hours == 0
            || self.security.user_session_ttl_hours > MAX_TTL_HOURS
        {
            return Err(QuotalinkError::config(format!(
                "security.user_session_ttl_hours must be within 1..={}, got {}",
                MAX_TTL_HOURS, self.security.user_session_ttl_hours
            )));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("# Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 短链接配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkConfig {
    #[serde(default = "default_short_code_length")]
    pub short_code_length: usize,
    #[serde(default = "default_ttl_hours")]
    pub default_ttl_hours: u32,
    #[serde(default = "default_max_clicks")]
    pub default_max_clicks: u32,
    #[serde(default)]
    pub generation_algorithm: CodeStrategy,
}

/// 通知配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub expire_notification: bool,
    #[serde(default = "default_true")]
    pub limit_notification: bool,
    #[serde(default = "default_near_limit_threshold")]
    pub near_limit_threshold_percent: u32,
}

/// 过期清理配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanupConfig {
    #[serde(default = "default_check_interval_minutes")]
    pub check_interval_minutes: u64,
    #[serde(default = "default_true")]
    pub auto_delete_expired: bool,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

/// 安全配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityConfig {
    #[serde(default = "default_true")]
    pub owner_only_operations: bool,
    #[serde(default = "default_user_session_ttl_hours")]
    pub user_session_ttl_hours: u32,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_true")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_true() -> bool {
    true
}

fn default_short_code_length() -> usize {
    7
}

fn default_ttl_hours() -> u32 {
    24
}

fn default_max_clicks() -> u32 {
    100
}

fn default_near_limit_threshold() -> u32 {
    80
}

fn default_check_interval_minutes() -> u64 {
    5
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

fn default_user_session_ttl_hours() -> u32 {
    168
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

// ============================================================
// Default implementations
// ============================================================

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            short_code_length: default_short_code_length(),
            default_ttl_hours: default_ttl_hours(),
            default_max_clicks: default_max_clicks(),
            generation_algorithm: CodeStrategy::default(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            expire_notification: true,
            limit_notification: true,
            near_limit_threshold_percent: default_near_limit_threshold(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            check_interval_minutes: default_check_interval_minutes(),
            auto_delete_expired: true,
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            owner_only_operations: true,
            user_session_ttl_hours: default_user_session_ttl_hours(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.link.short_code_length, 7);
        assert_eq!(config.link.default_ttl_hours, 24);
        assert_eq!(config.link.default_max_clicks, 100);
        assert_eq!(config.link.generation_algorithm, CodeStrategy::Base62);
        assert_eq!(config.cleanup.check_interval_minutes, 5);
        assert!(config.cleanup.auto_delete_expired);
        assert_eq!(config.security.user_session_ttl_hours, 168);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[link]\nshort_code_length = 9\ngeneration_algorithm = \"hash\"\n\n[cleanup]\nauto_delete_expired = false"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.link.short_code_length, 9);
        assert_eq!(config.link.generation_algorithm, CodeStrategy::Hash);
        assert!(!config.cleanup.auto_delete_expired);
        // 未出现的字段使用默认值
        assert_eq!(config.link.default_max_clicks, 100);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load(Some("definitely-not-here.toml")).unwrap();
        assert_eq!(config.link, LinkConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.link.default_max_clicks = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.cleanup.check_interval_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.link.default_ttl_hours = 0;
        assert!(matches!(config.validate(), Err(QuotalinkError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_durations() {
        let mut config = AppConfig::default();
        config.link.default_ttl_hours = u32::MAX;
        assert!(matches!(config.validate(), Err(QuotalinkError::Config(_))));

        let mut config = AppConfig::default();
        config.link.default_ttl_hours = MAX_TTL_HOURS;
        assert!(config.validate().is_ok());

        let mut config = AppConfig::default();
        config.security.user_session_ttl_hours = u32::MAX;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.security.user_session_ttl_hours = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.cleanup.check_interval_minutes = u64::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_config_round_trips() {
        let sample = AppConfig::generate_sample_config();
        let parsed: AppConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
