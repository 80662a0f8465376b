use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotalinkError {
    InvalidUrl(String),
    InvalidQuota(String),
    InvalidEmail(String),
    InvalidInput(String),
    NotFound(String),
    AccessDenied(String),
    AlreadyExists(String),
    Inactive(String),
    Expired(String),
    LimitReached(String),
    CodeSpaceExhausted(String),
    Config(String),
}

impl QuotalinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            QuotalinkError::InvalidUrl(_) => "E001",
            QuotalinkError::InvalidQuota(_) => "E002",
            QuotalinkError::InvalidEmail(_) => "E003",
            QuotalinkError::InvalidInput(_) => "E004",
            QuotalinkError::NotFound(_) => "E005",
            QuotalinkError::AccessDenied(_) => "E006",
            QuotalinkError::AlreadyExists(_) => "E007",
            QuotalinkError::Inactive(_) => "E008",
            QuotalinkError::Expired(_) => "E009",
            QuotalinkError::LimitReached(_) => "E010",
            QuotalinkError::CodeSpaceExhausted(_) => "E011",
            QuotalinkError::Config(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            QuotalinkError::InvalidUrl(_) => "Invalid URL",
            QuotalinkError::InvalidQuota(_) => "Invalid Click Quota",
            QuotalinkError::InvalidEmail(_) => "Invalid Email",
            QuotalinkError::InvalidInput(_) => "Invalid Input",
            QuotalinkError::NotFound(_) => "Resource Not Found",
            QuotalinkError::AccessDenied(_) => "Access Denied",
            QuotalinkError::AlreadyExists(_) => "Already Exists",
            QuotalinkError::Inactive(_) => "Link Inactive",
            QuotalinkError::Expired(_) => "Link Expired",
            QuotalinkError::LimitReached(_) => "Click Limit Reached",
            QuotalinkError::CodeSpaceExhausted(_) => "Code Space Exhausted",
            QuotalinkError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            QuotalinkError::InvalidUrl(msg)
            | QuotalinkError::InvalidQuota(msg)
            | QuotalinkError::InvalidEmail(msg)
            | QuotalinkError::InvalidInput(msg)
            | QuotalinkError::NotFound(msg)
            | QuotalinkError::AccessDenied(msg)
            | QuotalinkError::AlreadyExists(msg)
            | QuotalinkError::Inactive(msg)
            | QuotalinkError::Expired(msg)
            | QuotalinkError::LimitReached(msg)
            | QuotalinkError::CodeSpaceExhausted(msg)
            | QuotalinkError::Config(msg) => msg,
        }
    }

    /// Malformed input rejected before any state was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            QuotalinkError::InvalidUrl(_)
                | QuotalinkError::InvalidQuota(_)
                | QuotalinkError::InvalidEmail(_)
                | QuotalinkError::InvalidInput(_)
        )
    }

    /// A resolve refused by the link lifecycle.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            QuotalinkError::Inactive(_)
                | QuotalinkError::Expired(_)
                | QuotalinkError::LimitReached(_)
        )
    }

    /// 格式化为彩色输出（用于 CLI 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for QuotalinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for QuotalinkError {}

// 便捷的构造函数
impl QuotalinkError {
    pub fn invalid_url<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::InvalidUrl(msg.into())
    }

    pub fn invalid_quota<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::InvalidQuota(msg.into())
    }

    pub fn invalid_email<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::InvalidEmail(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::InvalidInput(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::NotFound(msg.into())
    }

    pub fn access_denied<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::AccessDenied(msg.into())
    }

    pub fn already_exists<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::AlreadyExists(msg.into())
    }

    pub fn inactive<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::Inactive(msg.into())
    }

    pub fn expired<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::Expired(msg.into())
    }

    pub fn limit_reached<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::LimitReached(msg.into())
    }

    pub fn code_space_exhausted<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::CodeSpaceExhausted(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        QuotalinkError::Config(msg.into())
    }
}

impl From<config::ConfigError> for QuotalinkError {
    fn from(err: config::ConfigError) -> Self {
        QuotalinkError::Config(err.to_string())
    }
}

impl From<uuid::Error> for QuotalinkError {
    fn from(err: uuid::Error) -> Self {
        QuotalinkError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QuotalinkError>;
