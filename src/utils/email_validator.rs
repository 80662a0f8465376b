//! Notification email validation

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // 模式为常量，编译不会失败
    Regex::new(r"^[A-Za-z0-9+_.-]+@(.+)$").expect("email pattern is valid")
});

/// Loose address check: a local part of `[A-Za-z0-9+_.-]` followed by `@` and
/// anything non-empty.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}
