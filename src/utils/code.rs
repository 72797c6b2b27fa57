use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult};

static CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]{3,20}$").expect("valid promotion code pattern")
});

/// 去除首尾空白并转大写
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// 返回规范化后的优惠码
pub fn validate_code(code: &str) -> AppResult<String> {
    let normalized = normalize_code(code);
    if !CODE_RE.is_match(&normalized) {
        return Err(AppError::ValidationError(
            "Promotion code must be 3-20 alphanumeric characters".to_string(),
        ));
    }
    Ok(normalized)
}
