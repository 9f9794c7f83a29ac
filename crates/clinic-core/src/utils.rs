//! 通用工具函数

use chrono::Utc;
use uuid::Uuid;

/// 生成唯一的病历卡编号
pub fn generate_card_number() -> String {
    let tail = Uuid::new_v4().simple().to_string();
    format!("MC-{}-{}", Utc::now().format("%Y%m%d"), &tail[..8])
}

/// 校验病历卡编号格式
pub fn is_valid_card_number(number: &str) -> bool {
    let parts: Vec<&str> = number.split('-').collect();
    if parts.len() != 3 || parts[0] != "MC" {
        return false;
    }
    parts[1].len() == 8
        && parts[1].chars().all(|c| c.is_ascii_digit())
        && parts[2].len() == 8
        && parts[2].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_card_number() {
        let number = generate_card_number();
        assert!(is_valid_card_number(&number));
    }

    #[test]
    fn test_is_valid_card_number() {
        assert!(is_valid_card_number("MC-20240101-0a1b2c3d"));
        assert!(!is_valid_card_number(""));
        assert!(!is_valid_card_number("MC-2024-0a1b2c3d"));
        assert!(!is_valid_card_number("XX-20240101-0a1b2c3d"));
    }
}
