//! 科室分诊路由
//!
//! 按主诉关键词把患者分配到接诊科室

use clinic_core::{ClinicError, Result};
use serde::{Deserialize, Serialize};

/// 分诊规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintRule {
    pub keyword: String,
    pub department: String,
}

impl ComplaintRule {
    pub fn new(keyword: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            department: department.into(),
        }
    }
}

/// 分诊路由表
///
/// 规则有序，匹配不区分大小写，首个命中的关键词决定科室
#[derive(Debug, Clone, Default)]
pub struct DepartmentRouter {
    rules: Vec<ComplaintRule>,
}

impl DepartmentRouter {
    /// 创建空路由表
    pub fn new() -> Self {
        Self::default()
    }

    /// 按给定规则创建路由表
    pub fn with_rules(rules: Vec<ComplaintRule>) -> Self {
        Self { rules }
    }

    /// 内置分诊表
    pub fn default_table() -> Self {
        Self::with_rules(vec![
            ComplaintRule::new("chest pain", "Cardiology"),
            ComplaintRule::new("palpitation", "Cardiology"),
            ComplaintRule::new("headache", "Neurology"),
            ComplaintRule::new("dizziness", "Neurology"),
            ComplaintRule::new("cough", "Pulmonology"),
            ComplaintRule::new("short of breath", "Pulmonology"),
            ComplaintRule::new("rash", "Dermatology"),
            ComplaintRule::new("fracture", "Traumatology"),
            ComplaintRule::new("sprain", "Traumatology"),
            ComplaintRule::new("fever", "General Medicine"),
            ComplaintRule::new("sore throat", "General Medicine"),
        ])
    }

    /// 追加分诊规则
    pub fn add_rule(&mut self, rule: ComplaintRule) {
        self.rules.push(rule);
    }

    /// 当前规则表
    pub fn rules(&self) -> &[ComplaintRule] {
        &self.rules
    }

    /// 按主诉顺序匹配科室，无法匹配返回 `NoDepartment`
    pub fn route(&self, complaints: &[String]) -> Result<&ComplaintRule> {
        for complaint in complaints {
            let lowered = complaint.to_lowercase();
            for rule in &self.rules {
                if lowered.contains(&rule.keyword.to_lowercase()) {
                    tracing::debug!(
                        "Complaint '{}' matched keyword '{}' -> {}",
                        complaint,
                        rule.keyword,
                        rule.department
                    );
                    return Ok(rule);
                }
            }
        }
        Err(ClinicError::NoDepartment(format!(
            "No department matches complaints [{}]",
            complaints.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chest_pain_routes_to_cardiology() {
        let router = DepartmentRouter::default_table();
        let rule = router.route(&["chest pain".to_string()]).unwrap();
        assert_eq!(rule.department, "Cardiology");
    }

    #[test]
    fn test_first_matching_keyword_wins() {
        let router = DepartmentRouter::default_table();
        // 首条主诉先匹配
        let rule = router
            .route(&["headache".to_string(), "chest pain".to_string()])
            .unwrap();
        assert_eq!(rule.department, "Neurology");
    }

    #[test]
    fn test_match_is_case_insensitive_substring() {
        let router = DepartmentRouter::default_table();
        let rule = router
            .route(&["Sudden CHEST PAIN after exercise".to_string()])
            .unwrap();
        assert_eq!(rule.department, "Cardiology");
    }

    #[test]
    fn test_no_match_is_no_department() {
        let router = DepartmentRouter::default_table();
        let result = router.route(&["hiccups".to_string()]);
        assert!(matches!(result, Err(ClinicError::NoDepartment(_))));

        let empty = router.route(&[]);
        assert!(matches!(empty, Err(ClinicError::NoDepartment(_))));
    }
}
