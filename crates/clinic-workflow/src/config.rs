//! 配置管理
//!
//! 前台系统的统一配置，支持文件与环境变量来源，加载时统一校验

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::booking::DEFAULT_MAX_CANDIDATES;
use crate::routing::{ComplaintRule, DepartmentRouter};

/// 前台系统完整配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontDeskConfig {
    /// 接待处配置
    pub reception: ReceptionConfig,
    /// 分诊路由配置
    pub routing: RoutingConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 接待处配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptionConfig {
    /// 接待处电话
    pub phone_number: String,
    /// 单次预约扫描的候选人员上限
    pub max_candidates: usize,
}

/// 分诊路由配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// 关键词到科室的有序规则表，靠前的规则优先
    pub rules: Vec<ComplaintRule>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for FrontDeskConfig {
    fn default() -> Self {
        Self {
            reception: ReceptionConfig {
                phone_number: "010-00000000".to_string(),
                max_candidates: DEFAULT_MAX_CANDIDATES,
            },
            routing: RoutingConfig {
                rules: DepartmentRouter::default_table().rules().to_vec(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl FrontDeskConfig {
    /// 加载配置
    ///
    /// 内置默认值 < 配置文件 < `CLINIC_` 前缀环境变量
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&FrontDeskConfig::default()).context("序列化默认配置失败")?,
        );
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("CLINIC").separator("__"))
            .build()
            .context("加载配置失败")?;

        let config: FrontDeskConfig = settings.try_deserialize().context("解析配置失败")?;
        config.validate()?;
        Ok(config)
    }

    /// 配置校验
    pub fn validate(&self) -> Result<()> {
        if self.reception.max_candidates == 0 {
            anyhow::bail!("reception.max_candidates must be at least 1");
        }
        if self.routing.rules.is_empty() {
            anyhow::bail!("routing.rules must not be empty");
        }
        for rule in &self.routing.rules {
            if rule.keyword.trim().is_empty() || rule.department.trim().is_empty() {
                anyhow::bail!("routing rule keyword and department must not be blank");
            }
        }
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!("unknown logging level: {}", self.logging.level);
        }
        Ok(())
    }

    /// 按配置构建分诊路由表
    pub fn router(&self) -> DepartmentRouter {
        DepartmentRouter::with_rules(self.routing.rules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FrontDeskConfig::default();
        assert!(config.validate().is_ok());

        let router = config.router();
        let rule = router.route(&["chest pain".to_string()]).unwrap();
        assert_eq!(rule.department, "Cardiology");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = FrontDeskConfig::default();
        config.reception.max_candidates = 0;
        assert!(config.validate().is_err());

        let mut config = FrontDeskConfig::default();
        config.routing.rules.clear();
        assert!(config.validate().is_err());

        let mut config = FrontDeskConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
