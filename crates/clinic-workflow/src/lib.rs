//! # 前台接诊工作流模块
//!
//! 提供医院前台的完整接诊流程管理，包括：
//! - 出诊时段索引：维护医护人员的开放与已预约时段，在人员级锁内检查并占用
//! - 科室分诊路由：按主诉关键词匹配接诊科室
//! - 前台预约协调：查找可用人员、登记与取消预约
//! - 预约状态机：管理预约从登记到完成的生命周期
//! - 就诊处理：执行主诉分析、查体与治疗方案更新
//! - 病历档案管理：患者诊断记录的受控修改入口

pub mod availability;
pub mod booking;
pub mod config;
pub mod records;
pub mod routing;
pub mod state;
pub mod visit;

// 重新导出主要类型
pub use availability::AvailabilityIndex;
pub use booking::{Reception, ReceptionStats, DEFAULT_MAX_CANDIDATES};
pub use config::{FrontDeskConfig, LoggingConfig, ReceptionConfig, RoutingConfig};
pub use records::MedicalRecordStore;
pub use routing::{ComplaintRule, DepartmentRouter};
pub use state::{AppointmentEvent, AppointmentStateMachine};
pub use visit::{
    AnalysisResult, CheckupOutcome, ComplaintSeverity, ExaminationPolicy, KeywordExamination,
    VisitProcessor, VisitResult,
};
