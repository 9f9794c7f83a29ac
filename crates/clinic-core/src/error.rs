//! 错误定义模块

use thiserror::Error;

/// 前台接诊系统统一错误类型
#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据校验错误: {0}")]
    Validation(String),

    #[error("无法匹配接诊科室: {0}")]
    NoDepartment(String),

    #[error("无可用出诊时段: {0}")]
    NoAvailability(String),

    #[error("预约时段冲突: {0}")]
    Conflict(String),

    #[error("患者与预约不匹配: {0}")]
    NotOwner(String),

    #[error("预约已取消: {0}")]
    AlreadyCancelled(String),

    #[error("患者没有有效预约: {0}")]
    NoAppointment(String),

    #[error("预约未分配接诊医生: {0}")]
    NoDoctorAssigned(String),

    #[error("病历卡中没有诊断记录: {0}")]
    NoDiagnosis(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("系统内部错误: {0}")]
    Internal(String),

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },
}

/// 前台接诊系统统一结果类型
pub type Result<T> = std::result::Result<T, ClinicError>;
