//! 核心数据模型定义

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClinicError, Result};

/// 时间区间
///
/// 由日期范围与当日时间范围两个轴构成，既表示循环出诊时段（开放），
/// 也表示单次预约时段（已占用）。两个轴上均为闭区间。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TimeInterval {
    /// 创建时间区间，要求两个轴上 start <= end
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Self> {
        if start_date > end_date {
            return Err(ClinicError::Validation(format!(
                "日期范围无效: {} > {}",
                start_date, end_date
            )));
        }
        if start_time > end_time {
            return Err(ClinicError::Validation(format!(
                "时间范围无效: {} > {}",
                start_time, end_time
            )));
        }
        Ok(Self {
            start_date,
            end_date,
            start_time,
            end_time,
        })
    }

    /// 单日时段
    pub fn single(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Result<Self> {
        Self::new(date, date, start_time, end_time)
    }

    /// 本区间是否完整包含另一区间
    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start_date <= other.start_date
            && other.end_date <= self.end_date
            && self.start_time <= other.start_time
            && other.end_time <= self.end_time
    }

    /// 两区间是否相交（日期轴与时间轴须同时相交）
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start_date <= other.end_date
            && other.start_date <= self.end_date
            && self.start_time <= other.end_time
            && other.start_time <= self.end_time
    }
}

/// 时段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    Open,     // 开放出诊时段
    Reserved, // 已预约时段
}

/// 排班表条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub interval: TimeInterval,
    pub kind: SlotKind,
    pub appointment_id: Option<Uuid>,
}

/// 医护人员角色
///
/// 以携带能力标签的变体代替继承，按角色进行模式匹配分派
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StaffRole {
    /// 医生，负责接诊、诊断与开具治疗方案
    Doctor { specialization: String },
    /// 护士，负责辅助医生与采样
    Nurse { qualification: String },
}

/// 医护能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Examine, // 接诊
    Assist,  // 辅助
}

/// 医护人员
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalWorker {
    pub id: Uuid,
    pub name: String,
    pub role: StaffRole,
    pub created_at: DateTime<Utc>,
}

impl MedicalWorker {
    /// 创建医护人员
    pub fn new(name: impl Into<String>, role: StaffRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
            created_at: Utc::now(),
        }
    }

    /// 是否具备指定能力
    pub fn has_capability(&self, capability: Capability) -> bool {
        match (&self.role, capability) {
            (StaffRole::Doctor { .. }, Capability::Examine) => true,
            (StaffRole::Nurse { .. }, Capability::Assist) => true,
            _ => false,
        }
    }

    /// 角色名称
    pub fn role_title(&self) -> &'static str {
        match self.role {
            StaffRole::Doctor { .. } => "doctor",
            StaffRole::Nurse { .. } => "nurse",
        }
    }
}

/// 科室
///
/// 科室与医护人员的多对多关系通过花名册索引维护，不在实体间嵌入反向引用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Department {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// 医院
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl Hospital {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address: address.into(),
            created_at: Utc::now(),
        }
    }
}

/// 患者基本信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub birth_date: NaiveDate,
    pub complaints: Vec<String>, // 当前主诉，保持录入顺序
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(name: impl Into<String>, birth_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            birth_date,
            complaints: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// 预约状态
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Booked,     // 已登记
    InProgress, // 就诊中
    Completed,  // 已完成
    Cancelled,  // 已取消
}

/// 预约记录
///
/// 创建后除生命周期状态与辅助人员外不再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub interval: TimeInterval,
    pub patient_id: Uuid,
    pub staff_ids: Vec<Uuid>, // 首位为主诊人员
    pub department_id: Uuid,
    pub card_id: Uuid,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

/// 病历卡
///
/// 每位患者一张，首次预约时创建；诊断列表只追加和更新，不物理删除
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalCard {
    pub id: Uuid,
    pub number: String,
    pub patient_id: Uuid,
    pub diagnoses: Vec<Diagnosis>,
    pub created_at: DateTime<Utc>,
}

/// 诊断记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: Uuid,
    pub description: String,
    pub date_diagnosed: NaiveDate,
    pub treatment: String,
    pub is_active: bool, // 仅翻转，不删除记录
}

impl Diagnosis {
    pub fn new(
        description: impl Into<String>,
        date_diagnosed: NaiveDate,
        treatment: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            date_diagnosed,
            treatment: treatment.into(),
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_interval_validation() {
        assert!(TimeInterval::new(date(2024, 1, 2), date(2024, 1, 1), time(9, 0), time(17, 0)).is_err());
        assert!(TimeInterval::new(date(2024, 1, 1), date(2024, 1, 1), time(17, 0), time(9, 0)).is_err());
        assert!(TimeInterval::single(date(2024, 1, 1), time(9, 0), time(17, 0)).is_ok());
    }

    #[test]
    fn test_interval_containment() {
        let open = TimeInterval::new(date(2024, 1, 1), date(2024, 1, 5), time(9, 0), time(17, 0)).unwrap();
        let slot = TimeInterval::single(date(2024, 1, 3), time(10, 0), time(10, 30)).unwrap();
        assert!(open.contains(&slot));

        // 边界为闭区间
        let edge = TimeInterval::single(date(2024, 1, 5), time(9, 0), time(17, 0)).unwrap();
        assert!(open.contains(&edge));

        // 跨越多天且仅部分落在开放时段内的请求不算包含
        let spanning = TimeInterval::new(date(2024, 1, 4), date(2024, 1, 6), time(10, 0), time(11, 0)).unwrap();
        assert!(!open.contains(&spanning));

        let late = TimeInterval::single(date(2024, 1, 3), time(18, 0), time(19, 0)).unwrap();
        assert!(!open.contains(&late));
    }

    #[test]
    fn test_interval_overlap() {
        let a = TimeInterval::single(date(2024, 1, 1), time(10, 0), time(10, 30)).unwrap();
        let b = TimeInterval::single(date(2024, 1, 1), time(10, 15), time(10, 45)).unwrap();
        let c = TimeInterval::single(date(2024, 1, 1), time(11, 0), time(11, 30)).unwrap();
        let d = TimeInterval::single(date(2024, 1, 2), time(10, 0), time(10, 30)).unwrap();

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        // 同一时间不同日期不相交
        assert!(!a.overlaps(&d));
    }

    #[test]
    fn test_capabilities() {
        let doctor = MedicalWorker::new(
            "张医生",
            StaffRole::Doctor {
                specialization: "Cardiology".to_string(),
            },
        );
        let nurse = MedicalWorker::new(
            "王护士",
            StaffRole::Nurse {
                qualification: "RN".to_string(),
            },
        );

        assert!(doctor.has_capability(Capability::Examine));
        assert!(!doctor.has_capability(Capability::Assist));
        assert!(nurse.has_capability(Capability::Assist));
        assert!(!nurse.has_capability(Capability::Examine));
        assert_eq!(doctor.role_title(), "doctor");
        assert_eq!(nurse.role_title(), "nurse");
    }
}
