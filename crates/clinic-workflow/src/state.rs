//! 预约状态机
//!
//! 管理预约从登记到就诊完成的生命周期状态转换

use clinic_core::{AppointmentStatus, ClinicError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 预约状态转换事件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentEvent {
    CheckedIn, // 患者到诊
    Concluded, // 就诊结束
    Cancelled, // 预约取消
}

/// 预约状态机
#[derive(Debug)]
pub struct AppointmentStateMachine {
    transitions: HashMap<(AppointmentStatus, AppointmentEvent), AppointmentStatus>,
}

impl AppointmentStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        // 定义状态转换规则
        transitions.insert(
            (AppointmentStatus::Booked, AppointmentEvent::CheckedIn),
            AppointmentStatus::InProgress,
        );
        transitions.insert(
            (AppointmentStatus::InProgress, AppointmentEvent::Concluded),
            AppointmentStatus::Completed,
        );
        transitions.insert(
            (AppointmentStatus::Booked, AppointmentEvent::Cancelled),
            AppointmentStatus::Cancelled,
        );
        transitions.insert(
            (AppointmentStatus::InProgress, AppointmentEvent::Cancelled),
            AppointmentStatus::Cancelled,
        );

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: &AppointmentStatus, event: &AppointmentEvent) -> bool {
        self.transitions.contains_key(&(from.clone(), event.clone()))
    }

    /// 执行状态转换
    pub fn transition(
        &self,
        from: &AppointmentStatus,
        event: &AppointmentEvent,
    ) -> Result<AppointmentStatus> {
        match self.transitions.get(&(from.clone(), event.clone())) {
            Some(to) => Ok(to.clone()),
            None => Err(ClinicError::InvalidStateTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 获取状态的所有可能事件
    pub fn possible_events(&self, current: &AppointmentStatus) -> Vec<AppointmentEvent> {
        self.transitions
            .keys()
            .filter(|(state, _)| state == current)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

impl Default for AppointmentStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let sm = AppointmentStateMachine::new();

        assert!(sm.can_transition(&AppointmentStatus::Booked, &AppointmentEvent::CheckedIn));
        assert!(sm.can_transition(&AppointmentStatus::InProgress, &AppointmentEvent::Concluded));
        assert!(sm.can_transition(&AppointmentStatus::Booked, &AppointmentEvent::Cancelled));
    }

    #[test]
    fn test_invalid_transitions() {
        let sm = AppointmentStateMachine::new();

        assert!(!sm.can_transition(&AppointmentStatus::Completed, &AppointmentEvent::CheckedIn));
        assert!(!sm.can_transition(&AppointmentStatus::Cancelled, &AppointmentEvent::Cancelled));
        assert!(!sm.can_transition(&AppointmentStatus::Booked, &AppointmentEvent::Concluded));
    }

    #[test]
    fn test_transition_execution() {
        let sm = AppointmentStateMachine::new();

        let result = sm.transition(&AppointmentStatus::Booked, &AppointmentEvent::CheckedIn);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), AppointmentStatus::InProgress);

        let result = sm.transition(&AppointmentStatus::Completed, &AppointmentEvent::Cancelled);
        assert!(result.is_err());
    }
}
