//! 前台预约协调
//!
//! 按主诉路由科室，在科室人员中按登记顺序查找可用时段，
//! 原子占用后登记预约；取消时在同一把人员级锁内释放时段

use chrono::Utc;
use clinic_core::{
    Appointment, AppointmentStatus, Capability, ClinicError, Result, TimeInterval,
};
use clinic_roster::{PatientRegistry, StaffDirectory};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::availability::AvailabilityIndex;
use crate::config::FrontDeskConfig;
use crate::records::MedicalRecordStore;
use crate::routing::DepartmentRouter;
use crate::state::{AppointmentEvent, AppointmentStateMachine};

/// 候选人员扫描上限的默认值
pub const DEFAULT_MAX_CANDIDATES: usize = 16;

/// 前台接待处
///
/// 可在多个接待窗口间共享；花名册与患者名册作为协作方由调用方传入
#[derive(Debug)]
pub struct Reception {
    phone_number: String,
    max_candidates: usize,
    router: DepartmentRouter,
    availability: AvailabilityIndex,
    records: MedicalRecordStore,
    state_machine: AppointmentStateMachine,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    patient_appointments: RwLock<HashMap<Uuid, Vec<Uuid>>>, // patient_id -> appointment_ids
}

/// 接待处运行统计
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReceptionStats {
    pub booked: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl Reception {
    /// 创建接待处
    pub fn new(phone_number: impl Into<String>, router: DepartmentRouter) -> Self {
        Self {
            phone_number: phone_number.into(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
            router,
            availability: AvailabilityIndex::new(),
            records: MedicalRecordStore::new(),
            state_machine: AppointmentStateMachine::new(),
            appointments: RwLock::new(HashMap::new()),
            patient_appointments: RwLock::new(HashMap::new()),
        }
    }

    /// 按配置创建接待处
    pub fn from_config(config: &FrontDeskConfig) -> Self {
        let mut reception = Self::new(config.reception.phone_number.clone(), config.router());
        reception.max_candidates = config.reception.max_candidates;
        reception
    }

    /// 接待处电话
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    /// 出诊时段索引
    pub fn availability(&self) -> &AvailabilityIndex {
        &self.availability
    }

    /// 病历档案库
    pub fn records(&self) -> &MedicalRecordStore {
        &self.records
    }

    /// 分诊路由表
    pub fn router(&self) -> &DepartmentRouter {
        &self.router
    }

    fn appointments_write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Appointment>>> {
        self.appointments
            .write()
            .map_err(|_| ClinicError::Internal("reception log lock poisoned".to_string()))
    }

    fn appointments_read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<Uuid, Appointment>>> {
        self.appointments
            .read()
            .map_err(|_| ClinicError::Internal("reception log lock poisoned".to_string()))
    }

    /// 为患者登记预约
    ///
    /// 路由科室后按登记顺序扫描在岗人员，首个可约者当场占用时段；
    /// 每次尝试都在该人员自己的锁内完成，失败的尝试不留任何占用
    pub fn schedule(
        &self,
        roster: &StaffDirectory,
        registry: &PatientRegistry,
        patient_id: Uuid,
        requested: TimeInterval,
    ) -> Result<Appointment> {
        let patient = registry.patient(patient_id)?;
        let rule = self.router.route(&patient.complaints)?;
        let department = roster.department_by_name(&rule.department).ok_or_else(|| {
            ClinicError::NoDepartment(format!(
                "Department {} is not present in the roster",
                rule.department
            ))
        })?;

        let staff = roster.staff_of(department.id)?;
        if staff.len() > self.max_candidates {
            tracing::debug!(
                "Department {} has {} staff, scanning first {}",
                department.name,
                staff.len(),
                self.max_candidates
            );
        }

        let appointment_id = Uuid::new_v4();
        let mut reserved_worker = None;
        for worker in staff.iter().take(self.max_candidates) {
            match self.availability.reserve(worker.id, &requested, appointment_id) {
                Ok(()) => {
                    reserved_worker = Some(*worker);
                    break;
                }
                Err(ClinicError::NoAvailability(_))
                | Err(ClinicError::Conflict(_))
                | Err(ClinicError::NotFound(_)) => continue,
                Err(other) => return Err(other),
            }
        }

        let worker = reserved_worker.ok_or_else(|| {
            ClinicError::NoAvailability(format!(
                "No staff available in {} for the requested interval",
                department.name
            ))
        })?;

        // 占用之后唯一可能失败的一步；失败即回滚占用
        let card_id = match self.records.ensure_card(patient_id) {
            Ok(card_id) => card_id,
            Err(err) => {
                let _ = self.availability.release(worker.id, &requested);
                return Err(err);
            }
        };

        let appointment = Appointment {
            id: appointment_id,
            interval: requested,
            patient_id,
            staff_ids: vec![worker.id],
            department_id: department.id,
            card_id,
            status: AppointmentStatus::Booked,
            created_at: Utc::now(),
        };

        {
            let mut appointments = self.appointments_write()?;
            appointments.insert(appointment_id, appointment.clone());
        }
        {
            let mut index = self
                .patient_appointments
                .write()
                .map_err(|_| ClinicError::Internal("reception log lock poisoned".to_string()))?;
            index.entry(patient_id).or_default().push(appointment_id);
        }

        tracing::info!(
            "Booked appointment {} for patient {} with worker {} in {}",
            appointment_id,
            patient_id,
            worker.id,
            department.name
        );
        Ok(appointment)
    }

    /// 取消预约
    ///
    /// 只有预约所属患者可以取消；重复取消返回 `AlreadyCancelled`
    pub fn cancel(&self, appointment_id: Uuid, patient_id: Uuid) -> Result<()> {
        let mut appointments = self.appointments_write()?;
        let appointment = appointments.get_mut(&appointment_id).ok_or_else(|| {
            ClinicError::NotFound(format!("Appointment {} not found", appointment_id))
        })?;

        if appointment.patient_id != patient_id {
            return Err(ClinicError::NotOwner(format!(
                "Appointment {} does not belong to patient {}",
                appointment_id, patient_id
            )));
        }
        if appointment.status == AppointmentStatus::Cancelled {
            return Err(ClinicError::AlreadyCancelled(appointment_id.to_string()));
        }

        let next = self
            .state_machine
            .transition(&appointment.status, &AppointmentEvent::Cancelled)?;

        for staff_id in &appointment.staff_ids {
            if let Err(err) = self.availability.release(*staff_id, &appointment.interval) {
                return Err(ClinicError::Internal(format!(
                    "Reservation missing for worker {}: {}",
                    staff_id, err
                )));
            }
        }
        appointment.status = next;
        drop(appointments);

        let mut index = self
            .patient_appointments
            .write()
            .map_err(|_| ClinicError::Internal("reception log lock poisoned".to_string()))?;
        if let Some(ids) = index.get_mut(&patient_id) {
            ids.retain(|&id| id != appointment_id);
        }

        tracing::info!("Cancelled appointment {} for patient {}", appointment_id, patient_id);
        Ok(())
    }

    /// 为预约加派辅助护士
    ///
    /// 护士须具备辅助能力，且在预约时段同样可约；取消预约时一并释放
    pub fn add_assistant(
        &self,
        roster: &StaffDirectory,
        appointment_id: Uuid,
        nurse_id: Uuid,
    ) -> Result<()> {
        let nurse = roster.worker(nurse_id)?;
        if !nurse.has_capability(Capability::Assist) {
            return Err(ClinicError::Validation(format!(
                "Worker {} cannot assist",
                nurse_id
            )));
        }

        let mut appointments = self.appointments_write()?;
        let appointment = appointments.get_mut(&appointment_id).ok_or_else(|| {
            ClinicError::NotFound(format!("Appointment {} not found", appointment_id))
        })?;
        if appointment.status != AppointmentStatus::Booked {
            return Err(ClinicError::Validation(format!(
                "Appointment {} is not open for staffing changes",
                appointment_id
            )));
        }
        if appointment.staff_ids.contains(&nurse_id) {
            return Err(ClinicError::Conflict(format!(
                "Worker {} is already assigned to appointment {}",
                nurse_id, appointment_id
            )));
        }

        self.availability
            .reserve(nurse_id, &appointment.interval, appointment_id)?;
        appointment.staff_ids.push(nurse_id);

        tracing::info!("Assigned nurse {} to appointment {}", nurse_id, appointment_id);
        Ok(())
    }

    /// 患者到诊，预约进入就诊中
    pub fn begin_visit(&self, appointment_id: Uuid) -> Result<Appointment> {
        let mut appointments = self.appointments_write()?;
        let appointment = appointments.get_mut(&appointment_id).ok_or_else(|| {
            ClinicError::NotFound(format!("Appointment {} not found", appointment_id))
        })?;
        let next = self
            .state_machine
            .transition(&appointment.status, &AppointmentEvent::CheckedIn)?;
        appointment.status = next;
        Ok(appointment.clone())
    }

    /// 就诊结束，预约标记完成
    pub fn conclude_visit(&self, appointment_id: Uuid) -> Result<()> {
        let mut appointments = self.appointments_write()?;
        let appointment = appointments.get_mut(&appointment_id).ok_or_else(|| {
            ClinicError::NotFound(format!("Appointment {} not found", appointment_id))
        })?;
        let next = self
            .state_machine
            .transition(&appointment.status, &AppointmentEvent::Concluded)?;
        appointment.status = next;
        tracing::info!("Appointment {} completed", appointment_id);
        Ok(())
    }

    /// 获取预约
    pub fn appointment(&self, appointment_id: Uuid) -> Option<Appointment> {
        self.appointments_read()
            .ok()
            .and_then(|appointments| appointments.get(&appointment_id).cloned())
    }

    /// 患者的有效预约，按就诊时段先后排列
    pub fn appointments_of(&self, patient_id: Uuid) -> Vec<Appointment> {
        let ids = match self.patient_appointments.read() {
            Ok(index) => index.get(&patient_id).cloned().unwrap_or_default(),
            Err(_) => return Vec::new(),
        };
        let appointments = match self.appointments_read() {
            Ok(appointments) => appointments,
            Err(_) => return Vec::new(),
        };

        let mut active: Vec<Appointment> = ids
            .iter()
            .filter_map(|id| appointments.get(id))
            .filter(|a| {
                matches!(
                    a.status,
                    AppointmentStatus::Booked | AppointmentStatus::InProgress
                )
            })
            .cloned()
            .collect();
        active.sort_by_key(|a| (a.interval.start_date, a.interval.start_time, a.created_at));
        active
    }

    /// 患者的全部预约记录，含已完成与已取消
    pub fn appointment_history(&self, patient_id: Uuid) -> Vec<Appointment> {
        let appointments = match self.appointments_read() {
            Ok(appointments) => appointments,
            Err(_) => return Vec::new(),
        };
        let mut history: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        history.sort_by_key(|a| a.created_at);
        history
    }

    /// 接待处运行统计
    pub fn stats(&self) -> ReceptionStats {
        let mut stats = ReceptionStats {
            booked: 0,
            in_progress: 0,
            completed: 0,
            cancelled: 0,
        };
        if let Ok(appointments) = self.appointments_read() {
            for appointment in appointments.values() {
                match appointment.status {
                    AppointmentStatus::Booked => stats.booked += 1,
                    AppointmentStatus::InProgress => stats.in_progress += 1,
                    AppointmentStatus::Completed => stats.completed += 1,
                    AppointmentStatus::Cancelled => stats.cancelled += 1,
                }
            }
        }
        stats
    }
}
