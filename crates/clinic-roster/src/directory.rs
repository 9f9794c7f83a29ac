//! 医院花名册
//!
//! 维护医院、科室与医护人员，科室与人员的多对多关系通过正反两个
//! 标识索引维护，人员调离后不会留下悬挂引用

use clinic_core::{ClinicError, Department, Hospital, MedicalWorker, Result};
use std::collections::HashMap;
use uuid::Uuid;

/// 花名册
#[derive(Debug, Default)]
pub struct StaffDirectory {
    hospitals: HashMap<Uuid, Hospital>,
    departments: HashMap<Uuid, Department>,
    workers: HashMap<Uuid, MedicalWorker>,
    hospital_departments: HashMap<Uuid, Vec<Uuid>>, // hospital_id -> department_ids
    department_staff: HashMap<Uuid, Vec<Uuid>>,     // department_id -> worker_ids，保持分配顺序
    worker_departments: HashMap<Uuid, Vec<Uuid>>,   // worker_id -> department_ids
}

impl StaffDirectory {
    /// 创建空花名册
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记医院
    pub fn add_hospital(&mut self, hospital: Hospital) -> Uuid {
        let hospital_id = hospital.id;
        self.hospitals.insert(hospital_id, hospital);
        self.hospital_departments.entry(hospital_id).or_default();
        tracing::info!("Registered hospital {}", hospital_id);
        hospital_id
    }

    /// 获取医院
    pub fn hospital(&self, hospital_id: Uuid) -> Result<&Hospital> {
        self.hospitals
            .get(&hospital_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Hospital {} not found", hospital_id)))
    }

    /// 在指定医院下开设科室
    pub fn add_department(&mut self, hospital_id: Uuid, department: Department) -> Result<Uuid> {
        if !self.hospitals.contains_key(&hospital_id) {
            return Err(ClinicError::NotFound(format!(
                "Hospital {} not found",
                hospital_id
            )));
        }

        let department_id = department.id;
        self.departments.insert(department_id, department);
        self.department_staff.entry(department_id).or_default();
        self.hospital_departments
            .entry(hospital_id)
            .or_default()
            .push(department_id);

        tracing::info!("Added department {} to hospital {}", department_id, hospital_id);
        Ok(department_id)
    }

    /// 获取科室
    pub fn department(&self, department_id: Uuid) -> Result<&Department> {
        self.departments
            .get(&department_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Department {} not found", department_id)))
    }

    /// 按名称查找科室
    pub fn department_by_name(&self, name: &str) -> Option<&Department> {
        self.departments.values().find(|d| d.name == name)
    }

    /// 医院下属科室，按开设顺序
    pub fn departments_of(&self, hospital_id: Uuid) -> Result<Vec<&Department>> {
        let ids = self
            .hospital_departments
            .get(&hospital_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Hospital {} not found", hospital_id)))?;
        Ok(ids.iter().filter_map(|id| self.departments.get(id)).collect())
    }

    /// 登记医护人员
    pub fn add_worker(&mut self, worker: MedicalWorker) -> Uuid {
        let worker_id = worker.id;
        self.workers.insert(worker_id, worker);
        self.worker_departments.entry(worker_id).or_default();
        tracing::info!("Registered medical worker {}", worker_id);
        worker_id
    }

    /// 获取医护人员
    pub fn worker(&self, worker_id: Uuid) -> Result<&MedicalWorker> {
        self.workers
            .get(&worker_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Worker {} not found", worker_id)))
    }

    /// 将人员分配到科室
    pub fn assign(&mut self, department_id: Uuid, worker_id: Uuid) -> Result<()> {
        if !self.departments.contains_key(&department_id) {
            return Err(ClinicError::NotFound(format!(
                "Department {} not found",
                department_id
            )));
        }
        if !self.workers.contains_key(&worker_id) {
            return Err(ClinicError::NotFound(format!("Worker {} not found", worker_id)));
        }

        let staff = self.department_staff.entry(department_id).or_default();
        if !staff.contains(&worker_id) {
            staff.push(worker_id);
        }
        let departments = self.worker_departments.entry(worker_id).or_default();
        if !departments.contains(&department_id) {
            departments.push(department_id);
        }

        tracing::info!("Assigned worker {} to department {}", worker_id, department_id);
        Ok(())
    }

    /// 将人员调出科室
    pub fn unassign(&mut self, department_id: Uuid, worker_id: Uuid) -> Result<()> {
        let staff = self
            .department_staff
            .get_mut(&department_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Department {} not found", department_id)))?;
        staff.retain(|&id| id != worker_id);

        if let Some(departments) = self.worker_departments.get_mut(&worker_id) {
            departments.retain(|&id| id != department_id);
        }

        tracing::info!("Unassigned worker {} from department {}", worker_id, department_id);
        Ok(())
    }

    /// 注销医护人员，同时从所有科室调出
    pub fn remove_worker(&mut self, worker_id: Uuid) -> Result<MedicalWorker> {
        let worker = self
            .workers
            .remove(&worker_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Worker {} not found", worker_id)))?;

        if let Some(departments) = self.worker_departments.remove(&worker_id) {
            for department_id in departments {
                if let Some(staff) = self.department_staff.get_mut(&department_id) {
                    staff.retain(|&id| id != worker_id);
                }
            }
        }

        tracing::info!("Removed medical worker {}", worker_id);
        Ok(worker)
    }

    /// 科室在岗人员，按分配顺序
    pub fn staff_of(&self, department_id: Uuid) -> Result<Vec<&MedicalWorker>> {
        let ids = self
            .department_staff
            .get(&department_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Department {} not found", department_id)))?;
        Ok(ids.iter().filter_map(|id| self.workers.get(id)).collect())
    }
}
