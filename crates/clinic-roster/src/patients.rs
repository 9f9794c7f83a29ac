//! 患者登记
//!
//! 前台的患者名册，保存基本信息与当前主诉

use chrono::{NaiveDate, Utc};
use clinic_core::{ClinicError, Patient, Result};
use std::collections::HashMap;
use uuid::Uuid;

/// 患者名册
#[derive(Debug, Default)]
pub struct PatientRegistry {
    patients: HashMap<Uuid, Patient>,
    order: Vec<Uuid>, // 登记顺序
}

impl PatientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记新患者
    pub fn register(&mut self, name: impl Into<String>, birth_date: NaiveDate) -> Patient {
        let patient = Patient::new(name, birth_date);
        let patient_id = patient.id;
        self.patients.insert(patient_id, patient.clone());
        self.order.push(patient_id);
        tracing::info!("Registered patient {}", patient_id);
        patient
    }

    /// 获取患者
    pub fn patient(&self, patient_id: Uuid) -> Result<&Patient> {
        self.patients
            .get(&patient_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Patient {} not found", patient_id)))
    }

    /// 覆盖患者当前主诉，保持给定顺序
    pub fn set_complaints(&mut self, patient_id: Uuid, complaints: Vec<String>) -> Result<()> {
        let patient = self
            .patients
            .get_mut(&patient_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Patient {} not found", patient_id)))?;
        patient.complaints = complaints;
        patient.updated_at = Utc::now();
        Ok(())
    }

    /// 追加一条主诉
    pub fn add_complaint(&mut self, patient_id: Uuid, complaint: impl Into<String>) -> Result<()> {
        let patient = self
            .patients
            .get_mut(&patient_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Patient {} not found", patient_id)))?;
        patient.complaints.push(complaint.into());
        patient.updated_at = Utc::now();
        Ok(())
    }

    /// 所有患者，按登记顺序
    pub fn patients(&self) -> Vec<&Patient> {
        self.order.iter().filter_map(|id| self.patients.get(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_register_and_complaints() {
        let mut registry = PatientRegistry::new();
        let patient = registry.register("王先生", date(1980, 5, 20));

        registry
            .set_complaints(patient.id, vec!["chest pain".to_string(), "cough".to_string()])
            .unwrap();
        registry.add_complaint(patient.id, "fever").unwrap();

        let stored = registry.patient(patient.id).unwrap();
        assert_eq!(stored.complaints, vec!["chest pain", "cough", "fever"]);
    }

    #[test]
    fn test_unknown_patient() {
        let registry = PatientRegistry::new();
        assert!(registry.patient(Uuid::new_v4()).is_err());
    }
}
