//! 病历档案管理
//!
//! 每位患者一张病历卡，诊断记录只追加和更新，不物理删除；
//! 同一张卡的并发修改通过卡级互斥锁串行化

use chrono::{NaiveDate, Utc};
use clinic_core::utils::generate_card_number;
use clinic_core::{ClinicError, Diagnosis, MedicalCard, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

/// 病历档案库
#[derive(Debug, Default)]
pub struct MedicalRecordStore {
    cards: RwLock<HashMap<Uuid, Arc<Mutex<MedicalCard>>>>,
    patient_cards: RwLock<HashMap<Uuid, Uuid>>, // patient_id -> card_id
}

impl MedicalRecordStore {
    /// 创建空档案库
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, card_id: Uuid) -> Result<Arc<Mutex<MedicalCard>>> {
        let cards = self
            .cards
            .read()
            .map_err(|_| ClinicError::Internal("record store lock poisoned".to_string()))?;
        cards
            .get(&card_id)
            .cloned()
            .ok_or_else(|| ClinicError::NotFound(format!("Medical card {} not found", card_id)))
    }

    fn with_card<T>(&self, card_id: Uuid, f: impl FnOnce(&mut MedicalCard) -> Result<T>) -> Result<T> {
        let handle = self.handle(card_id)?;
        let mut card = handle
            .lock()
            .map_err(|_| ClinicError::Internal("medical card lock poisoned".to_string()))?;
        f(&mut card)
    }

    /// 患者已有的病历卡
    pub fn card_for_patient(&self, patient_id: Uuid) -> Option<Uuid> {
        self.patient_cards
            .read()
            .ok()
            .and_then(|index| index.get(&patient_id).copied())
    }

    /// 获取患者的病历卡，没有则创建
    pub fn ensure_card(&self, patient_id: Uuid) -> Result<Uuid> {
        let mut index = self
            .patient_cards
            .write()
            .map_err(|_| ClinicError::Internal("record store lock poisoned".to_string()))?;
        if let Some(card_id) = index.get(&patient_id) {
            return Ok(*card_id);
        }

        let card = MedicalCard {
            id: Uuid::new_v4(),
            number: generate_card_number(),
            patient_id,
            diagnoses: Vec::new(),
            created_at: Utc::now(),
        };
        let card_id = card.id;

        let mut cards = self
            .cards
            .write()
            .map_err(|_| ClinicError::Internal("record store lock poisoned".to_string()))?;
        cards.insert(card_id, Arc::new(Mutex::new(card)));
        index.insert(patient_id, card_id);

        tracing::info!("Created medical card {} for patient {}", card_id, patient_id);
        Ok(card_id)
    }

    /// 病历卡快照
    pub fn card(&self, card_id: Uuid) -> Result<MedicalCard> {
        self.with_card(card_id, |card| Ok(card.clone()))
    }

    /// 追加诊断记录
    pub fn add_diagnosis(
        &self,
        card_id: Uuid,
        description: impl Into<String>,
        date_diagnosed: NaiveDate,
        treatment: impl Into<String>,
    ) -> Result<Diagnosis> {
        let diagnosis = Diagnosis::new(description, date_diagnosed, treatment);
        let snapshot = diagnosis.clone();
        self.with_card(card_id, move |card| {
            card.diagnoses.push(diagnosis);
            Ok(())
        })?;
        tracing::info!("Added diagnosis {} to card {}", snapshot.id, card_id);
        Ok(snapshot)
    }

    /// 更新诊断的治疗方案，活动标记保持不变
    pub fn update_treatment(
        &self,
        card_id: Uuid,
        diagnosis_id: Uuid,
        treatment: impl Into<String>,
    ) -> Result<()> {
        let treatment = treatment.into();
        self.with_card(card_id, |card| {
            let diagnosis = card
                .diagnoses
                .iter_mut()
                .find(|d| d.id == diagnosis_id)
                .ok_or_else(|| {
                    ClinicError::NotFound(format!("Diagnosis {} not found", diagnosis_id))
                })?;
            diagnosis.treatment = treatment;
            Ok(())
        })?;
        tracing::info!("Updated treatment of diagnosis {} on card {}", diagnosis_id, card_id);
        Ok(())
    }

    /// 翻转诊断的活动标记，记录本身从不删除
    pub fn set_active(&self, card_id: Uuid, diagnosis_id: Uuid, active: bool) -> Result<()> {
        self.with_card(card_id, |card| {
            let diagnosis = card
                .diagnoses
                .iter_mut()
                .find(|d| d.id == diagnosis_id)
                .ok_or_else(|| {
                    ClinicError::NotFound(format!("Diagnosis {} not found", diagnosis_id))
                })?;
            diagnosis.is_active = active;
            Ok(())
        })
    }

    /// 诊断记录，按录入顺序
    pub fn diagnoses_of(&self, card_id: Uuid) -> Result<Vec<Diagnosis>> {
        self.with_card(card_id, |card| Ok(card.diagnoses.clone()))
    }
}
