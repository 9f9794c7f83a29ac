//! 就诊处理
//!
//! 患者到诊后解析主诉、执行查体，并按结果更新病历卡；
//! 所有校验先于任何写入，失败的就诊不会改动病历

use clinic_core::{AppointmentStatus, Capability, ClinicError, Diagnosis, Patient, Result};
use clinic_roster::{PatientRegistry, StaffDirectory};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::Reception;

/// 主诉严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintSeverity {
    Mild,
    Moderate,
    Severe,
}

/// 主诉分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub matched_keywords: Vec<String>,
    pub recurring: bool, // 主诉与既往活动诊断吻合
    pub severity: ComplaintSeverity,
}

/// 查体结论
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckupOutcome {
    pub treatment_needs_update: bool,
    pub new_treatment: Option<String>,
}

/// 接诊策略
///
/// 对相同输入必须给出相同结论
pub trait ExaminationPolicy: Send + Sync {
    /// 主诉分析，纯函数
    fn analyze(&self, complaints: &[String], prior: &[Diagnosis]) -> AnalysisResult;

    /// 查体，决定是否调整治疗方案
    fn checkup(
        &self,
        patient: &Patient,
        prior: &[Diagnosis],
        analysis: &AnalysisResult,
    ) -> CheckupOutcome;
}

/// 基于关键词的默认接诊策略
#[derive(Debug, Clone)]
pub struct KeywordExamination {
    urgent_keywords: Vec<String>,
}

impl Default for KeywordExamination {
    fn default() -> Self {
        Self {
            urgent_keywords: ["pain", "bleeding", "fever", "fracture", "short of breath"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl KeywordExamination {
    /// 主诉命中的既往活动诊断
    fn matched_active_diagnosis<'a>(
        complaints: &[String],
        prior: &'a [Diagnosis],
    ) -> Option<&'a Diagnosis> {
        prior.iter().filter(|d| d.is_active).find(|d| {
            let description = d.description.to_lowercase();
            complaints.iter().any(|c| {
                let complaint = c.to_lowercase();
                complaint.contains(&description) || description.contains(&complaint)
            })
        })
    }
}

impl ExaminationPolicy for KeywordExamination {
    fn analyze(&self, complaints: &[String], prior: &[Diagnosis]) -> AnalysisResult {
        let mut matched_keywords = Vec::new();
        for complaint in complaints {
            let lowered = complaint.to_lowercase();
            for keyword in &self.urgent_keywords {
                if lowered.contains(keyword) && !matched_keywords.contains(keyword) {
                    matched_keywords.push(keyword.clone());
                }
            }
        }

        let severity = match matched_keywords.len() {
            0 => ComplaintSeverity::Mild,
            1 => ComplaintSeverity::Moderate,
            _ => ComplaintSeverity::Severe,
        };

        AnalysisResult {
            matched_keywords,
            recurring: Self::matched_active_diagnosis(complaints, prior).is_some(),
            severity,
        }
    }

    fn checkup(
        &self,
        patient: &Patient,
        prior: &[Diagnosis],
        analysis: &AnalysisResult,
    ) -> CheckupOutcome {
        if !analysis.recurring {
            return CheckupOutcome {
                treatment_needs_update: false,
                new_treatment: None,
            };
        }

        match Self::matched_active_diagnosis(&patient.complaints, prior) {
            Some(diagnosis) => CheckupOutcome {
                treatment_needs_update: true,
                new_treatment: Some(format!(
                    "Follow-up course for {}: reinforce previous plan",
                    diagnosis.description
                )),
            },
            None => CheckupOutcome {
                treatment_needs_update: false,
                new_treatment: None,
            },
        }
    }
}

/// 就诊结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitResult {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub treatment_changed: bool,
    pub new_treatment: Option<String>,
    pub samples_collected: bool,
    pub analysis: AnalysisResult,
}

/// 就诊处理器
pub struct VisitProcessor {
    policy: Box<dyn ExaminationPolicy>,
}

impl VisitProcessor {
    /// 使用默认接诊策略
    pub fn new() -> Self {
        Self::with_policy(Box::new(KeywordExamination::default()))
    }

    /// 使用自定义接诊策略
    pub fn with_policy(policy: Box<dyn ExaminationPolicy>) -> Self {
        Self { policy }
    }

    /// 处理指定预约的就诊
    pub fn process(
        &self,
        roster: &StaffDirectory,
        registry: &PatientRegistry,
        reception: &Reception,
        appointment_id: Uuid,
    ) -> Result<VisitResult> {
        let appointment = reception.appointment(appointment_id).ok_or_else(|| {
            ClinicError::NoAppointment(format!("Appointment {} not found", appointment_id))
        })?;
        if appointment.status != AppointmentStatus::Booked {
            return Err(ClinicError::NoAppointment(format!(
                "Appointment {} is not awaiting a visit",
                appointment_id
            )));
        }

        let patient = registry.patient(appointment.patient_id)?.clone();
        let doctor = appointment
            .staff_ids
            .iter()
            .filter_map(|id| roster.worker(*id).ok())
            .find(|w| w.has_capability(Capability::Examine))
            .ok_or_else(|| {
                ClinicError::NoDoctorAssigned(format!(
                    "Appointment {} has no examining doctor",
                    appointment_id
                ))
            })?;

        let records = reception.records();
        let prior = records.diagnoses_of(appointment.card_id)?;
        let analysis = self.policy.analyze(&patient.complaints, &prior);
        let outcome = self.policy.checkup(&patient, &prior, &analysis);

        // 新诊断只能通过病历档案的录入入口建立，这里只允许更新既有诊断
        let target = if outcome.treatment_needs_update {
            let new_treatment = outcome.new_treatment.clone().ok_or_else(|| {
                ClinicError::Internal(
                    "examination policy requested an update without a treatment".to_string(),
                )
            })?;
            let diagnosis_id = prior
                .iter()
                .rev()
                .find(|d| d.is_active)
                .or_else(|| prior.last())
                .map(|d| d.id)
                .ok_or_else(|| {
                    ClinicError::NoDiagnosis(format!(
                        "Card {} has no diagnosis to update",
                        appointment.card_id
                    ))
                })?;
            Some((diagnosis_id, new_treatment))
        } else {
            None
        };

        // 校验全部通过后才占据就诊状态
        match reception.begin_visit(appointment_id) {
            Ok(_) => {}
            Err(ClinicError::InvalidStateTransition { .. }) => {
                return Err(ClinicError::NoAppointment(format!(
                    "Appointment {} is not awaiting a visit",
                    appointment_id
                )));
            }
            Err(other) => return Err(other),
        }

        if let Some((diagnosis_id, ref new_treatment)) = target {
            records.update_treatment(appointment.card_id, diagnosis_id, new_treatment.clone())?;
        }

        let samples_collected = appointment
            .staff_ids
            .iter()
            .filter_map(|id| roster.worker(*id).ok())
            .any(|w| w.has_capability(Capability::Assist));
        if samples_collected {
            tracing::info!("Samples collected for patient {}", patient.id);
        }

        reception.conclude_visit(appointment_id)?;

        tracing::info!(
            "Visit completed for appointment {} (treatment changed: {})",
            appointment_id,
            target.is_some()
        );
        Ok(VisitResult {
            appointment_id,
            patient_id: patient.id,
            doctor_id: doctor.id,
            treatment_changed: target.is_some(),
            new_treatment: target.map(|(_, treatment)| treatment),
            samples_collected,
            analysis,
        })
    }

    /// 患者到诊，处理其最近一个待就诊预约
    pub fn process_arrival(
        &self,
        roster: &StaffDirectory,
        registry: &PatientRegistry,
        reception: &Reception,
        patient_id: Uuid,
    ) -> Result<VisitResult> {
        let appointments = reception.appointments_of(patient_id);
        let appointment = appointments
            .iter()
            .find(|a| a.status == AppointmentStatus::Booked)
            .ok_or_else(|| {
                ClinicError::NoAppointment(format!("Patient {} has no appointments", patient_id))
            })?;
        self.process(roster, registry, reception, appointment.id)
    }
}

impl Default for VisitProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::DepartmentRouter;
    use chrono::{NaiveDate, NaiveTime};
    use clinic_core::{Department, Hospital, MedicalWorker, StaffRole, TimeInterval};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(d: u32, h1: u32, m1: u32, h2: u32, m2: u32) -> TimeInterval {
        TimeInterval::single(date(d), time(h1, m1), time(h2, m2)).unwrap()
    }

    struct Fixture {
        roster: StaffDirectory,
        registry: PatientRegistry,
        reception: Reception,
        doctor_id: Uuid,
        nurse_id: Uuid,
        patient_id: Uuid,
    }

    /// 心内科一名医生一名护士，患者主诉先命不中再命中路由表
    fn fixture() -> Fixture {
        let mut roster = StaffDirectory::new();
        let hospital_id = roster.add_hospital(Hospital::new("市立医院", "人民路1号"));
        let cardiology = roster
            .add_department(hospital_id, Department::new("Cardiology"))
            .unwrap();

        let reception = Reception::new("010-12345678", DepartmentRouter::default_table());

        let doctor_id = roster.add_worker(MedicalWorker::new(
            "张医生",
            StaffRole::Doctor {
                specialization: "Cardiology".to_string(),
            },
        ));
        roster.assign(cardiology, doctor_id).unwrap();
        reception
            .availability()
            .add_open_interval(doctor_id, slot(1, 9, 0, 17, 0))
            .unwrap();

        let nurse_id = roster.add_worker(MedicalWorker::new(
            "王护士",
            StaffRole::Nurse {
                qualification: "RN".to_string(),
            },
        ));
        roster.assign(cardiology, nurse_id).unwrap();
        reception
            .availability()
            .add_open_interval(nurse_id, slot(1, 9, 0, 17, 0))
            .unwrap();

        let mut registry = PatientRegistry::new();
        let patient = registry.register("王先生", NaiveDate::from_ymd_opt(1980, 5, 20).unwrap());
        registry
            .set_complaints(
                patient.id,
                vec!["angina flare".to_string(), "chest pain".to_string()],
            )
            .unwrap();

        Fixture {
            roster,
            registry,
            reception,
            doctor_id,
            nurse_id,
            patient_id: patient.id,
        }
    }

    /// 永远要求更新治疗方案的桩策略
    struct AlwaysUpdate;

    impl ExaminationPolicy for AlwaysUpdate {
        fn analyze(&self, _complaints: &[String], _prior: &[Diagnosis]) -> AnalysisResult {
            AnalysisResult {
                matched_keywords: Vec::new(),
                recurring: true,
                severity: ComplaintSeverity::Moderate,
            }
        }

        fn checkup(
            &self,
            _patient: &Patient,
            _prior: &[Diagnosis],
            _analysis: &AnalysisResult,
        ) -> CheckupOutcome {
            CheckupOutcome {
                treatment_needs_update: true,
                new_treatment: Some("Revised plan".to_string()),
            }
        }
    }

    #[test]
    fn test_no_appointment_fails_without_touching_card() {
        let f = fixture();
        let processor = VisitProcessor::new();

        let result = processor.process_arrival(&f.roster, &f.registry, &f.reception, f.patient_id);
        assert!(matches!(result, Err(ClinicError::NoAppointment(_))));
        // 没有预约时也不会懒创建病历卡
        assert!(f.reception.records().card_for_patient(f.patient_id).is_none());
    }

    #[test]
    fn test_nurse_only_appointment_has_no_doctor() {
        let f = fixture();
        // 医生整天排满，预约落到护士头上
        f.reception
            .availability()
            .reserve(f.doctor_id, &slot(1, 9, 0, 17, 0), Uuid::new_v4())
            .unwrap();
        let appointment = f
            .reception
            .schedule(&f.roster, &f.registry, f.patient_id, slot(1, 10, 0, 10, 30))
            .unwrap();
        assert_eq!(appointment.staff_ids, vec![f.nurse_id]);

        let processor = VisitProcessor::new();
        let result = processor.process(&f.roster, &f.registry, &f.reception, appointment.id);
        assert!(matches!(result, Err(ClinicError::NoDoctorAssigned(_))));

        // 失败的就诊不改动预约状态
        let stored = f.reception.appointment(appointment.id).unwrap();
        assert_eq!(stored.status, AppointmentStatus::Booked);
    }

    #[test]
    fn test_recurring_complaint_updates_treatment() {
        let f = fixture();
        let appointment = f
            .reception
            .schedule(&f.roster, &f.registry, f.patient_id, slot(1, 10, 0, 10, 30))
            .unwrap();
        f.reception
            .records()
            .add_diagnosis(appointment.card_id, "Angina", date(1), "Nitroglycerin as needed")
            .unwrap();

        let processor = VisitProcessor::new();
        let result = processor
            .process(&f.roster, &f.registry, &f.reception, appointment.id)
            .unwrap();

        assert!(result.treatment_changed);
        assert_eq!(result.doctor_id, f.doctor_id);
        let diagnoses = f.reception.records().diagnoses_of(appointment.card_id).unwrap();
        assert_eq!(
            diagnoses[0].treatment,
            "Follow-up course for Angina: reinforce previous plan"
        );
        // 活动标记保持不变
        assert!(diagnoses[0].is_active);

        let stored = f.reception.appointment(appointment.id).unwrap();
        assert_eq!(stored.status, AppointmentStatus::Completed);
    }

    #[test]
    fn test_no_change_leaves_diagnoses_untouched() {
        let f = fixture();
        let appointment = f
            .reception
            .schedule(&f.roster, &f.registry, f.patient_id, slot(1, 10, 0, 10, 30))
            .unwrap();
        f.reception
            .records()
            .add_diagnosis(appointment.card_id, "Hypertension", date(1), "Daily monitoring")
            .unwrap();
        let before = f.reception.records().diagnoses_of(appointment.card_id).unwrap();

        // 主诉与既往诊断无关
        let mut registry = f.registry;
        registry
            .set_complaints(f.patient_id, vec!["chest pain".to_string()])
            .unwrap();

        let processor = VisitProcessor::new();
        let result = processor
            .process(&f.roster, &registry, &f.reception, appointment.id)
            .unwrap();

        assert!(!result.treatment_changed);
        let after = f.reception.records().diagnoses_of(appointment.card_id).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_update_without_diagnosis_is_no_diagnosis() {
        let f = fixture();
        let appointment = f
            .reception
            .schedule(&f.roster, &f.registry, f.patient_id, slot(1, 10, 0, 10, 30))
            .unwrap();

        let processor = VisitProcessor::with_policy(Box::new(AlwaysUpdate));
        let result = processor.process(&f.roster, &f.registry, &f.reception, appointment.id);
        assert!(matches!(result, Err(ClinicError::NoDiagnosis(_))));

        // 失败时病历与预约均保持原状
        assert!(f
            .reception
            .records()
            .diagnoses_of(appointment.card_id)
            .unwrap()
            .is_empty());
        let stored = f.reception.appointment(appointment.id).unwrap();
        assert_eq!(stored.status, AppointmentStatus::Booked);
    }

    #[test]
    fn test_completed_visit_cannot_repeat() {
        let f = fixture();
        let appointment = f
            .reception
            .schedule(&f.roster, &f.registry, f.patient_id, slot(1, 10, 0, 10, 30))
            .unwrap();

        let processor = VisitProcessor::new();
        processor
            .process(&f.roster, &f.registry, &f.reception, appointment.id)
            .unwrap();
        let again = processor.process(&f.roster, &f.registry, &f.reception, appointment.id);
        assert!(matches!(again, Err(ClinicError::NoAppointment(_))));
    }

    #[test]
    fn test_assistant_marks_samples_collected() {
        let f = fixture();
        let appointment = f
            .reception
            .schedule(&f.roster, &f.registry, f.patient_id, slot(1, 10, 0, 10, 30))
            .unwrap();
        f.reception
            .add_assistant(&f.roster, appointment.id, f.nurse_id)
            .unwrap();

        let processor = VisitProcessor::new();
        let result = processor
            .process(&f.roster, &f.registry, &f.reception, appointment.id)
            .unwrap();
        assert!(result.samples_collected);
    }
}
