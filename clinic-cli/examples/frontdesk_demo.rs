//! 前台接诊流程演示程序
//!
//! 展示分诊路由、预约登记、时段冲突、取消回滚与就诊处理的完整流程

use chrono::{NaiveDate, NaiveTime};
use clinic_core::{Department, Hospital, MedicalWorker, SlotKind, StaffRole, TimeInterval};
use clinic_roster::{PatientRegistry, StaffDirectory};
use clinic_workflow::{DepartmentRouter, Reception, VisitProcessor};

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    println!("🏥 医院前台接诊演示\n");

    // 1. 搭建花名册
    let mut roster = StaffDirectory::new();
    let hospital_id = roster.add_hospital(Hospital::new("市立第一医院", "人民路1号"));
    let cardiology = roster.add_department(hospital_id, Department::new("Cardiology"))?;
    let neurology = roster.add_department(hospital_id, Department::new("Neurology"))?;

    let zhang = roster.add_worker(MedicalWorker::new(
        "张医生",
        StaffRole::Doctor {
            specialization: "Cardiology".to_string(),
        },
    ));
    let li = roster.add_worker(MedicalWorker::new(
        "李医生",
        StaffRole::Doctor {
            specialization: "Neurology".to_string(),
        },
    ));
    let wang = roster.add_worker(MedicalWorker::new(
        "王护士",
        StaffRole::Nurse {
            qualification: "RN".to_string(),
        },
    ));
    roster.assign(cardiology, zhang)?;
    roster.assign(neurology, li)?;
    roster.assign(cardiology, wang)?;
    println!("✅ 花名册就绪: 2 个科室, 3 名医护人员");

    // 2. 创建接待处并排班
    let reception = Reception::new("010-12345678", DepartmentRouter::default_table());
    let on_duty = TimeInterval::new(date(3), date(7), time(9, 0), time(17, 0))?;
    reception.availability().add_open_interval(zhang, on_duty)?;
    reception.availability().add_open_interval(li, on_duty)?;
    reception.availability().add_open_interval(wang, on_duty)?;
    println!("✅ 排班完成: 6月3日至6月7日 9:00-17:00");

    // 3. 登记患者
    let mut registry = PatientRegistry::new();
    let chest_patient = registry.register("刘先生", NaiveDate::from_ymd_opt(1975, 3, 14).unwrap());
    registry.set_complaints(chest_patient.id, vec!["chest pain".to_string()])?;
    let headache_patient = registry.register("陈女士", NaiveDate::from_ymd_opt(1988, 11, 2).unwrap());
    registry.set_complaints(headache_patient.id, vec!["headache".to_string()])?;
    println!("✅ 登记了 2 名患者");

    // 4. 预约登记
    let morning = TimeInterval::single(date(4), time(10, 0), time(10, 30))?;
    let appointment = reception.schedule(&roster, &registry, chest_patient.id, morning)?;
    println!(
        "\n📋 {} 预约成功 -> {} ({:?})",
        chest_patient.name,
        roster.department(appointment.department_id)?.name,
        appointment.interval.start_time
    );

    let neuro_appointment =
        reception.schedule(&roster, &registry, headache_patient.id, morning)?;
    println!(
        "📋 {} 预约成功 -> {}",
        headache_patient.name,
        roster.department(neuro_appointment.department_id)?.name
    );

    // 5. 同一时段的第二次心内科预约会落到护士，第三次则失败
    let second = reception.schedule(&roster, &registry, chest_patient.id, morning)?;
    println!(
        "📋 同时段再约心内科 -> {} ({})",
        roster.worker(second.staff_ids[0])?.name,
        roster.worker(second.staff_ids[0])?.role_title()
    );
    match reception.schedule(&roster, &registry, chest_patient.id, morning) {
        Err(err) => println!("🚫 第三次同时段预约被拒绝: {}", err),
        Ok(_) => println!("⚠️  不应出现的第三次成功"),
    }

    // 6. 取消并验证时段回滚
    reception.cancel(second.id, chest_patient.id)?;
    let retry = reception.schedule(&roster, &registry, chest_patient.id, morning)?;
    println!("🔄 取消后重新预约成功 -> {}", roster.worker(retry.staff_ids[0])?.name);
    reception.cancel(retry.id, chest_patient.id)?;

    // 7. 病历与就诊
    reception.records().add_diagnosis(
        appointment.card_id,
        "Angina",
        date(1),
        "Nitroglycerin as needed",
    )?;
    registry.set_complaints(
        chest_patient.id,
        vec!["angina flare".to_string(), "chest pain".to_string()],
    )?;

    let processor = VisitProcessor::new();
    let visit = processor.process_arrival(&roster, &registry, &reception, chest_patient.id)?;
    println!("\n🩺 {} 就诊完成:", chest_patient.name);
    println!("   接诊医生: {}", roster.worker(visit.doctor_id)?.name);
    println!("   治疗方案更新: {}", visit.treatment_changed);
    if let Some(treatment) = &visit.new_treatment {
        println!("   新方案: {}", treatment);
    }

    // 8. 查看医生排班表
    println!("\n📅 张医生的排班:");
    for entry in reception.availability().schedules_for(zhang) {
        let kind = match entry.kind {
            SlotKind::Open => "开放",
            SlotKind::Reserved => "已约",
        };
        println!(
            "   [{}] {} {} - {}",
            kind, entry.interval.start_date, entry.interval.start_time, entry.interval.end_time
        );
    }

    // 9. 统计
    let stats = reception.stats();
    println!(
        "\n📊 接待处统计: 待诊 {} / 已完成 {} / 已取消 {}",
        stats.booked, stats.completed, stats.cancelled
    );

    println!("\n🎉 前台接诊演示完成!");
    Ok(())
}
