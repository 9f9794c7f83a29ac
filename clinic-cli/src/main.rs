//! 前台接诊命令行程序

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use clap::Parser;
use clinic_core::{
    ClinicError, Department, Hospital, MedicalWorker, Result, StaffRole, TimeInterval,
};
use clinic_roster::{PatientRegistry, StaffDirectory};
use clinic_workflow::{FrontDeskConfig, Reception, VisitProcessor};
use tracing::info;

/// 前台接诊命令行参数
#[derive(Parser, Debug)]
#[command(name = "clinic-frontdesk")]
#[command(about = "医院前台接诊系统：分诊、预约与就诊处理")]
struct Args {
    /// 患者姓名
    #[arg(short, long, default_value = "walk-in patient")]
    name: String,

    /// 患者出生日期 (YYYY-MM-DD)
    #[arg(long, default_value = "1980-01-01")]
    birth_date: String,

    /// 患者主诉，可多次指定
    #[arg(short, long = "complaint", default_values_t = vec!["chest pain".to_string()])]
    complaints: Vec<String>,

    /// 就诊日期 (YYYY-MM-DD)，默认今天
    #[arg(short, long)]
    date: Option<String>,

    /// 就诊开始时间 (HH:MM)
    #[arg(short, long, default_value = "10:00")]
    time: String,

    /// 就诊时长（分钟）
    #[arg(long, default_value = "30")]
    duration_minutes: i64,

    /// 配置文件路径
    #[arg(long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ClinicError::Validation(format!("日期格式无效: {}", e)))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(args.log_level.as_str())
        .init();

    info!("启动前台接诊系统...");

    let config = FrontDeskConfig::load(args.config.as_deref())
        .map_err(|e| ClinicError::Config(e.to_string()))?;

    info!("前台配置:");
    info!("  接待电话: {}", config.reception.phone_number);
    info!("  候选扫描上限: {}", config.reception.max_candidates);
    info!("  分诊规则数: {}", config.routing.rules.len());

    let visit_date = match &args.date {
        Some(date) => parse_date(date)?,
        None => Utc::now().date_naive(),
    };
    let start_time = NaiveTime::parse_from_str(&args.time, "%H:%M")
        .map_err(|e| ClinicError::Validation(format!("时间格式无效: {}", e)))?;
    let (end_time, wrapped) =
        start_time.overflowing_add_signed(Duration::minutes(args.duration_minutes));
    if wrapped != 0 {
        return Err(ClinicError::Validation("就诊时段不能跨越午夜".to_string()));
    }
    let requested = TimeInterval::single(visit_date, start_time, end_time)?;

    let reception = Reception::from_config(&config);
    let roster = seed_roster(&reception, &config, visit_date)?;

    let mut registry = PatientRegistry::new();
    let patient = registry.register(args.name.clone(), parse_date(&args.birth_date)?);
    registry.set_complaints(patient.id, args.complaints.clone())?;
    info!("患者 {} 登记完成，主诉: {}", patient.name, args.complaints.join(", "));

    let appointment = reception.schedule(&roster, &registry, patient.id, requested)?;
    let department = roster.department(appointment.department_id)?;
    let worker = roster.worker(appointment.staff_ids[0])?;
    let card = reception.records().card(appointment.card_id)?;

    info!("预约成功: {}", appointment.id);
    info!("  科室: {}", department.name);
    info!("  接诊人员: {} ({})", worker.name, worker.role_title());
    info!("  病历卡号: {}", card.number);

    let processor = VisitProcessor::new();
    let result = processor.process_arrival(&roster, &registry, &reception, patient.id)?;
    info!("就诊完成，治疗方案更新: {}", result.treatment_changed);
    if let Some(treatment) = &result.new_treatment {
        info!("  新治疗方案: {}", treatment);
    }

    let stats = reception.stats();
    info!(
        "接待处统计: 待诊 {} / 就诊中 {} / 已完成 {} / 已取消 {}",
        stats.booked, stats.in_progress, stats.completed, stats.cancelled
    );

    Ok(())
}

/// 按分诊表搭建示例花名册
///
/// 每个科室一名值班医生，首个科室另配一名护士
fn seed_roster(
    reception: &Reception,
    config: &FrontDeskConfig,
    visit_date: NaiveDate,
) -> Result<StaffDirectory> {
    let mut roster = StaffDirectory::new();
    let hospital_id = roster.add_hospital(Hospital::new("市立第一医院", "人民路1号"));

    let open_start = NaiveTime::from_hms_opt(8, 0, 0)
        .ok_or_else(|| ClinicError::Internal("invalid seed time".to_string()))?;
    let open_end = NaiveTime::from_hms_opt(18, 0, 0)
        .ok_or_else(|| ClinicError::Internal("invalid seed time".to_string()))?;
    let open_hours = TimeInterval::single(visit_date, open_start, open_end)?;

    let mut seen: Vec<String> = Vec::new();
    for rule in &config.routing.rules {
        if seen.contains(&rule.department) {
            continue;
        }
        seen.push(rule.department.clone());

        let department_id =
            roster.add_department(hospital_id, Department::new(rule.department.clone()))?;
        let doctor_id = roster.add_worker(MedicalWorker::new(
            format!("{} duty doctor", rule.department),
            StaffRole::Doctor {
                specialization: rule.department.clone(),
            },
        ));
        roster.assign(department_id, doctor_id)?;
        reception
            .availability()
            .add_open_interval(doctor_id, open_hours)?;

        if seen.len() == 1 {
            let nurse_id = roster.add_worker(MedicalWorker::new(
                format!("{} duty nurse", rule.department),
                StaffRole::Nurse {
                    qualification: "RN".to_string(),
                },
            ));
            roster.assign(department_id, nurse_id)?;
            reception
                .availability()
                .add_open_interval(nurse_id, open_hours)?;
        }
    }

    info!("花名册就绪，共 {} 个科室", seen.len());
    Ok(roster)
}
