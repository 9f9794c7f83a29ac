//! 出诊时段索引
//!
//! 维护每位医护人员的开放出诊时段与已预约时段，回答"某时段是否可约"
//! 并在同一把人员级锁内完成检查与占用

use clinic_core::{ClinicError, Result, ScheduleEntry, SlotKind, TimeInterval};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use uuid::Uuid;

/// 已预约时段
#[derive(Debug, Clone)]
struct ReservedSlot {
    interval: TimeInterval,
    appointment_id: Uuid,
}

/// 单个医护人员的排班表
///
/// 开放时段与已预约时段是两个独立集合，占用不会覆盖出诊安排
#[derive(Debug, Default)]
struct WorkerSchedule {
    open: Vec<TimeInterval>,
    reserved: Vec<ReservedSlot>,
}

impl WorkerSchedule {
    fn within_open(&self, interval: &TimeInterval) -> bool {
        self.open.iter().any(|block| block.contains(interval))
    }

    fn conflicts(&self, interval: &TimeInterval) -> bool {
        self.reserved.iter().any(|slot| slot.interval.overlaps(interval))
    }
}

/// 出诊时段索引
///
/// 外层读写锁只负责定位人员排班表，检查与修改都在人员级互斥锁内进行，
/// 并发预约同一时段时只有一个请求成功
#[derive(Debug, Default)]
pub struct AvailabilityIndex {
    schedules: RwLock<HashMap<Uuid, Arc<Mutex<WorkerSchedule>>>>,
}

impl AvailabilityIndex {
    /// 创建空索引
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, worker_id: Uuid) -> Result<Arc<Mutex<WorkerSchedule>>> {
        let schedules = self
            .schedules
            .read()
            .map_err(|_| ClinicError::Internal("availability index lock poisoned".to_string()))?;
        schedules
            .get(&worker_id)
            .cloned()
            .ok_or_else(|| ClinicError::NotFound(format!("Worker {} has no schedule", worker_id)))
    }

    fn ensure_handle(&self, worker_id: Uuid) -> Result<Arc<Mutex<WorkerSchedule>>> {
        let mut schedules = self
            .schedules
            .write()
            .map_err(|_| ClinicError::Internal("availability index lock poisoned".to_string()))?;
        Ok(schedules.entry(worker_id).or_default().clone())
    }

    fn lock(handle: &Arc<Mutex<WorkerSchedule>>) -> Result<MutexGuard<'_, WorkerSchedule>> {
        handle
            .lock()
            .map_err(|_| ClinicError::Internal("worker schedule lock poisoned".to_string()))
    }

    /// 为人员新增开放出诊时段
    pub fn add_open_interval(&self, worker_id: Uuid, interval: TimeInterval) -> Result<()> {
        let handle = self.ensure_handle(worker_id)?;
        let mut schedule = Self::lock(&handle)?;
        schedule.open.push(interval);
        tracing::info!("Added open interval for worker {}", worker_id);
        Ok(())
    }

    /// 删除人员的开放出诊时段
    pub fn remove_open_interval(&self, worker_id: Uuid, interval: &TimeInterval) -> Result<()> {
        let handle = self.handle(worker_id)?;
        let mut schedule = Self::lock(&handle)?;
        let before = schedule.open.len();
        schedule.open.retain(|block| block != interval);
        if schedule.open.len() == before {
            return Err(ClinicError::NotFound(format!(
                "Open interval not found for worker {}",
                worker_id
            )));
        }
        tracing::info!("Removed open interval for worker {}", worker_id);
        Ok(())
    }

    /// 人员在请求时段是否可约
    ///
    /// 请求时段须完整落在某个开放时段内，且不与任何已预约时段相交
    pub fn is_available(&self, worker_id: Uuid, interval: &TimeInterval) -> bool {
        let handle = match self.handle(worker_id) {
            Ok(handle) => handle,
            Err(_) => return false,
        };
        let available = match Self::lock(&handle) {
            Ok(schedule) => schedule.within_open(interval) && !schedule.conflicts(interval),
            Err(_) => false,
        };
        available
    }

    /// 占用时段
    ///
    /// 检查与插入在同一把人员级锁内完成：不在开放时段内返回
    /// `NoAvailability`，与已有预约相交返回 `Conflict`
    pub fn reserve(
        &self,
        worker_id: Uuid,
        interval: &TimeInterval,
        appointment_id: Uuid,
    ) -> Result<()> {
        let handle = self.handle(worker_id)?;
        let mut schedule = Self::lock(&handle)?;

        if !schedule.within_open(interval) {
            return Err(ClinicError::NoAvailability(format!(
                "Worker {} is not on duty in the requested interval",
                worker_id
            )));
        }
        if schedule.conflicts(interval) {
            return Err(ClinicError::Conflict(format!(
                "Worker {} already has a reservation overlapping the requested interval",
                worker_id
            )));
        }

        schedule.reserved.push(ReservedSlot {
            interval: *interval,
            appointment_id,
        });
        tracing::info!(
            "Reserved interval for worker {} (appointment {})",
            worker_id,
            appointment_id
        );
        Ok(())
    }

    /// 释放已预约时段
    pub fn release(&self, worker_id: Uuid, interval: &TimeInterval) -> Result<()> {
        let handle = self.handle(worker_id)?;
        let mut schedule = Self::lock(&handle)?;
        let position = schedule
            .reserved
            .iter()
            .position(|slot| slot.interval == *interval)
            .ok_or_else(|| {
                ClinicError::NotFound(format!("Reservation not found for worker {}", worker_id))
            })?;
        let slot = schedule.reserved.remove(position);
        tracing::info!(
            "Released interval for worker {} (appointment {})",
            worker_id,
            slot.appointment_id
        );
        Ok(())
    }

    /// 人员的全部排班条目，按起始日期与时间排序
    pub fn schedules_for(&self, worker_id: Uuid) -> Vec<ScheduleEntry> {
        let handle = match self.handle(worker_id) {
            Ok(handle) => handle,
            Err(_) => return Vec::new(),
        };
        let schedule = match Self::lock(&handle) {
            Ok(schedule) => schedule,
            Err(_) => return Vec::new(),
        };

        let mut entries: Vec<ScheduleEntry> = schedule
            .open
            .iter()
            .map(|interval| ScheduleEntry {
                interval: *interval,
                kind: SlotKind::Open,
                appointment_id: None,
            })
            .chain(schedule.reserved.iter().map(|slot| ScheduleEntry {
                interval: slot.interval,
                kind: SlotKind::Reserved,
                appointment_id: Some(slot.appointment_id),
            }))
            .collect();
        entries.sort_by_key(|entry| (entry.interval.start_date, entry.interval.start_time));
        entries
    }
}
