//! # 花名册模块
//!
//! 医院、科室、医护人员与患者的登记管理，作为前台工作流的查询协作方。

pub mod directory;
pub mod patients;

pub use directory::StaffDirectory;
pub use patients::PatientRegistry;
