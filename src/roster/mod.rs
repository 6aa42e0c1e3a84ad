//! Student records and the operations on them

pub mod service;
pub mod student;

pub use service::RosterService;
pub use student::{Student, StudentFields, StudentForm};
