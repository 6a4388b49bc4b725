pub mod dashboard;
pub mod health_check;
pub mod simulate;
pub mod summary;
