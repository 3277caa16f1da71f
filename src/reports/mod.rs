pub mod aggregate;
pub mod range;
pub mod service;

pub use range::{DateRange, RangeError};
pub use service::ReportService;
