pub mod dto;
pub mod services;

pub use dto::{HistoryEntry, HistoryRecord, Pagination};
pub use services::HistoryService;
