//! # Plannink API
//!
//! 資料正規化邊界與計算服務層

pub mod ingest;
pub mod service;

// Re-export 主要類型
pub use ingest::{Normalizer, RawRecord, SCHEMA_VERSION};
pub use service::PlanningService;
