//! # Plannink Core
//!
//! 核心資料模型與類型定義

pub mod calendar;
pub mod config;
pub mod history;
pub mod product;
pub mod projection;

// Re-export 主要類型
pub use calendar::WorkCalendar;
pub use config::{CalculationMethod, PlanningConfig};
pub use history::{ConsumptionHistory, MonthKey};
pub use product::Product;
pub use projection::{PlannedReceipt, Projection, RequiredAction};

/// 計算引擎錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("輸入驗證失敗: {0}")]
    Validation(String),

    #[error("除以零防護: {0}")]
    DivisionGuard(String),

    #[error("找不到產品: {0}")]
    ProductNotFound(String),

    #[error("無效的月份鍵: {0}")]
    InvalidMonthKey(String),

    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error("計算錯誤: {0}")]
    Calculation(String),
}

pub type Result<T> = std::result::Result<T, PlanningError>;
