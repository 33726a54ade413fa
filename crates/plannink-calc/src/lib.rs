//! # Plannink Calculation Engine
//!
//! 庫存預測與補貨參數計算引擎

pub mod order;
pub mod projection;
pub mod reorder;
pub mod stats;
pub mod transit;
pub mod weekly;

// Re-export 主要類型
pub use order::OrderResolver;
pub use projection::ProjectionGenerator;
pub use reorder::{ReorderCalculator, ReorderParams, StockStatus};
pub use transit::TransitAdjuster;
pub use weekly::{derive_weekly_from_monthly, WeeklyPoint};

/// 批次計算結果
#[derive(Debug, Clone)]
pub struct CalcOutcome {
    /// 計算完成的產品
    pub products: Vec<plannink_core::Product>,

    /// 資料品質警告（不中斷計算）
    pub warnings: Vec<IntegrityWarning>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl CalcOutcome {
    /// 創建空的計算結果
    pub fn empty() -> Self {
        Self {
            products: Vec::new(),
            warnings: Vec::new(),
            calculation_time_ms: None,
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: IntegrityWarning) {
        self.warnings.push(warning);
    }
}

/// 資料完整性警告
///
/// 第三方來源欄位的品質問題以警告回報並以安全預設值繼續，
/// 絕不拋出錯誤中斷計算。
#[derive(Debug, Clone)]
pub struct IntegrityWarning {
    pub product_code: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl IntegrityWarning {
    pub fn new(product_code: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            product_code,
            message,
            severity,
        }
    }

    pub fn info(product_code: String, message: String) -> Self {
        Self::new(product_code, message, WarningSeverity::Info)
    }

    pub fn warning(product_code: String, message: String) -> Self {
        Self::new(product_code, message, WarningSeverity::Warning)
    }

    pub fn error(product_code: String, message: String) -> Self {
        Self::new(product_code, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}
