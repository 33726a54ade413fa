//! # Plannink
//!
//! 庫存預測與補貨參數計算引擎：由產品的歷史消耗、目前庫存與
//! 配置產生月度預測序列，並支援在途單位數 / 在途天數兩種調整。

// Re-export 主要類型
pub use plannink_api::{Normalizer, PlanningService, RawRecord, SCHEMA_VERSION};
pub use plannink_calc::{
    derive_weekly_from_monthly, stats, CalcOutcome, IntegrityWarning, OrderResolver,
    ProjectionGenerator, ReorderCalculator, ReorderParams, StockStatus, TransitAdjuster,
    WarningSeverity, WeeklyPoint,
};
pub use plannink_core::{
    CalculationMethod, ConsumptionHistory, MonthKey, PlannedReceipt, PlanningConfig,
    PlanningError, Product, Projection, RequiredAction, Result, WorkCalendar,
};
