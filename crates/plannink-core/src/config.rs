//! 補貨計算參數配置

use serde::{Deserialize, Serialize};

use crate::PlanningError;

/// 模型版本標識（跟隨上游預測服務的版本字串格式）
pub const MODEL_VERSION: &str = "3.3-dynamic-v2";

/// 消耗量計算方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationMethod {
    /// 歷史平均
    HistoricalAverage,
    /// 同月歷史加權 + 趨勢因子（預設）
    WeightedSeasonal,
}

/// 產品補貨參數配置（每次計算期間不可變）
///
/// 欄位名沿用既有後端的 `CONFIGURACION.*` 介面格式。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// 安全庫存天數
    #[serde(rename = "DIAS_STOCK_SEGURIDAD")]
    pub safety_stock_days: u32,

    /// 再訂購點覆蓋天數
    #[serde(rename = "DIAS_PUNTO_REORDEN")]
    pub reorder_point_days: u32,

    /// 補貨提前期（天）
    #[serde(rename = "LEAD_TIME_REPOSICION")]
    pub lead_time_days: u32,

    /// 庫存警報天數
    #[serde(rename = "DIAS_ALARMA_STOCK")]
    pub stock_alarm_days: u32,

    /// 最大補貨覆蓋天數（覆蓋時間的上限）
    #[serde(rename = "DIAS_MAX_REPOSICION")]
    pub max_reposition_days: u32,

    /// 每月工作日數
    #[serde(rename = "DIAS_LABORALES_MES")]
    pub working_days_per_month: u32,

    /// 每月計入消耗的天數（動態月消耗的基底）
    #[serde(rename = "DIAS_CONSUMO_MENSUAL")]
    pub consumption_days_per_month: u32,

    /// 目前套用的在途天數
    #[serde(rename = "DIAS_TRANSITO")]
    pub transit_days: u32,

    /// 在途天數上限
    #[serde(rename = "DIAS_TRANSITO_MAX")]
    pub max_transit_days: u32,

    /// 預測期數（月）
    #[serde(rename = "HORIZONTE_MESES")]
    pub horizon_months: u32,

    /// 模型版本
    #[serde(rename = "VERSION_MODELO")]
    pub model_version: String,

    /// 計算方法
    #[serde(rename = "METODO_CALCULO", skip_serializing_if = "Option::is_none", default)]
    pub calculation_method: Option<CalculationMethod>,
}

impl PlanningConfig {
    /// 創建新的配置（觀測到的既有系統常數作為預設值）
    pub fn new() -> Self {
        Self {
            safety_stock_days: 19,
            reorder_point_days: 44,
            lead_time_days: 20,
            stock_alarm_days: 22,
            max_reposition_days: 22,
            working_days_per_month: 22,
            consumption_days_per_month: 20,
            transit_days: 0,
            max_transit_days: 30,
            horizon_months: 6,
            model_version: MODEL_VERSION.to_string(),
            calculation_method: None,
        }
    }

    /// 建構器模式：設置安全庫存天數
    pub fn with_safety_stock_days(mut self, days: u32) -> Self {
        self.safety_stock_days = days;
        self
    }

    /// 建構器模式：設置再訂購點天數
    pub fn with_reorder_point_days(mut self, days: u32) -> Self {
        self.reorder_point_days = days;
        self
    }

    /// 建構器模式：設置提前期
    pub fn with_lead_time_days(mut self, days: u32) -> Self {
        self.lead_time_days = days;
        self
    }

    /// 建構器模式：設置每月工作日數
    pub fn with_working_days_per_month(mut self, days: u32) -> Self {
        self.working_days_per_month = days;
        self
    }

    /// 建構器模式：設置在途天數
    pub fn with_transit_days(mut self, days: u32) -> Self {
        self.transit_days = days;
        self
    }

    /// 建構器模式：設置預測期數
    pub fn with_horizon_months(mut self, months: u32) -> Self {
        self.horizon_months = months;
        self
    }

    /// 建構器模式：設置計算方法
    pub fn with_calculation_method(mut self, method: CalculationMethod) -> Self {
        self.calculation_method = Some(method);
        self
    }

    /// 驗證配置：所有天數欄位必須為正整數（在途天數可為 0 表示未套用）
    pub fn validate(&self) -> crate::Result<()> {
        let required_positive = [
            ("DIAS_STOCK_SEGURIDAD", self.safety_stock_days),
            ("DIAS_PUNTO_REORDEN", self.reorder_point_days),
            ("LEAD_TIME_REPOSICION", self.lead_time_days),
            ("DIAS_ALARMA_STOCK", self.stock_alarm_days),
            ("DIAS_MAX_REPOSICION", self.max_reposition_days),
            ("DIAS_LABORALES_MES", self.working_days_per_month),
            ("DIAS_CONSUMO_MENSUAL", self.consumption_days_per_month),
            ("DIAS_TRANSITO_MAX", self.max_transit_days),
            ("HORIZONTE_MESES", self.horizon_months),
        ];

        for (name, value) in required_positive {
            if value == 0 {
                return Err(PlanningError::Validation(format!(
                    "{name} 必須為正整數"
                )));
            }
        }

        if self.transit_days > self.max_transit_days {
            return Err(PlanningError::Validation(format!(
                "DIAS_TRANSITO ({}) 超過上限 {}",
                self.transit_days, self.max_transit_days
            )));
        }

        Ok(())
    }
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self::new()
    }
}
