//! 產品（庫存管理單位）模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PlanningConfig;
use crate::history::ConsumptionHistory;
use crate::projection::{fecha_opcional, Projection};

/// 產品主檔與其衍生補貨參數
///
/// 頂層欄位沿用既有預測服務的大寫西班牙語鍵，供介接方 bit-exact 互通。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// 產品代碼（唯一）
    #[serde(rename = "CODIGO")]
    pub code: String,

    /// 產品描述
    #[serde(rename = "DESCRIPCION")]
    pub description: String,

    /// 規劃期起始日期
    #[serde(rename = "FECHA_INICIO")]
    pub start_date: NaiveDate,

    /// 每箱單位數
    #[serde(rename = "UNIDADES_POR_CAJA")]
    pub units_per_box: Decimal,

    /// 實體庫存
    #[serde(rename = "STOCK_FISICO")]
    pub physical_stock: Decimal,

    /// 可用在途單位數
    #[serde(rename = "UNIDADES_TRANSITO_DISPONIBLES")]
    pub units_in_transit: Decimal,

    /// 總庫存（= 實體 + 在途，恆成立）
    #[serde(rename = "STOCK_TOTAL")]
    pub total_stock: Decimal,

    /// 平均月消耗
    #[serde(rename = "CONSUMO_PROMEDIO")]
    pub average_consumption: Decimal,

    /// 額外預計月消耗（上游投影欄位）
    #[serde(rename = "CONSUMO_PROYECTADO")]
    pub projected_consumption: Decimal,

    /// 合計月消耗（平均 + 預計）
    #[serde(rename = "CONSUMO_TOTAL")]
    pub total_consumption: Decimal,

    /// 日消耗
    #[serde(rename = "CONSUMO_DIARIO")]
    pub daily_consumption: Decimal,

    /// 安全庫存
    #[serde(rename = "STOCK_SEGURIDAD")]
    pub safety_stock: Decimal,

    /// 最小庫存（= 合計月消耗 + 安全庫存）
    #[serde(rename = "STOCK_MINIMO")]
    pub minimum_stock: Decimal,

    /// 再訂購點
    #[serde(rename = "PUNTO_REORDEN")]
    pub reorder_point: Decimal,

    /// 目前缺口
    #[serde(rename = "DEFICIT")]
    pub deficit: Decimal,

    /// 建議訂購箱數
    #[serde(rename = "CAJAS_A_PEDIR")]
    pub boxes_to_order: u32,

    /// 建議訂購單位數
    #[serde(rename = "UNIDADES_A_PEDIR")]
    pub units_to_order: Decimal,

    /// 預計補貨日期
    #[serde(rename = "FECHA_REPOSICION", with = "fecha_opcional")]
    pub reposition_date: Option<NaiveDate>,

    /// 覆蓋天數
    #[serde(rename = "DIAS_COBERTURA")]
    pub days_of_coverage: Decimal,

    /// 補貨頻率（天）
    #[serde(rename = "FRECUENCIA_REPOSICION")]
    pub reposition_frequency: Decimal,

    /// 在途期間預計消耗（套用在途天數時燒掉的量）
    #[serde(rename = "CONSUMO_PROYECTADO_ARRIBO")]
    pub transit_consumption: Decimal,

    /// 月度歷史消耗
    #[serde(rename = "HISTORICO_CONSUMOS")]
    pub history: ConsumptionHistory,

    /// 預測序列（索引 0 為最近一期）
    #[serde(rename = "PROYECCIONES")]
    pub projections: Vec<Projection>,

    /// 計算配置
    #[serde(rename = "CONFIGURACION")]
    pub config: PlanningConfig,
}

impl Product {
    /// 創建新的產品記錄
    pub fn new(code: String, description: String, start_date: NaiveDate) -> Self {
        Self {
            code,
            description,
            start_date,
            units_per_box: Decimal::ONE,
            physical_stock: Decimal::ZERO,
            units_in_transit: Decimal::ZERO,
            total_stock: Decimal::ZERO,
            average_consumption: Decimal::ZERO,
            projected_consumption: Decimal::ZERO,
            total_consumption: Decimal::ZERO,
            daily_consumption: Decimal::ZERO,
            safety_stock: Decimal::ZERO,
            minimum_stock: Decimal::ZERO,
            reorder_point: Decimal::ZERO,
            deficit: Decimal::ZERO,
            boxes_to_order: 0,
            units_to_order: Decimal::ZERO,
            reposition_date: None,
            days_of_coverage: Decimal::ZERO,
            reposition_frequency: Decimal::ZERO,
            transit_consumption: Decimal::ZERO,
            history: ConsumptionHistory::new(),
            projections: Vec::new(),
            config: PlanningConfig::default(),
        }
    }

    /// 建構器模式：設置實體庫存
    pub fn with_physical_stock(mut self, stock: Decimal) -> Self {
        self.physical_stock = stock;
        self.recompute_total_stock();
        self
    }

    /// 建構器模式：設置在途單位數
    pub fn with_units_in_transit(mut self, units: Decimal) -> Self {
        self.units_in_transit = units;
        self.recompute_total_stock();
        self
    }

    /// 建構器模式：設置每箱單位數
    pub fn with_units_per_box(mut self, units: Decimal) -> Self {
        // 上游以 1 取代 0，避免後續除以零
        self.units_per_box = if units <= Decimal::ZERO {
            Decimal::ONE
        } else {
            units
        };
        self
    }

    /// 建構器模式：設置歷史消耗
    pub fn with_history(mut self, history: ConsumptionHistory) -> Self {
        self.history = history;
        self
    }

    /// 建構器模式：設置配置
    pub fn with_config(mut self, config: PlanningConfig) -> Self {
        self.config = config;
        self
    }

    /// 建構器模式：設置額外預計月消耗
    pub fn with_projected_consumption(mut self, qty: Decimal) -> Self {
        self.projected_consumption = qty;
        self
    }

    /// 維持不變量：總庫存 = 實體庫存 + 在途單位數
    pub fn recompute_total_stock(&mut self) {
        self.total_stock = self.physical_stock + self.units_in_transit;
    }

    /// 安全庫存佔平均月消耗的比例（百分比），顯示用
    pub fn safety_stock_percent(&self) -> Option<Decimal> {
        if self.average_consumption == Decimal::ZERO {
            return None;
        }
        Some(self.safety_stock / self.average_consumption * Decimal::from(100))
    }
}
