//! 月度庫存預測記錄

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::MonthKey;

/// 日期欄位的序列化：None 對應既有介面的 "No aplica"
pub mod fecha_opcional {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const NO_APLICA: &str = "No aplica";

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_str(NO_APLICA),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() || raw == NO_APLICA {
            return Ok(None);
        }
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// 建議動作分類
///
/// 既有介面傳遞自由格式字串（"Stock suficiente" / "Pedir N cajas"），
/// 這裡改為封閉枚舉並保持序列化格式不變。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredAction {
    /// 庫存充足
    Sufficient,
    /// 立即下單（附建議箱數）
    OrderNow(u32),
    /// 持續監控
    Monitor,
}

impl RequiredAction {
    /// 既有介面的字串表示
    pub fn legacy_text(&self) -> String {
        match self {
            RequiredAction::Sufficient => "Stock suficiente".to_string(),
            RequiredAction::OrderNow(cajas) => format!("Pedir {cajas} cajas"),
            RequiredAction::Monitor => "Monitorear".to_string(),
        }
    }

    fn parse_legacy(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("Stock suficiente") {
            return RequiredAction::Sufficient;
        }
        if raw.eq_ignore_ascii_case("Monitorear") {
            return RequiredAction::Monitor;
        }
        if let Some(rest) = raw.strip_prefix("Pedir ") {
            if let Some(num) = rest.split_whitespace().next() {
                if let Ok(cajas) = num.parse() {
                    return RequiredAction::OrderNow(cajas);
                }
            }
        }
        RequiredAction::Monitor
    }
}

impl Serialize for RequiredAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.legacy_text())
    }
}

impl<'de> Deserialize<'de> for RequiredAction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(RequiredAction::parse_legacy(&raw))
    }
}

/// 計劃收貨（某期預計到貨的補貨單）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedReceipt {
    /// 收貨ID
    pub id: Uuid,

    /// 單位數量
    pub unidades: Decimal,

    /// 預計到貨日期
    pub fecha_arribo: NaiveDate,
}

impl PlannedReceipt {
    /// 創建新的計劃收貨
    pub fn new(unidades: Decimal, fecha_arribo: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            unidades,
            fecha_arribo,
        }
    }
}

/// 單一預測期（名義上為一個日曆月）
///
/// 序列化鍵沿用既有預測服務的小寫格式。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    /// 期別標籤（月）
    pub mes: MonthKey,

    /// 本期套用的在途天數
    pub dias_transito: u32,

    /// 期初預測庫存
    pub stock_inicial: Decimal,

    /// 消耗後的預測庫存
    pub stock_proyectado: Decimal,

    /// 月消耗
    pub consumo_mensual: Decimal,

    /// 日消耗
    pub consumo_diario: Decimal,

    /// 安全庫存
    pub stock_seguridad: Decimal,

    /// 最小庫存
    pub stock_minimo: Decimal,

    /// 再訂購點
    pub punto_reorden: Decimal,

    /// 本期缺口
    pub deficit: Decimal,

    /// 建議訂購箱數
    pub cajas_a_pedir: u32,

    /// 建議訂購單位數
    pub unidades_a_pedir: Decimal,

    /// 庫存警報
    pub alerta_stock: bool,

    /// 預計補貨日期
    #[serde(with = "fecha_opcional")]
    pub fecha_reposicion: Option<NaiveDate>,

    /// 建議下單日期
    #[serde(with = "fecha_opcional")]
    pub fecha_solicitud: Option<NaiveDate>,

    /// 預計到貨日期
    #[serde(with = "fecha_opcional")]
    pub fecha_arribo: Option<NaiveDate>,

    /// 本期起始日期
    pub fecha_inicio: NaiveDate,

    /// 本期結束日期（由在途天數按工作日推算）
    pub fecha_fin: NaiveDate,

    /// 覆蓋時間（天）
    pub tiempo_cobertura: Decimal,

    /// 補貨頻率（天）
    pub frecuencia_reposicion: Decimal,

    /// 在途單位數
    pub unidades_en_transito: Decimal,

    /// 待收補貨單（期別 → 收貨）
    pub pedidos_pendientes: BTreeMap<MonthKey, PlannedReceipt>,

    /// 本期已收單位數
    pub pedidos_recibidos: Decimal,

    /// 建議動作
    pub accion_requerida: RequiredAction,

    /// 使用者是否對本期套用過在途天數
    ///
    /// 此旗標屬於預測記錄本身，局部重算不得重設其他期的值。
    pub dias_transito_aplicados: bool,
}

impl Projection {
    /// 創建歸零的預測記錄，數值由產生器填入
    pub fn new(mes: MonthKey, fecha_inicio: NaiveDate) -> Self {
        Self {
            mes,
            dias_transito: 0,
            stock_inicial: Decimal::ZERO,
            stock_proyectado: Decimal::ZERO,
            consumo_mensual: Decimal::ZERO,
            consumo_diario: Decimal::ZERO,
            stock_seguridad: Decimal::ZERO,
            stock_minimo: Decimal::ZERO,
            punto_reorden: Decimal::ZERO,
            deficit: Decimal::ZERO,
            cajas_a_pedir: 0,
            unidades_a_pedir: Decimal::ZERO,
            alerta_stock: false,
            fecha_reposicion: None,
            fecha_solicitud: None,
            fecha_arribo: None,
            fecha_inicio,
            fecha_fin: fecha_inicio,
            tiempo_cobertura: Decimal::ZERO,
            frecuencia_reposicion: Decimal::ZERO,
            unidades_en_transito: Decimal::ZERO,
            pedidos_pendientes: BTreeMap::new(),
            pedidos_recibidos: Decimal::ZERO,
            accion_requerida: RequiredAction::Sufficient,
            dias_transito_aplicados: false,
        }
    }

    /// 是否低於再訂購點
    pub fn is_below_reorder_point(&self) -> bool {
        self.stock_proyectado < self.punto_reorden
    }

    /// 危急狀態（讀取時計算，不另外儲存）：預測庫存低於安全庫存
    pub fn is_critical(&self) -> bool {
        self.stock_proyectado < self.stock_seguridad
    }

    /// 登記一筆待收補貨單
    pub fn add_pending_receipt(&mut self, mes: MonthKey, receipt: PlannedReceipt) {
        self.unidades_en_transito += receipt.unidades;
        self.pedidos_pendientes.insert(mes, receipt);
    }
}
