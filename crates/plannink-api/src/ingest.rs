//! 攝取邊界的欄位正規化
//!
//! 上游資料來源（Excel 匯入、既有預測服務的 JSON）對同一欄位使用
//! 多組鍵名。別名對照表只在這裡套用一次，正規化之後整個引擎
//! 只認得標準欄位。

use chrono::NaiveDate;
use plannink_core::{ConsumptionHistory, MonthKey, PlanningConfig, PlanningError, Product};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use plannink_calc::IntegrityWarning;

/// 別名對照表版本；上游結構再漂移時遞增並擴充表格
pub const SCHEMA_VERSION: u32 = 1;

/// 未正規化的輸入記錄（一列 Excel 或一筆上游 JSON）
pub type RawRecord = serde_json::Map<String, Value>;

/// 產品代碼的候選鍵名
const CODE_ALIASES: &[&str] = &["CODIGO", "codigo", "Code"];

/// 描述的候選鍵名
const DESCRIPTION_ALIASES: &[&str] = &["DESCRIPCION", "descripcion", "Description"];

/// 實體庫存的候選鍵名
const PHYSICAL_STOCK_ALIASES: &[&str] = &["STOCK_FISICO", "stock_fisico"];

/// 總庫存的候選鍵名（含 Excel 標題的雙空格變體）
const TOTAL_STOCK_ALIASES: &[&str] = &[
    "STOCK_TOTAL",
    "STOCK  TOTAL",
    "STOCK TOTAL",
    "STOCK_ACTUAL",
    "stock_actual",
    "StockActual",
];

/// 在途單位數的候選鍵名
const TRANSIT_UNITS_ALIASES: &[&str] = &[
    "UNIDADES_TRANSITO_DISPONIBLES",
    "UNIDADES_TRANSITO",
    "unidades_transito",
];

/// 每箱單位數的候選鍵名
const UNITS_PER_BOX_ALIASES: &[&str] = &[
    "UNIDADES_POR_CAJA",
    "UNID_POR_CAJA",
    "UNID/CAJA",
    "unidades_por_caja",
    "UnidadesPorCaja",
];

/// 額外預計月消耗的候選鍵名
const PROJECTED_CONSUMPTION_ALIASES: &[&str] = &[
    "CONSUMO_PROYECTADO",
    "PROYECCION_CONSUMO",
    "Proyec de  Conss",
    "consumo_proyectado",
];

/// 安全庫存的候選鍵名
const SAFETY_STOCK_ALIASES: &[&str] = &["STOCK_SEGURIDAD", "SS", "stock_seguridad", "StockSeguridad"];

/// 歷史消耗欄位前綴（"CONS ENE 2024" 形式的 Excel 欄）
const HISTORY_COLUMN_PREFIX: &str = "CONS ";

/// 歷史消耗物件的鍵名（既有服務的 JSON 形式）
const HISTORY_OBJECT_KEYS: &[&str] = &["HISTORICO_CONSUMOS", "CONSUMOS_HISTORICOS"];

/// 欄位正規化器
pub struct Normalizer;

impl Normalizer {
    /// 把一筆原始記錄轉成標準 Product
    ///
    /// 缺少產品代碼是硬錯誤；其餘缺漏以安全預設值補齊並回報警告。
    pub fn normalize(
        record: &RawRecord,
        config: &PlanningConfig,
        start_date: NaiveDate,
    ) -> plannink_core::Result<(Product, Vec<IntegrityWarning>)> {
        let mut warnings = Vec::new();

        let code = lookup_string(record, CODE_ALIASES)
            .ok_or_else(|| PlanningError::Validation("記錄缺少產品代碼 (CODIGO)".to_string()))?;

        let description = lookup_string(record, DESCRIPTION_ALIASES).unwrap_or_else(|| {
            warnings.push(IntegrityWarning::info(
                code.clone(),
                "缺少 DESCRIPCION，使用 'Sin información'".to_string(),
            ));
            "Sin información".to_string()
        });

        let transit_units = lookup_quantity(record, TRANSIT_UNITS_ALIASES).unwrap_or(Decimal::ZERO);

        // 實體庫存優先；只有總庫存時視為實體（在途另列）
        let physical_stock = match lookup_quantity(record, PHYSICAL_STOCK_ALIASES) {
            Some(stock) => stock,
            None => match lookup_quantity(record, TOTAL_STOCK_ALIASES) {
                Some(total) => (total - transit_units).max(Decimal::ZERO),
                None => {
                    warnings.push(IntegrityWarning::warning(
                        code.clone(),
                        "缺少庫存欄位，預設為 0".to_string(),
                    ));
                    Decimal::ZERO
                }
            },
        };

        let units_per_box = lookup_quantity(record, UNITS_PER_BOX_ALIASES).unwrap_or_else(|| {
            warnings.push(IntegrityWarning::info(
                code.clone(),
                "缺少 UNIDADES_POR_CAJA，預設為 1".to_string(),
            ));
            Decimal::ONE
        });

        let history = extract_history(record, &code, &mut warnings);
        if history.is_empty() {
            warnings.push(IntegrityWarning::warning(
                code.clone(),
                "沒有任何歷史消耗資料，衍生參數將為 0".to_string(),
            ));
        }

        let mut product = Product::new(code, description, start_date)
            .with_physical_stock(physical_stock)
            .with_units_in_transit(transit_units)
            .with_units_per_box(units_per_box)
            .with_history(history)
            .with_config(config.clone());

        if let Some(projected) = lookup_quantity(record, PROJECTED_CONSUMPTION_ALIASES) {
            product.projected_consumption = projected;
        }
        if let Some(safety) = lookup_quantity(record, SAFETY_STOCK_ALIASES) {
            product.safety_stock = safety;
        }

        Ok((product, warnings))
    }
}

/// 依別名順序找出第一個存在的字串值
fn lookup_string(record: &RawRecord, aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        if let Some(value) = record.get(*alias) {
            match value {
                Value::String(s) if !s.trim().is_empty() => return Some(s.trim().to_string()),
                Value::Number(n) => return Some(n.to_string()),
                _ => {}
            }
        }
    }
    None
}

/// 依別名順序找出第一個可解析的數量
fn lookup_quantity(record: &RawRecord, aliases: &[&str]) -> Option<Decimal> {
    for alias in aliases {
        if let Some(value) = record.get(*alias) {
            if let Some(qty) = parse_quantity(value) {
                return Some(qty);
            }
        }
    }
    None
}

/// 數量解析：JSON 數字或帶千分位逗號的字串（"1,234.5"）
fn parse_quantity(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => {
            let cleaned = s.trim().replace(',', "");
            if cleaned.is_empty() {
                None
            } else {
                Decimal::from_str(&cleaned).ok()
            }
        }
        _ => None,
    }
}

/// 收集歷史消耗：JSON 物件（HISTORICO_CONSUMOS）與
/// Excel 欄位（"CONS ENE 2024"）兩種形式
fn extract_history(
    record: &RawRecord,
    code: &str,
    warnings: &mut Vec<IntegrityWarning>,
) -> ConsumptionHistory {
    let mut history = ConsumptionHistory::new();

    for object_key in HISTORY_OBJECT_KEYS {
        if let Some(Value::Object(entries)) = record.get(*object_key) {
            for (month_label, value) in entries {
                insert_history_entry(&mut history, month_label, value, code, warnings);
            }
        }
    }

    for (key, value) in record {
        if let Some(rest) = key.strip_prefix(HISTORY_COLUMN_PREFIX) {
            // "CONS ENE 2024" → "ENE-2024"
            let label = rest.trim().replace(' ', "-");
            insert_history_entry(&mut history, &label, value, code, warnings);
        }
    }

    history
}

fn insert_history_entry(
    history: &mut ConsumptionHistory,
    month_label: &str,
    value: &Value,
    code: &str,
    warnings: &mut Vec<IntegrityWarning>,
) {
    let key: MonthKey = match month_label.parse() {
        Ok(key) => key,
        Err(_) => {
            warnings.push(IntegrityWarning::warning(
                code.to_string(),
                format!("無法解析歷史月份鍵 '{month_label}'，略過"),
            ));
            return;
        }
    };

    match parse_quantity(value) {
        Some(qty) => history.insert(key, qty),
        None => {
            warnings.push(IntegrityWarning::info(
                code.to_string(),
                format!("歷史月份 '{month_label}' 的數量缺失，以 0 計"),
            ));
            history.insert(key, Decimal::ZERO);
        }
    }
}
