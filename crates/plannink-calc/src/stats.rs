//! 統計輔助函數
//!
//! 純函數，無副作用。量值以 f64 計算（需要 sqrt/exp）。

use plannink_core::ConsumptionHistory;
use rust_decimal::prelude::ToPrimitive;

/// 變異度計算所需的最少資料點數
const MIN_HISTORY_POINTS: usize = 3;

/// 平均值；空序列回傳 0
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 母體標準差；空序列回傳 0
pub fn std_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// 變異係數（百分比）= 標準差 / 平均 × 100
///
/// 少於 3 個資料點或平均為 0 時回傳 0（除零防護與低信度統計）。
pub fn variability_percent(history: &ConsumptionHistory) -> f64 {
    if history.len() < MIN_HISTORY_POINTS {
        return 0.0;
    }
    let values = history_as_f64(history);
    let m = mean(&values);
    if m == 0.0 {
        return 0.0;
    }
    std_deviation(&values) / m * 100.0
}

/// 標準常態累積分佈函數 Φ(z)
///
/// Zelen & Severo（Abramowitz & Stegun 26.2.17）多項式近似。
pub fn normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return 0.5;
    }
    if z >= 8.0 {
        return 1.0;
    }
    if z <= -8.0 {
        return 0.0;
    }

    // Φ(-z) = 1 - Φ(z)
    let (z_abs, negate) = if z < 0.0 { (-z, true) } else { (z, false) };

    const B0: f64 = 0.2316419;
    const B1: f64 = 0.319381530;
    const B2: f64 = -0.356563782;
    const B3: f64 = 1.781477937;
    const B4: f64 = -1.821255978;
    const B5: f64 = 1.330274429;

    let t = 1.0 / (1.0 + B0 * z_abs);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let pdf = (-0.5 * z_abs * z_abs).exp() / (2.0 * std::f64::consts::PI).sqrt();
    let cdf = 1.0 - pdf * (B1 * t + B2 * t2 + B3 * t3 + B4 * t4 + B5 * t5);

    if negate {
        1.0 - cdf
    } else {
        cdf
    }
}

/// 補貨到貨前缺貨機率估計（0-100）
///
/// 以常態分佈近似提前期內的需求：
/// z = (目前庫存 − 平均月消耗 × L/30) / (標準差 × √(L/30))，
/// z < 0 回傳 (1 − Φ(z)) × 100，否則 Φ(z) × 100。
///
/// 標準差為 0 時 z 發散：庫存低於提前期需求時取 100%，否則取 0%。
/// 少於 3 個歷史資料點回傳 0。
pub fn stockout_risk_percent(
    current_stock: f64,
    history: &ConsumptionHistory,
    lead_time_days: u32,
) -> f64 {
    if history.len() < MIN_HISTORY_POINTS {
        return 0.0;
    }

    let values = history_as_f64(history);
    let m = mean(&values);
    let sd = std_deviation(&values);
    let lead_fraction = f64::from(lead_time_days) / 30.0;
    let expected_demand = m * lead_fraction;

    if sd == 0.0 || lead_fraction == 0.0 {
        return if current_stock < expected_demand {
            100.0
        } else {
            0.0
        };
    }

    let z = (current_stock - expected_demand) / (sd * lead_fraction.sqrt());
    let phi = normal_cdf(z);

    let risk = if z < 0.0 { (1.0 - phi) * 100.0 } else { phi * 100.0 };
    risk.clamp(0.0, 100.0)
}

fn history_as_f64(history: &ConsumptionHistory) -> Vec<f64> {
    history
        .values()
        .iter()
        .map(|d| d.to_f64().unwrap_or(0.0))
        .collect()
}
