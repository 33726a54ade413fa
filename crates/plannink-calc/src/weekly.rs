//! 月度預測的週度拆解（圖表/匯出用）

use plannink_core::Projection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 每月拆成的週數
const WEEKS_PER_MONTH: u32 = 4;

/// 週度資料點
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyPoint {
    /// 標籤，如 "Semana 2 ENE-2025"
    pub semana: String,

    /// 該週期末庫存
    pub stock: Decimal,

    /// 該週消耗
    pub consumo: Decimal,

    /// 再訂購點（參考線）
    pub punto_reorden: Decimal,
}

/// 由月度預測推導週度序列
///
/// 每個月固定產生 4 個點：週消耗 = 月消耗 / 4；第一週由
/// `stock_proyectado + consumo_mensual` 回推到期初，之後每週遞減，
/// 低於 0 時取 0。
pub fn derive_weekly_from_monthly(projections: &[Projection]) -> Vec<WeeklyPoint> {
    let mut points = Vec::with_capacity(projections.len() * WEEKS_PER_MONTH as usize);

    for projection in projections {
        let weekly_consumption = projection.consumo_mensual / Decimal::from(WEEKS_PER_MONTH);

        let mut stock = projection.stock_proyectado + projection.consumo_mensual;
        for week in 1..=WEEKS_PER_MONTH {
            if week > 1 {
                stock = (stock - weekly_consumption).max(Decimal::ZERO);
            }

            points.push(WeeklyPoint {
                semana: format!("Semana {week} {}", projection.mes.label()),
                stock,
                consumo: weekly_consumption,
                punto_reorden: projection.punto_reorden,
            });
        }
    }

    points
}
