//! 訂購量與缺口解析

use plannink_core::{Product, Projection, RequiredAction};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::IntegrityWarning;

/// 訂購/缺口解析器
///
/// 產品層級的「目前缺口」與各期的「預測缺口」是兩個不同欄位，
/// 不得混用。
pub struct OrderResolver;

impl OrderResolver {
    /// 單期缺口：低於再訂購點時為 再訂購點 − 預測庫存，
    /// 否則回退到產品層級的目前缺口
    pub fn projection_deficit(projection: &Projection, product: &Product) -> Decimal {
        if projection.stock_proyectado < projection.punto_reorden {
            (projection.punto_reorden - projection.stock_proyectado).max(Decimal::ZERO)
        } else {
            product.deficit
        }
    }

    /// 缺口換算訂購箱數（無條件進位）
    pub fn boxes_for_deficit(deficit: Decimal, units_per_box: Decimal) -> u32 {
        if deficit <= Decimal::ZERO || units_per_box <= Decimal::ZERO {
            return 0;
        }
        (deficit / units_per_box).ceil().to_u32().unwrap_or(0)
    }

    /// 驗證外部供應的訂購量：cajas == ceil(unidades / unid_por_caja)
    ///
    /// 訂購量由上游服務計算；不一致時回報警告，絕不自行改寫數值。
    pub fn verify_order_quantities(product: &Product) -> Option<IntegrityWarning> {
        let expected = Self::boxes_for_deficit(product.units_to_order, product.units_per_box);
        if product.boxes_to_order != expected {
            return Some(IntegrityWarning::warning(
                product.code.clone(),
                format!(
                    "CAJAS_A_PEDIR ({}) 與 UNIDADES_A_PEDIR ({}) / UNIDADES_POR_CAJA ({}) 不一致，預期 {}",
                    product.boxes_to_order, product.units_to_order, product.units_per_box, expected
                ),
            ));
        }
        None
    }

    /// 由單期狀態決定建議動作
    pub fn required_action(projection: &Projection) -> RequiredAction {
        if projection.cajas_a_pedir > 0 {
            RequiredAction::OrderNow(projection.cajas_a_pedir)
        } else if projection.alerta_stock {
            RequiredAction::Monitor
        } else {
            RequiredAction::Sufficient
        }
    }
}
