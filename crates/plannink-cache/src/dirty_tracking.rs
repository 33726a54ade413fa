//! 髒標記追蹤

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 標記原因（記錄觸發重算的操作類別）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirtyReason {
    /// Excel 重新整理 / 批次重算
    Refresh,
    /// 在途單位數變更
    TransitUnits,
    /// 在途天數變更
    TransitDays,
}

/// 髒標記追蹤器
///
/// 在途調整或資料重新整理後標記產品，讓服務層只對受影響的產品
/// 重建預測序列。
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty_products: HashMap<String, DirtyReason>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記產品為髒
    ///
    /// 同一產品重複標記時保留最新的原因。
    pub fn mark_dirty(&mut self, product_code: String, reason: DirtyReason) {
        self.dirty_products.insert(product_code, reason);
    }

    /// 檢查產品是否為髒
    pub fn is_dirty(&self, product_code: &str) -> bool {
        self.dirty_products.contains_key(product_code)
    }

    /// 取得標記原因
    pub fn reason(&self, product_code: &str) -> Option<DirtyReason> {
        self.dirty_products.get(product_code).copied()
    }

    /// 髒產品數量
    pub fn len(&self) -> usize {
        self.dirty_products.len()
    }

    /// 是否沒有髒產品
    pub fn is_empty(&self) -> bool {
        self.dirty_products.is_empty()
    }

    /// 取出所有髒產品並清空（代碼排序，批次重算的順序可重現）
    pub fn drain(&mut self) -> Vec<(String, DirtyReason)> {
        let mut drained: Vec<_> = self.dirty_products.drain().collect();
        drained.sort_by(|a, b| a.0.cmp(&b.0));
        drained
    }

    /// 清除單一產品的標記
    pub fn clear(&mut self, product_code: &str) {
        self.dirty_products.remove(product_code);
    }

    /// 清除所有標記
    pub fn clear_all(&mut self) {
        self.dirty_products.clear();
    }
}
