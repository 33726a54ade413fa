//! 月份鍵與歷史消耗序列

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::PlanningError;

/// 西班牙語月份縮寫（上游 Excel / 預測服務的命名慣例）
const SPANISH_MONTHS: [&str; 12] = [
    "ENE", "FEB", "MAR", "ABR", "MAY", "JUN", "JUL", "AGO", "SEP", "OCT", "NOV", "DIC",
];

/// 月份鍵（某年的某個月）
///
/// 排序必須按 (年, 月) 的時間順序，絕不可用字串排序：
/// "02-2025" 必須排在 "11-2024" 之後。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    /// 年（先比較年，再比較月）
    pub year: i32,
    /// 月（1-12）
    pub month: u32,
}

impl MonthKey {
    /// 創建新的月份鍵
    pub fn new(year: i32, month: u32) -> crate::Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(PlanningError::InvalidMonthKey(format!(
                "月份超出範圍: {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// 該月第一天
    pub fn first_day(&self) -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("月份已驗證")
    }

    /// 上游使用的西班牙語標籤，如 "ENE-2025"
    pub fn label(&self) -> String {
        format!("{}-{}", SPANISH_MONTHS[(self.month - 1) as usize], self.year)
    }

    /// 下一個月
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl FromStr for MonthKey {
    type Err = PlanningError;

    /// 接受 "MM-YYYY"、"ENE-2025" 與舊格式 "ENE_2025"
    fn from_str(s: &str) -> crate::Result<Self> {
        let normalized = s.trim().replace('_', "-");
        let (mes, anio) = normalized
            .split_once('-')
            .ok_or_else(|| PlanningError::InvalidMonthKey(s.to_string()))?;

        let year: i32 = anio
            .trim()
            .parse()
            .map_err(|_| PlanningError::InvalidMonthKey(s.to_string()))?;

        let mes = mes.trim().to_uppercase();
        if let Ok(month) = mes.parse::<u32>() {
            return Self::new(year, month);
        }

        let month = SPANISH_MONTHS
            .iter()
            .position(|abr| *abr == mes)
            .ok_or_else(|| PlanningError::InvalidMonthKey(s.to_string()))?;

        Self::new(year, month as u32 + 1)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for MonthKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 月度歷史消耗序列（按時間順序）
///
/// 介面格式是月份鍵直接對數量的物件（`{"ENE-2024": 200, ...}`）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumptionHistory {
    entries: BTreeMap<MonthKey, Decimal>,
}

impl ConsumptionHistory {
    /// 創建空的歷史序列
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 (鍵, 數量) 序列創建，鍵解析失敗即回報錯誤
    pub fn from_labeled<I, S>(entries: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let mut history = Self::new();
        for (key, qty) in entries {
            history.insert(key.as_ref().parse()?, qty);
        }
        Ok(history)
    }

    /// 寫入某月的消耗量
    pub fn insert(&mut self, key: MonthKey, quantity: Decimal) {
        self.entries.insert(key, quantity);
    }

    /// 資料點數量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否為空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按時間順序迭代
    pub fn iter(&self) -> impl Iterator<Item = (&MonthKey, &Decimal)> {
        self.entries.iter()
    }

    /// 按時間順序的消耗量
    pub fn values(&self) -> Vec<Decimal> {
        self.entries.values().copied().collect()
    }

    /// 最近 n 個月的消耗量（由舊到新）
    pub fn last_n(&self, n: usize) -> Vec<Decimal> {
        let values = self.values();
        let start = values.len().saturating_sub(n);
        values[start..].to_vec()
    }

    /// 指定日曆月（跨年份）的歷史值，用於同月加權
    pub fn values_for_month(&self, month: u32) -> Vec<Decimal> {
        self.entries
            .iter()
            .filter(|(key, _)| key.month == month)
            .map(|(_, qty)| *qty)
            .collect()
    }

    /// 平均月消耗
    pub fn mean(&self) -> Decimal {
        if self.entries.is_empty() {
            return Decimal::ZERO;
        }
        let total: Decimal = self.entries.values().copied().sum();
        total / Decimal::from(self.entries.len())
    }
}
