//! 規劃區域（supernode）模型

use serde::{Deserialize, Serialize};

/// 區域：由鄰近設施聚合而成的規劃單位
///
/// 由聚類引擎建立，之後不再變更。
/// 不變量：每個設施恰好屬於一個區域。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// 區域編號（1..=K）
    pub id: usize,

    /// 成員設施索引
    pub members: Vec<usize>,

    /// 成員座標重心（緯度, 經度），報告用途
    pub centroid: (f64, f64),
}

impl Zone {
    /// 以種子設施創建新的區域
    pub fn new(id: usize) -> Self {
        Self {
            id,
            members: Vec::new(),
            centroid: (0.0, 0.0),
        }
    }

    /// 成員數量
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// 是否沒有成員
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// 檢查設施是否屬於此區域
    pub fn contains(&self, facility_id: usize) -> bool {
        self.members.contains(&facility_id)
    }
}
