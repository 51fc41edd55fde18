//! 設施模型與資料載入

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{PlanError, Result};

/// 設施（固定地點，例如醫院）
///
/// 從輸入資料建立一次，之後不再變更。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// 設施索引（輸入順序，從 0 開始）
    pub id: usize,

    /// 緯度
    pub latitude: f64,

    /// 經度
    pub longitude: f64,
}

impl Facility {
    /// 創建新的設施
    pub fn new(id: usize, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            latitude,
            longitude,
        }
    }

    /// 座標空間中的歐式距離
    pub fn distance_to(&self, other: &Facility) -> f64 {
        let dx = self.latitude - other.latitude;
        let dy = self.longitude - other.longitude;
        (dx * dx + dy * dy).sqrt()
    }
}

/// CSV 輸入列（欄位名稱對應輸入檔表頭）
#[derive(Debug, Deserialize)]
struct FacilityRecord {
    #[serde(rename = "Latitude")]
    latitude: f64,

    #[serde(rename = "Longitude")]
    longitude: f64,
}

/// 從 CSV 檔案載入設施清單
///
/// 檔案必須包含 `Latitude` 與 `Longitude` 欄位；
/// 格式錯誤的列視為致命的資料錯誤。
pub fn load_facilities(path: impl AsRef<Path>) -> Result<Vec<Facility>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| PlanError::Data(format!("無法讀取 {}: {e}", path.display())))?;

    read_facilities(&mut reader)
}

/// 從任意 reader 載入設施清單（測試用途）
pub fn read_facilities<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Vec<Facility>> {
    let mut facilities = Vec::new();
    for (index, row) in reader.deserialize::<FacilityRecord>().enumerate() {
        let record = row.map_err(|e| PlanError::Data(format!("第 {} 列格式錯誤: {e}", index + 1)))?;
        facilities.push(Facility::new(index, record.latitude, record.longitude));
    }

    if facilities.is_empty() {
        return Err(PlanError::Data("設施清單為空".to_string()));
    }

    Ok(facilities)
}
