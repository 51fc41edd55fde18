//! 空間聚類引擎
//!
//! 將原始設施座標以貪婪單趟掃描聚合為至多 K 個規劃區域。

use modplan_core::{Facility, PlanConfig, PlanError, Result, Zone};

/// 聚類引擎
pub struct ClusterEngine;

impl ClusterEngine {
    /// 將設施分割為至多 K 個區域
    ///
    /// 依輸入順序掃描：尚未開滿 K 個區域時，每個未指派設施開啟
    /// 一個新區域並吸收鄰近閾值內的所有未指派設施；區域開滿後，
    /// 剩餘設施併入當前成員最少的區域（同樣最少時取編號最小者）。
    ///
    /// 保證完整分割且區域數不超過 K；溢出指派不保證鄰近性，
    /// 這是刻意的簡化而非聚類最優。
    pub fn partition(facilities: &[Facility], config: &PlanConfig) -> Result<Vec<Zone>> {
        config.validate()?;

        if facilities.is_empty() {
            return Err(PlanError::Configuration("設施清單為空".to_string()));
        }
        if facilities.len() < config.zones {
            return Err(PlanError::Configuration(format!(
                "設施數 {} 少於區域數 {}",
                facilities.len(),
                config.zones
            )));
        }

        let max_zones = config.zones;
        let threshold = config.proximity_threshold;

        let mut zones: Vec<Zone> = Vec::with_capacity(max_zones);
        let mut assigned = vec![false; facilities.len()];

        for (i, seed) in facilities.iter().enumerate() {
            if assigned[i] {
                continue;
            }

            if zones.len() < max_zones {
                // 開啟新區域，種子吸收閾值內的所有未指派設施
                let mut zone = Zone::new(zones.len() + 1);
                zone.members.push(i);
                assigned[i] = true;

                for (j, other) in facilities.iter().enumerate() {
                    if !assigned[j] && seed.distance_to(other) < threshold {
                        zone.members.push(j);
                        assigned[j] = true;
                    }
                }
                zones.push(zone);
            } else {
                // 溢出：併入成員最少的區域（同量時取編號最小者）
                let smallest = zones
                    .iter_mut()
                    .min_by_key(|z| z.len())
                    .ok_or_else(|| PlanError::Other("區域集合為空".to_string()))?;
                smallest.members.push(i);
                assigned[i] = true;
            }
        }

        for zone in &mut zones {
            zone.centroid = centroid(facilities, &zone.members);
        }

        tracing::info!(
            "聚類完成：{} 個設施 → {} 個區域",
            facilities.len(),
            zones.len()
        );

        Ok(zones)
    }
}

/// 成員座標的算術重心
fn centroid(facilities: &[Facility], members: &[usize]) -> (f64, f64) {
    let count = members.len() as f64;
    let (lat, lon) = members.iter().fold((0.0, 0.0), |(lat, lon), &id| {
        (lat + facilities[id].latitude, lon + facilities[id].longitude)
    });
    (lat / count, lon / count)
}
