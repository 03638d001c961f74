//! Screen-space grouping of well markers into cluster icons.

use eframe::egui::{Pos2, Vec2};
use std::collections::HashMap;

/// Default grid cell size in pixels.
pub const CLUSTER_CELL_PX: f32 = 60.0;

/// A group of markers drawn as one icon.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerCluster {
    /// Mean screen position of the members.
    pub center: Pos2,
    /// Indices into the marker slice that was clustered.
    pub members: Vec<usize>,
}

impl MarkerCluster {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }

    /// Number of digits in the count label; cluster icons grow with it.
    pub fn digits(&self) -> usize {
        self.count().to_string().len()
    }

    /// Icon radius in pixels.
    pub fn icon_radius(&self) -> f32 {
        if self.is_single() {
            6.0
        } else {
            10.0 + 4.0 * self.digits() as f32
        }
    }
}

/// Groups screen positions into grid cells of `cell_px` pixels.
///
/// Clusters come out in order of their first member.
pub fn cluster_positions(positions: &[Pos2], cell_px: f32) -> Vec<MarkerCluster> {
    let cell = cell_px.max(1.0);
    let mut by_cell: HashMap<(i64, i64), usize> = HashMap::new();
    let mut clusters: Vec<(Vec2, Vec<usize>)> = Vec::new();

    for (index, pos) in positions.iter().enumerate() {
        let key = ((pos.x / cell).floor() as i64, (pos.y / cell).floor() as i64);
        match by_cell.get(&key) {
            Some(&slot) => {
                if let Some((sum, members)) = clusters.get_mut(slot) {
                    *sum += pos.to_vec2();
                    members.push(index);
                }
            }
            None => {
                by_cell.insert(key, clusters.len());
                clusters.push((pos.to_vec2(), vec![index]));
            }
        }
    }

    clusters
        .into_iter()
        .map(|(sum, members)| MarkerCluster {
            center: (sum / members.len() as f32).to_pos2(),
            members,
        })
        .collect()
}

/// Finds the cluster whose icon contains `pos`.
pub fn hit_test(clusters: &[MarkerCluster], pos: Pos2) -> Option<&MarkerCluster> {
    clusters
        .iter()
        .filter(|c| c.center.distance(pos) <= c.icon_radius() + 2.0)
        .min_by(|a, b| a.center.distance(pos).total_cmp(&b.center.distance(pos)))
}
