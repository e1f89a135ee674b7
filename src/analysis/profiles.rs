//! Cuts through a layer's stress field for reporting

use crate::domain::layer::Layer;
use ndarray::{s, Array1, ArrayView1, Axis};

/// Stress history of one node, or `None` if the node does not exist
pub fn node_history(layer: &Layer, node: usize) -> Option<ArrayView1<'_, f64>> {
    (node < layer.node_count()).then(|| layer.mesh().column(node))
}

/// Stress history of the middle node (`node_count / 2`)
pub fn midpoint_history(layer: &Layer) -> Option<ArrayView1<'_, f64>> {
    node_history(layer, layer.node_count() / 2)
}

/// Stress across the thickness at one time index
pub fn snapshot(layer: &Layer, time_index: usize) -> Option<ArrayView1<'_, f64>> {
    (time_index < layer.mesh().nrows()).then(|| layer.mesh().row(time_index))
}

/// Index of the sample closest to `t`, if `t` lies within the time vector
pub fn nearest_time_index(times: &Array1<f64>, t: f64) -> Option<usize> {
    let first = *times.get(0)?;
    let last = *times.get(times.len().checked_sub(1)?)?;
    if !(t >= first && t <= last) {
        return None;
    }
    times
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - t).abs().total_cmp(&(*b - t).abs()))
        .map(|(i, _)| i)
}

/// Interior nodes used for envelopes; the two nodes next to each face are
/// excluded since they carry the boundary double-deposits
fn interior_envelope(layer: &Layer, pick: impl Fn(f64, f64) -> f64) -> Array1<f64> {
    let n = layer.node_count();
    if n <= 4 {
        return Array1::zeros(layer.mesh().nrows());
    }
    let interior = layer.mesh().slice(s![.., 2..n - 2]);
    interior.map_axis(Axis(1), |row| row.iter().fold(0.0, |acc, &v| pick(acc, v)))
}

/// Largest tensile stress over interior nodes at each time step, 0 when none
pub fn tension_envelope(layer: &Layer) -> Array1<f64> {
    interior_envelope(layer, f64::max)
}

/// Most compressive stress over interior nodes at each time step, 0 when none
pub fn compression_envelope(layer: &Layer) -> Array1<f64> {
    interior_envelope(layer, f64::min)
}
