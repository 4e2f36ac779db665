//! Plan-line editor: pure-function edit operations plus a bounded undo/redo
//! ring over the versions they produce (spec §4.6, §9). Every edit returns a
//! new plan line; nothing is mutated in place.
//!
//! `PlanLine` is a `ResampledSeries`, so it carries a fixed equally-spaced
//! grid of distances. "Points" an external UI drags are therefore grid
//! indices, not free-floating control points: `insert_point`/`move_point`
//! snap the requested distance to its nearest grid sample, and `delete_point`
//! relaxes that sample back to the average of its neighbors rather than
//! literally shortening the series.

use crate::error::{Result, TrackGeomError};
use crate::geometry::plan_line::{local_window_smooth, PlanLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ArcDirection {
    Left,
    Right,
}

/// Optional per-field bounds applied to an edited value.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct EditClamps {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl EditClamps {
    fn apply(&self, value: f64) -> f64 {
        let mut v = value;
        if let Some(min) = self.min_value {
            v = v.max(min);
        }
        if let Some(max) = self.max_value {
            v = v.min(max);
        }
        v
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum EditOp {
    SetStraight { start_d: f64, end_d: f64, start_v: f64, end_v: f64 },
    SetCircularArc { start_d: f64, end_d: f64, radius_m: f64, center_v: f64, direction: ArcDirection },
    InsertPoint { distance: f64, value: f64, clamps: EditClamps },
    DeletePoint { distance: f64 },
    MovePoint { old_distance: f64, new_distance: f64, new_value: f64, clamps: EditClamps },
    SmoothSection { start_d: f64, end_d: f64, window_points: usize },
}

fn nearest_index(distances: &[f64], distance: f64) -> Result<usize> {
    let n = distances.len();
    if distance < distances[0] || distance > distances[n - 1] {
        return Err(TrackGeomError::OutOfRange { distance, min: distances[0], max: distances[n - 1] });
    }
    let idx = match distances.binary_search_by(|d| d.partial_cmp(&distance).unwrap()) {
        Ok(i) => i,
        Err(i) => {
            if i == 0 {
                0
            } else if i >= n {
                n - 1
            } else if (distances[i] - distance).abs() < (distance - distances[i - 1]).abs() {
                i
            } else {
                i - 1
            }
        }
    };
    Ok(idx)
}

/// Linearly interpolate `plan` over `[start_d, end_d]`; points outside the
/// range are left unchanged (spec §4.6).
pub fn set_straight(plan: &PlanLine, start_d: f64, end_d: f64, start_v: f64, end_v: f64) -> Result<PlanLine> {
    if !(end_d > start_d) {
        return Err(TrackGeomError::InvalidParams { reason: format!("end_d {end_d} must exceed start_d {start_d}") });
    }
    let distances = plan.distances();
    let mut values = plan.values();
    for (i, &d) in distances.iter().enumerate() {
        if d >= start_d && d <= end_d {
            let t = (d - start_d) / (end_d - start_d);
            values[i] = start_v + t * (end_v - start_v);
        }
    }
    Ok(plan.with_values(values))
}

/// Circular-arc profile over `[start_d, end_d]`, centered at `center_v`,
/// sagging toward (`Left`) or away from (`Right`) the chord (spec §4.6).
pub fn set_circular_arc(
    plan: &PlanLine,
    start_d: f64,
    end_d: f64,
    radius_m: f64,
    center_v: f64,
    direction: ArcDirection,
) -> Result<PlanLine> {
    if !(end_d > start_d) {
        return Err(TrackGeomError::InvalidParams { reason: format!("end_d {end_d} must exceed start_d {start_d}") });
    }
    if radius_m <= 0.0 {
        return Err(TrackGeomError::InvalidParams { reason: format!("radius_m must be > 0, got {radius_m}") });
    }

    let mid = (start_d + end_d) / 2.0;
    let sign = match direction {
        ArcDirection::Left => 1.0,
        ArcDirection::Right => -1.0,
    };

    let distances = plan.distances();
    let mut values = plan.values();
    for (i, &d) in distances.iter().enumerate() {
        if d >= start_d && d <= end_d {
            let x = d - mid;
            let sag = radius_m - (radius_m * radius_m - x * x).max(0.0).sqrt();
            values[i] = center_v + sign * sag;
        }
    }
    Ok(plan.with_values(values))
}

/// Set the value of the grid sample nearest `distance` (spec §4.6).
pub fn insert_point(plan: &PlanLine, distance: f64, value: f64, clamps: &EditClamps) -> Result<PlanLine> {
    let distances = plan.distances();
    let idx = nearest_index(&distances, distance)?;
    let mut values = plan.values();
    values[idx] = clamps.apply(value);
    Ok(plan.with_values(values))
}

/// Relax the grid sample nearest `distance` to the average of its
/// neighbors, removing it as a distinguished control point (spec §4.6).
pub fn delete_point(plan: &PlanLine, distance: f64) -> Result<PlanLine> {
    let distances = plan.distances();
    let idx = nearest_index(&distances, distance)?;
    let mut values = plan.values();
    let left = values[idx.saturating_sub(1)];
    let right = values[(idx + 1).min(values.len() - 1)];
    values[idx] = (left + right) / 2.0;
    Ok(plan.with_values(values))
}

/// Delete the point nearest `old_distance`, then insert `new_value` at the
/// grid sample nearest `new_distance` (spec §4.6).
pub fn move_point(
    plan: &PlanLine,
    old_distance: f64,
    new_distance: f64,
    new_value: f64,
    clamps: &EditClamps,
) -> Result<PlanLine> {
    let deleted = delete_point(plan, old_distance)?;
    insert_point(&deleted, new_distance, new_value, clamps)
}

/// Centered moving-average smoothing restricted to `[start_d, end_d]`
/// (spec §4.6); delegates to the geometry engine's refinement operation.
pub fn smooth_section(plan: &PlanLine, start_d: f64, end_d: f64, window_points: usize) -> Result<PlanLine> {
    local_window_smooth(plan, start_d, end_d, window_points)
}

fn apply_op(plan: &PlanLine, op: &EditOp) -> Result<PlanLine> {
    match op.clone() {
        EditOp::SetStraight { start_d, end_d, start_v, end_v } => set_straight(plan, start_d, end_d, start_v, end_v),
        EditOp::SetCircularArc { start_d, end_d, radius_m, center_v, direction } => {
            set_circular_arc(plan, start_d, end_d, radius_m, center_v, direction)
        }
        EditOp::InsertPoint { distance, value, clamps } => insert_point(plan, distance, value, &clamps),
        EditOp::DeletePoint { distance } => delete_point(plan, distance),
        EditOp::MovePoint { old_distance, new_distance, new_value, clamps } => {
            move_point(plan, old_distance, new_distance, new_value, &clamps)
        }
        EditOp::SmoothSection { start_d, end_d, window_points } => smooth_section(plan, start_d, end_d, window_points),
    }
}

/// Default bound on the number of plan-line versions an editor retains
/// (spec §3 "history is bounded (default 50)").
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// A bounded, linear undo/redo ring over plan-line versions. Applying an
/// edit while the cursor is behind the end discards the redo tail, as with
/// any conventional editor history.
pub struct PlanLineEditor {
    history: Vec<PlanLine>,
    cursor: usize,
    capacity: usize,
}

impl PlanLineEditor {
    pub fn new(initial: PlanLine) -> Self {
        PlanLineEditor::with_capacity(initial, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(initial: PlanLine, capacity: usize) -> Self {
        PlanLineEditor { history: vec![initial], cursor: 0, capacity: capacity.max(1) }
    }

    pub fn current(&self) -> &PlanLine {
        &self.history[self.cursor]
    }

    pub fn apply(&mut self, op: EditOp) -> Result<()> {
        let next = apply_op(self.current(), &op)?;
        self.push(next);
        Ok(())
    }

    fn push(&mut self, plan: PlanLine) {
        self.history.truncate(self.cursor + 1);
        self.history.push(plan);
        self.cursor += 1;
        if self.history.len() > self.capacity {
            self.history.remove(0);
            self.cursor -= 1;
        }
    }

    pub fn undo(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.cursor + 1 < self.history.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }
}
