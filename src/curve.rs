//! Curve and work-section data model (spec §3). These are descriptive
//! entities the geometry/correction engine consults as context; they carry
//! no behavior of their own beyond validation.

use crate::error::{Diagnostics, Result, TrackGeomError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CurveKind {
    Straight,
    Transition,
    Circular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Left,
    Right,
}

/// One segment of the line's horizontal alignment, keyed by kilometer post.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CurveSpec {
    pub start_kp: f64,
    pub end_kp: f64,
    pub kind: CurveKind,
    pub radius_m: Option<f64>,
    pub cant_mm: Option<f64>,
    pub direction: Direction,
    pub label: Option<String>,
}

impl CurveSpec {
    pub fn new(
        start_kp: f64,
        end_kp: f64,
        kind: CurveKind,
        radius_m: Option<f64>,
        cant_mm: Option<f64>,
        direction: Direction,
        label: Option<String>,
    ) -> Result<Self> {
        if !(end_kp > start_kp) {
            return Err(TrackGeomError::InvalidParams {
                reason: format!("curve end_kp {end_kp} must exceed start_kp {start_kp}"),
            });
        }
        if kind == CurveKind::Circular && radius_m.is_none() {
            return Err(TrackGeomError::InvalidParams { reason: "circular curve requires a radius".into() });
        }
        Ok(CurveSpec { start_kp, end_kp, kind, radius_m, cant_mm, direction, label })
    }
}

/// Validate that `curves`, sorted by `start_kp`, cover a monotone,
/// non-overlapping KP range (spec §3 CurveSpec invariant).
pub fn validate_curve_sequence(curves: &[CurveSpec]) -> Result<()> {
    let mut sorted: Vec<&CurveSpec> = curves.iter().collect();
    sorted.sort_by(|a, b| a.start_kp.partial_cmp(&b.start_kp).unwrap());
    for w in sorted.windows(2) {
        if w[1].start_kp < w[0].end_kp {
            return Err(TrackGeomError::IncompatibleConstraints {
                reason: format!(
                    "curve [{}, {}) overlaps curve [{}, {})",
                    w[0].start_kp, w[0].end_kp, w[1].start_kp, w[1].end_kp
                ),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TrackDirection {
    Up,
    Down,
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WorkDirection {
    Forward,
    Backward,
}

/// A scheduled tamping run's scope. Buffers shorter than 500 m are
/// permitted but flagged as a warning, not rejected (spec §3).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WorkSection {
    pub line: String,
    pub direction: TrackDirection,
    pub work_direction: WorkDirection,
    pub start_pos: f64,
    pub end_pos: f64,
    pub buffer_before: f64,
    pub buffer_after: f64,
}

const MIN_RECOMMENDED_BUFFER_M: f64 = 500.0;

impl WorkSection {
    pub fn new(
        line: impl Into<String>,
        direction: TrackDirection,
        work_direction: WorkDirection,
        start_pos: f64,
        end_pos: f64,
        buffer_before: f64,
        buffer_after: f64,
    ) -> Result<(Self, Diagnostics)> {
        if !(end_pos > start_pos) {
            return Err(TrackGeomError::InvalidParams {
                reason: format!("work section end_pos {end_pos} must exceed start_pos {start_pos}"),
            });
        }

        let mut diagnostics = Diagnostics::new();
        if buffer_before < MIN_RECOMMENDED_BUFFER_M {
            diagnostics.push("SHORT_BUFFER_BEFORE", format!("buffer_before {buffer_before} m is below the recommended {MIN_RECOMMENDED_BUFFER_M} m"));
        }
        if buffer_after < MIN_RECOMMENDED_BUFFER_M {
            diagnostics.push("SHORT_BUFFER_AFTER", format!("buffer_after {buffer_after} m is below the recommended {MIN_RECOMMENDED_BUFFER_M} m"));
        }

        Ok((
            WorkSection {
                line: line.into(),
                direction,
                work_direction,
                start_pos,
                end_pos,
                buffer_before,
                buffer_after,
            },
            diagnostics,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_spec_rejects_non_positive_span() {
        assert!(CurveSpec::new(10.0, 10.0, CurveKind::Straight, None, None, Direction::Left, None).is_err());
    }

    #[test]
    fn circular_curve_requires_radius() {
        assert!(CurveSpec::new(0.0, 100.0, CurveKind::Circular, None, None, Direction::Left, None).is_err());
        assert!(CurveSpec::new(0.0, 100.0, CurveKind::Circular, Some(500.0), None, Direction::Left, None).is_ok());
    }

    #[test]
    fn overlapping_curves_are_rejected() {
        let a = CurveSpec::new(0.0, 100.0, CurveKind::Straight, None, None, Direction::Left, None).unwrap();
        let b = CurveSpec::new(50.0, 150.0, CurveKind::Straight, None, None, Direction::Left, None).unwrap();
        assert!(matches!(validate_curve_sequence(&[a, b]), Err(TrackGeomError::IncompatibleConstraints { .. })));
    }

    #[test]
    fn adjacent_non_overlapping_curves_are_accepted() {
        let a = CurveSpec::new(0.0, 100.0, CurveKind::Straight, None, None, Direction::Left, None).unwrap();
        let b = CurveSpec::new(100.0, 200.0, CurveKind::Transition, None, None, Direction::Left, None).unwrap();
        assert!(validate_curve_sequence(&[a, b]).is_ok());
    }

    #[test]
    fn short_buffers_warn_but_do_not_fail() {
        let (_, diagnostics) =
            WorkSection::new("main", TrackDirection::Up, WorkDirection::Forward, 0.0, 1000.0, 100.0, 100.0).unwrap();
        assert_eq!(diagnostics.warnings.len(), 2);
    }

    #[test]
    fn work_section_rejects_non_positive_span() {
        assert!(WorkSection::new("main", TrackDirection::Up, WorkDirection::Forward, 100.0, 100.0, 600.0, 600.0).is_err());
    }
}
