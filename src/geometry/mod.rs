//! Geometry engine (component D): versines, eccentric-versine conversion,
//! zero-crossing detection, and plan-line generation/refinement.

pub mod plan_line;
pub mod versine;
pub mod zero_crossing;

pub use plan_line::{
    clamp_outliers, cubic_spline_fit, gaussian_smooth, generate_convex_upward, generate_plan_line,
    generate_zero_point, iterative_smooth, local_window_smooth, PlanLine, PlanLineMode,
};
pub use versine::{
    characteristic, characteristics, convert_versine, eccentric_versine, versine, Characteristic, VersineMode,
    CHORD_PRESETS_M,
};
pub use zero_crossing::{zero_crossings, CrossingType, ZeroCrossing, ZeroCrossingConfig};
