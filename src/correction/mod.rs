//! Correction & quality (component E): movement computation, caps, MTT
//! chord-induced correction, and quality statistics.

pub mod caps;
pub mod movement;
pub mod mtt;
pub mod quality;

pub use caps::{apply_caps, Caps, MovementLimits, SectionOverride};
pub use movement::{apply_fixed_points, movement, raw_movement};
pub use mtt::{apply_mtt_correction, MttAxis, MttConfig, MttIterationConfig};
pub use quality::{quality, Grade, QualityReport, SectionQuality, WavebandQuality, WAVEBANDS};
