//! `nav-geometry` — polyline math and indexed route lines.
//!
//! # Crate layout
//!
//! | Module   | Contents                                                        |
//! |----------|-----------------------------------------------------------------|
//! | [`math`] | pure functions: `project_onto_line`, `slice`, `length`, `bearing` |
//! | [`line`] | `RouteLine` — cumulative distances + segment R-tree             |
//!
//! Nothing in this crate holds state between calls or reads configuration;
//! every function is safe to call from the per-fix hot path.

pub mod line;
pub mod math;


pub use line::RouteLine;
pub use math::{bearing, length, point_at, project, project_onto_line, slice, Projection};
