//! `nav-directions` — HTTP adapters for the collaborator ports.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`client`]   | `MapboxDirections`, `MapboxMapMatching`, `MapboxConfig`    |
//! | [`response`] | Wire types, `parse_directions`, `parse_matching`           |
//!
//! Failures never escape as transport errors: everything maps into
//! `nav_route::DirectionsError` or `nav_route::SnapError`.
//!
//! ```rust,ignore
//! let config = MapboxConfig::new(std::env::var("MAPBOX_TOKEN")?);
//! let directions = Arc::new(MapboxDirections::new(config.clone())?);
//! let snapper = Arc::new(MapboxMapMatching::new(config)?);
//! let (handle, task) = SessionBuilder::new(NavConfig::default(), trip, directions)
//!     .snapper(snapper)
//!     .spawn(NoopObserver)?;
//! ```

pub mod client;
pub mod response;

#[cfg(test)]
mod tests;

pub use client::{MapboxConfig, MapboxDirections, MapboxMapMatching, coordinate_path, directions_query};
pub use response::{parse_directions, parse_matching};
