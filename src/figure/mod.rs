//! Figure side of the dashboard: layer composition and SVG rendering
//!
//! [`compose`] turns grids, point subsets and outline geometry into
//! composite figures according to the configured layer entries; [`svg`]
//! renders a composite figure into a hover-inspectable SVG document.

pub mod compose;
pub mod svg;

pub use compose::{Composer, DataLayer, Figure, Viewport};
