//! Data side of the dashboard: tables, grids, points, projection, styling
//!
//! Module organization:
//! - [`error`] - error types and result alias
//! - [`schema`] - column names and code semantics of the two input tables
//! - [`loader`] - Latin-1 `;`-separated CSV loading with schema validation
//! - [`grid`] - sparse table to dense coordinate-indexed grid
//! - [`points`] - non-zero-result point subsets per test variant
//! - [`projection`] - rotated-pole coordinate transform
//! - [`palettes`] - embedded palette registry and the code color scale
//! - [`boundaries`] - country-outline reference geometry

pub mod boundaries;
pub mod error;
pub mod grid;
pub mod loader;
pub mod palettes;
pub mod points;
pub mod projection;
pub mod schema;

pub use boundaries::OutlineSet;
pub use error::{Result, TelecError};
pub use grid::{CorrelationGrid, DuplicatePolicy};
pub use loader::{CorrelationTable, NonStationarityTable};
pub use palettes::{CodeScale, PALETTE_REGISTRY};
pub use points::PointSet;
pub use projection::RotatedPole;
pub use schema::TestVariant;
