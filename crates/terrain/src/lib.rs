//! Terrain raster: named layers of samples painted with rectangular brushes.
//!
//! # Invariants
//! - Every layer has exactly `width * height` samples, row-major.
//! - Region capture and restore never touch cells outside the region.

pub mod raster;

pub use raster::{TerrainConfig, TerrainError, TerrainRaster};
