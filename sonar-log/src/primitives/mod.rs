//! Unit-safe primitives: lengths and geographic positions

mod coordinate;
mod linear;

pub use coordinate::{
    distance_haversine, distance_on_ellipsoid, distance_on_flat, CoordinatePoint,
    EQUATORIAL_RADIUS, MEAN_RADIUS, POLAR_RADIUS,
};
pub use linear::{LinearDimension, LinearUnit};

/// A record carrying a position and a depth below it
pub trait DepthPointSource: Sized {
    fn point(&self) -> CoordinatePoint;

    fn depth(&self) -> LinearDimension;

    /// Copy of this record with a different depth
    fn with_depth(&self, depth: LinearDimension) -> Self;
}
