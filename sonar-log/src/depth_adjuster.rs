//! Depth adjustment between two surveys of the same water
//!
//! The closest pair of positions between a base sequence and an adjustable
//! sequence defines one depth correction, which is then added to every
//! adjustable point.

use crate::primitives::{distance_on_ellipsoid, CoordinatePoint, DepthPointSource, LinearDimension};
use crate::types::{Result, SonarLogError};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Base points handled by one parallel task
const BASE_CHUNK: usize = 64;

/// A task stops searching once it finds a pair this close, in meters
const CLOSE_ENOUGH: f64 = 0.1;

/// The closest base/adjustable pair and the distance between them
#[derive(Debug, Clone, PartialEq)]
pub struct NearestPoints<B, A> {
    pub base: B,
    pub adjustable: A,
    pub distance: LinearDimension,
}

impl<B: DepthPointSource, A: DepthPointSource> NearestPoints<B, A> {
    /// Depth to add to adjustable points so the pair agrees
    pub fn correction(&self) -> LinearDimension {
        self.base.depth() - self.adjustable.depth()
    }
}

/// First point of every distinct position, in input order
pub fn unique_depth_points<P: DepthPointSource>(points: &[P]) -> Vec<&P> {
    let mut seen = HashSet::with_capacity(points.len());
    points
        .iter()
        .filter(|point| seen.insert(point.point()))
        .collect()
}

/// One point per distinct position carrying the mean depth of all points
/// recorded there, in order of first appearance
pub fn unique_depth_points_averaged<P: DepthPointSource>(points: &[P]) -> Vec<P> {
    let mut order: Vec<CoordinatePoint> = Vec::new();
    let mut groups: HashMap<CoordinatePoint, (usize, f64, usize)> = HashMap::new();
    for (index, point) in points.iter().enumerate() {
        let key = point.point();
        let depth = point.depth().meters();
        groups
            .entry(key)
            .and_modify(|(_, sum, count)| {
                *sum += depth;
                *count += 1;
            })
            .or_insert_with(|| {
                order.push(key);
                (index, depth, 1)
            });
    }

    order
        .iter()
        .filter_map(|key| groups.get(key))
        .map(|&(first, sum, count)| {
            points[first].with_depth(LinearDimension::from_meters(sum / count as f64))
        })
        .collect()
}

/// Closest pair inside one chunk of base points
fn local_minimum<B, A>(chunk: &[(usize, &B)], adjustable: &[&A]) -> Option<(usize, usize, f64)>
where
    B: DepthPointSource,
    A: DepthPointSource,
{
    let mut best: Option<(usize, usize, f64)> = None;
    for &(base_index, base) in chunk {
        let base_point = base.point();
        for (adjustable_index, candidate) in adjustable.iter().enumerate() {
            let distance = distance_on_ellipsoid(&base_point, &candidate.point()).meters();
            if best.map_or(true, |(_, _, current)| distance < current) {
                best = Some((base_index, adjustable_index, distance));
                if distance < CLOSE_ENOUGH {
                    return best;
                }
            }
        }
    }
    best
}

/// Find the closest pair between the distinct positions of both sequences.
///
/// Base points are split into fixed chunks searched in parallel. Chunk
/// minima are then reduced in chunk order, so among equally close pairs the
/// first one found in that order wins.
pub fn find_nearest_points<B, A>(base: &[B], adjustable: &[A]) -> Result<NearestPoints<B, A>>
where
    B: DepthPointSource + Clone + Sync,
    A: DepthPointSource + Clone + Sync,
{
    if base.is_empty() {
        return Err(SonarLogError::EmptyInput("base point sequence"));
    }
    if adjustable.is_empty() {
        return Err(SonarLogError::EmptyInput("adjustable point sequence"));
    }

    let unique_base: Vec<(usize, &B)> = unique_depth_points(base).into_iter().enumerate().collect();
    let unique_adjustable = unique_depth_points(adjustable);
    log::debug!(
        "Searching {} base x {} adjustable unique points",
        unique_base.len(),
        unique_adjustable.len()
    );

    let minima: Vec<Option<(usize, usize, f64)>> = unique_base
        .par_chunks(BASE_CHUNK)
        .map(|chunk| local_minimum(chunk, &unique_adjustable))
        .collect();

    let mut best: Option<(usize, usize, f64)> = None;
    for candidate in minima.into_iter().flatten() {
        if best.map_or(true, |(_, _, current)| candidate.2 < current) {
            best = Some(candidate);
        }
    }

    let (base_index, adjustable_index, distance) =
        best.ok_or(SonarLogError::EmptyInput("no point pairs to compare"))?;

    let nearest = NearestPoints {
        base: unique_base[base_index].1.clone(),
        adjustable: unique_adjustable[adjustable_index].clone(),
        distance: LinearDimension::from_meters(distance),
    };
    log::info!(
        "Nearest points {} and {} are {} apart, correction {}",
        nearest.base.point(),
        nearest.adjustable.point(),
        nearest.distance,
        nearest.correction()
    );
    Ok(nearest)
}

/// Adjustable points with the correction applied, yielded one at a time
pub struct AdjustedDepths<'a, B, A> {
    nearest: NearestPoints<B, A>,
    correction: LinearDimension,
    remaining: std::slice::Iter<'a, A>,
}

impl<B, A> AdjustedDepths<'_, B, A> {
    /// The pair the correction was computed from
    pub fn nearest(&self) -> &NearestPoints<B, A> {
        &self.nearest
    }

    pub fn correction(&self) -> LinearDimension {
        self.correction
    }
}

impl<B, A: DepthPointSource> Iterator for AdjustedDepths<'_, B, A> {
    type Item = A;

    fn next(&mut self) -> Option<A> {
        let point = self.remaining.next()?;
        Some(point.with_depth(point.depth() + self.correction))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.remaining.size_hint()
    }
}

impl<B, A: DepthPointSource> ExactSizeIterator for AdjustedDepths<'_, B, A> {}

/// Shift every adjustable depth by the correction of the nearest pair
pub fn adjust_depth<'a, B, A>(base: &[B], adjustable: &'a [A]) -> Result<AdjustedDepths<'a, B, A>>
where
    B: DepthPointSource + Clone + Sync,
    A: DepthPointSource + Clone + Sync,
{
    let nearest = find_nearest_points(base, adjustable)?;
    let correction = nearest.correction();
    Ok(AdjustedDepths {
        nearest,
        correction,
        remaining: adjustable.iter(),
    })
}
