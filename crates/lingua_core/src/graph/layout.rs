//! Seeded force-directed layout.
//!
//! Fruchterman-Reingold over the neighborhood graph. Initial positions come
//! from a `StdRng` seeded with `LayoutConfig::seed` and nodes are visited in
//! id order, so a fixed node/edge set always lands on the same coordinates.

use crate::graph::neighborhood::NeighborhoodGraph;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

const MIN_DISTANCE: f64 = 0.01;

/// Canvas and simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub width: u32,
    pub height: u32,
    /// Padding kept free around the canvas edge.
    pub margin: f64,
    pub seed: u64,
    pub iterations: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            margin: 48.0,
            seed: 42,
            iterations: 200,
        }
    }
}

/// Canvas coordinate in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Computes one position per node.
pub fn force_layout(graph: &NeighborhoodGraph, config: &LayoutConfig) -> BTreeMap<String, Point> {
    let ids: Vec<&String> = graph.nodes.keys().collect();
    let width = f64::from(config.width);
    let height = f64::from(config.height);
    let margin = config.margin.min(width / 4.0).min(height / 4.0);
    let center = Point {
        x: width / 2.0,
        y: height / 2.0,
    };

    match ids.len() {
        0 => return BTreeMap::new(),
        1 => return BTreeMap::from([(ids[0].clone(), center)]),
        _ => {}
    }

    let index_of: BTreeMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(index, id)| (id.as_str(), index))
        .collect();
    let springs: Vec<(usize, usize)> = graph
        .edges
        .iter()
        .filter_map(|edge| {
            let from = *index_of.get(edge.from.as_str())?;
            let to = *index_of.get(edge.to.as_str())?;
            (from != to).then_some((from, to))
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut positions: Vec<Point> = ids
        .iter()
        .map(|_| Point {
            x: rng.gen_range(margin..=width - margin),
            y: rng.gen_range(margin..=height - margin),
        })
        .collect();

    let area = (width - 2.0 * margin) * (height - 2.0 * margin);
    let k = (area / ids.len() as f64).sqrt();
    let initial_temperature = (width - 2.0 * margin) / 10.0;
    let iterations = config.iterations.max(1);

    for step in 0..iterations {
        let temperature = initial_temperature * (1.0 - f64::from(step) / f64::from(iterations));
        let mut shift = vec![Point { x: 0.0, y: 0.0 }; positions.len()];

        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let dx = positions[i].x - positions[j].x;
                let dy = positions[i].y - positions[j].y;
                let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let force = k * k / distance;
                let (fx, fy) = (dx / distance * force, dy / distance * force);
                shift[i].x += fx;
                shift[i].y += fy;
                shift[j].x -= fx;
                shift[j].y -= fy;
            }
        }

        for &(from, to) in &springs {
            let dx = positions[from].x - positions[to].x;
            let dy = positions[from].y - positions[to].y;
            let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
            let force = distance * distance / k;
            let (fx, fy) = (dx / distance * force, dy / distance * force);
            shift[from].x -= fx;
            shift[from].y -= fy;
            shift[to].x += fx;
            shift[to].y += fy;
        }

        for (position, delta) in positions.iter_mut().zip(&shift) {
            let length = (delta.x * delta.x + delta.y * delta.y).sqrt().max(MIN_DISTANCE);
            let capped = length.min(temperature);
            position.x = (position.x + delta.x / length * capped).clamp(margin, width - margin);
            position.y = (position.y + delta.y / length * capped).clamp(margin, height - margin);
        }
    }

    ids.into_iter().cloned().zip(positions).collect()
}
