//! Rasterization and vector export of a laid-out neighborhood.
//!
//! # Responsibility
//! - Turn a `NeighborhoodGraph` into a single static image.
//! - Distinguish the focal node from its neighbors by fixed colors.
//! - Draw every edge with an arrowhead at its target.
//!
//! # Invariants
//! - Rendering is a pure function of graph and config; repeated calls on the
//!   same input produce identical bytes.

use crate::graph::layout::{force_layout, LayoutConfig, Point};
use crate::graph::neighborhood::NeighborhoodGraph;
use image::{ImageOutputFormat, Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter, Write as _};
use std::io::Cursor;

const NODE_RADIUS: f64 = 18.0;
const ARROW_LENGTH: f64 = 12.0;
const ARROW_HALF_WIDTH: f64 = 5.0;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const EDGE_COLOR: Rgba<u8> = Rgba([100, 116, 139, 255]);
const FOCAL_COLOR: Rgba<u8> = Rgba([22, 163, 74, 255]);
const NEIGHBOR_COLOR: Rgba<u8> = Rgba([96, 165, 250, 255]);

const FOCAL_HEX: &str = "#16a34a";
const NEIGHBOR_HEX: &str = "#60a5fa";
const EDGE_HEX: &str = "#64748b";

/// Rendering failure.
#[derive(Debug)]
pub enum RenderError {
    /// The image backend failed to encode the raster.
    Encode(image::ImageError),
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode neighborhood image: {err}"),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<image::ImageError> for RenderError {
    fn from(value: image::ImageError) -> Self {
        Self::Encode(value)
    }
}

/// Encoded image plus its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Layout + rendering collaborator.
pub trait GraphRenderer {
    fn render(&self, graph: &NeighborhoodGraph) -> Result<RenderedImage, RenderError>;
}

/// PNG raster renderer backed by the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct PngRenderer {
    pub layout: LayoutConfig,
}

impl PngRenderer {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }
}

impl GraphRenderer for PngRenderer {
    fn render(&self, graph: &NeighborhoodGraph) -> Result<RenderedImage, RenderError> {
        let positions = force_layout(graph, &self.layout);
        let canvas = rasterize(graph, &positions, &self.layout);
        let mut bytes = Vec::new();
        canvas.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
        Ok(RenderedImage {
            media_type: "image/png",
            bytes,
        })
    }
}

/// SVG renderer; unlike the raster it also carries term labels.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    pub layout: LayoutConfig,
}

impl SvgRenderer {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }
}

impl GraphRenderer for SvgRenderer {
    fn render(&self, graph: &NeighborhoodGraph) -> Result<RenderedImage, RenderError> {
        let positions = force_layout(graph, &self.layout);
        Ok(RenderedImage {
            media_type: "image/svg+xml",
            bytes: render_svg(graph, &positions, &self.layout).into_bytes(),
        })
    }
}

/// Draws nodes and arrowed edges onto a fresh canvas.
pub fn rasterize(
    graph: &NeighborhoodGraph,
    positions: &BTreeMap<String, Point>,
    config: &LayoutConfig,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(config.width, config.height, BACKGROUND);

    for edge in &graph.edges {
        let (Some(from), Some(to)) = (positions.get(&edge.from), positions.get(&edge.to)) else {
            continue;
        };
        let Some((start, end)) = trimmed_segment(*from, *to) else {
            continue;
        };
        let base = back_off(start, end, ARROW_LENGTH);
        draw_line(&mut canvas, start, base, EDGE_COLOR);
        let (left, right) = arrow_wings(start, end);
        fill_triangle(&mut canvas, end, left, right, EDGE_COLOR);
    }

    for (id, node) in &graph.nodes {
        if let Some(center) = positions.get(id) {
            let color = if node.is_focal {
                FOCAL_COLOR
            } else {
                NEIGHBOR_COLOR
            };
            fill_circle(&mut canvas, *center, NODE_RADIUS, color);
        }
    }

    canvas
}

/// Produces a standalone SVG document.
pub fn render_svg(
    graph: &NeighborhoodGraph,
    positions: &BTreeMap<String, Point>,
    config: &LayoutConfig,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = config.width,
        h = config.height
    );
    let _ = writeln!(
        out,
        r#"  <defs><marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse"><path d="M 0 0 L 10 5 L 0 10 z" fill="{EDGE_HEX}"/></marker></defs>"#
    );
    let _ = writeln!(out, r#"  <rect width="100%" height="100%" fill="white"/>"#);

    for edge in &graph.edges {
        let (Some(from), Some(to)) = (positions.get(&edge.from), positions.get(&edge.to)) else {
            continue;
        };
        let Some((start, end)) = trimmed_segment(*from, *to) else {
            continue;
        };
        let _ = writeln!(
            out,
            r#"  <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{EDGE_HEX}" stroke-width="1.5" marker-end="url(#arrow)"/>"#,
            start.x, start.y, end.x, end.y
        );
    }

    for (id, node) in &graph.nodes {
        let Some(center) = positions.get(id) else {
            continue;
        };
        let fill = if node.is_focal { FOCAL_HEX } else { NEIGHBOR_HEX };
        let _ = writeln!(
            out,
            r#"  <circle cx="{:.1}" cy="{:.1}" r="{NODE_RADIUS}" fill="{fill}"/>"#,
            center.x, center.y
        );
        let _ = writeln!(
            out,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="12">{}</text>"#,
            center.x,
            center.y + NODE_RADIUS + 14.0,
            escape_xml(&node.label)
        );
    }

    out.push_str("</svg>\n");
    out
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Shortens a center-to-center segment so it starts and ends on node rims.
fn trimmed_segment(from: Point, to: Point) -> Option<(Point, Point)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length <= 2.0 * NODE_RADIUS {
        return None;
    }
    let (ux, uy) = (dx / length, dy / length);
    Some((
        Point {
            x: from.x + ux * NODE_RADIUS,
            y: from.y + uy * NODE_RADIUS,
        },
        Point {
            x: to.x - ux * NODE_RADIUS,
            y: to.y - uy * NODE_RADIUS,
        },
    ))
}

fn back_off(start: Point, end: Point, distance: f64) -> Point {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
    let keep = (length - distance).max(0.0) / length;
    Point {
        x: start.x + dx * keep,
        y: start.y + dy * keep,
    }
}

fn arrow_wings(start: Point, tip: Point) -> (Point, Point) {
    let base = back_off(start, tip, ARROW_LENGTH);
    let dx = tip.x - start.x;
    let dy = tip.y - start.y;
    let length = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
    let (nx, ny) = (-dy / length, dx / length);
    (
        Point {
            x: base.x + nx * ARROW_HALF_WIDTH,
            y: base.y + ny * ARROW_HALF_WIDTH,
        },
        Point {
            x: base.x - nx * ARROW_HALF_WIDTH,
            y: base.y - ny * ARROW_HALF_WIDTH,
        },
    )
}

fn put(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

/// Two-pixel-wide Bresenham line.
fn draw_line(canvas: &mut RgbaImage, from: Point, to: Point, color: Rgba<u8>) {
    let (mut x0, mut y0) = (from.x.round() as i64, from.y.round() as i64);
    let (x1, y1) = (to.x.round() as i64, to.y.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put(canvas, x0, y0, color);
        if dx >= -dy {
            put(canvas, x0, y0 + 1, color);
        } else {
            put(canvas, x0 + 1, y0, color);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x0 += sx;
        }
        if doubled <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn fill_circle(canvas: &mut RgbaImage, center: Point, radius: f64, color: Rgba<u8>) {
    let min_x = (center.x - radius).floor() as i64;
    let max_x = (center.x + radius).ceil() as i64;
    let min_y = (center.y - radius).floor() as i64;
    let max_y = (center.y + radius).ceil() as i64;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f64 - center.x;
            let dy = y as f64 - center.y;
            if dx * dx + dy * dy <= radius * radius {
                put(canvas, x, y, color);
            }
        }
    }
}

fn fill_triangle(canvas: &mut RgbaImage, a: Point, b: Point, c: Point, color: Rgba<u8>) {
    let edge = |p: Point, q: Point, x: f64, y: f64| (q.x - p.x) * (y - p.y) - (q.y - p.y) * (x - p.x);
    let min_x = a.x.min(b.x).min(c.x).floor() as i64;
    let max_x = a.x.max(b.x).max(c.x).ceil() as i64;
    let min_y = a.y.min(b.y).min(c.y).floor() as i64;
    let max_y = a.y.max(b.y).max(c.y).ceil() as i64;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let (px, py) = (x as f64, y as f64);
            let w0 = edge(b, c, px, py);
            let w1 = edge(c, a, px, py);
            let w2 = edge(a, b, px, py);
            let inside = (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0) || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
            if inside {
                put(canvas, x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{rasterize, render_svg, FOCAL_COLOR, NEIGHBOR_COLOR};
    use crate::graph::layout::{LayoutConfig, Point};
    use crate::graph::neighborhood::{NeighborhoodGraph, NeighborhoodNode};
    use std::collections::BTreeMap;

    fn pair() -> (NeighborhoodGraph, BTreeMap<String, Point>) {
        let mut graph = NeighborhoodGraph::default();
        graph.nodes.insert(
            "1.1".to_string(),
            NeighborhoodNode {
                label: "foo <&>".to_string(),
                is_focal: true,
            },
        );
        graph.nodes.insert(
            "1.2".to_string(),
            NeighborhoodNode {
                label: "bar".to_string(),
                is_focal: false,
            },
        );
        let positions = BTreeMap::from([
            ("1.1".to_string(), Point { x: 100.0, y: 100.0 }),
            ("1.2".to_string(), Point { x: 300.0, y: 100.0 }),
        ]);
        (graph, positions)
    }

    #[test]
    fn raster_colors_focal_and_neighbor_differently() {
        let (graph, positions) = pair();
        let canvas = rasterize(&graph, &positions, &LayoutConfig::default());
        assert_eq!(*canvas.get_pixel(100, 100), FOCAL_COLOR);
        assert_eq!(*canvas.get_pixel(300, 100), NEIGHBOR_COLOR);
    }

    #[test]
    fn svg_escapes_labels() {
        let (graph, positions) = pair();
        let svg = render_svg(&graph, &positions, &LayoutConfig::default());
        assert!(svg.contains("foo &lt;&amp;&gt;"));
        assert!(svg.starts_with("<svg"));
    }
}
