/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Low-resolution preview rendering for map thumbnails.
//!
//! Draws the persisted document into a fixed 256x192 raster — edges as lines
//! between node centers, nodes as filled color chips — and encodes PNG bytes.
//! Callers treat failures as non-fatal: a save proceeds without its preview.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use crate::persistence::types::{MapDocument, PersistedColor, PersistedNode};

pub const PREVIEW_WIDTH: u32 = 256;
pub const PREVIEW_HEIGHT: u32 = 192;

/// Logical node box used for preview framing; matches the layout grid.
const NODE_BOX_WIDTH: f32 = 150.0;
const NODE_BOX_HEIGHT: f32 = 50.0;
const MARGIN: f32 = 8.0;

const CANVAS_BACKGROUND: Rgba<u8> = Rgba([249, 250, 251, 255]);
const EDGE_COLOR: Rgba<u8> = Rgba([156, 163, 175, 255]);
const NODE_BORDER: Rgba<u8> = Rgba([229, 231, 235, 255]);

/// Errors from preview rendering
#[derive(Debug)]
pub enum PreviewError {
    Encode(String),
}

impl std::fmt::Display for PreviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreviewError::Encode(e) => write!(f, "PNG encode error: {e}"),
        }
    }
}

impl std::error::Error for PreviewError {}

fn chip_fill(color: PersistedColor) -> Rgba<u8> {
    match color {
        PersistedColor::None => Rgba([255, 255, 255, 255]),
        PersistedColor::Red => Rgba([239, 68, 68, 255]),
        PersistedColor::Orange => Rgba([251, 146, 60, 255]),
        PersistedColor::Blue => Rgba([59, 130, 246, 255]),
        PersistedColor::Green => Rgba([34, 197, 94, 255]),
        PersistedColor::Purple => Rgba([168, 85, 247, 255]),
    }
}

struct Projection {
    offset_x: f32,
    offset_y: f32,
    scale: f32,
}

impl Projection {
    fn for_nodes(nodes: &[PersistedNode]) -> Self {
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for node in nodes {
            min_x = min_x.min(node.position.x);
            min_y = min_y.min(node.position.y);
            max_x = max_x.max(node.position.x + NODE_BOX_WIDTH);
            max_y = max_y.max(node.position.y + NODE_BOX_HEIGHT);
        }

        let span_x = (max_x - min_x).max(1.0);
        let span_y = (max_y - min_y).max(1.0);
        let scale_x = (PREVIEW_WIDTH as f32 - 2.0 * MARGIN) / span_x;
        let scale_y = (PREVIEW_HEIGHT as f32 - 2.0 * MARGIN) / span_y;
        let scale = scale_x.min(scale_y).min(1.0);

        // Center the scaled content inside the frame.
        let offset_x = (PREVIEW_WIDTH as f32 - span_x * scale) / 2.0 - min_x * scale;
        let offset_y = (PREVIEW_HEIGHT as f32 - span_y * scale) / 2.0 - min_y * scale;
        Self {
            offset_x,
            offset_y,
            scale,
        }
    }

    fn project(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }
}

fn put_pixel_clipped(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

/// Plot a straight line with a simple DDA walk; preview fidelity does not
/// warrant an anti-aliased rasterizer.
fn draw_line(canvas: &mut RgbaImage, from: (f32, f32), to: (f32, f32), color: Rgba<u8>) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = (from.0 + dx * t).round() as i64;
        let y = (from.1 + dy * t).round() as i64;
        put_pixel_clipped(canvas, x, y, color);
    }
}

fn fill_rect(canvas: &mut RgbaImage, left: f32, top: f32, width: f32, height: f32, fill: Rgba<u8>) {
    let left = left.floor() as i64;
    let top = top.floor() as i64;
    let right = left + (width.ceil() as i64).max(1);
    let bottom = top + (height.ceil() as i64).max(1);
    for y in top..bottom {
        for x in left..right {
            put_pixel_clipped(canvas, x, y, fill);
        }
    }
}

fn stroke_rect(canvas: &mut RgbaImage, left: f32, top: f32, width: f32, height: f32, color: Rgba<u8>) {
    let right = left + width.max(1.0);
    let bottom = top + height.max(1.0);
    draw_line(canvas, (left, top), (right, top), color);
    draw_line(canvas, (right, top), (right, bottom), color);
    draw_line(canvas, (right, bottom), (left, bottom), color);
    draw_line(canvas, (left, bottom), (left, top), color);
}

/// Render a low-resolution canvas preview of the document as PNG bytes.
pub fn render_map_preview(document: &MapDocument) -> Result<Vec<u8>, PreviewError> {
    let mut canvas = RgbaImage::from_pixel(PREVIEW_WIDTH, PREVIEW_HEIGHT, CANVAS_BACKGROUND);

    if !document.nodes.is_empty() {
        let projection = Projection::for_nodes(&document.nodes);
        let center_of = |id: &str| {
            document.nodes.iter().find(|node| node.id == id).map(|node| {
                projection.project(
                    node.position.x + NODE_BOX_WIDTH / 2.0,
                    node.position.y + NODE_BOX_HEIGHT / 2.0,
                )
            })
        };

        // Edges underneath, nodes on top. Dangling edges are skipped, never
        // an error.
        for edge in &document.edges {
            let (Some(from), Some(to)) = (center_of(&edge.source), center_of(&edge.target)) else {
                continue;
            };
            draw_line(&mut canvas, from, to, EDGE_COLOR);
        }

        for node in &document.nodes {
            let (left, top) = projection.project(node.position.x, node.position.y);
            let width = NODE_BOX_WIDTH * projection.scale;
            let height = NODE_BOX_HEIGHT * projection.scale;
            fill_rect(&mut canvas, left, top, width, height, chip_fill(node.data.color));
            stroke_rect(&mut canvas, left, top, width, height, NODE_BORDER);
        }
    }

    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| PreviewError::Encode(format!("{e}")))?;
    Ok(cursor.into_inner())
}
