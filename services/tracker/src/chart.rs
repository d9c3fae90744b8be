//! Pie chart rendering for the spending summary
//!
//! Slices start at twelve o'clock and run counter-clockwise. The chart is
//! rasterised with plotters into an RGB buffer and encoded as PNG.

use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ExtendedColorType, ImageEncoder, codecs::png::PngEncoder};
use plotters::prelude::*;
use plotters::style::FontStyle;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;
use tracing::{info, warn};

use crate::summary::{ExpenseSummary, format_percent};

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 480;
const RADIUS: f64 = 170.0;
const START_ANGLE: f64 = 90.0;
const FONT_FAMILY: &str = "sans-serif";

const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("No expenses to chart")]
    Empty,

    #[error("Drawing failed: {0}")]
    Draw(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn draw_failed<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Draw(err.to_string())
}

/// Geometry of one pie slice, angles in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub percent: f64,
    pub start: f64,
    pub sweep: f64,
}

impl Slice {
    fn mid_angle(&self) -> f64 {
        self.start + self.sweep / 2.0
    }
}

/// Lay out one slice per category, sized by its share of the total
pub fn layout_slices(summary: &ExpenseSummary) -> Vec<Slice> {
    let mut start = START_ANGLE;
    summary
        .by_category
        .iter()
        .map(|total| {
            let percent = summary.percent_of_total(total.amount);
            let sweep = 360.0 * percent / 100.0;
            let slice = Slice {
                label: total.category.clone(),
                percent,
                start,
                sweep,
            };
            start += sweep;
            slice
        })
        .collect()
}

fn point_at(center: (f64, f64), radius: f64, degrees: f64) -> (i32, i32) {
    let theta = degrees.to_radians();
    (
        (center.0 + radius * theta.cos()).round() as i32,
        (center.1 - radius * theta.sin()).round() as i32,
    )
}

fn wedge(center: (f64, f64), radius: f64, slice: &Slice) -> Vec<(i32, i32)> {
    let steps = slice.sweep.ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push((center.0.round() as i32, center.1.round() as i32));
    for step in 0..=steps {
        let angle = slice.start + slice.sweep * step as f64 / steps as f64;
        points.push(point_at(center, radius, angle));
    }
    points
}

/// Renders summary pie charts
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    labels: bool,
}

impl ChartRenderer {
    /// Renderer that draws slices only, leaving labels to the page
    pub fn without_labels() -> Self {
        Self { labels: false }
    }

    /// Load a TrueType font for in-chart labels.
    ///
    /// Falls back to an unlabelled chart when the font cannot be used.
    pub fn with_font_file(path: &Path) -> Self {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    "Chart font {} unavailable ({}), labels disabled",
                    path.display(),
                    e
                );
                return Self::without_labels();
            }
        };

        // plotters keeps registered fonts for the life of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                info!("Chart font loaded from {}", path.display());
                Self { labels: true }
            }
            Err(_) => {
                warn!("Chart font {} is not a usable font, labels disabled", path.display());
                Self::without_labels()
            }
        }
    }

    /// Render the summary as a PNG image
    pub fn render_png(&self, summary: &ExpenseSummary) -> Result<Vec<u8>, ChartError> {
        if summary.is_empty() {
            return Err(ChartError::Empty);
        }

        let slices = layout_slices(summary);
        let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_failed)?;

            let center = (WIDTH as f64 / 2.0, HEIGHT as f64 / 2.0);
            for (index, slice) in slices.iter().enumerate() {
                let color = PALETTE[index % PALETTE.len()];
                root.draw(&Polygon::new(wedge(center, RADIUS, slice), color.filled()))
                    .map_err(draw_failed)?;
            }

            if self.labels {
                for slice in &slices {
                    let mid = slice.mid_angle();
                    let outside = if mid.to_radians().cos() >= 0.0 {
                        HPos::Left
                    } else {
                        HPos::Right
                    };

                    let name_style = (FONT_FAMILY, 16)
                        .into_font()
                        .color(&BLACK)
                        .pos(Pos::new(outside, VPos::Center));
                    root.draw(&Text::new(
                        slice.label.clone(),
                        point_at(center, RADIUS * 1.1, mid),
                        name_style,
                    ))
                    .map_err(draw_failed)?;

                    let percent_style = (FONT_FAMILY, 14)
                        .into_font()
                        .color(&BLACK)
                        .pos(Pos::new(HPos::Center, VPos::Center));
                    root.draw(&Text::new(
                        format_percent(slice.percent),
                        point_at(center, RADIUS * 0.6, mid),
                        percent_style,
                    ))
                    .map_err(draw_failed)?;
                }
            }

            root.present().map_err(draw_failed)?;
        }

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(&buffer, WIDTH, HEIGHT, ExtendedColorType::Rgb8)?;
        Ok(png)
    }

    /// Render the summary as base64 PNG data for an inline `<img>`
    pub fn render_base64(&self, summary: &ExpenseSummary) -> Result<String, ChartError> {
        let png = self.render_png(summary)?;
        Ok(STANDARD.encode(png))
    }
}
