use std::io::Cursor;

use anyhow::{Context, Result};
use image::{ImageFormat, Rgb, RgbImage};

use crate::report::ChartSpec;

const WIDTH: u32 = 1200;
const MARGIN: u32 = 24;
const BAR_HEIGHT: u32 = 22;
const BAR_GAP: u32 = 8;
const MIN_HEIGHT: u32 = 120;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([225, 228, 232]);
const BAR: Rgb<u8> = Rgb([76, 114, 176]);

/// Turns a ranked chart into image bytes. `PngBarChart` draws bars only; the
/// chart title and bar labels stay with the caller (storage key, CSV).
pub trait ChartRenderer {
    fn render(&self, chart: &ChartSpec) -> Result<Vec<u8>>;
    fn content_type(&self) -> &'static str;
}

/// Horizontal bars, first bar on top, bar length proportional to probability
/// on a fixed 0..1 axis with gridlines every 10%.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngBarChart;

impl PngBarChart {
    pub fn dimensions(bars: usize) -> (u32, u32) {
        let rows = u32::try_from(bars).unwrap_or(u32::MAX / (BAR_HEIGHT + BAR_GAP));
        let height = 2 * MARGIN + rows.saturating_mul(BAR_HEIGHT + BAR_GAP);
        (WIDTH, height.max(MIN_HEIGHT))
    }

    fn draw(chart: &ChartSpec) -> RgbImage {
        let (width, height) = Self::dimensions(chart.bars.len());
        let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
        let plot_width = width - 2 * MARGIN;

        for step in 0..=10 {
            let x = MARGIN + plot_width * step / 10;
            let x = x.min(width - 1);
            for y in MARGIN / 2..height - MARGIN / 2 {
                img.put_pixel(x, y, GRID);
            }
        }

        for (idx, bar) in chart.bars.iter().enumerate() {
            let top = MARGIN + idx as u32 * (BAR_HEIGHT + BAR_GAP);
            let len = (bar.probability.clamp(0.0, 1.0) * plot_width as f64).round() as u32;
            for y in top..(top + BAR_HEIGHT).min(height) {
                for x in MARGIN..MARGIN + len {
                    img.put_pixel(x, y, BAR);
                }
            }
        }
        img
    }
}

impl ChartRenderer for PngBarChart {
    fn render(&self, chart: &ChartSpec) -> Result<Vec<u8>> {
        let img = Self::draw(chart);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .with_context(|| format!("encode chart {}", chart.key))?;
        Ok(bytes)
    }

    fn content_type(&self) -> &'static str {
        crate::storage::PNG_CONTENT_TYPE
    }
}
