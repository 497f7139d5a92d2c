pub mod colormap;
pub mod text;

use geo::{Coord, LineString, MultiPolygon};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut},
    rect::Rect,
};
use log::info;
use std::{fs, path::Path};

use crate::{
    components::{Extent, NdmiRaster},
    errors::Result,
    ndmi::ClippedResult,
};
use colormap::{ndmi_color, NDMI_MAX, NDMI_MIN};
use text::Typeface;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Everything drawn for one scene.
#[derive(Debug, Clone)]
pub struct NdmiPlot<'a> {
    pub raster: &'a NdmiRaster,
    pub extent: Extent,
    pub mean: f64,
    /// Area of interest in the raster CRS.
    pub outline: &'a MultiPolygon,
    pub date_label: String,
}

impl<'a> NdmiPlot<'a> {
    pub fn new(result: &'a ClippedResult, date_label: impl Into<String>) -> Self {
        Self {
            raster: &result.raster,
            extent: result.extent,
            mean: result.mean,
            outline: &result.outline,
            date_label: date_label.into(),
        }
    }

    pub fn title(&self) -> String {
        format!(
            "Normalized Difference Moisture Index (NDMI) - {}",
            self.date_label
        )
    }

    pub fn mean_label(&self) -> String {
        format!("Mean NDMI: {:.4}", self.mean)
    }
}

/// Writes a plot to an image file.
pub trait Render {
    fn render(&self, plot: &NdmiPlot<'_>, output: &Path) -> Result<()>;
}

impl<R: Render + ?Sized> Render for &R {
    fn render(&self, plot: &NdmiPlot<'_>, output: &Path) -> Result<()> {
        (**self).render(plot, output)
    }
}

/// Placement of the map in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapArea {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Canvas pixels per map unit.
    pub scale: f64,
    extent: Extent,
}

impl MapArea {
    pub fn to_canvas(&self, coord: Coord) -> (f32, f32) {
        (
            (f64::from(self.x) + (coord.x - self.extent.left) * self.scale) as f32,
            (f64::from(self.y) + (self.extent.top - coord.y) * self.scale) as f32,
        )
    }

    /// Map coordinate at the centre of canvas pixel `(px, py)` of the area.
    pub fn to_map(&self, px: u32, py: u32) -> Coord {
        Coord {
            x: self.extent.left + (f64::from(px) + 0.5) / self.scale,
            y: self.extent.top - (f64::from(py) + 0.5) / self.scale,
        }
    }
}

/// PNG map with a title, a colour bar fixed to [-1, 1] and the mean annotated.
#[derive(Debug, Clone, Copy)]
pub struct PngRenderer {
    width: u32,
    height: u32,
}

impl Default for PngRenderer {
    fn default() -> Self {
        Self::new(1000, 1000)
    }
}

impl PngRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Font size of the title and the mean, in pixels.
    fn heading_size(&self) -> f32 {
        (self.width.min(self.height) as f32 / 40.).max(8.)
    }

    fn label_size(&self) -> f32 {
        (self.width.min(self.height) as f32 / 50.).max(8.)
    }

    fn margin(&self) -> u32 {
        self.width / 20
    }

    fn header(&self) -> u32 {
        self.height / 10
    }

    fn colorbar(&self) -> Rect {
        let bar_width = (self.width / 30).max(2);
        let label_space = (self.label_size() * 1.5) as u32 + self.width / 50;
        let x = self.width.saturating_sub(self.margin() + label_space + bar_width);
        Rect::at(x as i32, self.header() as i32).of_size(bar_width, self.frame_height())
    }

    fn frame_height(&self) -> u32 {
        self.height.saturating_sub(2 * self.header()).max(1)
    }

    /// Largest area of the frame left of the colour bar with the extent's aspect ratio.
    pub fn map_area(&self, extent: &Extent) -> Option<MapArea> {
        if !(extent.width() > 0. && extent.height() > 0.) {
            return None;
        }
        let frame_x = self.margin();
        let frame_right = (self.colorbar().left() as u32).saturating_sub(self.width / 40);
        let frame_width = frame_right.saturating_sub(frame_x).max(1);
        let frame_height = self.frame_height();
        let scale = (f64::from(frame_width) / extent.width())
            .min(f64::from(frame_height) / extent.height());
        let width = ((extent.width() * scale).round() as u32).clamp(1, frame_width);
        let height = ((extent.height() * scale).round() as u32).clamp(1, frame_height);
        Some(MapArea {
            x: (frame_x + (frame_width - width) / 2) as i32,
            y: (self.header() + (frame_height - height) / 2) as i32,
            width,
            height,
            scale,
            extent: *extent,
        })
    }

    /// Draws the plot in memory.
    pub fn draw(&self, plot: &NdmiPlot<'_>) -> Result<RgbImage> {
        let mut canvas = RgbImage::from_pixel(self.width, self.height, WHITE);
        let typeface = Typeface::load()?;

        let title = plot.title();
        let (title_width, title_height) = typeface.measure(&title, self.heading_size());
        typeface.draw(
            &mut canvas,
            (self.width.saturating_sub(title_width) / 2) as i32,
            (self.header().saturating_sub(title_height) / 2) as i32,
            self.heading_size(),
            &title,
            BLACK,
        );

        if let Some(area) = self.map_area(&plot.extent) {
            self.draw_raster(&mut canvas, plot.raster, &area)?;
            draw_outline(&mut canvas, plot.outline, &area);
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(area.x - 1, area.y - 1).of_size(area.width + 2, area.height + 2),
                BLACK,
            );
        }
        self.draw_colorbar(&mut canvas, &typeface);
        self.draw_mean(&mut canvas, &typeface, &plot.mean_label());
        Ok(canvas)
    }

    fn draw_raster(&self, canvas: &mut RgbImage, raster: &NdmiRaster, area: &MapArea) -> Result<()> {
        let inverse = raster.transform().inverse()?;
        for py in 0..area.height {
            for px in 0..area.width {
                let pixel = inverse.apply(area.to_map(px, py));
                let (col, row) = (pixel.x.floor(), pixel.y.floor());
                if col < 0. || row < 0. {
                    continue;
                }
                let color = raster
                    .value(row as usize, col as usize)
                    .and_then(ndmi_color);
                let (x, y) = (area.x + px as i32, area.y + py as i32);
                if let Some(color) = color {
                    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
                        canvas.put_pixel(x as u32, y as u32, color);
                    }
                }
            }
        }
        Ok(())
    }

    fn draw_colorbar(&self, canvas: &mut RgbImage, typeface: &Typeface) {
        let bar = self.colorbar();
        let span = (bar.height() - 1).max(1) as f64;
        for offset in 0..bar.height() {
            let value = NDMI_MAX - f64::from(offset) / span * (NDMI_MAX - NDMI_MIN);
            let color = ndmi_color(value).unwrap_or(WHITE);
            draw_filled_rect_mut(
                canvas,
                Rect::at(bar.left(), bar.top() + offset as i32).of_size(bar.width(), 1),
                color,
            );
        }
        draw_hollow_rect_mut(canvas, bar, BLACK);

        let (_, label_height) = typeface.measure("0", self.label_size());
        for (value, label) in [(NDMI_MAX, "1"), (0., "0"), (NDMI_MIN, "-1")] {
            let y = bar.top() + ((NDMI_MAX - value) / (NDMI_MAX - NDMI_MIN) * span).round() as i32;
            let tick_start = bar.right() as f32;
            draw_line_segment_mut(
                canvas,
                (tick_start, y as f32),
                (tick_start + 5., y as f32),
                BLACK,
            );
            typeface.draw(
                canvas,
                bar.right() + 8,
                y - label_height as i32 / 2,
                self.label_size(),
                label,
                BLACK,
            );
        }
    }

    fn draw_mean(&self, canvas: &mut RgbImage, typeface: &Typeface, label: &str) {
        let (width, height) = typeface.measure(label, self.heading_size());
        let padding = (self.heading_size() / 3.) as u32;
        let x = (self.width.saturating_sub(width) / 2) as i32;
        let y = (self.height - self.header() + self.header().saturating_sub(height) / 2) as i32;
        let frame = Rect::at(x - padding as i32, y - padding as i32)
            .of_size(width + 2 * padding, height + 2 * padding);
        draw_filled_rect_mut(canvas, frame, WHITE);
        draw_hollow_rect_mut(canvas, frame, BLACK);
        typeface.draw(canvas, x, y, self.heading_size(), label, BLACK);
    }
}

fn draw_ring(canvas: &mut RgbImage, ring: &LineString, area: &MapArea) {
    for line in ring.lines() {
        let (start, end) = (area.to_canvas(line.start), area.to_canvas(line.end));
        for (dx, dy) in [(0., 0.), (1., 0.), (0., 1.)] {
            draw_line_segment_mut(
                canvas,
                (start.0 + dx, start.1 + dy),
                (end.0 + dx, end.1 + dy),
                BLACK,
            );
        }
    }
}

fn draw_outline(canvas: &mut RgbImage, outline: &MultiPolygon, area: &MapArea) {
    for polygon in outline {
        draw_ring(canvas, polygon.exterior(), area);
        for interior in polygon.interiors() {
            draw_ring(canvas, interior, area);
        }
    }
}

impl Render for PngRenderer {
    fn render(&self, plot: &NdmiPlot<'_>, output: &Path) -> Result<()> {
        let canvas = self.draw(plot)?;
        let partial = output.with_extension("png.part");
        canvas.save_with_format(&partial, ImageFormat::Png)?;
        fs::rename(&partial, output)?;
        info!("saved {} to {}", plot.title(), output.display());
        Ok(())
    }
}
