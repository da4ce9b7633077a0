use std::io::Cursor;
use std::time::Duration;
use async_trait::async_trait;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use crate::config::ChartConfig;
use crate::errors::{ChartError, ChartResult};
use super::MaccCurve;

const FONT: &str = "sans-serif";

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
}

impl From<&ChartConfig> for RenderOptions {
    fn from(config: &ChartConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
        }
    }
}

fn centered(size: u32) -> TextStyle<'static> {
    (FONT, size)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom))
}

fn render_err(e: impl std::fmt::Display) -> ChartError {
    ChartError::Render(e.to_string())
}

/// Renders the curve into an in-memory PNG.
///
/// Each bar is drawn edge to edge with a black outline and its cost above it; category and
/// width labels sit under the baseline, and the total abatement is printed under the last bar.
pub fn render_png(curve: &MaccCurve, options: RenderOptions) -> ChartResult<Vec<u8>> {
    let RenderOptions { width, height } = options;
    let mut pixels = vec![0u8; width as usize * height as usize * 3];

    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let x_max = if curve.total_abatement > 0.0 { curve.total_abatement } else { 1.0 };
        let (low, high) = curve.cost_range();
        let pad = if high > low { (high - low) * 0.15 } else { 1.0 };
        let y_range = (low - pad)..(high + pad);
        let label_y = low - pad * 0.2;

        let mut chart = ChartBuilder::on(&root)
            .caption(curve.title(), (FONT, 28).into_font())
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(0f64..x_max, y_range)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("CO2 Abatement, Million Tonne")
            .y_desc("MACC Values USD/Ton CO2")
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(curve.bars.iter().map(|bar| {
                let [r, g, b] = bar.color;
                Rectangle::new([(bar.x, 0.0), (bar.right(), bar.cost)], RGBColor(r, g, b).filled())
            }))
            .map_err(render_err)?;

        chart
            .draw_series(curve.bars.iter().map(|bar| {
                Rectangle::new([(bar.x, 0.0), (bar.right(), bar.cost)], BLACK.stroke_width(1))
            }))
            .map_err(render_err)?;

        chart
            .draw_series(curve.bars.iter().map(|bar| {
                let y = bar.cost.max(0.0);
                Text::new(format!("{}", bar.cost), (bar.center(), y), centered(14))
            }))
            .map_err(render_err)?;

        chart
            .draw_series(curve.bars.iter().map(|bar| {
                Text::new(
                    format!("{} ({})", bar.category, bar.width),
                    (bar.center(), label_y),
                    centered(12),
                )
            }))
            .map_err(render_err)?;

        if let Some(line) = curve.reference_line {
            chart
                .draw_series(LineSeries::new(vec![(0.0, line), (x_max, line)], RED.stroke_width(2)))
                .map_err(render_err)?;
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("Internal carbon price {}", line),
                    (0.0, line),
                    (FONT, 14)
                        .into_font()
                        .color(&BLACK)
                        .pos(Pos::new(HPos::Left, VPos::Bottom)),
                )))
                .map_err(render_err)?;
        }

        if let Some(last) = curve.bars.last() {
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("Total: {:.1}", curve.total_abatement),
                    (last.center(), low - pad * 0.6),
                    centered(14),
                )))
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
    }

    let image = image::RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| ChartError::Render("bitmap does not match the requested size".into()))?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
        .map_err(render_err)?;

    tracing::debug!("Rendered {} bars into {} PNG bytes", curve.bars.len(), png.len());
    Ok(png)
}

/// Renders on a blocking worker thread, giving up after `timeout_secs`.
pub async fn render_with_timeout(
    curve: MaccCurve,
    options: RenderOptions,
    timeout_secs: u64,
) -> ChartResult<Vec<u8>> {
    let result = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        tokio::task::spawn_blocking(move || render_png(&curve, options)),
    )
    .await;

    match result {
        Ok(Ok(rendered)) => rendered,
        Ok(Err(e)) => {
            tracing::error!("Chart rendering panicked: {}", e);
            Err(ChartError::TaskPanic(e.to_string()))
        }
        Err(_) => {
            tracing::error!("Chart rendering timed out after {} seconds", timeout_secs);
            Err(ChartError::Timeout(timeout_secs))
        }
    }
}

/// Turns a laid-out curve into image bytes.
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, curve: MaccCurve) -> ChartResult<Vec<u8>>;
}

/// Draws with plotters on a blocking thread under the configured timeout.
#[derive(Debug, Clone, Copy)]
pub struct PlottersRenderer {
    options: RenderOptions,
    timeout_secs: u64,
}

impl From<&ChartConfig> for PlottersRenderer {
    fn from(config: &ChartConfig) -> Self {
        Self {
            options: RenderOptions::from(config),
            timeout_secs: config.render_timeout_secs,
        }
    }
}

#[async_trait]
impl ChartRenderer for PlottersRenderer {
    async fn render(&self, curve: MaccCurve) -> ChartResult<Vec<u8>> {
        render_with_timeout(curve, self.options, self.timeout_secs).await
    }
}
