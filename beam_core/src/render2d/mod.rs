//! # 2D Elevation View (SVG)
//!
//! Renders a [`StructuralModel`] as an SVG elevation: beams as a horizontal
//! line at mid-height, pillars as support triangles, one stacked dimension
//! line per beam, and either the applied loads or a shear/moment diagram.
//!
//! Rendering is a pure function of (model, viewport, mode, diagram); there is
//! no retained state, so a redraw after any change is just another call to
//! [`Beam2DView::render`].
//!
//! ```rust
//! use beam_core::model::StructuralModel;
//! use beam_core::projection::Viewport;
//! use beam_core::render2d::Beam2DView;
//!
//! let model = StructuralModel::new()
//!     .add_pillar(20.0, -160.0).unwrap()
//!     .add_pillar(20.0, 160.0).unwrap();
//! let svg = Beam2DView::new(&model, Viewport::default()).render().unwrap();
//!
//! assert!(svg.contains(">V1</text>"));
//! assert!(svg.contains("320 cm"));
//! ```

pub mod svg;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diagram::overlay::format_value;
use crate::diagram::{DiagramOverlay, MarkerRole};
use crate::errors::CalcResult;
use crate::model::StructuralModel;
use crate::palette::color_for;
use crate::projection::{Projection, Viewport, DEFAULT_PADDING};

use svg::{Anchor, Style, SvgWriter, TextStyle};

// ============================================================================
// Layout constants (px)
// ============================================================================

pub const SUPPORT_SIZE: f64 = 30.0;
/// First dimension line sits this far above the beam
pub const DIMENSION_OFFSET: f64 = 35.0;
/// Vertical step between stacked dimension lines
pub const DIMENSION_STEP: f64 = 25.0;
/// Target spacing between distributed-load arrows
pub const ARROW_SPACING: f64 = 40.0;
pub const MIN_DISTRIBUTED_ARROWS: usize = 3;
pub const POINT_ARROW_LENGTH: f64 = 45.0;
pub const DISTRIBUTED_ARROW_LENGTH: f64 = 30.0;
/// Pixel height of the diagram's peak value
pub const DIAGRAM_AMPLITUDE: f64 = 80.0;

pub const NO_DATA_MESSAGE: &str = "No diagram data. Run the calculation first.";

const ARROW_MARKER_ID: &str = "arrowhead";
const BEAM_COLOR: &str = "#666";
const INK: &str = "#333";
const FAINT: &str = "#999";
const DIAGRAM_COLOR: &str = "#2563eb";

/// Number of arrows drawn under a distributed load bar spanning `span_px`
pub fn distributed_arrow_count(span_px: f64) -> usize {
    let fitted = if span_px.is_finite() && span_px > 0.0 {
        (span_px / ARROW_SPACING).floor() as usize
    } else {
        0
    };
    fitted.max(MIN_DISTRIBUTED_ARROWS)
}

/// Short numeric label: integers without decimals, others with up to two
pub fn format_number(value: f64) -> String {
    let text = format!("{:.2}", value);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Load label text: magnitude plus an arrow for the sign (negative is downward)
pub fn load_label(id: &str, magnitude: f64, unit: &str) -> String {
    let arrow = if magnitude < 0.0 { '↓' } else { '↑' };
    format!("{} {} {} {}", id, format_number(magnitude.abs()), unit, arrow)
}

/// What the view shows besides the structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Loads,
    Diagram,
}

/// Result of a pointer lookup along the diagram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoverSample {
    /// World position of the nearest sample (cm)
    pub x: f64,
    /// Display value
    pub value: f64,
    pub screen_x: f64,
    pub screen_y: f64,
}

// ============================================================================
// View
// ============================================================================

pub struct Beam2DView<'a> {
    model: &'a StructuralModel,
    viewport: Viewport,
    mode: ViewMode,
    overlay: Option<&'a DiagramOverlay>,
}

impl<'a> Beam2DView<'a> {
    /// Load view of `model`
    pub fn new(model: &'a StructuralModel, viewport: Viewport) -> Self {
        Self {
            model,
            viewport,
            mode: ViewMode::Loads,
            overlay: None,
        }
    }

    /// Switch to diagram mode; `None` renders the "no data" placeholder
    pub fn with_diagram(mut self, overlay: Option<&'a DiagramOverlay>) -> Self {
        self.mode = ViewMode::Diagram;
        self.overlay = overlay;
        self
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn projection(&self) -> Projection {
        Projection::fit(self.model, self.viewport.width, DEFAULT_PADDING)
    }

    fn beam_y(&self) -> f64 {
        self.viewport.height / 2.0
    }

    fn diagram_scale(overlay: &DiagramOverlay) -> f64 {
        let peak = overlay.peak_amplitude();
        if peak > 0.0 {
            DIAGRAM_AMPLITUDE / peak
        } else {
            0.0
        }
    }

    /// Complete SVG document
    pub fn render(&self) -> CalcResult<String> {
        let proj = self.projection();
        let mut svg = SvgWriter::begin(self.viewport.width, self.viewport.height)?;

        svg.raw(&format!(
            r#"<defs><marker id="{}" markerWidth="10" markerHeight="10" refX="9" refY="3" orient="auto"><polygon points="0 0, 10 3, 0 6" fill="{}"/></marker></defs>"#,
            ARROW_MARKER_ID, BEAM_COLOR
        ))?;

        self.draw_beams(&mut svg, &proj)?;
        self.draw_supports(&mut svg, &proj)?;
        self.draw_dimensions(&mut svg, &proj)?;
        self.draw_axes(&mut svg)?;

        match self.mode {
            ViewMode::Loads => self.draw_loads(&mut svg, &proj)?,
            ViewMode::Diagram => match self.overlay.filter(|o| !o.is_empty()) {
                Some(overlay) => self.draw_diagram(&mut svg, &proj, overlay)?,
                None => self.draw_no_data(&mut svg)?,
            },
        }

        Ok(svg.finish()?)
    }

    /// Nearest diagram sample under a pointer at screen x (diagram mode only)
    pub fn hover(&self, pointer_x: f64) -> Option<HoverSample> {
        if self.mode != ViewMode::Diagram {
            return None;
        }
        let overlay = self.overlay?;
        let proj = self.projection();
        let sample = overlay.nearest(proj.screen_to_world(pointer_x))?;
        Some(HoverSample {
            x: sample.x,
            value: sample.value,
            screen_x: proj.world_to_screen(sample.x),
            screen_y: self.beam_y() - sample.value * Self::diagram_scale(overlay),
        })
    }

    // ========================================================================
    // Structure
    // ========================================================================

    fn draw_beams(&self, svg: &mut SvgWriter, proj: &Projection) -> fmt::Result {
        let y = self.beam_y();
        svg.open_group("beams", None)?;
        for beam in &self.model.beams {
            let x1 = proj.world_to_screen(beam.start_position);
            let x2 = proj.world_to_screen(beam.end_position);
            svg.line(x1, y, x2, y, &Style::stroke(BEAM_COLOR, 3.0))?;
            svg.text((x1 + x2) / 2.0, y - 10.0, &beam.id, &TextStyle::new(12.0, INK).centered().bold())?;
        }
        svg.close_group()
    }

    fn draw_supports(&self, svg: &mut SvgWriter, proj: &Projection) -> fmt::Result {
        let y = self.beam_y();
        let half = SUPPORT_SIZE / 2.0;
        svg.open_group("supports", None)?;
        for pillar in &self.model.pillars {
            let x = proj.world_to_screen(pillar.position);
            svg.polygon(
                &[(x, y), (x - half, y + SUPPORT_SIZE), (x + half, y + SUPPORT_SIZE)],
                &Style::stroke(INK, 2.0).fill("#888"),
            )?;
            svg.text(x, y + SUPPORT_SIZE + 20.0, &pillar.id, &TextStyle::new(12.0, INK).centered().bold())?;
        }
        svg.close_group()
    }

    fn draw_dimensions(&self, svg: &mut SvgWriter, proj: &Projection) -> fmt::Result {
        let y = self.beam_y();
        svg.open_group("dimensions", None)?;
        for (index, beam) in self.model.beams.iter().enumerate() {
            let x1 = proj.world_to_screen(beam.start_position);
            let x2 = proj.world_to_screen(beam.end_position);
            let dim_y = y - DIMENSION_OFFSET - index as f64 * DIMENSION_STEP;
            let extension = Style::stroke(FAINT, 1.0).dashed("2,2");

            svg.line(x1, y - 5.0, x1, dim_y, &extension)?;
            svg.line(x2, y - 5.0, x2, dim_y, &extension)?;
            svg.line(x1, dim_y, x2, dim_y, &Style::stroke(INK, 1.5))?;

            // Arrowheads point outward to the extension lines
            let (left, right) = (x1.min(x2), x1.max(x2));
            svg.polygon(&[(left, dim_y), (left + 6.0, dim_y - 3.0), (left + 6.0, dim_y + 3.0)], &Style::filled(INK))?;
            svg.polygon(&[(right, dim_y), (right - 6.0, dim_y - 3.0), (right - 6.0, dim_y + 3.0)], &Style::filled(INK))?;

            svg.text(
                (x1 + x2) / 2.0,
                dim_y - 5.0,
                &format!("{} cm", format_number(beam.length())),
                &TextStyle::new(12.0, INK).centered().bold(),
            )?;
        }
        svg.close_group()
    }

    fn draw_axes(&self, svg: &mut SvgWriter) -> fmt::Result {
        let axis = Style::stroke(FAINT, 1.5).marker_end(ARROW_MARKER_ID);
        let label = TextStyle::new(11.0, FAINT);
        svg.open_group("axes", Some((DEFAULT_PADDING - 50.0, self.beam_y() - 60.0)))?;
        svg.line(0.0, 20.0, 30.0, 20.0, &axis)?;
        svg.text(35.0, 24.0, "x", &label)?;
        svg.line(0.0, 20.0, 0.0, -10.0, &axis)?;
        svg.text(-5.0, -15.0, "y", &label)?;
        svg.close_group()
    }

    // ========================================================================
    // Loads
    // ========================================================================

    /// Vertical arrow from `tail_y` to `tip_y`, head at the tip
    fn arrow(svg: &mut SvgWriter, x: f64, tail_y: f64, tip_y: f64, color: &str) -> fmt::Result {
        svg.line(x, tail_y, x, tip_y, &Style::stroke(color, 2.0))?;
        let dir = if tip_y > tail_y { -1.0 } else { 1.0 };
        svg.polygon(
            &[(x, tip_y), (x - 4.0, tip_y + dir * 8.0), (x + 4.0, tip_y + dir * 8.0)],
            &Style::filled(color),
        )
    }

    fn draw_loads(&self, svg: &mut SvgWriter, proj: &Projection) -> fmt::Result {
        let y = self.beam_y();
        svg.open_group("loads", None)?;

        for (index, load) in self.model.point_loads.iter().enumerate() {
            let color = color_for(index);
            let x = proj.world_to_screen(load.position);
            let top = y - POINT_ARROW_LENGTH;
            if load.magnitude < 0.0 {
                Self::arrow(svg, x, top, y, color)?;
            } else {
                Self::arrow(svg, x, y, top, color)?;
            }
            svg.text(x, top - 6.0, &load_label(&load.id, load.magnitude, "kN"), &TextStyle::new(11.0, color).centered())?;
        }

        let offset = self.model.point_loads.len();
        for (index, load) in self.model.distributed_loads.iter().enumerate() {
            let color = color_for(offset + index);
            let x1 = proj.world_to_screen(load.min_position());
            let x2 = proj.world_to_screen(load.max_position());
            let top = y - DISTRIBUTED_ARROW_LENGTH;
            let count = distributed_arrow_count(proj.span_px(load.max_position() - load.min_position()));

            svg.line(x1, top, x2, top, &Style::stroke(color, 2.0))?;
            for i in 0..count {
                let x = x1 + (x2 - x1) * i as f64 / (count - 1) as f64;
                if load.magnitude < 0.0 {
                    Self::arrow(svg, x, top, y, color)?;
                } else {
                    Self::arrow(svg, x, y, top, color)?;
                }
            }
            svg.text(
                (x1 + x2) / 2.0,
                top - 6.0,
                &load_label(&load.id, load.magnitude, "kN/m"),
                &TextStyle::new(11.0, color).centered(),
            )?;
        }

        svg.close_group()
    }

    // ========================================================================
    // Diagram
    // ========================================================================

    fn draw_diagram(&self, svg: &mut SvgWriter, proj: &Projection, overlay: &DiagramOverlay) -> fmt::Result {
        let y = self.beam_y();
        let k = Self::diagram_scale(overlay);
        let to_screen = |x: f64, v: f64| (proj.world_to_screen(x), y - v * k);

        let curve: Vec<(f64, f64)> = overlay.points.iter().map(|p| to_screen(p.x, p.value)).collect();

        svg.open_group("diagram", None)?;

        let mut area = Vec::with_capacity(curve.len() + 2);
        if let (Some(first), Some(last)) = (curve.first(), curve.last()) {
            area.push((first.0, y));
            area.extend(curve.iter().copied());
            area.push((last.0, y));
        }
        svg.polygon(&area, &Style::filled(DIAGRAM_COLOR).opacity(0.15))?;
        svg.polyline(&curve, &Style::stroke(DIAGRAM_COLOR, 2.0))?;

        for marker in &overlay.markers {
            let (sx, sy) = to_screen(marker.x, marker.value);
            let (radius, fill) = match marker.role {
                MarkerRole::Node => (3.5, INK),
                MarkerRole::Max | MarkerRole::Min => (4.5, DIAGRAM_COLOR),
            };
            svg.circle(sx, sy, radius, &Style::filled(fill))?;
            let label_y = if marker.value >= 0.0 { sy - 8.0 } else { sy + 16.0 };
            svg.text(sx, label_y, &format_value(marker.value), &TextStyle::new(11.0, fill).centered())?;
        }

        svg.text(
            DEFAULT_PADDING,
            20.0,
            overlay.kind.title(),
            &TextStyle::new(12.0, DIAGRAM_COLOR).anchored(Anchor::Start).bold(),
        )?;
        svg.close_group()
    }

    fn draw_no_data(&self, svg: &mut SvgWriter) -> fmt::Result {
        svg.text(
            self.viewport.width / 2.0,
            24.0,
            NO_DATA_MESSAGE,
            &TextStyle::new(13.0, FAINT).centered(),
        )
    }
}
