//! Minimal SVG element writer.

use std::borrow::Cow;
use std::fmt::{self, Write};

/// Presentation attributes for one element
#[derive(Debug, Clone, Default)]
pub struct Style {
    stroke: Option<String>,
    stroke_width: Option<f64>,
    fill: Option<String>,
    fill_opacity: Option<f64>,
    dash: Option<&'static str>,
    marker_end: Option<&'static str>,
}

impl Style {
    pub fn stroke(color: &str, width: f64) -> Self {
        Self {
            stroke: Some(color.to_string()),
            stroke_width: Some(width),
            ..Self::default()
        }
    }

    pub fn filled(color: &str) -> Self {
        Self {
            fill: Some(color.to_string()),
            ..Self::default()
        }
    }

    pub fn fill(mut self, color: &str) -> Self {
        self.fill = Some(color.to_string());
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.fill_opacity = Some(opacity);
        self
    }

    pub fn dashed(mut self, pattern: &'static str) -> Self {
        self.dash = Some(pattern);
        self
    }

    /// Reference a `<marker>` by id
    pub fn marker_end(mut self, id: &'static str) -> Self {
        self.marker_end = Some(id);
        self
    }

    fn write_attrs(&self, out: &mut String) -> fmt::Result {
        write!(out, r#" fill="{}""#, self.fill.as_deref().unwrap_or("none"))?;
        if let Some(opacity) = self.fill_opacity {
            write!(out, r#" fill-opacity="{}""#, opacity)?;
        }
        if let Some(stroke) = &self.stroke {
            write!(out, r#" stroke="{}""#, stroke)?;
        }
        if let Some(width) = self.stroke_width {
            write!(out, r#" stroke-width="{}""#, width)?;
        }
        if let Some(dash) = self.dash {
            write!(out, r#" stroke-dasharray="{}""#, dash)?;
        }
        if let Some(marker) = self.marker_end {
            write!(out, r#" marker-end="url(#{})""#, marker)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(&self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub size: f64,
    pub fill: String,
    pub anchor: Anchor,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(size: f64, fill: &str) -> Self {
        Self {
            size,
            fill: fill.to_string(),
            anchor: Anchor::Start,
            bold: false,
        }
    }

    pub fn centered(mut self) -> Self {
        self.anchor = Anchor::Middle;
        self
    }

    pub fn anchored(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Escape `&`, `<`, `>` and quotes for text content and attributes
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{:.2},{:.2}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accumulates one SVG document
#[derive(Debug, Default)]
pub struct SvgWriter {
    out: String,
    depth: usize,
}

impl SvgWriter {
    /// Start a document of the given pixel size
    pub fn begin(width: f64, height: f64) -> Result<Self, fmt::Error> {
        let mut writer = Self::default();
        writeln!(
            writer.out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = width,
            h = height
        )?;
        writer.depth = 1;
        Ok(writer)
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    /// Verbatim markup (definitions)
    pub fn raw(&mut self, markup: &str) -> fmt::Result {
        self.indent();
        writeln!(self.out, "{}", markup)
    }

    pub fn open_group(&mut self, class: &str, transform: Option<(f64, f64)>) -> fmt::Result {
        self.indent();
        write!(self.out, r#"<g class="{}""#, escape(class))?;
        if let Some((x, y)) = transform {
            write!(self.out, r#" transform="translate({:.2}, {:.2})""#, x, y)?;
        }
        writeln!(self.out, ">")?;
        self.depth += 1;
        Ok(())
    }

    pub fn close_group(&mut self) -> fmt::Result {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        writeln!(self.out, "</g>")
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &Style) -> fmt::Result {
        self.indent();
        write!(self.out, r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}""#, x1, y1, x2, y2)?;
        style.write_attrs(&mut self.out)?;
        writeln!(self.out, "/>")
    }

    pub fn polygon(&mut self, points: &[(f64, f64)], style: &Style) -> fmt::Result {
        self.indent();
        write!(self.out, r#"<polygon points="{}""#, points_attr(points))?;
        style.write_attrs(&mut self.out)?;
        writeln!(self.out, "/>")
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], style: &Style) -> fmt::Result {
        self.indent();
        write!(self.out, r#"<polyline points="{}""#, points_attr(points))?;
        style.write_attrs(&mut self.out)?;
        writeln!(self.out, "/>")
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) -> fmt::Result {
        self.indent();
        write!(self.out, r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}""#, cx, cy, r)?;
        style.write_attrs(&mut self.out)?;
        writeln!(self.out, "/>")
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) -> fmt::Result {
        self.indent();
        write!(
            self.out,
            r#"<text x="{:.2}" y="{:.2}" font-size="{}" fill="{}" text-anchor="{}""#,
            x,
            y,
            style.size,
            style.fill,
            style.anchor.as_str()
        )?;
        if style.bold {
            write!(self.out, r#" font-weight="600""#)?;
        }
        writeln!(self.out, ">{}</text>", escape(content))
    }

    /// Close the root element and return the document
    pub fn finish(mut self) -> Result<String, fmt::Error> {
        while self.depth > 1 {
            self.close_group()?;
        }
        writeln!(self.out, "</svg>")?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("V1"), "V1");
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_document_structure() {
        let mut svg = SvgWriter::begin(100.0, 50.0).unwrap();
        svg.open_group("beams", None).unwrap();
        svg.line(0.0, 25.0, 100.0, 25.0, &Style::stroke("#666", 3.0)).unwrap();
        svg.text(50.0, 15.0, "V1", &TextStyle::new(12.0, "#333").centered()).unwrap();
        let doc = svg.finish().unwrap();

        assert!(doc.starts_with("<svg"));
        assert!(doc.trim_end().ends_with("</svg>"));
        assert!(doc.contains("</g>"));
        assert!(doc.contains(r##"stroke="#666""##));
        assert!(doc.contains(r#"text-anchor="middle">V1</text>"#));
    }

    #[test]
    fn test_style_attributes() {
        let mut out = String::new();
        Style::stroke("#999", 1.0)
            .dashed("2,2")
            .marker_end("arrowhead")
            .write_attrs(&mut out)
            .unwrap();
        assert_eq!(
            out,
            r##" fill="none" stroke="#999" stroke-width="1" stroke-dasharray="2,2" marker-end="url(#arrowhead)""##
        );
    }
}
