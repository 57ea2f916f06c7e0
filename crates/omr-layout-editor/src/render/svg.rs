//! Standalone SVG backend for [`Scene`].

use std::fmt::Write;

use super::commands::{Color, DrawCommand, Scene, Stroke, TextAlign, TextStyle};

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn paint(attr: &str, color: Option<Color>) -> String {
    match color {
        None => format!(r#" {attr}="none""#),
        Some(c) if c.is_opaque() => format!(r#" {attr}="{}""#, c.hex()),
        Some(c) => format!(r#" {attr}="{}" {attr}-opacity="{}""#, c.hex(), c.a),
    }
}

fn stroke_attrs(stroke: Option<&Stroke>) -> String {
    let Some(s) = stroke else {
        return String::new();
    };
    let mut out = paint("stroke", Some(s.color));
    let _ = write!(out, r#" stroke-width="{}""#, s.width);
    if !s.dash.is_empty() {
        let dash: Vec<String> = s.dash.iter().map(|d| d.to_string()).collect();
        let _ = write!(out, r#" stroke-dasharray="{}""#, dash.join(" "));
    }
    out
}

fn text_attrs(style: &TextStyle) -> String {
    let anchor = match style.align {
        TextAlign::Left => "start",
        TextAlign::Center => "middle",
        TextAlign::Right => "end",
    };
    let mut out = format!(
        r#" font-family="sans-serif" font-size="{}" text-anchor="{anchor}" dominant-baseline="middle""#,
        style.size
    );
    if style.bold {
        out.push_str(r#" font-weight="bold""#);
    }
    out.push_str(&paint("fill", Some(style.color)));
    out
}

impl Scene {
    /// Render to a standalone SVG document sized to the scene.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        for cmd in &self.commands {
            let _ = match cmd {
                DrawCommand::Rect { rect, fill, stroke } => writeln!(
                    out,
                    r#"  <rect x="{}" y="{}" width="{}" height="{}"{}{}/>"#,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    paint("fill", *fill),
                    stroke_attrs(stroke.as_ref())
                ),
                DrawCommand::Circle {
                    center,
                    radius,
                    fill,
                    stroke,
                } => writeln!(
                    out,
                    r#"  <circle cx="{}" cy="{}" r="{}"{}{}/>"#,
                    center.x,
                    center.y,
                    radius,
                    paint("fill", *fill),
                    stroke_attrs(stroke.as_ref())
                ),
                DrawCommand::Path { points, stroke } => {
                    let pts: Vec<String> =
                        points.iter().map(|p| format!("{},{}", p.x, p.y)).collect();
                    writeln!(
                        out,
                        r#"  <polyline points="{}" fill="none"{}/>"#,
                        pts.join(" "),
                        stroke_attrs(Some(stroke))
                    )
                }
                DrawCommand::Text {
                    anchor,
                    text,
                    style,
                } => writeln!(
                    out,
                    r#"  <text x="{}" y="{}"{}>{}</text>"#,
                    anchor.x,
                    anchor.y,
                    text_attrs(style),
                    escape(text)
                ),
                DrawCommand::Image {
                    rect,
                    opacity,
                    href,
                } => match href {
                    Some(href) => writeln!(
                        out,
                        r#"  <image x="{}" y="{}" width="{}" height="{}" opacity="{}" preserveAspectRatio="none" href="{}"/>"#,
                        rect.x,
                        rect.y,
                        rect.width,
                        rect.height,
                        opacity,
                        escape(href)
                    ),
                    // placeholder when the pixels are not addressable
                    None => writeln!(
                        out,
                        r##"  <rect x="{}" y="{}" width="{}" height="{}" fill="#9ca3af" opacity="{}"/>"##,
                        rect.x, rect.y, rect.width, rect.height, opacity
                    ),
                },
            };
        }
        out.push_str("</svg>\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;
    use omr_layout_core::Rect;

    #[test]
    fn writes_each_primitive() {
        let mut scene = Scene::new(100.0, 50.0);
        scene.push(DrawCommand::Rect {
            rect: Rect::new(0.0, 0.0, 100.0, 50.0),
            fill: Some(Color::WHITE),
            stroke: Some(Stroke::dashed(Color::BLACK, 2.0, &[5.0, 5.0])),
        });
        scene.push(DrawCommand::Circle {
            center: Point2::new(10.0, 10.0),
            radius: 7.5,
            fill: Some(Color::rgba(59, 130, 246, 0.2)),
            stroke: None,
        });
        scene.push(DrawCommand::Text {
            anchor: Point2::new(5.0, 5.0),
            text: "A&B <1>".into(),
            style: TextStyle {
                color: Color::BLACK,
                size: 12.0,
                bold: true,
                align: TextAlign::Right,
            },
        });

        let svg = scene.to_svg();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100\" height=\"50\""));
        assert!(svg.contains("stroke-dasharray=\"5 5\""));
        assert!(svg.contains("r=\"7.5\" fill=\"#3b82f6\" fill-opacity=\"0.2\""));
        assert!(svg.contains(">A&amp;B &lt;1&gt;</text>"));
        assert!(svg.contains("text-anchor=\"end\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
