//! Camera overlay: the page guide drawn over a live video frame.

use nalgebra::Point2;
use omr_layout_core::transform::overlay_scale;
use omr_layout_core::{overlay_box, template_to_overlay, AlignmentQuality, Dimensions, Rect, Template};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::commands::{Color, DrawCommand, Scene, Stroke, TextAlign, TextStyle};

const GLOW: Color = Color::rgba(16, 185, 129, 0.3);
const GUIDE_TEXT: Color = Color::rgb(0x1e, 0x40, 0xaf);
const FIRST_ROW_FILL: Color = Color::rgba(59, 130, 246, 0.2);

const CORNER_SIZE: f64 = 30.0;
const CORNER_DOT_RADIUS: f64 = 6.0;
const STATUS_RADIUS: f64 = 12.0;
/// Distance of the status disc center from the top-right corner, on both axes.
const STATUS_INSET: f64 = 30.0;

const OPTION_LETTERS: [&str; 4] = ["A", "B", "C", "D"];

/// Main and inner border colors for a quality level.
pub fn quality_colors(q: AlignmentQuality) -> (Color, Color) {
    match q {
        AlignmentQuality::Good => (Color::rgb(0x10, 0xb9, 0x81), Color::rgb(0x34, 0xd3, 0x99)),
        AlignmentQuality::Warning => (Color::rgb(0xf5, 0x9e, 0x0b), Color::rgb(0xfb, 0xbf, 0x24)),
        AlignmentQuality::Poor => (Color::rgb(0xef, 0x44, 0x44), Color::rgb(0xf8, 0x71, 0x71)),
    }
}

pub fn status_glyph(q: AlignmentQuality) -> &'static str {
    match q {
        AlignmentQuality::Good => "\u{2713}",
        AlignmentQuality::Warning => "!",
        AlignmentQuality::Poor => "\u{2717}",
    }
}

/// Guide emphasis by 0-based row: rows 1-5 strong, 6-10 medium, the rest faint.
fn row_stroke(row: usize) -> Stroke {
    match row {
        0..=4 => Stroke::solid(Color::rgb(0x60, 0xa5, 0xfa), 1.5),
        5..=9 => Stroke::solid(Color::rgb(0x93, 0xc5, 0xfd), 1.0),
        _ => Stroke::solid(Color::rgb(0xdb, 0xea, 0xfe), 0.8),
    }
}

/// Draw the alignment guide for a `frame`-sized video.
///
/// An invalid frame size yields an empty scene of that size.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(template), fields(blocks = template.len()))
)]
pub fn render_overlay(template: &Template, frame: Dimensions, quality: AlignmentQuality) -> Scene {
    let mut scene = Scene::new(frame.width, frame.height);
    let page = template.page_dimensions();
    let bx = overlay_box(page, frame);
    if bx.width <= 0.0 || bx.height <= 0.0 {
        return scene;
    }
    let (main, inner) = quality_colors(quality);

    scene.push(DrawCommand::Rect {
        rect: bx.expand(4.0),
        fill: None,
        stroke: Some(Stroke::solid(GLOW, 8.0)),
    });
    scene.push(DrawCommand::Rect {
        rect: bx,
        fill: None,
        stroke: Some(Stroke::dashed(main, 6.0, &[15.0, 8.0])),
    });
    scene.push(DrawCommand::Rect {
        rect: bx.expand(-2.0),
        fill: None,
        stroke: Some(Stroke::solid(inner, 2.0)),
    });

    push_corners(&mut scene, &bx, main);
    push_guides(&mut scene, template, page, &bx);

    let center = Point2::new(frame.width - STATUS_INSET, STATUS_INSET);
    scene.push(DrawCommand::Circle {
        center,
        radius: STATUS_RADIUS,
        fill: Some(main),
        stroke: None,
    });
    scene.push(DrawCommand::Text {
        anchor: center,
        text: status_glyph(quality).to_string(),
        style: TextStyle {
            color: Color::WHITE,
            size: 14.0,
            bold: true,
            align: TextAlign::Center,
        },
    });
    scene
}

fn push_corners(scene: &mut Scene, bx: &Rect, color: Color) {
    let s = CORNER_SIZE;
    let stroke = Stroke::solid(color, 5.0);
    // (corner, horizontal arm direction, vertical arm direction)
    let corners = [
        (Point2::new(bx.x, bx.y), 1.0, 1.0),
        (Point2::new(bx.right(), bx.y), -1.0, 1.0),
        (Point2::new(bx.right(), bx.bottom()), -1.0, -1.0),
        (Point2::new(bx.x, bx.bottom()), 1.0, -1.0),
    ];
    for (c, dx, dy) in corners {
        scene.push(DrawCommand::Path {
            points: vec![
                Point2::new(c.x, c.y + dy * s),
                c,
                Point2::new(c.x + dx * s, c.y),
            ],
            stroke: stroke.clone(),
        });
        scene.push(DrawCommand::Circle {
            center: c,
            radius: CORNER_DOT_RADIUS,
            fill: Some(color),
            stroke: None,
        });
    }
}

fn push_guides(scene: &mut Scene, template: &Template, page: Dimensions, bx: &Rect) {
    let scale = overlay_scale(page, *bx);
    let radius = template.bubble_dimensions().width * 0.5 * scale.x.min(scale.y);
    let letter_size = (radius * 1.2).max(6.0);
    let text_size = (8.0 * scale.y).clamp(6.0, 14.0);

    for block in template.blocks() {
        let geom = template.geometry(block);
        for row in 0..geom.rows {
            let stroke = row_stroke(row);
            for col in 0..geom.columns {
                let center = template_to_overlay(geom.bubble_center(row, col), page, *bx);
                let first = row == 0;
                scene.push(DrawCommand::Circle {
                    center,
                    radius,
                    fill: first.then_some(FIRST_ROW_FILL),
                    stroke: Some(stroke.clone()),
                });
                if let Some(letter) = OPTION_LETTERS.get(col).filter(|_| first) {
                    scene.push(DrawCommand::Text {
                        anchor: center,
                        text: (*letter).to_string(),
                        style: TextStyle {
                            color: GUIDE_TEXT,
                            size: letter_size,
                            bold: true,
                            align: TextAlign::Center,
                        },
                    });
                }
            }
            if let Some(label) = block.label(row) {
                let at = template_to_overlay(
                    Point2::new(geom.origin.x, geom.row_center_y(row)),
                    page,
                    *bx,
                );
                scene.push(DrawCommand::Text {
                    anchor: Point2::new(at.x - radius, at.y),
                    text: label.to_string(),
                    style: TextStyle {
                        color: GUIDE_TEXT,
                        size: text_size,
                        bold: false,
                        align: TextAlign::Right,
                    },
                });
            }
        }

        let bounds = geom.bounds();
        let top = template_to_overlay(Point2::new(bounds.center().x, bounds.y), page, *bx);
        scene.push(DrawCommand::Text {
            anchor: Point2::new(top.x, top.y - 2.0 * radius),
            text: block.id().to_string(),
            style: TextStyle {
                color: GUIDE_TEXT,
                size: text_size,
                bold: true,
                align: TextAlign::Center,
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn border_color_tracks_quality() {
        let t = Template::default();
        let frame = Dimensions::new(1920.0, 1080.0);
        for (q, hex) in [
            (AlignmentQuality::Good, "#10b981"),
            (AlignmentQuality::Warning, "#f59e0b"),
            (AlignmentQuality::Poor, "#ef4444"),
        ] {
            let scene = render_overlay(&t, frame, q);
            match &scene.commands[1] {
                DrawCommand::Rect {
                    stroke: Some(s), ..
                } => {
                    assert_eq!(s.color.hex(), hex);
                    assert_eq!(s.dash, [15.0, 8.0]);
                }
                other => panic!("unexpected {other:?}"),
            }
            assert!(scene.texts().any(|g| g == status_glyph(q)));
        }
    }

    #[test]
    fn guide_bubbles_land_inside_the_box() {
        let mut t = Template::default();
        t.add_field_block();
        let frame = Dimensions::new(1280.0, 720.0);
        let scene = render_overlay(&t, frame, AlignmentQuality::Poor);
        let bx = overlay_box(t.page_dimensions(), frame);

        // four corner dots, 80 guide bubbles and the status disc
        assert_eq!(scene.circles().count(), 4 + 80 + 1);
        let first = template_to_overlay(
            t.geometry(&t.blocks()[0]).bubble_center(0, 0),
            t.page_dimensions(),
            bx,
        );
        assert!(scene.circles().any(|(c, _)| c == first));
        // the first five rows fit on the default page
        for (c, _) in scene.circles().skip(4).take(20) {
            assert!(bx.contains(c));
        }
        let letters: Vec<_> = scene
            .texts()
            .filter(|s| OPTION_LETTERS.contains(s))
            .collect();
        assert_eq!(letters, OPTION_LETTERS);
    }

    #[test]
    fn guide_emphasis_fades_by_row_tier() {
        let mut t = Template::default();
        t.add_field_block();
        let scene = render_overlay(&t, Dimensions::new(1280.0, 720.0), AlignmentQuality::Good);
        let guides: Vec<&Stroke> = scene
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Circle {
                    stroke: Some(s), ..
                } => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(guides.len(), 20 * 4);

        let strong = ("#60a5fa", 1.5);
        let medium = ("#93c5fd", 1.0);
        let faint = ("#dbeafe", 0.8);
        for (row, (hex, width)) in [
            (0, strong),
            (4, strong),
            (5, medium),
            (9, medium),
            (10, faint),
            (19, faint),
        ] {
            for s in &guides[row * 4..row * 4 + 4] {
                assert_eq!(s.color.hex(), hex, "row {row}");
                assert_eq!(s.width, width, "row {row}");
            }
        }
    }

    #[test]
    fn status_disc_sits_in_top_right() {
        let t = Template::default();
        let scene = render_overlay(&t, Dimensions::new(640.0, 480.0), AlignmentQuality::Good);
        let (center, r) = scene.circles().last().expect("disc");
        assert_abs_diff_eq!(center.x, 610.0);
        assert_abs_diff_eq!(center.y, 30.0);
        assert_eq!(r, STATUS_RADIUS);
    }

    #[test]
    fn empty_frame_draws_nothing() {
        let scene = render_overlay(
            &Template::default(),
            Dimensions::new(0.0, 0.0),
            AlignmentQuality::Good,
        );
        assert!(scene.is_empty());
    }
}
