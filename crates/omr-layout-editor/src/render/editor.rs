//! Editor canvas: page, background, grid and field blocks.

use nalgebra::Point2;
use omr_layout_core::{canvas_size_for_page, Dimensions, FieldBlock, Rect, Template, ViewTransform};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::commands::{Color, DrawCommand, Scene, Stroke, TextAlign, TextStyle};
use crate::background::{BackgroundImage, BACKGROUND_OPACITY};
use crate::hit_test::highlight_rect;
use crate::view::ViewState;

/// Grid spacing in view pixels; independent of zoom.
pub const GRID_SPACING: f64 = 20.0;

const PAGE_BORDER: Color = Color::rgb(0xd1, 0xd5, 0xdb);
const GRID_LINE: Color = Color::rgb(0xe5, 0xe7, 0xeb);
const HIGHLIGHT_FILL: Color = Color::rgba(59, 130, 246, 0.4);
const HIGHLIGHT_FILL_SELECTED: Color = Color::rgba(59, 130, 246, 0.6);
const BORDER: Color = Color::rgb(0x4f, 0x46, 0xe5);
const BORDER_SELECTED: Color = Color::rgb(0x3b, 0x82, 0xf6);
const BUBBLE_STROKE: Color = Color::rgb(0x1f, 0x29, 0x37);
const LABEL: Color = Color::rgb(0x37, 0x41, 0x51);
const DEBUG_TEXT: Color = Color::rgb(0xef, 0x44, 0x44);

/// Row labels sit this far left of the block, caption this far above it.
const LABEL_OFFSET: f64 = 15.0;

/// Draw the editor canvas. The canvas is sized to hold the page at zoom 1.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(blocks = template.len()))
)]
pub fn render_editor(
    template: &Template,
    view: &ViewState,
    background: Option<&BackgroundImage>,
) -> Scene {
    let page = template.page_dimensions();
    let (cw, ch) = canvas_size_for_page(page);
    let mut scene = Scene::new(cw as f64, ch as f64);
    let t = view.transform();

    scene.push(DrawCommand::Rect {
        rect: t.rect_to_view(Rect::new(0.0, 0.0, page.width, page.height)),
        fill: Some(Color::WHITE),
        stroke: Some(Stroke::solid(PAGE_BORDER, 1.0)),
    });

    if let Some(bg) = background.filter(|_| view.show_background) {
        scene.push(DrawCommand::Image {
            rect: t.rect_to_view(bg.rect()),
            opacity: BACKGROUND_OPACITY,
            href: bg.href().map(str::to_string),
        });
    }

    if view.show_grid {
        push_grid(&mut scene, &t);
    }

    for block in template.blocks() {
        push_block(&mut scene, template, block, view, &t);
    }
    scene
}

fn push_grid(scene: &mut Scene, t: &ViewTransform) {
    let stroke = Stroke::dashed(GRID_LINE, 1.0, &[5.0, 5.0]);
    let (w, h) = (scene.width, scene.height);

    let mut x = t.pan.x.rem_euclid(GRID_SPACING);
    while x <= w {
        scene.push(DrawCommand::line(
            Point2::new(x, 0.0),
            Point2::new(x, h),
            stroke.clone(),
        ));
        x += GRID_SPACING;
    }
    let mut y = t.pan.y.rem_euclid(GRID_SPACING);
    while y <= h {
        scene.push(DrawCommand::line(
            Point2::new(0.0, y),
            Point2::new(w, y),
            stroke.clone(),
        ));
        y += GRID_SPACING;
    }
}

fn push_block(
    scene: &mut Scene,
    template: &Template,
    block: &FieldBlock,
    view: &ViewState,
    t: &ViewTransform,
) {
    let selected = view.is_selected(block.id());
    let geom = template.geometry(block);
    let z = t.zoom;

    let (fill, border, border_width) = if selected {
        (HIGHLIGHT_FILL_SELECTED, BORDER_SELECTED, 4.0)
    } else {
        (HIGHLIGHT_FILL, BORDER, 3.0)
    };
    scene.push(DrawCommand::Rect {
        rect: t.rect_to_view(highlight_rect(template, block)),
        fill: Some(fill),
        stroke: Some(Stroke::solid(border, border_width * z)),
    });

    let radius = t.length_to_view(template.bubble_dimensions().width * 0.5);
    let bubble_stroke = Stroke::solid(BUBBLE_STROKE, 2.0 * z);
    let label_style = TextStyle {
        color: LABEL,
        size: 12.0 * z,
        bold: true,
        align: TextAlign::Right,
    };
    for row in 0..geom.rows {
        for col in 0..geom.columns {
            scene.push(DrawCommand::Circle {
                center: t.to_view(geom.bubble_center(row, col)),
                radius,
                fill: Some(Color::WHITE),
                stroke: Some(bubble_stroke.clone()),
            });
        }
        if let Some(label) = block.label(row) {
            scene.push(DrawCommand::Text {
                anchor: t.to_view(Point2::new(geom.origin.x - LABEL_OFFSET, geom.row_center_y(row))),
                text: label.to_string(),
                style: label_style.clone(),
            });
        }
    }

    let bounds = geom.bounds();
    scene.push(DrawCommand::Text {
        anchor: t.to_view(Point2::new(bounds.center().x, bounds.y - LABEL_OFFSET)),
        text: block.id().to_string(),
        style: TextStyle {
            color: border,
            size: 11.0 * z,
            bold: true,
            align: TextAlign::Center,
        },
    });

    if view.show_coordinates {
        let o = block.origin();
        scene.push(DrawCommand::Text {
            anchor: t.to_view(Point2::new(o.x, bounds.bottom() + LABEL_OFFSET)),
            text: format!("[{:.0},{:.0}]", o.x, o.y),
            style: TextStyle {
                color: DEBUG_TEXT,
                size: 8.0 * z,
                bold: false,
                align: TextAlign::Left,
            },
        });
    }
}

/// Canvas size used by [`render_editor`] for a page.
pub fn editor_canvas(page: Dimensions) -> Dimensions {
    let (w, h) = canvas_size_for_page(page);
    Dimensions::new(w as f64, h as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    fn template_with(n: usize) -> Template {
        let mut t = Template::default();
        for _ in 0..n {
            t.add_field_block();
        }
        t
    }

    #[test]
    fn one_circle_per_bubble() {
        let t = template_with(2);
        let scene = render_editor(&t, &ViewState::default(), None);
        assert_eq!(scene.circles().count(), 2 * 4 * 20);
        assert_eq!(editor_canvas(t.page_dimensions()), Dimensions::new(707.0, 484.0));
        assert_eq!((scene.width, scene.height), (707.0, 484.0));
    }

    #[test]
    fn page_is_first_and_blocks_keep_order() {
        let t = template_with(2);
        let view = ViewState {
            show_grid: false,
            ..ViewState::default()
        };
        let scene = render_editor(&t, &view, None);
        assert!(matches!(
            scene.commands.first(),
            Some(DrawCommand::Rect { fill: Some(c), .. }) if *c == Color::WHITE
        ));
        let captions: Vec<_> = scene.texts().filter(|s| s.starts_with("Column")).collect();
        assert_eq!(captions, ["Column1", "Column2"]);
    }

    #[test]
    fn grid_phase_follows_pan_not_zoom() {
        let t = Template::default();
        let mut view = ViewState::default();
        view.pan = Vector2::new(7.0, -3.0);
        view.set_zoom(2.5);
        let scene = render_editor(&t, &view, None);
        let xs: Vec<f64> = scene
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Path { points, .. } if points[0].y == 0.0 => Some(points[0].x),
                _ => None,
            })
            .collect();
        assert_eq!(xs[0], 7.0);
        assert_eq!(xs[1] - xs[0], GRID_SPACING);
    }

    #[test]
    fn selection_and_debug_overlay() {
        let t = template_with(1);
        let view = ViewState {
            selected: Some("Column1".into()),
            show_coordinates: true,
            ..ViewState::default()
        };
        let scene = render_editor(&t, &view, None);
        assert!(scene.texts().any(|s| s == "[100,50]"));
        let widths: Vec<f64> = scene
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rect {
                    stroke: Some(s), ..
                } if s.color == BORDER_SELECTED => Some(s.width),
                _ => None,
            })
            .collect();
        assert_eq!(widths, [4.0]);
    }

    #[test]
    fn background_is_drawn_only_when_enabled() {
        let t = Template::default();
        let bg = BackgroundImage::from_size(1000, 1000).expect("bg");
        let mut view = ViewState::default();
        let scene = render_editor(&t, &view, Some(&bg));
        assert!(matches!(
            scene.commands.get(1),
            Some(DrawCommand::Image { opacity, .. }) if *opacity == BACKGROUND_OPACITY
        ));
        view.toggle_background();
        let scene = render_editor(&t, &view, Some(&bg));
        assert!(!scene
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Image { .. })));
    }
}
