use criterion::{black_box, criterion_group, criterion_main, Criterion};
use omr_layout_core::{AlignmentQuality, Dimensions, Template};
use omr_layout_editor::{render_editor, render_overlay, ViewState};

fn template(blocks: usize) -> Template {
    let mut t = Template::default();
    for _ in 0..blocks {
        t.add_field_block();
    }
    t
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    for blocks in [1usize, 4, 12] {
        let t = template(blocks);
        let view = ViewState::default();
        group.bench_function(format!("editor_{blocks}_blocks"), |b| {
            b.iter(|| render_editor(black_box(&t), black_box(&view), None))
        });
        group.bench_function(format!("overlay_{blocks}_blocks"), |b| {
            b.iter(|| {
                render_overlay(
                    black_box(&t),
                    Dimensions::new(1920.0, 1080.0),
                    AlignmentQuality::Good,
                )
            })
        });
    }
    group.finish();

    let t = template(4);
    let scene = render_editor(&t, &ViewState::default(), None);
    c.bench_function("svg_4_blocks", |b| b.iter(|| black_box(&scene).to_svg()));
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
