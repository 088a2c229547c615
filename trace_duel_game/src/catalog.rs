// Built-in outline catalog: a deterministic `ShapeProvider`.
//
// Each title is a handful of polylines laid out on the default 400x400
// canvas. `OutlineCatalog::pixels` walks every segment in unit steps and
// emits one pixel per step, so the result depends only on the title. The
// drawings are deliberately crude; a host with real artwork injects its own
// provider instead.

use crate::shape::{ShapeProvider, ShapeTitle};
use crate::types::Pixel;

/// A polyline as a list of `(x, y)` vertices.
type Stroke = Vec<(f64, f64)>;

#[derive(Clone, Copy, Debug, Default)]
pub struct OutlineCatalog;

impl ShapeProvider for OutlineCatalog {
    fn pixels(&self, title: ShapeTitle) -> Vec<Pixel> {
        strokes(title).iter().flat_map(|s| trace_stroke(s)).collect()
    }
}

fn strokes(title: ShapeTitle) -> Vec<Stroke> {
    match title {
        ShapeTitle::Circle => vec![arc((200.0, 200.0), 120.0, 0.0, 360.0)],
        ShapeTitle::Square => vec![closed(&[
            (100.0, 100.0),
            (300.0, 100.0),
            (300.0, 300.0),
            (100.0, 300.0),
        ])],
        ShapeTitle::Star => {
            let points: Vec<(f64, f64)> = (0..10)
                .map(|i| {
                    let radius = if i % 2 == 0 { 150.0 } else { 60.0 };
                    let angle = (-90.0 + 36.0 * f64::from(i)).to_radians();
                    (200.0 + radius * angle.cos(), 210.0 + radius * angle.sin())
                })
                .collect();
            vec![closed(&points)]
        }
        ShapeTitle::Umbrella => vec![
            arc((200.0, 200.0), 150.0, 180.0, 360.0),
            vec![(50.0, 200.0), (350.0, 200.0)],
            vec![(200.0, 200.0), (200.0, 330.0)],
            arc((180.0, 330.0), 20.0, 0.0, 180.0),
        ],
        ShapeTitle::House => vec![
            closed(&[(100.0, 180.0), (300.0, 180.0), (300.0, 340.0), (100.0, 340.0)]),
            vec![(80.0, 180.0), (200.0, 70.0), (320.0, 180.0)],
            vec![(180.0, 340.0), (180.0, 270.0), (220.0, 270.0), (220.0, 340.0)],
        ],
        ShapeTitle::ChristmasTree => vec![
            closed(&[
                (200.0, 40.0),
                (260.0, 130.0),
                (230.0, 130.0),
                (300.0, 220.0),
                (260.0, 220.0),
                (340.0, 310.0),
                (60.0, 310.0),
                (140.0, 220.0),
                (100.0, 220.0),
                (170.0, 130.0),
                (140.0, 130.0),
            ]),
            closed(&[(180.0, 310.0), (220.0, 310.0), (220.0, 360.0), (180.0, 360.0)]),
        ],
        ShapeTitle::Helicopter => vec![
            arc((170.0, 210.0), 60.0, 0.0, 360.0),
            vec![(230.0, 200.0), (350.0, 190.0), (350.0, 220.0), (230.0, 220.0)],
            vec![(340.0, 170.0), (360.0, 240.0)],
            vec![(170.0, 150.0), (170.0, 120.0)],
            vec![(60.0, 120.0), (280.0, 120.0)],
            vec![(120.0, 290.0), (230.0, 290.0)],
            vec![(140.0, 265.0), (140.0, 290.0)],
            vec![(200.0, 265.0), (200.0, 290.0)],
        ],
        ShapeTitle::Car => vec![
            closed(&[
                (50.0, 260.0),
                (50.0, 210.0),
                (120.0, 200.0),
                (160.0, 150.0),
                (260.0, 150.0),
                (300.0, 200.0),
                (350.0, 210.0),
                (350.0, 260.0),
            ]),
            arc((120.0, 265.0), 30.0, 0.0, 360.0),
            arc((280.0, 265.0), 30.0, 0.0, 360.0),
        ],
        ShapeTitle::Husky => vec![
            closed(&[
                (120.0, 140.0),
                (140.0, 60.0),
                (180.0, 110.0),
                (220.0, 110.0),
                (260.0, 60.0),
                (280.0, 140.0),
                (290.0, 230.0),
                (240.0, 300.0),
                (160.0, 300.0),
                (110.0, 230.0),
            ]),
            arc((165.0, 180.0), 12.0, 0.0, 360.0),
            arc((235.0, 180.0), 12.0, 0.0, 360.0),
            vec![(185.0, 250.0), (200.0, 265.0), (215.0, 250.0)],
        ],
    }
}

/// Close a polygon by repeating its first vertex.
fn closed(points: &[(f64, f64)]) -> Stroke {
    let mut stroke = points.to_vec();
    if let Some(first) = points.first() {
        stroke.push(*first);
    }
    stroke
}

/// Arc from `start_deg` to `end_deg` (clockwise in screen space), one vertex
/// per 5 degrees.
fn arc(center: (f64, f64), radius: f64, start_deg: f64, end_deg: f64) -> Stroke {
    let steps = ((end_deg - start_deg) / 5.0).ceil().max(1.0) as u32;
    (0..=steps)
        .map(|i| {
            let deg = start_deg + (end_deg - start_deg) * f64::from(i) / f64::from(steps);
            let rad = deg.to_radians();
            (center.0 + radius * rad.cos(), center.1 + radius * rad.sin())
        })
        .collect()
}

/// Walk each segment in steps of at most one pixel, rounding to whole
/// canvas coordinates and skipping immediate repeats.
fn trace_stroke(stroke: &[(f64, f64)]) -> Vec<Pixel> {
    let mut out: Vec<Pixel> = Vec::new();
    for pair in stroke.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = f64::from(i) / f64::from(steps);
            let p = Pixel::new((x0 + (x1 - x0) * t).round(), (y0 + (y1 - y0) * t).round());
            if out.last() != Some(&p) {
                out.push(p);
            }
        }
    }
    out
}
