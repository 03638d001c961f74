//! Floating chart window for the selected well's time series.

use crate::timeseries::{ChartPresenter, ChartSpec};
use chrono::{DateTime, Utc};
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Vec2};

const MARGIN_LEFT: f32 = 60.0;
const MARGIN_BOTTOM: f32 = 40.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_RIGHT: f32 = 16.0;
const TICK_COUNT: usize = 5;

pub fn render_chart_window(ctx: &egui::Context, presenter: &mut ChartPresenter) {
    if !presenter.is_open() {
        return;
    }
    let Some(spec) = presenter.current() else {
        return;
    };

    let mut open = true;
    egui::Window::new(spec.title.as_str())
        .id(egui::Id::new("chart_window"))
        .open(&mut open)
        .default_size([560.0, 340.0])
        .resizable(true)
        .show(ctx, |ui| render_chart(ui, spec));

    if !open {
        presenter.close();
    }
}

fn render_chart(ui: &mut egui::Ui, spec: &ChartSpec) {
    let size = ui.available_size().max(Vec2::new(300.0, 200.0));
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;

    painter.rect_filled(rect, 2.0, Color32::from_rgb(30, 30, 40));

    let plot = Rect::from_min_max(
        rect.min + Vec2::new(MARGIN_LEFT, MARGIN_TOP),
        rect.max - Vec2::new(MARGIN_RIGHT, MARGIN_BOTTOM),
    );
    let axis_stroke = Stroke::new(1.0, Color32::from_rgb(90, 90, 110));
    let label_color = Color32::from_rgb(180, 180, 200);
    let font = FontId::proportional(10.0);

    painter.line_segment([plot.left_bottom(), plot.right_bottom()], axis_stroke);
    painter.line_segment([plot.left_bottom(), plot.left_top()], axis_stroke);

    painter.text(
        rect.left_top() + Vec2::new(6.0, 4.0),
        Align2::LEFT_TOP,
        &spec.y_axis_title,
        FontId::proportional(11.0),
        label_color,
    );
    painter.text(
        Pos2::new(plot.center().x, rect.bottom() - 4.0),
        Align2::CENTER_BOTTOM,
        &spec.x_axis_title,
        FontId::proportional(11.0),
        label_color,
    );

    let (Some((t_min, t_max)), Some((v_min, v_max))) = (spec.time_range(), spec.value_range())
    else {
        painter.text(
            plot.center(),
            Align2::CENTER_CENTER,
            "No data",
            FontId::proportional(13.0),
            label_color,
        );
        return;
    };

    let (t_min, t_max) = widen(t_min, t_max);
    let (v_min, v_max) = widen(v_min, v_max);
    let to_screen = |t: f64, v: f64| {
        Pos2::new(
            plot.left() + ((t - t_min) / (t_max - t_min)) as f32 * plot.width(),
            plot.bottom() - ((v - v_min) / (v_max - v_min)) as f32 * plot.height(),
        )
    };

    for t in ticks(t_min, t_max, TICK_COUNT) {
        let x = to_screen(t, v_min).x;
        painter.line_segment([Pos2::new(x, plot.bottom()), Pos2::new(x, plot.bottom() + 4.0)], axis_stroke);
        painter.text(
            Pos2::new(x, plot.bottom() + 6.0),
            Align2::CENTER_TOP,
            time_tick_label(t),
            font.clone(),
            label_color,
        );
    }

    for v in ticks(v_min, v_max, TICK_COUNT) {
        let y = to_screen(t_min, v).y;
        painter.line_segment([Pos2::new(plot.left() - 4.0, y), Pos2::new(plot.left(), y)], axis_stroke);
        painter.text(
            Pos2::new(plot.left() - 6.0, y),
            Align2::RIGHT_CENTER,
            format!("{:.1}", v),
            font.clone(),
            label_color,
        );
    }

    let points: Vec<Pos2> = spec
        .series
        .data
        .iter()
        .map(|p| to_screen(p[0], p[1]))
        .collect();
    let line_color = Color32::from_rgb(80, 170, 255);
    painter.add(Shape::line(points.clone(), Stroke::new(1.5, line_color)));
    for point in points {
        painter.circle_filled(point, 2.5, line_color);
    }
}

/// Expands a degenerate range so it can be divided by.
fn widen(lo: f64, hi: f64) -> (f64, f64) {
    if hi - lo > f64::EPSILON {
        (lo, hi)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}

/// Evenly spaced ticks from `lo` to `hi` inclusive.
fn ticks(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![lo];
    }
    let step = (hi - lo) / (count - 1) as f64;
    (0..count).map(|i| lo + step * i as f64).collect()
}

/// Formats an epoch-millisecond timestamp as a UTC date.
fn time_tick_label(ms: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("{:.0}", ms))
}
