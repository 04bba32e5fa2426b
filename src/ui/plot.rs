use std::f64::consts::TAU;
use std::ops::RangeInclusive;

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoint,
    PlotPoints, Points, Polygon, Text,
};

use crate::chart::Chart;
use crate::chart::data::{BoxChart, CategoryChart, Correlation, Histogram, XyChart};
use crate::color::{annotation_color, coolwarm, generate_palette};
use crate::state::AppState;

const PLOT_HEIGHT: f32 = 360.0;

// ---------------------------------------------------------------------------
// Chart area (central panel)
// ---------------------------------------------------------------------------

/// Render the current chart, or the warning explaining why there is none.
pub fn chart_plot(ui: &mut Ui, state: &AppState) {
    match &state.chart {
        None => {
            ui.label("No chart.");
        }
        Some(Err(warning)) => {
            ui.label(RichText::new(format!("⚠ {warning}")).color(Color32::YELLOW));
        }
        Some(Ok(chart)) => match chart {
            Chart::Histogram(h) => histogram(ui, h),
            Chart::Box(b) => box_plot(ui, b),
            Chart::Scatter(s) => xy_plot(ui, s, false),
            Chart::Line(l) => xy_plot(ui, l, true),
            Chart::Bar(b) => bar_chart(ui, b),
            Chart::Pie(p) => pie_chart(ui, p),
            Chart::Heatmap(c) => heatmap(ui, c),
        },
    }
}

/// Axis formatter that prints category names at integer positions.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let pos = mark.value.round();
        if (mark.value - pos).abs() > 1e-6 || pos < 0.0 {
            return String::new();
        }
        labels.get(pos as usize).cloned().unwrap_or_default()
    }
}

fn histogram(ui: &mut Ui, h: &Histogram) {
    let bars: Vec<Bar> = h
        .bins
        .iter()
        .map(|b| {
            Bar::new((b.start + b.end) / 2.0, b.count as f64)
                .width(b.end - b.start)
                .name(format!("{:.3} – {:.3}", b.start, b.end))
        })
        .collect();
    Plot::new("histogram")
        .height(PLOT_HEIGHT)
        .x_axis_label(&h.column)
        .y_axis_label("count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE).name(&h.column));
        });
}

fn box_plot(ui: &mut Ui, b: &BoxChart) {
    let colors = generate_palette(b.groups.len());
    let labels: Vec<String> = b.groups.iter().map(|g| g.label.clone()).collect();
    Plot::new("box_plot")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(&b.x)
        .y_axis_label(&b.y)
        .x_axis_formatter(category_axis(labels))
        .show(ui, |plot_ui| {
            for (i, (g, color)) in b.groups.iter().zip(colors).enumerate() {
                let spread = BoxSpread::new(g.lower_whisker, g.q1, g.median, g.q3, g.upper_whisker);
                let elem = BoxElem::new(i as f64, spread)
                    .name(&g.label)
                    .box_width(0.5)
                    .fill(color.gamma_multiply(0.4))
                    .stroke(Stroke::new(1.5, color));
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&g.label).color(color));
                if !g.outliers.is_empty() {
                    let pts: Vec<[f64; 2]> = g.outliers.iter().map(|&v| [i as f64, v]).collect();
                    plot_ui.points(Points::new(pts).radius(3.0).color(color));
                }
            }
        });
}

fn xy_plot(ui: &mut Ui, c: &XyChart, connect: bool) {
    let mut plot = Plot::new(if connect { "line_chart" } else { "scatter_plot" })
        .height(PLOT_HEIGHT)
        .x_axis_label(&c.x)
        .y_axis_label(&c.y)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if !c.x_labels.is_empty() {
        plot = plot.x_axis_formatter(category_axis(c.x_labels.clone()));
    }
    let points = PlotPoints::from(c.points.clone());
    plot.show(ui, |plot_ui| {
        if connect {
            plot_ui.line(Line::new(points).name(&c.y).color(Color32::LIGHT_BLUE).width(1.5));
        } else {
            plot_ui.points(Points::new(points).name(&c.y).color(Color32::LIGHT_BLUE).radius(3.0));
        }
    });
}

fn bar_chart(ui: &mut Ui, c: &CategoryChart) {
    let labels: Vec<String> = c.entries.iter().map(|(l, _)| l.clone()).collect();
    let bars: Vec<Bar> = c
        .entries
        .iter()
        .enumerate()
        .map(|(i, (label, value))| Bar::new(i as f64, *value).width(0.7).name(label))
        .collect();
    Plot::new("bar_chart")
        .height(PLOT_HEIGHT)
        .x_axis_label(&c.x)
        .y_axis_label(&c.y)
        .x_axis_formatter(category_axis(labels))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE).name(&c.y));
        });
}

/// Points on the arc of a slice from angle `a0` to `a1`, closed at the centre.
fn wedge(a0: f64, a1: f64) -> Vec<[f64; 2]> {
    let steps = (((a1 - a0) / TAU) * 120.0).ceil().max(2.0) as usize;
    let mut pts = vec![[0.0, 0.0]];
    pts.extend((0..=steps).map(|s| {
        let a = a0 + (a1 - a0) * s as f64 / steps as f64;
        [a.cos(), a.sin()]
    }));
    pts
}

fn pie_chart(ui: &mut Ui, c: &CategoryChart) {
    let total: f64 = c.entries.iter().map(|(_, v)| v).sum();
    if total <= 0.0 {
        ui.label("Nothing to show: all values are zero.");
        return;
    }
    let colors = generate_palette(c.entries.len());
    Plot::new("pie_chart")
        .height(PLOT_HEIGHT)
        .data_aspect(1.0)
        .legend(Legend::default())
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let mut angle = TAU / 4.0;
            for ((label, value), color) in c.entries.iter().zip(colors) {
                let sweep = value / total * TAU;
                let share = format!("{label} ({:.1}%)", value / total * 100.0);
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(wedge(angle - sweep, angle)))
                        .fill_color(color)
                        .stroke(Stroke::new(1.0, Color32::WHITE))
                        .name(share),
                );
                angle -= sweep;
            }
        });
}

fn heatmap(ui: &mut Ui, c: &Correlation) {
    let n = c.columns.len();
    let x_labels = c.columns.clone();
    // Row i is drawn at y = -i so the first column is on top.
    let y_labels = c.columns.clone();
    Plot::new("heatmap")
        .height(PLOT_HEIGHT.max(40.0 * n as f32))
        .data_aspect(1.0)
        .show_grid(false)
        .x_axis_formatter(category_axis(x_labels))
        .y_axis_formatter(move |mark, _range| {
            let pos = -mark.value.round();
            if (mark.value + pos).abs() > 1e-6 || pos < 0.0 {
                return String::new();
            }
            y_labels.get(pos as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            for (i, row) in c.matrix.iter().enumerate() {
                for (j, value) in row.iter().enumerate() {
                    let (x, y) = (j as f64, -(i as f64));
                    let cell = vec![
                        [x - 0.5, y - 0.5],
                        [x + 0.5, y - 0.5],
                        [x + 0.5, y + 0.5],
                        [x - 0.5, y + 0.5],
                    ];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(cell))
                            .fill_color(coolwarm(*value))
                            .stroke(Stroke::new(0.5, Color32::WHITE)),
                    );
                    let text = value.map_or_else(String::new, |v| format!("{v:.2}"));
                    plot_ui.text(Text::new(
                        PlotPoint::new(x, y),
                        RichText::new(text).color(annotation_color(*value)),
                    ));
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wedge_starts_at_centre_and_stays_on_unit_circle() {
        let pts = wedge(0.0, TAU / 4.0);
        assert_eq!(pts[0], [0.0, 0.0]);
        for p in &pts[1..] {
            assert!(((p[0] * p[0] + p[1] * p[1]).sqrt() - 1.0).abs() < 1e-9);
        }
        let last = pts.last().unwrap();
        assert!(last[0].abs() < 1e-9 && (last[1] - 1.0).abs() < 1e-9);
    }
}
