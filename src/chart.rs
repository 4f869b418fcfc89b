use std::{
    f64::consts::PI,
    io::{BufWriter, Write},
    ops::Range,
    path::Path,
};

use fs_err::File;
use itertools::Itertools;
use svg::{
    node::element::{Circle, Group, Line, Polygon, Rectangle, Text},
    Document,
};

use crate::{occurrence::Aggregation, time_of_day::SECONDS_PER_DAY};

const COLORS: [&str; 8] = [
    "blue", "red", "yellow", "black", "magenta", "green", "cyan", "white",
];

#[derive(Clone, Copy, Debug)]
enum Marker {
    Square,
    Circle,
    TriangleDown,
    Diamond,
    Pentagon,
    Star,
    Plus,
    Cross,
}
const MARKERS: [Marker; 8] = [
    Marker::Square,
    Marker::Circle,
    Marker::TriangleDown,
    Marker::Diamond,
    Marker::Pentagon,
    Marker::Star,
    Marker::Plus,
    Marker::Cross,
];

const WIDTH: f64 = 1200.;
const HEIGHT: f64 = 720.;
const MARKER_RADIUS: f64 = 5.;
const LEGEND_LINE: f64 = 18.;

/// Plots when each of the `top_n` most played songs was on air:
/// one column per day, the hour of day upwards.
pub fn render_most_played(aggregation: &Aggregation, top_n: usize, station_name: &str) -> Document {
    let (left, right, top, bottom) = (60., WIDTH - 20., 50., HEIGHT - 60.);
    let days = aggregation.day_index().len().max(1) as f64;
    let x = |day_index: usize| map_float(day_index as f64, -0.5..days - 0.5, left..right);
    let y = |hours: f64| map_float(hours, 0.0..24.0, bottom..top);

    let mut document = Document::new()
        .set("viewBox", (0, 0, WIDTH, HEIGHT))
        .add(
            Rectangle::new()
                .set("width", WIDTH)
                .set("height", HEIGHT)
                .set("fill", "white"),
        );

    for hour in 1..SECONDS_PER_DAY / 3600 {
        let y = y(hour as f64);
        document = document
            .add(
                Line::new()
                    .set("x1", left)
                    .set("x2", right)
                    .set("y1", y)
                    .set("y2", y)
                    .set("stroke", "gray")
                    .set("stroke-width", 0.3),
            )
            .add(
                Text::new(format!("{hour:02}:00"))
                    .set("x", left - 6.)
                    .set("y", y)
                    .set("text-anchor", "end")
                    .set("dominant-baseline", "central")
                    .set("font-size", 10),
            );
    }
    for (day, &i) in aggregation.day_index() {
        document = document
            .add(
                Line::new()
                    .set("x1", x(i))
                    .set("x2", x(i))
                    .set("y1", bottom)
                    .set("y2", bottom + 5.)
                    .set("stroke", "black"),
            )
            .add(
                Text::new(day.to_string())
                    .set("x", x(i))
                    .set("y", bottom + 18.)
                    .set("text-anchor", "middle")
                    .set("font-size", 12),
            );
    }
    document = document
        .add(
            Rectangle::new()
                .set("x", left)
                .set("y", top)
                .set("width", right - left)
                .set("height", bottom - top)
                .set("fill", "none")
                .set("stroke", "black"),
        )
        .add(
            Text::new("day")
                .set("x", (left + right) / 2.)
                .set("y", HEIGHT - 15.)
                .set("text-anchor", "middle")
                .set("font-size", 14),
        )
        .add(
            Text::new("hour of day")
                .set("font-size", 14)
                .set("text-anchor", "middle")
                .set(
                    "transform",
                    format!("translate(15, {}) rotate(-90)", (top + bottom) / 2.),
                ),
        );

    let ranked = aggregation.ranked().into_iter().take(top_n).collect_vec();
    document = document.add(
        Text::new(format!("{station_name} {} most wanted", ranked.len()))
            .set("x", WIDTH / 2.)
            .set("y", top / 2.)
            .set("text-anchor", "middle")
            .set("dominant-baseline", "central")
            .set("font-size", 20),
    );

    for (rank, (_, events)) in ranked.iter().enumerate() {
        let mut series = Group::new().set("class", "series");
        for event in *events {
            series = series.add(marker(
                rank,
                x(event.day_index()),
                y(event.time_of_day().hours_f64()),
            ));
        }
        document = document.add(series);
    }

    if !ranked.is_empty() {
        let longest = ranked
            .iter()
            .map(|(song, _)| song.to_string().chars().count())
            .max()
            .unwrap_or(0);
        let width = longest as f64 * 6.5 + 40.;
        let height = ranked.len() as f64 * LEGEND_LINE + 10.;
        let (legend_x, legend_y) = (right - width - 10., bottom - height - 10.);
        let mut legend = Group::new().set("class", "legend").add(
            Rectangle::new()
                .set("x", legend_x)
                .set("y", legend_y)
                .set("width", width)
                .set("height", height)
                .set("fill", "white")
                .set("fill-opacity", 0.8)
                .set("stroke", "gray"),
        );
        for (rank, (song, _)) in ranked.iter().enumerate() {
            let line_y = legend_y + 5. + LEGEND_LINE * (rank as f64 + 0.5);
            legend = legend
                .add(marker(rank, legend_x + 15., line_y))
                .add(
                    Text::new(song.to_string())
                        .set("x", legend_x + 30.)
                        .set("y", line_y)
                        .set("dominant-baseline", "central")
                        .set("font-size", 11),
                );
        }
        document = document.add(legend);
    }

    document
}

pub fn save_chart(path: &Path, document: &Document) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    svg::write(&mut writer, document)?;
    writer.flush()?;
    Ok(())
}

fn marker(rank: usize, cx: f64, cy: f64) -> Group {
    let color = COLORS[rank % COLORS.len()];
    let r = MARKER_RADIUS;
    let filled = |shape: Group| {
        shape
            .set("fill", color)
            .set("stroke", "black")
            .set("stroke-width", 0.5)
    };
    let stroked = |shape: Group| shape.set("stroke", color).set("stroke-width", 2);
    let polygon = |points: Vec<(f64, f64)>| {
        Polygon::new().set(
            "points",
            points.iter().map(|(x, y)| format!("{x:.2},{y:.2}")).join(" "),
        )
    };
    let line = |(x1, y1): (f64, f64), (x2, y2): (f64, f64)| {
        Line::new()
            .set("x1", x1)
            .set("y1", y1)
            .set("x2", x2)
            .set("y2", y2)
    };

    match MARKERS[rank % MARKERS.len()] {
        Marker::Square => filled(
            Group::new().add(
                Rectangle::new()
                    .set("x", cx - r)
                    .set("y", cy - r)
                    .set("width", 2. * r)
                    .set("height", 2. * r),
            ),
        ),
        Marker::Circle => filled(
            Group::new().add(Circle::new().set("cx", cx).set("cy", cy).set("r", r)),
        ),
        Marker::TriangleDown => filled(Group::new().add(polygon(vec![
            (cx - r, cy - r),
            (cx + r, cy - r),
            (cx, cy + r),
        ]))),
        Marker::Diamond => filled(Group::new().add(polygon(vec![
            (cx, cy - r),
            (cx + r, cy),
            (cx, cy + r),
            (cx - r, cy),
        ]))),
        Marker::Pentagon => filled(Group::new().add(polygon(star_points(cx, cy, &[r], 5)))),
        Marker::Star => filled(Group::new().add(polygon(star_points(cx, cy, &[r, r * 0.45], 5)))),
        Marker::Plus => stroked(
            Group::new()
                .add(line((cx - r, cy), (cx + r, cy)))
                .add(line((cx, cy - r), (cx, cy + r))),
        ),
        Marker::Cross => stroked(
            Group::new()
                .add(line((cx - r, cy - r), (cx + r, cy + r)))
                .add(line((cx - r, cy + r), (cx + r, cy - r))),
        ),
    }
}

/// Vertices around `(cx, cy)` starting straight up, cycling through `radii`, `spikes * radii.len()` in total.
fn star_points(cx: f64, cy: f64, radii: &[f64], spikes: usize) -> Vec<(f64, f64)> {
    let n = spikes * radii.len();
    (0..n)
        .map(|i| {
            let angle = 2. * PI * i as f64 / n as f64;
            let r = radii[i % radii.len()];
            (cx + r * angle.sin(), cy - r * angle.cos())
        })
        .collect()
}

fn map_float(a: f64, src: Range<f64>, dst: Range<f64>) -> f64 {
    dst.start + (dst.end - dst.start) * (a - src.start) / (src.end - src.start)
}
