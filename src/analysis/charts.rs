//! PNG chart rendering for the analysis commands.
//!
//! The x axis of the time charts is counted in days since the start of
//! the aggregated series; power is in GW.

use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;

use super::duration::DurationCurve;
use super::records::WeeklyStats;

/// Production columns in stacking order (bottom to top), with the portal's
/// traditional colors. `Solde` is the cross-border balance.
pub const MIX_STACKING: [(&str, RGBColor); 8] = [
    ("Autres", RGBColor(131, 3, 221)),
    ("Nucléaire", RGBColor(245, 218, 0)),
    ("Gaz", RGBColor(255, 140, 4)),
    ("Charbon", RGBColor(255, 87, 4)),
    ("Eolien", RGBColor(3, 221, 128)),
    ("Fioul + pointe", RGBColor(215, 24, 24)),
    ("Hydraulique", RGBColor(1, 92, 251)),
    ("Solde", RGBColor(53, 49, 55)),
];

/// Wind production color, matching its slice of the mix chart.
pub const WIND_COLOR: RGBColor = RGBColor(3, 221, 128);

fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        if v.is_nan() {
            continue;
        }
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi { (0.0, 1.0) } else { (lo, hi) }
}

/// Weekly consumption with a min/max envelope and the peak records marked.
pub fn consumption_chart(
    out: &Path,
    week_days: &[f64],
    weekly: &WeeklyStats,
    records: &[(f64, f64)],
) -> Result<()> {
    let root = BitMapBackend::new(out, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = week_days.last().copied().unwrap_or(1.0);
    let (_, y_max) = value_range(weekly.max.iter().copied());

    let mut chart = ChartBuilder::on(&root)
        .caption("Weekly electricity consumption", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..x_max * 1.02, 0.0..y_max * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Time (days)")
        .y_desc("Power (GW)")
        .draw()?;

    let weekly_points = |values: &[f64]| -> Vec<(f64, f64)> {
        week_days
            .iter()
            .zip(values)
            .filter(|(_, v)| !v.is_nan())
            .map(|(&d, &v)| (d, v))
            .collect()
    };

    chart
        .draw_series(LineSeries::new(weekly_points(&weekly.min), &BLUE.mix(0.4)))?
        .label("weekly min-max")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLUE.mix(0.4)));
    chart.draw_series(LineSeries::new(weekly_points(&weekly.max), &BLUE.mix(0.4)))?;

    chart
        .draw_series(LineSeries::new(weekly_points(&weekly.avg), &RED))?
        .label("weekly average")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], RED));

    chart
        .draw_series(
            records
                .iter()
                .map(|&(day, gw)| Circle::new((day, gw), 4, RED.filled())),
        )?
        .label("records")
        .legend(|(x, y)| Circle::new((x + 5, y), 4, RED.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// One descending consumption curve per year, against hours of the year.
pub fn load_duration_chart(out: &Path, curves: &[DurationCurve]) -> Result<()> {
    let root = BitMapBackend::new(out, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = curves
        .iter()
        .map(|c| c.sorted.len() as f64 / 4.0)
        .fold(0.0, f64::max);
    let (_, y_max) = value_range(curves.iter().flat_map(|c| c.sorted.iter().copied()));

    let mut chart = ChartBuilder::on(&root)
        .caption("Load duration curve", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..x_max * 1.02, 0.0..y_max * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Load duration (hours)")
        .y_desc("Power consumption (GW)")
        .draw()?;

    for (k, curve) in curves.iter().enumerate() {
        let color = Palette99::pick(k).to_rgba();
        chart
            .draw_series(LineSeries::new(
                curve
                    .sorted
                    .iter()
                    .enumerate()
                    .map(|(i, &gw)| (i as f64 / 4.0, gw)),
                &color,
            ))?
            .label(format!("year {}", curve.year))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Stacked production mix: each entry carries the cumulative top of its
/// layer, in stacking order.
pub fn production_mix_chart(
    out: &Path,
    days: &[f64],
    layers: &[(&str, RGBColor, Vec<f64>)],
) -> Result<()> {
    let root = BitMapBackend::new(out, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = days.last().copied().unwrap_or(1.0);
    let y_max = layers
        .last()
        .map(|(_, _, top)| value_range(top.iter().copied()).1)
        .unwrap_or(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption("Electricity production mix", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..x_max * 1.02, 0.0..y_max * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Time (days)")
        .y_desc("Power (GW)")
        .draw()?;

    // Topmost layer first; each lower layer paints over the one above it,
    // leaving only its slice visible.
    for (label, color, top) in layers.iter().rev() {
        chart
            .draw_series(AreaSeries::new(
                days.iter().zip(top).map(|(&d, &gw)| (d, gw)),
                0.0,
                color.mix(0.8),
            ))?
            .label(*label)
            .legend({
                let color = *color;
                move |(x, y)| Rectangle::new([(x, y - 4), (x + 10, y + 4)], color.filled())
            });
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Raw wind production with trailing 1-day / 7-day / 30-day averages.
pub fn wind_chart(
    out: &Path,
    days: &[f64],
    raw: &[f64],
    day1: &[f64],
    day7: &[f64],
    day30: &[f64],
) -> Result<()> {
    let root = BitMapBackend::new(out, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = days.last().copied().unwrap_or(1.0);
    let (_, y_max) = value_range(raw.iter().copied());

    let mut chart = ChartBuilder::on(&root)
        .caption("Wind power production", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..x_max * 1.02, 0.0..y_max * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Time (days)")
        .y_desc("Power (GW)")
        .draw()?;

    chart
        .draw_series(AreaSeries::new(
            days.iter().zip(raw).map(|(&d, &gw)| (d, gw)),
            0.0,
            WIND_COLOR.mix(0.4),
        ))?
        .label("15 min power")
        .legend(|(x, y)| Rectangle::new([(x, y - 4), (x + 10, y + 4)], WIND_COLOR.filled()));

    for (values, color, label) in [
        (day1, CYAN, "24 hours avg"),
        (day7, BLUE, "7 days avg"),
        (day30, RED, "30 days avg"),
    ] {
        chart
            .draw_series(LineSeries::new(
                days.iter().zip(values).map(|(&d, &gw)| (d, gw)),
                &color,
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
