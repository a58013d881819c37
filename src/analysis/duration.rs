//! Load-duration curves: the descending-sorted consumption of each year.

use chrono::{Datelike, NaiveDateTime};

use super::utility;

/// One year's load-duration curve.
#[derive(Debug)]
pub struct DurationCurve {
    pub year: i32,
    /// Consumption sorted descending; missing samples filled with the
    /// year's median before sorting.
    pub sorted: Vec<f64>,
    /// How many samples of the year were missing.
    pub missing: usize,
}

/// Splits `series` by calendar year and builds each year's duration curve.
/// Years are returned in ascending order; timestamps and series run in
/// parallel and must have equal length.
pub fn yearly_duration_curves(
    timestamps: &[NaiveDateTime],
    series: &[f64],
) -> Vec<DurationCurve> {
    let mut curves: Vec<DurationCurve> = Vec::new();

    let mut years: Vec<i32> = timestamps.iter().map(|t| t.year()).collect();
    years.dedup();

    for year in years {
        let values: Vec<f64> = timestamps
            .iter()
            .zip(series)
            .filter(|(t, _)| t.year() == year)
            .map(|(_, &v)| v)
            .collect();
        curves.push(duration_curve(year, &values));
    }
    curves
}

fn duration_curve(year: i32, values: &[f64]) -> DurationCurve {
    let missing = values.iter().filter(|v| v.is_nan()).count();
    let fill = utility::median(values);
    let mut sorted: Vec<f64> = values
        .iter()
        .map(|&v| if v.is_nan() { fill } else { v })
        .collect();
    sorted.sort_by(|a, b| b.total_cmp(a));
    DurationCurve {
        year,
        sorted,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_curves_split_by_year_and_sort_descending() {
        let timestamps = [
            stamp(2010, 1, 1),
            stamp(2010, 6, 1),
            stamp(2011, 1, 1),
            stamp(2011, 6, 1),
            stamp(2011, 12, 1),
        ];
        let series = [50.0, 80.0, 60.0, 90.0, 70.0];

        let curves = yearly_duration_curves(&timestamps, &series);
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].year, 2010);
        assert_eq!(curves[0].sorted, vec![80.0, 50.0]);
        assert_eq!(curves[1].year, 2011);
        assert_eq!(curves[1].sorted, vec![90.0, 70.0, 60.0]);
    }

    #[test]
    fn test_missing_filled_with_year_median() {
        let timestamps = [stamp(2010, 1, 1), stamp(2010, 2, 1), stamp(2010, 3, 1)];
        let series = [40.0, f64::NAN, 60.0];

        let curves = yearly_duration_curves(&timestamps, &series);
        assert_eq!(curves[0].missing, 1);
        // Median of {40, 60} = 50 stands in for the hole.
        assert_eq!(curves[0].sorted, vec![60.0, 50.0, 40.0]);
    }
}
