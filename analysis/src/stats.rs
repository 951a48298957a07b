//! Descriptive statistics, Pearson correlation and IQR outlier fences.

use eda_dataset::Frame;
use eda_types::{ColumnOutliers, ColumnSummary, CorrelationMatrix};

/// Quantile of already-sorted data, interpolating linearly between order
/// statistics at position `q * (n - 1)`.
#[must_use]
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn present_sorted(values: &[Option<f64>]) -> Vec<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(f64::total_cmp);
    present
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Summary of every numeric column, target included.
#[must_use]
pub fn describe(frame: &Frame) -> Vec<ColumnSummary> {
    frame
        .columns()
        .iter()
        .filter(|c| c.is_numeric())
        .map(|column| {
            let sorted = present_sorted(&column.numeric_values());
            ColumnSummary {
                column: column.name().to_string(),
                count: sorted.len(),
                mean: mean(&sorted),
                std: sample_std(&sorted),
                min: sorted.first().copied(),
                q25: quantile(&sorted, 0.25),
                median: quantile(&sorted, 0.5),
                q75: quantile(&sorted, 0.75),
                max: sorted.last().copied(),
            }
        })
        .collect()
}

/// Pearson coefficient over rows where both sides are present.
#[must_use]
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Correlation matrix of the numeric columns, leaving out `target`.
#[must_use]
pub fn correlation(frame: &Frame, target: Option<&str>) -> CorrelationMatrix {
    let columns: Vec<_> = frame
        .columns()
        .iter()
        .filter(|c| c.is_numeric() && Some(c.name()) != target)
        .collect();
    let data: Vec<Vec<Option<f64>>> = columns.iter().map(|c| c.numeric_values()).collect();

    let k = columns.len();
    let mut values = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = pearson(&data[i], &data[j]);
            let r = if i == j { r.map(|_| 1.0) } else { r };
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix {
        columns: columns.iter().map(|c| c.name().to_string()).collect(),
        values,
    }
}

/// IQR fences per column; values strictly outside `[Q1 - k*IQR, Q3 + k*IQR]`
/// are flagged with their row index.
#[must_use]
pub fn detect_outliers(frame: &Frame, columns: &[String], multiplier: f64) -> Vec<ColumnOutliers> {
    columns
        .iter()
        .filter_map(|name| frame.column(name))
        .filter(|c| c.is_numeric())
        .filter_map(|column| {
            let values = column.numeric_values();
            let sorted = present_sorted(&values);
            let q1 = quantile(&sorted, 0.25)?;
            let q3 = quantile(&sorted, 0.75)?;
            let iqr = q3 - q1;
            let lower_bound = q1 - multiplier * iqr;
            let upper_bound = q3 + multiplier * iqr;
            let (rows, flagged): (Vec<usize>, Vec<f64>) = values
                .iter()
                .enumerate()
                .filter_map(|(row, v)| v.map(|v| (row, v)))
                .filter(|(_, v)| *v < lower_bound || *v > upper_bound)
                .unzip();
            Some(ColumnOutliers {
                column: column.name().to_string(),
                q1,
                q3,
                iqr,
                lower_bound,
                upper_bound,
                rows,
                values: flagged,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use eda_dataset::{CsvOptions, Frame};

    use super::{correlation, describe, detect_outliers, pearson, quantile};

    fn frame(csv: &str) -> Frame {
        Frame::from_reader(csv.as_bytes(), &CsvOptions::default()).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert!(close(quantile(&data, 0.25).unwrap(), 1.75));
        assert!(close(quantile(&data, 0.5).unwrap(), 2.5));
        assert!(close(quantile(&data, 1.0).unwrap(), 4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn describe_matches_sample_statistics() {
        let summary = describe(&frame("a,b\n1,x\n2,y\n3,z\n4,w\n"));
        assert_eq!(summary.len(), 1);
        let a = &summary[0];
        assert_eq!(a.count, 4);
        assert!(close(a.mean.unwrap(), 2.5));
        assert!(close(a.std.unwrap(), (5.0_f64 / 3.0).sqrt()));
        assert_eq!(a.min, Some(1.0));
        assert_eq!(a.max, Some(4.0));
    }

    #[test]
    fn describe_single_value_has_no_std() {
        let summary = describe(&frame("a\n7\n"));
        assert_eq!(summary[0].std, None);
        assert_eq!(summary[0].median, Some(7.0));
    }

    #[test]
    fn pearson_uses_pairwise_complete_rows() {
        let a = [Some(1.0), Some(2.0), None, Some(3.0)];
        let b = [Some(2.0), Some(4.0), Some(100.0), Some(6.0)];
        assert!(close(pearson(&a, &b).unwrap(), 1.0));
        assert_eq!(pearson(&a[..1], &b[..1]), None);
    }

    #[test]
    fn correlation_excludes_target_and_is_symmetric() {
        let m = correlation(&frame("x,y,c,t\n1,3,5,0\n2,2,5,1\n3,1,5,0\n"), Some("t"));
        assert_eq!(m.columns, vec!["x", "y", "c"]);
        assert!(close(m.get("x", "y").unwrap(), -1.0));
        assert_eq!(m.get("x", "y"), m.get("y", "x"));
        assert_eq!(m.get("x", "x"), Some(1.0));
        assert_eq!(m.get("c", "c"), None);
        assert_eq!(m.get("x", "c"), None);
    }

    #[test]
    fn outliers_flag_values_outside_fences() {
        let f = frame("v,t\n1,0\n2,0\n3,0\n4,0\n100,0\n");
        let found = detect_outliers(&f, &["v".to_string()], 1.5);
        assert_eq!(found.len(), 1);
        let v = &found[0];
        assert!(close(v.q1, 2.0));
        assert!(close(v.q3, 4.0));
        assert!(close(v.upper_bound, 7.0));
        assert_eq!(v.rows, vec![4]);
        assert_eq!(v.values, vec![100.0]);
    }

    #[test]
    fn outliers_skip_empty_columns() {
        let f = frame("v,w\n,1\n,2\n");
        assert!(detect_outliers(&f, &["v".to_string()], 1.5).is_empty());
    }
}
