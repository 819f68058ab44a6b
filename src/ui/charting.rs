use crate::time_series::PerformanceSample;

/// X (seconds) and Y (wpm) upper bounds for the results chart
pub fn compute_chart_params(samples: &[PerformanceSample], duration_secs: u32) -> (f64, f64) {
    let highest_wpm = samples.iter().map(|s| s.wpm).max().unwrap_or(0);

    let overall_duration = samples
        .last()
        .map(|s| s.elapsed_second as f64)
        .unwrap_or(duration_secs as f64)
        .max(1.0);

    // leave a little headroom so the peak is not drawn on the border
    let y_max = ((highest_wpm as f64 * 1.1) / 10.0).ceil() * 10.0;

    (overall_duration, y_max.max(10.0))
}

/// Format a numeric axis label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
