/// Percentage of the script scrolled past, in `[0, 100]`.
///
/// Returns 0 until the bound is known so the bar does not jump before the
/// first geometry measurement.
pub fn progress(position: f64, max_scroll: f64) -> f64 {
    if max_scroll.is_nan() || max_scroll <= 0.0 {
        return 0.0;
    }
    let pct = position / max_scroll * 100.0;
    if pct.is_nan() {
        return 0.0;
    }
    pct.clamp(0.0, 100.0)
}
