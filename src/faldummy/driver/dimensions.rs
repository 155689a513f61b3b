/// Bound `width` x `height` by the given maxima, keeping the aspect ratio.
///
/// Downscale only. The width bound is applied first, then the height bound
/// on the possibly already scaled height. The two steps run once each, in
/// that order, and the results are truncated, not rounded.
pub fn clamp(width: i64, height: i64, max_width: i64, max_height: i64) -> (i64, i64) {
    let mut width = width as f64;
    let mut height = height as f64;
    let max_width = max_width as f64;
    let max_height = max_height as f64;

    if width > max_width {
        let scale = max_width / width;
        width = max_width;
        height *= scale;
    }

    if height > max_height {
        let scale = max_height / height;
        height = max_height;
        width *= scale;
    }

    (width.trunc() as i64, height.trunc() as i64)
}
