//! Pure dimension math for the built-in modes
//!
//! All functions here are pure and testable without any images.

/// Largest size with the source aspect ratio that fits inside `target`
///
/// One edge matches the target exactly, the other is at most the target.
/// Never returns a zero edge.
pub fn fit_within(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let scale_w = tgt_w as f64 / src_w as f64;
    let scale_h = tgt_h as f64 / src_h as f64;

    if scale_w <= scale_h {
        // Width is the constraining edge
        let h = (src_h as f64 * scale_w).round() as u32;
        (tgt_w, h.clamp(1, tgt_h))
    } else {
        let w = (src_w as f64 * scale_h).round() as u32;
        (w.clamp(1, tgt_w), tgt_h)
    }
}

/// Smallest size with the source aspect ratio that covers `target`
///
/// One edge matches the target exactly, the other is at least the target.
pub fn cover(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height matches, width exceeds
        let w = (tgt_h as f64 * src_aspect).round() as u32;
        (w.max(tgt_w), tgt_h)
    } else {
        // Source is taller: width matches, height exceeds
        let h = (tgt_w as f64 / src_aspect).round() as u32;
        (tgt_w, h.max(tgt_h))
    }
}

/// Top-left corner that centres an `inner` box inside an `outer` box
pub fn centre_offset(outer: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(inner.0) / 2,
        outer.1.saturating_sub(inner.1) / 2,
    )
}

/// Whether `source` already fits inside `target` without scaling
pub fn fits_inside(source: (u32, u32), target: (u32, u32)) -> bool {
    source.0 <= target.0 && source.1 <= target.1
}
