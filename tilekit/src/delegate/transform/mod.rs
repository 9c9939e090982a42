//! Image transformers applied to decoded tiles.
//!
//! Every transformer is a pure function of its input raster: it never
//! mutates the input and returns a new raster, so a chain can run on any
//! thread without coordination.

mod color_limit;
mod color_to_alpha;
mod filter;
mod resize;
mod striping;
mod transparent_color;

pub use color_limit::ColorLimitTransformer;
pub use color_to_alpha::ColorToAlphaTransformer;
pub use filter::{FilterTransformer, PixelFilter, FILTER_NAMESPACES};
pub use resize::ResizeTransformer;
pub use striping::StripingFilterTransformer;
pub use transparent_color::TransparentColorTransformer;

/// Separable box average over a single-channel plane.
///
/// Each output sample is the mean of the samples within `h_radius` columns
/// and then `v_radius` rows of it. Windows are clipped at the edges and
/// averaged over the samples they actually cover. Sliding sums keep each
/// pass linear in the number of samples.
pub(crate) fn box_average(
    plane: &[f32],
    width: usize,
    height: usize,
    h_radius: usize,
    v_radius: usize,
) -> Vec<f32> {
    let mut horizontal = vec![0.0f32; plane.len()];
    for y in 0..height {
        let row = &plane[y * width..(y + 1) * width];
        sliding_mean(
            |i| row[i] as f64,
            width,
            h_radius,
            |i, v| horizontal[y * width + i] = v,
        );
    }

    let mut out = vec![0.0f32; plane.len()];
    for x in 0..width {
        sliding_mean(
            |i| horizontal[i * width + x] as f64,
            height,
            v_radius,
            |i, v| out[i * width + x] = v,
        );
    }
    out
}

fn sliding_mean<R, W>(read: R, len: usize, radius: usize, mut write: W)
where
    R: Fn(usize) -> f64,
    W: FnMut(usize, f32),
{
    if len == 0 {
        return;
    }

    // Window for index 0 covers [0, radius]
    let mut sum = 0.0f64;
    let mut hi = radius.min(len - 1);
    for i in 0..=hi {
        sum += read(i);
    }
    let mut lo = 0usize;

    for i in 0..len {
        let count = (hi - lo + 1) as f64;
        write(i, (sum / count) as f32);

        // Slide to i + 1
        let next_hi = (i + 1 + radius).min(len - 1);
        if next_hi > hi {
            hi = next_hi;
            sum += read(hi);
        }
        let next_lo = (i + 1).saturating_sub(radius);
        if next_lo > lo {
            sum -= read(lo);
            lo = next_lo;
        }
    }
}
