use crate::{
    error::{invalid_arg, Result},
    normalize::RatioPoint,
    window::Window,
};

// Running sum for the current window
struct Bin {
    start: usize,
    sum: f64,
    n: usize,
}

/// Collapse position sorted points into fixed size windows
///
/// Each non-empty window gives one point located at the window midpoint with
/// the mean of the finite values that fell in the window.  Windows where no
/// finite values were seen are dropped.
pub fn bin_points<I>(window: &Window, points: I) -> Result<Vec<RatioPoint>>
where
    I: IntoIterator<Item = RatioPoint>,
{
    let mut out = Vec::new();
    let mut bin: Option<Bin> = None;
    let mut prev = 0;
    let mut skipped = 0;

    let mut flush = |b: &Bin| -> Result<()> {
        if b.n > 0 {
            out.push(RatioPoint::new(
                window.midpoint(b.start)?,
                b.sum / (b.n as f64),
            ))
        }
        Ok(())
    };

    for p in points {
        if p.position < prev {
            return Err(invalid_arg!(
                "points not sorted by position: {} follows {}",
                p.position,
                prev
            ));
        }
        prev = p.position;
        let s = window.start(p.position)?;
        // New window?
        if bin.as_ref().map(|b| b.start != s).unwrap_or(true) {
            if let Some(b) = bin.take() {
                flush(&b)?
            }
            bin = Some(Bin { start: s, sum: 0.0, n: 0 })
        }
        if p.ratio.is_finite() {
            if let Some(b) = bin.as_mut() {
                b.sum += p.ratio;
                b.n += 1;
            }
        } else {
            skipped += 1;
        }
    }
    if let Some(b) = bin.take() {
        flush(&b)?
    }

    if skipped > 0 {
        debug!("Skipped {} non-finite values while binning", skipped)
    }
    Ok(out)
}
