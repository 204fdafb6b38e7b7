use crate::{
    error::{invalid_arg, Result},
    tracker::MedianTracker,
};

/// Raw ratio at a (1-based) genomic position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioPoint {
    pub position: usize,
    pub ratio: f64,
}

impl RatioPoint {
    pub fn new(position: usize, ratio: f64) -> Self {
        Self { position, ratio }
    }
}

impl From<(usize, f64)> for RatioPoint {
    fn from((position, ratio): (usize, f64)) -> Self {
        Self { position, ratio }
    }
}

/// Ratio after division by the median of its neighbourhood
///
/// A zero local median is passed through, giving +/-Inf or NaN for the
/// normalized ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRatioPoint {
    pub position: usize,
    pub ratio: f64,
    pub local_median: f64,
    pub normalized: f64,
}

impl NormalizedRatioPoint {
    fn new(p: &RatioPoint, local_median: f64) -> Self {
        Self {
            position: p.position,
            ratio: p.ratio,
            local_median,
            normalized: p.ratio / local_median,
        }
    }
}

/// Check that positions are 1-based and in non-decreasing order
pub fn check_sorted(points: &[RatioPoint]) -> Result<()> {
    if let Some(p) = points.first() {
        if p.position == 0 {
            return Err(invalid_arg!("position must be >= 1 (1-based coordinates)"));
        }
    }
    match points
        .windows(2)
        .position(|w| w[1].position < w[0].position)
    {
        Some(i) => Err(invalid_arg!(
            "points not sorted by position: {} follows {} at index {}",
            points[i + 1].position,
            points[i].position,
            i + 1
        )),
        None => Ok(()),
    }
}

/// Local median normalizer
///
/// For each point the local median is taken over all points (including the
/// point itself) whose position is within `distance` bases of it.
#[derive(Debug, Clone, Copy)]
pub struct WindowedRatioNormalizer {
    distance: usize,
}

impl WindowedRatioNormalizer {
    pub fn new(distance: usize) -> Self {
        Self { distance }
    }

    pub fn distance(&self) -> usize {
        self.distance
    }

    /// Lazily normalize points from a single contig.
    ///
    /// The input is checked up front (O(n)) and rejected with InvalidArgument
    /// if it is not sorted by position or has a 0 position.
    pub fn sweep<'a>(&self, points: &'a [RatioPoint]) -> Result<Sweep<'a>> {
        check_sorted(points)?;
        trace!(
            "Starting sweep over {} points with distance {}",
            points.len(),
            self.distance
        );
        Ok(Sweep {
            points,
            distance: self.distance,
            lo: 0,
            hi: 0,
            ix: 0,
            tracker: MedianTracker::new(),
        })
    }

    /// Normalize points from a single contig, returning one output point per
    /// input point in the same order
    pub fn normalize(&self, points: &[RatioPoint]) -> Result<Vec<NormalizedRatioPoint>> {
        self.sweep(points)?.collect()
    }
}

pub fn normalize(distance: usize, points: &[RatioPoint]) -> Result<Vec<NormalizedRatioPoint>> {
    WindowedRatioNormalizer::new(distance).normalize(points)
}

/// Two cursor sweep over sorted points
///
/// points[lo..hi] is the set of points currently in the tracker.  Both
/// cursors only move forward so every point is added and removed at most once.
pub struct Sweep<'a> {
    points: &'a [RatioPoint],
    distance: usize,
    lo: usize,
    hi: usize,
    ix: usize,
    tracker: MedianTracker,
}

impl<'a> Sweep<'a> {
    fn step(&mut self) -> Result<NormalizedRatioPoint> {
        let pts = self.points;
        let p = &pts[self.ix];
        let right = p.position.saturating_add(self.distance);
        while self.hi < pts.len() && pts[self.hi].position <= right {
            self.tracker.add(pts[self.hi].ratio);
            self.hi += 1;
        }
        while pts[self.lo].position.saturating_add(self.distance) < p.position {
            self.tracker.remove(pts[self.lo].ratio)?;
            self.lo += 1;
        }
        let m = self.tracker.median()?;
        Ok(NormalizedRatioPoint::new(p, m))
    }
}

impl<'a> Iterator for Sweep<'a> {
    type Item = Result<NormalizedRatioPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ix >= self.points.len() {
            None
        } else {
            let res = self.step();
            self.ix += 1;
            if res.is_err() {
                // Tracker state is no longer consistent so stop here
                self.ix = self.points.len()
            }
            Some(res)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // An error ends the sweep early but is itself yielded
        let n = self.points.len() - self.ix;
        (n.min(1), Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn points(v: &[(usize, f64)]) -> Vec<RatioPoint> {
        v.iter().copied().map(RatioPoint::from).collect()
    }

    fn brute_force_median(pts: &[RatioPoint], i: usize, d: usize) -> f64 {
        let x = pts[i].position;
        let mut v: Vec<f64> = pts
            .iter()
            .filter(|p| p.position.abs_diff(x) <= d)
            .map(|p| p.ratio)
            .collect();
        v.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());
        let n = v.len();
        if n & 1 == 1 {
            v[n >> 1]
        } else {
            (v[(n >> 1) - 1] + v[n >> 1]) / 2.0
        }
    }

    #[test]
    fn test_four_points() {
        let pts = points(&[(1, 1.0), (50, 1.5), (120, 1.1), (200, 1.2)]);
        let res = normalize(100, &pts).unwrap();
        let med: Vec<_> = res.iter().map(|p| p.local_median).collect();
        let expected_med = [1.25, 1.1, 1.2, 1.15];
        let expected_norm = [0.8, 1.5 / 1.1, 1.1 / 1.2, 1.2 / 1.15];
        for i in 0..4 {
            assert!((med[i] - expected_med[i]).abs() < 1e-10);
            assert!((res[i].normalized - expected_norm[i]).abs() < 1e-10);
            assert_eq!(res[i].position, pts[i].position);
            assert_eq!(res[i].ratio, pts[i].ratio);
        }
        assert!((res[1].normalized - 1.363636363636).abs() < 1e-10);
        assert!((res[2].normalized - 0.916666666667).abs() < 1e-10);
        assert!((res[3].normalized - 1.043478260870).abs() < 1e-10);
    }

    #[test]
    fn test_single_point() {
        let res = normalize(100, &points(&[(12345, 0.83)])).unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].local_median, 0.83);
        assert_eq!(res[0].normalized, 1.0);

        let res = normalize(100, &points(&[(12345, 0.0)])).unwrap();
        assert!(res[0].normalized.is_nan());
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize(100, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_zero_median_passed_through() {
        let pts = points(&[(1, 0.0), (2, 0.0), (3, 1.0)]);
        let res = normalize(10, &pts).unwrap();
        assert_eq!(res[2].local_median, 0.0);
        assert_eq!(res[2].normalized, f64::INFINITY);
        assert!(res[0].normalized.is_nan());
    }

    #[test]
    fn test_unsorted_rejected() {
        let pts = points(&[(1, 1.0), (200, 1.5), (120, 1.1)]);
        assert!(matches!(
            normalize(100, &pts),
            Err(Error::InvalidArgument(_))
        ));
        let pts = points(&[(0, 1.0), (200, 1.5)]);
        assert!(matches!(
            normalize(100, &pts),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_distance_with_repeated_positions() {
        let pts = points(&[(5, 1.0), (5, 3.0), (6, 4.0)]);
        let res = normalize(0, &pts).unwrap();
        let med: Vec<_> = res.iter().map(|p| p.local_median).collect();
        assert_eq!(med, vec![2.0, 2.0, 4.0]);
    }

    #[test]
    fn test_large_positions() {
        let pts = points(&[(usize::MAX - 1, 2.0), (usize::MAX, 4.0)]);
        let res = normalize(usize::MAX, &pts).unwrap();
        assert_eq!(res[0].local_median, 3.0);
        assert_eq!(res[1].local_median, 3.0);
    }

    #[test]
    fn test_random_against_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        for d in [0, 1, 100, 1000, 5000] {
            let mut x = 1;
            let pts: Vec<_> = (0..400)
                .map(|_| {
                    x += rng.gen_range(0..300);
                    RatioPoint::new(x, rng.gen_range(0.2..2.0))
                })
                .collect();
            let res = normalize(d, &pts).unwrap();
            assert_eq!(res.len(), pts.len());
            for (i, r) in res.iter().enumerate() {
                assert_eq!(r.local_median, brute_force_median(&pts, i, d));
                assert!((r.normalized * r.local_median - r.ratio).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_sweep_is_lazy() {
        let pts = points(&[(1, 1.0), (50, 1.5), (120, 1.1), (200, 1.2)]);
        let n = WindowedRatioNormalizer::new(100);
        let mut it = n.sweep(&pts).unwrap();
        assert_eq!(it.size_hint(), (1, Some(4)));
        let p = it.next().unwrap().unwrap();
        assert_eq!(p.local_median, 1.25);
        assert_eq!(it.size_hint(), (1, Some(3)));
        assert_eq!(it.count(), 3);

        let empty = n.sweep(&[]).unwrap();
        assert_eq!(empty.size_hint(), (0, Some(0)));
    }
}
