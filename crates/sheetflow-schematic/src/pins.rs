//! Vertical placement of the pins along one edge of a sheet.
//!
//! Pins without an explicit position are spread over the usable part of the
//! edge, each at the center of an equal-height bin. Explicit positions are
//! kept, and a forward pass then enforces ordering and minimum spacing while
//! keeping every pin above the bottom margin.

use crate::spec::{PinSpec, Side};

/// Smallest usable edge span, so tiny or over-margined sheets still divide
/// into bins
pub const MIN_USABLE_SPAN: f64 = 0.1;

const EPSILON: f64 = 1e-9;

/// Spreads the pins of one sheet edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinDistributor {
    /// Distance kept free at the top and bottom of the edge
    pub margin: f64,
    /// Minimum vertical distance between consecutive pins
    pub min_delta: f64,
}

impl PinDistributor {
    pub fn new(margin: f64, min_delta: f64) -> Self {
        Self { margin, min_delta }
    }

    /// Compute one y per pin for an edge spanning `top..bottom`.
    ///
    /// `explicit` holds the absolute y of pins that have one, in assignment
    /// order. The result has the same length and order.
    pub fn distribute(&self, top: f64, bottom: f64, explicit: &[Option<f64>]) -> Vec<f64> {
        if explicit.is_empty() {
            return Vec::new();
        }

        let low = top + self.margin;
        let high = bottom - self.margin;

        let auto_count = explicit.iter().filter(|y| y.is_none()).count();
        let mut autos = self.spread(top, bottom, auto_count).into_iter();

        let mut ys: Vec<f64> = explicit
            .iter()
            .map(|y| y.or_else(|| autos.next()).unwrap_or(low))
            .collect();

        ys[0] = ys[0].max(low).min(high);
        self.enforce_spacing(&mut ys, high);

        // Pull the group back up if the last pin ended past the bottom
        // margin, using only the slack beyond the minimum spacing.
        let count = ys.len();
        let last = ys[count - 1];
        if last > high && count > 1 {
            let overflow = last - high;
            let spread = last - ys[0];
            let min_needed = self.min_delta * (count - 1) as f64;
            let slack = (spread - min_needed).max(0.0);
            let shift = overflow.min(slack);
            if shift > 0.0 {
                for y in ys.iter_mut() {
                    *y -= shift;
                }
                ys[0] = ys[0].max(low);
                self.enforce_spacing(&mut ys, high);
            }
        }

        ys
    }

    /// Centers of `count` equal bins over the usable span
    fn spread(&self, top: f64, bottom: f64, count: usize) -> Vec<f64> {
        let height = bottom - top;
        match count {
            0 => Vec::new(),
            1 => vec![top + height / 2.0],
            _ => {
                let usable = (height - 2.0 * self.margin).max(MIN_USABLE_SPAN);
                let bin = usable / count as f64;
                let first_center = top + self.margin + bin / 2.0;
                (0..count).map(|i| first_center + i as f64 * bin).collect()
            }
        }
    }

    fn enforce_spacing(&self, ys: &mut [f64], high: f64) {
        for i in 1..ys.len() {
            let target = ys[i].max(ys[i - 1] + self.min_delta);
            ys[i] = target.min(high);
        }
    }

    /// Indices of pins that sit outside `[top + margin, bottom - margin]` or
    /// closer than `min_delta` to the previous pin
    pub fn crowded(&self, top: f64, bottom: f64, ys: &[f64]) -> Vec<usize> {
        let low = top + self.margin;
        let high = bottom - self.margin;
        ys.iter()
            .enumerate()
            .filter(|&(i, &y)| {
                let out_of_bounds = y < low - EPSILON || y > high + EPSILON;
                let too_close = i > 0 && y - ys[i - 1] < self.min_delta - EPSILON;
                out_of_bounds || too_close
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// Split pins into the left and right edge groups, keeping their order
pub fn split_by_side(pins: &[PinSpec]) -> (Vec<&PinSpec>, Vec<&PinSpec>) {
    pins.iter().partition(|pin| pin.side() == Side::Left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::PinKind;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_empty_edge() {
        let distributor = PinDistributor::new(2.0, 1.0);
        assert!(distributor.distribute(0.0, 20.0, &[]).is_empty());
    }

    #[test]
    fn test_single_pin_is_centered() {
        let distributor = PinDistributor::new(2.0, 1.0);
        let ys = distributor.distribute(10.0, 30.0, &[None]);
        assert_eq!(ys, vec![20.0]);
    }

    #[test]
    fn test_spread_three_pins() {
        let distributor = PinDistributor::new(2.0, 1.0);
        let ys = distributor.distribute(0.0, 20.0, &[None, None, None]);

        assert_eq!(ys.len(), 3);
        assert!(ys[0] < ys[1] && ys[1] < ys[2]);
        assert!(ys.iter().all(|&y| (2.0..=18.0).contains(&y)));
        assert_close(ys[1] - ys[0], ys[2] - ys[1]);
        assert_close(ys[0], 2.0 + 16.0 / 6.0);
        assert_close(ys[1], 10.0);
    }

    #[test]
    fn test_min_delta_pushes_pins_down() {
        let distributor = PinDistributor::new(2.0, 1.0);
        let ys = distributor.distribute(0.0, 20.0, &[Some(5.0), Some(5.2)]);
        assert_eq!(ys, vec![5.0, 6.0]);
    }

    #[test]
    fn test_explicit_and_auto_pins_mix() {
        let distributor = PinDistributor::new(2.0, 1.0);
        let ys = distributor.distribute(0.0, 20.0, &[None, Some(3.0), None]);
        // The two automatic pins take the bins of a two-pin spread
        assert_close(ys[0], 6.0);
        assert_close(ys[1], 7.0);
        assert_close(ys[2], 14.0);
    }

    #[test]
    fn test_first_pin_is_clamped() {
        let distributor = PinDistributor::new(2.0, 1.0);
        assert_eq!(distributor.distribute(0.0, 20.0, &[Some(-5.0)]), vec![2.0]);
        assert_eq!(distributor.distribute(0.0, 20.0, &[Some(40.0)]), vec![18.0]);
    }

    #[test]
    fn test_crowded_edge_stays_in_bounds() {
        let distributor = PinDistributor::new(1.0, 1.0);
        let ys = distributor.distribute(0.0, 4.0, &[None; 5]);

        assert!(ys.windows(2).all(|w| w[0] <= w[1]));
        assert!(ys.iter().all(|&y| (1.0..=3.0).contains(&y)));
        assert_eq!(distributor.crowded(0.0, 4.0, &ys), vec![2, 3, 4]);
    }

    #[test]
    fn test_degenerate_edge() {
        // Margins larger than the sheet leave no usable span
        let distributor = PinDistributor::new(5.0, 1.0);
        let ys = distributor.distribute(0.0, 4.0, &[None, None]);
        assert_eq!(ys.len(), 2);
        assert!(ys.iter().all(|y| y.is_finite()));
        assert!(ys[0] <= ys[1]);
    }

    #[test]
    fn test_split_by_side() {
        let pins = vec![
            PinSpec::new("A", PinKind::Output).unwrap(),
            PinSpec::new("B", PinKind::Input).unwrap(),
            PinSpec::new("C", PinKind::Bidirectional)
                .unwrap()
                .with_side(Side::Left),
            PinSpec::new("D", PinKind::Passive).unwrap(),
        ];
        let (left, right) = split_by_side(&pins);
        let names = |group: &[&PinSpec]| group.iter().map(|p| p.name().to_string()).collect::<Vec<_>>();
        assert_eq!(names(&left), vec!["B", "C"]);
        assert_eq!(names(&right), vec!["A", "D"]);
    }
}
