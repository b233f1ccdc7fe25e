//! WaveTrend crossovers.
//!
//! Bullish at i: wt1 crosses above wt2 (`wt1[i] > wt2[i]`, `wt1[i-1] <= wt2[i-1]`)
//! and wt1 was below `oversold` at some bar of the trailing `zone_lookback`
//! window ending at i. Bearish is the mirror image against `overbought`.
//! With `zone_lookback = 1` the zone check applies to the crossover bar only.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Bullish,
    Bearish,
}

fn crossovers(wt1: &[f64], wt2: &[f64], level: f64, zone_lookback: usize, dir: Direction) -> Vec<bool> {
    let n = wt1.len().min(wt2.len());
    let mut result = vec![false; wt1.len()];

    for i in 1..n {
        let (cur, sig, prev, prev_sig) = (wt1[i], wt2[i], wt1[i - 1], wt2[i - 1]);
        if cur.is_nan() || sig.is_nan() || prev.is_nan() || prev_sig.is_nan() {
            continue;
        }
        let crossed = match dir {
            Direction::Bullish => cur > sig && prev <= prev_sig,
            Direction::Bearish => cur < sig && prev >= prev_sig,
        };
        if !crossed {
            continue;
        }
        // NaN compares false, so undefined bars never satisfy the zone.
        let window = &wt1[(i + 1).saturating_sub(zone_lookback)..=i];
        result[i] = match dir {
            Direction::Bullish => window.iter().any(|v| *v < level),
            Direction::Bearish => window.iter().any(|v| *v > level),
        };
    }

    result
}

pub fn bullish_crossovers(wt1: &[f64], wt2: &[f64], oversold: f64, zone_lookback: usize) -> Vec<bool> {
    crossovers(wt1, wt2, oversold, zone_lookback, Direction::Bullish)
}

pub fn bearish_crossovers(wt1: &[f64], wt2: &[f64], overbought: f64, zone_lookback: usize) -> Vec<bool> {
    crossovers(wt1, wt2, overbought, zone_lookback, Direction::Bearish)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAN: f64 = f64::NAN;

    #[test]
    fn bullish_cross_in_oversold_zone() {
        let wt1 = [-70.0, -65.0, -58.0, -50.0];
        let wt2 = [-60.0, -60.0, -62.0, -55.0];
        let crosses = bullish_crossovers(&wt1, &wt2, -55.0, 1);
        // Crosses at 2; wt1[2] = -58 < -55
        assert_eq!(crosses, vec![false, false, true, false]);
    }

    #[test]
    fn same_bar_rule_rejects_late_cross() {
        // Cross at 2 happens with wt1 = -50, above the zone
        let wt1 = [-70.0, -65.0, -50.0];
        let wt2 = [-60.0, -60.0, -55.0];
        assert_eq!(bullish_crossovers(&wt1, &wt2, -55.0, 1), vec![false; 3]);
        // ...but a two-bar zone window still sees -65 at bar 1
        assert_eq!(
            bullish_crossovers(&wt1, &wt2, -55.0, 2),
            vec![false, false, true]
        );
    }

    #[test]
    fn bearish_cross_in_overbought_zone() {
        let wt1 = [60.0, 70.0, 58.0];
        let wt2 = [55.0, 65.0, 62.0];
        assert_eq!(
            bearish_crossovers(&wt1, &wt2, 55.0, 1),
            vec![false, false, true]
        );
    }

    #[test]
    fn touching_then_crossing_counts() {
        // prev equal counts as "not above"
        let wt1 = [-60.0, -58.0];
        let wt2 = [-60.0, -59.0];
        assert_eq!(bullish_crossovers(&wt1, &wt2, -55.0, 1), vec![false, true]);
    }

    #[test]
    fn undefined_values_never_cross() {
        let wt1 = [NAN, -58.0, NAN, -50.0];
        let wt2 = [NAN, -59.0, -60.0, -60.0];
        assert_eq!(bullish_crossovers(&wt1, &wt2, -55.0, 5), vec![false; 4]);
    }
}
