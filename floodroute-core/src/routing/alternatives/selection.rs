//! Labelling of ranked candidates

use serde::Serialize;

/// Role of a route in an alternative set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteLabel {
    /// Lowest flood exposure
    Safest,
    /// Middle of the exposure ranking
    Balanced,
    /// Shortest, or most exposed when the shortest is barely shorter than
    /// the safest
    Direct,
    Alternative,
}

/// A label assigned to a candidate index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub label: RouteLabel,
    pub index: usize,
    /// The candidate already carries an earlier label
    pub duplicate: bool,
}

/// Assigns labels to candidates sorted by ascending flood exposure.
///
/// `distances` holds the candidate lengths in that order. `desired` is the
/// number of routes wanted (already clamped); two gives safest and direct,
/// three or more adds balanced and then plain alternatives from the unused
/// candidates.
pub fn select_labels(
    distances: &[f64],
    desired: usize,
    direct_min_separation_m: f64,
) -> Vec<Selection> {
    let n = distances.len();
    if n == 0 {
        return Vec::new();
    }

    let safest = 0;
    let shortest = distances
        .iter()
        .enumerate()
        .min_by(|(ia, a), (ib, b)| a.total_cmp(b).then(ia.cmp(ib)))
        .map_or(0, |(idx, _)| idx);
    let direct = if (distances[shortest] - distances[safest]).abs() < direct_min_separation_m {
        n - 1
    } else {
        shortest
    };

    let mut balanced = n / 2;
    if n < 3 {
        balanced = safest;
    } else if balanced == direct || balanced == safest {
        balanced = nearest_unused(balanced, n, &[safest, direct]).unwrap_or(safest);
    }

    let mut picks = vec![(RouteLabel::Safest, safest)];
    if desired >= 3 {
        picks.push((RouteLabel::Balanced, balanced));
    }
    picks.push((RouteLabel::Direct, direct));

    let extra = desired.saturating_sub(3);
    let used: Vec<usize> = picks.iter().map(|(_, idx)| *idx).collect();
    picks.extend(
        (0..n)
            .filter(|idx| !used.contains(idx))
            .take(extra)
            .map(|idx| (RouteLabel::Alternative, idx)),
    );

    let mut seen = Vec::with_capacity(picks.len());
    picks
        .into_iter()
        .map(|(label, index)| {
            let duplicate = seen.contains(&index);
            seen.push(index);
            Selection {
                label,
                index,
                duplicate,
            }
        })
        .collect()
}

/// Closest index to `from` in `0..n` that is not taken, lower first on ties
fn nearest_unused(from: usize, n: usize, taken: &[usize]) -> Option<usize> {
    (1..n).find_map(|offset| {
        [from.checked_sub(offset), from.checked_add(offset)]
            .into_iter()
            .flatten()
            .find(|idx| *idx < n && !taken.contains(idx))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(selections: &[Selection]) -> Vec<(RouteLabel, usize, bool)> {
        selections
            .iter()
            .map(|s| (s.label, s.index, s.duplicate))
            .collect()
    }

    #[test]
    fn three_distinct_candidates() {
        // Sorted by flood exposure; the last one is the shortest
        let selections = select_labels(&[1500.0, 1300.0, 1000.0], 3, 100.0);
        assert_eq!(
            labels(&selections),
            vec![
                (RouteLabel::Safest, 0, false),
                (RouteLabel::Balanced, 1, false),
                (RouteLabel::Direct, 2, false),
            ]
        );
    }

    #[test]
    fn balanced_moves_off_direct() {
        // Median (index 2) is also the shortest
        let selections = select_labels(&[1500.0, 1400.0, 1000.0, 1200.0, 1300.0], 3, 100.0);
        let got = labels(&selections);
        assert_eq!(got[2], (RouteLabel::Direct, 2, false));
        assert_eq!(got[1], (RouteLabel::Balanced, 1, false));
    }

    #[test]
    fn direct_falls_back_to_most_exposed_when_not_shorter() {
        // Safest is already (nearly) the shortest
        let selections = select_labels(&[1000.0, 1200.0, 1050.0, 1300.0], 3, 100.0);
        let got = labels(&selections);
        assert_eq!(got[2], (RouteLabel::Direct, 3, false));
        assert_eq!(got[1], (RouteLabel::Balanced, 2, false));
    }

    #[test]
    fn degenerate_sets_duplicate_the_safest() {
        let two = select_labels(&[1200.0, 1000.0], 3, 100.0);
        assert_eq!(
            labels(&two),
            vec![
                (RouteLabel::Safest, 0, false),
                (RouteLabel::Balanced, 0, true),
                (RouteLabel::Direct, 1, false),
            ]
        );

        let one = select_labels(&[1200.0], 3, 100.0);
        assert_eq!(
            labels(&one),
            vec![
                (RouteLabel::Safest, 0, false),
                (RouteLabel::Balanced, 0, true),
                (RouteLabel::Direct, 0, true),
            ]
        );
        assert!(select_labels(&[], 3, 100.0).is_empty());
    }

    #[test]
    fn desired_count_controls_labels() {
        let distances = [1500.0, 1400.0, 1000.0, 1200.0, 1300.0];
        let two = select_labels(&distances, 2, 100.0);
        assert_eq!(
            two.iter().map(|s| s.label).collect::<Vec<_>>(),
            vec![RouteLabel::Safest, RouteLabel::Direct]
        );

        let five = select_labels(&distances, 5, 100.0);
        assert_eq!(five.len(), 5);
        assert_eq!(five[3].label, RouteLabel::Alternative);
        assert_eq!(five[4].label, RouteLabel::Alternative);
        let mut indices: Vec<usize> = five.iter().map(|s| s.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(five.iter().all(|s| !s.duplicate));
    }
}
