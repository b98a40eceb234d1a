// ============================================================
// Layer 4 — Stratified Train/Validation Splitter
// ============================================================
// Splits samples into a training set and a held-out validation
// set while keeping the label mix of both sets close to the mix
// of the whole pool.
//
// Sizing:
//   n_val = ceil(n * val_fraction), clamped to [1, n - 1] so that
//   any pool of two or more samples yields non-empty sets.
//
// Per label, n_val is shared out proportionally (floor first, then
// the leftover seats go to the labels with the largest remainders),
// preferring to leave at least one sample of each label in the
// training set. Each label group is shuffled with a seeded RNG
// before its validation share is taken, so a given seed always
// produces the same split.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::BTreeMap;

use crate::domain::labeled_line::Label;

pub fn stratified_split<T, F>(
    samples:      Vec<T>,
    val_fraction: f64,
    seed:         u64,
    label_of:     F,
) -> (Vec<T>, Vec<T>)
where
    F: Fn(&T) -> Label,
{
    let total = samples.len();
    if total < 2 {
        return (samples, Vec::new());
    }

    let mut groups: BTreeMap<Label, Vec<T>> = BTreeMap::new();
    for sample in samples {
        groups.entry(label_of(&sample)).or_default().push(sample);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    for group in groups.values_mut() {
        group.shuffle(&mut rng);
    }

    let n_val = ((total as f64 * val_fraction).ceil() as usize).clamp(1, total - 1);
    let quotas = allocate(&groups, n_val, total);

    let mut train = Vec::with_capacity(total - n_val);
    let mut val   = Vec::with_capacity(n_val);
    for (mut group, quota) in groups.into_values().zip(quotas) {
        let rest = group.split_off(quota);
        val.extend(group);
        train.extend(rest);
    }

    tracing::debug!(
        "Stratified split: {} training, {} validation",
        train.len(),
        val.len(),
    );
    (train, val)
}

/// Validation seats per label group, in group order.
fn allocate<T>(groups: &BTreeMap<Label, Vec<T>>, n_val: usize, total: usize) -> Vec<usize> {
    let counts: Vec<usize> = groups.values().map(Vec::len).collect();
    let mut quotas: Vec<usize> = counts.iter().map(|&c| c * n_val / total).collect();

    // Leftover seats go to the largest remainders, larger groups first on ties.
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = (counts[a] * n_val) % total;
        let rb = (counts[b] * n_val) % total;
        rb.cmp(&ra).then(counts[b].cmp(&counts[a]))
    });

    let mut remaining = n_val - quotas.iter().sum::<usize>();
    // First pass keeps one sample per label in training; second pass
    // ignores that preference if seats are still unfilled.
    for keep_one in [true, false] {
        for &i in &order {
            if remaining == 0 {
                break;
            }
            let cap = if keep_one { counts[i].saturating_sub(1) } else { counts[i] };
            if quotas[i] < cap {
                quotas[i] += 1;
                remaining -= 1;
            }
        }
    }
    quotas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(noise: usize, content: usize) -> Vec<(usize, Label)> {
        (0..noise)
            .map(|i| (i, Label::Noise))
            .chain((0..content).map(|i| (noise + i, Label::Content)))
            .collect()
    }

    fn count(items: &[(usize, Label)], label: Label) -> usize {
        items.iter().filter(|(_, l)| *l == label).count()
    }

    #[test]
    fn test_ten_percent_stratified() {
        let (train, val) = stratified_split(pool(90, 10), 0.1, 7, |s| s.1);
        assert_eq!(val.len(), 10);
        assert_eq!(train.len(), 90);
        assert_eq!(count(&val, Label::Noise), 9);
        assert_eq!(count(&val, Label::Content), 1);
    }

    #[test]
    fn test_all_items_preserved() {
        let (train, val) = stratified_split(pool(31, 22), 0.1, 1, |s| s.1);
        let mut ids: Vec<usize> = train.iter().chain(val.iter()).map(|s| s.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..53).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = stratified_split(pool(40, 15), 0.1, 99, |s| s.1);
        let b = stratified_split(pool(40, 15), 0.1, 99, |s| s.1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_two_samples_split_one_one() {
        let (train, val) = stratified_split(pool(1, 1), 0.1, 0, |s| s.1);
        assert_eq!(train.len(), 1);
        assert_eq!(val.len(), 1);
    }

    #[test]
    fn test_small_minority_stays_in_training() {
        let (train, val) = stratified_split(pool(20, 2), 0.1, 3, |s| s.1);
        assert_eq!(val.len(), 3);
        assert!(count(&train, Label::Content) >= 1);
        assert!(count(&train, Label::Noise) >= 1);
    }

    #[test]
    fn test_fewer_than_two_is_all_training() {
        let (train, val) = stratified_split(pool(1, 0), 0.1, 0, |s| s.1);
        assert_eq!(train.len(), 1);
        assert!(val.is_empty());
    }
}
