//! Seeded hold-out and k-fold index splits.
//!
//! Both splits shuffle row indices with a `StdRng` seeded from the caller's
//! seed, so a given `(n, seed)` always produces the same partition.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::AppError;

/// Row indices of one train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn shuffled(n: usize, seed: u64) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    idx.shuffle(&mut rng);
    idx
}

/// Hold-out split with `ceil(n * test_size)` test rows.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<Split, AppError> {
    if !(test_size.is_finite() && test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::input(format!("Test size must be in (0, 1), got {test_size}.")));
    }
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(AppError::insufficient(format!(
            "Cannot split {n} row(s) with test size {test_size}: need at least one train and one test row."
        )));
    }

    let idx = shuffled(n, seed);
    Ok(Split {
        test: idx[..n_test].to_vec(),
        train: idx[n_test..].to_vec(),
    })
}

/// Shuffled k-fold partition. The first `n % k` folds get one extra row.
pub fn kfold(n: usize, k: usize, seed: u64) -> Result<Vec<Split>, AppError> {
    if k < 2 {
        return Err(AppError::input(format!("Cross-validation needs at least 2 folds, got {k}.")));
    }
    if n < k {
        return Err(AppError::insufficient(format!("Cannot make {k} folds from {n} row(s).")));
    }

    let idx = shuffled(n, seed);
    let mut splits = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = n / k + usize::from(fold < n % k);
        let test = idx[start..start + size].to_vec();
        let train = idx[..start].iter().chain(&idx[start + size..]).copied().collect();
        splits.push(Split { train, test });
        start += size;
    }
    Ok(splits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn holdout_sizes_and_determinism() {
        let a = train_test_split(10, 0.25, 1).unwrap();
        assert_eq!(a.test.len(), 3);
        assert_eq!(a.train.len(), 7);
        assert_eq!(a, train_test_split(10, 0.25, 1).unwrap());

        let all: HashSet<usize> = a.train.iter().chain(&a.test).copied().collect();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn holdout_rejects_degenerate_inputs() {
        assert_eq!(train_test_split(10, 1.0, 1).unwrap_err().exit_code(), 2);
        assert_eq!(train_test_split(1, 0.25, 1).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn kfold_partitions_every_row_once() {
        let folds = kfold(11, 5, 1).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2, 2, 2]);

        let mut seen = HashSet::new();
        for f in &folds {
            assert_eq!(f.train.len() + f.test.len(), 11);
            for i in &f.test {
                assert!(seen.insert(*i));
                assert!(!f.train.contains(i));
            }
        }
        assert_eq!(seen.len(), 11);
        assert_eq!(folds, kfold(11, 5, 1).unwrap());
    }

    #[test]
    fn kfold_needs_enough_rows() {
        assert_eq!(kfold(3, 5, 1).unwrap_err().exit_code(), 3);
        assert_eq!(kfold(10, 1, 1).unwrap_err().exit_code(), 2);
    }
}
