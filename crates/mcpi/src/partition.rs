//! Splitting a total iteration count across workers.

use crate::{Error, Result};

/// A contiguous share of the total work, assigned to one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Chunk {
    /// Position of the worker in the ordered worker set.
    pub worker_index: usize,
    /// Number of trials the worker must run.
    pub size: u64,
}

/// Splits `total` trials into `num_workers` chunks.
///
/// Every chunk receives `total / num_workers` trials, and the last one also
/// absorbs the remainder `total % num_workers`. The chunk sizes always sum to
/// exactly `total`, and the assignment is deterministic for a given input.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when `num_workers` is zero.
///
/// # Example
///
/// ```
/// use mcpi::partition;
///
/// let sizes: Vec<u64> = partition(10, 3).unwrap().iter().map(|c| c.size).collect();
/// assert_eq!(sizes, [3, 3, 4]);
/// ```
pub fn partition(total: u64, num_workers: usize) -> Result<Vec<Chunk>> {
    if num_workers == 0 {
        return Err(Error::InvalidArgument {
            reason: "at least one worker is required to partition work".to_string(),
        });
    }

    let workers = num_workers as u64;
    let base = total / workers;
    let remainder = total % workers;
    let last = num_workers - 1;

    Ok((0..num_workers)
        .map(|worker_index| Chunk {
            worker_index,
            size: if worker_index == last {
                base + remainder
            } else {
                base
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(total: u64, num_workers: usize) -> Vec<u64> {
        partition(total, num_workers)
            .unwrap()
            .into_iter()
            .map(|c| c.size)
            .collect()
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(
            partition(100, 0),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn even_split() {
        assert_eq!(sizes(12, 3), [4, 4, 4]);
    }

    #[test]
    fn last_worker_absorbs_remainder() {
        assert_eq!(sizes(10, 3), [3, 3, 4]);
        assert_eq!(sizes(7, 4), [1, 1, 1, 4]);
    }

    #[test]
    fn single_worker_takes_everything() {
        assert_eq!(
            partition(1_000, 1).unwrap(),
            [Chunk {
                worker_index: 0,
                size: 1_000
            }]
        );
    }

    #[test]
    fn more_workers_than_trials() {
        assert_eq!(sizes(2, 5), [0, 0, 0, 0, 2]);
    }

    #[test]
    fn zero_total_yields_empty_chunks() {
        assert_eq!(sizes(0, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn chunks_are_indexed_in_worker_order() {
        let chunks = partition(100, 6).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.worker_index, i);
        }
    }

    #[test]
    fn coverage_is_exact() {
        for total in (0..200).chain([u64::MAX - 1, u64::MAX]) {
            for num_workers in 1..=17 {
                let chunks = partition(total, num_workers).unwrap();
                assert_eq!(chunks.len(), num_workers);

                let sum: u128 = chunks.iter().map(|c| c.size as u128).sum();
                assert_eq!(sum, total as u128, "total={total} workers={num_workers}");

                let max = chunks.iter().map(|c| c.size).max().unwrap();
                let min = chunks.iter().map(|c| c.size).min().unwrap();
                assert!(max - min <= total % num_workers as u64);

                // Only the designated last chunk may exceed the base size.
                let base = total / num_workers as u64;
                assert!(chunks[..num_workers - 1].iter().all(|c| c.size == base));
            }
        }
    }
}
