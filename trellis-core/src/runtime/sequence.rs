//! Longest Increasing Subsequence
//!
//! Used by the keyed diff to decide which matched children are already in
//! the right relative order and can stay where they are.
//!
//! # Algorithm
//!
//! Patience sorting: `tails[k]` holds the index of the smallest value that
//! ends an increasing run of length `k + 1`. Each value either extends the
//! longest run or replaces the first tail that is not smaller than it,
//! found by binary search. A predecessor table rebuilds the run at the end.
//!
//! Zero entries mean "no old counterpart" and are skipped entirely.

/// Indices of a longest strictly increasing subsequence of the non-zero
/// entries of `arr`, in ascending order.
///
/// Runs in O(n log n). Among equally long answers the one produced by
/// patience sorting with a lower-bound binary search is returned.
pub fn longest_increasing_subsequence(arr: &[usize]) -> Vec<usize> {
    let mut predecessors = vec![usize::MAX; arr.len()];
    let mut tails: Vec<usize> = Vec::with_capacity(arr.len());

    for (i, &value) in arr.iter().enumerate() {
        if value == 0 {
            continue;
        }

        match tails.last() {
            None => {
                tails.push(i);
                continue;
            }
            Some(&last) if arr[last] < value => {
                predecessors[i] = last;
                tails.push(i);
                continue;
            }
            _ => {}
        }

        let pos = tails.partition_point(|&idx| arr[idx] < value);
        if value < arr[tails[pos]] {
            if pos > 0 {
                predecessors[i] = tails[pos - 1];
            }
            tails[pos] = i;
        }
    }

    let Some(&last) = tails.last() else {
        return tails;
    };
    let mut cursor = last;
    for slot in tails.iter_mut().rev() {
        *slot = cursor;
        cursor = predecessors[cursor];
    }
    tails
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// O(n^2) reference: length of the longest strictly increasing run of
    /// non-zero entries.
    fn reference_len(arr: &[usize]) -> usize {
        let mut best = vec![0usize; arr.len()];
        for i in 0..arr.len() {
            if arr[i] == 0 {
                continue;
            }
            best[i] = 1;
            for j in 0..i {
                if arr[j] != 0 && arr[j] < arr[i] {
                    best[i] = best[i].max(best[j] + 1);
                }
            }
        }
        best.into_iter().max().unwrap_or(0)
    }

    #[test]
    fn simple_sequences() {
        assert_eq!(longest_increasing_subsequence(&[]), Vec::<usize>::new());
        assert_eq!(longest_increasing_subsequence(&[1, 2, 3]), vec![0, 1, 2]);
        assert_eq!(longest_increasing_subsequence(&[3, 2]), vec![1]);
        assert_eq!(longest_increasing_subsequence(&[4, 2, 3, 1, 5]), vec![1, 2, 4]);
    }

    #[test]
    fn zeros_are_skipped() {
        assert_eq!(longest_increasing_subsequence(&[0, 0]), Vec::<usize>::new());
        assert_eq!(longest_increasing_subsequence(&[0, 2, 0, 3]), vec![1, 3]);
        assert_eq!(longest_increasing_subsequence(&[5, 3, 4, 0]), vec![1, 2]);
    }

    #[test]
    fn reverse_order_keeps_one() {
        let seq = longest_increasing_subsequence(&[5, 4, 3, 2, 1]);
        assert_eq!(seq, vec![4]);
    }

    proptest! {
        #[test]
        fn matches_reference_length(arr in proptest::collection::vec(0usize..20, 0..40)) {
            let seq = longest_increasing_subsequence(&arr);
            prop_assert_eq!(seq.len(), reference_len(&arr));
        }

        #[test]
        fn result_is_strictly_increasing(arr in proptest::collection::vec(0usize..20, 0..40)) {
            let seq = longest_increasing_subsequence(&arr);
            for pair in seq.windows(2) {
                prop_assert!(pair[0] < pair[1]);
                prop_assert!(arr[pair[0]] < arr[pair[1]]);
            }
            for &i in &seq {
                prop_assert!(arr[i] != 0);
            }
        }
    }
}
