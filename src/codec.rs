//! Combinatorial index codec.
//!
//! Bijection between a 1-based rank and an unordered pair `(row, column)` with
//! `row > column`, enumerating pairs row by row:
//!
//! ```text
//! row\col  0  1  2  3
//! -------------------
//! 1        1
//! 2        2  3
//! 3        4  5  6
//! 4        7  8  9 10
//! ```
//!
//! Ranks `1..=C(n, 2)` cover every pair of distinct integers in `0..n` exactly once.

/// Number of unordered pairs of distinct elements among `n`, i.e. `C(n, 2)`.
pub fn pair_count(n: u64) -> u64 {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

/// Rank of the pair `(row, column)`.
///
/// ```text
/// (row, column) -> row * (row - 1) / 2 + column + 1
/// ```
///
/// # Panics
///
/// Panics if `column >= row`.
pub fn encode(row: u64, column: u64) -> u64 {
    assert!(column < row, "Pair must satisfy column < row");
    pair_count(row) + column + 1
}

/// Pair `(row, column)` of the given 1-based rank.
///
/// ```text
/// k -> row = ceil((sqrt(1 + 8k) - 1) / 2), column = k - row * (row - 1) / 2 - 1
/// ```
///
/// The floating-point estimate of `row` is corrected with integer arithmetic,
/// so the result is exact for every rank.
///
/// # Panics
///
/// Panics if `rank == 0`.
pub fn decode(rank: u64) -> (u64, u64) {
    assert!(rank > 0, "Ranks are 1-based");
    let mut row = (((8.0 * rank as f64 + 1.0).sqrt() - 1.0) / 2.0).ceil() as u64;
    // Row `r` holds the ranks `C(r, 2) + 1 ..= C(r + 1, 2)`.
    while row > 1 && pair_count(row) >= rank {
        row -= 1;
    }
    while pair_count(row + 1) < rank {
        row += 1;
    }
    let column = rank - pair_count(row) - 1;
    (row, column)
}

/// Minimum number of symbols hosting `num_edges` distinct edges.
///
/// ```text
/// m -> ceil((1 + sqrt(1 + 8m)) / 2)
/// ```
///
/// This is the smallest `n >= 1` with `C(n, 2) >= m`.
pub fn min_symbols(num_edges: u64) -> u64 {
    let mut n = ((1.0 + (8.0 * num_edges as f64 + 1.0).sqrt()) / 2.0).ceil() as u64;
    n = n.max(1);
    while n > 1 && pair_count(n - 1) >= num_edges {
        n -= 1;
    }
    while pair_count(n) < num_edges {
        n += 1;
    }
    n
}

/// Maximum useful number of symbols for `num_edges` edges: `2m`.
///
/// With `2m` symbols every edge can have both endpoints of its own.
pub fn max_symbols(num_edges: u64) -> u64 {
    2 * num_edges
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_decode_table() {
        // k    1      2      3      4      5      6      7
        // ---------------------------------------------------
        //    (1,0)  (2,0)  (2,1)  (3,0)  (3,1)  (3,2)  (4,0)
        assert_eq!(decode(1), (1, 0));
        assert_eq!(decode(2), (2, 0));
        assert_eq!(decode(3), (2, 1));
        assert_eq!(decode(4), (3, 0));
        assert_eq!(decode(5), (3, 1));
        assert_eq!(decode(6), (3, 2));
        assert_eq!(decode(7), (4, 0));
        assert_eq!(decode(10), (4, 3));
    }

    #[test]
    fn test_encode_table() {
        assert_eq!(encode(1, 0), 1);
        assert_eq!(encode(2, 1), 3);
        assert_eq!(encode(4, 3), 10);
        assert_eq!(encode(100, 0), 4951);
    }

    #[test]
    fn test_codec_bijection() {
        for n in 2..=60u64 {
            let mut seen = HashSet::new();
            for k in 1..=pair_count(n) {
                let (row, column) = decode(k);
                assert!(column < row, "k = {}", k);
                assert!(row < n, "k = {}, n = {}", k, n);
                assert_eq!(encode(row, column), k);
                assert!(seen.insert((row, column)), "duplicate pair for k = {}", k);
            }
            assert_eq!(seen.len() as u64, pair_count(n));
        }
    }

    #[test]
    fn test_decode_large_ranks() {
        for row in [1_000u64, 65_536, 1 << 24, 1 << 30] {
            for column in [0, row / 2, row - 1] {
                assert_eq!(decode(encode(row, column)), (row, column));
            }
        }
    }

    #[test]
    #[should_panic(expected = "Ranks are 1-based")]
    fn test_decode_zero_panics() {
        decode(0);
    }

    #[test]
    fn test_min_symbols() {
        assert_eq!(min_symbols(0), 1);
        assert_eq!(min_symbols(1), 2);
        assert_eq!(min_symbols(2), 3);
        assert_eq!(min_symbols(3), 3);
        assert_eq!(min_symbols(4), 4);
        assert_eq!(min_symbols(6), 4);
        assert_eq!(min_symbols(7), 5);
        for m in 1..2000u64 {
            let n = min_symbols(m);
            let formula = ((1.0 + ((1 + 8 * m) as f64).sqrt()) / 2.0).ceil() as u64;
            assert_eq!(n, formula, "m = {}", m);
            assert!(pair_count(n) >= m);
            assert!(pair_count(n - 1) < m);
        }
    }

    #[test]
    fn test_max_symbols() {
        assert_eq!(max_symbols(0), 0);
        assert_eq!(max_symbols(5), 10);
        for m in 1..500u64 {
            assert!(max_symbols(m) >= min_symbols(m));
        }
    }
}
