//! Course rating aggregate, recomputed from scratch on every review insert.

/// Returns `(average, count)` over all ratings. An empty slice resets the
/// aggregate to `(0.0, 0)`.
pub fn recompute(ratings: &[i32]) -> (f64, i32) {
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let sum: i64 = ratings.iter().map(|&r| r as i64).sum();
    (sum as f64 / ratings.len() as f64, ratings.len() as i32)
}
