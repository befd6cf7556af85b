/// Euclidean (L2) distance. Both slices must have the same length.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Map a distance to a similarity in (0, 1]: `1 / (1 + d)`.
///
/// Strictly decreasing in `d`, and exactly 1 only at `d == 0`.
pub fn similarity(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}
