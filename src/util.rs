pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Similarity as a whole-number percentage for display
pub fn percent(similarity: f64) -> u32 {
    (similarity.clamp(0.0, 1.0) * 100.0).round() as u32
}
