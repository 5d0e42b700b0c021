use ndarray::Array1;

pub(crate) fn normalize_vector(vec: &Array1<f32>) -> Array1<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

#[cfg(feature = "onnx")]
pub(crate) fn average_vectors(vectors: &[Array1<f32>], embedding_size: usize) -> Array1<f32> {
    if vectors.is_empty() {
        return Array1::zeros(embedding_size);
    }
    let sum = vectors.iter().fold(Array1::zeros(vectors[0].len()), |acc, v| acc + v);
    sum / vectors.len() as f32
}

/// Index of the highest score; ties go to the lowest index.
/// Returns `None` for an empty slice or when any score is not finite.
pub(crate) fn first_argmax(scores: &[f32]) -> Option<usize> {
    if scores.iter().any(|s| !s.is_finite()) {
        return None;
    }
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_zero_vector_stays_zero() {
        let v = normalize_vector(&Array1::zeros(3));
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_normalize_unit_length() {
        let v = normalize_vector(&array![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_first_argmax_ties_and_nan() {
        assert_eq!(first_argmax(&[0.5, 0.9, 0.9]), Some(1));
        assert_eq!(first_argmax(&[0.0, 0.0]), Some(0));
        assert_eq!(first_argmax(&[]), None);
        assert_eq!(first_argmax(&[0.1, f32::NAN]), None);
    }
}
