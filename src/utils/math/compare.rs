use num::Float;

/// 密ベクトル同士の比較
pub trait Compare<N>
where
    N: Float,
{
    /// dot積
    /// d(a, b) = Σ(a_i * b_i)
    fn dot(vec: impl Iterator<Item = N>, other: impl Iterator<Item = N>) -> N;
    /// ノルム
    /// ||a|| = sqrt(Σ(a_i^2))
    fn norm(vec: impl Iterator<Item = N>) -> N;
    /// コサイン類似度
    /// cos(θ) = Σ(a_i * b_i) / (||a|| * ||b||)
    /// either norm being zero gives 0
    fn cosine_similarity(vec: impl Iterator<Item = N> + Clone, other: impl Iterator<Item = N> + Clone) -> N;
    /// 二乗ユークリッド距離
    /// d(a, b) = Σ((a_i - b_i)^2)
    fn squared_euclidean_distance(vec: impl Iterator<Item = N>, other: impl Iterator<Item = N>) -> N;
    /// ユークリッド距離
    /// d(a, b) = sqrt(Σ((a_i - b_i)^2))
    fn euclidean_distance(vec: impl Iterator<Item = N>, other: impl Iterator<Item = N>) -> N {
        Self::squared_euclidean_distance(vec, other).sqrt()
    }
}

#[derive(Debug)]
pub struct DefaultCompare;

impl<N> Compare<N> for DefaultCompare
where
    N: Float,
{
    #[inline(always)]
    fn dot(vec: impl Iterator<Item = N>, other: impl Iterator<Item = N>) -> N {
        vec.zip(other).fold(N::zero(), |acc, (a, b)| acc + a * b)
    }

    #[inline(always)]
    fn norm(vec: impl Iterator<Item = N>) -> N {
        vec.fold(N::zero(), |acc, a| acc + a * a).sqrt()
    }

    #[inline(always)]
    fn cosine_similarity(vec: impl Iterator<Item = N> + Clone, other: impl Iterator<Item = N> + Clone) -> N {
        let norm_a = Self::norm(vec.clone());
        let norm_b = Self::norm(other.clone());
        if norm_a == N::zero() || norm_b == N::zero() {
            return N::zero();
        }
        Self::dot(vec, other) / (norm_a * norm_b)
    }

    #[inline(always)]
    fn squared_euclidean_distance(vec: impl Iterator<Item = N>, other: impl Iterator<Item = N>) -> N {
        vec.zip(other).fold(N::zero(), |acc, (a, b)| {
            let diff = a - b;
            acc + diff * diff
        })
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn cosine_of_parallel_orthogonal_and_opposite() {
        let a = [1.0f64, 2.0, 3.0];
        let b = [2.0f64, 4.0, 6.0];
        let c = [0.0f64, 3.0, -2.0];
        let d = [-1.0f64, -2.0, -3.0];
        let cos = |x: &[f64], y: &[f64]| <DefaultCompare as Compare<f64>>::cosine_similarity(x.iter().copied(), y.iter().copied());
        assert!(approx_eq!(f64, cos(&a, &b), 1.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, cos(&a, &c), 0.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, cos(&a, &d), -1.0, epsilon = 1e-12));
    }

    #[test]
    fn zero_vector_has_zero_similarity() {
        let zero = [0.0f32, 0.0];
        let a = [1.0f32, 1.0];
        let sim = <DefaultCompare as Compare<f32>>::cosine_similarity(zero.iter().copied(), a.iter().copied());
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn euclidean_distance() {
        let a = [0.0f64, 0.0];
        let b = [3.0f64, 4.0];
        let d = <DefaultCompare as Compare<f64>>::euclidean_distance(a.iter().copied(), b.iter().copied());
        assert!(approx_eq!(f64, d, 5.0, epsilon = 1e-12));
    }
}
