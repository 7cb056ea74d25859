use ndarray::{s, Array1, Array2, ArrayView2};

use crate::{error::{Result, TopicModelError}, model::reduce::{Factorization, Factorizer}};

/// One-sided (Hestenes) Jacobi SVD
/// dense, exact up to floating point, deterministic
///
/// Sign convention: the largest-magnitude component of every left singular
/// vector is positive (first one on ties), the right vector is flipped with it.
#[derive(Debug, Clone)]
pub struct JacobiSvd {
    max_sweeps: usize,
    tolerance: f64,
}

impl Default for JacobiSvd {
    fn default() -> Self {
        JacobiSvd {
            max_sweeps: 60,
            tolerance: 1e-13,
        }
    }
}

impl JacobiSvd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps.max(1);
        self
    }

    /// relative orthogonality threshold `|a_p·a_q| <= tol * ||a_p|| ||a_q||`
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.abs();
        self
    }

    /// Thin SVD of `matrix` (rows, cols), r = min(rows, cols)
    /// returns U (rows, r), Σ (r), V (r, cols) with Σ descending
    pub fn decompose(&self, matrix: ArrayView2<'_, f64>) -> (Array2<f64>, Array1<f64>, Array2<f64>) {
        let (rows, cols) = matrix.dim();
        if rows >= cols {
            let (u, sigma, v) = self.one_sided(matrix.to_owned());
            (u, sigma, v.reversed_axes())
        } else {
            // Aᵀ = U' Σ V'ᵀ  ->  A = V' Σ U'ᵀ
            let (u_t, sigma, v_t) = self.one_sided(matrix.t().to_owned());
            (v_t, sigma, u_t.reversed_axes())
        }
    }

    /// Orthogonalize the columns of `a` (rows >= cols) by plane rotations
    /// returns (U, Σ, V) with `a = U Σ Vᵀ`, U completed to orthonormal columns
    fn one_sided(&self, mut a: Array2<f64>) -> (Array2<f64>, Array1<f64>, Array2<f64>) {
        let (rows, cols) = a.dim();
        let mut v = Array2::<f64>::eye(cols);

        let mut converged = cols < 2;
        for sweep in 0..self.max_sweeps {
            if converged {
                break;
            }
            let mut rotated = false;
            for p in 0..cols - 1 {
                for q in p + 1..cols {
                    let (alpha, beta, gamma) = {
                        let col_p = a.column(p);
                        let col_q = a.column(q);
                        (col_p.dot(&col_p), col_q.dot(&col_q), col_p.dot(&col_q))
                    };
                    if gamma == 0.0 || gamma.abs() <= self.tolerance * (alpha * beta).sqrt() {
                        continue;
                    }
                    rotated = true;
                    let zeta = (beta - alpha) / (2.0 * gamma);
                    let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                    let c = 1.0 / (1.0 + t * t).sqrt();
                    let s = c * t;
                    rotate_columns(&mut a, p, q, c, s);
                    rotate_columns(&mut v, p, q, c, s);
                }
            }
            log::trace!("jacobi sweep {} finished, rotated={}", sweep + 1, rotated);
            if !rotated {
                converged = true;
            }
        }
        if !converged {
            log::warn!(
                "jacobi svd did not converge within {} sweeps on a {}x{} matrix",
                self.max_sweeps,
                rows,
                cols
            );
        }

        let norms: Vec<f64> = a.columns().into_iter().map(|col| col.dot(&col).sqrt()).collect();
        let mut order: Vec<usize> = (0..cols).collect();
        // 降順, 同値は元の列順
        order.sort_by(|&i, &j| norms[j].total_cmp(&norms[i]));
        let largest = order.first().map(|&i| norms[i]).unwrap_or(0.0);
        let negligible = largest * (rows.max(cols) as f64) * f64::EPSILON;

        let mut u = Array2::<f64>::zeros((rows, cols));
        let mut sigma = Array1::<f64>::zeros(cols);
        let mut v_sorted = Array2::<f64>::zeros((cols, cols));
        let mut filled = 0;
        for (dst, &src) in order.iter().enumerate() {
            v_sorted.column_mut(dst).assign(&v.column(src));
            let norm = norms[src];
            if norm > negligible && norm > 0.0 {
                sigma[dst] = norm;
                u.column_mut(dst).assign(&a.column(src).mapv(|x| x / norm));
                filled += 1;
            }
        }
        complete_orthonormal_columns(&mut u, filled);
        (u, sigma, v_sorted)
    }
}

impl Factorizer for JacobiSvd {
    fn factorize(&self, matrix: ArrayView2<'_, f64>, k: usize) -> Result<Factorization> {
        let (rows, cols) = matrix.dim();
        if k == 0 || k > rows.min(cols) {
            return Err(TopicModelError::invalid(format!(
                "cannot factorize a {}x{} matrix at rank {}",
                rows, cols, k
            )));
        }
        if matrix.iter().any(|x| !x.is_finite()) {
            return Err(TopicModelError::invalid("matrix contains non-finite values"));
        }

        let (u, sigma, v) = self.decompose(matrix);
        let mut left = u.slice(s![.., ..k]).to_owned();
        let mut right = v.slice(s![..k, ..]).to_owned();
        let singular_values = sigma.slice(s![..k]).to_owned();
        fix_signs(&mut left, &mut right);

        Ok(Factorization {
            singular_values,
            left,
            right,
        })
    }
}

#[inline]
fn rotate_columns(m: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    for mut row in m.rows_mut() {
        let xp = row[p];
        let xq = row[q];
        row[p] = c * xp - s * xq;
        row[q] = s * xp + c * xq;
    }
}

/// Columns `filled..` of `u` are zero; replace them by unit vectors orthogonal
/// to every earlier column, drawn from the standard basis
fn complete_orthonormal_columns(u: &mut Array2<f64>, filled: usize) {
    let (rows, cols) = u.dim();
    let mut next = filled;
    for basis in 0..rows {
        if next >= cols {
            break;
        }
        let mut candidate = Array1::<f64>::zeros(rows);
        candidate[basis] = 1.0;
        // Gram-Schmidt を2回 (数値誤差対策)
        for _ in 0..2 {
            for j in 0..next {
                let col = u.column(j);
                let proj = col.dot(&candidate);
                candidate.scaled_add(-proj, &col);
            }
        }
        let norm = candidate.dot(&candidate).sqrt();
        if norm > 1e-8 {
            u.column_mut(next).assign(&candidate.mapv(|x| x / norm));
            next += 1;
        }
    }
}

/// make the largest-magnitude entry of each left vector positive
fn fix_signs(left: &mut Array2<f64>, right: &mut Array2<f64>) {
    for j in 0..left.ncols() {
        let col = left.column(j);
        let mut pivot = 0;
        for (i, x) in col.iter().enumerate() {
            if x.abs() > col[pivot].abs() {
                pivot = i;
            }
        }
        if col[pivot] < 0.0 {
            left.column_mut(j).mapv_inplace(|x| -x);
            right.row_mut(j).mapv_inplace(|x| -x);
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use ndarray::array;

    use super::*;

    fn assert_orthonormal_columns(m: &Array2<f64>) {
        let gram = m.t().dot(m);
        for i in 0..gram.nrows() {
            for j in 0..gram.ncols() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    approx_eq!(f64, gram[[i, j]], expected, epsilon = 1e-10),
                    "gram[{}, {}] = {}",
                    i,
                    j,
                    gram[[i, j]]
                );
            }
        }
    }

    fn assert_close(a: &Array2<f64>, b: &Array2<f64>) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!(approx_eq!(f64, *x, *y, epsilon = 1e-10), "{} != {}", x, y);
        }
    }

    #[test]
    fn diagonal_matrix_singular_values() {
        let m = array![[3.0, 0.0], [0.0, -5.0], [0.0, 0.0]];
        let f = JacobiSvd::new().factorize(m.view(), 2).unwrap();
        assert!(approx_eq!(f64, f.singular_values[0], 5.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, f.singular_values[1], 3.0, epsilon = 1e-12));
        assert_close(&f.reconstruct(), &m);
    }

    #[test]
    fn tall_and_wide_full_rank_reconstruct() {
        let tall = array![[2.0, 0.0, 1.0], [1.0, 1.0, 0.0], [0.0, 1.0, 2.0], [1.0, 3.0, 1.0]];
        let f = JacobiSvd::new().factorize(tall.view(), 3).unwrap();
        assert_orthonormal_columns(&f.left);
        assert_orthonormal_columns(&f.right.t().to_owned());
        assert_close(&f.reconstruct(), &tall);

        let wide = tall.t().to_owned();
        let g = JacobiSvd::new().factorize(wide.view(), 3).unwrap();
        assert_orthonormal_columns(&g.left);
        assert_orthonormal_columns(&g.right.t().to_owned());
        assert_close(&g.reconstruct(), &wide);
        for (a, b) in f.singular_values.iter().zip(g.singular_values.iter()) {
            assert!(approx_eq!(f64, *a, *b, epsilon = 1e-10));
        }
    }

    #[test]
    fn rank_deficient_matrix_keeps_orthonormal_factors() {
        // 2列目 = 1列目 * 2
        let m = array![[1.0, 2.0, 0.0], [2.0, 4.0, 0.0], [0.0, 0.0, 0.0]];
        let f = JacobiSvd::new().factorize(m.view(), 3).unwrap();
        assert!(f.singular_values[1] < 1e-10);
        assert!(f.singular_values[2] < 1e-10);
        assert_orthonormal_columns(&f.left);
        assert_orthonormal_columns(&f.right.t().to_owned());
        assert_close(&f.reconstruct(), &m);
    }

    #[test]
    fn signs_are_deterministic() {
        let m = array![[-4.0, -1.0], [-1.0, -3.0], [0.5, -0.2]];
        let a = JacobiSvd::new().factorize(m.view(), 2).unwrap();
        let b = JacobiSvd::new().factorize(m.view(), 2).unwrap();
        assert_eq!(a, b);
        for col in a.left.columns() {
            let pivot = col.iter().copied().fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
            assert!(pivot > 0.0);
        }
    }

    #[test]
    fn rank_out_of_bounds_fails() {
        let m = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(JacobiSvd::new().factorize(m.view(), 0).unwrap_err().is_invalid_input());
        assert!(JacobiSvd::new().factorize(m.view(), 3).unwrap_err().is_invalid_input());
    }
}
