//! Polynomial root finding for LPC denominators.
//!
//! Roots of z^p + a[1] z^(p-1) + ... + a[p] are the eigenvalues of its
//! companion matrix. They are computed with a real Schur decomposition
//! capped at `SCHUR_ITERATIONS_PER_ROOT × p` QR sweeps, then refined with a
//! few Newton-Raphson steps.
//!
//! References:
//! - Numerical Recipes Ch. 9.5 (roots via companion matrix eigenvalues)
//! - Markel & Gray (1976): fixing roots into the unit circle

use nalgebra::linalg::Schur;
use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::error::{Error, Result};

/// QR sweep budget per root (LAPACK's dhseqr uses the same figure).
pub const SCHUR_ITERATIONS_PER_ROOT: usize = 30;

/// Newton-Raphson steps used to polish each root.
pub const MAX_POLISH_ITERATIONS: usize = 10;

/// Evaluate the monic polynomial and its derivative at z.
///
/// The polynomial is: P(z) = z^p + a[1]*z^{p-1} + ... + a[p], with
/// `a = [1.0, a[1], ..., a[p]]`.
///
/// # Returns
///
/// (P(z), P'(z))
pub fn eval_polynomial(a: &[f64], z: Complex64) -> (Complex64, Complex64) {
    if a.len() < 2 {
        return (Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
    }

    // Horner's method
    let mut p_val = Complex64::new(1.0, 0.0);
    let mut dp_val = Complex64::new(0.0, 0.0);

    for &coeff in a.iter().skip(1) {
        dp_val = p_val + z * dp_val;
        p_val = p_val * z + coeff;
    }

    (p_val, dp_val)
}

/// Polish a root with Newton-Raphson, keeping the best iterate by residual.
fn polish_root(a: &[f64], z: Complex64) -> Complex64 {
    let mut best = z;
    let mut best_residual = eval_polynomial(a, z).0.norm();
    let mut current = z;

    for _ in 0..MAX_POLISH_ITERATIONS {
        let (p_val, dp_val) = eval_polynomial(a, current);
        if dp_val.norm() < 1e-30 {
            break;
        }

        current -= p_val / dp_val;
        if !current.re.is_finite() || !current.im.is_finite() {
            break;
        }

        let residual = eval_polynomial(a, current).0.norm();
        if residual < best_residual {
            best = current;
            best_residual = residual;
        } else {
            break;
        }
    }

    best
}

/// Reflect roots outside the unit circle to 1 / conj(z).
///
/// Keeps the angle (and therefore the frequency) of each root.
pub fn fix_into_unit_circle(roots: &mut [Complex64]) {
    for root in roots.iter_mut() {
        let r = root.norm();
        if r > 1.0 {
            *root /= r * r;
        }
    }
}

/// Find the roots of the LPC polynomial `a = [1.0, a[1], ..., a[p]]`.
///
/// # Errors
///
/// - `Error::InvalidParameter` if `a` is empty, a[0] != 1 or a coefficient is non-finite
/// - `Error::ConvergenceFailure` if the Schur decomposition exceeds its cap
pub fn polynomial_roots(a: &[f64]) -> Result<Vec<Complex64>> {
    if a.is_empty() || a[0] != 1.0 {
        return Err(Error::InvalidParameter(
            "polynomial must be monic: [1.0, a1, ..., ap]".to_string(),
        ));
    }
    if a.iter().any(|c| !c.is_finite()) {
        return Err(Error::InvalidParameter(
            "polynomial has non-finite coefficients".to_string(),
        ));
    }

    let order = a.len() - 1;
    if order == 0 {
        return Ok(Vec::new());
    }
    if order == 1 {
        return Ok(vec![Complex64::new(-a[1], 0.0)]);
    }

    // Companion matrix: -a[1..] in the first row, 1s on the subdiagonal
    let mut companion = DMatrix::<f64>::zeros(order, order);
    for i in 0..order {
        companion[(0, i)] = -a[i + 1];
    }
    for i in 1..order {
        companion[(i, i - 1)] = 1.0;
    }

    let max_iterations = SCHUR_ITERATIONS_PER_ROOT * order;
    let schur = Schur::try_new(companion, f64::EPSILON, max_iterations).ok_or_else(|| {
        log::warn!(
            "Schur decomposition of order-{} companion matrix did not converge",
            order
        );
        Error::ConvergenceFailure {
            iterations: max_iterations,
        }
    })?;

    let roots = schur
        .complex_eigenvalues()
        .iter()
        .map(|c| polish_root(a, Complex64::new(c.re, c.im)))
        .collect();

    Ok(roots)
}
