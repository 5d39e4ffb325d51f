//! L2-regularized logistic regression over a sparse term matrix.
//!
//! The objective is `Σ logloss + ||w||² / (2C)` with an unpenalized intercept,
//! minimized by L-BFGS with a backtracking (Armijo) line search starting from
//! all-zero weights. Nothing is random, so equal inputs give equal models.

use std::collections::VecDeque;

use log::{debug, warn};
use serde::Serialize;

use crate::error::{AnalysisError, DataInsufficientError, Result};
use crate::features::TermMatrix;

/// A fitted linear model: one coefficient per vocabulary term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierModel {
    pub vocabulary: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl ClassifierModel {
    pub fn decision(&self, row: &[(usize, f64)]) -> f64 {
        self.intercept
            + row
                .iter()
                .map(|&(j, x)| self.coefficients[j] * x)
                .sum::<f64>()
    }

    /// Probability of the high-rating class.
    pub fn predict_proba(&self, row: &[(usize, f64)]) -> f64 {
        sigmoid(self.decision(row))
    }

    pub fn coefficient(&self, term: &str) -> Option<f64> {
        self.vocabulary
            .iter()
            .position(|t| t == term)
            .map(|j| self.coefficients[j])
    }
}

/// Solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticRegression {
    /// Inverse regularization strength.
    c: f64,
    max_iter: usize,
    /// Stop once every gradient component is below this.
    tol: f64,
    /// Number of correction pairs kept by L-BFGS.
    history: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
            history: 10,
        }
    }

    #[must_use]
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: usize) -> Self {
        self.history = history.max(1);
        self
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// `C` and the tolerance must be finite and positive.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("C", self.c), ("tol", self.tol)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AnalysisError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    pub fn fit(&self, x: &TermMatrix, y: &[u8]) -> Result<ClassifierModel> {
        self.validate()?;
        if x.n_rows() != y.len() {
            return Err(AnalysisError::DimensionMismatch {
                rows: x.n_rows(),
                labels: y.len(),
            });
        }
        let has_low = y.contains(&0);
        let has_high = y.iter().any(|&label| label != 0);
        let classes = usize::from(has_low) + usize::from(has_high);
        if classes < 2 {
            return Err(DataInsufficientError {
                documents: y.len(),
                classes,
            }
            .into());
        }

        let problem = Problem {
            x,
            y,
            inv_c: 1.0 / self.c,
        };
        let n_params = x.n_features() + 1;
        let mut theta = vec![0.0; n_params];
        let (mut loss, mut grad) = problem.evaluate(&theta);
        ensure_finite(loss, &grad, 0)?;

        let mut s_hist: VecDeque<Vec<f64>> = VecDeque::with_capacity(self.history);
        let mut y_hist: VecDeque<Vec<f64>> = VecDeque::with_capacity(self.history);
        let mut iterations = 0;
        let mut converged = max_abs(&grad) < self.tol;

        while !converged && iterations < self.max_iter {
            iterations += 1;

            let mut direction = two_loop(&grad, &s_hist, &y_hist);
            let mut slope = dot(&grad, &direction);
            if slope >= 0.0 {
                // Lost descent; restart from steepest descent.
                s_hist.clear();
                y_hist.clear();
                direction = grad.iter().map(|g| -g).collect();
                slope = -dot(&grad, &grad);
            }

            let mut step = if s_hist.is_empty() {
                (1.0 / max_abs(&grad)).min(1.0)
            } else {
                1.0
            };
            let accepted = loop {
                let candidate: Vec<f64> = theta
                    .iter()
                    .zip(&direction)
                    .map(|(t, d)| t + step * d)
                    .collect();
                let (candidate_loss, candidate_grad) = problem.evaluate(&candidate);
                if candidate_loss <= loss + ARMIJO_C1 * step * slope {
                    break Some((candidate, candidate_loss, candidate_grad));
                }
                step *= 0.5;
                if step < MIN_STEP {
                    break None;
                }
            };

            let Some((next, next_loss, next_grad)) = accepted else {
                debug!("line search stalled after {iterations} iteration(s)");
                break;
            };

            let s: Vec<f64> = next.iter().zip(&theta).map(|(a, b)| a - b).collect();
            let yk: Vec<f64> = next_grad.iter().zip(&grad).map(|(a, b)| a - b).collect();
            if dot(&s, &yk) > CURVATURE_EPS {
                if s_hist.len() == self.history {
                    s_hist.pop_front();
                    y_hist.pop_front();
                }
                s_hist.push_back(s);
                y_hist.push_back(yk);
            }

            ensure_finite(next_loss, &next_grad, iterations)?;
            theta = next;
            loss = next_loss;
            grad = next_grad;
            converged = max_abs(&grad) < self.tol;
        }

        if !converged {
            warn!(
                "logistic regression stopped after {iterations} iteration(s) without reaching tolerance {}",
                self.tol
            );
        }
        debug!("logistic regression: loss {loss:.6} after {iterations} iteration(s)");

        let intercept = theta.pop().unwrap_or(0.0);
        Ok(ClassifierModel {
            vocabulary: x.vocabulary().to_vec(),
            coefficients: theta,
            intercept,
            iterations,
            converged,
        })
    }
}

const ARMIJO_C1: f64 = 1e-4;
const MIN_STEP: f64 = 1e-20;
const CURVATURE_EPS: f64 = 1e-12;

struct Problem<'a> {
    x: &'a TermMatrix,
    y: &'a [u8],
    inv_c: f64,
}

impl Problem<'_> {
    /// Loss and gradient at `theta` (weights followed by the intercept).
    fn evaluate(&self, theta: &[f64]) -> (f64, Vec<f64>) {
        let n_features = self.x.n_features();
        let (weights, intercept) = theta.split_at(n_features);
        let intercept = intercept[0];

        let mut grad = vec![0.0; theta.len()];
        let mut loss = 0.0;
        for (row, &label) in self.x.rows().iter().zip(self.y) {
            let z = intercept + row.iter().map(|&(j, v)| weights[j] * v).sum::<f64>();
            let target = f64::from(label.min(1));
            loss += log1p_exp(z) - target * z;
            let residual = sigmoid(z) - target;
            for &(j, v) in row {
                grad[j] += residual * v;
            }
            grad[n_features] += residual;
        }

        loss += 0.5 * self.inv_c * dot(weights, weights);
        for (g, w) in grad.iter_mut().zip(weights) {
            *g += self.inv_c * w;
        }
        (loss, grad)
    }
}

/// L-BFGS two-loop recursion: approximates `-H⁻¹ g`.
fn two_loop(grad: &[f64], s_hist: &VecDeque<Vec<f64>>, y_hist: &VecDeque<Vec<f64>>) -> Vec<f64> {
    let mut q: Vec<f64> = grad.iter().map(|g| -g).collect();
    let k = s_hist.len();
    if k == 0 {
        return q;
    }

    let mut alpha = vec![0.0; k];
    let rho: Vec<f64> = (0..k).map(|i| 1.0 / dot(&y_hist[i], &s_hist[i])).collect();
    for i in (0..k).rev() {
        alpha[i] = rho[i] * dot(&s_hist[i], &q);
        axpy(-alpha[i], &y_hist[i], &mut q);
    }

    let gamma = dot(&s_hist[k - 1], &y_hist[k - 1]) / dot(&y_hist[k - 1], &y_hist[k - 1]);
    for v in &mut q {
        *v *= gamma;
    }

    for i in 0..k {
        let beta = rho[i] * dot(&y_hist[i], &q);
        axpy(alpha[i] - beta, &s_hist[i], &mut q);
    }
    q
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn axpy(a: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += a * xi;
    }
}

/// Largest absolute component; NaN if any component is NaN.
fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |m: f64, x| {
        if m.is_nan() || x.is_nan() {
            f64::NAN
        } else {
            m.max(x.abs())
        }
    })
}

fn ensure_finite(loss: f64, grad: &[f64], iterations: usize) -> Result<()> {
    if loss.is_finite() && max_abs(grad).is_finite() {
        Ok(())
    } else {
        Err(AnalysisError::SolverDiverged { iterations })
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

// ln(1 + e^z) without overflow.
fn log1p_exp(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}
