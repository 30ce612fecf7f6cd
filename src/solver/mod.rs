//! Closed forms for linear homogeneous recurrences with constant coefficients.
//!
//! The characteristic polynomial is factored over the rationals and the
//! sequence is split into one component per factor power `p^e`. Each
//! component is rational-valued, so it can be closed independently: over `Q`
//! for linear factors and over `Q(sqrt d)` for irreducible quadratics.

mod closed_form;
mod linear;

use std::fmt;

use num_bigint::BigInt;
use num_traits::Zero;
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::error::{RequestError, Result};
use crate::expr::Rational;
use crate::factor::{FactorKind, factor_polynomial};
use crate::field::{Surd, split_square};
use crate::polynomial::{Poly, Polynomial};
use crate::recurrence::RecurrenceSpec;

pub use closed_form::{ClosedForm, Component};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoClosedFormReason {
    /// Trailing zero coefficients lower the effective order, and the initial
    /// values do not satisfy the shorter recurrence.
    DegenerateInitialValues { zero_roots: usize },
    /// A factor of the characteristic polynomial of degree three or more has
    /// no roots expressible here.
    IrreducibleFactor { degree: usize },
    /// The factor search budget ran out on a piece of this degree.
    SearchExhausted { degree: usize },
}

impl fmt::Display for NoClosedFormReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoClosedFormReason::DegenerateInitialValues { zero_roots } => write!(
                f,
                "initial values are inconsistent with {zero_roots} vanishing trailing coefficient(s)"
            ),
            NoClosedFormReason::IrreducibleFactor { degree } => {
                write!(f, "characteristic polynomial has an irreducible factor of degree {degree}")
            }
            NoClosedFormReason::SearchExhausted { degree } => {
                write!(f, "factor search gave up on a piece of degree {degree}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved(ClosedForm),
    NoClosedForm(NoClosedFormReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverOptions {
    pub index_symbol: String,
    pub factor_search_limit: usize,
    pub verify_terms: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            index_symbol: "n".to_string(),
            factor_search_limit: 200_000,
            verify_terms: 16,
        }
    }
}

/// Solves `spec` for a closed form in `options.index_symbol`.
///
/// "No closed form" is an `Ok` outcome; errors are reserved for internal
/// failures and cancellation.
pub fn solve_recurrence(
    spec: &RecurrenceSpec,
    options: &SolverOptions,
    cancel: &CancelToken,
) -> Result<SolveOutcome> {
    let m = spec.order();
    let chi = spec.characteristic_polynomial();
    let factorization = factor_polynomial(&chi, options.factor_search_limit, cancel)?;
    let terms: Vec<Rational> = spec.terms().take(2 * m).collect();
    let single = factorization.factors.len() == 1;

    let mut components = Vec::new();
    for factor in &factorization.factors {
        cancel.check()?;
        let power = factor.power();
        let values = if single {
            terms[..m].to_vec()
        } else {
            component_values(&chi, &power, &terms)?
        };
        if values.iter().all(Zero::is_zero) {
            debug!(factor = %factor.poly.to_expr("x"), "component vanishes");
            continue;
        }

        let e = factor.multiplicity;
        match &factor.kind {
            FactorKind::ZeroRoot => {
                return Ok(SolveOutcome::NoClosedForm(
                    NoClosedFormReason::DegenerateInitialValues { zero_roots: e },
                ));
            }
            FactorKind::Irreducible => {
                return Ok(SolveOutcome::NoClosedForm(
                    NoClosedFormReason::IrreducibleFactor {
                        degree: factor.degree(),
                    },
                ));
            }
            FactorKind::Undecided => {
                return Ok(SolveOutcome::NoClosedForm(
                    NoClosedFormReason::SearchExhausted {
                        degree: factor.degree(),
                    },
                ));
            }
            FactorKind::Linear(root) => {
                let roots = [Surd::from_rational(root.clone())];
                components.extend(close_component(&roots, e, &values)?);
            }
            FactorKind::Quadratic { b, c } => {
                let roots = quadratic_roots(b, c);
                components.extend(close_component(&roots, e, &values)?);
            }
        }
    }

    let closed = ClosedForm::new(options.index_symbol.clone(), components);
    closed.verify(spec, options.verify_terms.max(m))?;
    info!(order = m, closed_form = %closed, "closed form found");
    Ok(SolveOutcome::Solved(closed))
}

/// First `deg(power)` values of the component of the sequence attached to
/// `power`, obtained by applying the idempotent `s*(chi/power) mod chi` as a
/// shift operator.
fn component_values(chi: &Poly, power: &Poly, terms: &[Rational]) -> Result<Vec<Rational>> {
    let cofactor = chi
        .div_exact(power)
        .ok_or_else(|| failure("factor does not divide the characteristic polynomial"))?;
    let (g, s, _) = Poly::ext_gcd(&cofactor, power);
    if !g.is_one() {
        return Err(failure("factor powers are not coprime"));
    }
    let (_, idempotent) = (s * &cofactor).div_rem(chi);
    let width = power.degree().unwrap_or(0);

    Ok((0..width)
        .map(|n| {
            idempotent
                .coeff_entries()
                .map(|(k, e)| e * &terms[n + k])
                .fold(Rational::zero(), |acc, t| acc + t)
        })
        .collect())
}

/// `x^2 + b*x + c = 0` has roots `-b/2 ± sqrt(b^2 - 4c)/2`.
fn quadratic_roots(b: &Rational, c: &Rational) -> [Surd; 2] {
    let disc = b * b - Rational::from_integer(BigInt::from(4)) * c;
    let (scale, radicand) = split_square(&disc);
    let half = Rational::new(BigInt::from(1), BigInt::from(2));
    let root = Surd::new(-b * &half, scale * &half, radicand);
    let conjugate = root.conjugate();
    [root, conjugate]
}

/// Fits `sum_j (sum_{k<e} c_jk n^k) root_j^n` to the first `roots.len() * e`
/// values of a component.
fn close_component(roots: &[Surd], multiplicity: usize, values: &[Rational]) -> Result<Vec<Component>> {
    let size = roots.len() * multiplicity;
    if values.len() != size {
        return Err(failure("component width does not match its factor"));
    }

    let mut rows = Vec::with_capacity(size);
    for n in 0..size {
        let index = Surd::from_rational(Rational::from_integer(BigInt::from(n)));
        let mut row = Vec::with_capacity(size);
        for root in roots {
            let root_power = root.pow(n as u64);
            let mut index_power = Surd::from_rational(Rational::from_integer(BigInt::from(1)));
            for _ in 0..multiplicity {
                row.push(crate::polynomial::CoeffOps::mul(&index_power, &root_power));
                index_power = crate::polynomial::CoeffOps::mul(&index_power, &index);
            }
        }
        rows.push(row);
    }
    let rhs = values.iter().cloned().map(Surd::from_rational).collect();

    let solution = linear::solve_square(rows, rhs)
        .ok_or_else(|| failure("singular system while fitting initial values"))?;

    Ok(roots
        .iter()
        .zip(solution.chunks(multiplicity))
        .map(|(root, coeffs)| Component {
            root: root.clone(),
            coefficients: Polynomial::from_coeffs(coeffs.iter().cloned()),
        })
        .filter(|component| !component.coefficients.is_zero())
        .collect())
}

fn failure(message: &str) -> RequestError {
    RequestError::SolverFailure(message.to_string())
}
