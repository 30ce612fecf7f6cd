use std::collections::BTreeMap;
use std::fmt;

use num_bigint::BigInt;

use crate::error::{RequestError, Result};
use crate::expr::{self, Expr, Rational};
use crate::field::Surd;
use crate::polynomial::{CoeffOps, Polynomial};
use crate::recurrence::RecurrenceSpec;

/// One term family `coefficients(n) * root^n` of a closed form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    pub root: Surd,
    pub coefficients: Polynomial<Surd>,
}

impl Component {
    pub fn evaluate(&self, n: u64) -> Surd {
        let index = Surd::from_rational(Rational::from_integer(BigInt::from(n)));
        self.coefficients.evaluate(&index).mul(&self.root.pow(n))
    }

    pub fn to_expr(&self, index: &str) -> Expr {
        let poly = expr::sum(
            self.coefficients
                .coeff_entries()
                .map(|(k, c)| expr::product([c.to_expr(), index_power(index, k)])),
        );
        if self.root.is_one() {
            poly
        } else {
            expr::product([poly, expr::pow(self.root.to_expr(), Expr::var(index))])
        }
    }
}

fn index_power(index: &str, k: usize) -> Expr {
    match k {
        0 => expr::one(),
        1 => Expr::var(index),
        _ => expr::pow(Expr::var(index), Expr::integer(k)),
    }
}

/// Closed form of a recurrence: the sum of its components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosedForm {
    index: String,
    components: Vec<Component>,
}

impl ClosedForm {
    pub fn new(index: impl Into<String>, components: Vec<Component>) -> Self {
        ClosedForm {
            index: index.into(),
            components,
        }
    }

    pub fn index_symbol(&self) -> &str {
        &self.index
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Exact value of the n-th term, or `None` if the components fail to
    /// cancel to a rational.
    pub fn evaluate(&self, n: u64) -> Option<Rational> {
        // components over different quadratic fields are summed separately
        let mut by_field: BTreeMap<BigInt, Surd> = BTreeMap::new();
        for component in &self.components {
            let value = component.evaluate(n);
            let slot = by_field
                .entry(component.root.radicand().clone())
                .or_insert_with(Surd::zero);
            *slot = slot.add(&value);
        }
        let mut total = Rational::from_integer(BigInt::from(0));
        for value in by_field.values() {
            if !value.is_rational() {
                return None;
            }
            total += value.rational_part();
        }
        Some(total)
    }

    pub fn to_expr(&self) -> Expr {
        expr::sum(self.components.iter().map(|c| c.to_expr(&self.index)))
    }

    /// Checks the first `count` terms against direct iteration of `spec`.
    pub fn verify(&self, spec: &RecurrenceSpec, count: usize) -> Result<()> {
        for (n, expected) in spec.terms().take(count).enumerate() {
            if self.evaluate(n as u64).as_ref() != Some(&expected) {
                return Err(RequestError::SolverFailure(format!(
                    "closed form disagrees with the recurrence at f({n})"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ClosedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f({}) = {}", self.index, self.to_expr())
    }
}
