use std::collections::VecDeque;
use std::fmt;

use num_traits::{One, Signed, Zero};

use crate::error::{RequestError, Result};
use crate::expr::Rational;
use crate::polynomial::Poly;

/// `f(n) = a_1*f(n-1) + ... + a_m*f(n-m)` with `f(0..m)` given.
///
/// `coefficients[i]` multiplies `f(n-i-1)`. Both lists always hold exactly
/// `order()` entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecurrenceSpec {
    coefficients: Vec<Rational>,
    initial_values: Vec<Rational>,
}

impl RecurrenceSpec {
    pub fn new(
        order: usize,
        coefficients: Vec<Rational>,
        initial_values: Vec<Rational>,
    ) -> Result<Self> {
        if order == 0 || coefficients.len() != order || initial_values.len() != order {
            return Err(RequestError::count_mismatch());
        }
        Ok(RecurrenceSpec {
            coefficients,
            initial_values,
        })
    }

    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    pub fn coefficients(&self) -> &[Rational] {
        &self.coefficients
    }

    pub fn initial_values(&self) -> &[Rational] {
        &self.initial_values
    }

    /// Exact terms `f(0), f(1), ...`, without end.
    pub fn terms(&self) -> Terms<'_> {
        Terms {
            spec: self,
            window: VecDeque::with_capacity(self.order()),
            index: 0,
        }
    }

    /// `x^m - a_1*x^(m-1) - ... - a_m`.
    pub fn characteristic_polynomial(&self) -> Poly {
        let m = self.order();
        let mut coeffs = vec![Rational::zero(); m + 1];
        coeffs[m] = Rational::one();
        for (i, a) in self.coefficients.iter().enumerate() {
            coeffs[m - 1 - i] = -a.clone();
        }
        Poly::from_coeffs(coeffs)
    }
}

impl fmt::Display for RecurrenceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f(n) =")?;
        let mut first = true;
        for (i, a) in self.coefficients.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            let sign = match (first, a.is_negative()) {
                (true, false) => " ",
                (true, true) => " -",
                (false, false) => " + ",
                (false, true) => " - ",
            };
            let magnitude = a.abs();
            if magnitude.is_one() {
                write!(f, "{sign}f(n-{})", i + 1)?;
            } else {
                write!(f, "{sign}{magnitude}*f(n-{})", i + 1)?;
            }
            first = false;
        }
        if first {
            write!(f, " 0")?;
        }
        Ok(())
    }
}

pub struct Terms<'a> {
    spec: &'a RecurrenceSpec,
    window: VecDeque<Rational>,
    index: usize,
}

impl Iterator for Terms<'_> {
    type Item = Rational;

    fn next(&mut self) -> Option<Rational> {
        let m = self.spec.order();
        let value = if self.index < m {
            self.spec.initial_values[self.index].clone()
        } else {
            // window holds f(n-m)..f(n-1), oldest first
            self.spec
                .coefficients
                .iter()
                .enumerate()
                .map(|(i, a)| a * &self.window[m - 1 - i])
                .fold(Rational::zero(), |acc, term| acc + term)
        };
        if self.window.len() == m {
            self.window.pop_front();
        }
        self.window.push_back(value.clone());
        self.index += 1;
        Some(value)
    }
}
