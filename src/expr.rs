//! Expression tree definitions and helpers.

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

pub type Rational = BigRational;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Expr {
    Variable(String),
    Constant(Rational),
    /// The imaginary unit `i`.
    ImaginaryUnit,
    Add(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn constant(num: impl Into<BigInt>, den: impl Into<BigInt>) -> Self {
        Expr::Constant(Rational::new(num.into(), den.into()))
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        Expr::Constant(Rational::from_integer(value.into()))
    }

    /// `sqrt(radicand)`, written as `sqrt(|radicand|)*i` for negative radicands.
    pub fn sqrt(radicand: &BigInt) -> Self {
        if radicand.is_negative() {
            let magnitude = -radicand;
            if magnitude.is_one() {
                return Expr::ImaginaryUnit;
            }
            return mul(Expr::sqrt(&magnitude), Expr::ImaginaryUnit);
        }
        pow(Expr::integer(radicand.clone()), Expr::constant(1, 2))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Constant(r) if r.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Constant(r) if r.is_one())
    }

    pub fn is_half(&self) -> bool {
        matches!(self, Expr::Constant(r) if *r == Rational::new(1.into(), 2.into()))
    }

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::format::pretty(self))
    }
}

pub fn zero() -> Expr {
    Expr::Constant(Rational::zero())
}

pub fn one() -> Expr {
    Expr::Constant(Rational::one())
}

pub fn pow(base: Expr, exp: Expr) -> Expr {
    Expr::Pow(base.boxed(), exp.boxed())
}

pub fn add(a: Expr, b: Expr) -> Expr {
    Expr::Add(a.boxed(), b.boxed())
}

pub fn mul(a: Expr, b: Expr) -> Expr {
    Expr::Mul(a.boxed(), b.boxed())
}

pub fn neg(a: Expr) -> Expr {
    Expr::Neg(a.boxed())
}

/// Left-nested sum of the non-zero terms.
pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Expr {
    terms
        .into_iter()
        .filter(|t| !t.is_zero())
        .reduce(add)
        .unwrap_or_else(zero)
}

/// Product with every constant factor folded into one leading coefficient.
pub fn product(factors: impl IntoIterator<Item = Expr>) -> Expr {
    let mut coeff = Rational::one();
    let mut rest = Vec::new();
    for factor in factors {
        match factor {
            Expr::Constant(c) => coeff *= c,
            other => rest.push(other),
        }
    }
    if coeff.is_zero() {
        return zero();
    }
    let Some(body) = rest.into_iter().reduce(mul) else {
        return Expr::Constant(coeff);
    };
    if coeff.is_one() {
        body
    } else if (-coeff.clone()).is_one() {
        neg(body)
    } else {
        mul(Expr::Constant(coeff), body)
    }
}

pub(crate) fn collect_mul_factors(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::Mul(a, b) => {
            collect_mul_factors(a, out);
            collect_mul_factors(b, out);
        }
        other => out.push(other.clone()),
    }
}

fn rebuild_mul_factors(factors: Vec<Expr>) -> Expr {
    let mut iter = factors.into_iter();
    let Some(first) = iter.next() else {
        return one();
    };
    iter.fold(first, |acc, item| Expr::Mul(acc.boxed(), item.boxed()))
}

/// Pulls the overall sign out of `expr`, returning `(negative, magnitude)`.
pub(crate) fn split_neg(expr: &Expr) -> (bool, Expr) {
    match expr {
        Expr::Neg(inner) => {
            let (is_neg, magnitude) = split_neg(inner);
            (!is_neg, magnitude)
        }
        Expr::Constant(r) if r.is_negative() => (true, Expr::Constant(-r)),
        Expr::Mul(_, _) => {
            let mut factors = Vec::new();
            collect_mul_factors(expr, &mut factors);
            let mut neg = false;
            let mut cleaned = Vec::with_capacity(factors.len());
            for factor in factors {
                let (is_neg, inner) = split_neg(&factor);
                neg ^= is_neg;
                if !inner.is_one() {
                    cleaned.push(inner);
                }
            }
            if neg {
                (true, rebuild_mul_factors(cleaned))
            } else {
                (false, expr.clone())
            }
        }
        other => (false, other.clone()),
    }
}
