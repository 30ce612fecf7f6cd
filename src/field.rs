//! Exact arithmetic in `Q` and in quadratic extensions `Q(sqrt d)`.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::expr::{self, Expr, Rational};
use crate::polynomial::CoeffOps;

/// Coefficients that support exact division.
pub trait Field: CoeffOps {
    /// Multiplicative inverse, `None` for zero.
    fn inv(&self) -> Option<Self>;

    fn from_rational(value: Rational) -> Self;

    fn div(&self, other: &Self) -> Option<Self> {
        other.inv().map(|inv| self.mul(&inv))
    }
}

impl Field for Rational {
    fn inv(&self) -> Option<Self> {
        if Zero::is_zero(self) {
            None
        } else {
            Some(self.recip())
        }
    }

    fn from_rational(value: Rational) -> Self {
        value
    }
}

/// `rational + radical * sqrt(radicand)`.
///
/// A value with a zero radical part is stored with radicand `0`, so plain
/// rationals combine with members of any quadratic field. Two values with
/// non-zero radical parts must share the radicand.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Surd {
    rational: Rational,
    radical: Rational,
    radicand: BigInt,
}

impl Surd {
    pub fn new(rational: Rational, radical: Rational, radicand: BigInt) -> Self {
        if Zero::is_zero(&radical) || radicand.is_zero() {
            return Surd::from_rational(rational);
        }
        Surd {
            rational,
            radical,
            radicand,
        }
    }

    pub fn from_rational(value: Rational) -> Self {
        Surd {
            rational: value,
            radical: Zero::zero(),
            radicand: BigInt::zero(),
        }
    }

    pub fn rational_part(&self) -> &Rational {
        &self.rational
    }

    pub fn radical_part(&self) -> &Rational {
        &self.radical
    }

    pub fn radicand(&self) -> &BigInt {
        &self.radicand
    }

    pub fn is_rational(&self) -> bool {
        Zero::is_zero(&self.radical)
    }

    pub fn conjugate(&self) -> Self {
        Surd::new(self.rational.clone(), -self.radical.clone(), self.radicand.clone())
    }

    /// `rational^2 - radical^2 * radicand`, the product with the conjugate.
    pub fn norm(&self) -> Rational {
        let d = Rational::from_integer(self.radicand.clone());
        &self.rational * &self.rational - &self.radical * &self.radical * d
    }

    pub fn pow(&self, exp: u64) -> Self {
        let mut result = <Surd as CoeffOps>::one();
        let mut base = self.clone();
        let mut n = exp;
        while n > 0 {
            if n % 2 == 1 {
                result = CoeffOps::mul(&result, &base);
            }
            base = CoeffOps::mul(&base, &base);
            n /= 2;
        }
        result
    }

    pub fn to_expr(&self) -> Expr {
        if self.is_rational() {
            return Expr::Constant(self.rational.clone());
        }
        let root = expr::product([
            Expr::Constant(self.radical.clone()),
            Expr::sqrt(&self.radicand),
        ]);
        expr::sum([Expr::Constant(self.rational.clone()), root])
    }

    fn shared_radicand(&self, other: &Self) -> BigInt {
        debug_assert!(
            self.radicand.is_zero() || other.radicand.is_zero() || self.radicand == other.radicand,
            "mixed quadratic fields"
        );
        if self.radicand.is_zero() {
            other.radicand.clone()
        } else {
            self.radicand.clone()
        }
    }
}

impl CoeffOps for Surd {
    fn zero() -> Self {
        Surd::from_rational(Zero::zero())
    }

    fn one() -> Self {
        Surd::from_rational(One::one())
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(&self.rational) && Zero::is_zero(&self.radical)
    }

    fn is_one(&self) -> bool {
        One::is_one(&self.rational) && Zero::is_zero(&self.radical)
    }

    fn add(&self, other: &Self) -> Self {
        Surd::new(
            &self.rational + &other.rational,
            &self.radical + &other.radical,
            self.shared_radicand(other),
        )
    }

    fn sub(&self, other: &Self) -> Self {
        Surd::new(
            &self.rational - &other.rational,
            &self.radical - &other.radical,
            self.shared_radicand(other),
        )
    }

    fn mul(&self, other: &Self) -> Self {
        let d = self.shared_radicand(other);
        let rational = &self.rational * &other.rational
            + &self.radical * &other.radical * Rational::from_integer(d.clone());
        let radical = &self.rational * &other.radical + &self.radical * &other.rational;
        Surd::new(rational, radical, d)
    }

    fn neg(&self) -> Self {
        Surd::new(-self.rational.clone(), -self.radical.clone(), self.radicand.clone())
    }
}

impl Field for Surd {
    fn inv(&self) -> Option<Self> {
        let norm = self.norm();
        if Zero::is_zero(&norm) {
            return None;
        }
        Some(Surd::new(
            &self.rational / &norm,
            -(&self.radical / &norm),
            self.radicand.clone(),
        ))
    }

    fn from_rational(value: Rational) -> Self {
        Surd::from_rational(value)
    }
}

const TRIAL_DIVISION_LIMIT: u64 = 1_000_000;

/// Writes `sqrt(value)` as `scale * sqrt(radicand)` with an integer radicand
/// stripped of its square factors below the trial-division limit.
pub fn split_square(value: &Rational) -> (Rational, BigInt) {
    let n = value.numer() * value.denom();
    let (outside, radicand) = square_part(&n);
    (Rational::new(outside, value.denom().clone()), radicand)
}

fn square_part(n: &BigInt) -> (BigInt, BigInt) {
    let mut rest = n.abs();
    let mut outside = BigInt::one();
    let mut k = 2u64;
    while k <= TRIAL_DIVISION_LIMIT {
        let square = BigInt::from(k * k);
        if square > rest {
            break;
        }
        while (&rest % &square).is_zero() {
            rest /= &square;
            outside *= k;
        }
        k += 1;
    }
    if rest > BigInt::one() {
        let root = rest.sqrt();
        if &root * &root == rest {
            outside *= root;
            rest = BigInt::one();
        }
    }
    if n.is_negative() {
        rest = -rest;
    }
    (outside, rest)
}
