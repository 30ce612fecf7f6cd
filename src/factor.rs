//! Factorization of rational polynomials into the pieces a recurrence can be
//! closed over: linear factors, irreducible quadratics, and whatever is left.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::expr::{Expr, Rational};
use crate::polynomial::Poly;

/// Largest magnitude whose divisors are enumerated.
const DIVISOR_LIMIT: u64 = 1_000_000_000_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactorKind {
    /// The factor `x`.
    ZeroRoot,
    /// `x - root`.
    Linear(Rational),
    /// Irreducible `x^2 + b*x + c`.
    Quadratic { b: Rational, c: Rational },
    /// Irreducible of degree three or more.
    Irreducible,
    /// The search budget ran out before the piece could be split further.
    Undecided,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Factor {
    /// Monic.
    pub poly: Poly,
    pub multiplicity: usize,
    pub kind: FactorKind,
}

impl Factor {
    fn new(poly: Poly, multiplicity: usize, kind: FactorKind) -> Self {
        Factor {
            poly,
            multiplicity,
            kind,
        }
    }

    pub fn degree(&self) -> usize {
        self.poly.degree().unwrap_or(0)
    }

    /// `poly^multiplicity`.
    pub fn power(&self) -> Poly {
        self.poly.pow(self.multiplicity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Factorization {
    pub constant: Rational,
    pub factors: Vec<Factor>,
}

impl Factorization {
    /// Multiplies the factorization back out.
    pub fn expand(&self) -> Poly {
        self.factors
            .iter()
            .fold(Poly::from_constant(self.constant.clone()), |acc, f| {
                acc * f.power()
            })
    }

    pub fn to_expr(&self, var: &str) -> Expr {
        let mut factors = vec![Expr::Constant(self.constant.clone())];
        for factor in &self.factors {
            let base = factor.poly.to_expr(var);
            factors.push(if factor.multiplicity == 1 {
                base
            } else {
                crate::expr::pow(base, Expr::integer(factor.multiplicity))
            });
        }
        crate::expr::product(factors)
    }

    pub fn is_fully_split(&self) -> bool {
        self.factors
            .iter()
            .all(|f| !matches!(f.kind, FactorKind::Irreducible | FactorKind::Undecided))
    }
}

/// Factors `poly` over the rationals.
///
/// Linear factors come from the rational root theorem, quadratic factors of
/// higher-degree pieces from Kronecker's interpolation search, which tries at
/// most `search_limit` candidates per piece.
pub fn factor_polynomial(
    poly: &Poly,
    search_limit: usize,
    cancel: &CancelToken,
) -> Result<Factorization> {
    if poly.is_zero() {
        return Ok(Factorization {
            constant: Rational::zero(),
            factors: Vec::new(),
        });
    }

    let constant = poly.leading_coeff();
    let mut monic = poly.monic();
    let mut factors = Vec::new();

    let zeros = monic.valuation().unwrap_or(0);
    if zeros > 0 {
        factors.push(Factor::new(
            Poly::monomial(Rational::one(), 1),
            zeros,
            FactorKind::ZeroRoot,
        ));
        monic = monic.shift_down(zeros);
    }

    for (part, multiplicity) in monic.square_free_decomposition() {
        let (_, primitive) = part.content_and_primitive_part();
        let Some(int_poly) = IntPoly::from_poly_exact(&primitive) else {
            continue;
        };
        let mut pieces = Vec::new();
        split_integer_polynomial(int_poly, search_limit, cancel, &mut pieces)?;
        for (piece, undecided) in pieces {
            let monic_piece = piece.to_monic_poly();
            let kind = classify(&monic_piece, undecided);
            factors.push(Factor::new(monic_piece, multiplicity, kind));
        }
    }

    factors.sort_by(|a, b| {
        a.degree()
            .cmp(&b.degree())
            .then_with(|| a.poly.to_expr("x").cmp(&b.poly.to_expr("x")))
    });
    debug!(count = factors.len(), "factored characteristic polynomial");

    Ok(Factorization { constant, factors })
}

fn classify(monic: &Poly, undecided: bool) -> FactorKind {
    match monic.degree() {
        _ if undecided => FactorKind::Undecided,
        Some(1) if monic.coeff(0).is_zero() => FactorKind::ZeroRoot,
        Some(1) => FactorKind::Linear(-monic.coeff(0)),
        Some(2) => FactorKind::Quadratic {
            b: monic.coeff(1),
            c: monic.coeff(0),
        },
        _ => FactorKind::Irreducible,
    }
}

/// Splits a square-free primitive integer polynomial, pushing `(piece, undecided)`.
fn split_integer_polynomial(
    poly: IntPoly,
    search_limit: usize,
    cancel: &CancelToken,
    out: &mut Vec<(IntPoly, bool)>,
) -> Result<()> {
    cancel.check()?;
    let poly = poly.primitive_part();
    match poly.degree() {
        None | Some(0) => return Ok(()),
        Some(1) => {
            out.push((poly, false));
            return Ok(());
        }
        Some(2) => {
            match split_quadratic(&poly) {
                Some((a, b)) => {
                    out.push((a, false));
                    out.push((b, false));
                }
                None => out.push((poly, false)),
            }
            return Ok(());
        }
        Some(_) => {}
    }

    match rational_root_factor(&poly) {
        RootSearch::Found(factor, quotient) => {
            out.push((factor, false));
            return split_integer_polynomial(quotient, search_limit, cancel, out);
        }
        RootSearch::TooLarge => {
            out.push((poly, true));
            return Ok(());
        }
        RootSearch::None => {}
    }

    // No rational roots: a cubic is irreducible, anything larger may still
    // carry quadratic factors.
    if poly.degree() == Some(3) {
        out.push((poly, false));
        return Ok(());
    }

    match find_quadratic_factor(&poly, search_limit, cancel)? {
        QuadraticSearch::Found(factor, quotient) => {
            out.push((factor, false));
            split_integer_polynomial(quotient, search_limit, cancel, out)
        }
        QuadraticSearch::Exhausted => {
            out.push((poly, true));
            Ok(())
        }
        QuadraticSearch::None => {
            out.push((poly, false));
            Ok(())
        }
    }
}

/// Splits `a*x^2 + b*x + c` into linear factors when its discriminant is a square.
fn split_quadratic(poly: &IntPoly) -> Option<(IntPoly, IntPoly)> {
    let a = poly.coeff(2);
    let b = poly.coeff(1);
    let c = poly.coeff(0);
    let disc = &b * &b - BigInt::from(4) * &a * &c;
    if disc.is_negative() {
        return None;
    }
    let root = disc.sqrt();
    if &root * &root != disc {
        return None;
    }
    // roots (-b ± root) / 2a, as factors 2a*x + b ∓ root
    let two_a = BigInt::from(2) * &a;
    let first = IntPoly::new(vec![&b - &root, two_a.clone()]).primitive_part();
    let second = IntPoly::new(vec![&b + &root, two_a]).primitive_part();
    Some((first, second))
}

enum RootSearch {
    Found(IntPoly, IntPoly),
    None,
    TooLarge,
}

fn rational_root_factor(poly: &IntPoly) -> RootSearch {
    let constant = poly.coeff(0);
    let leading = poly.leading_coeff();
    let (Some(p_candidates), Some(q_candidates)) = (divisors(&constant), divisors(&leading)) else {
        return RootSearch::TooLarge;
    };
    let poly_q = poly.to_poly();

    for p in &p_candidates {
        for q in &q_candidates {
            for numer in [p.clone(), -p.clone()] {
                let root = Rational::new(numer.clone(), q.clone());
                if !poly_q.evaluate(&root).is_zero() {
                    continue;
                }
                let factor = IntPoly::new(vec![-numer, q.clone()]).primitive_part();
                if let Some(quotient) = poly.div_exact(&factor) {
                    return RootSearch::Found(factor, quotient);
                }
            }
        }
    }

    RootSearch::None
}

enum QuadraticSearch {
    Found(IntPoly, IntPoly),
    None,
    Exhausted,
}

/// Kronecker's method restricted to degree two: any integer quadratic factor
/// `h` has `h(x) | poly(x)` at `x = 0, 1, -1`, so `h` is the interpolant of
/// some triple of divisors.
fn find_quadratic_factor(
    poly: &IntPoly,
    search_limit: usize,
    cancel: &CancelToken,
) -> Result<QuadraticSearch> {
    let values = [poly.eval_int(0), poly.eval_int(1), poly.eval_int(-1)];
    let mut candidates = Vec::with_capacity(3);
    for value in &values {
        let Some(divs) = divisors(value) else {
            return Ok(QuadraticSearch::Exhausted);
        };
        let signed: Vec<BigInt> = divs.iter().flat_map(|d| [d.clone(), -d.clone()]).collect();
        candidates.push(signed);
    }
    let total = candidates.iter().map(Vec::len).product::<usize>();
    if total > search_limit {
        debug!(total, search_limit, "quadratic factor search over budget");
        return Ok(QuadraticSearch::Exhausted);
    }

    let two = BigInt::from(2);
    let mut tried = 0usize;
    for h0 in &candidates[0] {
        for h1 in &candidates[1] {
            for h_neg in &candidates[2] {
                tried += 1;
                if tried % 1024 == 0 {
                    cancel.check()?;
                }
                // h(x) = a*x^2 + b*x + h0 with h(1) = h1 and h(-1) = h_neg
                let two_a = h1 + h_neg - &two * h0;
                let two_b = h1 - h_neg;
                if two_a.is_odd() || two_b.is_odd() || !two_a.is_positive() {
                    continue;
                }
                let candidate = IntPoly::new(vec![h0.clone(), two_b / &two, two_a / &two]);
                if !candidate.content().is_one() {
                    continue;
                }
                if let Some(quotient) = poly.div_exact(&candidate) {
                    return Ok(QuadraticSearch::Found(candidate, quotient));
                }
            }
        }
    }

    Ok(QuadraticSearch::None)
}

/// Positive divisors of `n`, or `None` past the enumeration limit.
fn divisors(n: &BigInt) -> Option<Vec<BigInt>> {
    let abs_n = n.abs().to_u64().filter(|v| *v <= DIVISOR_LIMIT)?;
    if abs_n == 0 {
        return Some(Vec::new());
    }
    let mut result = Vec::new();
    let mut d = 1u64;
    while d * d <= abs_n {
        if abs_n % d == 0 {
            result.push(BigInt::from(d));
            let other = abs_n / d;
            if other != d {
                result.push(BigInt::from(other));
            }
        }
        d += 1;
    }
    Some(result)
}

/// Dense integer polynomial in ascending powers.
#[derive(Clone, Debug, PartialEq, Eq)]
struct IntPoly {
    coeffs: Vec<BigInt>,
}

impl IntPoly {
    fn new(mut coeffs: Vec<BigInt>) -> Self {
        while coeffs.last().map(|c| c.is_zero()).unwrap_or(false) {
            coeffs.pop();
        }
        IntPoly { coeffs }
    }

    fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    fn coeff(&self, power: usize) -> BigInt {
        self.coeffs.get(power).cloned().unwrap_or_else(BigInt::zero)
    }

    fn leading_coeff(&self) -> BigInt {
        self.coeffs.last().cloned().unwrap_or_else(BigInt::zero)
    }

    fn eval_int(&self, x: i64) -> BigInt {
        let x = BigInt::from(x);
        self.coeffs
            .iter()
            .rev()
            .fold(BigInt::zero(), |acc, c| acc * &x + c)
    }

    fn content(&self) -> BigInt {
        self.coeffs
            .iter()
            .fold(BigInt::zero(), |acc, c| acc.gcd(c))
    }

    /// Divides out the content and makes the leading coefficient positive.
    fn primitive_part(&self) -> Self {
        let mut content = self.content();
        if content.is_zero() {
            return self.clone();
        }
        if self.leading_coeff().is_negative() {
            content = -content;
        }
        IntPoly::new(self.coeffs.iter().map(|c| c / &content).collect())
    }

    fn div_exact(&self, divisor: &Self) -> Option<Self> {
        let quotient = self.to_poly().div_exact(&divisor.to_poly())?;
        IntPoly::from_poly_exact(&quotient)
    }

    fn to_poly(&self) -> Poly {
        let coeffs: BTreeMap<usize, Rational> = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(exp, c)| (exp, Rational::from_integer(c.clone())))
            .collect();
        Poly { coeffs }
    }

    fn to_monic_poly(&self) -> Poly {
        self.to_poly().monic()
    }

    fn from_poly_exact(poly: &Poly) -> Option<Self> {
        let degree = poly.degree().unwrap_or(0);
        let mut coeffs = vec![BigInt::zero(); degree + 1];
        for (exp, coeff) in poly.coeff_entries() {
            if !coeff.denom().is_one() {
                return None;
            }
            coeffs[exp] = coeff.numer().clone();
        }
        Some(IntPoly::new(coeffs))
    }
}
