use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::expr::{Expr, Rational};
use crate::field::Field;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

pub trait CoeffOps: Clone {
    fn zero() -> Self;
    fn one() -> Self;
    fn is_zero(&self) -> bool;
    fn is_one(&self) -> bool;
    fn add(&self, other: &Self) -> Self;
    fn sub(&self, other: &Self) -> Self;
    fn mul(&self, other: &Self) -> Self;
    fn neg(&self) -> Self;
}

impl CoeffOps for Rational {
    fn zero() -> Self {
        Zero::zero()
    }

    fn one() -> Self {
        One::one()
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn is_one(&self) -> bool {
        One::is_one(self)
    }

    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn sub(&self, other: &Self) -> Self {
        self - other
    }

    fn mul(&self, other: &Self) -> Self {
        self * other
    }

    fn neg(&self) -> Self {
        -self.clone()
    }
}

/// Sparse univariate polynomial; only non-zero coefficients are stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polynomial<C> {
    pub(crate) coeffs: BTreeMap<usize, C>,
}

pub type Poly = Polynomial<Rational>;

impl<C: CoeffOps> Polynomial<C> {
    pub fn zero() -> Self {
        Polynomial {
            coeffs: BTreeMap::new(),
        }
    }

    pub fn one() -> Self {
        Polynomial::from_constant(C::one())
    }

    pub fn from_constant(c: C) -> Self {
        Polynomial::monomial(c, 0)
    }

    pub fn monomial(c: C, power: usize) -> Self {
        let mut coeffs = BTreeMap::new();
        if !c.is_zero() {
            coeffs.insert(power, c);
        }
        Polynomial { coeffs }
    }

    /// Builds a polynomial from coefficients in ascending powers.
    pub fn from_coeffs(coeffs: impl IntoIterator<Item = C>) -> Self {
        let coeffs = coeffs
            .into_iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .collect();
        Polynomial { coeffs }
    }

    pub fn degree(&self) -> Option<usize> {
        self.coeffs.keys().next_back().copied()
    }

    /// Lowest power with a non-zero coefficient.
    pub fn valuation(&self) -> Option<usize> {
        self.coeffs.keys().next().copied()
    }

    pub fn leading_coeff(&self) -> C {
        self.coeffs
            .values()
            .next_back()
            .cloned()
            .unwrap_or_else(C::zero)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs.get(&0).map(|c| c.is_one()).unwrap_or(false)
    }

    pub fn coeff(&self, power: usize) -> C {
        self.coeffs.get(&power).cloned().unwrap_or_else(C::zero)
    }

    pub fn coeff_entries(&self) -> impl Iterator<Item = (usize, C)> + '_ {
        self.coeffs.iter().map(|(e, c)| (*e, c.clone()))
    }

    pub fn pow(&self, exp: usize) -> Self {
        let mut result = Polynomial::one();
        let mut base = self.clone();
        let mut n = exp;
        while n > 0 {
            if n % 2 == 1 {
                result = result * base.clone();
            }
            base = base.clone() * base;
            n /= 2;
        }
        result
    }

    pub fn scale(&self, k: &C) -> Self {
        if k.is_zero() {
            return Polynomial::zero();
        }
        let mut coeffs = BTreeMap::new();
        for (exp, coeff) in &self.coeffs {
            let scaled = coeff.mul(k);
            if !scaled.is_zero() {
                coeffs.insert(*exp, scaled);
            }
        }
        Polynomial { coeffs }
    }

    /// Divides by `x^k`, dropping every term below that power.
    pub fn shift_down(&self, k: usize) -> Self {
        let coeffs = self
            .coeffs
            .iter()
            .filter(|(exp, _)| **exp >= k)
            .map(|(exp, c)| (exp - k, c.clone()))
            .collect();
        Polynomial { coeffs }
    }

    /// Horner evaluation at `x`.
    pub fn evaluate(&self, x: &C) -> C {
        let Some(degree) = self.degree() else {
            return C::zero();
        };
        let mut acc = C::zero();
        for exp in (0..=degree).rev() {
            acc = acc.mul(x).add(&self.coeff(exp));
        }
        acc
    }
}

impl<C: CoeffOps> std::ops::Add for Polynomial<C> {
    type Output = Polynomial<C>;
    fn add(self, rhs: Polynomial<C>) -> Polynomial<C> {
        let mut coeffs = self.coeffs;
        for (exp, coeff) in rhs.coeffs {
            match coeffs.entry(exp) {
                Entry::Vacant(entry) => {
                    entry.insert(coeff);
                }
                Entry::Occupied(mut entry) => {
                    let updated = entry.get().add(&coeff);
                    if updated.is_zero() {
                        entry.remove();
                    } else {
                        *entry.get_mut() = updated;
                    }
                }
            }
        }
        Polynomial { coeffs }
    }
}

impl<C: CoeffOps> std::ops::Sub for Polynomial<C> {
    type Output = Polynomial<C>;
    fn sub(self, rhs: Polynomial<C>) -> Polynomial<C> {
        self + (-rhs)
    }
}

impl<C: CoeffOps> std::ops::Sub<&Polynomial<C>> for Polynomial<C> {
    type Output = Polynomial<C>;
    fn sub(self, rhs: &Polynomial<C>) -> Polynomial<C> {
        self - rhs.clone()
    }
}

impl<C: CoeffOps> std::ops::Mul for Polynomial<C> {
    type Output = Polynomial<C>;
    fn mul(self, rhs: Polynomial<C>) -> Polynomial<C> {
        let mut coeffs = BTreeMap::new();
        for (exp_a, coeff_a) in &self.coeffs {
            for (exp_b, coeff_b) in &rhs.coeffs {
                let product = coeff_a.mul(coeff_b);
                if product.is_zero() {
                    continue;
                }
                match coeffs.entry(exp_a + exp_b) {
                    Entry::Vacant(entry) => {
                        entry.insert(product);
                    }
                    Entry::Occupied(mut entry) => {
                        let updated = entry.get().add(&product);
                        if updated.is_zero() {
                            entry.remove();
                        } else {
                            *entry.get_mut() = updated;
                        }
                    }
                }
            }
        }
        Polynomial { coeffs }
    }
}

impl<C: CoeffOps> std::ops::Mul<&Polynomial<C>> for Polynomial<C> {
    type Output = Polynomial<C>;
    fn mul(self, rhs: &Polynomial<C>) -> Polynomial<C> {
        self * rhs.clone()
    }
}

impl<C: CoeffOps> std::ops::Neg for Polynomial<C> {
    type Output = Polynomial<C>;
    fn neg(self) -> Polynomial<C> {
        let coeffs = self
            .coeffs
            .into_iter()
            .map(|(exp, coeff)| (exp, coeff.neg()))
            .collect();
        Polynomial { coeffs }
    }
}

impl<C: Field> Polynomial<C> {
    pub fn monic(&self) -> Self {
        match self.leading_coeff().inv() {
            Some(inv) => self.scale(&inv),
            None => self.clone(),
        }
    }

    pub fn div_rem(&self, divisor: &Self) -> (Self, Self) {
        let Some(divisor_degree) = divisor.degree() else {
            return (Polynomial::zero(), self.clone());
        };
        let Some(inv_lc) = divisor.leading_coeff().inv() else {
            return (Polynomial::zero(), self.clone());
        };
        let mut remainder = self.clone();
        let mut quotient = Polynomial::zero();

        while let Some(r_deg) = remainder.degree() {
            if r_deg < divisor_degree {
                break;
            }
            let term = Polynomial::monomial(
                remainder.leading_coeff().mul(&inv_lc),
                r_deg - divisor_degree,
            );
            quotient = quotient + term.clone();
            remainder = remainder - &(term * divisor);
        }

        (quotient, remainder)
    }

    pub fn div_exact(&self, divisor: &Self) -> Option<Self> {
        let (q, r) = self.div_rem(divisor);
        if r.is_zero() { Some(q) } else { None }
    }

    pub fn gcd(a: &Self, b: &Self) -> Self {
        let mut r0 = a.clone();
        let mut r1 = b.clone();
        while !r1.is_zero() {
            let (_, r) = r0.div_rem(&r1);
            r0 = r1;
            r1 = r;
        }
        r0.monic()
    }

    /// Extended Euclid: returns `(g, s, t)` with `s*a + t*b = g` and `g` monic.
    pub fn ext_gcd(a: &Self, b: &Self) -> (Self, Self, Self) {
        let (mut r0, mut r1) = (a.clone(), b.clone());
        let (mut s0, mut s1) = (Polynomial::one(), Polynomial::zero());
        let (mut t0, mut t1) = (Polynomial::zero(), Polynomial::one());
        while !r1.is_zero() {
            let (q, r) = r0.div_rem(&r1);
            let s = s0 - &(q.clone() * &s1);
            let t = t0 - &(q * &t1);
            r0 = std::mem::replace(&mut r1, r);
            s0 = std::mem::replace(&mut s1, s);
            t0 = std::mem::replace(&mut t1, t);
        }
        match r0.leading_coeff().inv() {
            Some(inv) => (r0.scale(&inv), s0.scale(&inv), t0.scale(&inv)),
            None => (r0, s0, t0),
        }
    }
}

impl Polynomial<Rational> {
    pub fn derivative(&self) -> Self {
        let coeffs = self
            .coeffs
            .iter()
            .filter(|(exp, _)| **exp > 0)
            .map(|(exp, coeff)| {
                let factor = Rational::from_integer(BigInt::from(*exp));
                (exp - 1, coeff * factor)
            })
            .collect();
        Polynomial { coeffs }
    }

    pub fn linear_root(&self) -> Option<Rational> {
        if self.degree()? != 1 {
            return None;
        }
        let a = self.coeff(1);
        let b = self.coeff(0);
        if Zero::is_zero(&a) { None } else { Some(-b / a) }
    }

    pub fn to_expr(&self, var: &str) -> Expr {
        if self.is_zero() {
            return Expr::Constant(Zero::zero());
        }
        let mut terms: Vec<Expr> = Vec::new();
        for (exp, coeff) in self.coeffs.iter().rev() {
            let term = if *exp == 0 {
                Expr::Constant(coeff.clone())
            } else {
                let pow = if *exp == 1 {
                    Expr::var(var)
                } else {
                    crate::expr::pow(Expr::var(var), Expr::integer(*exp))
                };
                crate::expr::product([Expr::Constant(coeff.clone()), pow])
            };
            terms.push(term);
        }
        crate::expr::sum(terms)
    }

    pub fn content_and_primitive_part(&self) -> (Rational, Self) {
        if self.is_zero() {
            return (Zero::zero(), Polynomial::zero());
        }
        let mut lcm = BigInt::one();
        for coeff in self.coeffs.values() {
            lcm = lcm.lcm(coeff.denom());
        }

        let mut gcd_num = BigInt::zero();
        let mut scaled_nums = BTreeMap::new();
        for (exp, coeff) in &self.coeffs {
            let num = (coeff * Rational::from_integer(lcm.clone())).to_integer();
            gcd_num = gcd_num.gcd(&num);
            scaled_nums.insert(*exp, num);
        }

        let coeffs = scaled_nums
            .into_iter()
            .map(|(exp, num)| (exp, Rational::from_integer(num / &gcd_num)))
            .collect();
        let mut primitive = Polynomial { coeffs };
        let mut content = Rational::new(gcd_num, lcm);
        if primitive.leading_coeff().is_negative() {
            primitive = -primitive;
            content = -content;
        }
        (content, primitive)
    }

    /// Yun's square-free decomposition of a monic polynomial: pairs of
    /// square-free, pairwise coprime parts and their multiplicities.
    pub fn square_free_decomposition(&self) -> Vec<(Poly, usize)> {
        if self.degree().unwrap_or(0) == 0 {
            return Vec::new();
        }

        let mut result = Vec::new();
        let mut multiplicity = 1;
        let mut g = Poly::gcd(self, &self.derivative());
        let mut y = self.div_exact(&g).unwrap_or_else(Poly::zero);

        while !y.is_one() && !y.is_zero() {
            let z = Poly::gcd(&y, &g);
            let factor = y.div_exact(&z).unwrap_or_else(Poly::zero);
            if !factor.is_one() {
                result.push((factor, multiplicity));
            }
            g = g.div_exact(&z).unwrap_or_else(Poly::zero);
            y = z;
            multiplicity += 1;
        }

        result
    }
}
