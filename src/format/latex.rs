use num_bigint::BigInt;
use num_traits::{One, Signed};

use crate::expr::{Expr, Rational, collect_mul_factors, split_neg};

/// LaTeX rendering of `expr`, suitable for math mode.
///
/// A rational coefficient in front of a product becomes one fraction over
/// the whole product, and `x^(1/2)` becomes `\sqrt{x}`.
pub fn latex(expr: &Expr) -> String {
    match expr {
        Expr::Variable(v) => v.clone(),
        Expr::ImaginaryUnit => "i".to_string(),
        Expr::Constant(r) => constant(r),

        Expr::Add(a, b) => {
            let (neg_b, b_inner) = split_neg(b);
            let op = if neg_b { "-" } else { "+" };
            format!("{} {op} {}", latex(a), term(&b_inner))
        }

        Expr::Mul(_, _) => {
            let (negative, magnitude) = split_neg(expr);
            let body = product(&magnitude);
            if negative { format!("-{body}") } else { body }
        }

        Expr::Pow(base, exp) if exp.is_half() => format!("\\sqrt{{{}}}", latex(base)),
        Expr::Pow(base, exp) => format!("{}^{{{}}}", power_base(base), latex(exp)),

        Expr::Neg(inner) => {
            let (is_neg, magnitude) = split_neg(inner);
            if is_neg {
                latex(&magnitude)
            } else {
                format!("-{}", term(&magnitude))
            }
        }
    }
}

/// A summand after its sign was pulled out; sums are wrapped.
fn term(expr: &Expr) -> String {
    match expr {
        Expr::Add(_, _) => paren(&latex(expr)),
        _ => latex(expr),
    }
}

fn product(expr: &Expr) -> String {
    let mut factors = Vec::new();
    collect_mul_factors(expr, &mut factors);

    let mut coeff = Rational::one();
    let mut rest = Vec::new();
    for factor in factors {
        match factor {
            Expr::Constant(c) => coeff *= c,
            other => rest.push(other),
        }
    }

    let numerator_coeff = coeff.numer().abs();
    let mut parts: Vec<String> = Vec::new();
    if !numerator_coeff.is_one() || rest.is_empty() {
        parts.push(numerator_coeff.to_string());
    }
    parts.extend(rest.iter().map(factor));

    let mut numerator = String::new();
    for part in parts {
        if !numerator.is_empty() {
            let digit = part.starts_with(|c: char| c.is_ascii_digit());
            numerator.push_str(if digit { " \\cdot " } else { " " });
        }
        numerator.push_str(&part);
    }

    let sign = if coeff.is_negative() { "-" } else { "" };
    let denom: &BigInt = coeff.denom();
    if denom.is_one() {
        format!("{sign}{numerator}")
    } else {
        format!("{sign}\\frac{{{numerator}}}{{{denom}}}")
    }
}

fn factor(expr: &Expr) -> String {
    match expr {
        Expr::Add(_, _) | Expr::Neg(_) => paren(&latex(expr)),
        _ => latex(expr),
    }
}

fn power_base(base: &Expr) -> String {
    match base {
        Expr::Variable(_) | Expr::ImaginaryUnit => latex(base),
        Expr::Constant(r) if !r.is_negative() && r.denom().is_one() => latex(base),
        Expr::Pow(_, exp) if exp.is_half() => latex(base),
        _ => paren(&latex(base)),
    }
}

fn constant(r: &Rational) -> String {
    if r.denom().is_one() {
        return r.numer().to_string();
    }
    let sign = if r.is_negative() { "-" } else { "" };
    format!("{sign}\\frac{{{}}}{{{}}}", r.numer().abs(), r.denom())
}

fn paren(body: &str) -> String {
    format!("\\left({body}\\right)")
}
