use num_traits::{One, Signed};

use crate::expr::{Expr, Rational, collect_mul_factors, split_neg};

/// Plain-text rendering: `1/5*sqrt(5)*(1/2 + 1/2*sqrt(5))^n`.
pub fn pretty(expr: &Expr) -> String {
    fn pp(ctx: u8, expr: &Expr) -> String {
        match expr {
            Expr::Variable(v) => v.clone(),
            Expr::ImaginaryUnit => "i".to_string(),
            Expr::Constant(r) => {
                let prec = if r.is_negative() || !r.denom().is_one() { 2 } else { 4 };
                bracket(ctx, prec, show_rational(r))
            }

            Expr::Add(a, b) => {
                let (neg_b, b_inner) = split_neg(b);
                let op = if neg_b { " - " } else { " + " };
                bracket(ctx, 1, format!("{}{op}{}", pp(1, a), pp(2, &b_inner)))
            }

            Expr::Mul(_, _) => {
                let mut factors = Vec::new();
                collect_mul_factors(expr, &mut factors);
                let mut neg = false;
                let mut parts = Vec::with_capacity(factors.len());
                for factor in factors {
                    let (is_neg, inner) = split_neg(&factor);
                    neg ^= is_neg;
                    if !inner.is_one() {
                        parts.push(pp(2, &inner));
                    }
                }
                let body = if parts.is_empty() { "1".to_string() } else { parts.join("*") };
                if neg {
                    bracket(ctx, 2, format!("-{body}"))
                } else {
                    bracket(ctx, 2, body)
                }
            }

            Expr::Pow(a, b) if b.is_half() => format!("sqrt({})", pp(0, a)),
            Expr::Pow(a, b) => bracket(ctx, 3, format!("{}^{}", pp(4, a), pp(4, b))),

            Expr::Neg(a) => {
                let (is_neg, inner) = split_neg(a);
                if is_neg {
                    pp(ctx, &inner)
                } else {
                    bracket(ctx, 2, format!("-{}", pp(2, &inner)))
                }
            }
        }
    }

    pp(0, expr)
}

fn bracket(ctx: u8, prec: u8, body: String) -> String {
    if prec < ctx {
        format!("({body})")
    } else {
        body
    }
}

fn show_rational(r: &Rational) -> String {
    if r.denom().is_one() {
        format!("{}", r.numer())
    } else {
        format!("{}/{}", r.numer(), r.denom())
    }
}
