use nom::IResult;
use nom::branch::alt;
use nom::character::complete::{char, digit0, digit1, multispace0, one_of};
use nom::combinator::{all_consuming, map, opt, recognize};
use nom::error::VerboseError;
use nom::sequence::{delimited, pair, preceded, separated_pair, tuple};
use num_bigint::BigInt;
use num_traits::{Num, Signed, ToPrimitive, Zero};

use crate::error::{RequestError, Result};
use crate::expr::Rational;
use crate::recurrence::RecurrenceSpec;

/// Largest power of ten a decimal exponent may reach.
const MAX_DECIMAL_EXPONENT: usize = 4096;

/// Parses the order `m` as an integer literal.
///
/// The sign is accepted here; whether the value makes sense is decided when
/// the lists are checked against it.
pub fn parse_order(input: &str) -> Result<i64> {
    let (_, literal) = all_consuming(ws(signed_digits))(input)
        .map_err(|_| RequestError::Parse(format!("invalid order '{}'", input.trim())))?;
    int_from_digits(literal)
        .to_i64()
        .ok_or_else(|| RequestError::Parse(format!("order '{}' is out of range", input.trim())))
}

/// Parses one exact rational: `7`, `-3/4`, `0.25`, `.5` or `1e-3`.
pub fn parse_rational(input: &str) -> Result<Rational> {
    let invalid = || RequestError::Parse(format!("invalid number '{}'", input.trim()));
    let (_, literal) = all_consuming(ws(rational_literal))(input).map_err(|_| invalid())?;
    match literal {
        Literal::Fraction(_, d) if d.is_zero() => Err(RequestError::Parse(format!(
            "zero denominator in '{}'",
            input.trim()
        ))),
        Literal::Fraction(n, d) => Ok(Rational::new(n, d)),
        Literal::Decimal { mantissa, exponent } => {
            let scale = exponent
                .abs()
                .to_usize()
                .filter(|scale| *scale <= MAX_DECIMAL_EXPONENT)
                .ok_or_else(|| {
                    RequestError::Parse(format!("exponent out of range in '{}'", input.trim()))
                })?;
            let power = num_traits::pow(BigInt::from(10), scale);
            if exponent.is_negative() {
                Ok(Rational::new(mantissa, power))
            } else {
                Ok(Rational::from_integer(mantissa * power))
            }
        }
    }
}

/// Parses a comma-separated list of rationals. Every entry must be present.
pub fn parse_rational_list(input: &str) -> Result<Vec<Rational>> {
    input.split(',').map(parse_rational).collect()
}

/// Parses the three raw inputs and checks both lists against the order before
/// anything downstream sees them.
pub fn parse_request(
    order: &str,
    coefficients: &str,
    initial_values: &str,
) -> Result<RecurrenceSpec> {
    let order = parse_order(order)?;
    let coefficients = parse_rational_list(coefficients)?;
    let initial_values = parse_rational_list(initial_values)?;
    let order = usize::try_from(order).map_err(|_| RequestError::count_mismatch())?;
    RecurrenceSpec::new(order, coefficients, initial_values)
}

enum Literal {
    Fraction(BigInt, BigInt),
    /// `mantissa * 10^exponent`
    Decimal { mantissa: BigInt, exponent: BigInt },
}

fn rational_literal(input: &str) -> IResult<&str, Literal, VerboseError<&str>> {
    alt((fraction_literal, decimal_literal))(input)
}

fn fraction_literal(input: &str) -> IResult<&str, Literal, VerboseError<&str>> {
    map(
        separated_pair(signed_digits, ws(char('/')), signed_digits),
        |(num, den)| Literal::Fraction(int_from_digits(num), int_from_digits(den)),
    )(input)
}

/// `12`, `-1.5`, `.5`, `1.`, `2e3`, `1.5E-2`.
fn decimal_literal(input: &str) -> IResult<&str, Literal, VerboseError<&str>> {
    let (rest, (sign, (whole, frac), exponent)) = tuple((
        recognize(opt(one_of("+-"))),
        alt((
            map(
                pair(digit1, opt(preceded(char('.'), digit0))),
                |(whole, frac): (&str, Option<&str>)| (whole, frac.unwrap_or("")),
            ),
            map(preceded(char('.'), digit1), |frac: &str| ("", frac)),
        )),
        opt(preceded(one_of("eE"), signed_digits)),
    ))(input)?;
    let mantissa = int_from_digits(&format!("{sign}{whole}{frac}"));
    let exponent = exponent.map(int_from_digits).unwrap_or_default() - BigInt::from(frac.len());
    Ok((rest, Literal::Decimal { mantissa, exponent }))
}

fn signed_digits(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    recognize(pair(opt(alt((char('+'), char('-')))), digit1))(input)
}

fn int_from_digits(literal: &str) -> BigInt {
    let digits = literal.strip_prefix('+').unwrap_or(literal);
    BigInt::from_str_radix(digits, 10).unwrap_or_default()
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, VerboseError<&'a str>>
where
    F: FnMut(&'a str) -> IResult<&'a str, O, VerboseError<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}
