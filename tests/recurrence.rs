use recsolve::{Rational, RecurrenceSpec, RequestError};

fn ints(values: &[i64]) -> Vec<Rational> {
    values.iter().map(|v| Rational::from_integer((*v).into())).collect()
}

#[test]
fn terms_follow_the_recurrence() {
    let fib = RecurrenceSpec::new(2, ints(&[1, 1]), ints(&[0, 1])).unwrap();
    let terms: Vec<Rational> = fib.terms().take(10).collect();
    assert_eq!(terms, ints(&[0, 1, 1, 2, 3, 5, 8, 13, 21, 34]));

    // f(n) = 2f(n-3)
    let skip = RecurrenceSpec::new(3, ints(&[0, 0, 2]), ints(&[1, 2, 3])).unwrap();
    let terms: Vec<Rational> = skip.terms().take(9).collect();
    assert_eq!(terms, ints(&[1, 2, 3, 2, 4, 6, 4, 8, 12]));
}

#[test]
fn characteristic_polynomial_moves_coefficients_across() {
    let spec = RecurrenceSpec::new(3, ints(&[4, -2, -3]), ints(&[1, 0, 2])).unwrap();
    assert_eq!(
        spec.characteristic_polynomial().to_expr("x").to_string(),
        "x^3 - 4*x^2 + 2*x + 3"
    );
}

#[test]
fn display_reads_like_the_recurrence() {
    let spec = RecurrenceSpec::new(3, ints(&[1, 0, -2]), ints(&[0, 0, 1])).unwrap();
    assert_eq!(spec.to_string(), "f(n) = f(n-1) - 2*f(n-3)");

    let spec = RecurrenceSpec::new(1, ints(&[-1]), ints(&[1])).unwrap();
    assert_eq!(spec.to_string(), "f(n) = -f(n-1)");

    let spec = RecurrenceSpec::new(2, ints(&[0, 0]), ints(&[1, 1])).unwrap();
    assert_eq!(spec.to_string(), "f(n) = 0");
}

#[test]
fn lengths_must_match_the_order() {
    assert_eq!(
        RecurrenceSpec::new(0, vec![], vec![]).unwrap_err(),
        RequestError::count_mismatch()
    );
    assert_eq!(
        RecurrenceSpec::new(2, ints(&[1, 1]), ints(&[1])).unwrap_err(),
        RequestError::count_mismatch()
    );
}
