use num_traits::Zero;
use recsolve::{CancelToken, FactorKind, Poly, Rational, RequestError, factor_polynomial};

const LIMIT: usize = 200_000;

/// Integer coefficients, highest power first.
fn poly(coeffs: &[i64]) -> Poly {
    Poly::from_coeffs(
        coeffs
            .iter()
            .rev()
            .map(|c| Rational::from_integer((*c).into())),
    )
}

fn rational_const(num: i64) -> Rational {
    Rational::from_integer(num.into())
}

fn assert_factorization(original: Poly, constant: Rational, expected: Vec<(Poly, usize)>) {
    let input = original.to_expr("x").to_string();
    let factorization =
        factor_polynomial(&original, LIMIT, &CancelToken::new()).expect("factorization");
    assert_eq!(factorization.constant, constant, "leading constant for {input}");

    let mut expected_factors = expected;
    let mut actual: Vec<(Poly, usize)> = factorization
        .factors
        .iter()
        .map(|f| (f.poly.clone(), f.multiplicity))
        .collect();
    for list in [&mut expected_factors, &mut actual] {
        list.sort_by(|(p1, m1), (p2, m2)| {
            p1.degree()
                .cmp(&p2.degree())
                .then_with(|| p1.to_expr("x").cmp(&p2.to_expr("x")))
                .then_with(|| m1.cmp(m2))
        });
    }
    assert_eq!(actual, expected_factors, "factors for {input}");
    assert_eq!(
        factorization.expand(),
        original,
        "factorization should reconstruct {input}"
    );
}

#[test]
fn trivial_factorizations() {
    let cases: Vec<(Poly, Rational, Vec<(Poly, usize)>)> = vec![
        (poly(&[1, 0, -1]), rational_const(1), vec![(poly(&[1, -1]), 1), (poly(&[1, 1]), 1)]),
        (poly(&[1, 2, 1]), rational_const(1), vec![(poly(&[1, 1]), 2)]),
        (poly(&[1, -3, 0]), rational_const(1), vec![(poly(&[1, 0]), 1), (poly(&[1, -3]), 1)]),
        (
            poly(&[1, 0, -1, 0]),
            rational_const(1),
            vec![(poly(&[1, 0]), 1), (poly(&[1, -1]), 1), (poly(&[1, 1]), 1)],
        ),
        (poly(&[2, 0, 0]), rational_const(2), vec![(poly(&[1, 0]), 2)]),
        (poly(&[1, 0]), rational_const(1), vec![(poly(&[1, 0]), 1)]),
        (poly(&[5]), rational_const(5), vec![]),
        (poly(&[0]), Rational::zero(), vec![]),
        (
            poly(&[1, 1, -1, -1]),
            rational_const(1),
            vec![(poly(&[1, 1]), 2), (poly(&[1, -1]), 1)],
        ),
        (
            poly(&[1, -4, 4, 0]),
            rational_const(1),
            vec![(poly(&[1, 0]), 1), (poly(&[1, -2]), 2)],
        ),
        (
            poly(&[1, 0, -1, 0, 0]),
            rational_const(1),
            vec![(poly(&[1, 0]), 2), (poly(&[1, -1]), 1), (poly(&[1, 1]), 1)],
        ),
        (
            poly(&[1, 0, 0, -8]),
            rational_const(1),
            vec![(poly(&[1, -2]), 1), (poly(&[1, 2, 4]), 1)],
        ),
        (
            poly(&[1, 0, 0, 0, -16]),
            rational_const(1),
            vec![(poly(&[1, -2]), 1), (poly(&[1, 2]), 1), (poly(&[1, 0, 4]), 1)],
        ),
        (poly(&[1, 0, 4, 0, 4]), rational_const(1), vec![(poly(&[1, 0, 2]), 2)]),
    ];

    for (input, constant, expected) in cases {
        assert_factorization(input, constant, expected);
    }
}

#[test]
fn rational_roots_with_non_unit_leading_coefficient() {
    let factorization =
        factor_polynomial(&poly(&[4, 4, 1]), LIMIT, &CancelToken::new()).expect("factorization");
    assert_eq!(factorization.constant, rational_const(4));
    assert_eq!(factorization.factors.len(), 1);
    let factor = &factorization.factors[0];
    assert_eq!(factor.multiplicity, 2);
    assert_eq!(factor.kind, FactorKind::Linear(Rational::new((-1).into(), 2.into())));

    let factorization =
        factor_polynomial(&poly(&[6, -5, 1]), LIMIT, &CancelToken::new()).expect("factorization");
    let roots: Vec<FactorKind> = factorization.factors.iter().map(|f| f.kind.clone()).collect();
    assert!(roots.contains(&FactorKind::Linear(Rational::new(1.into(), 2.into()))));
    assert!(roots.contains(&FactorKind::Linear(Rational::new(1.into(), 3.into()))));
}

#[test]
fn quadratic_pairs_without_rational_roots() {
    // x^4 + 4 = (x^2 - 2x + 2)(x^2 + 2x + 2)
    assert_factorization(
        poly(&[1, 0, 0, 0, 4]),
        rational_const(1),
        vec![(poly(&[1, -2, 2]), 1), (poly(&[1, 2, 2]), 1)],
    );
    // x^4 - 10x^2 + 1 is irreducible over Q
    assert_factorization(
        poly(&[1, 0, -10, 0, 1]),
        rational_const(1),
        vec![(poly(&[1, 0, -10, 0, 1]), 1)],
    );
}

#[test]
fn factor_kinds_are_classified() {
    let factorization = factor_polynomial(&poly(&[1, -1, -1, 0]), LIMIT, &CancelToken::new())
        .expect("factorization");
    let kinds: Vec<FactorKind> = factorization.factors.iter().map(|f| f.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            FactorKind::ZeroRoot,
            FactorKind::Quadratic {
                b: rational_const(-1),
                c: rational_const(-1),
            },
        ]
    );
    assert!(factorization.is_fully_split());

    let cubic = factor_polynomial(&poly(&[1, 0, 0, -2]), LIMIT, &CancelToken::new())
        .expect("factorization");
    assert_eq!(cubic.factors.len(), 1);
    assert_eq!(cubic.factors[0].kind, FactorKind::Irreducible);
    assert!(!cubic.is_fully_split());
}

#[test]
fn exhausted_search_is_undecided() {
    let factorization =
        factor_polynomial(&poly(&[1, 0, 0, 0, 4]), 1, &CancelToken::new()).expect("factorization");
    assert_eq!(factorization.factors.len(), 1);
    assert_eq!(factorization.factors[0].kind, FactorKind::Undecided);
    assert_eq!(factorization.expand(), poly(&[1, 0, 0, 0, 4]));
}

#[test]
fn cancelled_token_stops_factoring() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = factor_polynomial(&poly(&[1, 0, -1]), LIMIT, &cancel);
    assert_eq!(result, Err(RequestError::Cancelled));
}
