use num_bigint::BigInt;
use recsolve::{
    CancelToken, ClosedForm, CoeffOps, Component, NoClosedFormReason, Polynomial, Rational,
    RecurrenceSpec, RequestError, SolveOutcome, SolverOptions, Surd, latex, solve_recurrence,
};

fn int(n: i64) -> Rational {
    Rational::from_integer(n.into())
}

fn spec(coefficients: &[Rational], initial: &[Rational]) -> RecurrenceSpec {
    RecurrenceSpec::new(coefficients.len(), coefficients.to_vec(), initial.to_vec())
        .expect("valid spec")
}

fn int_spec(coefficients: &[i64], initial: &[i64]) -> RecurrenceSpec {
    let coefficients: Vec<Rational> = coefficients.iter().map(|c| int(*c)).collect();
    let initial: Vec<Rational> = initial.iter().map(|c| int(*c)).collect();
    spec(&coefficients, &initial)
}

fn solve(spec: &RecurrenceSpec) -> SolveOutcome {
    solve_recurrence(spec, &SolverOptions::default(), &CancelToken::new()).expect("solver ran")
}

fn solved(spec: &RecurrenceSpec) -> ClosedForm {
    match solve(spec) {
        SolveOutcome::Solved(closed) => closed,
        SolveOutcome::NoClosedForm(reason) => panic!("no closed form for {spec}: {reason}"),
    }
}

fn assert_matches_sequence(spec: &RecurrenceSpec, closed: &ClosedForm, count: usize) {
    for (n, expected) in spec.terms().take(count).enumerate() {
        assert_eq!(closed.evaluate(n as u64), Some(expected), "term {n} of {spec}");
    }
}

#[test]
fn powers_of_two() {
    let spec = int_spec(&[2], &[1]);
    let closed = solved(&spec);
    assert_eq!(closed.to_string(), "f(n) = 2^n");
    assert_eq!(latex(&closed.to_expr()), "2^{n}");
    assert_matches_sequence(&spec, &closed, 20);
}

#[test]
fn fibonacci_has_binet_form() {
    let spec = int_spec(&[1, 1], &[0, 1]);
    let closed = solved(&spec);
    assert_eq!(closed.components().len(), 2);
    for component in closed.components() {
        assert_eq!(component.root.radicand(), &BigInt::from(5));
    }
    assert_eq!(
        closed.to_string(),
        "f(n) = 1/5*sqrt(5)*(1/2 + 1/2*sqrt(5))^n - 1/5*sqrt(5)*(1/2 - 1/2*sqrt(5))^n"
    );
    assert_eq!(closed.evaluate(50), Some(int(12_586_269_025)));
    assert_matches_sequence(&spec, &closed, 40);
}

#[test]
fn repeated_root_gets_polynomial_coefficient() {
    // f(n) = 4f(n-1) - 4f(n-2) = (n + 1) 2^n
    let spec = int_spec(&[4, -4], &[1, 4]);
    let closed = solved(&spec);
    assert_eq!(closed.components().len(), 1);
    assert_eq!(closed.to_string(), "f(n) = (1 + n)*2^n");
    assert_matches_sequence(&spec, &closed, 25);
}

#[test]
fn distinct_rational_roots() {
    // 2^n - 1
    let spec = int_spec(&[3, -2], &[0, 1]);
    let closed = solved(&spec);
    assert_eq!(closed.components().len(), 2);
    assert_matches_sequence(&spec, &closed, 25);
}

#[test]
fn complex_roots_still_give_rational_terms() {
    // 1, 0, -1, 0, 1, ...
    let spec = int_spec(&[0, -1], &[1, 0]);
    let closed = solved(&spec);
    assert_eq!(closed.components().len(), 2);
    assert!(closed.components().iter().all(|c| c.root.radicand() == &BigInt::from(-1)));
    assert_matches_sequence(&spec, &closed, 16);

    // f(n) = f(n-1) - f(n-2): roots are primitive sixth roots of unity
    let spec = int_spec(&[1, -1], &[1, 1]);
    let closed = solved(&spec);
    assert_matches_sequence(&spec, &closed, 30);
}

#[test]
fn mixed_linear_and_quadratic_factors() {
    // (x - 3)(x^2 - x - 1) = x^3 - 4x^2 + 2x + 3
    let spec = int_spec(&[4, -2, -3], &[1, 0, 2]);
    let closed = solved(&spec);
    assert_eq!(closed.components().len(), 3);
    assert_matches_sequence(&spec, &closed, 30);
}

#[test]
fn rational_coefficients_and_values() {
    let spec = spec(
        &[Rational::new(1.into(), 2.into())],
        &[int(3)],
    );
    let closed = solved(&spec);
    assert_eq!(closed.to_string(), "f(n) = 3*(1/2)^n");
    assert_matches_sequence(&spec, &closed, 12);
}

#[test]
fn zero_sequence_closes_to_zero() {
    let spec = int_spec(&[1, 1], &[0, 0]);
    let closed = solved(&spec);
    assert!(closed.components().is_empty());
    assert_eq!(closed.to_string(), "f(n) = 0");
}

#[test]
fn irreducible_cubic_has_no_closed_form() {
    let spec = int_spec(&[1, 1, 1], &[0, 0, 1]);
    assert_eq!(
        solve(&spec),
        SolveOutcome::NoClosedForm(NoClosedFormReason::IrreducibleFactor { degree: 3 })
    );
}

#[test]
fn irreducible_factor_is_fine_when_its_component_vanishes() {
    // (x - 2)(x^3 - x - 1): start on the pure 2^n solution
    let spec = int_spec(&[2, 1, -1, -2], &[1, 2, 4, 8]);
    let closed = solved(&spec);
    assert_eq!(closed.components().len(), 1);
    assert_eq!(closed.to_string(), "f(n) = 2^n");
}

#[test]
fn trailing_zero_coefficient_with_inconsistent_start() {
    // f(n) = f(n-1) + 0*f(n-2) ignores f(0)
    let spec = int_spec(&[1, 0], &[1, 2]);
    assert_eq!(
        solve(&spec),
        SolveOutcome::NoClosedForm(NoClosedFormReason::DegenerateInitialValues { zero_roots: 1 })
    );

    let spec = int_spec(&[1, 0], &[2, 2]);
    let closed = solved(&spec);
    assert_eq!(closed.to_string(), "f(n) = 2");
}

#[test]
fn exhausted_factor_search_is_reported() {
    // x^4 + 4 needs the quadratic search
    let spec = int_spec(&[0, 0, 0, -4], &[1, 0, 0, 0]);
    let options = SolverOptions {
        factor_search_limit: 1,
        ..SolverOptions::default()
    };
    let outcome = solve_recurrence(&spec, &options, &CancelToken::new()).unwrap();
    assert_eq!(
        outcome,
        SolveOutcome::NoClosedForm(NoClosedFormReason::SearchExhausted { degree: 4 })
    );

    let closed = solved(&spec);
    assert_eq!(closed.components().len(), 4);
    assert_matches_sequence(&spec, &closed, 24);
}

#[test]
fn solving_is_idempotent() {
    let spec = int_spec(&[1, 1], &[0, 1]);
    assert_eq!(solve(&spec), solve(&spec));
    let spec = int_spec(&[1, 1, 1], &[0, 0, 1]);
    assert_eq!(solve(&spec), solve(&spec));
}

#[test]
fn index_symbol_is_configurable() {
    let options = SolverOptions {
        index_symbol: "k".to_string(),
        ..SolverOptions::default()
    };
    let outcome = solve_recurrence(&int_spec(&[3], &[2]), &options, &CancelToken::new()).unwrap();
    let SolveOutcome::Solved(closed) = outcome else {
        panic!("expected a closed form");
    };
    assert_eq!(closed.to_string(), "f(k) = 2*3^k");
}

#[test]
fn cancelled_before_start() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = solve_recurrence(&int_spec(&[1, 1], &[0, 1]), &SolverOptions::default(), &cancel);
    assert_eq!(result, Err(RequestError::Cancelled));
}

#[test]
fn verification_rejects_a_wrong_closed_form() {
    let spec = int_spec(&[3], &[1]);
    let wrong = ClosedForm::new(
        "n",
        vec![Component {
            root: Surd::from_rational(int(2)),
            coefficients: Polynomial::from_coeffs([Surd::one()]),
        }],
    );
    assert_eq!(
        wrong.verify(&spec, 5),
        Err(RequestError::SolverFailure(
            "closed form disagrees with the recurrence at f(1)".to_string()
        ))
    );
}
