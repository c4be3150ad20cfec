use momenta::{
    DerivativeMatching, Expr, LogNormalClosure, MomentClosure, MomentError, MomentIndex,
    NormalClosure, ReactionNetwork, ZeroClosure, parse_expr, raw_moment_equations,
    raw_moment_symbol, simplify_fully,
};

fn canonical(input: &str) -> Expr {
    simplify_fully(parse_expr(input).expect("parse input"))
}

/// Pair annihilation: ∅ -> x at k1, 2x -> ∅ at k2·x².
fn pair_annihilation() -> ReactionNetwork {
    let mut network = ReactionNetwork::new(["x"], ["k1", "k2"]).expect("network");
    network
        .add_reaction(&[1], parse_expr("k1").unwrap())
        .unwrap();
    network
        .add_reaction(&[-2], parse_expr("k2*x^2").unwrap())
        .unwrap();
    network
}

/// Dimerisation: 2x -> y at k1·x², y -> 2x at k2·y.
fn dimerisation() -> ReactionNetwork {
    let mut network = ReactionNetwork::new(["x", "y"], ["k1", "k2"]).expect("network");
    network
        .add_reaction(&[-2, 1], parse_expr("k1*x^2").unwrap())
        .unwrap();
    network
        .add_reaction(&[2, -1], parse_expr("k2*y").unwrap())
        .unwrap();
    network
}

#[test]
fn zero_closure_third_moment() {
    let system = raw_moment_equations(&pair_annihilation(), 2).unwrap();
    let closed = ZeroClosure
        .close_moment(&MomentIndex::new(vec![3]), &system)
        .unwrap();
    assert_eq!(closed, canonical("3*M_1*M_2 - 2*M_1^3"));
}

#[test]
fn normal_closure_matches_zero_closure_at_third_order() {
    // The third central moment of a normal is zero, so both closures agree.
    let system = raw_moment_equations(&pair_annihilation(), 2).unwrap();
    let index = MomentIndex::new(vec![3]);
    assert_eq!(
        NormalClosure.close_moment(&index, &system).unwrap(),
        ZeroClosure.close_moment(&index, &system).unwrap()
    );
}

#[test]
fn normal_and_zero_closures_differ_at_fourth_order() {
    let system = raw_moment_equations(&pair_annihilation(), 2).unwrap();
    let index = MomentIndex::new(vec![4]);

    let zero = ZeroClosure.close_moment(&index, &system).unwrap();
    assert_eq!(zero, canonical("6*M_1^2*M_2 - 5*M_1^4"));

    // Isserlis adds the 3·C₂² pairing term.
    let normal = NormalClosure.close_moment(&index, &system).unwrap();
    assert_eq!(normal, canonical("3*M_2^2 - 2*M_1^4"));

    assert_ne!(zero, normal);
}

#[test]
fn derivative_matching_third_moment() {
    let system = raw_moment_equations(&pair_annihilation(), 2).unwrap();
    let closed = DerivativeMatching
        .close_moment(&MomentIndex::new(vec![3]), &system)
        .unwrap();
    assert_eq!(closed, canonical("M_2^3*M_1^-3"));
}

#[test]
fn log_normal_third_moment() {
    let system = raw_moment_equations(&pair_annihilation(), 2).unwrap();
    let closed = LogNormalClosure
        .close_moment(&MomentIndex::new(vec![3]), &system)
        .unwrap();
    assert_eq!(closed, canonical("exp(3*log(M_2) - 3*log(M_1))"));
}

#[test]
fn derivative_matching_mixed_moment() {
    // E[x²y] ≈ M_2_0·M_1_1²/(M_1_0²·M_0_1).
    let system = raw_moment_equations(&dimerisation(), 2).unwrap();
    let closed = DerivativeMatching
        .close_moment(&MomentIndex::new(vec![2, 1]), &system)
        .unwrap();
    assert_eq!(
        closed,
        canonical("M_2_0 * M_1_1^2 * M_1_0^-2 * M_0_1^-1")
    );
}

#[test]
fn log_normal_mixed_moment() {
    let system = raw_moment_equations(&dimerisation(), 2).unwrap();
    let closed = LogNormalClosure
        .close_moment(&MomentIndex::new(vec![2, 1]), &system)
        .unwrap();
    assert_eq!(
        closed,
        canonical("exp(log(M_2_0) + 2*log(M_1_1) - 2*log(M_1_0) - log(M_0_1))")
    );
}

#[test]
fn mean_field_closure_at_order_one() {
    let system = raw_moment_equations(&pair_annihilation(), 1).unwrap();
    assert_eq!(system.unclosed(), &[MomentIndex::new(vec![2])]);

    let closed = system.close(&ZeroClosure).unwrap();
    assert!(closed.is_closed());
    let mean = closed.equation("M_1").unwrap();
    assert_eq!(mean.rhs, canonical("k1 - 2*k2*M_1^2"));
}

#[test]
fn closing_substitutes_into_every_equation() {
    let system = raw_moment_equations(&pair_annihilation(), 2).unwrap();
    let closed = system.close(&ZeroClosure).unwrap();
    assert!(closed.is_closed());

    let second = closed.equation("M_2").unwrap();
    // M_3 -> 3·M_1·M_2 - 2·M_1³ inside k1 + 2·k1·M_1 + 4·k2·M_2 - 4·k2·M_3.
    assert_eq!(
        second.rhs,
        canonical("k1 + 2*k1*M_1 + 4*k2*M_2 - 12*k2*M_1*M_2 + 8*k2*M_1^3")
    );
}

#[test]
fn multivariate_closure_stays_within_tracked_moments() {
    let system = raw_moment_equations(&dimerisation(), 2).unwrap();
    assert_eq!(
        system.unclosed(),
        &[MomentIndex::new(vec![2, 1]), MomentIndex::new(vec![3, 0])]
    );

    for closure in [&ZeroClosure as &dyn MomentClosure, &NormalClosure] {
        let closed = system.close(closure).unwrap();
        assert!(closed.is_closed());
        let tracked: Vec<String> = system
            .equations()
            .iter()
            .map(|eq| eq.symbol.clone())
            .collect();
        for eq in closed.equations() {
            for name in eq.rhs.free_variables() {
                assert!(
                    tracked.contains(&name) || system.parameters().contains(&name),
                    "unexpected symbol {name} after {} closure",
                    closure.name()
                );
            }
        }
    }
}

#[test]
fn normal_closure_needs_second_order() {
    let system = raw_moment_equations(&pair_annihilation(), 1).unwrap();
    assert!(matches!(
        system.close(&NormalClosure),
        Err(MomentError::Unsupported(_))
    ));
    assert!(matches!(
        system.close(&LogNormalClosure),
        Err(MomentError::Unsupported(_))
    ));
}

#[test]
fn closure_names() {
    assert_eq!(ZeroClosure.name(), "zero");
    assert_eq!(NormalClosure.name(), "normal");
    assert_eq!(LogNormalClosure.name(), "log-normal");
    assert_eq!(DerivativeMatching.name(), "derivative matching");
}

#[test]
fn closed_moment_symbols_parse_back() {
    let system = raw_moment_equations(&dimerisation(), 2).unwrap();
    for index in system.unclosed() {
        let symbol = raw_moment_symbol(index);
        assert!(parse_expr(&symbol).is_ok());
    }
}
