use momenta::{
    Expr, MomentError, MomentIndex, ReactionNetwork, moment_indices, parse_expr, pretty_system,
    raw_moment_equations, raw_moment_symbol, simplify_fully,
};

fn canonical(input: &str) -> Expr {
    simplify_fully(parse_expr(input).expect("parse input"))
}

fn propensity(input: &str) -> Expr {
    parse_expr(input).expect("parse propensity")
}

/// Birth-death: ∅ -> x at k1, x -> ∅ at k2·x.
fn birth_death() -> ReactionNetwork {
    let mut network = ReactionNetwork::new(["x"], ["k1", "k2"]).expect("network");
    network.add_reaction(&[1], propensity("k1")).unwrap();
    network.add_reaction(&[-1], propensity("k2*x")).unwrap();
    network
}

/// Pair annihilation: ∅ -> x at k1, 2x -> ∅ at k2·x².
fn pair_annihilation() -> ReactionNetwork {
    let mut network = ReactionNetwork::new(["x"], ["k1", "k2"]).expect("network");
    network.add_reaction(&[1], propensity("k1")).unwrap();
    network.add_reaction(&[-2], propensity("k2*x^2")).unwrap();
    network
}

#[test]
fn index_enumeration_is_graded() {
    let indices = moment_indices(2, 2);
    let expected: Vec<MomentIndex> = vec![
        MomentIndex::new(vec![1, 0]),
        MomentIndex::new(vec![0, 1]),
        MomentIndex::new(vec![2, 0]),
        MomentIndex::new(vec![1, 1]),
        MomentIndex::new(vec![0, 2]),
    ];
    assert_eq!(indices, expected);
}

#[test]
fn no_species_means_no_indices() {
    assert!(moment_indices(0, 3).is_empty());
}

#[test]
fn moment_symbols_are_functions_of_the_index() {
    assert_eq!(raw_moment_symbol(&MomentIndex::new(vec![1])), "M_1");
    assert_eq!(raw_moment_symbol(&MomentIndex::new(vec![2, 1])), "M_2_1");
    assert_eq!(raw_moment_symbol(&MomentIndex::new(vec![0, 0, 3])), "M_0_0_3");
}

#[test]
fn birth_death_raw_equations() {
    let system = raw_moment_equations(&birth_death(), 2).expect("moment equations");
    assert_eq!(system.equations().len(), 2);

    let mean = system.equation("M_1").expect("mean equation");
    assert_eq!(mean.rhs, canonical("k1 - k2*M_1"));

    let second = system.equation("M_2").expect("second moment equation");
    assert_eq!(
        second.rhs,
        canonical("k1 + 2*k1*M_1 + k2*M_1 - 2*k2*M_2")
    );

    // Linear propensities close on their own.
    assert!(system.is_closed());
}

#[test]
fn nonlinear_propensity_leaves_higher_moments_open() {
    let system = raw_moment_equations(&pair_annihilation(), 2).expect("moment equations");
    let mean = system.equation("M_1").expect("mean equation");
    assert_eq!(mean.rhs, canonical("k1 - 2*k2*M_2"));

    let second = system.equation("M_2").expect("second moment equation");
    assert_eq!(
        second.rhs,
        canonical("k1 + 2*k1*M_1 + 4*k2*M_2 - 4*k2*M_3")
    );

    assert!(!system.is_closed());
    assert_eq!(system.unclosed(), &[MomentIndex::new(vec![3])]);
}

#[test]
fn jacobian_of_linear_system() {
    let system = raw_moment_equations(&birth_death(), 1).expect("moment equations");
    let jacobian = system.jacobian();
    assert_eq!(jacobian.len(), 1);
    assert_eq!(simplify_fully(jacobian[0][0].clone()), canonical("-k2"));
}

#[test]
fn non_polynomial_propensity_is_reported() {
    let mut network = ReactionNetwork::new(["x"], ["k"]).expect("network");
    network.add_reaction(&[1], propensity("k/(x+1)")).unwrap();
    let err = raw_moment_equations(&network, 1).unwrap_err();
    assert!(matches!(err, MomentError::NonPolynomial { species, .. } if species == "x"));
}

#[test]
fn zero_truncation_order_is_rejected() {
    let err = raw_moment_equations(&birth_death(), 0).unwrap_err();
    assert!(matches!(err, MomentError::Unsupported(_)));
}

#[test]
fn mass_action_propensities() {
    let network = ReactionNetwork::new(["x", "y"], ["k1"]).expect("network");
    let propensity = network.mass_action("k1", &[2, 1]).expect("mass action");
    assert_eq!(propensity, canonical("k1*x^2*y"));
}

#[test]
fn network_validation() {
    assert!(matches!(
        ReactionNetwork::new(["x", "x"], ["k"]),
        Err(MomentError::Shape(_))
    ));
    assert!(matches!(
        ReactionNetwork::new(Vec::<&str>::new(), ["k"]),
        Err(MomentError::Shape(_))
    ));

    let mut network = ReactionNetwork::new(["x"], ["k"]).expect("network");
    assert!(matches!(
        network.add_reaction(&[1, 1], propensity("k")),
        Err(MomentError::Shape(_))
    ));
    assert!(matches!(
        network.add_reaction(&[1], propensity("k*z")),
        Err(MomentError::Shape(_))
    ));
    assert!(matches!(
        network.mass_action("missing", &[1]),
        Err(MomentError::Shape(_))
    ));
}

#[test]
fn pretty_system_lists_one_line_per_moment() {
    let system = raw_moment_equations(&birth_death(), 2).expect("moment equations");
    let rendered = pretty_system(&system);
    assert!(rendered.contains("dM_1/dt = "));
    assert!(rendered.contains("dM_2/dt = "));
    assert_eq!(rendered.lines().count(), 2);
}
