use momenta::prelude::*;

fn main() -> Result<()> {
    // 2x -> y at k1, y -> 2x at k2
    let mut network = ReactionNetwork::new(["x", "y"], ["k1", "k2"])?;
    let forward = network.mass_action("k1", &[2, 0])?;
    network.add_reaction(&[-2, 1], forward)?;
    let backward = network.mass_action("k2", &[0, 1])?;
    network.add_reaction(&[2, -1], backward)?;

    let system = raw_moment_equations(&network, 2)?;
    println!("raw moment equations:\n{}", pretty_system(&system));
    println!(
        "moments needing closure: {:?}",
        system
            .unclosed()
            .iter()
            .map(raw_moment_symbol)
            .collect::<Vec<_>>()
    );

    let closed = system.close(&DerivativeMatching)?;
    println!("\nderivative-matching closure:\n{}", pretty_system(&closed));
    Ok(())
}
