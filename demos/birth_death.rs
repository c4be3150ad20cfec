use momenta::prelude::*;

fn main() -> Result<()> {
    let mut network = ReactionNetwork::new(["x"], ["k1", "k2"])?;
    network.add_reaction(&[1], parse_expr("k1")?)?;
    network.add_reaction(&[-1], parse_expr("k2*x")?)?;

    let system = raw_moment_equations(&network, 2)?;
    println!("raw moment equations:\n{}", pretty_system(&system));

    let closed = system.close(&NormalClosure)?;
    println!("normal closure:\n{}", pretty_system(&closed));
    Ok(())
}
