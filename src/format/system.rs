use crate::format::pretty;
use crate::moment::MomentSystem;

/// Render a moment system as one `d<symbol>/dt = <rhs>` line per equation.
pub fn pretty_system(system: &MomentSystem) -> String {
    let mut out = String::new();
    for eq in system.equations() {
        out.push_str(&format!("d{}/dt = {}\n", eq.symbol, pretty(&eq.rhs)));
    }
    out
}
