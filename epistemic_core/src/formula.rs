//! Epistemic formulas.
//!
//! `Formula` is a closed sum type over the eight operators. Subformulas are
//! held behind `Arc`, so cloning a formula (or embedding one formula into
//! several larger ones) shares the tree instead of copying it.

use crate::agent::{AgentGroup, AgentId};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A multi-agent epistemic formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    /// Atomic proposition, interpreted against a world by an `AtomInterpreter`
    Atom(Arc<str>),

    /// ¬φ
    Not(Arc<Formula>),

    /// φ ∧ ψ
    And(Arc<Formula>, Arc<Formula>),

    /// φ ∨ ψ
    Or(Arc<Formula>, Arc<Formula>),

    /// φ → ψ
    Implies(Arc<Formula>, Arc<Formula>),

    /// K_a(φ): agent `a` knows φ
    Knows(AgentId, Arc<Formula>),

    /// C_G(φ): φ is common knowledge among G
    CommonKnowledge(AgentGroup, Arc<Formula>),

    /// E_G(φ): every agent in G knows φ
    EverybodyKnows(AgentGroup, Arc<Formula>),
}

impl Formula {
    pub fn atom(name: impl AsRef<str>) -> Self {
        Formula::Atom(Arc::from(name.as_ref()))
    }

    pub fn not(phi: Formula) -> Self {
        Formula::Not(Arc::new(phi))
    }

    pub fn and(left: Formula, right: Formula) -> Self {
        Formula::And(Arc::new(left), Arc::new(right))
    }

    pub fn or(left: Formula, right: Formula) -> Self {
        Formula::Or(Arc::new(left), Arc::new(right))
    }

    pub fn implies(left: Formula, right: Formula) -> Self {
        Formula::Implies(Arc::new(left), Arc::new(right))
    }

    pub fn knows(agent: impl Into<AgentId>, phi: Formula) -> Self {
        Formula::Knows(agent.into(), Arc::new(phi))
    }

    pub fn common_knowledge(group: AgentGroup, phi: Formula) -> Self {
        Formula::CommonKnowledge(group, Arc::new(phi))
    }

    pub fn everybody_knows(group: AgentGroup, phi: Formula) -> Self {
        Formula::EverybodyKnows(group, Arc::new(phi))
    }

    /// A formula true in every world.
    ///
    /// Encoded as `p → p` over a reserved atom name, so it holds under any
    /// interpretation.
    pub fn top() -> Self {
        let p = Formula::atom("⊤");
        Formula::implies(p.clone(), p)
    }

    /// Names of all atoms occurring in this formula.
    pub fn atoms(&self) -> BTreeSet<Arc<str>> {
        let mut out = BTreeSet::new();
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms(&self, out: &mut BTreeSet<Arc<str>>) {
        match self {
            Formula::Atom(name) => {
                out.insert(Arc::clone(name));
            }
            Formula::Not(phi)
            | Formula::Knows(_, phi)
            | Formula::CommonKnowledge(_, phi)
            | Formula::EverybodyKnows(_, phi) => phi.collect_atoms(out),
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Implies(l, r) => {
                l.collect_atoms(out);
                r.collect_atoms(out);
            }
        }
    }

    /// Maximum nesting of knowledge operators.
    pub fn modal_depth(&self) -> usize {
        match self {
            Formula::Atom(_) => 0,
            Formula::Not(phi) => phi.modal_depth(),
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Implies(l, r) => {
                l.modal_depth().max(r.modal_depth())
            }
            Formula::Knows(_, phi)
            | Formula::CommonKnowledge(_, phi)
            | Formula::EverybodyKnows(_, phi) => 1 + phi.modal_depth(),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, group: &AgentGroup) -> fmt::Result {
    f.write_str("{")?;
    for (i, agent) in group.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", agent)?;
    }
    f.write_str("}")
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Atom(name) => f.write_str(name),
            Formula::Not(phi) => write!(f, "¬({})", phi),
            Formula::And(l, r) => write!(f, "({} ∧ {})", l, r),
            Formula::Or(l, r) => write!(f, "({} ∨ {})", l, r),
            Formula::Implies(l, r) => write!(f, "({} → {})", l, r),
            Formula::Knows(agent, phi) => write!(f, "K_{}({})", agent, phi),
            Formula::CommonKnowledge(group, phi) => {
                f.write_str("C_")?;
                write_group(f, group)?;
                write!(f, "({})", phi)
            }
            Formula::EverybodyKnows(group, phi) => {
                f.write_str("E_")?;
                write_group(f, group)?;
                write!(f, "({})", phi)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::group;

    #[test]
    fn test_display_renders_operators() {
        let phi = Formula::implies(
            Formula::knows("r1", Formula::atom("cell_free(1,2)")),
            Formula::common_knowledge(
                group(["r2", "r1"]),
                Formula::not(Formula::atom("p")),
            ),
        );
        assert_eq!(
            phi.to_string(),
            "(K_r1(cell_free(1,2)) → C_{r1,r2}(¬(p)))"
        );

        let e = Formula::everybody_knows(group(["a"]), Formula::or(Formula::atom("p"), Formula::atom("q")));
        assert_eq!(e.to_string(), "E_{a}((p ∨ q))");
    }

    #[test]
    fn test_clone_shares_subformulas() {
        let inner = Formula::and(Formula::atom("p"), Formula::atom("q"));
        let outer = Formula::knows("r1", inner);
        let copy = outer.clone();

        match (&outer, &copy) {
            (Formula::Knows(_, a), Formula::Knows(_, b)) => assert!(Arc::ptr_eq(a, b)),
            _ => unreachable!(),
        }
        assert_eq!(outer, copy);
    }

    #[test]
    fn test_atoms_and_depth() {
        let phi = Formula::knows(
            "r1",
            Formula::everybody_knows(
                group(["r1", "r2"]),
                Formula::and(Formula::atom("p"), Formula::atom("q")),
            ),
        );
        let atoms: Vec<String> = phi.atoms().iter().map(|a| a.to_string()).collect();
        assert_eq!(atoms, vec!["p", "q"]);
        assert_eq!(phi.modal_depth(), 2);
        assert_eq!(Formula::atom("p").modal_depth(), 0);
    }
}
