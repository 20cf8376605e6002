//! Atom interpretation: binds atomic propositions to world state.
//!
//! Atoms are open-world predicates over a partial domain model. A name
//! that does not parse, names an unknown predicate, or refers outside the
//! grid is simply false; interpretation never fails.
//!
//! Recognized grammars for `GridInterpreter`:
//! - `cell_free(x,y)`, `cell_occupied(x,y)`, `cell_unknown(x,y)`
//! - `agent_at(agent,x,y)`: the agent's pose lies in grid cell (x, y)
//! - `goal_is(agent,label)`, `has_goal(agent)`

use crate::agent::AgentId;
use crate::world::{CellState, World};

/// Domain binding from (world, atom name) to a truth value.
pub trait AtomInterpreter {
    fn interpret(&self, world: &World, atom: &str) -> bool;
}

impl<F> AtomInterpreter for F
where
    F: Fn(&World, &str) -> bool,
{
    fn interpret(&self, world: &World, atom: &str) -> bool {
        self(world, atom)
    }
}

/// Interpreter for the occupancy-grid, pose and goal predicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridInterpreter;

impl AtomInterpreter for GridInterpreter {
    fn interpret(&self, world: &World, atom: &str) -> bool {
        let Some((predicate, args)) = parse_call(atom) else {
            return false;
        };

        match (predicate, args.as_slice()) {
            ("cell_free", [x, y]) => cell_is(world, x, y, CellState::Free),
            ("cell_occupied", [x, y]) => cell_is(world, x, y, CellState::Occupied),
            ("cell_unknown", [x, y]) => cell_is(world, x, y, CellState::Unknown),
            ("agent_at", [agent, x, y]) => agent_at(world, agent, x, y),
            ("goal_is", [agent, label]) => world
                .goals
                .get(&AgentId::new(agent))
                .map_or(false, |goal| goal == label),
            ("has_goal", [agent]) => world.goals.contains_key(&AgentId::new(agent)),
            _ => false,
        }
    }
}

/// Splits `name(a,b,...)` into the predicate name and trimmed arguments.
pub fn parse_call(atom: &str) -> Option<(&str, Vec<&str>)> {
    let open = atom.find('(')?;
    let body = atom[open + 1..].strip_suffix(')')?;
    let predicate = atom[..open].trim();
    if predicate.is_empty() || body.contains('(') || body.contains(')') {
        return None;
    }
    let args: Vec<&str> = body.split(',').map(str::trim).collect();
    if args.iter().any(|a| a.is_empty()) {
        return None;
    }
    Some((predicate, args))
}

fn cell_is(world: &World, x: &str, y: &str, expected: CellState) -> bool {
    match (x.parse::<i64>(), y.parse::<i64>()) {
        (Ok(x), Ok(y)) => world.map.at(x, y) == Some(expected),
        _ => false,
    }
}

fn agent_at(world: &World, agent: &str, x: &str, y: &str) -> bool {
    let (Ok(x), Ok(y)) = (x.parse::<i64>(), y.parse::<i64>()) else {
        return false;
    };
    world
        .poses
        .get(&AgentId::new(agent))
        .and_then(|pose| world.map.cell_of(pose.x, pose.y))
        .map_or(false, |cell| cell == (x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{GridMap, Pose, WorldId};
    use std::sync::Arc;

    fn world() -> World {
        let mut map = GridMap::filled(5, 4, 0.5, CellState::Free);
        map.set(3, 2, CellState::Occupied);
        map.set(0, 0, CellState::Unknown);
        World::new(WorldId(0), Arc::new(map))
            .with_pose("r1", Pose::new(1.2, 0.7, 0.0))
            .with_goal("r1", "dock")
    }

    #[test]
    fn test_cell_predicates() {
        let w = world();
        let interp = GridInterpreter;

        assert!(interp.interpret(&w, "cell_free(1,1)"));
        assert!(interp.interpret(&w, "cell_free( 4 , 3 )"));
        assert!(!interp.interpret(&w, "cell_free(3,2)"));
        assert!(interp.interpret(&w, "cell_occupied(3,2)"));
        assert!(interp.interpret(&w, "cell_unknown(0,0)"));
    }

    #[test]
    fn test_out_of_grid_is_false() {
        let w = world();
        let interp = GridInterpreter;

        assert!(!interp.interpret(&w, "cell_free(5,0)"));
        assert!(!interp.interpret(&w, "cell_free(0,4)"));
        assert!(!interp.interpret(&w, "cell_free(-1,0)"));
    }

    #[test]
    fn test_malformed_atoms_are_false() {
        let w = world();
        let interp = GridInterpreter;

        for atom in [
            "cell_free",
            "cell_free(1)",
            "cell_free(1,2",
            "cell_free(a,b)",
            "cell_free(1,,2)",
            "cell_free(1,2,3)",
            "cell_freeish(1,1)",
            "(1,1)",
            "lidar_bin_3",
            "",
        ] {
            assert!(!interp.interpret(&w, atom), "{atom} should be false");
        }
    }

    #[test]
    fn test_agent_and_goal_predicates() {
        let w = world();
        let interp = GridInterpreter;

        // pose (1.2, 0.7) at 0.5 m/cell is cell (2, 1)
        assert!(interp.interpret(&w, "agent_at(r1,2,1)"));
        assert!(!interp.interpret(&w, "agent_at(r1,1,1)"));
        assert!(!interp.interpret(&w, "agent_at(r2,2,1)"));
        assert!(interp.interpret(&w, "goal_is(r1,dock)"));
        assert!(!interp.interpret(&w, "goal_is(r1,charger)"));
        assert!(interp.interpret(&w, "has_goal(r1)"));
        assert!(!interp.interpret(&w, "has_goal(r2)"));
    }

    #[test]
    fn test_closure_interpreter() {
        let w = world();
        let only_p = |_: &World, atom: &str| atom == "p";
        assert!(only_p.interpret(&w, "p"));
        assert!(!only_p.interpret(&w, "q"));
    }
}
