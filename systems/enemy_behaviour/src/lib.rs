#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic enemy behaviour system that reacts to player moves.
//!
//! Each enemy runs exactly one [`BehaviourKind`] per turn. Enemies act one at
//! a time in spawn order: every call to [`EnemyBehaviour::handle`] plans the
//! next enemy against the views it is handed, so the caller applies those
//! commands before the following enemy looks at the board.

use std::collections::VecDeque;

use thief_master_core::{BehaviourKind, Command, Direction, EnemyId, Event, LevelPhase, Position};
use thief_master_world::{query::EnemyView, Enemy, Graph};
use tracing::debug;

/// Pure system that turns player moves into enemy commands.
#[derive(Debug, Default)]
pub struct EnemyBehaviour {
    pending: VecDeque<EnemyId>,
}

impl EnemyBehaviour {
    /// Consumes world events and immutable views to emit enemy commands.
    ///
    /// A player move queues every enemy in spawn order. Each call then emits
    /// the commands of the next queued enemy that has something to do, or
    /// nothing once the queue drains. Queued enemies are dropped when the
    /// level is no longer being played or the graph or player is missing.
    pub fn handle(
        &mut self,
        events: &[Event],
        graph: Option<&Graph>,
        enemies: &EnemyView,
        player: Option<Position>,
        phase: Option<LevelPhase>,
        out: &mut Vec<Command>,
    ) {
        if events
            .iter()
            .any(|event| matches!(event, Event::LevelLoaded { .. }))
        {
            self.pending.clear();
        }

        let (Some(LevelPhase::Playing), Some(graph), Some(player)) = (phase, graph, player) else {
            self.pending.clear();
            return;
        };

        if events
            .iter()
            .any(|event| matches!(event, Event::PlayerMoved { .. }))
        {
            self.pending = enemies.iter().map(Enemy::id).collect();
        }

        while let Some(id) = self.pending.pop_front() {
            let Some(enemy) = enemies.iter().find(|enemy| enemy.id() == id) else {
                continue;
            };
            let planned = out.len();
            plan_turn(enemy, graph, player, out);
            if out.len() > planned {
                return;
            }
        }
    }

    /// Reports whether enemies are still waiting to act this turn.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Plans a single enemy's reaction to the player standing on `player`.
pub fn plan_turn(enemy: &Enemy, graph: &Graph, player: Position, out: &mut Vec<Command>) {
    match enemy.behaviour() {
        BehaviourKind::Stationary => {
            let _ = try_catch_player(enemy, graph, player, out);
        }
        BehaviourKind::Patrol => patrol(enemy, graph, out),
        BehaviourKind::MovingTarget => {
            if !enemy.sees(graph, player) {
                debug!(
                    enemy = enemy.id().get(),
                    "target lost, switching to stationary"
                );
                out.push(Command::AssignBehaviour {
                    enemy: enemy.id(),
                    behaviour: BehaviourKind::Stationary,
                });
                return;
            }
            let _ = try_catch_player(enemy, graph, player, out);
        }
    }
}

/// Steps the enemy onto the player when the player is in its vision.
///
/// Returns `true` when the planned step lands on the player's node. Nothing
/// is emitted when the player is out of sight.
pub fn try_catch_player(
    enemy: &Enemy,
    graph: &Graph,
    player: Position,
    out: &mut Vec<Command>,
) -> bool {
    if !enemy.sees(graph, player) {
        return false;
    }

    let target = enemy.node() + (player - enemy.node());
    let Some(direction) = Direction::between(enemy.node(), target) else {
        return false;
    };
    if !graph.can_move_from_to(enemy.node(), target) {
        return false;
    }

    debug!(enemy = enemy.id().get(), at = %target, "player spotted");
    out.push(Command::StepEnemy {
        enemy: enemy.id(),
        direction,
    });
    target == player
}

fn patrol(enemy: &Enemy, graph: &Graph, out: &mut Vec<Command>) {
    let node = enemy.node();
    let forward = enemy.facing();
    if graph.can_move_from_to(node, node.step(forward)) {
        out.push(Command::StepEnemy {
            enemy: enemy.id(),
            direction: forward,
        });
        return;
    }

    let reversed = forward.reversed();
    out.push(Command::TurnEnemy {
        enemy: enemy.id(),
        facing: reversed,
    });
    if graph.can_move_from_to(node, node.step(reversed)) {
        out.push(Command::StepEnemy {
            enemy: enemy.id(),
            direction: reversed,
        });
    } else {
        debug!(enemy = enemy.id().get(), %node, "patrol boxed in");
    }
}
