#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Thief Master.
//!
//! The world owns the traversal graph, the player, the enemies, and the turn
//! counters of the active level. It mutates them exclusively through
//! [`apply`], broadcasting events that describe every accepted change.

pub mod graph;
pub mod turns;

use thief_master_core::{
    BehaviourKind, Command, Direction, EnemyId, Event, LevelData, LevelPhase, LoseReason,
    MoveRejection, NodeKind, Position, DEFAULT_MOVE_BUDGET,
};
use tracing::{debug, info, warn};

pub use graph::{Edge, EdgeIndex, Graph, LevelWarning, Node};
pub use turns::{TurnController, TurnError, TurnSnapshot};

/// Configuration parameters required to construct the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    move_budget: u32,
}

impl Config {
    /// Creates a new configuration granting `move_budget` moves per level.
    #[must_use]
    pub const fn new(move_budget: u32) -> Self {
        Self { move_budget }
    }

    /// Moves granted to the player when a level starts or restarts.
    #[must_use]
    pub const fn move_budget(&self) -> u32 {
        self.move_budget
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_BUDGET)
    }
}

/// Enemy guarding a node of the active level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Enemy {
    id: EnemyId,
    node: Position,
    facing: Direction,
    behaviour: BehaviourKind,
}

impl Enemy {
    /// Identifier assigned to the enemy in spawn order.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Node the enemy occupies.
    #[must_use]
    pub const fn node(&self) -> Position {
        self.node
    }

    /// Direction the enemy faces.
    #[must_use]
    pub const fn facing(&self) -> Direction {
        self.facing
    }

    /// Behaviour the enemy runs each turn.
    #[must_use]
    pub const fn behaviour(&self) -> BehaviourKind {
        self.behaviour
    }

    /// Node directly in front of the enemy.
    #[must_use]
    pub fn vision_node(&self) -> Position {
        self.node.step(self.facing)
    }

    /// Reports whether the player standing on `player` is in this enemy's vision.
    ///
    /// Vision reaches exactly one hop along the facing direction and only
    /// through a traversable edge.
    #[must_use]
    pub fn sees(&self, graph: &Graph, player: Position) -> bool {
        let vision = self.vision_node();
        player == vision && graph.can_move_from_to(self.node, vision)
    }
}

#[derive(Debug)]
struct Level {
    authored: LevelData,
    graph: Graph,
    warnings: Vec<LevelWarning>,
    player: Option<Position>,
    enemies: Vec<Enemy>,
    turns: TurnController,
    phase: LevelPhase,
}

impl Level {
    fn build(authored: LevelData, turns: TurnController) -> Self {
        let (mut graph, warnings) = Graph::build(&authored.nodes, &authored.edges);
        for warning in &warnings {
            warn!(?warning, "level anomaly");
        }

        let player = graph.start_node().map(Node::id);

        let mut enemies = Vec::new();
        for record in &authored.nodes {
            let is_enemy_node = graph
                .node(record.position)
                .map_or(false, |node| node.kind() == NodeKind::Enemy);
            if !is_enemy_node {
                continue;
            }

            let id = EnemyId::new(u32::try_from(enemies.len()).unwrap_or(u32::MAX));
            enemies.push(Enemy {
                id,
                node: record.position,
                facing: record.facing_direction(),
                behaviour: record.behaviour_kind(),
            });
            graph.set_kind(record.position, NodeKind::Normal);
        }

        Self {
            authored,
            graph,
            warnings,
            player,
            enemies,
            turns,
            phase: LevelPhase::Playing,
        }
    }

    fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|enemy| enemy.id == id)
    }
}

/// Represents the authoritative Thief Master world state.
#[derive(Debug)]
pub struct World {
    config: Config,
    level: Option<Level>,
}

impl World {
    /// Creates an empty world using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty world using the provided configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            level: None,
        }
    }

    fn load(&mut self, authored: LevelData, out_events: &mut Vec<Event>) {
        let turns = TurnController::new(self.config.move_budget());
        self.install(Level::build(authored, turns), out_events);
    }

    fn restart(&mut self, out_events: &mut Vec<Event>) {
        let Some(Level {
            authored, mut turns, ..
        }) = self.level.take()
        else {
            warn!("restart requested without a loaded level");
            return;
        };
        turns.reset();
        self.install(Level::build(authored, turns), out_events);
    }

    fn install(&mut self, level: Level, out_events: &mut Vec<Event>) {
        info!(
            nodes = level.graph.nodes().count(),
            edges = level.graph.edges().len(),
            enemies = level.enemies.len(),
            "level loaded"
        );
        out_events.push(Event::LevelLoaded {
            player: level.player,
            enemies: u32::try_from(level.enemies.len()).unwrap_or(u32::MAX),
            remaining_moves: level.turns.remaining_moves(),
        });
        self.level = Some(level);
    }

    fn active_level_mut(&mut self) -> Option<&mut Level> {
        let Some(level) = self.level.as_mut() else {
            warn!("enemy command received without a loaded level");
            return None;
        };
        if level.phase != LevelPhase::Playing {
            debug!(phase = ?level.phase, "enemy command ignored after level ended");
            return None;
        }
        Some(level)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { level } => world.load(level, out_events),
        Command::RestartLevel => world.restart(out_events),
        Command::MovePlayer { direction } => move_player(world, direction, out_events),
        Command::TurnEnemy { enemy, facing } => {
            let Some(level) = world.active_level_mut() else {
                return;
            };
            let Some(actor) = level.enemy_mut(enemy) else {
                warn!(enemy = enemy.get(), "turn requested for unknown enemy");
                return;
            };
            actor.facing = facing;
            out_events.push(Event::EnemyTurned { enemy, facing });
        }
        Command::StepEnemy { enemy, direction } => step_enemy(world, enemy, direction, out_events),
        Command::AssignBehaviour { enemy, behaviour } => {
            let Some(level) = world.active_level_mut() else {
                return;
            };
            let Some(actor) = level.enemy_mut(enemy) else {
                warn!(enemy = enemy.get(), "behaviour assigned to unknown enemy");
                return;
            };
            if actor.behaviour == behaviour {
                return;
            }
            debug!(
                enemy = enemy.get(),
                from = actor.behaviour.tag(),
                to = behaviour.tag(),
                "behaviour changed"
            );
            actor.behaviour = behaviour;
            out_events.push(Event::BehaviourChanged { enemy, behaviour });
        }
    }
}

fn move_player(world: &mut World, direction: Direction, out_events: &mut Vec<Event>) {
    let reject = |reason: MoveRejection, out_events: &mut Vec<Event>| {
        debug!(?direction, ?reason, "player move rejected");
        out_events.push(Event::MoveRejected { direction, reason });
    };

    let Some(level) = world.level.as_mut() else {
        reject(MoveRejection::NoPlayer, out_events);
        return;
    };
    let Some(from) = level.player else {
        reject(MoveRejection::NoPlayer, out_events);
        return;
    };
    if level.phase != LevelPhase::Playing {
        reject(MoveRejection::LevelOver, out_events);
        return;
    }

    let to = from.step(direction);
    let Some(edge) = level.graph.traversable_edge(from, to) else {
        reject(MoveRejection::Blocked, out_events);
        return;
    };

    match level.turns.start_next_turn() {
        Ok(snapshot) => out_events.push(Event::TurnStarted {
            turn: snapshot.turn,
            remaining_moves: snapshot.remaining_moves,
        }),
        Err(error) => warn!(%error, "player moved while a turn was running"),
    }

    level.graph.mark_used(edge);
    level.player = Some(to);
    let turn = level.turns.current_turn();
    debug!(%from, %to, turn, "player moved");
    out_events.push(Event::PlayerMoved { from, to, turn });

    level.enemies.retain(|enemy| {
        if enemy.node != to {
            return true;
        }
        debug!(enemy = enemy.id.get(), at = %to, "enemy eliminated");
        out_events.push(Event::EnemyEliminated {
            enemy: enemy.id,
            enemy_position: enemy.node,
            player_position: to,
            turn,
        });
        false
    });

    // Redirector and trap nodes carry no player-side effect yet.
    if level.graph.node(to).map(Node::kind) == Some(NodeKind::Goal) {
        info!(turn, at = %to, "level completed");
        level.phase = LevelPhase::Won;
        out_events.push(Event::LevelCompleted { turn, at: to });
    }

    match level.turns.complete_turn() {
        Ok(snapshot) => out_events.push(Event::TurnCompleted {
            turn: snapshot.turn,
            remaining_moves: snapshot.remaining_moves,
        }),
        Err(error) => warn!(%error, "player move finished without a running turn"),
    }
}

fn step_enemy(world: &mut World, enemy: EnemyId, direction: Direction, out_events: &mut Vec<Event>) {
    let Some(level) = world.active_level_mut() else {
        return;
    };
    let turn = level.turns.current_turn();
    let player = level.player;
    let Some(actor) = level.enemies.iter_mut().find(|actor| actor.id == enemy) else {
        warn!(enemy = enemy.get(), "step requested for unknown enemy");
        return;
    };

    let from = actor.node;
    let to = from.step(direction);
    let Some(edge) = level.graph.traversable_edge(from, to) else {
        debug!(enemy = enemy.get(), %from, ?direction, "enemy step blocked");
        return;
    };

    level.graph.mark_used(edge);
    actor.node = to;
    out_events.push(Event::EnemyAdvanced { enemy, from, to });

    if player == Some(to) {
        info!(enemy = enemy.get(), turn, at = %to, "player caught");
        level.phase = LevelPhase::Lost;
        out_events.push(Event::Lose {
            turn,
            reason: LoseReason::EnemyContact,
            at: to,
        });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use thief_master_core::{LevelData, LevelPhase, Position};

    use super::{Config, Enemy, Graph, LevelWarning, TurnController, World};

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> Config {
        world.config
    }

    /// Traversal graph of the active level, if one is loaded.
    #[must_use]
    pub fn graph(world: &World) -> Option<&Graph> {
        world.level.as_ref().map(|level| &level.graph)
    }

    /// Authored data the active level was built from.
    #[must_use]
    pub fn authored_level(world: &World) -> Option<&LevelData> {
        world.level.as_ref().map(|level| &level.authored)
    }

    /// Node the player occupies, if a level with a start node is loaded.
    #[must_use]
    pub fn player_position(world: &World) -> Option<Position> {
        world.level.as_ref().and_then(|level| level.player)
    }

    /// Progress of the active level.
    #[must_use]
    pub fn phase(world: &World) -> Option<LevelPhase> {
        world.level.as_ref().map(|level| level.phase)
    }

    /// Turn counters of the active level.
    #[must_use]
    pub fn turns(world: &World) -> Option<&TurnController> {
        world.level.as_ref().map(|level| &level.turns)
    }

    /// Anomalies noticed while building the active level.
    #[must_use]
    pub fn level_warnings(world: &World) -> &[LevelWarning] {
        world
            .level
            .as_ref()
            .map(|level| level.warnings.as_slice())
            .unwrap_or_default()
    }

    /// Enemy occupying `position`, if any.
    #[must_use]
    pub fn enemy_at(world: &World, position: Position) -> Option<&Enemy> {
        world
            .level
            .as_ref()
            .and_then(|level| level.enemies.iter().find(|enemy| enemy.node == position))
    }

    /// Captures a read-only view of the enemies in spawn order.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let mut snapshots: Vec<Enemy> = world
            .level
            .as_ref()
            .map(|level| level.enemies.clone())
            .unwrap_or_default();
        snapshots.sort_by_key(Enemy::id);
        EnemyView { snapshots }
    }

    /// Read-only snapshot describing all enemies within the level.
    #[derive(Clone, Debug, Default)]
    pub struct EnemyView {
        snapshots: Vec<Enemy>,
    }

    impl EnemyView {
        /// Iterator over the captured enemies in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
            self.snapshots.iter()
        }

        /// Number of captured enemies.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether no enemies were captured.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<Enemy> {
            self.snapshots
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thief_master_core::{EdgeKind, EdgeRecord, NodeRecord};

    fn enemy_level() -> LevelData {
        LevelData {
            nodes: vec![
                NodeRecord::new(Position::new(0, 0), NodeKind::Start),
                NodeRecord::enemy(Position::new(1, 0), Direction::Up, BehaviourKind::Patrol),
                NodeRecord::new(Position::new(1, 1), NodeKind::Goal),
            ],
            edges: vec![
                EdgeRecord::new(Position::new(0, 0), Position::new(1, 0), EdgeKind::Standard),
                EdgeRecord::new(Position::new(1, 0), Position::new(1, 1), EdgeKind::Standard),
            ],
        }
    }

    #[test]
    fn enemy_nodes_are_consumed_on_spawn() {
        let level = Level::build(enemy_level(), TurnController::new(5));
        assert_eq!(level.enemies.len(), 1);
        assert_eq!(
            level.graph.node(Position::new(1, 0)).map(Node::kind),
            Some(NodeKind::Normal)
        );
        assert_eq!(level.enemies[0].behaviour(), BehaviourKind::Patrol);
        assert_eq!(level.enemies[0].facing(), Direction::Up);
        assert_eq!(level.player, Some(Position::new(0, 0)));
    }

    #[test]
    fn vision_is_a_single_traversable_hop() {
        let level = Level::build(enemy_level(), TurnController::new(5));
        let enemy = level.enemies[0];

        assert!(enemy.sees(&level.graph, Position::new(1, 1)));
        assert!(!enemy.sees(&level.graph, Position::new(1, 2)));
        assert!(!enemy.sees(&level.graph, Position::new(0, 0)));
        assert!(!enemy.sees(&level.graph, enemy.node()));
    }

    #[test]
    fn vision_is_blocked_without_an_edge() {
        let mut authored = enemy_level();
        authored.edges.truncate(1);
        let level = Level::build(authored, TurnController::new(5));

        assert!(!level.enemies[0].sees(&level.graph, Position::new(1, 1)));
    }
}
