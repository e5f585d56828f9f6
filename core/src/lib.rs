#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Thief Master engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

use std::{
    fmt,
    ops::{Add, Sub},
};

use serde::{Deserialize, Serialize};

/// Number of moves granted to the player when a level starts.
pub const DEFAULT_MOVE_BUDGET: u32 = 10;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Builds a fresh level from authored data, discarding any previous level.
    LoadLevel {
        /// Authored node and edge records describing the level.
        level: LevelData,
    },
    /// Rebuilds the active level from its authored data.
    RestartLevel,
    /// Requests that the player advance a single step in the specified direction.
    MovePlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Rotates an enemy so that it faces the provided direction.
    TurnEnemy {
        /// Identifier of the enemy being rotated.
        enemy: EnemyId,
        /// Direction the enemy should face afterwards.
        facing: Direction,
    },
    /// Requests that an enemy advance a single hop in the specified direction.
    StepEnemy {
        /// Identifier of the enemy attempting to move.
        enemy: EnemyId,
        /// Direction of travel for the attempted hop.
        direction: Direction,
    },
    /// Replaces the behaviour an enemy runs on subsequent turns.
    AssignBehaviour {
        /// Identifier of the enemy being reassigned.
        enemy: EnemyId,
        /// Behaviour the enemy should adopt.
        behaviour: BehaviourKind,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Announces that a level was built from authored data.
    LevelLoaded {
        /// Node the player was placed on, if the level defines a start node.
        player: Option<Position>,
        /// Number of enemies spawned into the level.
        enemies: u32,
        /// Moves available to the player at the start of the level.
        remaining_moves: u32,
    },
    /// Announces that a new turn began.
    TurnStarted {
        /// Number of the turn that started.
        turn: u32,
        /// Moves remaining before the turn consumes one.
        remaining_moves: u32,
    },
    /// Announces that the active turn finished.
    TurnCompleted {
        /// Number of the turn that finished.
        turn: u32,
        /// Moves remaining after the turn consumed one.
        remaining_moves: u32,
    },
    /// Confirms that the player moved between two nodes.
    PlayerMoved {
        /// Node the player occupied before moving.
        from: Position,
        /// Node the player occupies after moving.
        to: Position,
        /// Turn during which the move happened.
        turn: u32,
    },
    /// Reports that a player move request was rejected without consuming a turn.
    MoveRejected {
        /// Direction supplied in the rejected request.
        direction: Direction,
        /// Specific reason the move failed.
        reason: MoveRejection,
    },
    /// Confirms that the player walked onto an enemy and removed it.
    EnemyEliminated {
        /// Identifier of the removed enemy.
        enemy: EnemyId,
        /// Node the enemy occupied.
        enemy_position: Position,
        /// Node the player occupies after the move.
        player_position: Position,
        /// Turn during which the elimination happened.
        turn: u32,
    },
    /// Confirms that an enemy now faces a new direction.
    EnemyTurned {
        /// Identifier of the rotated enemy.
        enemy: EnemyId,
        /// Direction the enemy faces.
        facing: Direction,
    },
    /// Confirms that an enemy moved between two nodes.
    EnemyAdvanced {
        /// Identifier of the enemy that moved.
        enemy: EnemyId,
        /// Node the enemy occupied before moving.
        from: Position,
        /// Node the enemy occupies after moving.
        to: Position,
    },
    /// Confirms that an enemy adopted a different behaviour.
    BehaviourChanged {
        /// Identifier of the reassigned enemy.
        enemy: EnemyId,
        /// Behaviour the enemy runs from now on.
        behaviour: BehaviourKind,
    },
    /// Announces that the player reached a goal node.
    LevelCompleted {
        /// Turn during which the goal was reached.
        turn: u32,
        /// Goal node the player stands on.
        at: Position,
    },
    /// Announces that the player lost the level.
    Lose {
        /// Turn during which the level was lost.
        turn: u32,
        /// Cause of the loss.
        reason: LoseReason,
        /// Node where the player was caught.
        at: Position,
    },
}

/// Integer grid coordinate identifying a node.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the position.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component of the position.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Position reached by taking one step in `direction`.
    #[must_use]
    pub fn step(self, direction: Direction) -> Self {
        self + direction.offset()
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x.wrapping_add(rhs.x), self.y.wrapping_add(rhs.y))
    }
}

impl Sub for Position {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x.wrapping_sub(rhs.x), self.y.wrapping_sub(rhs.y))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal directions available to actors.
///
/// `Up` increases `y`, matching the authoring tool's coordinate system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward increasing `y`.
    Up,
    /// Movement toward increasing `x`.
    Right,
    /// Movement toward decreasing `y`.
    Down,
    /// Movement toward decreasing `x`.
    Left,
}

impl Direction {
    /// All directions in clockwise order starting with [`Direction::Up`].
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Unit vector describing a single step in this direction.
    #[must_use]
    pub const fn offset(self) -> Position {
        match self {
            Self::Up => Position::new(0, 1),
            Self::Right => Position::new(1, 0),
            Self::Down => Position::new(0, -1),
            Self::Left => Position::new(-1, 0),
        }
    }

    /// Direction rotated by 180 degrees.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }

    /// Resolves a unit vector back into a direction.
    ///
    /// Returns `None` for the zero vector, diagonals, and any vector longer
    /// than one step.
    #[must_use]
    pub fn from_offset(offset: Position) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|direction| direction.offset() == offset)
    }

    /// Direction of the single step leading from `from` to `to`, if adjacent.
    #[must_use]
    pub fn between(from: Position, to: Position) -> Option<Self> {
        Self::from_offset(to - from)
    }
}

/// Role a node plays within a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Plain traversable node.
    #[default]
    Normal,
    /// Node the player starts the level on.
    Start,
    /// Node the player must reach to complete the level.
    Goal,
    /// Node marked as fragile by the authoring tool.
    Breakable,
    /// Node that redirects actors. Reserved for future traversal rules.
    Redirector,
    /// Node that traps actors. Reserved for future traversal rules.
    Trap,
    /// Node that spawns an enemy when the level loads.
    Enemy,
}

/// Traversal rule attached to an edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Traversable in both directions, any number of times.
    #[default]
    Standard,
    /// Traversable only from its `from` endpoint to its `to` endpoint.
    Directed,
    /// Traversable in both directions. Reserved for sliding rules.
    Slippery,
    /// Traversable in both directions until an actor crosses it once.
    Breakable,
}

impl EdgeKind {
    /// Reports whether the edge may be crossed from its `to` endpoint.
    #[must_use]
    pub const fn is_bidirectional(self) -> bool {
        !matches!(self, Self::Directed)
    }
}

/// Closed set of enemy behaviours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviourKind {
    /// Never moves; catches the player when they step into its vision.
    #[default]
    Stationary,
    /// Walks back and forth along its facing axis.
    Patrol,
    /// Chases the player while visible, then settles into [`BehaviourKind::Stationary`].
    MovingTarget,
}

impl BehaviourKind {
    /// Resolves an authored behaviour tag, falling back to [`BehaviourKind::Stationary`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Patrol" => Self::Patrol,
            "MovingTarget" => Self::MovingTarget,
            _ => Self::Stationary,
        }
    }

    /// Tag used for this behaviour in authored level data.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Stationary => "Stationary",
            Self::Patrol => "Patrol",
            Self::MovingTarget => "MovingTarget",
        }
    }

    /// Short player-facing description of the behaviour.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Stationary => "Stands guard and watches the node in front of it.",
            Self::Patrol => "Walks forward and turns around when the path ends.",
            Self::MovingTarget => "Chases the thief while in sight, then stands guard.",
        }
    }
}

/// Unique identifier assigned to an enemy in spawn order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Causes for losing a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoseReason {
    /// An enemy moved onto the player's node.
    EnemyContact,
    /// An enemy spotted the player without reaching them.
    EnemyDetection,
}

/// Reasons a player move request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// No traversable edge leads from the player's node in that direction.
    Blocked,
    /// The level was already won or lost.
    LevelOver,
    /// No level is loaded or the level has no start node.
    NoPlayer,
}

/// Progress of the active level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelPhase {
    /// The player may still move.
    Playing,
    /// The player reached a goal node.
    Won,
    /// An enemy caught the player.
    Lost,
}

/// Authored description of a level as produced by the graph editor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    /// Node records in authoring order.
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Edge records in authoring order.
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

/// Authored node record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Grid position identifying the node.
    pub position: Position,
    /// Role of the node.
    #[serde(default)]
    pub kind: NodeKind,
    /// Whether the node starts out destroyed.
    #[serde(default)]
    pub destroyed: bool,
    /// Facing direction of the enemy spawned on an enemy node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<Position>,
    /// Behaviour tag of the enemy spawned on an enemy node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behaviour: Option<String>,
}

impl NodeRecord {
    /// Creates a record for a non-enemy node.
    #[must_use]
    pub fn new(position: Position, kind: NodeKind) -> Self {
        Self {
            position,
            kind,
            destroyed: false,
            facing: None,
            behaviour: None,
        }
    }

    /// Creates a record for an enemy node with the provided facing and behaviour.
    #[must_use]
    pub fn enemy(position: Position, facing: Direction, behaviour: BehaviourKind) -> Self {
        Self {
            position,
            kind: NodeKind::Enemy,
            destroyed: false,
            facing: Some(facing.offset()),
            behaviour: Some(behaviour.tag().to_owned()),
        }
    }

    /// Facing of the spawned enemy, defaulting to [`Direction::Up`] when absent or invalid.
    #[must_use]
    pub fn facing_direction(&self) -> Direction {
        self.facing
            .and_then(Direction::from_offset)
            .unwrap_or(Direction::Up)
    }

    /// Behaviour of the spawned enemy, defaulting to [`BehaviourKind::Stationary`].
    #[must_use]
    pub fn behaviour_kind(&self) -> BehaviourKind {
        self.behaviour
            .as_deref()
            .map_or(BehaviourKind::Stationary, BehaviourKind::from_tag)
    }
}

/// Authored edge record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Endpoint the edge leaves from.
    pub from: Position,
    /// Endpoint the edge leads to.
    pub to: Position,
    /// Traversal rule applied to the edge.
    #[serde(default)]
    pub kind: EdgeKind,
    /// Whether a breakable edge starts out spent.
    #[serde(default)]
    pub used: bool,
}

impl EdgeRecord {
    /// Creates an unused edge record.
    #[must_use]
    pub const fn new(from: Position, to: Position, kind: EdgeKind) -> Self {
        Self {
            from,
            to,
            kind,
            used: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BehaviourKind, Direction, EdgeKind, EdgeRecord, LevelData, NodeKind, NodeRecord, Position,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn level_data_round_trips_through_bincode() {
        let level = LevelData {
            nodes: vec![
                NodeRecord::new(Position::new(0, 0), NodeKind::Start),
                NodeRecord::enemy(Position::new(1, 0), Direction::Left, BehaviourKind::Patrol),
            ],
            edges: vec![EdgeRecord::new(
                Position::new(0, 0),
                Position::new(1, 0),
                EdgeKind::Breakable,
            )],
        };
        assert_round_trip(&level);
    }

    #[test]
    fn reversing_twice_restores_direction() {
        for direction in Direction::ALL {
            assert_ne!(direction.reversed(), direction);
            assert_eq!(direction.reversed().reversed(), direction);
            assert_eq!(
                direction.offset() + direction.reversed().offset(),
                Position::default()
            );
        }
    }

    #[test]
    fn from_offset_rejects_non_unit_vectors() {
        assert_eq!(Direction::from_offset(Position::new(0, 1)), Some(Direction::Up));
        assert_eq!(Direction::from_offset(Position::new(0, 0)), None);
        assert_eq!(Direction::from_offset(Position::new(1, 1)), None);
        assert_eq!(Direction::from_offset(Position::new(0, 2)), None);
    }

    #[test]
    fn between_requires_adjacency() {
        let origin = Position::new(3, 3);
        assert_eq!(
            Direction::between(origin, Position::new(2, 3)),
            Some(Direction::Left)
        );
        assert_eq!(Direction::between(origin, Position::new(5, 3)), None);
    }

    #[test]
    fn unknown_behaviour_tags_fall_back_to_stationary() {
        assert_eq!(BehaviourKind::from_tag("Patrol"), BehaviourKind::Patrol);
        assert_eq!(
            BehaviourKind::from_tag("MovingTarget"),
            BehaviourKind::MovingTarget
        );
        assert_eq!(BehaviourKind::from_tag("Sleepy"), BehaviourKind::Stationary);
        assert_eq!(BehaviourKind::from_tag(""), BehaviourKind::Stationary);
    }

    #[test]
    fn node_record_defaults_invalid_facing_to_up() {
        let mut record = NodeRecord::new(Position::new(0, 0), NodeKind::Enemy);
        assert_eq!(record.facing_direction(), Direction::Up);
        assert_eq!(record.behaviour_kind(), BehaviourKind::Stationary);

        record.facing = Some(Position::new(2, 0));
        assert_eq!(record.facing_direction(), Direction::Up);

        record.facing = Some(Position::new(-1, 0));
        assert_eq!(record.facing_direction(), Direction::Left);
    }

    #[test]
    fn level_json_accepts_minimal_records() {
        let json = r#"{
            "nodes": [
                { "position": { "x": 0, "y": 0 }, "kind": "Start" },
                { "position": { "x": 1, "y": 0 } }
            ],
            "edges": [
                { "from": { "x": 0, "y": 0 }, "to": { "x": 1, "y": 0 } }
            ]
        }"#;
        let level: LevelData = serde_json::from_str(json).expect("level parses");
        assert_eq!(level.nodes[1].kind, NodeKind::Normal);
        assert!(!level.nodes[1].destroyed);
        assert_eq!(level.edges[0].kind, EdgeKind::Standard);
        assert!(!level.edges[0].used);
    }
}
