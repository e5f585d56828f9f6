#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level session that drives the world and its systems one player action at a time.
//!
//! A session owns the authoritative [`World`] and every system reacting to
//! it. Submitting a command applies it, hands the resulting events to the
//! systems, applies the commands they emit, and repeats until the systems
//! have nothing left to do. Every event is delivered to the registered
//! subscribers in the order the world produced it.

use thief_master_core::{BehaviourKind, Command, Direction, EnemyId, Event, LevelData};
use thief_master_system_enemy_behaviour::EnemyBehaviour;
use thief_master_world::{self as world, query, Config, World};
use tracing::trace;

/// Handle returned by [`Session::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(u32);

type Callback = Box<dyn FnMut(&Event)>;

/// Single active level session.
pub struct Session {
    world: World,
    enemy_behaviour: EnemyBehaviour,
    subscribers: Vec<(SubscriberId, Callback)>,
    next_subscriber: u32,
}

impl Session {
    /// Creates a session without a loaded level.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            world: World::with_config(config),
            enemy_behaviour: EnemyBehaviour::default(),
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Registers a callback invoked for every event the session produces.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriberId
    where
        F: FnMut(&Event) + 'static,
    {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber = self.next_subscriber.wrapping_add(1);
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a previously registered callback.
    ///
    /// Returns `false` when the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscriber, _)| *subscriber != id);
        self.subscribers.len() != before
    }

    /// Builds a fresh level from authored data.
    pub fn load_level(&mut self, level: LevelData) -> Vec<Event> {
        self.submit(Command::LoadLevel { level })
    }

    /// Rebuilds the active level from its authored data.
    pub fn restart(&mut self) -> Vec<Event> {
        self.submit(Command::RestartLevel)
    }

    /// Attempts to move the player one step and lets every enemy react.
    pub fn move_player(&mut self, direction: Direction) -> Vec<Event> {
        self.submit(Command::MovePlayer { direction })
    }

    /// Replaces the behaviour of an enemy for subsequent turns.
    pub fn assign_behaviour(&mut self, enemy: EnemyId, behaviour: BehaviourKind) -> Vec<Event> {
        self.submit(Command::AssignBehaviour { enemy, behaviour })
    }

    /// Applies a command and pumps the systems until no further commands are emitted.
    ///
    /// Enemies react one at a time: the commands of each enemy are applied
    /// before the next enemy plans. Returns every event produced along the
    /// way in emission order.
    pub fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut log = Vec::new();
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        loop {
            self.publish(&events);
            log.extend(events.iter().cloned());

            let mut commands = Vec::new();
            self.enemy_behaviour.handle(
                &events,
                query::graph(&self.world),
                &query::enemy_view(&self.world),
                query::player_position(&self.world),
                query::phase(&self.world),
                &mut commands,
            );
            if commands.is_empty() {
                break;
            }

            events.clear();
            for command in commands {
                trace!(?command, "applying system command");
                world::apply(&mut self.world, command, &mut events);
            }
        }

        log
    }

    fn publish(&mut self, events: &[Event]) {
        for event in events {
            for (_, callback) in &mut self.subscribers {
                callback(event);
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
