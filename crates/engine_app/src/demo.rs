//! Demo systems exercising every capability and the event bus.
//!
//! - [`MovementSystem`] integrates `Velocity` into `Position` each frame and
//!   announces each step with a pooled [`Moved`] event.
//! - [`ThrustSystem`] applies [`Thrust`] inputs to velocities and counts them
//!   on the global entity.
//! - [`TrackerSystem`] follows entities carrying a `Position` and listens for
//!   [`Moved`] events.

use std::sync::Arc;

use engine_component::{Component, ComponentSet, DataTypeSet, Entity, EntityMut, EntityRef};
use engine_event::{Event, EventDispatcher, EventPool};
use engine_system::{
    FilterProvider, GlobalEntity, Input, InputEvent, InputProvider, InputTypeSet, OnAdded,
    OnGlobalInput, OnGlobalPostUpdate, OnInput, OnModified, OnRemoved, OnUpdate, System,
    SystemBase,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::tick::FrameTime;
use crate::world::World;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

/// Number of inputs seen so far. Lives on the global entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputCount(pub u64);

impl Component for InputCount {
    fn type_name() -> &'static str {
        "InputCount"
    }
}

/// An entity moved during a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Moved {
    pub entity: Entity,
    pub to: Position,
}

impl Default for Moved {
    fn default() -> Self {
        Self {
            entity: Entity::INVALID,
            to: Position::default(),
        }
    }
}

impl Event for Moved {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Add `(dx, dy)` to the velocity of every thrust-controlled entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thrust {
    pub dx: f64,
    pub dy: f64,
}

impl Input for Thrust {
    fn type_name() -> &'static str {
        "Thrust"
    }
}

/// Integrates velocity into position.
#[derive(Debug)]
pub struct MovementSystem {
    base: SystemBase,
    pool: EventPool<Moved>,
}

impl MovementSystem {
    #[must_use]
    pub fn new(pool: EventPool<Moved>) -> Self {
        Self {
            base: SystemBase::new(),
            pool,
        }
    }

    fn dt(&self) -> f64 {
        self.base
            .global()
            .and_then(|global| global.read(|time: &FrameTime| time.dt))
            .unwrap_or(0.0)
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn set_event_dispatcher(&mut self, dispatcher: EventDispatcher) {
        self.base.set_event_dispatcher(dispatcher);
    }

    fn set_global_entity(&mut self, global: GlobalEntity) {
        self.base.set_global_entity(global);
    }

    fn as_update(&mut self) -> Option<&mut dyn OnUpdate> {
        Some(self)
    }
}

impl FilterProvider for MovementSystem {
    fn required_data_types(&self) -> DataTypeSet {
        DataTypeSet::new().with::<Position>().with::<Velocity>()
    }
}

impl OnUpdate for MovementSystem {
    fn on_update(&mut self, entity: &mut EntityMut<'_>) {
        let Some(velocity) = entity.get::<Velocity>().copied() else {
            return;
        };
        if velocity == Velocity::default() {
            return;
        }
        let dt = self.dt();
        let id = entity.entity();
        let Some(position) = entity.get_mut::<Position>() else {
            return;
        };
        position.x += velocity.x * dt;
        position.y += velocity.y * dt;

        if let Some(events) = self.base.events() {
            let mut moved = self.pool.acquire();
            moved.entity = id;
            moved.to = *position;
            events.submit(moved);
        }
    }
}

/// Applies [`Thrust`] inputs.
#[derive(Debug, Default)]
pub struct ThrustSystem {
    base: SystemBase,
}

impl ThrustSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for ThrustSystem {
    fn name(&self) -> &str {
        "thrust"
    }

    fn set_event_dispatcher(&mut self, dispatcher: EventDispatcher) {
        self.base.set_event_dispatcher(dispatcher);
    }

    fn set_global_entity(&mut self, global: GlobalEntity) {
        self.base.set_global_entity(global);
    }

    fn as_input(&mut self) -> Option<&mut dyn OnInput> {
        Some(self)
    }

    fn as_global_input(&mut self) -> Option<&mut dyn OnGlobalInput> {
        Some(self)
    }
}

impl FilterProvider for ThrustSystem {
    fn required_data_types(&self) -> DataTypeSet {
        DataTypeSet::new().with::<Velocity>()
    }
}

impl InputProvider for ThrustSystem {
    fn input_types(&self) -> InputTypeSet {
        InputTypeSet::new().with::<Thrust>()
    }
}

impl OnInput for ThrustSystem {
    fn on_input(&mut self, input: &InputEvent, entity: &mut EntityMut<'_>) {
        let Some(thrust) = input.downcast_ref::<Thrust>() else {
            return;
        };
        if let Some(velocity) = entity.get_mut::<Velocity>() {
            velocity.x += thrust.dx;
            velocity.y += thrust.dy;
        }
    }
}

impl OnGlobalInput for ThrustSystem {
    fn on_global_input(&mut self, input: &InputEvent) {
        let Some(global) = self.base.global() else {
            return;
        };
        if global.write(|count: &mut InputCount| count.0 += 1).is_none() {
            global.insert(InputCount(1));
        }
        debug!(input = input.type_name(), "counted input");
    }
}

/// What the [`TrackerSystem`] has observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub tracked: usize,
    pub added: u64,
    pub removed: u64,
    pub modified: u64,
    pub moved: u64,
}

/// Follows every positioned entity.
#[derive(Debug)]
pub struct TrackerSystem {
    stats: Arc<Mutex<TrackerStats>>,
}

impl TrackerSystem {
    #[must_use]
    pub fn new(stats: Arc<Mutex<TrackerStats>>) -> Self {
        Self { stats }
    }
}

impl System for TrackerSystem {
    fn name(&self) -> &str {
        "tracker"
    }

    fn set_event_dispatcher(&mut self, dispatcher: EventDispatcher) {
        let stats = Arc::clone(&self.stats);
        dispatcher.on_event(move |_: &Moved| stats.lock().moved += 1);
    }

    fn set_global_entity(&mut self, _: GlobalEntity) {}

    fn as_added(&mut self) -> Option<&mut dyn OnAdded> {
        Some(self)
    }

    fn as_removed(&mut self) -> Option<&mut dyn OnRemoved> {
        Some(self)
    }

    fn as_modified(&mut self) -> Option<&mut dyn OnModified> {
        Some(self)
    }

    fn as_global_post_update(&mut self) -> Option<&mut dyn OnGlobalPostUpdate> {
        Some(self)
    }
}

impl FilterProvider for TrackerSystem {
    fn required_data_types(&self) -> DataTypeSet {
        DataTypeSet::new().with::<Position>()
    }
}

impl OnAdded for TrackerSystem {
    fn on_added(&mut self, _: EntityRef<'_>) {
        let mut stats = self.stats.lock();
        stats.added += 1;
        stats.tracked += 1;
    }
}

impl OnRemoved for TrackerSystem {
    fn on_removed(&mut self, _: EntityRef<'_>) {
        let mut stats = self.stats.lock();
        stats.removed += 1;
        stats.tracked = stats.tracked.saturating_sub(1);
    }
}

impl OnModified for TrackerSystem {
    fn on_modified(&mut self, _: EntityRef<'_>) {
        self.stats.lock().modified += 1;
    }
}

impl OnGlobalPostUpdate for TrackerSystem {
    fn on_global_post_update(&mut self) {
        let stats = *self.stats.lock();
        debug!(
            tracked = stats.tracked,
            modified = stats.modified,
            moved = stats.moved,
            "tracker frame"
        );
    }
}

/// Register the demo systems on `world` and spawn `count` moving entities.
///
/// Returns the tracker's shared stats.
pub fn install(world: &mut World, count: usize) -> Arc<Mutex<TrackerStats>> {
    let pool = EventPool::with_limit(count.max(1));
    world.bus().recycle_into(pool.clone());

    let stats = Arc::new(Mutex::new(TrackerStats::default()));
    world.register_system(Box::new(ThrustSystem::new()));
    world.register_system(Box::new(MovementSystem::new(pool)));
    world.register_system(Box::new(TrackerSystem::new(Arc::clone(&stats))));

    for i in 0..count {
        let offset = i as f64;
        world.spawn(
            ComponentSet::new()
                .with(Position { x: offset, y: 0.0 })
                .with(Velocity { x: 1.0, y: offset }),
        );
    }
    stats
}

#[cfg(test)]
mod tests {
    use engine_system::Capability;

    use super::*;

    fn frame(world: &mut World, dt: f64) {
        world.global().insert(FrameTime { tick: 0, dt });
        world.update().unwrap();
    }

    #[test]
    fn test_install_registers_and_tracks() {
        let mut world = World::new();
        let stats = install(&mut world, 3);

        let names: Vec<_> = world
            .registry()
            .registrations()
            .map(|r| r.name.clone())
            .collect();
        assert_eq!(names, vec!["thrust", "movement", "tracker"]);
        assert_eq!(stats.lock().tracked, 3);
        assert_eq!(world.entity_count(), 3);
    }

    #[test]
    fn test_movement_uses_frame_time_and_emits_moved() {
        let mut world = World::new();
        let stats = install(&mut world, 0);
        let e = world.spawn(
            ComponentSet::new()
                .with(Position::default())
                .with(Velocity { x: 2.0, y: -1.0 }),
        );

        frame(&mut world, 0.5);
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: -0.5 }));

        let stats = *stats.lock();
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.modified, 1);
    }

    #[test]
    fn test_stationary_entities_stay_quiet() {
        let mut world = World::new();
        let stats = install(&mut world, 0);
        world.spawn(
            ComponentSet::new()
                .with(Position::default())
                .with(Velocity::default()),
        );

        frame(&mut world, 1.0);
        assert_eq!(stats.lock().moved, 0);
        assert_eq!(stats.lock().modified, 0);
    }

    #[test]
    fn test_thrust_changes_velocity_and_counts() {
        let mut world = World::new();
        install(&mut world, 2);

        world.deliver_input(&InputEvent::new(Thrust { dx: 0.5, dy: 0.0 }));
        world.deliver_input(&InputEvent::new(Thrust { dx: 0.5, dy: 0.0 }));

        let first = Entity::from_raw(2);
        assert_eq!(world.get::<Velocity>(first), Some(&Velocity { x: 2.0, y: 0.0 }));
        assert_eq!(world.global().get_cloned::<InputCount>(), Some(InputCount(2)));
    }

    #[test]
    fn test_tracker_follows_removal() {
        let mut world = World::new();
        let stats = install(&mut world, 2);
        let first = Entity::from_raw(2);

        world.remove_component::<Position>(first).unwrap();
        assert_eq!(stats.lock().tracked, 1);
        assert_eq!(stats.lock().removed, 1);
        world.insert_component(first, Position::default()).unwrap();
        assert_eq!(stats.lock().tracked, 2);
    }

    #[test]
    fn test_capabilities_probe_as_declared() {
        let mut world = World::new();
        install(&mut world, 0);
        let caps: Vec<_> = world
            .registry()
            .registrations()
            .map(|r| r.capabilities)
            .collect();
        assert!(caps[0].contains(Capability::Input) && caps[0].contains(Capability::GlobalInput));
        assert!(caps[1].contains(Capability::Update));
        assert!(caps[2].contains(Capability::Modified));
        assert!(!caps[2].contains(Capability::Update));
    }
}
