//! Fixed-timestep frame loop.
//!
//! Each tick:
//!
//! 1. Publish the [`FrameTime`] on the global entity.
//! 2. Deliver queued inputs.
//! 3. Run every system's update phases.
//! 4. Dispatch the events submitted during the frame.
//! 5. Advance the tick counter.

use std::mem;
use std::time::{Duration, Instant};

use engine_component::Component;
use engine_system::InputEvent;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::world::{FrameReport, World};

/// The current frame's timing. Stored on the global entity before any
/// system runs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Tick being processed, starting at 1.
    pub tick: u64,
    /// Seconds per tick.
    pub dt: f64,
}

impl Component for FrameTime {
    fn type_name() -> &'static str {
        "FrameTime"
    }
}

/// The frame loop state.
#[derive(Debug)]
pub struct TickLoop {
    /// Completed tick counter.
    tick_id: u64,
    config: EngineConfig,
    world: World,
    /// Inputs delivered at the start of the next tick.
    inputs: Vec<InputEvent>,
}

impl TickLoop {
    /// Create a tick loop around an empty world.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tick_id: 0,
            config,
            world: World::new(),
            inputs: Vec::new(),
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Queue an input for the next tick.
    pub fn queue_input(&mut self, input: InputEvent) {
        self.inputs.push(input);
    }

    /// Run one tick.
    ///
    /// The counter advances even when the frame's dispatch fails.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Event`] if the end-of-frame dispatch fails.
    pub fn tick(&mut self, dt: f64) -> Result<FrameReport, EngineError> {
        self.tick_id += 1;
        self.world.global().insert(FrameTime {
            tick: self.tick_id,
            dt,
        });

        let inputs = mem::take(&mut self.inputs);
        debug!(tick_id = self.tick_id, dt, inputs = inputs.len(), "tick start");
        for input in &inputs {
            self.world.deliver_input(input);
        }

        let report = self.world.update()?;
        debug!(
            tick_id = self.tick_id,
            updates = report.updates,
            modified = report.modified,
            events = report.dispatch.events,
            "tick complete"
        );
        Ok(report)
    }

    /// Run the loop for the configured number of ticks, or indefinitely.
    ///
    /// A failing event handler costs the rest of that frame's events but does
    /// not stop the loop. Returns the number of ticks run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for a tick rate that cannot
    /// form a frame duration, and [`EngineError::Event`] on a reentrant
    /// dispatch.
    pub fn run(&mut self) -> Result<u64, EngineError> {
        self.config.validate()?;
        let tick_duration = Duration::try_from_secs_f64(1.0 / self.config.tick_rate)
            .map_err(|err| EngineError::InvalidConfig(format!("tick_rate: {err}")))?;
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            systems = self.world.registry().len(),
            entities = self.world.entity_count(),
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            if let Err(err) = self.tick(tick_duration.as_secs_f64()) {
                match &err {
                    EngineError::Event(event_err) if !event_err.is_reentrancy() => {
                        warn!(tick_id = self.tick_id, error = %err, "event handler failed");
                    }
                    _ => {
                        error!(tick_id = self.tick_id, error = %err, "tick aborted");
                        return Err(err);
                    }
                }
            }

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                return Ok(tick_count);
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}
