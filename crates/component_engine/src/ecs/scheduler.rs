//! Fixed-step simulation scheduling
//!
//! Real frames take however long they take; simulation ticks are always
//! `1 / logic_rate` seconds. Elapsed wall time is accumulated and spent in
//! whole ticks, so the simulation never runs ahead of real time and lags by
//! less than one tick. The exit signal is checked after every tick and stops
//! the scheduler immediately, even if the frame still owes more ticks.

use super::hooks::{HookGuard, HookList, TickHook};
use super::scene::Scene;
use crate::core::config::RuntimeConfig;
use crate::foundation::time::Clock;
use thiserror::Error;

/// Scheduler errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// The scheduler already stopped and cannot be resumed
    #[error("scheduler is stopped")]
    Stopped,
}

/// The simulation tick being run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInfo {
    /// Tick counter, starting at 1 for the first tick
    pub frame: u64,
    /// Tick length in seconds
    pub tick_duration: f64,
}

/// Decides when the loop ends
pub trait ExitSignal {
    /// Sampled after every tick
    fn exit_requested(&mut self, tick: &TickInfo) -> bool;
}

impl<F> ExitSignal for F
where
    F: FnMut(&TickInfo) -> bool,
{
    fn exit_requested(&mut self, tick: &TickInfo) -> bool {
        self(tick)
    }
}

/// Exit signal that fires once a number of ticks has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickLimit {
    limit: u64,
}

impl TickLimit {
    /// Stop after `limit` ticks
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl ExitSignal for TickLimit {
    fn exit_requested(&mut self, tick: &TickInfo) -> bool {
        tick.frame >= self.limit
    }
}

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Accepting frames
    Running,
    /// Exit was requested; terminal
    Stopped,
}

/// What one real frame did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Ticks run during the frame
    pub ticks: u32,
    /// Time left in the accumulator, less than one tick unless stopped early
    pub accumulator: f64,
    /// Whether the exit signal fired during the frame
    pub stopped: bool,
}

/// Fixed-timestep accumulator loop
#[derive(Debug)]
pub struct FixedStepScheduler {
    tick_duration: f64,
    accumulator: f64,
    last_sample: Option<f64>,
    frame: u64,
    state: SchedulerState,
    hooks: HookList,
}

impl FixedStepScheduler {
    /// Create a scheduler with a tick length in seconds
    pub fn new(tick_duration: f64) -> Self {
        Self {
            tick_duration,
            accumulator: 0.0,
            last_sample: None,
            frame: 0,
            state: SchedulerState::Running,
            hooks: HookList::new(),
        }
    }

    /// Create a scheduler ticking at the configured logic rate
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.tick_duration())
    }

    /// Tick length in seconds
    pub fn tick_duration(&self) -> f64 {
        self.tick_duration
    }

    /// Ticks run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Unspent time in seconds
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Hooks run after every tick
    pub fn hooks(&self) -> &HookList {
        &self.hooks
    }

    /// Install a hook run after every tick
    #[must_use = "the hook is uninstalled as soon as the guard is dropped"]
    pub fn install_hook(&self, hook: impl TickHook + 'static) -> HookGuard {
        self.hooks.install(hook)
    }

    /// Spend `elapsed` seconds of real time on whole ticks
    ///
    /// `tick` runs the simulation for one tick; installed hooks run after it
    /// and the exit signal is sampled last.
    pub fn advance<E, X, T>(
        &mut self,
        elapsed: f64,
        scenes: &mut [Scene],
        exit: &mut X,
        mut tick: T,
    ) -> Result<FrameReport, E>
    where
        E: From<SchedulerError>,
        X: ExitSignal + ?Sized,
        T: FnMut(&TickInfo, &mut [Scene]) -> Result<(), E>,
    {
        if self.state == SchedulerState::Stopped {
            return Err(SchedulerError::Stopped.into());
        }

        self.accumulator += elapsed.max(0.0);
        let mut ticks = 0;
        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            self.frame += 1;
            let info = TickInfo {
                frame: self.frame,
                tick_duration: self.tick_duration,
            };
            log::trace!("Tick {}", info.frame);

            tick(&info, scenes)?;
            self.hooks.run(&info, scenes);
            ticks += 1;

            if exit.exit_requested(&info) {
                self.state = SchedulerState::Stopped;
                return Ok(FrameReport {
                    ticks,
                    accumulator: self.accumulator,
                    stopped: true,
                });
            }
        }

        Ok(FrameReport {
            ticks,
            accumulator: self.accumulator,
            stopped: false,
        })
    }

    /// Run one real frame at time `now`
    ///
    /// The first frame only records the sample.
    pub fn step<E, X, T>(&mut self, now: f64, scenes: &mut [Scene], exit: &mut X, tick: T) -> Result<FrameReport, E>
    where
        E: From<SchedulerError>,
        X: ExitSignal + ?Sized,
        T: FnMut(&TickInfo, &mut [Scene]) -> Result<(), E>,
    {
        let elapsed = self.last_sample.map_or(0.0, |last| now - last);
        self.last_sample = Some(now);
        self.advance(elapsed, scenes, exit, tick)
    }

    /// Run frames until the exit signal fires, returning the number of ticks run
    pub fn run<E, C, X, T>(&mut self, clock: &mut C, scenes: &mut [Scene], exit: &mut X, mut tick: T) -> Result<u64, E>
    where
        E: From<SchedulerError>,
        C: Clock + ?Sized,
        X: ExitSignal + ?Sized,
        T: FnMut(&TickInfo, &mut [Scene]) -> Result<(), E>,
    {
        if self.state == SchedulerState::Stopped {
            return Err(SchedulerError::Stopped.into());
        }
        loop {
            let report = self.step(clock.now(), scenes, exit, &mut tick)?;
            if report.stopped {
                return Ok(self.frame);
            }
            if report.ticks == 0 {
                std::thread::yield_now();
            }
        }
    }
}
