#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave simulation driver for Path Defence.
//!
//! The driver owns no game state. It plans the next wave, feeds commands into
//! the world, ticks it until every enemy is resolved and forwards the
//! resulting events to the external collaborators: the notification feed,
//! an audio sink and a persistence sink. Collaborator failures are logged and
//! never interrupt the simulation.

use std::{thread, time::Duration};

use path_defence_core::{AudioCue, Command, Event, GameSpeed, WaveStartError, WaveSummary};
use path_defence_system_wave_generation::WaveGeneration;
use path_defence_world::{self as world, query, SaveGame, World};
use tracing::{debug, info, warn};

/// Fire-and-forget sound playback.
pub trait AudioSink {
    /// Triggers the named cue.
    fn play(&mut self, cue: AudioCue) -> anyhow::Result<()>;

    /// Adjusts effect and music volumes, each within `0.0..=1.0`.
    fn set_volume(&mut self, sfx: f32, music: f32) -> anyhow::Result<()>;
}

/// Receives a snapshot whenever a wave completes.
pub trait SaveSink {
    /// Persists the snapshot.
    fn save(&mut self, save: &SaveGame) -> anyhow::Result<()>;
}

/// Audio sink that discards every cue.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silence;

impl AudioSink for Silence {
    fn play(&mut self, _cue: AudioCue) -> anyhow::Result<()> {
        Ok(())
    }

    fn set_volume(&mut self, _sfx: f32, _music: f32) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Save sink that keeps nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSaves;

impl SaveSink for NoSaves {
    fn save(&mut self, _save: &SaveGame) -> anyhow::Result<()> {
        Ok(())
    }
}

/// External collaborators the driver reports to.
pub struct Collaborators<'a> {
    /// Append-only feed of human-readable event lines.
    pub notifications: &'a mut Vec<String>,
    /// Sound playback.
    pub audio: &'a mut dyn AudioSink,
    /// Persistence of wave-boundary snapshots.
    pub saves: &'a mut dyn SaveSink,
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("notifications", &self.notifications.len())
            .finish_non_exhaustive()
    }
}

/// Longest tick length honoured at x1.0 speed.
pub const MAX_BASE_TICK: Duration = Duration::from_secs(60);

/// Real-time delay between ticks, purely for presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    base_tick: Duration,
    min_tick: Duration,
}

impl Pacing {
    /// Pacing that never sleeps, for automated runs and tests.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            base_tick: Duration::ZERO,
            min_tick: Duration::ZERO,
        }
    }

    /// Pacing with a custom tick length at x1.0 and a lower bound at any speed.
    #[must_use]
    pub const fn new(base_tick: Duration, min_tick: Duration) -> Self {
        Self {
            base_tick,
            min_tick,
        }
    }

    /// Delay between two ticks at the provided game speed.
    ///
    /// Base tick lengths above [`MAX_BASE_TICK`] are clamped to it.
    #[must_use]
    pub fn tick_duration(&self, speed: GameSpeed) -> Duration {
        self.base_tick
            .min(MAX_BASE_TICK)
            .div_f32(speed.multiplier())
            .max(self.min_tick)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_millis(100))
    }
}

/// Progress of the wave currently handled by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveState {
    /// No wave has been started since the driver was created or last reset.
    NotStarted,
    /// A wave is being simulated.
    Running {
        /// Number of the running wave.
        wave: u32,
    },
    /// The last wave finished.
    Complete {
        /// Totals of the finished wave.
        summary: WaveSummary,
    },
}

/// State machine that drives one wave at a time through the world.
#[derive(Debug)]
pub struct WaveLoop {
    generator: WaveGeneration,
    pacing: Pacing,
    state: WaveState,
}

impl WaveLoop {
    /// Creates a driver that plans waves with `generator`.
    #[must_use]
    pub fn new(generator: WaveGeneration, pacing: Pacing) -> Self {
        Self {
            generator,
            pacing,
            state: WaveState::NotStarted,
        }
    }

    /// Current state of the driver.
    #[must_use]
    pub const fn state(&self) -> WaveState {
        self.state
    }

    /// Applies a player command and reports its events to the collaborators.
    pub fn submit(
        &mut self,
        world: &mut World,
        command: Command,
        collaborators: &mut Collaborators<'_>,
    ) {
        let mut events = Vec::new();
        world::apply(world, command, &mut events);
        self.dispatch(world, &events, collaborators);
    }

    /// Plans and starts the next wave.
    pub fn start(
        &mut self,
        world: &mut World,
        collaborators: &mut Collaborators<'_>,
    ) -> Result<u32, WaveStartError> {
        let number = query::next_wave_number(world);
        let map = query::map(world);
        let plan = self.generator.plan_wave(number, map.start(), map.base());

        let mut events = Vec::new();
        world::apply(world, Command::BeginWave { plan }, &mut events);
        let rejection = events.iter().find_map(|event| match event {
            Event::WaveRejected { reason, .. } => Some(*reason),
            _ => None,
        });
        if rejection.is_none() {
            self.state = WaveState::Running { wave: number };
        }
        self.dispatch(world, &events, collaborators);

        match rejection {
            Some(reason) => {
                warn!(wave = number, %reason, "wave could not start");
                Err(reason)
            }
            None => Ok(number),
        }
    }

    /// Advances the running wave by one tick.
    pub fn step(
        &mut self,
        world: &mut World,
        collaborators: &mut Collaborators<'_>,
    ) -> WaveState {
        if !matches!(self.state, WaveState::Running { .. }) {
            return self.state;
        }
        let mut events = Vec::new();
        world::apply(world, Command::Tick, &mut events);
        self.dispatch(world, &events, collaborators);
        self.state
    }

    /// Starts the next wave and ticks it to completion, pacing each tick.
    pub fn run_wave(
        &mut self,
        world: &mut World,
        collaborators: &mut Collaborators<'_>,
    ) -> Result<WaveSummary, WaveStartError> {
        let _ = self.start(world, collaborators)?;
        while let WaveState::Running { .. } = self.step(world, collaborators) {
            let delay = self
                .pacing
                .tick_duration(query::session(world).game_speed());
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
        match self.state {
            WaveState::Complete { summary } => Ok(summary),
            WaveState::NotStarted | WaveState::Running { .. } => {
                Err(WaveStartError::WaveInProgress)
            }
        }
    }

    fn dispatch(
        &mut self,
        world: &World,
        events: &[Event],
        collaborators: &mut Collaborators<'_>,
    ) {
        for event in events {
            if let Some(line) = event.notification() {
                collaborators.notifications.push(line);
            }
            if let Some(cue) = event.audio_cue() {
                if let Err(error) = collaborators.audio.play(cue) {
                    warn!(cue = cue.key(), %error, "audio cue failed");
                }
            }
            match event {
                Event::WaveCompleted { summary } => {
                    self.state = WaveState::Complete { summary: *summary };
                    let save = query::save_game(world);
                    match collaborators.saves.save(&save) {
                        Ok(()) => info!(wave = summary.wave, "session saved"),
                        Err(error) => warn!(wave = summary.wave, %error, "session save failed"),
                    }
                }
                Event::TowerFired { .. } => {}
                other => debug!(event = ?other, "event dispatched"),
            }
        }
    }
}
