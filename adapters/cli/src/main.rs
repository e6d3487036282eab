#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a scripted Path Defence session.
//!
//! The adapter owns every outer concern the engine leaves to collaborators:
//! argument parsing, the preferences file, save slots, the audio thread and
//! log output. Notifications are printed to stdout after each wave; logs go
//! to stderr and honour `RUST_LOG`.

mod audio;
mod preferences;
mod save_transfer;
mod script;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use path_defence_core::{AudioCue, CellCoord, Difficulty, MapKind};
use path_defence_system_builder::Builder;
use path_defence_system_wave_generation::WaveGeneration;
use path_defence_system_wave_loop::{
    AudioSink, Collaborators, NoSaves, Pacing, SaveSink, WaveLoop,
};
use path_defence_world::{query, CellMarker, MapLayout, Outcome, World};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    audio::AudioWorker,
    preferences::{Preferences, SessionOverrides},
    save_transfer::SlotStore,
    script::ScheduledAction,
};

const MAX_TICK_MS: u64 = 60_000;

#[derive(Parser, Debug)]
#[command(name = "path-defence")]
#[command(about = "Plays Path Defence waves from the command line")]
struct Args {
    /// TOML preferences file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Difficulty preset: easy, normal, hard or custom
    #[arg(long, value_parser = parse_difficulty)]
    difficulty: Option<Difficulty>,

    /// Path shape: linear, winding or diagonal
    #[arg(long, value_parser = parse_map_kind)]
    map: Option<MapKind>,

    /// Root seed for the map and every wave
    #[arg(long)]
    seed: Option<u64>,

    /// Waves needed to win
    #[arg(long)]
    waves: Option<u32>,

    /// Starting lives
    #[arg(long)]
    lives: Option<u32>,

    /// Starting gold
    #[arg(long)]
    gold: Option<u32>,

    /// Player action such as "build 1 B4" or "3:upgrade 1" (before wave 3)
    #[arg(long = "action")]
    actions: Vec<String>,

    /// Tick length in milliseconds at x1.0 speed; 0 runs without pausing
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=MAX_TICK_MS))]
    tick_ms: u64,

    /// Stop after playing this many waves
    #[arg(long)]
    stop_after: Option<u32>,

    /// Save slot written after every wave
    #[arg(long)]
    slot: Option<u8>,

    /// Resume the session stored in --slot
    #[arg(long, requires = "slot")]
    load: bool,

    /// Directory holding the save slots
    #[arg(long, default_value = "saves")]
    save_dir: PathBuf,

    /// Silence every sound
    #[arg(long)]
    mute: bool,

    /// Print the board before the first wave
    #[arg(long)]
    show_map: bool,

    /// Name shown next to the final score
    #[arg(long, default_value = "player")]
    nick: String,
}

impl Args {
    fn overrides(&self) -> SessionOverrides {
        SessionOverrides {
            starting_currency: self.gold,
            starting_lives: self.lives,
            wave_count: self.waves,
            seed: self.seed,
            map: self.map,
            ..SessionOverrides::default()
        }
    }

    fn pacing(&self) -> Pacing {
        if self.tick_ms == 0 {
            return Pacing::immediate();
        }
        let base = Duration::from_millis(self.tick_ms.min(MAX_TICK_MS));
        Pacing::new(base, base / 5)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    let preferences = match &args.config {
        Some(path) => Preferences::load(path)?,
        None => Preferences::default(),
    };
    let mut store = args.slot.map(|slot| SlotStore::new(&args.save_dir, slot));
    let mut world = open_world(&args, &preferences, store.as_ref())?;
    let script = args
        .actions
        .iter()
        .map(|action| {
            ScheduledAction::parse(action).with_context(|| format!("invalid --action `{action}`"))
        })
        .collect::<Result<Vec<_>>>()?;

    println!("{}", query::welcome_banner(&world));
    if args.show_map {
        println!("{}", render_board(query::map(&world)));
    }

    let mut audio = AudioWorker::spawn()?;
    let (sfx, music) = if args.mute {
        (0.0, 0.0)
    } else {
        preferences.volumes()
    };
    for result in [audio.set_volume(sfx, music), audio.play(AudioCue::Music)] {
        if let Err(error) = result {
            warn!(%error, "audio unavailable");
        }
    }

    let map = query::map(&world);
    let builder = Builder::new(map.columns(), map.rows());
    let mut wave_loop = WaveLoop::new(
        WaveGeneration::new(query::session(&world).config()),
        args.pacing(),
    );
    let mut no_saves = NoSaves;
    let saves: &mut dyn SaveSink = match store.as_mut() {
        Some(store) => {
            info!(path = %store.path().display(), "saving after every wave");
            store
        }
        None => &mut no_saves,
    };

    let first_wave = query::next_wave_number(&world);
    let mut played = 0;
    let mut notifications = Vec::new();
    while query::outcome(&world) == Outcome::Ongoing
        && args.stop_after.map_or(true, |limit| played < limit)
    {
        let wave = query::next_wave_number(&world);
        let mut collaborators = Collaborators {
            notifications: &mut notifications,
            audio: &mut audio,
            saves: &mut *saves,
        };
        for action in script.iter().filter(|action| action.is_due(wave, first_wave)) {
            let towers: Vec<_> = query::towers(&world).iter().map(|tower| tower.id()).collect();
            let mut commands = Vec::new();
            match builder.handle(action.request(), &towers, &mut commands) {
                Ok(()) => {
                    for command in commands {
                        wave_loop.submit(&mut world, command, &mut collaborators);
                    }
                }
                Err(error) => collaborators
                    .notifications
                    .push(format!("Ignored `{}`: {error}.", action.line())),
            }
        }

        let result = wave_loop.run_wave(&mut world, &mut collaborators);
        for line in notifications.drain(..) {
            println!("{line}");
        }
        if let Err(reason) = result {
            bail!("wave {wave} could not start: {reason}");
        }
        played += 1;
    }

    let session = query::session(&world);
    match query::outcome(&world) {
        Outcome::Victory => println!("Victory! All {} waves cleared.", session.wave()),
        Outcome::Defeat => println!("Defeat on wave {}.", session.wave()),
        Outcome::Ongoing => println!("Session paused after wave {}.", session.wave()),
    }
    println!(
        "{} scored {} points ({} defeated, {} gold, {} lives left).",
        args.nick,
        session.score(),
        session.stats().enemies_defeated,
        session.currency(),
        session.lives()
    );

    let cues = audio.shutdown()?;
    info!(cues, "audio stopped");
    Ok(())
}

fn open_world(
    args: &Args,
    preferences: &Preferences,
    store: Option<&SlotStore>,
) -> Result<World> {
    if args.load {
        let Some(store) = store else {
            bail!("--load needs a save slot");
        };
        let Some(save) = store.load()? else {
            bail!("save slot {} is empty", store.path().display());
        };
        let world = World::from_save(save)
            .with_context(|| format!("save slot {} is corrupt", store.path().display()))?;
        info!(wave = query::session(&world).wave(), "session resumed");
        return Ok(world);
    }
    let config = preferences.session_config(args.difficulty, &args.overrides())?;
    info!(difficulty = ?config.difficulty, seed = config.seed, waves = config.wave_count, "session configured");
    Ok(World::new(config))
}

fn render_board(map: &MapLayout) -> String {
    let header: String = (0..map.columns())
        .map(|column| {
            CellCoord::new(column, 0)
                .label()
                .chars()
                .next()
                .unwrap_or('?')
        })
        .collect();
    let mut board = format!("    {header}");
    for (row, markers) in map.marker_rows().enumerate() {
        let cells: String = markers
            .iter()
            .map(|marker| match marker {
                CellMarker::Empty => '.',
                CellMarker::Path => '#',
                CellMarker::Start => 'S',
                CellMarker::Base => 'B',
                CellMarker::Tower(kind) => kind.symbol(),
            })
            .collect();
        board.push_str(&format!("\n{:>3} {cells}", row + 1));
    }
    board
}

fn parse_difficulty(value: &str) -> Result<Difficulty, String> {
    match value.to_ascii_lowercase().as_str() {
        "easy" => Ok(Difficulty::Easy),
        "normal" => Ok(Difficulty::Normal),
        "hard" => Ok(Difficulty::Hard),
        "custom" => Ok(Difficulty::Custom),
        other => Err(format!("unknown difficulty `{other}`")),
    }
}

fn parse_map_kind(value: &str) -> Result<MapKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "linear" => Ok(MapKind::Linear),
        "winding" => Ok(MapKind::Winding),
        "diagonal" => Ok(MapKind::Diagonal),
        other => Err(format!("unknown map `{other}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_marks_path_ends_and_towers() {
        let mut world = World::new(path_defence_core::SessionConfig {
            starting_currency: 200,
            ..path_defence_core::SessionConfig::default()
        });
        let mut events = Vec::new();
        path_defence_world::apply(
            &mut world,
            path_defence_core::Command::PlaceTower {
                kind: path_defence_core::TowerKind::Cannon,
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        );

        let board = render_board(query::map(&world));
        let lines: Vec<&str> = board.lines().collect();
        assert_eq!(lines.len(), 27);
        assert!(lines[0].trim_start().starts_with("ABC"));
        assert!(lines[1].starts_with("  1 C"));
        let body = lines[1..].join("\n");
        assert_eq!(body.matches('S').count(), 1);
        assert_eq!(body.matches('B').count(), 1);
        assert_eq!(body.matches('#').count(), 24);
    }

    #[test]
    fn arguments_parse_into_overrides() {
        let args = Args::try_parse_from([
            "path-defence",
            "--difficulty",
            "Hard",
            "--map",
            "winding",
            "--waves",
            "4",
            "--action",
            "build 1 B4",
            "--action",
            "2:upgrade 1",
        ])
        .expect("valid arguments");
        assert_eq!(args.difficulty, Some(Difficulty::Hard));
        assert_eq!(args.actions.len(), 2);
        let overrides = args.overrides();
        assert_eq!(overrides.wave_count, Some(4));
        assert_eq!(overrides.map, Some(MapKind::Winding));
        assert_eq!(args.pacing(), Pacing::immediate());
    }

    #[test]
    fn tick_length_is_bounded() {
        let args = Args::try_parse_from(["path-defence", "--tick-ms", "60000"])
            .expect("longest tick accepted");
        assert_eq!(
            args.pacing().tick_duration(path_defence_core::GameSpeed::SLOWEST),
            Duration::from_secs(120)
        );
        assert!(Args::try_parse_from(["path-defence", "--tick-ms", "18446744073709551615"]).is_err());
    }

    #[test]
    fn loading_requires_a_slot() {
        assert!(Args::try_parse_from(["path-defence", "--load"]).is_err());
        assert!(parse_map_kind("spiral").is_err());
    }
}
