//! Endless Track headless runner
//!
//! Streams track into an in-memory scene around an autopiloted observer
//! until it hits a hazard or reaches the distance cap, then records the run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use endless_track::audio::Playlist;
use endless_track::consts::HALF_PIECE_SIZE;
use endless_track::highscores::{HighScores, RunRecord};
use endless_track::scene::{Handle, SceneGraph, Template};
use endless_track::sim::{Observer, TrackManager, Volume};
use endless_track::{Settings, Tuning};

/// Fixed simulation step (seconds)
const DT: f32 = 1.0 / 60.0;
const BASE_SPEED: f32 = 10.0;
/// Extra forward speed per unit of distance travelled
const SPEED_GAIN: f32 = 0.005;
/// Lateral autopilot speed (units per second)
const STEER_SPEED: f32 = 6.0;
const PICKUP_RADIUS: f32 = 0.6;
/// Time spent without floor before the observer is lost
const FALL_SECONDS: f32 = 0.25;
const SONG_SECONDS: f32 = 120.0;
const SONGS: [&str; 4] = [
    "music/afterglow.ogg",
    "music/night-shift.ogg",
    "music/low-orbit.ogg",
    "music/tunnel-vision.ogg",
];

#[derive(Parser, Debug)]
#[command(
    name = "endless-track",
    version,
    about = "Run an autopiloted observer down a procedurally streamed track"
)]
struct Options {
    /// Track seed; falls back to the settings file, then to entropy.
    #[arg(long)]
    seed: Option<u64>,
    /// Stop the run once this distance is reached.
    #[arg(long, default_value_t = 5_000.0)]
    max_distance: f32,
    /// Settings JSON (defaults are used when the file is missing).
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,
    /// Difficulty tables JSON (defaults are used when the file is missing).
    #[arg(long, default_value = "tuning.json")]
    tuning: PathBuf,
    /// Leaderboard JSON to read and update.
    #[arg(long, default_value = "highscores.json")]
    scores: PathBuf,
}

/// World-space x/z footprint of a unit-cube template instance
fn footprint(graph: &SceneGraph, handle: Handle) -> Option<(Vec3, Vec3)> {
    let m = graph.world_matrix(handle)?;
    let a = m.transform_point3(Vec3::splat(-0.5));
    let b = m.transform_point3(Vec3::splat(0.5));
    Some((a.min(b), a.max(b)))
}

fn footprints(graph: &SceneGraph, template: Template) -> Vec<(Vec3, Vec3)> {
    graph
        .handles_of(template)
        .into_iter()
        .filter_map(|h| footprint(graph, h))
        .collect()
}

fn covers((lo, hi): &(Vec3, Vec3), x: f32, z: f32) -> bool {
    (lo.x..=hi.x).contains(&x) && (lo.z..=hi.z).contains(&z)
}

/// Centre of the wider free lane beside the next hazard ahead
fn steer_target(hazards: &[(Vec3, Vec3)], z: f32, current: f32) -> f32 {
    let next = hazards
        .iter()
        .filter(|(_, hi)| hi.z >= z)
        .min_by(|a, b| a.0.z.total_cmp(&b.0.z));
    match next {
        Some((lo, hi)) => {
            let left = lo.x + HALF_PIECE_SIZE;
            let right = HALF_PIECE_SIZE - hi.x;
            if left >= right {
                (lo.x - HALF_PIECE_SIZE) / 2.0
            } else {
                (hi.x + HALF_PIECE_SIZE) / 2.0
            }
        }
        None => current,
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Options::parse();

    let settings = Settings::load(&opts.settings)
        .with_context(|| format!("loading settings from {}", opts.settings.display()))?;
    let tuning = Tuning::load(&opts.tuning)
        .with_context(|| format!("loading tuning from {}", opts.tuning.display()))?;
    let seed = opts.seed.or(settings.seed).unwrap_or_else(rand::random);
    log::info!("Endless Track (headless) starting with seed {seed}");

    let mut manager = TrackManager::with_seed(SceneGraph::new(), settings, tuning, seed)?;
    let mut observer = Observer::new(0.0);
    let mut x = 0.0_f32;
    let mut airborne = 0.0_f32;

    let mut rng = Pcg32::seed_from_u64(seed.wrapping_add(1));
    let mut playlist = Playlist::new(SONGS.iter().map(|s| s.to_string()).collect());
    playlist.next_song(&mut rng);
    let mut song_time = 0.0_f32;

    loop {
        manager.tick(&mut observer)?;
        if observer.game_over() || observer.distance() >= opts.max_distance {
            break;
        }

        let speed = BASE_SPEED + observer.distance() * SPEED_GAIN;
        observer.advance_to(observer.z() + speed * DT);
        let z = observer.z();

        let graph = manager.host();
        let cubes = footprints(graph, Template::KillCube);
        let drops = footprints(graph, Template::DropPlane);
        let hazards: Vec<(Vec3, Vec3)> = cubes.iter().chain(&drops).copied().collect();
        let target = steer_target(&hazards, z, x);
        let step = STEER_SPEED * DT;
        x += (target - x).clamp(-step, step);

        if cubes.iter().any(|f| covers(f, x, z)) {
            observer.touch(Volume::KillCube);
        } else if drops.iter().any(|f| covers(f, x, z)) {
            observer.touch(Volume::DropPlane);
            airborne += DT;
            if airborne >= FALL_SECONDS {
                observer.touch(Volume::KillPlane);
            }
        } else {
            observer.touch(Volume::Ground);
            airborne = 0.0;
        }

        let reachable: Vec<Handle> = manager
            .live_coins()
            .filter(|c| {
                manager.host().world_position(*c).is_some_and(|p| {
                    (p.x - x).abs() < PICKUP_RADIUS && (p.z - z).abs() < PICKUP_RADIUS
                })
            })
            .collect();
        for coin in reachable {
            manager.collect_coin(coin, &mut observer);
        }

        song_time += DT;
        if song_time >= SONG_SECONDS {
            song_time = 0.0;
            playlist.next_song(&mut rng);
        }
    }

    let run = RunRecord {
        distance: observer.distance(),
        coins: observer.coins(),
        tier: manager.formatted_tier(),
        seed: Some(seed),
    };
    let graph = manager.host();
    println!(
        "Run over: distance {:.1}, coins {}, tier {}",
        run.distance, run.coins, run.tier
    );
    println!(
        "Scene: {} live nodes, {} spawned, {} destroyed, {} stale operations",
        graph.len(),
        graph.spawned(),
        graph.destroyed(),
        graph.stale_operations()
    );
    if let Some(song) = playlist.current() {
        println!("Last song: {song}");
    }

    let mut scores = HighScores::load(&opts.scores)
        .with_context(|| format!("loading high scores from {}", opts.scores.display()))?;
    match scores.add_run(run) {
        Some(rank) => {
            println!("New high score! Rank #{rank}");
            scores
                .save(&opts.scores)
                .context("saving high scores")?;
        }
        None => println!("No new high score"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Options::command().debug_assert();
    }

    #[test]
    fn test_defaults_without_flags() {
        let opts = Options::try_parse_from(["endless-track"]).unwrap();
        assert_eq!(opts.seed, None);
        assert_eq!(opts.max_distance, 5_000.0);
        assert_eq!(opts.settings, PathBuf::from("settings.json"));
        assert_eq!(opts.tuning, PathBuf::from("tuning.json"));
        assert_eq!(opts.scores, PathBuf::from("highscores.json"));
    }

    #[test]
    fn test_flags_override_defaults() {
        let opts = Options::try_parse_from([
            "endless-track",
            "--seed",
            "42",
            "--max-distance",
            "750.5",
            "--scores",
            "/tmp/runs.json",
        ])
        .unwrap();
        assert_eq!(opts.seed, Some(42));
        assert_eq!(opts.max_distance, 750.5);
        assert_eq!(opts.scores, PathBuf::from("/tmp/runs.json"));
    }

    #[test]
    fn test_rejects_unknown_flag_and_bad_seed() {
        assert!(Options::try_parse_from(["endless-track", "--speed", "3"]).is_err());
        assert!(Options::try_parse_from(["endless-track", "--seed", "abc"]).is_err());
    }

    #[test]
    fn test_steers_to_wider_lane() {
        // Hazard hugging the right wall leaves the left lane open
        let hazard = (Vec3::new(0.5, 0.0, 10.0), Vec3::new(2.0, 1.0, 14.0));
        assert_eq!(steer_target(&[hazard], 5.0, 0.0), -0.75);
        // Passed hazards are ignored
        assert_eq!(steer_target(&[hazard], 15.0, 0.3), 0.3);
    }
}
