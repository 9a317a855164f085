//! Track streaming tick
//!
//! Each call runs, in order: tier advance, extension ahead of the observer,
//! reclamation behind it, then the re-base check. The live window is a
//! queue ordered by forward position, so reclamation only ever looks at the
//! front.

use std::collections::VecDeque;

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::error::TrackError;
use super::observer::Observer;
use super::segment::TrackGenerator;
use super::state::Segment;
use crate::scene::{Handle, SceneHost, Template, Transform};
use crate::settings::Settings;
use crate::tuning::{Tier, Tuning};

#[derive(Debug, Clone, PartialEq)]
enum EntryRole {
    Piece,
    /// Segment node, queued after its pieces; owns the segment's coins
    Segment { base_z: f32, coins: Vec<Handle> },
}

#[derive(Debug, Clone)]
struct WindowEntry {
    handle: Handle,
    z: f32,
    role: EntryRole,
}

/// What one tick changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tier in effect after the tick
    pub tier: Tier,
    pub tier_advanced: bool,
    pub segments_generated: u32,
    /// Window entries destroyed behind the observer
    pub reclaimed: u32,
    /// Distance the world moved back, if it was re-based
    pub rebased_by: Option<f32>,
}

/// Streams generated track into a scene host around a moving observer
pub struct TrackManager<H: SceneHost> {
    host: H,
    root: Handle,
    generator: TrackGenerator,
    rng: Pcg32,
    settings: Settings,
    tier: Tier,
    window: VecDeque<WindowEntry>,
}

impl<H: SceneHost> TrackManager<H> {
    /// Create a manager seeded from the settings, or from entropy
    pub fn new(host: H, settings: Settings, tuning: Tuning) -> Result<Self, TrackError> {
        let seed = settings.seed.unwrap_or_else(rand::random);
        Self::with_seed(host, settings, tuning, seed)
    }

    /// Create a manager with an explicit RNG seed
    pub fn with_seed(
        mut host: H,
        settings: Settings,
        tuning: Tuning,
        seed: u64,
    ) -> Result<Self, TrackError> {
        settings.validate()?;
        let mut rng = Pcg32::seed_from_u64(seed);
        let generator = TrackGenerator::new(tuning, &mut rng)?;

        let root = host.spawn(Template::Track);
        host.set_local_transform(root, Transform::IDENTITY);
        log::info!("Track session started with seed {seed}");

        Ok(Self {
            host,
            root,
            generator,
            rng,
            settings,
            tier: Tier::FIRST,
            window: VecDeque::new(),
        })
    }

    /// Advance the track one step around the observer
    pub fn tick(&mut self, observer: &mut Observer) -> Result<TickReport, TrackError> {
        let mut report = TickReport {
            tier_advanced: self.advance_tier(observer.distance()),
            ..TickReport::default()
        };

        while self.generator.cursor_z() - observer.z() < self.settings.look_ahead {
            let segment = self.generator.generate(self.tier, &mut self.rng)?;
            self.materialize(&segment)?;
            report.segments_generated += 1;
        }

        report.reclaimed = self.reclaim(observer.z());

        if self.generator.cursor_z() >= self.settings.rebase_threshold {
            let distance = self.settings.rebase_threshold;
            self.rebase(distance, observer);
            report.rebased_by = Some(distance);
        }

        report.tier = self.tier;
        Ok(report)
    }

    /// Destroy a live coin and credit the observer
    ///
    /// Returns false for a handle that is not a live coin, including one that
    /// was already collected or reclaimed with its segment.
    pub fn collect_coin(&mut self, coin: Handle, observer: &mut Observer) -> bool {
        for entry in self.window.iter_mut() {
            let EntryRole::Segment { coins, .. } = &mut entry.role else {
                continue;
            };
            if let Some(i) = coins.iter().position(|c| *c == coin) {
                coins.swap_remove(i);
                self.host.destroy(coin);
                observer.credit_coin();
                return true;
            }
        }
        false
    }

    /// Current difficulty tier
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// 1-based tier for display
    pub fn formatted_tier(&self) -> u8 {
        self.tier.formatted()
    }

    /// Forward position where the next segment starts
    pub fn cursor_z(&self) -> f32 {
        self.generator.cursor_z()
    }

    /// Carry-over generation state
    pub fn generator(&self) -> &TrackGenerator {
        &self.generator
    }

    /// Validated settings this manager runs with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Host node every segment is parented to
    pub fn root(&self) -> Handle {
        self.root
    }

    /// Scene host the track is built in
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the scene host
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Live pieces, oldest first, with their forward positions
    pub fn live_pieces(&self) -> impl Iterator<Item = (Handle, f32)> + '_ {
        self.window
            .iter()
            .filter(|e| e.role == EntryRole::Piece)
            .map(|e| (e.handle, e.z))
    }

    /// Coins not yet collected or reclaimed
    pub fn live_coins(&self) -> impl Iterator<Item = Handle> + '_ {
        self.window
            .iter()
            .flat_map(|e| match &e.role {
                EntryRole::Segment { coins, .. } => coins.as_slice(),
                EntryRole::Piece => &[][..],
            })
            .copied()
    }

    /// Live window entries, pieces and segment nodes together
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    fn advance_tier(&mut self, distance: f32) -> bool {
        let mut advanced = false;
        loop {
            let threshold = self.generator.tuning().threshold(self.tier);
            match (threshold, self.tier.next()) {
                (Some(threshold), Some(next)) if distance >= threshold => {
                    log::info!("Reached {next} at distance {distance:.1}");
                    self.tier = next;
                    advanced = true;
                }
                _ => break,
            }
        }
        advanced
    }

    fn materialize(&mut self, segment: &Segment) -> Result<(), TrackError> {
        let node = self.host.spawn(Template::Segment);
        self.host.set_parent(node, Some(self.root));
        self.host.set_local_transform(
            node,
            Transform::from_translation(Vec3::new(0.0, 0.0, segment.base_z)),
        );

        for piece in &segment.pieces {
            let handle = self.host.spawn(Template::Piece);
            self.host.set_parent(handle, Some(node));
            self.host.set_local_transform(
                handle,
                Transform::from_translation(Vec3::new(0.0, 0.0, piece.z - segment.base_z)),
            );
            for part in piece.parts() {
                let child = self.host.spawn(part.template);
                self.host.set_parent(child, Some(handle));
                self.host.set_local_transform(child, part.transform);
                if part.template == Template::Walls {
                    self.host.set_light_color(child, piece.light);
                }
            }
            self.push(WindowEntry {
                handle,
                z: piece.z,
                role: EntryRole::Piece,
            })?;
        }

        let coins = self.spawn_coins(node, segment);
        // The node goes once its hazard piece has gone
        let last_z = segment.pieces.last().map_or(segment.base_z, |p| p.z);
        self.push(WindowEntry {
            handle: node,
            z: last_z,
            role: EntryRole::Segment {
                base_z: segment.base_z,
                coins,
            },
        })
    }

    fn spawn_coins(&mut self, node: Handle, segment: &Segment) -> Vec<Handle> {
        if segment.coins.is_empty() {
            return Vec::new();
        }
        let group = self.host.spawn(Template::CoinGroup);
        self.host.set_parent(group, Some(node));
        self.host.set_local_transform(group, Transform::IDENTITY);

        let origin = Vec3::new(0.0, 0.0, segment.base_z);
        segment
            .coins
            .iter()
            .map(|marker| {
                let coin = self.host.spawn(Template::Coin);
                self.host.set_parent(coin, Some(group));
                self.host.set_local_transform(
                    coin,
                    Transform::from_translation(marker.position - origin)
                        .with_rotation(marker.rotation()),
                );
                coin
            })
            .collect()
    }

    fn push(&mut self, entry: WindowEntry) -> Result<(), TrackError> {
        if let Some(last) = self.window.back() {
            if entry.z < last.z {
                return Err(TrackError::WindowOrder {
                    z: entry.z,
                    last: last.z,
                });
            }
        }
        self.window.push_back(entry);
        Ok(())
    }

    /// Destroy every entry strictly behind `observer_z - look_back`
    fn reclaim(&mut self, observer_z: f32) -> u32 {
        let limit = observer_z - self.settings.look_back;
        let mut reclaimed = 0;
        while let Some(front) = self.window.front() {
            if front.z >= limit {
                break;
            }
            let Some(entry) = self.window.pop_front() else {
                break;
            };
            self.host.destroy(entry.handle);
            reclaimed += 1;
        }
        if reclaimed > 0 {
            log::trace!("Reclaimed {reclaimed} entries behind z={limit:.1}");
        }
        reclaimed
    }

    /// Move the whole live world back along the forward axis
    ///
    /// Runs inside one tick, so nothing observes a half-shifted world.
    fn rebase(&mut self, distance: f32, observer: &mut Observer) {
        for entry in self.window.iter_mut() {
            entry.z -= distance;
            if let EntryRole::Segment { base_z, .. } = &mut entry.role {
                *base_z -= distance;
                self.host.set_local_transform(
                    entry.handle,
                    Transform::from_translation(Vec3::new(0.0, 0.0, *base_z)),
                );
            }
        }
        self.generator.shift(distance);
        observer.shift(distance);
        log::info!(
            "Re-based world by {distance:.0}; cursor now {:.1}",
            self.generator.cursor_z()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;

    fn manager(settings: Settings, seed: u64) -> TrackManager<SceneGraph> {
        TrackManager::with_seed(SceneGraph::new(), settings, Tuning::default(), seed).unwrap()
    }

    #[test]
    fn test_first_tick_fills_look_ahead() {
        let mut m = manager(Settings::default(), 3);
        let mut o = Observer::new(0.0);
        let report = m.tick(&mut o).unwrap();

        assert!(report.segments_generated >= 1);
        assert!(m.cursor_z() >= 100.0);
        assert_eq!(report.reclaimed, 0);
        assert_eq!(report.tier, Tier::FIRST);

        let z: Vec<f32> = m.live_pieces().map(|(_, z)| z).collect();
        assert_eq!(&z[..6], &[0.0, 4.0, 8.0, 12.0, 16.0, 20.0]);
        assert!(z.windows(2).all(|w| w[1] - w[0] == 4.0));
    }

    #[test]
    fn test_pieces_sit_at_their_world_position() {
        let mut m = manager(Settings::default(), 8);
        let mut o = Observer::new(0.0);
        m.tick(&mut o).unwrap();
        for (handle, z) in m.live_pieces() {
            let p = m.host().world_position(handle).unwrap();
            assert!((p.z - z).abs() < 1e-4);
        }
    }

    #[test]
    fn test_tier_thresholds() {
        let mut m = manager(Settings::default(), 11);
        let mut o = Observer::new(0.0);

        o.advance_to(599.999);
        let r = m.tick(&mut o).unwrap();
        assert!(!r.tier_advanced);
        assert_eq!(m.formatted_tier(), 1);

        o.advance_to(600.0);
        let r = m.tick(&mut o).unwrap();
        assert!(r.tier_advanced);
        assert_eq!(m.tier().index(), 1);

        o.advance_to(1400.0);
        m.tick(&mut o).unwrap();
        assert_eq!(m.tier().index(), 2);

        o.advance_to(2300.0);
        m.tick(&mut o).unwrap();
        assert_eq!(m.tier(), Tier::LAST);

        o.advance_to(5_000.0);
        let r = m.tick(&mut o).unwrap();
        assert!(!r.tier_advanced);
        assert!(m.tier().is_terminal());
        assert_eq!(m.formatted_tier(), 4);
    }

    #[test]
    fn test_tier_catches_up_in_one_tick() {
        let mut m = manager(Settings::default(), 12);
        let mut o = Observer::new(0.0);
        o.advance_to(1500.0);
        let r = m.tick(&mut o).unwrap();
        assert!(r.tier_advanced);
        assert_eq!(r.tier.index(), 2);
    }

    #[test]
    fn test_reclaim_is_exact() {
        let mut m = manager(Settings::default(), 21);
        let mut o = Observer::new(0.0);
        m.tick(&mut o).unwrap();
        let before: Vec<(Handle, f32)> = m.live_pieces().collect();

        o.advance_to(50.0);
        m.tick(&mut o).unwrap();
        for (handle, z) in before {
            assert_eq!(m.host().contains(handle), z >= 40.0, "piece at z={z}");
        }
        assert!(m.live_pieces().all(|(_, z)| z >= 40.0));
        assert_eq!(m.host().stale_operations(), 0);
    }

    #[test]
    fn test_segment_node_outlives_its_pieces() {
        let mut m = manager(Settings::default(), 4);
        let mut o = Observer::new(0.0);
        m.tick(&mut o).unwrap();

        // Opening hazard is at z=20; observer at 29 leaves it at the limit
        o.advance_to(29.0);
        m.tick(&mut o).unwrap();
        assert_eq!(
            m.host().count(Template::Segment),
            m.generator().segments_generated() as usize
        );

        o.advance_to(30.5);
        m.tick(&mut o).unwrap();
        assert_eq!(
            m.host().count(Template::Segment),
            m.generator().segments_generated() as usize - 1
        );
        assert_eq!(m.host().stale_operations(), 0);
    }

    #[test]
    fn test_window_rejects_out_of_order_entry() {
        let mut m = manager(Settings::default(), 6);
        let mut o = Observer::new(0.0);
        m.tick(&mut o).unwrap();
        let len = m.window_len();
        let back = m.window.back().map(|e| (e.handle, e.z));

        let err = m
            .push(WindowEntry {
                handle: Handle(u64::MAX),
                z: 0.0,
                role: EntryRole::Piece,
            })
            .unwrap_err();
        assert!(matches!(err, TrackError::WindowOrder { z, .. } if z == 0.0));
        assert_eq!(m.window_len(), len);
        assert_eq!(m.window.back().map(|e| (e.handle, e.z)), back);
    }

    #[test]
    fn test_window_counts_pieces_and_segment_nodes() {
        let mut m = manager(Settings::default(), 14);
        let mut o = Observer::new(0.0);
        m.tick(&mut o).unwrap();
        let segments = m.generator().segments_generated() as usize;
        assert_eq!(m.window_len(), m.live_pieces().count() + segments);
        assert_eq!(m.settings().look_ahead, 100.0);
    }

    #[test]
    fn test_segments_hang_off_root() {
        let mut m = manager(Settings::default(), 13);
        let mut o = Observer::new(0.0);
        m.tick(&mut o).unwrap();

        let root = m.root();
        let segments = m.host().handles_of(Template::Segment);
        assert!(!segments.is_empty());
        for segment in segments {
            assert_eq!(m.host().node(segment).unwrap().parent, Some(root));
        }

        // Dropping the root on the host side takes the whole track with it
        m.host_mut().destroy(root);
        assert_eq!(m.host().count(Template::Segment), 0);
        assert_eq!(m.host().count(Template::Piece), 0);
        assert!(m.host().is_empty());
    }

    #[test]
    fn test_coins_placed_at_marker_positions() {
        let mut m = manager(Settings::default(), 5);
        let mut o = Observer::new(0.0);
        m.tick(&mut o).unwrap();
        let coins: Vec<Handle> = m.live_coins().collect();
        for coin in &coins {
            let p = m.host().world_position(*coin).unwrap();
            assert!((p.y - crate::consts::COIN_HEIGHT).abs() < 1e-4);
            assert!(p.z >= 0.0 && p.z <= m.cursor_z());
        }
        assert_eq!(m.host().count(Template::Coin), coins.len());
    }

    #[test]
    fn test_coin_collected_once() {
        let mut o = Observer::new(0.0);
        let (mut m, coin) = (0..64)
            .find_map(|seed| {
                let mut m = manager(Settings::default(), seed);
                m.tick(&mut Observer::new(0.0)).unwrap();
                let coin = m.live_coins().next();
                coin.map(|c| (m, c))
            })
            .unwrap();

        assert!(m.collect_coin(coin, &mut o));
        assert!(!m.host().contains(coin));
        assert_eq!(o.coins(), 1);
        assert!(!m.collect_coin(coin, &mut o));
        assert_eq!(o.coins(), 1);
        assert!(!m.collect_coin(Handle(u64::MAX), &mut o));
        assert_eq!(m.host().stale_operations(), 0);
    }

    #[test]
    fn test_rebase_preserves_relative_positions() {
        let settings = Settings {
            rebase_threshold: 200.0,
            ..Settings::default()
        };
        let mut m = manager(settings, 31);
        let mut o = Observer::new(0.0);
        m.tick(&mut o).unwrap();
        o.advance_to(60.0);
        m.tick(&mut o).unwrap();

        let before: Vec<(Handle, Vec3)> = m
            .live_pieces()
            .map(|(h, _)| (h, m.host().world_position(h).unwrap()))
            .collect();
        let coins_before: Vec<(Handle, Vec3)> = m
            .live_coins()
            .map(|h| (h, m.host().world_position(h).unwrap()))
            .collect();
        let cursor = m.cursor_z();
        let distance = o.distance();

        m.rebase(150.0, &mut o);

        assert_eq!(m.cursor_z(), cursor - 150.0);
        assert_eq!(o.z(), 60.0 - 150.0);
        assert_eq!(o.distance(), distance);
        for (h, p) in before.into_iter().chain(coins_before) {
            let q = m.host().world_position(h).unwrap();
            assert!((q - (p - Vec3::new(0.0, 0.0, 150.0))).length() < 1e-3);
        }
        for (h, z) in m.live_pieces() {
            assert!((m.host().world_position(h).unwrap().z - z).abs() < 1e-3);
        }
    }

    #[test]
    fn test_rebase_triggers_from_tick() {
        let settings = Settings {
            rebase_threshold: 200.0,
            ..Settings::default()
        };
        let mut m = manager(settings, 32);
        let mut o = Observer::new(0.0);
        let mut z = 0.0;
        let mut rebased = 0;
        for _ in 0..400 {
            z = o.z() + 1.0;
            o.advance_to(z);
            if let Some(d) = m.tick(&mut o).unwrap().rebased_by {
                assert_eq!(d, 200.0);
                rebased += 1;
            }
            assert!(m.cursor_z() < 200.0);
            assert!(m.cursor_z() - o.z() >= 100.0);
        }
        assert!(rebased >= 1);
        assert!(z < 200.0);
        assert!((o.distance() - 400.0).abs() < 1e-2);
        assert_eq!(m.host().stale_operations(), 0);
    }
}
