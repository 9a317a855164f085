//! Background music rotation
//!
//! Picks which song plays next; decoding and playback belong to the host.
//! Songs are dealt from a shuffled order so none repeats until every one
//! has played, and a fresh deal never opens with the song that just ended.

use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    songs: Vec<String>,
    order: Vec<usize>,
    position: usize,
    current: Option<usize>,
}

impl Playlist {
    /// Playlist over `songs`; nothing plays until the first `next_song`
    pub fn new(songs: Vec<String>) -> Self {
        Self {
            songs,
            ..Self::default()
        }
    }

    /// Number of songs
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Check if there is nothing to play
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Song currently playing
    pub fn current(&self) -> Option<&str> {
        self.current.map(|i| self.songs[i].as_str())
    }

    /// Advance to the next song
    pub fn next_song<R: Rng>(&mut self, rng: &mut R) -> Option<&str> {
        if self.songs.is_empty() {
            return None;
        }
        if self.position >= self.order.len() {
            self.deal(rng);
        }
        let index = self.order[self.position];
        self.position += 1;
        self.current = Some(index);
        log::debug!("Now playing {}", self.songs[index]);
        Some(self.songs[index].as_str())
    }

    fn deal<R: Rng>(&mut self, rng: &mut R) {
        let n = self.songs.len();
        self.order = (0..n).collect();
        self.order.shuffle(rng);
        if n > 1 && self.current == Some(self.order[0]) {
            let swap = rng.random_range(1..n);
            self.order.swap(0, swap);
        }
        self.position = 0;
    }
}
