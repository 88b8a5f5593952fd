//! Retired dog records
//!
//! The tick loop hands every retired dog to a [`RetiredDogSink`]. The
//! in-memory [`Leaderboard`] keeps them ranked for queries.

use std::cmp::Ordering;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::sim::RetiredDog;

/// Largest page `Leaderboard::top` returns
pub const MAX_PAGE: usize = 100;

/// Receiver of retired dogs, called once per tick with that tick's retirees
pub trait RetiredDogSink: Send + Sync {
    fn record(&self, dogs: &[RetiredDog]);
}

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
    pub play_time: Duration,
}

impl LeaderboardEntry {
    /// Higher score first, then shorter play time, then name
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then(self.play_time.cmp(&other.play_time))
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Ranked leaderboard, safe to share between the ticker and readers
#[derive(Debug, Default)]
pub struct Leaderboard {
    entries: Mutex<Vec<LeaderboardEntry>>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record at its rank; returns the 1-indexed rank
    pub fn add(&self, entry: LeaderboardEntry) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let pos = entries.partition_point(|e| e.rank_cmp(&entry) != Ordering::Greater);
        entries.insert(pos, entry);
        pos + 1
    }

    /// Up to `limit` entries (capped at [`MAX_PAGE`]) starting at rank `offset`
    pub fn top(&self, offset: usize, limit: usize) -> Vec<LeaderboardEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .skip(offset)
            .take(limit.min(MAX_PAGE))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RetiredDogSink for Leaderboard {
    fn record(&self, dogs: &[RetiredDog]) {
        for dog in dogs {
            self.add(LeaderboardEntry {
                name: dog.name.clone(),
                score: dog.score,
                play_time: dog.play_time,
            });
        }
    }
}
