// Bounded per-player input log used to replay a player's past moves on an echo clone.

use crate::domain::geometry::Vec2;
use crate::domain::state::PlayerInput;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRecord {
    pub at: u64,
    pub input: PlayerInput,
    /// Where the player stood when the input was applied.
    pub pos: Vec2,
}

#[derive(Debug, Clone)]
pub struct InputHistory {
    records: VecDeque<InputRecord>,
    /// Records older than `newest - retain_ms` are evicted, except the one still in effect.
    retain_ms: u64,
}

impl InputHistory {
    pub fn new(retain_ms: u64) -> Self {
        Self {
            records: VecDeque::new(),
            retain_ms,
        }
    }

    pub fn push(&mut self, at: u64, input: PlayerInput, pos: Vec2) {
        // Timestamps only move forward; a stale record would break the backward scan.
        if self.records.back().is_some_and(|last| last.at > at) {
            return;
        }
        self.records.push_back(InputRecord { at, input, pos });

        let cutoff = at.saturating_sub(self.retain_ms);
        // Keep the newest record at-or-before the cutoff so lookups right at the edge still hit.
        while self.records.len() > 1 && self.records[1].at <= cutoff {
            self.records.pop_front();
        }
    }

    /// Latest record at or before `at`.
    pub fn at_or_before(&self, at: u64) -> Option<&InputRecord> {
        self.records.iter().rev().find(|r| r.at <= at)
    }
}
