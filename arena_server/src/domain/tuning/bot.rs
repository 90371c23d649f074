use serde::{Deserialize, Serialize};

/// Difficulty tier chosen when a room is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotDifficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

/// Per-tier bot behaviour knobs.
#[derive(Debug, Clone, Copy)]
pub struct BotTuning {
    /// Max random offset (pixels) added to the aim point.
    pub aim_jitter: f32,
    /// How often the aim point is recomputed.
    pub reaction_ms: u64,
    /// Bots only fire at targets closer than this.
    pub shoot_range: f32,
    /// Multiplier on the regular player speed.
    pub move_multiplier: f32,
    /// Advance when farther than this.
    pub far_distance: f32,
    /// Back off when closer than this.
    pub near_distance: f32,
    /// Strafe direction flips this often.
    pub strafe_flip_ms: u64,
}

impl BotTuning {
    pub fn for_difficulty(difficulty: BotDifficulty) -> Self {
        let base = Self {
            aim_jitter: 50.0,
            reaction_ms: 280,
            shoot_range: 480.0,
            move_multiplier: 0.9,
            far_distance: 320.0,
            near_distance: 160.0,
            strafe_flip_ms: 1400,
        };
        match difficulty {
            BotDifficulty::Easy => Self {
                aim_jitter: 90.0,
                reaction_ms: 450,
                shoot_range: 380.0,
                move_multiplier: 0.75,
                ..base
            },
            BotDifficulty::Normal => base,
            BotDifficulty::Hard => Self {
                aim_jitter: 22.0,
                reaction_ms: 150,
                shoot_range: 600.0,
                move_multiplier: 1.0,
                ..base
            },
        }
    }
}
