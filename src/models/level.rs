//! Experience level bands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named progression tier. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    /// 0 - 499 XP
    #[default]
    Novice,
    /// 500 - 999 XP
    Apprentice,
    /// 1000 - 1999 XP
    #[serde(rename = "Master in Motion")]
    MasterInMotion,
    /// 2000+ XP
    #[serde(rename = "Life Hacker")]
    LifeHacker,
}

impl Level {
    pub const ALL: [Level; 4] = [
        Level::Novice,
        Level::Apprentice,
        Level::MasterInMotion,
        Level::LifeHacker,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Level::Novice => "Novice",
            Level::Apprentice => "Apprentice",
            Level::MasterInMotion => "Master in Motion",
            Level::LifeHacker => "Life Hacker",
        }
    }

    /// Inclusive XP lower bound of this band.
    pub fn floor(&self) -> f64 {
        match self {
            Level::Novice => 0.0,
            Level::Apprentice => 500.0,
            Level::MasterInMotion => 1000.0,
            Level::LifeHacker => 2000.0,
        }
    }

    /// Exclusive XP upper bound; `None` for the top band.
    pub fn ceiling(&self) -> Option<f64> {
        match self {
            Level::Novice => Some(500.0),
            Level::Apprentice => Some(1000.0),
            Level::MasterInMotion => Some(2000.0),
            Level::LifeHacker => None,
        }
    }

    /// Band containing `xp`.
    pub fn for_xp(xp: f64) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|level| xp >= level.floor())
            .unwrap_or_default()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Level band and progress derived from an XP total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub level: Level,
    /// Linear position within the band, clamped to 0-100
    pub progress: f64,
    pub next_level_xp: Option<f64>,
}

impl LevelProgress {
    pub fn for_xp(xp: f64) -> Self {
        let level = Level::for_xp(xp);
        let floor = level.floor();
        let (progress, next_level_xp) = match level.ceiling() {
            Some(ceiling) => (((xp - floor) / (ceiling - floor)) * 100.0, Some(ceiling)),
            None => (100.0, None),
        };
        Self {
            level,
            progress: progress.clamp(0.0, 100.0),
            next_level_xp,
        }
    }
}
