//! Eye state and fatigue levels

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Blink state machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EyeState {
    #[default]
    Open,
    Blinking,
}

impl EyeState {
    /// Cosmetic label: an open-state eye currently under the close threshold reads as "CLOSED"
    pub fn display_label(&self, avg_ear: f32, close_threshold: f32) -> &'static str {
        match self {
            EyeState::Blinking => "BLINKING",
            EyeState::Open if avg_ear < close_threshold => "CLOSED",
            EyeState::Open => "OPEN",
        }
    }
}

/// Fatigue level derived from PERCLOS
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FatigueLevel {
    #[default]
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl FatigueLevel {
    /// Map PERCLOS (0-100) to a level; each boundary belongs to the higher band
    pub fn classify(perclos: f64) -> Self {
        if perclos >= 50.0 {
            FatigueLevel::Severe
        } else if perclos >= 30.0 {
            FatigueLevel::Moderate
        } else if perclos >= 15.0 {
            FatigueLevel::Mild
        } else {
            FatigueLevel::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FatigueLevel::Normal => "NORMAL",
            FatigueLevel::Mild => "MILD",
            FatigueLevel::Moderate => "MODERATE",
            FatigueLevel::Severe => "SEVERE",
        }
    }
}

impl fmt::Display for FatigueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FatigueLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(FatigueLevel::Normal),
            "MILD" => Ok(FatigueLevel::Mild),
            "MODERATE" => Ok(FatigueLevel::Moderate),
            "SEVERE" => Ok(FatigueLevel::Severe),
            other => Err(format!("unknown fatigue level: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(FatigueLevel::classify(0.0), FatigueLevel::Normal);
        assert_eq!(FatigueLevel::classify(14.9), FatigueLevel::Normal);
        assert_eq!(FatigueLevel::classify(15.0), FatigueLevel::Mild);
        assert_eq!(FatigueLevel::classify(29.9), FatigueLevel::Mild);
        assert_eq!(FatigueLevel::classify(30.0), FatigueLevel::Moderate);
        assert_eq!(FatigueLevel::classify(49.9), FatigueLevel::Moderate);
        assert_eq!(FatigueLevel::classify(50.0), FatigueLevel::Severe);
        assert_eq!(FatigueLevel::classify(100.0), FatigueLevel::Severe);
    }

    #[test]
    fn test_round_trip_names() {
        for level in [
            FatigueLevel::Normal,
            FatigueLevel::Mild,
            FatigueLevel::Moderate,
            FatigueLevel::Severe,
        ] {
            assert_eq!(level.to_string().parse::<FatigueLevel>(), Ok(level));
        }
        assert!("drowsy".parse::<FatigueLevel>().is_err());
    }

    #[test]
    fn test_display_label() {
        assert_eq!(EyeState::Open.display_label(0.32, 0.25), "OPEN");
        assert_eq!(EyeState::Open.display_label(0.20, 0.25), "CLOSED");
        assert_eq!(EyeState::Blinking.display_label(0.27, 0.25), "BLINKING");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&EyeState::Blinking).unwrap(), "\"BLINKING\"");
        assert_eq!(serde_json::to_string(&FatigueLevel::Moderate).unwrap(), "\"MODERATE\"");
    }

    proptest! {
        #[test]
        fn prop_monotonic(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(FatigueLevel::classify(lo) <= FatigueLevel::classify(hi));
        }
    }
}
