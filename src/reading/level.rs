use iced::Color;

/// The three severity tiers a reading is presented as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionLevel {
    Safe,
    Warning,
    Danger,
}

pub const DETECTION_LEVELS: [DetectionLevel; 3] = [
    DetectionLevel::Safe,
    DetectionLevel::Warning,
    DetectionLevel::Danger,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelColor {
    Green,
    Orange,
    Red,
}

impl LevelColor {
    pub fn color(&self) -> Color {
        match self {
            LevelColor::Green => Color::from_rgb8(0x00, 0x80, 0x00),
            LevelColor::Orange => Color::from_rgb8(0xff, 0xa5, 0x00),
            LevelColor::Red => Color::from_rgb8(0xff, 0x00, 0x00),
        }
    }
}

impl DetectionLevel {
    pub fn label(&self) -> &'static str {
        match self {
            DetectionLevel::Safe => "Safe",
            DetectionLevel::Warning => "Warning",
            DetectionLevel::Danger => "Danger",
        }
    }

    pub fn color(&self) -> LevelColor {
        match self {
            DetectionLevel::Safe => LevelColor::Green,
            DetectionLevel::Warning => LevelColor::Orange,
            DetectionLevel::Danger => LevelColor::Red,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DetectionLevel::Safe => "Safe level of organophosphates.",
            DetectionLevel::Warning => "Moderate level. Caution is advised.",
            DetectionLevel::Danger => "High level of organophosphates. Act immediately!",
        }
    }

    pub fn details(&self) -> &'static [&'static str] {
        match self {
            DetectionLevel::Safe => &[
                "No organophosphate markers above the threshold.",
                "The sample can be consumed after regular washing.",
            ],
            DetectionLevel::Warning => &[
                "Organophosphate markers were found in small amounts.",
                "Wash the product thoroughly and consider a second reading.",
            ],
            DetectionLevel::Danger => &[
                "Organophosphate markers exceed the safe threshold.",
                "Do not consume the product.",
                "Report the batch to its supplier.",
            ],
        }
    }

    /// Illustration shown next to the result.
    pub fn illustration(&self) -> &'static str {
        match self {
            DetectionLevel::Safe => "images/tano_happy.jpeg",
            DetectionLevel::Warning => "images/tano_worried.jpeg",
            DetectionLevel::Danger => "images/tano_scared.jpeg",
        }
    }
}

impl std::fmt::Display for DetectionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn levels_are_distinct() {
        let labels: HashSet<&str> = DETECTION_LEVELS.iter().map(|level| level.label()).collect();
        let illustrations: HashSet<&str> = DETECTION_LEVELS.iter().map(|level| level.illustration()).collect();

        assert_eq!(labels.len(), 3);
        assert_eq!(illustrations.len(), 3);
        assert!(DETECTION_LEVELS.iter().all(|level| !level.details().is_empty()));
    }
}
