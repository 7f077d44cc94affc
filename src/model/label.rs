use serde::{Deserialize, Serialize};

/// Qualitative reading of a percentile, ten equal buckets with inclusive upper bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "Extreme dip")]
    ExtremeDip,
    #[serde(rename = "Very big dip")]
    VeryBigDip,
    #[serde(rename = "Big dip")]
    BigDip,
    #[serde(rename = "Dip")]
    Dip,
    #[serde(rename = "Small dip")]
    SmallDip,
    #[serde(rename = "Around average")]
    AroundAverage,
    #[serde(rename = "Small pump")]
    SmallPump,
    #[serde(rename = "Pump")]
    Pump,
    #[serde(rename = "Big pump")]
    BigPump,
    #[serde(rename = "Extreme pump")]
    ExtremePump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelTone {
    Dip,
    Neutral,
    Pump,
}

impl Label {
    /// `percentile` is a fraction in `[0, 1]`. NaN falls through to the top bucket,
    /// callers handle the undefined case before asking.
    pub fn from_percentile(percentile: f64) -> Self {
        if percentile <= 0.1 {
            Self::ExtremeDip
        } else if percentile <= 0.2 {
            Self::VeryBigDip
        } else if percentile <= 0.3 {
            Self::BigDip
        } else if percentile <= 0.4 {
            Self::Dip
        } else if percentile <= 0.5 {
            Self::SmallDip
        } else if percentile <= 0.6 {
            Self::AroundAverage
        } else if percentile <= 0.7 {
            Self::SmallPump
        } else if percentile <= 0.8 {
            Self::Pump
        } else if percentile <= 0.9 {
            Self::BigPump
        } else {
            Self::ExtremePump
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExtremeDip => "Extreme dip",
            Self::VeryBigDip => "Very big dip",
            Self::BigDip => "Big dip",
            Self::Dip => "Dip",
            Self::SmallDip => "Small dip",
            Self::AroundAverage => "Around average",
            Self::SmallPump => "Small pump",
            Self::Pump => "Pump",
            Self::BigPump => "Big pump",
            Self::ExtremePump => "Extreme pump",
        }
    }

    pub fn tone(self) -> LabelTone {
        match self {
            Self::ExtremeDip | Self::VeryBigDip | Self::BigDip | Self::Dip | Self::SmallDip => {
                LabelTone::Dip
            }
            Self::AroundAverage => LabelTone::Neutral,
            Self::SmallPump | Self::Pump | Self::BigPump | Self::ExtremePump => LabelTone::Pump,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_bounds_are_inclusive() {
        assert_eq!(Label::from_percentile(0.0), Label::ExtremeDip);
        assert_eq!(Label::from_percentile(0.1), Label::ExtremeDip);
        assert_eq!(Label::from_percentile(0.100_001), Label::VeryBigDip);
        assert_eq!(Label::from_percentile(0.5), Label::SmallDip);
        assert_eq!(Label::from_percentile(0.6), Label::AroundAverage);
        assert_eq!(Label::from_percentile(0.9), Label::BigPump);
        assert_eq!(Label::from_percentile(1.0), Label::ExtremePump);
    }

    #[test]
    fn tone_groups_labels_into_bands() {
        assert_eq!(Label::ExtremeDip.tone(), LabelTone::Dip);
        assert_eq!(Label::SmallDip.tone(), LabelTone::Dip);
        assert_eq!(Label::AroundAverage.tone(), LabelTone::Neutral);
        assert_eq!(Label::SmallPump.tone(), LabelTone::Pump);
        assert_eq!(Label::ExtremePump.tone(), LabelTone::Pump);
    }

    #[test]
    fn serializes_as_display_text() {
        assert_eq!(
            serde_json::to_value(Label::VeryBigDip).unwrap(),
            serde_json::json!("Very big dip")
        );
        assert_eq!(Label::VeryBigDip.to_string(), "Very big dip");
        assert_eq!(
            serde_json::to_value(LabelTone::Neutral).unwrap(),
            serde_json::json!("neutral")
        );
    }
}
