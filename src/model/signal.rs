use serde::Serialize;

/// Spread trade direction.
///
/// Long spread means long leg Y and short `hedge` units of leg X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadDirection {
    Long,
    Short,
}

impl SpreadDirection {
    /// `+1.0` for long spread, `-1.0` for short spread.
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    EnterLongSpread,
    EnterShortSpread,
    #[default]
    NoEvent,
}

impl Signal {
    pub fn direction(self) -> Option<SpreadDirection> {
        match self {
            Self::EnterLongSpread => Some(SpreadDirection::Long),
            Self::EnterShortSpread => Some(SpreadDirection::Short),
            Self::NoEvent => None,
        }
    }

    pub fn entering(direction: SpreadDirection) -> Self {
        match direction {
            SpreadDirection::Long => Self::EnterLongSpread,
            SpreadDirection::Short => Self::EnterShortSpread,
        }
    }

    pub fn is_event(self) -> bool {
        self != Self::NoEvent
    }
}
