//! The events the projector consumes.
//!
//! Every event is paired with a [`GameState`] snapshot taken when the parser
//! dispatched it, so handlers never need to reach back into the parser.

pub use common::demo_events::Position;

/// A player as seen at the moment an event fired
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlayerRef {
    pub name: String,
    pub position: Position,
}

impl PlayerRef {
    pub fn new<S>(name: S, position: Position) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Resolves an optional player into its name and position, absent players
/// become an empty name at the origin.
pub fn resolve(player: Option<&PlayerRef>) -> (String, Position) {
    match player {
        Some(p) => (p.name.clone(), p.position),
        None => (String::new(), Position::default()),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub tick: u32,
    pub warmup: bool,
    pub score_t: i32,
    pub score_ct: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrenadeKind {
    HighExplosive,
    Flashbang,
    Smoke,
    Decoy,
    Incendiary,
}

impl GrenadeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::HighExplosive => "hegrenade",
            Self::Flashbang => "flashbang",
            Self::Smoke => "smokegrenade",
            Self::Decoy => "decoy",
            Self::Incendiary => "incendiary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitGroup {
    Generic,
    Head,
    Chest,
    Stomach,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    Neck,
    Gear,
    Unknown,
}

impl From<i32> for HitGroup {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::Generic,
            1 => Self::Head,
            2 => Self::Chest,
            3 => Self::Stomach,
            4 => Self::LeftArm,
            5 => Self::RightArm,
            6 => Self::LeftLeg,
            7 => Self::RightLeg,
            8 => Self::Neck,
            10 => Self::Gear,
            _ => Self::Unknown,
        }
    }
}

impl HitGroup {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Head => "head",
            Self::Chest => "chest",
            Self::Stomach => "stomach",
            Self::LeftArm => "left_arm",
            Self::RightArm => "right_arm",
            Self::LeftLeg => "left_leg",
            Self::RightLeg => "right_leg",
            Self::Neck => "neck",
            Self::Gear => "gear",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DemoEvent {
    RoundStart,
    RoundEnd {
        reason: i32,
        winner: i32,
    },
    Kill {
        killer: Option<PlayerRef>,
        victim: Option<PlayerRef>,
        assister: Option<PlayerRef>,
        weapon: Option<String>,
        headshot: bool,
        penetrated_objects: i32,
    },
    GrenadeDetonate {
        thrower: Option<PlayerRef>,
        kind: GrenadeKind,
        position: Position,
    },
    BombPlanted {
        player: Option<PlayerRef>,
        site: Option<String>,
    },
    BombDefused {
        player: Option<PlayerRef>,
        site: Option<String>,
    },
    BombExploded {
        site: Option<String>,
    },
    PlayerHurt {
        victim: Option<PlayerRef>,
        attacker: Option<PlayerRef>,
        health: i32,
        armor: i32,
        weapon: Option<String>,
        damage: i32,
        damage_armor: i32,
        hit_group: HitGroup,
    },
}

/// A single dispatch from the parser
#[derive(Debug, Clone, PartialEq)]
pub struct StateEvent {
    pub state: GameState,
    pub event: DemoEvent,
}

impl StateEvent {
    pub fn new(state: GameState, event: DemoEvent) -> Self {
        Self { state, event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hitgroup_codes() {
        assert_eq!(HitGroup::Head, HitGroup::from(1));
        assert_eq!(HitGroup::Gear, HitGroup::from(10));
        assert_eq!(HitGroup::Unknown, HitGroup::from(9));
        assert_eq!("left_leg", HitGroup::from(6).label());
    }

    #[test]
    fn resolve_absent_player() {
        assert_eq!((String::new(), Position::default()), resolve(None));

        let player = PlayerRef::new("A", Position::new(1.0, 2.0, 3.0));
        assert_eq!(("A".to_owned(), Position::new(1.0, 2.0, 3.0)), resolve(Some(&player)));
    }
}
