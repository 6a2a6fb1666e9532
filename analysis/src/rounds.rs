#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WinReason {
    StillInProgress,
    BombExploded,
    VipEscaped,
    VipKilled,
    TSaved,
    CtStoppedEscape,
    RoundEndReasonTerroristsStopped,
    BombDefused,
    TKilled,
    CTKilled,
    Draw,
    HostageRescued,
    TimeRanOut,
    RoundEndReasonHostagesNotRescued,
    TerroristsNotEscaped,
    VipNotEscaped,
    GameStart,
    TSurrender,
    CTSurrender,
    TPlanted,
    CTReachedHostage,
}

// https://github.com/markus-wa/demoinfocs-golang/blob/205b0bb25e9f3e96e1d306d154199b4a6292940e/pkg/demoinfocs/events/events.go#L53
pub static ROUND_WIN_REASON: phf::Map<i32, WinReason> = phf::phf_map! {
    0_i32 => WinReason::StillInProgress,
    1_i32 => WinReason::BombExploded,
    2_i32 => WinReason::VipEscaped,
    3_i32 => WinReason::VipKilled,
    4_i32 => WinReason::TSaved,
    5_i32 => WinReason::CtStoppedEscape,
    6_i32 => WinReason::RoundEndReasonTerroristsStopped,
    7_i32 => WinReason::BombDefused,
    8_i32 => WinReason::TKilled,
    9_i32 => WinReason::CTKilled,
    10_i32 => WinReason::Draw,
    11_i32 => WinReason::HostageRescued,
    12_i32 => WinReason::TimeRanOut,
    13_i32 => WinReason::RoundEndReasonHostagesNotRescued,
    14_i32 => WinReason::TerroristsNotEscaped,
    15_i32 => WinReason::VipNotEscaped,
    16_i32 => WinReason::GameStart,
    17_i32 => WinReason::TSurrender,
    18_i32 => WinReason::CTSurrender,
    19_i32 => WinReason::TPlanted,
    20_i32 => WinReason::CTReachedHostage,
};

pub const TEAM_TERRORISTS: i32 = 2;
pub const TEAM_COUNTER_TERRORISTS: i32 = 3;

impl WinReason {
    pub fn label(&self) -> &'static str {
        match self {
            // All terrorists dead means the CTs won and the other way around
            Self::TKilled => "ct_win",
            Self::CTKilled => "terrorists_win",
            Self::BombDefused => "bomb_defused",
            _ => "unknown",
        }
    }
}

pub fn round_end_label(code: i32) -> &'static str {
    ROUND_WIN_REASON
        .get(&code)
        .map(|r| r.label())
        .unwrap_or("unknown")
}

pub fn winner_label(team: i32) -> &'static str {
    match team {
        TEAM_TERRORISTS => "Terrorists",
        TEAM_COUNTER_TERRORISTS => "Counter-Terrorists",
        _ => "none",
    }
}
