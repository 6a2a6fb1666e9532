//! The JSON document produced for a parsed demo.
//!
//! Field names and omission rules are part of the contract with consumers of
//! the document, so every rename here is a breaking change.

use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KillEvent {
    pub killer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub assister: String,
    pub victim: String,
    pub weapon: String,
    pub headshot: bool,
    pub penetrated: bool,
    pub tick: u32,
    pub killer_pos: Position,
    pub victim_pos: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GrenadeEvent {
    pub thrower: String,
    pub grenade_type: String,
    pub position: Position,
    pub tick: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerHurtEvent {
    pub player: String,
    pub attacker: String,
    pub health: i32,
    pub armor: i32,
    pub weapon: String,
    pub damage: i32,
    pub damage_armor: i32,
    pub hit_group: String,
    pub tick: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BombEvent {
    pub player: String,
    pub site: String,
    /// One of `planted`, `defused` or `exploded`
    pub event_type: String,
    pub position: Position,
    pub tick: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoundEvent {
    pub event_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub winner: String,
    pub score_ct: i32,
    pub score_t: i32,
    pub tick: u32,
}

/// Everything collected from a single demo.
///
/// `rounds` is keyed by round number, starting at 1. A `BTreeMap` keeps the
/// serialized key order stable between runs.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GameEvents {
    pub kills: Vec<KillEvent>,
    pub grenades: Vec<GrenadeEvent>,
    pub player_hurts: Vec<PlayerHurtEvent>,
    pub bomb_events: Vec<BombEvent>,
    pub round_events: Vec<RoundEvent>,
    pub rounds: BTreeMap<u32, Vec<KillEvent>>,
}
