//! Drives the `csdemo` parser and turns its output into [`StateEvent`]s.

use std::collections::HashMap;

use csdemo::structured::{ccsteam::CCSTeam, pawnid::PawnID};

use crate::events::{DemoEvent, GameState, GrenadeKind, HitGroup, PlayerRef, Position, StateEvent};

const WARMUP_PROP: &str = "CCSGameRulesProxy.CCSGameRules.m_bWarmupPeriod";

const CELL_PROPS: [&str; 3] = [
    "CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_cellX",
    "CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_cellY",
    "CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_cellZ",
];
const VEC_PROPS: [&str; 3] = [
    "CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_vecX",
    "CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_vecY",
    "CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_vecZ",
];

const CELL_WIDTH: f32 = (1 << 9) as f32;
const MAX_COORD: f32 = (1 << 14) as f32;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("parsing demo container: {0}")]
    Container(String),
    #[error("decoding demo frames: {0}")]
    Frames(String),
}

/// Parses a complete demo and projects its events.
#[tracing::instrument(skip(buf), fields(size = buf.len()))]
pub fn parse(buf: &[u8]) -> Result<common::demo_events::GameEvents, ParseError> {
    let events = decode(buf)?;
    tracing::debug!("Decoded {} events", events.len());

    crate::project(events.into_iter().map(Ok))
}

/// Decodes the demo into the ordered stream of events the projector consumes,
/// each paired with the game state at the time it was fired.
pub fn decode(buf: &[u8]) -> Result<Vec<StateEvent>, ParseError> {
    let container =
        csdemo::Container::parse(buf).map_err(|e| ParseError::Container(format!("{:?}", e)))?;
    let output = csdemo::parser::parse(
        csdemo::FrameIterator::parse(container.inner),
        csdemo::parser::EntityFilter::all(),
    )
    .map_err(|e| ParseError::Frames(format!("{:?}", e)))?;

    let mut tracker = Tracker::new(&output.player_info);
    let mut entity_ticks = output.entity_states.ticks.iter().peekable();

    let mut events = Vec::new();
    for event in output.events.iter() {
        match event {
            csdemo::DemoEvent::Tick(tick) => {
                let current = tick.tick();
                tracker.state.tick = current;

                while let Some(tick_state) = entity_ticks.next_if(|t| t.tick <= current) {
                    let _tracing_guard =
                        tracing::trace_span!("Tick", tick = ?tick_state.tick).entered();
                    tracker.apply_tick(tick_state);
                }
            }
            csdemo::DemoEvent::GameEvent(ge) => {
                if let Some(event) = tracker.convert(ge.as_ref()) {
                    events.push(StateEvent::new(tracker.state, event));
                }
            }
            _ => {}
        };
    }

    Ok(events)
}

#[derive(Debug, Default, Clone, Copy)]
struct PawnPosition {
    cell: [u32; 3],
    offset: [f32; 3],
}

impl PawnPosition {
    fn world(&self) -> Position {
        let axis = |i: usize| self.cell[i] as f32 * CELL_WIDTH - MAX_COORD + self.offset[i];
        Position::new(axis(0), axis(1), axis(2))
    }
}

struct Tracker<'p> {
    players: &'p HashMap<csdemo::UserId, csdemo::parser::Player>,
    state: GameState,
    // CCSTeam entity -> team number, the number is not repeated in every delta
    team_numbers: HashMap<i32, u32>,
    user_pawns: HashMap<csdemo::UserId, PawnID>,
    pawns: HashMap<PawnID, PawnPosition>,
}

impl<'p> Tracker<'p> {
    fn new(players: &'p HashMap<csdemo::UserId, csdemo::parser::Player>) -> Self {
        Self {
            players,
            state: GameState {
                warmup: true,
                ..Default::default()
            },
            team_numbers: HashMap::new(),
            user_pawns: HashMap::new(),
            pawns: HashMap::new(),
        }
    }

    fn apply_tick(&mut self, tick_state: &csdemo::parser::EntityTickStates) {
        for entity in tick_state.states.iter() {
            if entity.class.as_ref() == "CCSGameRulesProxy" {
                let warmup = entity
                    .get_prop(WARMUP_PROP)
                    .and_then(|p| variant_bool(&p.value));
                self.apply_rules(warmup);
            } else if entity.class.as_ref() == "CCSTeam" {
                let team = match CCSTeam::try_from(entity) {
                    Ok(t) => t,
                    Err(_) => continue,
                };

                self.apply_team(team.entity_id(), team.team_number(), team.score());
            } else if entity.class.as_ref() == "CCSPlayerPawn" {
                let cells =
                    CELL_PROPS.map(|name| entity.get_prop(name).and_then(|p| p.value.as_u32()));
                let offsets =
                    VEC_PROPS.map(|name| entity.get_prop(name).and_then(|p| p.value.as_f32()));

                self.apply_pawn(PawnID::from(entity.id), cells, offsets);
            }
        }
    }

    fn apply_rules(&mut self, warmup: Option<bool>) {
        if let Some(warmup) = warmup {
            self.state.warmup = warmup;
        }
    }

    fn apply_team(&mut self, entity_id: i32, number: Option<u32>, score: Option<i32>) {
        if let Some(number) = number {
            self.team_numbers.insert(entity_id, number);
        }

        if let Some(score) = score {
            match self.team_numbers.get(&entity_id).copied() {
                Some(2) => self.state.score_t = score,
                Some(3) => self.state.score_ct = score,
                _ => {}
            };
        }
    }

    /// Props missing from a delta keep their previous value
    fn apply_pawn(&mut self, pawn: PawnID, cells: [Option<u32>; 3], offsets: [Option<f32>; 3]) {
        let position = self.pawns.entry(pawn).or_default();

        for axis in 0..3 {
            if let Some(cell) = cells[axis] {
                position.cell[axis] = cell;
            }
            if let Some(offset) = offsets[axis] {
                position.offset[axis] = offset;
            }
        }
    }

    fn spawned(&mut self, user: csdemo::UserId, pawn: PawnID) {
        self.user_pawns.insert(user, pawn);
    }

    fn player(&self, user: Option<csdemo::UserId>) -> Option<PlayerRef> {
        let user = user?;
        let info = self.players.get(&user)?;

        let position = self
            .user_pawns
            .get(&user)
            .and_then(|pawn| self.pawns.get(pawn))
            .map(|p| p.world())
            .unwrap_or_default();

        Some(PlayerRef::new(info.name.clone(), position))
    }

    fn grenade(
        &self,
        kind: GrenadeKind,
        thrower: Option<csdemo::UserId>,
        coords: [Option<&csdemo::RawValue>; 3],
    ) -> DemoEvent {
        let thrower = self.player(thrower);

        let position = match coords.map(raw_f32) {
            [Some(x), Some(y), Some(z)] => Position::new(x, y, z),
            _ => thrower.as_ref().map(|t| t.position).unwrap_or_default(),
        };

        DemoEvent::GrenadeDetonate {
            thrower,
            kind,
            position,
        }
    }

    fn convert(&mut self, event: &csdemo::game_event::GameEvent) -> Option<DemoEvent> {
        use csdemo::game_event::GameEvent;

        let event = match event {
            GameEvent::PlayerSpawn(spawn) => {
                let pawn = match spawn.userid_pawn.as_ref() {
                    Some(csdemo::RawValue::I32(v)) => PawnID::from(*v),
                    _ => return None,
                };
                if let Some(user) = spawn.userid {
                    self.spawned(user, pawn);
                }

                return None;
            }
            GameEvent::RoundStart(_) => DemoEvent::RoundStart,
            GameEvent::RoundEnd(end) => DemoEvent::RoundEnd {
                reason: raw_i32(end.reason.as_ref()).unwrap_or(-1),
                winner: raw_i32(end.winner.as_ref()).unwrap_or(0),
            },
            GameEvent::PlayerDeath(death) => DemoEvent::Kill {
                killer: self.player(death.attacker),
                victim: self.player(death.userid),
                assister: self.player(death.assister),
                weapon: raw_string(death.weapon.as_ref()),
                headshot: raw_bool(death.headshot.as_ref()).unwrap_or(false),
                penetrated_objects: raw_i32(death.penetrated.as_ref()).unwrap_or(0),
            },
            GameEvent::PlayerHurt(hurt) => DemoEvent::PlayerHurt {
                victim: self.player(hurt.userid),
                attacker: self.player(hurt.attacker),
                health: raw_i32(hurt.health.as_ref()).unwrap_or(0),
                armor: raw_i32(hurt.armor.as_ref()).unwrap_or(0),
                weapon: raw_string(hurt.weapon.as_ref()),
                damage: raw_i32(hurt.dmg_health.as_ref()).unwrap_or(0),
                damage_armor: raw_i32(hurt.dmg_armor.as_ref()).unwrap_or(0),
                hit_group: HitGroup::from(raw_i32(hurt.hitgroup.as_ref()).unwrap_or(-1)),
            },
            GameEvent::HegrenadeDetonate(g) => self.grenade(
                GrenadeKind::HighExplosive,
                g.userid,
                [g.x.as_ref(), g.y.as_ref(), g.z.as_ref()],
            ),
            GameEvent::FlashbangDetonate(g) => self.grenade(
                GrenadeKind::Flashbang,
                g.userid,
                [g.x.as_ref(), g.y.as_ref(), g.z.as_ref()],
            ),
            GameEvent::SmokegrenadeDetonate(g) => self.grenade(
                GrenadeKind::Smoke,
                g.userid,
                [g.x.as_ref(), g.y.as_ref(), g.z.as_ref()],
            ),
            GameEvent::DecoyDetonate(g) => self.grenade(
                GrenadeKind::Decoy,
                g.userid,
                [g.x.as_ref(), g.y.as_ref(), g.z.as_ref()],
            ),
            // The fire itself does not know who threw it
            GameEvent::InfernoStartburn(g) => self.grenade(
                GrenadeKind::Incendiary,
                None,
                [g.x.as_ref(), g.y.as_ref(), g.z.as_ref()],
            ),
            GameEvent::BombPlanted(planted) => DemoEvent::BombPlanted {
                player: self.player(planted.userid),
                site: raw_site(planted.site.as_ref()),
            },
            GameEvent::BombDefused(defused) => DemoEvent::BombDefused {
                player: self.player(defused.userid),
                site: raw_site(defused.site.as_ref()),
            },
            GameEvent::BombExploded(exploded) => DemoEvent::BombExploded {
                site: raw_site(exploded.site.as_ref()),
            },
            _ => return None,
        };

        Some(event)
    }
}

fn variant_bool(value: &csdemo::parser::Variant) -> Option<bool> {
    match value {
        csdemo::parser::Variant::Bool(v) => Some(*v),
        other => other.as_u32().map(|v| v != 0),
    }
}

fn raw_i32(value: Option<&csdemo::RawValue>) -> Option<i32> {
    match value? {
        csdemo::RawValue::I32(v) => Some(*v),
        csdemo::RawValue::F32(v) => Some(*v as i32),
        csdemo::RawValue::U64(v) => Some(*v as i32),
        csdemo::RawValue::Bool(v) => Some(i32::from(*v)),
        _ => None,
    }
}

fn raw_f32(value: Option<&csdemo::RawValue>) -> Option<f32> {
    match value? {
        csdemo::RawValue::F32(v) => Some(*v),
        csdemo::RawValue::I32(v) => Some(*v as f32),
        _ => None,
    }
}

fn raw_bool(value: Option<&csdemo::RawValue>) -> Option<bool> {
    match value? {
        csdemo::RawValue::Bool(v) => Some(*v),
        other => raw_i32(Some(other)).map(|v| v != 0),
    }
}

fn raw_string(value: Option<&csdemo::RawValue>) -> Option<String> {
    match value? {
        csdemo::RawValue::String(v) => Some(v.clone()),
        _ => None,
    }
}

/// Bomb sites are reported either by name or by the index of the site entity
fn raw_site(value: Option<&csdemo::RawValue>) -> Option<String> {
    raw_string(value).or_else(|| raw_i32(value).map(|v| v.to_string()))
}
