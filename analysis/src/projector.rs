use common::demo_events::{
    BombEvent, GameEvents, GrenadeEvent, KillEvent, PlayerHurtEvent, Position, RoundEvent,
};

use crate::events::{resolve, DemoEvent, GameState, PlayerRef, StateEvent};

/// Accumulates the records of a single demo.
///
/// The only context carried between events is the current round number and
/// whether that round is part of the warmup. Everything else is read from the
/// [`GameState`] handed in with each event.
#[derive(Debug)]
pub struct Projector {
    round: u32,
    warmup: bool,
    result: GameEvents,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new()
    }
}

impl Projector {
    pub fn new() -> Self {
        Self {
            round: 0,
            // Nothing before the first round start counts
            warmup: true,
            result: GameEvents::default(),
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_warmup(&self) -> bool {
        self.warmup
    }

    pub fn handle(&mut self, state: &GameState, event: DemoEvent) {
        match event {
            DemoEvent::RoundStart => {
                self.round += 1;
                self.warmup = state.warmup;

                tracing::trace!(round = self.round, warmup = self.warmup, "Round start");
            }
            DemoEvent::Kill { .. } if self.warmup => {}
            DemoEvent::Kill {
                killer,
                victim,
                assister,
                weapon,
                headshot,
                penetrated_objects,
            } => {
                let (killer, killer_pos) = resolve(killer.as_ref());
                let (victim, victim_pos) = resolve(victim.as_ref());

                let kill = KillEvent {
                    killer,
                    assister: assister.map(|a| a.name).unwrap_or_default(),
                    victim,
                    weapon: weapon.unwrap_or_default(),
                    headshot,
                    penetrated: penetrated_objects > 0,
                    tick: state.tick,
                    killer_pos,
                    victim_pos,
                };

                self.result.kills.push(kill.clone());
                self.result.rounds.entry(self.round).or_default().push(kill);
            }
            DemoEvent::GrenadeDetonate { .. } if self.warmup => {}
            DemoEvent::GrenadeDetonate {
                thrower,
                kind,
                position,
            } => {
                self.result.grenades.push(GrenadeEvent {
                    thrower: thrower.map(|t| t.name).unwrap_or_default(),
                    grenade_type: kind.label().to_owned(),
                    position,
                    tick: state.tick,
                });
            }
            DemoEvent::PlayerHurt { .. } if self.warmup => {}
            DemoEvent::PlayerHurt {
                victim,
                attacker,
                health,
                armor,
                weapon,
                damage,
                damage_armor,
                hit_group,
            } => {
                self.result.player_hurts.push(PlayerHurtEvent {
                    player: victim.map(|v| v.name).unwrap_or_default(),
                    attacker: attacker.map(|a| a.name).unwrap_or_default(),
                    health,
                    armor,
                    weapon: weapon.unwrap_or_default(),
                    damage,
                    damage_armor,
                    hit_group: hit_group.label().to_owned(),
                    tick: state.tick,
                });
            }
            DemoEvent::BombPlanted { player, site } => {
                self.bomb(state, "planted", player, site);
            }
            DemoEvent::BombDefused { player, site } => {
                self.bomb(state, "defused", player, site);
            }
            DemoEvent::BombExploded { site } => {
                self.bomb(state, "exploded", None, site);
            }
            DemoEvent::RoundEnd { reason, winner } => {
                self.result.round_events.push(RoundEvent {
                    event_type: "end".to_owned(),
                    reason: crate::rounds::round_end_label(reason).to_owned(),
                    winner: crate::rounds::winner_label(winner).to_owned(),
                    score_ct: state.score_ct,
                    score_t: state.score_t,
                    tick: state.tick,
                });
            }
        };
    }

    fn bomb(
        &mut self,
        state: &GameState,
        event_type: &str,
        player: Option<PlayerRef>,
        site: Option<String>,
    ) {
        let (player, position): (String, Position) = resolve(player.as_ref());

        self.result.bomb_events.push(BombEvent {
            player,
            site: site.unwrap_or_default(),
            event_type: event_type.to_owned(),
            position,
            tick: state.tick,
        });
    }

    pub fn finish(self) -> GameEvents {
        self.result
    }
}

/// Runs every event through a fresh [`Projector`].
///
/// Stops at the first error, in which case nothing collected so far is
/// returned.
pub fn project<I, E>(events: I) -> Result<GameEvents, E>
where
    I: IntoIterator<Item = Result<StateEvent, E>>,
{
    let mut projector = Projector::new();
    for event in events {
        let StateEvent { state, event } = event?;
        projector.handle(&state, event);
    }

    Ok(projector.finish())
}
