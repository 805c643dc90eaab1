use crate::domain::registry::Registry;
use crate::domain::state::{Facing, Player, PlayerId, Position};
use tracing::info;

/// Damage applied to the single victim of an attack.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub victim_id: PlayerId,
    pub victim_health: i32,
    pub victim_position: Position,
}

/// Bookkeeping for an attack that brought the victim to zero health or below.
#[derive(Debug, Clone, PartialEq)]
pub struct Kill {
    // Attacker state after its kill count was incremented.
    pub killer: Player,
    pub victim_id: PlayerId,
    pub victim_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttackOutcome {
    pub hit: Hit,
    pub kill: Option<Kill>,
}

/// Returns true if a victim at `victim` can be struck by an attacker at `attacker`.
///
/// Range is a strict distance check. The facing test is a half-plane on the x axis with
/// no vertical restriction: a left attack lands on victims with a larger x, a right attack
/// on victims with a smaller x.
pub fn in_reach(attacker: Position, victim: Position, facing: Facing, range: f64) -> bool {
    let dx = victim.x - attacker.x;
    let dy = victim.y - attacker.y;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance >= range {
        return false;
    }

    match facing {
        Facing::Left => dx > 0.0,
        Facing::Right => dx < 0.0,
    }
}

/// Resolves one attack against the registry.
///
/// At most one victim is hit: the first living player in enumeration order that is in
/// reach. Returns `None` when the attacker is missing or dead, or nothing is in reach; in
/// that case no state is touched.
pub fn resolve_attack(
    registry: &mut Registry,
    attacker_id: PlayerId,
    facing: Facing,
) -> Option<AttackOutcome> {
    let range = registry.tuning().attack_range;
    let damage = registry.tuning().attack_damage;

    let attacker = registry.get(attacker_id).ok()?;
    if !attacker.is_alive() {
        return None;
    }
    let origin = attacker.position;

    let victim_idx = registry.players().iter().position(|v| {
        v.id != attacker_id && v.is_alive() && in_reach(origin, v.position, facing, range)
    })?;

    let players = registry.players_mut();
    let victim = &mut players[victim_idx];
    victim.health -= damage;

    let hit = Hit {
        victim_id: victim.id,
        victim_health: victim.health,
        victim_position: victim.position,
    };
    info!(
        victim_id = hit.victim_id,
        attacker_id,
        victim_hp = hit.victim_health,
        "player hit"
    );

    if victim.is_alive() {
        return Some(AttackOutcome { hit, kill: None });
    }

    let victim_name = victim.name.clone();
    let killer = players.iter_mut().find(|p| p.id == attacker_id)?;
    killer.kills += 1;
    info!(
        victim_id = hit.victim_id,
        attacker_id,
        kills = killer.kills,
        "player killed"
    );

    Some(AttackOutcome {
        kill: Some(Kill {
            killer: killer.clone(),
            victim_id: hit.victim_id,
            victim_name,
        }),
        hit,
    })
}
