use crate::domain::events::RoomEvent;
use crate::domain::geometry::{Arena, Vec2, circles_overlap};
use crate::domain::state::{Entity, EntityId, Projectile, ProjectileId, ProjectileKind};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct ProjectileConfig {
    pub dt: f32,
    pub now_ms: u64,
    pub arena: Arena,
    /// Hit-testing only runs while damage is allowed (match in progress).
    pub allow_damage: bool,
    pub cull_margin: f32,
    pub rehit_ms: u64,
    pub deflect_speed_factor: f32,
    pub deflect_min_ttl: f32,
    pub bouncer_max_speed: f32,
    pub bouncer_shrink: f32,
}

/// Room-specific rules the engine consults while resolving a tick.
pub trait CollisionHooks {
    /// Local time scale at a position (time bubbles).
    fn speed_multiplier(&self, _pos: Vec2) -> f32 {
        1.0
    }

    /// Targets that cannot be hit at all right now (phase dash).
    fn is_invulnerable(&self, _target: EntityId) -> bool {
        false
    }

    /// Per-projectile suppression (nova burst hit window).
    fn ignore_hit(&self, _projectile: &Projectile, _target: EntityId) -> bool {
        false
    }

    /// Spends one shield charge on a non-slash projectile. Returns true when the hit is blocked.
    /// Slashes never reach this: a shielded target skips them outright.
    fn absorb_with_shield(&mut self, target: &mut Entity, projectile: &Projectile) -> bool {
        if projectile.is_slash() || target.shield == 0 {
            return false;
        }
        target.shield -= 1;
        true
    }

    fn on_hit(&mut self, _projectile: &Projectile, _target: EntityId) {}

    fn on_death(&mut self, _victim: &Entity, _by_root_id: EntityId) {}
}

/// Advances every projectile by one tick and resolves collisions.
///
/// Order matters: integrate and handle walls, let slashes deflect other projectiles,
/// hit-test what is still alive, then drop everything marked for removal. Deflected
/// projectiles join the live set only after hit-testing.
pub fn tick_projectiles<H: CollisionHooks>(
    entities: &mut BTreeMap<EntityId, Entity>,
    projectiles: &mut BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: &mut u64,
    events: &mut Vec<RoomEvent>,
    hooks: &mut H,
    cfg: ProjectileConfig,
) {
    let mut removed: HashSet<ProjectileId> = HashSet::new();

    integrate(projectiles, hooks, &cfg, &mut removed);
    let deflected = deflect_with_slashes(projectiles, next_projectile_id, &cfg, &mut removed);
    if cfg.allow_damage {
        resolve_hits(entities, projectiles, events, hooks, &cfg, &mut removed);
    }

    projectiles.retain(|id, _| !removed.contains(id));
    for p in deflected {
        projectiles.insert(p.id, p);
    }
}

fn integrate<H: CollisionHooks>(
    projectiles: &mut BTreeMap<ProjectileId, Projectile>,
    hooks: &H,
    cfg: &ProjectileConfig,
    removed: &mut HashSet<ProjectileId>,
) {
    for (id, p) in projectiles.iter_mut() {
        let scale = hooks.speed_multiplier(p.pos);
        p.pos = p.pos.add(p.vel.scale(cfg.dt * scale));
        p.ttl -= cfg.dt;
        if p.ttl <= 0.0 {
            removed.insert(*id);
            continue;
        }

        match p.kind {
            ProjectileKind::Bouncer { .. } => {
                if !bounce_off_walls(p, cfg) {
                    removed.insert(*id);
                }
            }
            // Slashes are short-lived sweeps; their ttl is the only limit.
            ProjectileKind::Slash { .. } => {}
            ProjectileKind::Standard | ProjectileKind::Nova { .. } => {
                if !cfg.arena.contains_with_margin(p.pos, cfg.cull_margin) {
                    removed.insert(*id);
                }
            }
        }
    }
}

/// Reflects a bouncer off whichever walls it crossed. Returns false once its budget runs out.
fn bounce_off_walls(p: &mut Projectile, cfg: &ProjectileConfig) -> bool {
    let ProjectileKind::Bouncer { bounces_left } = &mut p.kind else {
        return true;
    };

    let r = p.radius;
    let (w, h) = (cfg.arena.width, cfg.arena.height);
    let mut crossed = false;
    if p.pos.x - r < 0.0 {
        p.pos.x = r;
        p.vel.x = p.vel.x.abs();
        crossed = true;
    } else if p.pos.x + r > w {
        p.pos.x = w - r;
        p.vel.x = -p.vel.x.abs();
        crossed = true;
    }
    if p.pos.y - r < 0.0 {
        p.pos.y = r;
        p.vel.y = p.vel.y.abs();
        crossed = true;
    } else if p.pos.y + r > h {
        p.pos.y = h - r;
        p.vel.y = -p.vel.y.abs();
        crossed = true;
    }
    if !crossed {
        return true;
    }

    *bounces_left = bounces_left.saturating_sub(1);
    if *bounces_left == 0 {
        return false;
    }

    let speed = p.vel.len();
    if speed > 0.0 {
        let boosted = (speed * 2.0).min(cfg.bouncer_max_speed.max(speed));
        p.vel = p.vel.scale(boosted / speed);
    }
    p.damage = p.damage.saturating_mul(2);
    p.radius *= cfg.bouncer_shrink;
    true
}

fn deflect_with_slashes(
    projectiles: &mut BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: &mut u64,
    cfg: &ProjectileConfig,
    removed: &mut HashSet<ProjectileId>,
) -> Vec<Projectile> {
    let slash_ids: Vec<ProjectileId> = projectiles
        .iter()
        .filter(|(id, p)| p.is_slash() && !removed.contains(*id))
        .map(|(id, _)| *id)
        .collect();

    let mut spawned = Vec::new();
    for slash_id in slash_ids {
        let Some(slash) = projectiles.get(&slash_id) else {
            continue;
        };
        let ProjectileKind::Slash { reflects_left } = slash.kind else {
            continue;
        };
        if reflects_left == 0 {
            continue;
        }
        let Some(dir) = slash.vel.normalized() else {
            continue;
        };
        let (slash_pos, slash_r) = (slash.pos, slash.radius);
        let (owner_id, root_id) = (slash.owner_id, slash.root_id);

        let mut budget = reflects_left;
        for (id, p) in projectiles.iter() {
            if budget == 0 {
                break;
            }
            if *id == slash_id || p.is_slash() || removed.contains(id) {
                continue;
            }
            if !circles_overlap(slash_pos, slash_r, p.pos, p.radius) {
                continue;
            }

            removed.insert(*id);
            budget -= 1;
            let speed = p.vel.len() * cfg.deflect_speed_factor;
            let new_id = *next_projectile_id;
            *next_projectile_id = next_projectile_id.wrapping_add(1);
            spawned.push(Projectile {
                id: new_id,
                owner_id,
                root_id,
                pos: p.pos,
                vel: dir.scale(speed),
                ttl: p.ttl.max(cfg.deflect_min_ttl),
                radius: p.radius,
                damage: p.damage,
                kind: ProjectileKind::Standard,
                rehit_until: Default::default(),
                portal: p.portal,
            });
            debug!(slash_id, deflected_id = *id, new_id, "projectile deflected");
        }

        if let Some(slash) = projectiles.get_mut(&slash_id) {
            slash.kind = ProjectileKind::Slash {
                reflects_left: budget,
            };
        }
    }
    spawned
}

fn resolve_hits<H: CollisionHooks>(
    entities: &mut BTreeMap<EntityId, Entity>,
    projectiles: &mut BTreeMap<ProjectileId, Projectile>,
    events: &mut Vec<RoomEvent>,
    hooks: &mut H,
    cfg: &ProjectileConfig,
    removed: &mut HashSet<ProjectileId>,
) {
    // Naive O(P*E); rooms hold at most a dozen bodies plus echoes.
    let target_ids: Vec<EntityId> = entities.keys().copied().collect();
    for (pid, p) in projectiles.iter_mut() {
        if removed.contains(pid) {
            continue;
        }

        for &tid in &target_ids {
            let Some(target) = entities.get_mut(&tid) else {
                continue;
            };
            if !target.alive {
                continue;
            }
            // Only bouncers may come back for the one who fired them.
            if !p.is_bouncer() && target.root_id() == p.root_id {
                continue;
            }
            if hooks.is_invulnerable(tid) || hooks.ignore_hit(p, tid) {
                continue;
            }
            if !circles_overlap(target.pos, target.radius, p.pos, p.radius) {
                continue;
            }
            // A shield turns a slash away harmlessly; the charge stays.
            if p.is_slash() && target.shield > 0 {
                continue;
            }
            if p.survives_hits() {
                if p.rehit_until.get(&tid).is_some_and(|until| *until > cfg.now_ms) {
                    continue;
                }
                p.rehit_until.insert(tid, cfg.now_ms + cfg.rehit_ms);
            }

            if hooks.absorb_with_shield(target, p) {
                events.push(if target.shield == 0 {
                    RoomEvent::ShieldBreak { target_id: tid }
                } else {
                    RoomEvent::ShieldHit {
                        target_id: tid,
                        charges_left: target.shield,
                    }
                });
                removed.insert(*pid);
                break;
            }

            hooks.on_hit(p, tid);
            if damage_entity(entities, tid, p.damage, p.owner_id, p.root_id, events) {
                if let Some(victim) = entities.get(&tid) {
                    hooks.on_death(victim, p.root_id);
                }
            }

            if !p.survives_hits() {
                removed.insert(*pid);
                break;
            }
        }
    }
}

/// Applies damage and scoring to one entity. Returns true if this call killed it.
///
/// The victim's deaths and the credited root's kills move together; killing yourself or
/// your own echo counts as a death only.
pub fn damage_entity(
    entities: &mut BTreeMap<EntityId, Entity>,
    target_id: EntityId,
    damage: i32,
    by_id: EntityId,
    by_root_id: EntityId,
    events: &mut Vec<RoomEvent>,
) -> bool {
    let Some(target) = entities.get_mut(&target_id) else {
        return false;
    };
    if !target.alive || damage <= 0 {
        return false;
    }

    target.hp = (target.hp - damage).max(0);
    events.push(RoomEvent::Hit {
        target_id,
        by_id,
        by_root_id,
        damage,
        hp: target.hp,
        pos: target.pos,
    });
    if target.hp > 0 {
        return false;
    }

    target.alive = false;
    target.deaths += 1;
    let victim_root = target.root_id();
    let pos = target.pos;
    events.push(RoomEvent::Death {
        target_id,
        by_root_id,
        pos,
    });
    if victim_root != by_root_id {
        if let Some(killer) = entities.get_mut(&by_root_id) {
            killer.kills += 1;
        }
    }
    debug!(victim_id = target_id, by_root_id, "entity killed");
    true
}
