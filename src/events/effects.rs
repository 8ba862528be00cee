use log::{debug, trace};

use crate::error::Warning;
use crate::events::graph::{Firing, FiringKind};
use crate::events::{BehaviorClass, EventType};
use crate::ids::Binding;
use crate::level::EventRecord;
use crate::simulation::{Command, Host, Runtime, WorldContext};

/// Runs the effect for `firing` and forwards the activation to the node's
/// links, minus the link type the effect consumed.
pub fn handle(
    firing: Firing,
    dt: f32,
    ctx: &WorldContext<'_>,
    runtime: &mut Runtime,
    host: &mut dyn Host,
) {
    let Some(record) = ctx.level.events.get(firing.node) else {
        return;
    };
    let Some(kind) = record.event_type else {
        return;
    };
    if runtime.world.is_removed(record.id) {
        trace!("event {} was removed, firing dropped", record.id);
        return;
    }
    match firing.kind {
        FiringKind::Fire => {
            let dispatch = kind.dispatch();
            let forward = match dispatch.behavior {
                BehaviorClass::Effect | BehaviorClass::StartTrigger => {
                    apply(kind, record, firing.on, ctx, runtime, host)
                }
                _ => true,
            };
            if forward {
                runtime.forward(ctx, record.id, &record.links, dispatch.consumes, firing.on);
            }
        }
        FiringKind::Continue => continuous(kind, record, dt, runtime, host),
        FiringKind::Stop => runtime.commands.push(Command::ContinuousStopped {
            event_id: record.id,
            kind,
        }),
    }
}

/// Applies a one-shot effect. Returns whether the node forwards.
fn apply(
    kind: EventType,
    record: &EventRecord,
    on: bool,
    ctx: &WorldContext<'_>,
    runtime: &mut Runtime,
    host: &mut dyn Host,
) -> bool {
    use EventType as E;

    let params = &record.params;
    let consumed = kind.dispatch().consumes;
    let targets = ctx
        .ids
        .resolve_links(record.id, &record.links, consumed, &mut runtime.diagnostics);

    match kind {
        E::MoverPause => {
            for target in &targets {
                if let Some(mover) = runtime.movers.get_mut(target.path.index) {
                    mover.pause(on);
                }
            }
        }
        E::ParticleState | E::BoltState | E::PushRegionState | E::SetLightState => {
            for target in &targets {
                runtime.set_enabled(*target, on);
            }
        }
        E::GoalCheck => {
            let value = runtime.world.goal(&params.str1);
            debug!("goal '{}' = {value}, need {}", params.str1, params.int1);
            return value >= params.int1;
        }
        _ if !on => trace!("event {} ignores off activation", record.id),
        _ => one_shot(kind, record, targets, ctx, runtime, host),
    }
    true
}

fn one_shot(
    kind: EventType,
    record: &EventRecord,
    targets: Vec<Binding>,
    ctx: &WorldContext<'_>,
    runtime: &mut Runtime,
    host: &mut dyn Host,
) {
    use EventType as E;

    let params = &record.params;
    let position = record.transform.position;
    let command = match kind {
        E::GoalCreate => {
            runtime.world.set_goal(&params.str1, params.int1);
            None
        }
        E::GoalSet => {
            if params.bool1 {
                runtime.world.set_goal(&params.str1, params.int1);
            } else {
                runtime.world.increment_goal(&params.str1);
            }
            None
        }
        E::ReverseMover => {
            for target in &targets {
                let index = target.path.index;
                if let (Some(mover), Some(group)) = (
                    runtime.movers.get_mut(index),
                    ctx.level.moving_groups.get(index),
                ) {
                    mover.reverse(group, params.bool1);
                }
            }
            None
        }
        E::ModifyRotatingMover => {
            if params.float1 > 0.0 {
                for target in &targets {
                    if let Some(mover) = runtime.movers.get_mut(target.path.index) {
                        mover.set_speed_scale(params.float1);
                    }
                }
            } else {
                runtime.diagnostics.report(Warning::MalformedRecord {
                    id: record.id,
                    reason: format!("speed scale {} is not positive", params.float1),
                });
            }
            None
        }
        E::SetGravity => {
            runtime.world.set_gravity(params.float1);
            Some(Command::SetGravity {
                gravity: params.float1,
            })
        }
        E::RemoveObject => {
            for target in targets {
                if runtime.world.remove(target.id) {
                    runtime.commands.push(Command::Remove { target });
                }
            }
            None
        }
        E::SpawnObject => {
            for target in targets {
                host.instantiate_prefab(target, &record.transform);
            }
            None
        }
        E::PlayVclip => {
            host.play_effect(&params.str1, &record.transform);
            None
        }
        E::Teleport => Some(Command::Teleport {
            event_id: record.id,
            targets,
            destination: record.transform,
        }),
        E::TeleportPlayer => Some(Command::TeleportOccupant {
            event_id: record.id,
            destination: record.transform,
        }),
        E::SlayObject => {
            runtime
                .commands
                .extend(targets.into_iter().map(|target| Command::Slay { target }));
            None
        }
        E::PlaySound => Some(Command::PlaySound {
            event_id: record.id,
            sound: params.str1.clone(),
            position,
            volume: params.float1,
            looping: params.bool1,
        }),
        E::Message => Some(Command::Message {
            event_id: record.id,
            text: params.str1.clone(),
        }),
        E::Explode => Some(Command::Explosion {
            position,
            radius: params.float1,
            damage: params.float2,
        }),
        E::CountdownBegin => Some(Command::CountdownBegin {
            seconds: params.int1,
        }),
        E::CountdownEnd => Some(Command::CountdownEnd),
        E::LoadLevel => Some(Command::LoadLevel {
            name: params.str1.clone(),
        }),
        E::Endgame => Some(Command::Endgame),
        _ => Some(Command::Delegate {
            event_id: record.id,
            kind,
            targets,
        }),
    };
    if let Some(command) = command {
        runtime.commands.push(command);
    }
}

/// Per-tick application of a running continuous effect.
fn continuous(
    kind: EventType,
    record: &EventRecord,
    dt: f32,
    runtime: &mut Runtime,
    host: &mut dyn Host,
) {
    match kind {
        EventType::ContinuousDamage => {
            if let Some(occupant) = host.active_occupant() {
                runtime.commands.push(Command::Damage {
                    handle: occupant.handle,
                    amount: record.params.int1 as f32 * dt,
                });
            }
        }
        _ => runtime.commands.push(Command::ContinuousTick {
            event_id: record.id,
            kind,
            dt,
        }),
    }
}
