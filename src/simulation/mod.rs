mod command;
mod host;
mod world;

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Diagnostics, Warning};
use crate::events::effects;
use crate::events::graph::LinkGraph;
use crate::force::ForceRegion;
use crate::ids::{Binding, IdTable, IdType};
use crate::level::{LevelData, NO_ID};
use crate::mover::{Motion, Mover, MoverStep};
use crate::trigger::Trigger;

pub use command::Command;
pub use host::{Host, NullHost, Occupant};
pub use world::WorldState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Queued activations delivered per tick; the rest wait for the next.
    pub max_activations_per_tick: usize,
    /// World gravity before any Set_Gravity event.
    pub gravity: f32,
    /// Step used by [`Simulation::run_for`].
    pub fixed_dt: f32,
    /// Upper bound on the ticks a single [`Simulation::run_for`] call runs.
    pub max_run_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_activations_per_tick: 4096,
            gravity: -9.81,
            fixed_dt: 1.0 / 60.0,
            max_run_ticks: 216_000,
        }
    }
}

/// Read-only view of the level handed to component ticks.
#[derive(Debug, Clone, Copy)]
pub struct WorldContext<'a> {
    pub level: &'a LevelData,
    pub ids: &'a IdTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    /// ID of the node that sent it, or [`NO_ID`] for external activations.
    pub source: i32,
    pub target: Binding,
    pub on: bool,
}

/// Mutable runtime state shared with the effect handlers.
#[derive(Debug, Default)]
pub struct Runtime {
    pub triggers: Vec<Trigger>,
    pub movers: Vec<Mover>,
    pub forces: Vec<ForceRegion>,
    pub world: WorldState,
    pub commands: Vec<Command>,
    pub diagnostics: Diagnostics,
    pub pending: VecDeque<Activation>,
}

impl Runtime {
    /// Queues `on` for every resolved link whose type is not `consumed`.
    pub fn forward(
        &mut self,
        ctx: &WorldContext<'_>,
        from: i32,
        links: &[i32],
        consumed: IdType,
        on: bool,
    ) {
        for target in ctx
            .ids
            .resolve_links(from, links, IdType::All, &mut self.diagnostics)
        {
            if consumed.matches(target.kind()) {
                continue;
            }
            trace!("{from} -> {} ({:?}, on = {on})", target.id, target.kind());
            self.pending.push_back(Activation {
                source: from,
                target,
                on,
            });
        }
    }

    pub fn set_enabled(&mut self, target: Binding, enabled: bool) {
        self.world.set_enabled(target.id, enabled);
        self.commands.push(Command::SetEnabled { target, enabled });
    }

    fn trigger_fired(&mut self, ctx: &WorldContext<'_>, index: usize) {
        let Some(record) = ctx.level.triggers.get(index) else {
            return;
        };
        self.forward(ctx, record.id, &record.links, IdType::None, true);
        if record.switch_id != NO_ID {
            self.commands.push(Command::PulseSwitch {
                trigger_id: record.id,
                switch_id: record.switch_id,
            });
        }
    }

    fn apply_mover_step(&mut self, ctx: &WorldContext<'_>, index: usize, step: MoverStep) {
        let Some(group) = ctx.level.moving_groups.get(index) else {
            return;
        };
        let owner = group.keyframes.first().map_or(NO_ID, |key| key.id);
        if step.motion != Motion::None {
            let members = ctx
                .ids
                .resolve_links(owner, &group.members, IdType::All, &mut self.diagnostics);
            for member in &members {
                self.world.apply_motion(ctx.level, *member, step.motion);
            }
            self.commands.push(Command::MoveGroup {
                group: index,
                members,
                motion: step.motion,
            });
        }
        if let Some(id) = step.arrival_trigger {
            match ctx.ids.resolve(id) {
                Some(target) => self.pending.push_back(Activation {
                    source: owner,
                    target,
                    on: true,
                }),
                None => {
                    self.diagnostics.report(Warning::Unresolved {
                        from: owner,
                        id,
                        expected: IdType::All,
                    });
                }
            }
        }
    }
}

/// Delivers one activation to whatever its target resolved to.
fn deliver(
    graph: &mut LinkGraph,
    runtime: &mut Runtime,
    ctx: &WorldContext<'_>,
    activation: Activation,
) {
    let Activation { target, on, .. } = activation;
    if runtime.world.is_removed(target.id) {
        trace!("{} was removed, activation dropped", target.id);
        return;
    }
    let index = target.path.index;
    match target.kind() {
        IdType::Event => graph.deliver(index, on, ctx.level, &mut runtime.diagnostics),
        IdType::Trigger => {
            let fired = match (runtime.triggers.get_mut(index), ctx.level.triggers.get(index)) {
                (Some(trigger), Some(record)) => trigger.fire(record),
                _ => false,
            };
            if fired {
                runtime.trigger_fired(ctx, index);
            }
        }
        IdType::Keyframe => {
            if let Some(mover) = runtime.movers.get_mut(index) {
                mover.activate(on);
            }
        }
        IdType::PushRegion | IdType::ParticleEmitter | IdType::BoltEmitter | IdType::Light => {
            runtime.set_enabled(target, on);
        }
        _ => runtime.commands.push(Command::Activate { target, on }),
    }
}

#[derive(Debug)]
pub struct Simulation {
    level: Arc<LevelData>,
    ids: IdTable,
    config: SimulationConfig,
    graph: LinkGraph,
    runtime: Runtime,
    time: f32,
    ticks: u64,
    started: bool,
}

impl Simulation {
    /// Binds every ID and builds the runtime objects. All bindings exist
    /// before the first tick.
    pub fn new(level: Arc<LevelData>, config: SimulationConfig) -> Self {
        let mut diagnostics = Diagnostics::new();
        let ids = IdTable::from_level(&level, &mut diagnostics);
        let graph = LinkGraph::new(&level, &mut diagnostics);
        let triggers = level
            .triggers
            .iter()
            .enumerate()
            .map(|(index, record)| Trigger::new(index, record))
            .collect();
        let movers = level
            .moving_groups
            .iter()
            .enumerate()
            .map(|(index, group)| Mover::new(index, group, &mut diagnostics))
            .collect();
        let forces = level
            .push_regions
            .iter()
            .enumerate()
            .map(|(index, record)| ForceRegion::new(index, record))
            .collect();
        let world = WorldState::new(&level, config.gravity);
        info!(
            "simulating '{}': {} ids, {} events, {} triggers, {} movers, {} force regions",
            level.display_name(),
            ids.len(),
            level.events.len(),
            level.triggers.len(),
            level.moving_groups.len(),
            level.push_regions.len()
        );
        Self {
            level,
            ids,
            config,
            graph,
            runtime: Runtime {
                triggers,
                movers,
                forces,
                world,
                commands: Vec::new(),
                diagnostics,
                pending: VecDeque::new(),
            },
            time: 0.0,
            ticks: 0,
            started: false,
        }
    }

    pub fn level(&self) -> &LevelData {
        &self.level
    }

    pub fn ids(&self) -> &IdTable {
        &self.ids
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn graph(&self) -> &LinkGraph {
        &self.graph
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.runtime.triggers
    }

    pub fn movers(&self) -> &[Mover] {
        &self.runtime.movers
    }

    pub fn forces(&self) -> &[ForceRegion] {
        &self.runtime.forces
    }

    pub fn world(&self) -> &WorldState {
        &self.runtime.world
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.runtime.diagnostics
    }

    pub fn pending(&self) -> usize {
        self.runtime.pending.len()
    }

    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.runtime.commands)
    }

    /// Delivers an activation to `id` right away.
    ///
    /// Returns `false` when the ID does not resolve.
    pub fn activate(&mut self, id: i32, on: bool) -> bool {
        let Some(target) = self.ids.resolve(id) else {
            self.runtime.diagnostics.report(Warning::Unresolved {
                from: NO_ID,
                id,
                expected: IdType::All,
            });
            return false;
        };
        let ctx = WorldContext {
            level: &self.level,
            ids: &self.ids,
        };
        deliver(
            &mut self.graph,
            &mut self.runtime,
            &ctx,
            Activation {
                source: NO_ID,
                target,
                on,
            },
        );
        true
    }

    pub fn tick(&mut self, dt: f32, host: &mut dyn Host) {
        let ctx = WorldContext {
            level: &self.level,
            ids: &self.ids,
        };
        let runtime = &mut self.runtime;

        if !self.started {
            self.started = true;
            for firing in self.graph.start() {
                effects::handle(firing, dt, &ctx, runtime, host);
            }
            for index in 0..runtime.triggers.len() {
                let fired = match (runtime.triggers.get_mut(index), ctx.level.triggers.get(index)) {
                    (Some(trigger), Some(record)) => trigger.start(record),
                    _ => false,
                };
                if fired {
                    runtime.trigger_fired(&ctx, index);
                }
            }
        }

        let occupant = host.active_occupant();

        for index in 0..runtime.triggers.len() {
            let Some(record) = ctx.level.triggers.get(index) else {
                continue;
            };
            if runtime.world.is_removed(record.id) {
                continue;
            }
            let position = runtime
                .world
                .pose(record.id)
                .map_or(record.position, |pose| pose.position);
            let fired = runtime.triggers[index].tick(record, position, occupant.as_ref(), dt);
            if fired {
                runtime.trigger_fired(&ctx, index);
            }
        }

        for firing in self.graph.tick(dt, &ctx, &*host, &mut runtime.diagnostics) {
            effects::handle(firing, dt, &ctx, runtime, host);
        }

        for index in 0..runtime.movers.len() {
            let Some(group) = ctx.level.moving_groups.get(index) else {
                continue;
            };
            let step = runtime.movers[index].tick(group, dt);
            runtime.apply_mover_step(&ctx, index, step);
        }

        if let Some(occupant) = occupant {
            let mut velocity = occupant.velocity;
            let mut pushed = false;
            for force in &runtime.forces {
                let Some(record) = ctx.level.push_regions.get(force.index()) else {
                    continue;
                };
                if !runtime.world.is_enabled(record.id) || runtime.world.is_removed(record.id) {
                    continue;
                }
                if let Some(next) = force.apply(record, occupant.position, velocity, dt) {
                    velocity = next;
                    pushed = true;
                }
            }
            if pushed {
                runtime.commands.push(Command::SetOccupantVelocity {
                    handle: occupant.handle,
                    velocity,
                });
            }
        }

        let budget = self.config.max_activations_per_tick;
        let mut delivered = 0;
        while let Some(activation) = runtime.pending.pop_front() {
            if delivered == budget {
                runtime.pending.push_front(activation);
                runtime
                    .diagnostics
                    .report(Warning::ActivationBudget { budget });
                debug!("{} activations deferred", runtime.pending.len());
                break;
            }
            deliver(&mut self.graph, runtime, &ctx, activation);
            delivered += 1;
        }

        self.time += dt;
        self.ticks += 1;
    }

    /// Runs fixed steps of [`SimulationConfig::fixed_dt`] until `seconds`
    /// have elapsed, up to [`SimulationConfig::max_run_ticks`]. Returns the
    /// number of ticks run.
    pub fn run_for(&mut self, seconds: f32, host: &mut dyn Host) -> u64 {
        let dt = self.config.fixed_dt;
        if dt <= 0.0 {
            return 0;
        }
        let requested = (seconds / dt).round().max(0.0) as u64;
        let steps = requested.min(self.config.max_run_ticks);
        if steps < requested {
            warn!("run of {seconds}s needs {requested} ticks, capped at {steps}");
        }
        for _ in 0..steps {
            self.tick(dt, host);
        }
        steps
    }
}
