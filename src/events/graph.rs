use log::trace;
use serde::Serialize;

use crate::error::{Diagnostics, Warning};
use crate::events::{BehaviorClass, Dispatch, EventType, SignalKind, INERT};
use crate::ids::IdType;
use crate::level::{EventRecord, LevelData};
use crate::simulation::{Host, WorldContext};

/// Timers within this margin of zero count as elapsed.
const TIMER_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NodePhase {
    Idle,
    /// Delay running; `on` is the value that started it.
    Timing { remaining: f32, on: bool },
    /// Cyclic timer waiting for its next firing.
    Cycling { remaining: f32, fired: u32 },
    /// Continuous effect; `None` runs until deactivated.
    Running { remaining: Option<f32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FiringKind {
    /// One-shot firing: run the effect, then activate the links.
    Fire,
    /// Per-tick application of a running continuous effect.
    Continue,
    /// A continuous effect ran out or was cancelled.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Firing {
    /// Index into [`LevelData::events`].
    pub node: usize,
    pub on: bool,
    pub kind: FiringKind,
}

#[derive(Debug, Clone)]
pub struct EventNode {
    id: i32,
    event_type: Option<EventType>,
    dispatch: Dispatch,
    phase: NodePhase,
    toggled: bool,
    condition: bool,
    cancel: bool,
    fire_count: u32,
}

impl EventNode {
    fn new(record: &EventRecord) -> Self {
        Self {
            id: record.id,
            event_type: record.event_type,
            dispatch: record.event_type.map_or(INERT, EventType::dispatch),
            phase: NodePhase::Idle,
            toggled: false,
            condition: false,
            cancel: false,
            fire_count: 0,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn event_type(&self) -> Option<EventType> {
        self.event_type
    }

    pub fn behavior(&self) -> BehaviorClass {
        self.dispatch.behavior
    }

    /// Link type this node's effect acts on and never forwards to.
    pub fn consumes(&self) -> IdType {
        self.dispatch.consumes
    }

    pub fn phase(&self) -> NodePhase {
        self.phase
    }

    pub fn fire_count(&self) -> u32 {
        self.fire_count
    }

    fn start_timer(&mut self, record: &EventRecord, on: bool) {
        match self.phase {
            NodePhase::Idle => {
                trace!("event {} timing {:.2}s (on = {on})", self.id, record.delay);
                self.phase = NodePhase::Timing {
                    remaining: record.delay.max(0.0),
                    on,
                };
            }
            _ => trace!("event {} already busy, activation ignored", self.id),
        }
    }

    fn fire(&mut self, index: usize, on: bool, kind: FiringKind, out: &mut Vec<Firing>) {
        if kind == FiringKind::Fire {
            self.fire_count += 1;
        }
        out.push(Firing {
            node: index,
            on,
            kind,
        });
    }
}

/// Runtime state of every event record, index-aligned with
/// [`LevelData::events`].
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    nodes: Vec<EventNode>,
}

impl LinkGraph {
    pub fn new(level: &LevelData, diagnostics: &mut Diagnostics) -> Self {
        let nodes = level
            .events
            .iter()
            .map(|record| {
                if record.event_type.is_none() {
                    diagnostics.report(Warning::UnknownEventType {
                        id: record.id,
                        class_name: record.class_name.clone(),
                    });
                }
                EventNode::new(record)
            })
            .collect();
        Self { nodes }
    }

    pub fn nodes(&self) -> &[EventNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&EventNode> {
        self.nodes.get(index)
    }

    pub fn start(&mut self) -> Vec<Firing> {
        let mut out = Vec::new();
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if node.dispatch.behavior == BehaviorClass::StartTrigger {
                node.fire(index, true, FiringKind::Fire, &mut out);
            }
        }
        out
    }

    /// Hands an activation to node `index`.
    ///
    /// A node starts timing only from rest; activations that arrive while it
    /// is busy are dropped. An `off` activation cancels cyclic timers and
    /// continuous effects on the next tick.
    pub fn deliver(
        &mut self,
        index: usize,
        on: bool,
        level: &LevelData,
        diagnostics: &mut Diagnostics,
    ) {
        let (Some(node), Some(record)) = (self.nodes.get_mut(index), level.events.get(index)) else {
            return;
        };
        match node.dispatch.behavior {
            BehaviorClass::None => {
                diagnostics.report(Warning::InertEvent {
                    id: record.id,
                    class_name: record.class_name.clone(),
                });
            }
            BehaviorClass::StartTrigger | BehaviorClass::Detector => {
                trace!("event {} is not activated by links", record.id);
            }
            BehaviorClass::Signal(SignalKind::Cyclic) | BehaviorClass::ContinuousEffect => {
                if on {
                    node.start_timer(record, on);
                } else if node.phase != NodePhase::Idle {
                    node.cancel = true;
                }
            }
            BehaviorClass::Signal(_) | BehaviorClass::Effect => node.start_timer(record, on),
        }
    }

    /// Advances every node by `dt` and returns the firings in node order.
    pub fn tick(
        &mut self,
        dt: f32,
        ctx: &WorldContext<'_>,
        host: &dyn Host,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Firing> {
        let mut out = Vec::new();
        for (index, node) in self.nodes.iter_mut().enumerate() {
            let Some(record) = ctx.level.events.get(index) else {
                continue;
            };

            if node.dispatch.behavior == BehaviorClass::Detector {
                let now = detector_condition(record, ctx, host, diagnostics);
                if now && !node.condition {
                    node.fire(index, true, FiringKind::Fire, &mut out);
                }
                node.condition = now;
                continue;
            }

            if node.cancel {
                node.cancel = false;
                if matches!(node.phase, NodePhase::Running { .. }) {
                    node.fire(index, false, FiringKind::Stop, &mut out);
                }
                trace!("event {} cancelled", node.id);
                node.phase = NodePhase::Idle;
                continue;
            }

            match node.phase {
                NodePhase::Idle => {}
                NodePhase::Timing { remaining, on } => {
                    let remaining = remaining - dt;
                    if remaining > TIMER_EPSILON {
                        node.phase = NodePhase::Timing { remaining, on };
                    } else {
                        node.phase = NodePhase::Idle;
                        elapse(index, node, record, on, diagnostics, &mut out);
                    }
                }
                NodePhase::Cycling { remaining, fired } => {
                    let remaining = remaining - dt;
                    if remaining > TIMER_EPSILON {
                        node.phase = NodePhase::Cycling { remaining, fired };
                    } else {
                        node.fire(index, true, FiringKind::Fire, &mut out);
                        node.phase = cycle_after(record, fired + 1, remaining);
                    }
                }
                NodePhase::Running { remaining } => {
                    node.fire(index, true, FiringKind::Continue, &mut out);
                    match remaining.map(|left| left - dt) {
                        Some(left) if left <= TIMER_EPSILON => {
                            node.fire(index, false, FiringKind::Stop, &mut out);
                            node.phase = NodePhase::Idle;
                        }
                        left => node.phase = NodePhase::Running { remaining: left },
                    }
                }
            }
        }
        out
    }
}

fn elapse(
    index: usize,
    node: &mut EventNode,
    record: &EventRecord,
    on: bool,
    diagnostics: &mut Diagnostics,
    out: &mut Vec<Firing>,
) {
    match node.dispatch.behavior {
        BehaviorClass::Signal(SignalKind::Passthrough) | BehaviorClass::Effect => {
            node.fire(index, on, FiringKind::Fire, out);
        }
        BehaviorClass::Signal(SignalKind::Invert) => node.fire(index, !on, FiringKind::Fire, out),
        BehaviorClass::Signal(SignalKind::Toggle) => {
            node.toggled = !node.toggled;
            let state = node.toggled;
            node.fire(index, state, FiringKind::Fire, out);
        }
        BehaviorClass::Signal(SignalKind::Cyclic) => {
            if record.params.float1 <= 0.0 {
                diagnostics.report(Warning::MalformedRecord {
                    id: record.id,
                    reason: format!("cyclic timer interval {} is not positive", record.params.float1),
                });
                node.fire(index, true, FiringKind::Fire, out);
                return;
            }
            node.fire(index, true, FiringKind::Fire, out);
            node.phase = cycle_after(record, 1, 0.0);
        }
        BehaviorClass::ContinuousEffect => {
            node.fire(index, true, FiringKind::Fire, out);
            let duration = record.params.float1;
            node.phase = NodePhase::Running {
                remaining: (duration > 0.0).then_some(duration),
            };
        }
        BehaviorClass::StartTrigger | BehaviorClass::Detector | BehaviorClass::None => {}
    }
}

/// Phase of a cyclic timer that has fired `fired` times. `overshoot` is the
/// non-positive time left when the last interval ran out.
fn cycle_after(record: &EventRecord, fired: u32, overshoot: f32) -> NodePhase {
    let limit = record.params.int1;
    let done = u32::try_from(limit).is_ok_and(|limit| limit > 0 && fired >= limit);
    if done || record.params.float1 <= 0.0 {
        NodePhase::Idle
    } else {
        NodePhase::Cycling {
            remaining: record.params.float1 + overshoot,
            fired,
        }
    }
}

fn detector_condition(
    record: &EventRecord,
    ctx: &WorldContext<'_>,
    host: &dyn Host,
    diagnostics: &mut Diagnostics,
) -> bool {
    match record.event_type {
        Some(EventType::WhenCountdownOver) => host.countdown_value().is_some_and(|value| value <= 0.0),
        Some(EventType::WhenCountdownReaches) => host
            .countdown_value()
            .is_some_and(|value| value <= record.params.int1 as f32),
        _ => {
            let watched = ctx
                .ids
                .resolve_links(record.id, &record.links, IdType::All, diagnostics);
            host.detector_condition(record, &watched)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdTable;
    use crate::level::EventParams;
    use crate::simulation::NullHost;

    fn event(id: i32, kind: EventType, delay: f32) -> EventRecord {
        EventRecord {
            id,
            class_name: kind.name().to_string(),
            event_type: Some(kind),
            delay,
            ..EventRecord::default()
        }
    }

    fn level(events: Vec<EventRecord>) -> LevelData {
        LevelData {
            events,
            ..LevelData::default()
        }
    }

    fn run(graph: &mut LinkGraph, level: &LevelData, ticks: usize, dt: f32) -> Vec<Vec<Firing>> {
        let ids = IdTable::new();
        let ctx = WorldContext { level, ids: &ids };
        let mut diagnostics = Diagnostics::new();
        (0..ticks)
            .map(|_| graph.tick(dt, &ctx, &NullHost, &mut diagnostics))
            .collect()
    }

    #[test]
    fn busy_node_ignores_second_activation() {
        let level = level(vec![event(1, EventType::Message, 2.0)]);
        let mut diagnostics = Diagnostics::new();
        let mut graph = LinkGraph::new(&level, &mut diagnostics);
        graph.deliver(0, true, &level, &mut diagnostics);
        let mut firings = run(&mut graph, &level, 1, 0.5);
        graph.deliver(0, true, &level, &mut diagnostics);
        firings.extend(run(&mut graph, &level, 5, 0.5));
        let fired_at: Vec<_> = firings
            .iter()
            .enumerate()
            .filter(|(_, tick)| !tick.is_empty())
            .map(|(tick, _)| tick + 1)
            .collect();
        assert_eq!(fired_at, vec![4]);
        assert_eq!(graph.node(0).unwrap().fire_count(), 1);
    }

    #[test]
    fn signal_outputs() {
        let level = level(vec![
            event(1, EventType::Invert, 0.0),
            event(2, EventType::Switch, 0.0),
        ]);
        let mut diagnostics = Diagnostics::new();
        let mut graph = LinkGraph::new(&level, &mut diagnostics);

        graph.deliver(0, true, &level, &mut diagnostics);
        graph.deliver(1, true, &level, &mut diagnostics);
        let first = run(&mut graph, &level, 1, 0.1).remove(0);
        assert!(!first[0].on);
        assert!(first[1].on);

        graph.deliver(1, true, &level, &mut diagnostics);
        let second = run(&mut graph, &level, 1, 0.1).remove(0);
        assert!(!second[0].on);
    }

    #[test]
    fn cyclic_timer_repeats_then_stops() {
        let mut timer = event(1, EventType::CyclicTimer, 0.0);
        timer.params = EventParams {
            float1: 1.0,
            int1: 3,
            ..EventParams::default()
        };
        let level = level(vec![timer]);
        let mut diagnostics = Diagnostics::new();
        let mut graph = LinkGraph::new(&level, &mut diagnostics);
        graph.deliver(0, true, &level, &mut diagnostics);
        let fired = run(&mut graph, &level, 10, 0.5)
            .iter()
            .filter(|tick| !tick.is_empty())
            .count();
        assert_eq!(fired, 3);
        assert_eq!(graph.node(0).unwrap().phase(), NodePhase::Idle);
    }

    #[test]
    fn off_cancels_continuous_effect_on_next_tick() {
        let level = level(vec![event(1, EventType::ShakePlayer, 0.0)]);
        let mut diagnostics = Diagnostics::new();
        let mut graph = LinkGraph::new(&level, &mut diagnostics);
        graph.deliver(0, true, &level, &mut diagnostics);
        let ticks = run(&mut graph, &level, 3, 0.1);
        assert_eq!(ticks[0][0].kind, FiringKind::Fire);
        assert_eq!(ticks[2][0].kind, FiringKind::Continue);

        graph.deliver(0, false, &level, &mut diagnostics);
        let ticks = run(&mut graph, &level, 2, 0.1);
        assert_eq!(ticks[0][0].kind, FiringKind::Stop);
        assert!(ticks[1].is_empty());
    }

    #[test]
    fn start_triggers_and_inert_nodes() {
        let mut unknown = event(3, EventType::Message, 0.0);
        unknown.class_name = "Bogus".into();
        unknown.event_type = None;
        let level = level(vec![
            event(1, EventType::GoalCreate, 0.0),
            event(2, EventType::DropPointMarker, 0.0),
            unknown,
        ]);
        let mut diagnostics = Diagnostics::new();
        let mut graph = LinkGraph::new(&level, &mut diagnostics);
        assert_eq!(diagnostics.warnings().len(), 1);

        let started = graph.start();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].node, 0);

        graph.deliver(1, true, &level, &mut diagnostics);
        graph.deliver(2, true, &level, &mut diagnostics);
        assert_eq!(diagnostics.warnings().len(), 3);
        assert!(run(&mut graph, &level, 2, 0.1).iter().all(Vec::is_empty));
    }
}
