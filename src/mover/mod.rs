pub mod kinematics;

use glam::{Quat, Vec3};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::{Diagnostics, Warning};
use crate::level::{Keyframe, MovingGroup, NO_ID};

pub use kinematics::Profile;

/// How a group picks its next keyframe after arriving at one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SequencePolicy {
    /// Runs to the end of the path and stops.
    #[default]
    OneWay,
    /// Runs to the end, back to the start, and stops.
    PingPongOnce,
    PingPongInfinite,
    /// Runs to the end, wraps to the first keyframe, and stops there.
    LoopOnce,
    LoopInfinite,
    /// Stops at every keyframe and waits for the next activation.
    Lift,
}

impl SequencePolicy {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(SequencePolicy::OneWay),
            1 => Some(SequencePolicy::PingPongOnce),
            2 => Some(SequencePolicy::PingPongInfinite),
            3 => Some(SequencePolicy::LoopOnce),
            4 => Some(SequencePolicy::LoopInfinite),
            5 => Some(SequencePolicy::Lift),
            _ => None,
        }
    }

    pub fn repeats_forever(self) -> bool {
        matches!(
            self,
            SequencePolicy::PingPongInfinite | SequencePolicy::LoopInfinite
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MoverPhase {
    AtKeyframe {
        key: usize,
        forward: bool,
    },
    Paused {
        key: usize,
        forward: bool,
        remaining: f32,
    },
    Traveling {
        from: usize,
        to: usize,
        forward: bool,
        elapsed: f32,
        profile: Profile,
    },
}

/// Rigid motion applied to every member of a group during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Motion {
    #[default]
    None,
    Translate(Vec3),
    Rotate { rotation: Quat, pivot: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoverStep {
    pub motion: Motion,
    /// Keyframe reached during this tick.
    pub arrived: Option<usize>,
    /// ID to activate because of that arrival.
    pub arrival_trigger: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Spin {
    axis: Vec3,
    pivot: Vec3,
    /// Degrees swept per leg.
    span: f32,
}

#[derive(Debug, Clone)]
pub struct Mover {
    group: usize,
    name: String,
    policy: SequencePolicy,
    phase: MoverPhase,
    key_count: usize,
    active: bool,
    paused: bool,
    pending: Option<bool>,
    speed_scale: f32,
    time_is_speed: bool,
    spin: Option<Spin>,
    position: Vec3,
    angle: f32,
    leg_origin: f32,
    wrapped: bool,
}

impl Mover {
    pub fn new(index: usize, group: &MovingGroup, diagnostics: &mut Diagnostics) -> Self {
        let policy = SequencePolicy::from_raw(group.movement_type).unwrap_or_else(|| {
            diagnostics.report(Warning::UnknownMovementType {
                group: group.name.clone(),
                value: group.movement_type,
            });
            SequencePolicy::OneWay
        });

        let spin = match group.keyframes.first() {
            Some(first) if group.rotate_in_place => {
                let axis = first.transform.rotation_or_identity().y_axis;
                Some(Spin {
                    axis: axis.try_normalize().unwrap_or(Vec3::Y),
                    pivot: first.transform.position,
                    span: first.degrees_about_axis,
                })
            }
            _ => None,
        };
        let key_count = match (spin, group.keyframes.len()) {
            (Some(_), _) => 2,
            (None, count) => count,
        };
        if key_count < 2 {
            diagnostics.report(Warning::MalformedRecord {
                id: group.keyframes.first().map_or(NO_ID, |key| key.id),
                reason: format!("moving group '{}' has fewer than two keyframes", group.name),
            });
        }

        let start = usize::try_from(group.starting_keyframe)
            .ok()
            .filter(|key| spin.is_none() && *key < key_count)
            .unwrap_or(0);
        let position = group
            .keyframes
            .get(start)
            .map_or(Vec3::ZERO, |key| key.transform.position);

        Self {
            group: index,
            name: group.name.clone(),
            policy,
            phase: MoverPhase::AtKeyframe {
                key: start,
                forward: !group.starts_backwards,
            },
            key_count,
            active: !group.is_door && policy.repeats_forever() && key_count >= 2,
            paused: false,
            pending: None,
            speed_scale: 1.0,
            time_is_speed: group.time_is_speed,
            spin,
            position,
            angle: 0.0,
            leg_origin: 0.0,
            wrapped: false,
        }
    }

    pub fn group(&self) -> usize {
        self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> SequencePolicy {
        self.policy
    }

    pub fn phase(&self) -> MoverPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current path position. Rotating groups stay at their pivot.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Accumulated rotation in degrees for rotate-in-place groups.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn speed_scale(&self) -> f32 {
        self.speed_scale
    }

    /// Starts or stops the group. Applied at the start of the next tick.
    pub fn activate(&mut self, on: bool) {
        self.pending = Some(on);
    }

    /// Freezes or resumes travel without touching the sequence state.
    pub fn pause(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_speed_scale(&mut self, scale: f32) {
        self.speed_scale = scale.max(0.0);
    }

    /// Points the group forward or backward along its path.
    ///
    /// Mid-travel the segment is flipped and the elapsed time becomes
    /// `(1 - done) * T` of the reversed segment, where `done` is the time
    /// fraction already travelled.
    pub fn reverse(&mut self, group: &MovingGroup, go_forward: bool) {
        match self.phase {
            MoverPhase::Traveling {
                from,
                to,
                forward,
                elapsed,
                profile,
            } if forward != go_forward => {
                let done = if profile.duration() > 0.0 {
                    (elapsed / profile.duration()).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                if let Some(spin) = self.spin {
                    self.leg_origin += direction(forward) * spin.span;
                }
                let reversed = self.profile_for(group, to, from, go_forward);
                self.phase = MoverPhase::Traveling {
                    from: to,
                    to: from,
                    forward: go_forward,
                    elapsed: (1.0 - done) * reversed.duration(),
                    profile: reversed,
                };
                debug!("mover '{}' reversed at {:.0}%", self.name, done * 100.0);
            }
            MoverPhase::AtKeyframe { key, .. } => {
                self.phase = MoverPhase::AtKeyframe {
                    key,
                    forward: go_forward,
                };
            }
            MoverPhase::Paused { key, remaining, .. } => {
                self.phase = MoverPhase::Paused {
                    key,
                    forward: go_forward,
                    remaining,
                };
            }
            MoverPhase::Traveling { .. } => {}
        }
    }

    pub fn tick(&mut self, group: &MovingGroup, dt: f32) -> MoverStep {
        if let Some(on) = self.pending.take() {
            trace!("mover '{}' active = {on}", self.name);
            self.active = on;
        }
        let mut step = MoverStep::default();
        if !self.active || self.paused || self.key_count < 2 {
            return step;
        }

        let position_before = self.position;
        let angle_before = self.angle;

        match self.phase {
            MoverPhase::AtKeyframe { key, forward } => self.depart(group, key, forward, true),
            MoverPhase::Paused {
                key,
                forward,
                remaining,
            } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = MoverPhase::Paused {
                        key,
                        forward,
                        remaining,
                    };
                } else {
                    self.depart(group, key, forward, false);
                }
            }
            MoverPhase::Traveling { .. } => {}
        }

        if let MoverPhase::Traveling {
            from,
            to,
            forward,
            elapsed,
            profile,
        } = self.phase
        {
            let elapsed = elapsed + dt * self.speed_scale;
            if profile.is_finished(elapsed) {
                self.set_progress(group, from, to, forward, 1.0);
                step.arrived = Some(to);
                step.arrival_trigger = self.arrive(group, to, forward);
            } else {
                self.phase = MoverPhase::Traveling {
                    from,
                    to,
                    forward,
                    elapsed,
                    profile,
                };
                self.set_progress(group, from, to, forward, profile.progress(elapsed));
            }
        }

        step.motion = match self.spin {
            Some(spin) => {
                let delta = self.angle - angle_before;
                if delta == 0.0 {
                    Motion::None
                } else {
                    Motion::Rotate {
                        rotation: Quat::from_axis_angle(spin.axis, delta.to_radians()),
                        pivot: spin.pivot,
                    }
                }
            }
            None => {
                let delta = self.position - position_before;
                if delta == Vec3::ZERO {
                    Motion::None
                } else {
                    Motion::Translate(delta)
                }
            }
        };
        step
    }

    fn depart(&mut self, group: &MovingGroup, key: usize, forward: bool, from_rest: bool) {
        let next = self.next_leg(key, forward).or_else(|| {
            if from_rest {
                self.next_leg(key, !forward)
            } else {
                None
            }
        });
        let Some((to, forward)) = next else {
            self.stop(key, forward);
            return;
        };
        let wraps = if forward {
            key + 1 == self.key_count && to == 0
        } else {
            key == 0 && to + 1 == self.key_count
        };
        if wraps && self.policy == SequencePolicy::LoopOnce {
            self.wrapped = true;
        }
        self.leg_origin = self.angle;
        let profile = self.profile_for(group, key, to, forward);
        debug!(
            "mover '{}' departs {key} -> {to} over {:.2}s",
            self.name,
            profile.duration()
        );
        self.phase = MoverPhase::Traveling {
            from: key,
            to,
            forward,
            elapsed: 0.0,
            profile,
        };
    }

    fn arrive(&mut self, group: &MovingGroup, key: usize, forward: bool) -> Option<i32> {
        let (pause, trigger) = match self.timing_key(group, key) {
            Some(keyframe) => (keyframe.pause_time, keyframe.arrival_trigger_id),
            None => (0.0, NO_ID),
        };
        let next = match self.policy {
            SequencePolicy::Lift => None,
            _ => self.next_leg(key, forward),
        };
        match next {
            Some(_) if pause > 0.0 => {
                self.phase = MoverPhase::Paused {
                    key,
                    forward,
                    remaining: pause,
                };
            }
            Some(_) => self.phase = MoverPhase::AtKeyframe { key, forward },
            None => self.stop(key, forward),
        }
        (trigger != NO_ID).then_some(trigger)
    }

    fn stop(&mut self, key: usize, forward: bool) {
        debug!("mover '{}' stopped at keyframe {key}", self.name);
        self.phase = MoverPhase::AtKeyframe { key, forward };
        self.active = false;
        self.wrapped = false;
    }

    /// Next keyframe and direction after `key`, or `None` when the policy
    /// ends the run there.
    fn next_leg(&self, key: usize, forward: bool) -> Option<(usize, bool)> {
        let last = self.key_count.checked_sub(1)?;
        let step = |key: usize, forward: bool| {
            if forward {
                (key < last).then(|| (key + 1, true))
            } else {
                (key > 0).then(|| (key - 1, false))
            }
        };
        let wrap = |forward: bool| if forward { (0, true) } else { (last, false) };
        match self.policy {
            SequencePolicy::OneWay | SequencePolicy::Lift => step(key, forward),
            SequencePolicy::PingPongOnce => {
                step(key, forward).or_else(|| if forward { step(key, false) } else { None })
            }
            SequencePolicy::PingPongInfinite => {
                step(key, forward).or_else(|| step(key, !forward))
            }
            SequencePolicy::LoopOnce => {
                let home = if forward { 0 } else { last };
                if self.wrapped && key == home {
                    None
                } else {
                    step(key, forward).or(Some(wrap(forward)))
                }
            }
            SequencePolicy::LoopInfinite => step(key, forward).or(Some(wrap(forward))),
        }
    }

    /// Keyframe whose timing applies when leaving or reaching `key`.
    fn timing_key<'a>(&self, group: &'a MovingGroup, key: usize) -> Option<&'a Keyframe> {
        if self.spin.is_some() {
            group.keyframes.first()
        } else {
            group.keyframes.get(key)
        }
    }

    fn profile_for(&self, group: &MovingGroup, from: usize, to: usize, forward: bool) -> Profile {
        let (distance, timing) = match self.spin {
            Some(spin) => (spin.span.abs(), group.keyframes.first()),
            None => {
                let start = self.key_position(group, from);
                let end = self.key_position(group, to);
                // Segment a -> a+1 uses key a going out and coming back.
                let timing = if forward { from } else { to };
                (start.distance(end), group.keyframes.get(timing))
            }
        };
        let Some(timing) = timing else {
            return Profile::timed(distance, 0.0, 0.0, 0.0);
        };
        let time = if forward {
            timing.depart_travel_time
        } else {
            timing.return_travel_time
        };
        if self.time_is_speed {
            Profile::speed_driven(distance, time, timing.accel_time, timing.decel_time)
        } else {
            Profile::timed(distance, time, timing.accel_time, timing.decel_time)
        }
    }

    fn key_position(&self, group: &MovingGroup, key: usize) -> Vec3 {
        group
            .keyframes
            .get(key)
            .map_or(self.position, |keyframe| keyframe.transform.position)
    }

    fn set_progress(&mut self, group: &MovingGroup, from: usize, to: usize, forward: bool, p: f32) {
        match self.spin {
            Some(spin) => self.angle = self.leg_origin + direction(forward) * spin.span * p,
            None => {
                let start = self.key_position(group, from);
                let end = self.key_position(group, to);
                self.position = start.lerp(end, p);
            }
        }
    }
}

fn direction(forward: bool) -> f32 {
    if forward {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Transform;

    fn key(id: i32, position: Vec3, time: f32) -> Keyframe {
        Keyframe {
            id,
            transform: Transform::at(position),
            depart_travel_time: time,
            return_travel_time: time,
            arrival_trigger_id: NO_ID,
            ..Keyframe::default()
        }
    }

    fn line(policy: SequencePolicy) -> MovingGroup {
        MovingGroup {
            name: "line".into(),
            keyframes: vec![
                key(1, Vec3::ZERO, 1.0),
                key(2, Vec3::new(10.0, 0.0, 0.0), 1.0),
            ],
            is_door: true,
            movement_type: policy as u32,
            ..MovingGroup::default()
        }
    }

    fn run(mover: &mut Mover, group: &MovingGroup, ticks: usize, dt: f32) -> Vec<MoverStep> {
        (0..ticks).map(|_| mover.tick(group, dt)).collect()
    }

    #[test]
    fn one_way_travels_and_reports_arrival() {
        let mut group = line(SequencePolicy::OneWay);
        group.keyframes[1].arrival_trigger_id = 77;
        let mut mover = Mover::new(0, &group, &mut Diagnostics::new());
        assert!(!mover.is_active());

        mover.activate(true);
        let steps = run(&mut mover, &group, 4, 0.25);
        assert_eq!(steps[0].motion, Motion::Translate(Vec3::new(2.5, 0.0, 0.0)));
        assert_eq!(steps[3].arrived, Some(1));
        assert_eq!(steps[3].arrival_trigger, Some(77));
        assert!((mover.position() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-5);
        assert!(!mover.is_active());
        assert_eq!(mover.tick(&group, 0.25).motion, Motion::None);
    }

    #[test]
    fn reversing_keeps_the_time_fraction() {
        let group = line(SequencePolicy::OneWay);
        let mut mover = Mover::new(0, &group, &mut Diagnostics::new());
        mover.activate(true);
        mover.tick(&group, 0.4);
        assert!((mover.position().x - 4.0).abs() < 1e-5);

        mover.reverse(&group, false);
        match mover.phase() {
            MoverPhase::Traveling {
                from, to, elapsed, ..
            } => {
                assert_eq!((from, to), (1, 0));
                assert!((elapsed - 0.6).abs() < 1e-5);
            }
            phase => panic!("unexpected phase {phase:?}"),
        }
        let step = mover.tick(&group, 0.1);
        assert!((mover.position().x - 3.0).abs() < 1e-4);
        assert!(matches!(step.motion, Motion::Translate(delta) if delta.x < 0.0));
    }

    #[test]
    fn ping_pong_once_returns_home() {
        let group = line(SequencePolicy::PingPongOnce);
        let mut mover = Mover::new(0, &group, &mut Diagnostics::new());
        mover.activate(true);
        let steps = run(&mut mover, &group, 6, 0.5);
        let arrivals: Vec<_> = steps.iter().filter_map(|step| step.arrived).collect();
        assert_eq!(arrivals, vec![1, 0]);
        assert!(mover.position().length() < 1e-5);
        assert!(!mover.is_active());
    }

    #[test]
    fn loop_once_wraps_and_stops_at_the_start() {
        let mut group = line(SequencePolicy::LoopOnce);
        group
            .keyframes
            .push(key(3, Vec3::new(10.0, 10.0, 0.0), 1.0));
        let mut mover = Mover::new(0, &group, &mut Diagnostics::new());
        mover.activate(true);
        let arrivals: Vec<_> = run(&mut mover, &group, 8, 0.5)
            .iter()
            .filter_map(|step| step.arrived)
            .collect();
        assert_eq!(arrivals, vec![1, 2, 0]);
        assert!(!mover.is_active());
    }

    #[test]
    fn lift_waits_at_each_keyframe() {
        let mut group = line(SequencePolicy::Lift);
        group.keyframes.push(key(3, Vec3::new(20.0, 0.0, 0.0), 1.0));
        let mut mover = Mover::new(0, &group, &mut Diagnostics::new());
        mover.activate(true);
        run(&mut mover, &group, 3, 0.5);
        assert_eq!(
            mover.phase(),
            MoverPhase::AtKeyframe {
                key: 1,
                forward: true
            }
        );
        assert!(!mover.is_active());
    }

    #[test]
    fn pause_freezes_travel() {
        let group = line(SequencePolicy::OneWay);
        let mut mover = Mover::new(0, &group, &mut Diagnostics::new());
        mover.activate(true);
        mover.tick(&group, 0.5);
        mover.pause(true);
        assert_eq!(mover.tick(&group, 0.5).motion, Motion::None);
        mover.pause(false);
        mover.tick(&group, 0.25);
        assert!((mover.position().x - 7.5).abs() < 1e-4);
    }

    #[test]
    fn rotate_in_place_accumulates_angle() {
        let mut first = key(1, Vec3::new(0.0, 2.0, 0.0), 1.0);
        first.degrees_about_axis = 90.0;
        let group = MovingGroup {
            name: "fan".into(),
            keyframes: vec![first],
            rotate_in_place: true,
            movement_type: SequencePolicy::LoopInfinite as u32,
            ..MovingGroup::default()
        };
        let mut mover = Mover::new(0, &group, &mut Diagnostics::new());
        assert!(mover.is_active());
        let steps = run(&mut mover, &group, 4, 0.5);
        assert!((mover.angle() - 180.0).abs() < 1e-3);
        match steps[0].motion {
            Motion::Rotate { rotation, pivot } => {
                assert_eq!(pivot, Vec3::new(0.0, 2.0, 0.0));
                let (axis, angle) = rotation.to_axis_angle();
                assert!((axis - Vec3::Y).length() < 1e-4);
                assert!((angle.to_degrees() - 45.0).abs() < 1e-3);
            }
            motion => panic!("expected rotation, got {motion:?}"),
        }
    }

    #[test]
    fn unknown_movement_type_degrades_to_one_way() {
        let mut group = line(SequencePolicy::OneWay);
        group.movement_type = 42;
        let mut diagnostics = Diagnostics::new();
        let mover = Mover::new(0, &group, &mut diagnostics);
        assert_eq!(mover.policy(), SequencePolicy::OneWay);
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::UnknownMovementType {
                group: "line".into(),
                value: 42
            }]
        );
    }
}
