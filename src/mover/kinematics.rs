use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    distance: f32,
    duration: f32,
    accel: f32,
    decel: f32,
    peak: f32,
}

impl Profile {
    /// Profile covering `distance` in `duration` seconds.
    ///
    /// Ramp times that do not fit are scaled down together so that
    /// `accel + decel == duration`. A non-positive duration arrives
    /// instantly.
    pub fn timed(distance: f32, duration: f32, accel: f32, decel: f32) -> Self {
        if duration <= 0.0 || !duration.is_finite() {
            return Self::instant(distance);
        }
        let mut accel = accel.max(0.0);
        let mut decel = decel.max(0.0);
        let ramps = accel + decel;
        if ramps > duration {
            let scale = duration / ramps;
            accel *= scale;
            decel *= scale;
        }
        let peak = distance / (duration - (accel + decel) * 0.5);
        Self {
            distance,
            duration,
            accel,
            decel,
            peak,
        }
    }

    /// Profile whose plateau runs at `speed` units per second.
    pub fn speed_driven(distance: f32, speed: f32, accel: f32, decel: f32) -> Self {
        if speed <= 0.0 || distance == 0.0 {
            return Self::instant(distance);
        }
        let accel = accel.max(0.0);
        let decel = decel.max(0.0);
        let duration = distance.abs() / speed + (accel + decel) * 0.5;
        Self::timed(distance, duration, accel, decel)
    }

    fn instant(distance: f32) -> Self {
        Self {
            distance,
            ..Self::default()
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn accel_time(&self) -> f32 {
        self.accel
    }

    pub fn decel_time(&self) -> f32 {
        self.decel
    }

    pub fn peak_velocity(&self) -> f32 {
        self.peak
    }

    /// Distance covered after `t` seconds.
    pub fn position(&self, t: f32) -> f32 {
        if self.duration <= 0.0 {
            return self.distance;
        }
        let t = t.clamp(0.0, self.duration);
        let v = self.peak;
        if t < self.accel {
            v * t * t / (2.0 * self.accel)
        } else if t <= self.duration - self.decel {
            v * self.accel * 0.5 + v * (t - self.accel)
        } else {
            let s = self.duration - t;
            self.distance - v * s * s / (2.0 * self.decel)
        }
    }

    pub fn velocity(&self, t: f32) -> f32 {
        if self.duration <= 0.0 || t < 0.0 || t > self.duration {
            return 0.0;
        }
        if t < self.accel {
            self.peak * t / self.accel
        } else if t <= self.duration - self.decel {
            self.peak
        } else {
            self.peak * (self.duration - t) / self.decel
        }
    }

    /// Fraction of the distance covered after `t` seconds, in `[0, 1]`.
    pub fn progress(&self, t: f32) -> f32 {
        if self.distance == 0.0 {
            if t >= self.duration {
                1.0
            } else {
                t / self.duration
            }
        } else {
            self.position(t) / self.distance
        }
    }

    pub fn is_finished(&self, t: f32) -> bool {
        t >= self.duration
    }
}
