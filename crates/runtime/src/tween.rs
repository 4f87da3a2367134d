//! Time-based property tweens.
//!
//! A [`Tween`] interpolates a value from `from` to `to` over a fixed duration,
//! optionally after a start delay and optionally repeating forever (with or
//! without yoyo). Tweens are advanced explicitly with frame deltas, so they are
//! deterministic and independent of the host clock.

use foundation::math::{Vec2, Vec3};

/// Values a [`Tween`] can interpolate.
pub trait Lerp: Copy {
    fn lerp(a: Self, b: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: Self, b: Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: Self, b: Self, t: f64) -> Self {
        Vec2::new(f64::lerp(a.x, b.x, t), f64::lerp(a.y, b.y, t))
    }
}

impl Lerp for Vec3 {
    fn lerp(a: Self, b: Self, t: f64) -> Self {
        Vec3::new(
            f64::lerp(a.x, b.x, t),
            f64::lerp(a.y, b.y, t),
            f64::lerp(a.z, b.z, t),
        )
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Ease {
    Linear,
    /// Quadratic ease-out: fast start, gentle settle.
    #[default]
    Power1Out,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Repeat {
    #[default]
    Once,
    /// Repeat indefinitely; with `yoyo` every other cycle plays backwards.
    Forever { yoyo: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween<T> {
    from: T,
    to: T,
    duration_s: f64,
    delay_s: f64,
    ease: Ease,
    repeat: Repeat,
    elapsed_s: f64,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T, duration_s: f64) -> Self {
        Self {
            from,
            to,
            duration_s: duration_s.max(0.0),
            delay_s: 0.0,
            ease: Ease::default(),
            repeat: Repeat::Once,
            elapsed_s: 0.0,
        }
    }

    /// A finished tween resting at `value`.
    pub fn settled(value: T) -> Self {
        Self::new(value, value, 0.0)
    }

    pub fn with_delay(mut self, delay_s: f64) -> Self {
        self.delay_s = delay_s.max(0.0);
        self
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn target(&self) -> T {
        self.to
    }

    pub fn delay_s(&self) -> f64 {
        self.delay_s
    }

    /// Restart toward `to`, starting from the current value.
    pub fn retarget(&mut self, to: T, duration_s: f64) {
        self.from = self.value();
        self.to = to;
        self.duration_s = duration_s.max(0.0);
        self.delay_s = 0.0;
        self.elapsed_s = 0.0;
    }

    /// Advance by `dt_s` seconds and return the new value.
    pub fn advance(&mut self, dt_s: f64) -> T {
        if dt_s > 0.0 && !self.is_finished() {
            self.elapsed_s += dt_s;
        }
        self.value()
    }

    pub fn is_finished(&self) -> bool {
        match self.repeat {
            Repeat::Once => self.elapsed_s >= self.delay_s + self.duration_s,
            Repeat::Forever { .. } => false,
        }
    }

    pub fn value(&self) -> T {
        let local = self.elapsed_s - self.delay_s;
        if local < 0.0 {
            return self.from;
        }
        if self.duration_s <= 0.0 {
            return self.to;
        }

        let progress = match self.repeat {
            Repeat::Once => (local / self.duration_s).min(1.0),
            Repeat::Forever { yoyo } => {
                let cycles = local / self.duration_s;
                let frac = cycles.fract();
                let backwards = yoyo && (cycles.floor() as u64) % 2 == 1;
                if backwards { 1.0 - frac } else { frac }
            }
        };

        T::lerp(self.from, self.to, self.ease.apply(progress))
    }
}

#[cfg(test)]
mod tests {
    use super::{Ease, Repeat, Tween};
    use foundation::math::Vec2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn linear_tween_reaches_target_and_stops() {
        let mut t = Tween::new(0.0, 10.0, 2.0).with_ease(Ease::Linear);
        assert_close(t.advance(0.5), 2.5, 1e-12);
        assert_close(t.advance(1.5), 10.0, 1e-12);
        assert!(t.is_finished());
        assert_close(t.advance(1.0), 10.0, 1e-12);
    }

    #[test]
    fn power1_out_is_ahead_of_linear() {
        assert_close(Ease::Power1Out.apply(0.5), 0.75, 1e-12);
        assert_close(Ease::Power1Out.apply(0.0), 0.0, 1e-12);
        assert_close(Ease::Power1Out.apply(1.0), 1.0, 1e-12);
    }

    #[test]
    fn delay_holds_start_value() {
        let mut t = Tween::new(1.0, 1.4, 2.0)
            .with_ease(Ease::Linear)
            .with_delay(0.5);
        assert_close(t.advance(0.4), 1.0, 1e-12);
        assert_close(t.advance(1.1), 1.2, 1e-12);
    }

    #[test]
    fn yoyo_forever_bounces_between_endpoints() {
        let mut t = Tween::new(1.0, 1.4, 2.0)
            .with_ease(Ease::Linear)
            .with_repeat(Repeat::Forever { yoyo: true });
        // Start of the backwards cycle sits at the peak.
        assert_close(t.advance(2.0), 1.4, 1e-12);
        assert_close(t.advance(1.0), 1.2, 1e-12);
        assert_close(t.advance(1.0), 1.0, 1e-12);
        assert_close(t.advance(1.0), 1.2, 1e-12);
        assert!(!t.is_finished());
    }

    #[test]
    fn retarget_starts_from_current_value() {
        let mut t = Tween::new(Vec2::ZERO, Vec2::new(1.0, 0.0), 2.0).with_ease(Ease::Linear);
        t.advance(1.0);
        t.retarget(Vec2::new(1.0, 1.0), 2.0);
        assert_eq!(t.value(), Vec2::new(0.5, 0.0));
        let end = t.advance(2.0);
        assert_eq!(end, Vec2::new(1.0, 1.0));
        assert_eq!(t.target(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let mut t = Tween::new(0.0, 3.0, 0.0);
        assert_close(t.advance(0.01), 3.0, 1e-12);
        assert!(t.is_finished());
    }
}
