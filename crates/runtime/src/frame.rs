use foundation::time::Time;

/// Largest step a single frame may advance, in seconds (e.g. after the tab
/// was hidden and no animation frames were delivered).
pub const MAX_FRAME_DT_S: f64 = 0.1;

/// Frame metadata handed to per-frame update code.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time since the previous frame (seconds).
    pub dt_s: f64,
    /// Host timestamp at the start of the frame.
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64, time: Time) -> Self {
        Self { index, dt_s, time }
    }
}

/// Turns host animation timestamps into [`Frame`]s.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    next_index: u64,
    last: Option<Time>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to a host timestamp. The first tick has `dt_s == 0`.
    pub fn tick(&mut self, now: Time) -> Frame {
        let dt_s = match self.last {
            Some(prev) => now.since(prev).min(MAX_FRAME_DT_S),
            None => 0.0,
        };
        self.last = Some(now);

        let frame = Frame::new(self.next_index, dt_s, now);
        self.next_index = self.next_index.wrapping_add(1);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameClock, MAX_FRAME_DT_S};
    use foundation::time::Time;

    #[test]
    fn first_tick_has_zero_dt() {
        let mut clock = FrameClock::new();
        let f0 = clock.tick(Time(12.0));
        assert_eq!(f0.index, 0);
        assert_eq!(f0.dt_s, 0.0);
    }

    #[test]
    fn ticks_measure_elapsed_time() {
        let mut clock = FrameClock::new();
        clock.tick(Time(1.0));
        let f1 = clock.tick(Time(1.016));
        assert_eq!(f1.index, 1);
        assert!((f1.dt_s - 0.016).abs() < 1e-12);
    }

    #[test]
    fn long_pauses_are_capped() {
        let mut clock = FrameClock::new();
        clock.tick(Time(1.0));
        let f = clock.tick(Time(30.0));
        assert_eq!(f.dt_s, MAX_FRAME_DT_S);
    }

    #[test]
    fn backwards_timestamps_do_not_go_negative() {
        let mut clock = FrameClock::new();
        clock.tick(Time(5.0));
        let f = clock.tick(Time(4.0));
        assert_eq!(f.dt_s, 0.0);
    }
}
