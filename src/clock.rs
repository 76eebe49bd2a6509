/// Timing of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Refresh timestamp after clamping, in milliseconds.
    pub millis: f64,
    /// Same instant in seconds, as used by the animation.
    pub seconds: f32,
    pub frame_index: u64,
}

/// Turns refresh-signal timestamps into animation time.
///
/// Timestamps are absolute, so the animation does not depend on how many
/// ticks ran. A timestamp older than the previous one is clamped to it.
#[derive(Debug, Clone, Default)]
pub struct AnimationClock {
    last_millis: Option<f64>,
    frame_index: u64,
    clamped: u64,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, timestamp_ms: f64) -> FrameTime {
        let mut millis = if timestamp_ms.is_finite() {
            timestamp_ms
        } else {
            log::warn!("non-finite timestamp {timestamp_ms}, reusing the previous one");
            self.last_millis.unwrap_or(0.0)
        };
        if let Some(last) = self.last_millis {
            if millis < last {
                log::warn!("timestamp went backwards ({millis} < {last}), clamping");
                millis = last;
                self.clamped += 1;
            }
        }
        self.last_millis = Some(millis);

        let frame = FrameTime {
            millis,
            seconds: (millis * 0.001) as f32,
            frame_index: self.frame_index,
        };
        self.frame_index += 1;
        frame
    }

    /// Seconds at the latest tick, zero before the first one.
    pub fn seconds(&self) -> f32 {
        self.last_millis.map_or(0.0, |ms| (ms * 0.001) as f32)
    }

    pub fn frames(&self) -> u64 {
        self.frame_index
    }

    /// How many timestamps had to be clamped.
    pub fn clamped(&self) -> u64 {
        self.clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn converts_to_seconds() {
        let mut clock = AnimationClock::new();
        let frame = clock.tick(1500.0);
        assert_abs_diff_eq!(frame.seconds, 1.5);
        assert_eq!(frame.frame_index, 0);
        assert_eq!(clock.tick(1600.0).frame_index, 1);
    }

    #[test]
    fn backwards_timestamps_are_clamped() {
        let mut clock = AnimationClock::new();
        clock.tick(2000.0);
        let frame = clock.tick(1000.0);
        assert_eq!(frame.millis, 2000.0);
        assert_eq!(clock.clamped(), 1);
        assert_abs_diff_eq!(clock.seconds(), 2.0);
    }

    #[test]
    fn nan_reuses_previous_time() {
        let mut clock = AnimationClock::new();
        clock.tick(250.0);
        assert_eq!(clock.tick(f64::NAN).millis, 250.0);
    }
}
