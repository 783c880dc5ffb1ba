//! # Frame scheduling
//!
//! Pointer devices report far more often than the display refreshes. [`FrameThrottle`] wraps a
//! callback so any number of calls between two frames run it at most once, on the next
//! [`FrameThrottle::on_frame`] tick, with the most recent event.
//!
//! There is no timer here: the host drives frames, by a render loop, a timer, or by hand in tests.

#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub enum ThrottleMode {
    /// Later calls replace the pending event.
    #[default]
    Latest,
    /// The first event of a frame is kept, and the latest of the later ones runs on the frame after.
    Trailing,
}
impl ThrottleMode {
    #[must_use]
    pub fn from_trailing(trailing: bool) -> Self {
        if trailing {
            Self::Trailing
        } else {
            Self::Latest
        }
    }
}

/// A callback which runs at most once per frame. `Ctx` is whatever the callback needs mutable
/// access to when it finally runs.
pub struct FrameThrottle<E, Ctx> {
    callback: Box<dyn FnMut(&mut Ctx, E)>,
    mode: ThrottleMode,
    pending: Option<E>,
    trailing: Option<E>,
}
impl<E, Ctx> FrameThrottle<E, Ctx> {
    pub fn wrap(mode: ThrottleMode, callback: impl FnMut(&mut Ctx, E) + 'static) -> Self {
        Self {
            callback: Box::new(callback),
            mode,
            pending: None,
            trailing: None,
        }
    }
    /// Queue an event for the next frame.
    pub fn call(&mut self, event: E) {
        if self.mode == ThrottleMode::Trailing && self.pending.is_some() {
            self.trailing = Some(event);
        } else {
            self.pending = Some(event);
        }
    }
    /// Whether a call is reserved for the next frame.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
    /// A frame boundary. Runs the pending call, if any, and returns whether it did.
    pub fn on_frame(&mut self, ctx: &mut Ctx) -> bool {
        let Some(event) = self.pending.take() else {
            return false;
        };
        (self.callback)(ctx, event);
        // Trailing event gets the next frame.
        self.pending = self.trailing.take();
        true
    }
    /// Run everything pending right now, in order, leaving nothing scheduled.
    pub fn flush(&mut self, ctx: &mut Ctx) {
        for event in [self.pending.take(), self.trailing.take()]
            .into_iter()
            .flatten()
        {
            (self.callback)(ctx, event);
        }
    }
    /// Drop anything pending without running it.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.trailing = None;
    }
}
impl<E, Ctx> std::fmt::Debug for FrameThrottle<E, Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameThrottle")
            .field("mode", &self.mode)
            .field("pending", &self.pending.is_some())
            .field("trailing", &self.trailing.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn recorder(mode: ThrottleMode) -> FrameThrottle<u32, Vec<u32>> {
        FrameThrottle::wrap(mode, |seen: &mut Vec<u32>, event| seen.push(event))
    }

    #[test]
    fn hundred_calls_one_frame() {
        let mut seen = Vec::new();
        let mut throttle = recorder(ThrottleMode::Latest);
        for i in 0..100 {
            throttle.call(i);
        }
        assert!(seen.is_empty());
        assert!(throttle.on_frame(&mut seen));
        assert_eq!(seen, [99]);
        // Nothing left for the frame after.
        assert!(!throttle.on_frame(&mut seen));
        assert_eq!(seen, [99]);
    }
    #[test]
    fn flush_runs_now() {
        let mut seen = Vec::new();
        let mut throttle = recorder(ThrottleMode::Latest);
        for i in 0..100 {
            throttle.call(i);
        }
        throttle.flush(&mut seen);
        assert_eq!(seen, [99]);
        assert!(!throttle.is_pending());
        // Idempotent.
        throttle.flush(&mut seen);
        assert!(!throttle.on_frame(&mut seen));
        assert_eq!(seen, [99]);
    }
    #[test]
    fn cancel_discards() {
        let mut seen = Vec::new();
        let mut throttle = recorder(ThrottleMode::Trailing);
        throttle.call(1);
        throttle.call(2);
        throttle.cancel();
        throttle.cancel();
        throttle.flush(&mut seen);
        assert!(!throttle.on_frame(&mut seen));
        assert!(seen.is_empty());
    }
    #[test]
    fn trailing_runs_next_frame() {
        let mut seen = Vec::new();
        let mut throttle = recorder(ThrottleMode::Trailing);
        for i in 0..10 {
            throttle.call(i);
        }
        assert!(throttle.on_frame(&mut seen));
        assert_eq!(seen, [0]);
        assert!(throttle.is_pending());
        assert!(throttle.on_frame(&mut seen));
        assert_eq!(seen, [0, 9]);
        assert!(!throttle.on_frame(&mut seen));

        // Flush keeps order.
        throttle.call(20);
        throttle.call(21);
        throttle.flush(&mut seen);
        assert_eq!(seen, [0, 9, 20, 21]);
    }
}
