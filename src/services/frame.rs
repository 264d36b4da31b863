// Accessbar frame coalescer
// Request-animation-frame equivalent for pointer-tracking overlays: any number of requests
// between two frames collapse into one update carrying the latest payload.

/// Pointer position in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Holds at most one scheduled update.
#[derive(Debug, Clone)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
    requests: u64,
    frames: u64,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self { pending: None, requests: 0, frames: 0 }
    }
}

impl<T> FrameCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `payload` for the next frame, replacing any payload still waiting.
    /// Returns `true` when this request opened a new frame.
    pub fn request(&mut self, payload: T) -> bool {
        self.requests += 1;
        self.pending.replace(payload).is_none()
    }

    /// Drops the pending update. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Hands out the payload due this frame, if any.
    pub fn take(&mut self) -> Option<T> {
        let payload = self.pending.take();
        if payload.is_some() {
            self.frames += 1;
        }
        payload
    }

    /// Total requests received.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Frames that actually delivered an update.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
