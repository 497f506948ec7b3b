use std::time::Instant;

pub const DEFAULT_WINDOW_MS: u64 = 2000;

/// Counter-and-clock fps measurement over fixed windows.
///
/// `on_frame` is called once per rendered frame. The reading only refreshes at
/// window boundaries; between boundaries `fps()` keeps returning the previous
/// value, and that same stale reading is what mode-switch decisions see.
pub struct FpsSampler {
    window_ms: u64,
    window_start: Option<Instant>,
    frames: u32,
    fps: f32,
}

impl FpsSampler {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            window_start: None,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Count one frame. Returns the freshly computed fps at a window boundary,
    /// `None` in between.
    pub fn on_frame(&mut self, now: Instant) -> Option<f32> {
        let Some(start) = self.window_start else {
            // First frame opens the window; nothing to measure yet.
            self.window_start = Some(now);
            self.frames = 1;
            return None;
        };

        self.frames += 1;
        let elapsed_ms = now.duration_since(start).as_millis() as u64;
        if elapsed_ms < self.window_ms {
            return None;
        }
        if elapsed_ms == 0 {
            // window_ms of zero with two frames on the same tick; re-open the
            // window rather than divide.
            self.window_start = Some(now);
            self.frames = 0;
            return None;
        }

        self.fps = self.frames as f32 * 1000.0 / elapsed_ms as f32;
        self.window_start = Some(now);
        self.frames = 0;
        Some(self.fps)
    }

    /// Last computed reading; 0.0 until the first window closes.
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FpsSampler {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}
