use crate::engine::{Capability, EngineError, VisualEngine};
use std::fmt;

/// Internal render-target size, independent of the physical surface the output
/// is stretched onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderResolution {
    pub width: u32,
    pub height: u32,
}

impl RenderResolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// High resolutions inherently cost more per frame; the controller relaxes
    /// its fps thresholds above this bound.
    pub fn is_large(self) -> bool {
        self.width >= 1920 || self.height >= 1080
    }

    /// Scale down proportionally so both dimensions fit within the GPU's
    /// maximum texture size. Already-valid input comes back unchanged; a zero
    /// limit means the capability is unknown and nothing is clamped.
    pub fn clamp_to_texture_limit(self, max_texture_size: u32) -> Self {
        if max_texture_size == 0 || (self.width <= max_texture_size && self.height <= max_texture_size)
        {
            return self;
        }
        let scale = (max_texture_size as f32 / self.width as f32)
            .min(max_texture_size as f32 / self.height as f32);
        Self {
            width: (self.width as f32 * scale).round() as u32,
            height: (self.height as f32 * scale).round() as u32,
        }
    }
}

impl fmt::Display for RenderResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

pub const RES_480P: RenderResolution = RenderResolution::new(854, 480);
pub const RES_720P: RenderResolution = RenderResolution::new(1280, 720);
pub const RES_1080P: RenderResolution = RenderResolution::new(1920, 1080);
pub const RES_4K: RenderResolution = RenderResolution::new(3840, 2160);

/// Fixed downscale ladder, lowest rung first. Automatic degradation walks down
/// one rung at a time and never drops below 480p.
pub const LADDER: [RenderResolution; 4] = [RES_480P, RES_720P, RES_1080P, RES_4K];

/// Next rung strictly below `res`, or the floor when already at (or under) it.
pub fn step_down(res: RenderResolution) -> RenderResolution {
    LADDER
        .iter()
        .rev()
        .copied()
        .find(|rung| rung.height < res.height && rung.width < res.width)
        .unwrap_or(RES_480P)
}

/// Next rung strictly above `res`, or `res` itself when already at the top.
pub fn step_up(res: RenderResolution) -> RenderResolution {
    LADDER
        .iter()
        .copied()
        .find(|rung| rung.height > res.height && rung.width > res.width)
        .unwrap_or(res)
}

/// Applies render-resolution changes to the engine.
///
/// Owns the authoritative current resolution and the physical surface size.
/// The call ordering inside `request` is load-bearing: the engine's resize can
/// clobber GPU viewport state, so the physical viewport is asserted both before
/// and after it. Failures revert to the last-known-good value, with a single
/// 720p retry for requests above 720p.
pub struct Negotiator {
    current: RenderResolution,
    physical: RenderResolution,
    max_texture_size: u32,
    viewport: Capability,
}

impl Negotiator {
    pub fn new(
        initial: RenderResolution,
        physical: RenderResolution,
        max_texture_size: u32,
        viewport: Capability,
    ) -> Self {
        Self {
            current: initial,
            physical,
            max_texture_size,
            viewport,
        }
    }

    pub fn current(&self) -> RenderResolution {
        self.current
    }

    pub fn physical(&self) -> RenderResolution {
        self.physical
    }

    pub fn set_physical(&mut self, physical: RenderResolution) {
        if physical.is_valid() {
            self.physical = physical;
        }
    }

    /// Re-assert the physical-surface viewport. Called around every frame and
    /// after any engine call that may touch GL state.
    pub fn assert_viewport(&self, engine: &mut dyn VisualEngine) -> Result<(), EngineError> {
        if self.viewport == Capability::Unsupported {
            return Ok(());
        }
        engine.set_viewport(0, 0, self.physical.width, self.physical.height)
    }

    /// Request a new render resolution. Invalid input is tolerated as a no-op;
    /// engine failures are logged, never surfaced. Returns the resolution in
    /// effect afterwards.
    pub fn request(
        &mut self,
        engine: &mut dyn VisualEngine,
        requested: RenderResolution,
    ) -> RenderResolution {
        if !requested.is_valid() {
            log::warn!("ignoring invalid render resolution {requested}");
            return self.current;
        }

        let clamped = requested.clamp_to_texture_limit(self.max_texture_size);
        if clamped != requested {
            log::info!(
                "render resolution {requested} exceeds texture limit {}, clamped to {clamped}",
                self.max_texture_size
            );
        }

        let prior = self.current;
        match self.apply(engine, clamped) {
            Ok(()) => {
                self.current = clamped;
                log::info!("render resolution {prior} -> {clamped}");
            }
            Err(err) => {
                log::warn!("render resolution change to {clamped} failed: {err}");
                self.current = prior;
                // One retry at a known-safe size, only when the failed request
                // was above it.
                if requested.width > RES_720P.width || requested.height > RES_720P.height {
                    match self.apply(engine, RES_720P) {
                        Ok(()) => {
                            self.current = RES_720P;
                            log::info!("fell back to {RES_720P} after failed resolution change");
                        }
                        Err(err) => {
                            log::warn!("720p fallback also failed: {err}");
                        }
                    }
                }
            }
        }
        self.current
    }

    fn apply(
        &mut self,
        engine: &mut dyn VisualEngine,
        target: RenderResolution,
    ) -> Result<(), EngineError> {
        // Output viewport stays at the physical surface so the internal render
        // target is decoupled from final compositing.
        self.assert_viewport(engine)?;
        engine.resize(target.width, target.height)?;
        // The resize may have reset viewport state.
        self.assert_viewport(engine)?;
        Ok(())
    }
}
