use crate::device::TierProfile;
use crate::engine::{OptimizationLevel, VisualEngine};
use crate::resolution::{self, Negotiator, RenderResolution};
use crate::sampler::FpsSampler;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QualityMode {
    Normal,
    Degraded,
}

impl QualityMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Degraded => "degraded",
        }
    }
}

/// Transition duration applied while degraded; near a hard cut, cheap enough
/// for any tier.
const DEGRADED_TRANSITION_SECS: u32 = 2;

/// Opportunistic-upgrade gate: only Premium devices, and only when sustained
/// fps is comfortably above every tier's hysteresis band.
const PREMIUM_UPGRADE_FPS: f32 = 45.0;

/// Threshold relief at large render resolutions; high resolution costs more
/// per frame and should not be punished as harshly.
const LARGE_RES_THRESHOLD_SCALE: f32 = 0.8;

/// Feedback loop between measured throughput and engine quality settings.
///
/// Owns the fps sample and the NORMAL/DEGRADED state exclusively; the render
/// resolution is shared with the UI layer through `request_resolution`. All
/// methods are called from the render thread only.
pub struct QualityController {
    profile: TierProfile,
    mode: QualityMode,
    sampler: FpsSampler,
    negotiator: Negotiator,
    /// Highest resolution automatic upgrades may reach: the most recent
    /// user-requested (or startup-default) resolution.
    ceiling: RenderResolution,
    enabled: bool,
}

impl QualityController {
    pub fn new(profile: TierProfile, sampler: FpsSampler, negotiator: Negotiator) -> Self {
        let ceiling = negotiator.current();
        Self {
            profile,
            mode: QualityMode::Normal,
            sampler,
            negotiator,
            ceiling,
            enabled: true,
        }
    }

    pub fn mode(&self) -> QualityMode {
        self.mode
    }

    /// Adaptive evaluation on/off. Sampling and viewport assertion continue
    /// either way; only the mode-switch decisions pause.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn profile(&self) -> &TierProfile {
        &self.profile
    }

    pub fn fps(&self) -> f32 {
        self.sampler.fps()
    }

    pub fn resolution(&self) -> RenderResolution {
        self.negotiator.current()
    }

    /// Push the tier's default quality parameters to the engine. Called exactly
    /// once, right after classification. Failures are logged; startup proceeds
    /// on engine defaults.
    pub fn apply_tier_defaults(&mut self, engine: &mut dyn VisualEngine) {
        let p = &self.profile;
        log::info!(
            "applying {} tier defaults: preset {}s, transition {}s, optimization {}",
            p.tier.label(),
            p.preset_duration_secs,
            p.transition_duration_secs,
            p.optimization.label()
        );
        if let Err(err) = engine.set_preset_duration(p.preset_duration_secs) {
            log::warn!("set_preset_duration failed: {err}");
        }
        if let Err(err) = engine.set_transition_duration(p.transition_duration_secs) {
            log::warn!("set_transition_duration failed: {err}");
        }
        if let Err(err) = engine.set_optimization_level(p.optimization) {
            log::warn!("set_optimization_level failed: {err}");
        }
    }

    /// Viewport assertion before the engine draws.
    pub fn begin_frame(&mut self, engine: &mut dyn VisualEngine) {
        if let Err(err) = self.negotiator.assert_viewport(engine) {
            log::warn!("viewport assert before render failed: {err}");
        }
    }

    /// Per-frame bookkeeping after the engine has drawn: re-assert the viewport
    /// (the engine may have reset it) and, at window boundaries, run the
    /// threshold evaluation. Returns the fresh fps reading when one was taken.
    pub fn end_frame(&mut self, now: Instant, engine: &mut dyn VisualEngine) -> Option<f32> {
        if let Err(err) = self.negotiator.assert_viewport(engine) {
            log::warn!("viewport assert after render failed: {err}");
        }
        let fps = self.sampler.on_frame(now)?;
        if self.enabled {
            self.evaluate(fps, engine);
        }
        Some(fps)
    }

    /// User-originated resolution change (marshalled onto the render thread by
    /// the caller). Also moves the upgrade ceiling.
    pub fn request_resolution(
        &mut self,
        engine: &mut dyn VisualEngine,
        requested: RenderResolution,
    ) -> RenderResolution {
        if requested.is_valid() {
            self.ceiling = requested;
        }
        self.negotiator.request(engine, requested)
    }

    fn thresholds(&self) -> (f32, f32) {
        let mut low = self.profile.fps_low;
        let mut high = self.profile.fps_high;
        if self.negotiator.current().is_large() {
            low *= LARGE_RES_THRESHOLD_SCALE;
            high *= LARGE_RES_THRESHOLD_SCALE;
        }
        (low, high)
    }

    fn evaluate(&mut self, fps: f32, engine: &mut dyn VisualEngine) {
        let (low, high) = self.thresholds();
        log::debug!(
            "window fps {fps:.1} on {} tier (band {low:.1}..{high:.1}, mode {})",
            self.profile.tier.label(),
            self.mode.label()
        );
        match self.mode {
            QualityMode::Normal if fps < low => {
                log::warn!(
                    "low frame rate {fps:.1} < {low:.1} on {} tier, reducing quality",
                    self.profile.tier.label()
                );
                if self.reduce_quality(engine) {
                    self.mode = QualityMode::Degraded;
                    // Severe shortfall additionally costs one ladder rung.
                    if fps < low * 0.5 {
                        let target = resolution::step_down(self.negotiator.current());
                        if target != self.negotiator.current() {
                            log::warn!("severe shortfall {fps:.1}, stepping down to {target}");
                            self.negotiator.request(engine, target);
                        }
                    }
                }
            }
            QualityMode::Degraded if fps > high => {
                log::info!("frame rate recovered {fps:.1} > {high:.1}, restoring quality");
                if self.restore_quality(engine) {
                    self.mode = QualityMode::Normal;
                    self.maybe_upgrade_resolution(fps, engine);
                }
            }
            // Inside the hysteresis band (or already in the right mode):
            // repeated evaluation at the same reading changes nothing.
            _ => {}
        }
    }

    fn reduce_quality(&mut self, engine: &mut dyn VisualEngine) -> bool {
        if let Err(err) = engine.set_optimization_level(OptimizationLevel::Reduced) {
            log::warn!("quality reduction aborted at set_optimization_level: {err}");
            return false;
        }
        if let Err(err) = engine.set_transition_duration(DEGRADED_TRANSITION_SECS) {
            log::warn!("quality reduction aborted at set_transition_duration: {err}");
            return false;
        }
        if let Err(err) = engine.trim_memory() {
            log::warn!("quality reduction aborted at trim_memory: {err}");
            return false;
        }
        true
    }

    fn restore_quality(&mut self, engine: &mut dyn VisualEngine) -> bool {
        if let Err(err) = engine.set_optimization_level(self.profile.optimization) {
            log::warn!("quality restore aborted at set_optimization_level: {err}");
            return false;
        }
        if let Err(err) = engine.set_transition_duration(self.profile.transition_duration_secs) {
            log::warn!("quality restore aborted at set_transition_duration: {err}");
            return false;
        }
        true
    }

    /// Resolution is never restored wholesale; Premium devices may climb one
    /// rung at a time while performance is comfortably high, capped at the
    /// user's ceiling.
    fn maybe_upgrade_resolution(&mut self, fps: f32, engine: &mut dyn VisualEngine) {
        if self.profile.tier != crate::device::DeviceTier::Premium || fps <= PREMIUM_UPGRADE_FPS {
            return;
        }
        let current = self.negotiator.current();
        let target = resolution::step_up(current);
        if target == current {
            return;
        }
        if target.width > self.ceiling.width || target.height > self.ceiling.height {
            return;
        }
        log::info!("premium tier performing well, stepping up to {target}");
        self.negotiator.request(engine, target);
    }
}
