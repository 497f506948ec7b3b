#![allow(dead_code)]

use std::path::Path;
use vizhost::engine::{Capability, EngineError, OptimizationLevel, VisualEngine};

/// Every engine call the shell can issue, in the order it was issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    Initialize(u32, u32),
    Resize(u32, u32),
    RenderFrame,
    SetViewport(i32, i32, u32, u32),
    SetPresetDuration(u32),
    SetTransitionDuration(u32),
    SetOptimizationLevel(OptimizationLevel),
    TrimMemory,
    NextPreset(bool),
    PrevPreset(bool),
    RandomPreset(bool),
}

/// Recording fake for the engine boundary with injectable failures. Each
/// `fail_*` counter fails that many upcoming calls of the matching kind.
pub struct ScriptedEngine {
    pub calls: Vec<Call>,
    pub fail_resize: u32,
    pub fail_viewport: u32,
    pub fail_optimization: u32,
    pub fail_transition: u32,
    pub fail_trim: u32,
    pub viewport: Capability,
    pub render_size: (u32, u32),
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_resize: 0,
            fail_viewport: 0,
            fail_optimization: 0,
            fail_transition: 0,
            fail_trim: 0,
            viewport: Capability::Supported,
            render_size: (0, 0),
        }
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn take_failure(counter: &mut u32, call: &'static str) -> Result<(), EngineError> {
        if *counter > 0 {
            *counter -= 1;
            return Err(EngineError::CallFailed {
                call,
                detail: "scripted failure".to_string(),
            });
        }
        Ok(())
    }
}

impl VisualEngine for ScriptedEngine {
    fn initialize(&mut self, width: u32, height: u32, _dir: &Path) -> Result<(), EngineError> {
        self.calls.push(Call::Initialize(width, height));
        self.render_size = (width, height);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.calls.push(Call::Resize(width, height));
        Self::take_failure(&mut self.fail_resize, "resize")?;
        self.render_size = (width, height);
        Ok(())
    }

    fn render_frame(&mut self) -> Result<(), EngineError> {
        self.calls.push(Call::RenderFrame);
        Ok(())
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<(), EngineError> {
        self.calls.push(Call::SetViewport(x, y, width, height));
        Self::take_failure(&mut self.fail_viewport, "set_viewport")
    }

    fn viewport_support(&self) -> Capability {
        self.viewport
    }

    fn set_preset_duration(&mut self, seconds: u32) -> Result<(), EngineError> {
        self.calls.push(Call::SetPresetDuration(seconds));
        Ok(())
    }

    fn set_transition_duration(&mut self, seconds: u32) -> Result<(), EngineError> {
        self.calls.push(Call::SetTransitionDuration(seconds));
        Self::take_failure(&mut self.fail_transition, "set_transition_duration")
    }

    fn set_optimization_level(&mut self, level: OptimizationLevel) -> Result<(), EngineError> {
        self.calls.push(Call::SetOptimizationLevel(level));
        Self::take_failure(&mut self.fail_optimization, "set_optimization_level")
    }

    fn trim_memory(&mut self) -> Result<(), EngineError> {
        self.calls.push(Call::TrimMemory);
        Self::take_failure(&mut self.fail_trim, "trim_memory")
    }

    fn add_pcm(&mut self, _samples: &[i16], _channels: u16) {}

    fn next_preset(&mut self, hard_cut: bool) -> Result<(), EngineError> {
        self.calls.push(Call::NextPreset(hard_cut));
        Ok(())
    }

    fn previous_preset(&mut self, hard_cut: bool) -> Result<(), EngineError> {
        self.calls.push(Call::PrevPreset(hard_cut));
        Ok(())
    }

    fn select_random_preset(&mut self, hard_cut: bool) -> Result<(), EngineError> {
        self.calls.push(Call::RandomPreset(hard_cut));
        Ok(())
    }

    fn current_preset_name(&self) -> String {
        "scripted".to_string()
    }

    fn preset_count(&self) -> usize {
        1
    }
}
