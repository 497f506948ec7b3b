use std::fmt;
use std::path::{Path, PathBuf};

/// Result of the one-time capability probe for an optional engine entry point.
///
/// Negotiated once at startup; callers branch on the stored value instead of
/// catching a failure on every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Supported,
    Unsupported,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptimizationLevel {
    Reduced,
    Balanced,
    Full,
}

impl OptimizationLevel {
    pub fn as_native(self) -> u8 {
        match self {
            Self::Reduced => 0,
            Self::Balanced => 1,
            Self::Full => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Reduced => "reduced",
            Self::Balanced => "balanced",
            Self::Full => "full",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    NotInitialized,
    CallFailed { call: &'static str, detail: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "engine not initialized"),
            Self::CallFailed { call, detail } => write!(f, "engine call {call} failed: {detail}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// The fixed call surface of the external visualization engine.
///
/// Everything behind this trait (preset interpretation, beat detection, the
/// actual rendering) belongs to the engine. The shell only issues calls and
/// reads back preset metadata. Calls that touch GL state may clobber the
/// viewport as a side effect; callers re-assert it afterwards.
pub trait VisualEngine {
    fn initialize(&mut self, width: u32, height: u32, preset_dir: &Path)
    -> Result<(), EngineError>;

    /// Reconfigure the internal render target. This is the render resolution,
    /// not the output surface size.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError>;

    fn render_frame(&mut self) -> Result<(), EngineError>;

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32)
    -> Result<(), EngineError>;

    /// Whether `set_viewport` is available on this engine build. Probed once;
    /// engines without it leave viewport management to the platform layer.
    fn viewport_support(&self) -> Capability {
        Capability::Supported
    }

    fn set_preset_duration(&mut self, seconds: u32) -> Result<(), EngineError>;

    fn set_transition_duration(&mut self, seconds: u32) -> Result<(), EngineError>;

    fn set_optimization_level(&mut self, level: OptimizationLevel) -> Result<(), EngineError>;

    fn trim_memory(&mut self) -> Result<(), EngineError>;

    /// Forward captured PCM so the engine's own beat detection has signal.
    /// Best-effort; silently dropped when the engine is not ready.
    fn add_pcm(&mut self, samples: &[i16], channels: u16);

    fn next_preset(&mut self, hard_cut: bool) -> Result<(), EngineError>;

    fn previous_preset(&mut self, hard_cut: bool) -> Result<(), EngineError>;

    fn select_random_preset(&mut self, hard_cut: bool) -> Result<(), EngineError>;

    fn current_preset_name(&self) -> String;

    fn preset_count(&self) -> usize;
}

/// Stand-in engine used when no native visualization library is linked.
///
/// Keeps the full preset bookkeeping (names, navigation, random selection) so
/// the shell, the HUD, and the quality controller behave exactly as they would
/// against a real engine, but every frame renders nothing.
pub struct NullEngine {
    initialized: bool,
    width: u32,
    height: u32,
    preset_dir: Option<PathBuf>,
    presets: Vec<String>,
    active: usize,
}

impl NullEngine {
    pub fn new() -> Self {
        Self {
            initialized: false,
            width: 0,
            height: 0,
            preset_dir: None,
            presets: Vec::new(),
            active: 0,
        }
    }

    /// Render target size last applied through `resize` (or `initialize`).
    pub fn render_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn scan_presets(dir: &Path) -> Vec<String> {
        let mut names = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .filter_map(|e| e.file_name().into_string().ok())
                .filter(|n| n.ends_with(".milk") || n.ends_with(".prjm"))
                .collect::<Vec<_>>(),
            Err(_) => Vec::new(),
        };
        names.sort_unstable();
        if names.is_empty() {
            // No preset directory is fine for a null engine; keep one entry so
            // navigation and the HUD have something to show.
            names.push("idle".to_string());
        }
        names
    }

    fn step(&mut self, forward: bool) {
        if self.presets.is_empty() {
            return;
        }
        let len = self.presets.len();
        self.active = if forward {
            (self.active + 1) % len
        } else {
            (self.active + len - 1) % len
        };
    }
}

impl Default for NullEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualEngine for NullEngine {
    fn initialize(
        &mut self,
        width: u32,
        height: u32,
        preset_dir: &Path,
    ) -> Result<(), EngineError> {
        self.width = width;
        self.height = height;
        self.preset_dir = Some(preset_dir.to_path_buf());
        self.presets = Self::scan_presets(preset_dir);
        self.active = 0;
        self.initialized = true;
        log::info!(
            "null engine up: {}x{}, {} preset(s) from {}",
            width,
            height,
            self.presets.len(),
            preset_dir.display()
        );
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn render_frame(&mut self) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        Ok(())
    }

    fn set_viewport(&mut self, _x: i32, _y: i32, _w: u32, _h: u32) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        Ok(())
    }

    fn set_preset_duration(&mut self, _seconds: u32) -> Result<(), EngineError> {
        Ok(())
    }

    fn set_transition_duration(&mut self, _seconds: u32) -> Result<(), EngineError> {
        Ok(())
    }

    fn set_optimization_level(&mut self, level: OptimizationLevel) -> Result<(), EngineError> {
        log::debug!("null engine: optimization level -> {}", level.label());
        Ok(())
    }

    fn trim_memory(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn add_pcm(&mut self, _samples: &[i16], _channels: u16) {}

    fn next_preset(&mut self, _hard_cut: bool) -> Result<(), EngineError> {
        self.step(true);
        Ok(())
    }

    fn previous_preset(&mut self, _hard_cut: bool) -> Result<(), EngineError> {
        self.step(false);
        Ok(())
    }

    fn select_random_preset(&mut self, _hard_cut: bool) -> Result<(), EngineError> {
        if self.presets.len() > 1 {
            let mut idx = fastrand::usize(..self.presets.len());
            if idx == self.active {
                idx = (idx + 1) % self.presets.len();
            }
            self.active = idx;
        }
        Ok(())
    }

    fn current_preset_name(&self) -> String {
        self.presets
            .get(self.active)
            .cloned()
            .unwrap_or_else(|| "<none>".to_string())
    }

    fn preset_count(&self) -> usize {
        self.presets.len()
    }
}
