use crate::device::DeviceTier;
use crate::resolution::{self, RenderResolution};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "vizhost",
    version,
    about = "Adaptive-quality shell for an external audio-visualization engine"
)]
pub struct Config {
    #[arg(long, value_enum, default_value_t = AudioSource::Mic)]
    pub source: AudioSource,

    /// Capture device name substring; default input device when omitted.
    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    /// Initial render resolution. Overrides the persisted preference.
    #[arg(long, value_enum)]
    pub resolution: Option<ResolutionChoice>,

    /// Physical output surface, e.g. 1920x1080. The engine's output is always
    /// stretched to this size regardless of render resolution.
    #[arg(long, default_value = "1280x720", value_parser = parse_surface)]
    pub surface: RenderResolution,

    /// Seconds between automatic preset changes; tier default when omitted.
    #[arg(long)]
    pub preset_duration: Option<u32>,

    /// Preset cross-fade length in seconds; tier default when omitted.
    #[arg(long)]
    pub transition_duration: Option<u32>,

    /// Adaptive quality control; overrides the persisted preference when given.
    #[arg(long, action = clap::ArgAction::Set)]
    pub adaptive: Option<bool>,

    /// Automatic preset rotation; overrides the persisted preference when given.
    #[arg(long, action = clap::ArgAction::Set)]
    pub auto_switch: Option<bool>,

    /// Force a device tier, skipping classification.
    #[arg(long, value_enum)]
    pub tier: Option<TierChoice>,

    /// Directory of engine preset files.
    #[arg(long, default_value = "presets")]
    pub preset_dir: PathBuf,

    /// fps sampling window in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub window_ms: u64,

    /// Frame pacing target.
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, default_value_t = false)]
    pub no_prefs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AudioSource {
    Mic,
    #[value(alias = "loopback")]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolutionChoice {
    #[value(name = "480p", alias = "480")]
    P480,
    #[value(name = "720p", alias = "720")]
    P720,
    #[value(name = "1080p", alias = "1080")]
    P1080,
    #[value(name = "4k", alias = "2160p")]
    P2160,
}

impl ResolutionChoice {
    pub fn to_resolution(self) -> RenderResolution {
        match self {
            Self::P480 => resolution::RES_480P,
            Self::P720 => resolution::RES_720P,
            Self::P1080 => resolution::RES_1080P,
            Self::P2160 => resolution::RES_4K,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TierChoice {
    Low,
    Medium,
    High,
    Premium,
}

impl TierChoice {
    pub fn to_tier(self) -> DeviceTier {
        match self {
            Self::Low => DeviceTier::Low,
            Self::Medium => DeviceTier::Medium,
            Self::High => DeviceTier::High,
            Self::Premium => DeviceTier::Premium,
        }
    }
}

pub fn parse_surface(raw: &str) -> Result<RenderResolution, String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected <width>x<height>".to_string())?;
    let width: u32 = w.trim().parse().map_err(|_| format!("bad width {w:?}"))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("bad height {h:?}"))?;
    let res = RenderResolution::new(width, height);
    if !res.is_valid() {
        return Err("surface dimensions must be positive".to_string());
    }
    Ok(res)
}
