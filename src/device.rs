use crate::engine::OptimizationLevel;
use std::env;
use std::fs;

/// Coarse device-capability bucket. Assigned once per process: a pre-GPU guess
/// from static identifiers, then a GPU-informed refinement that only ever
/// promotes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeviceTier {
    Low,
    Medium,
    High,
    Premium,
}

impl DeviceTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Premium => "premium",
        }
    }
}

/// Static device identifiers available before any render surface exists.
#[derive(Clone, Debug)]
pub struct DeviceProbe {
    pub model: String,
    pub manufacturer: String,
    pub os_api_level: u32,
    pub max_heap_bytes: u64,
}

/// GPU facts that only become readable once a render surface is up.
#[derive(Clone, Debug, Default)]
pub struct GpuInfo {
    pub renderer: String,
    pub max_texture_size: u32,
}

/// Model-string signatures of known hardware, matched by substring containment.
/// An entry matches when every pattern in its list is present. Extend here as
/// new devices show up in the field.
const MODEL_TIERS: &[(&[&str], DeviceTier)] = &[
    (&["shield"], DeviceTier::Premium),
    (&["tegra"], DeviceTier::Premium),
    (&["chromecast", "ultra"], DeviceTier::High),
    (&["mi box s"], DeviceTier::High),
    (&["fire tv stick 4k"], DeviceTier::High),
];

/// GPU-renderer signatures, same matching rules as `MODEL_TIERS`.
const GPU_TIERS: &[(&[&str], DeviceTier)] = &[
    (&["tegra"], DeviceTier::Premium),
    (&["shield"], DeviceTier::Premium),
    (&["adreno 640"], DeviceTier::High),
    (&["adreno 650"], DeviceTier::High),
    (&["mali-g76"], DeviceTier::High),
    (&["mali-g77"], DeviceTier::High),
    (&["powervr", "ge8320"], DeviceTier::High),
];

const MIN_API_FOR_MEDIUM: u32 = 28;
const MIN_HEAP_FOR_MEDIUM: u64 = 1024 * 1024 * 1024;

/// Texture capability generous enough to promote an otherwise-unknown low-tier
/// device one notch during refinement.
const GENEROUS_TEXTURE_SIZE: u32 = 4096;

fn table_lookup(table: &[(&[&str], DeviceTier)], subject: &str) -> Option<DeviceTier> {
    let subject = subject.to_ascii_lowercase();
    table
        .iter()
        .find(|(patterns, _)| patterns.iter().all(|p| subject.contains(p)))
        .map(|&(_, tier)| tier)
}

/// Initial classification from static identifiers. Unknown hardware falls
/// through to the conservative default; this never fails.
pub fn classify(probe: &DeviceProbe) -> DeviceTier {
    if let Some(tier) = table_lookup(MODEL_TIERS, &probe.model) {
        log::info!("device tier {} from model {:?}", tier.label(), probe.model);
        return tier;
    }
    if probe.os_api_level >= MIN_API_FOR_MEDIUM && probe.max_heap_bytes > MIN_HEAP_FOR_MEDIUM {
        log::info!(
            "device tier medium from capability heuristic (api {}, heap {} MiB)",
            probe.os_api_level,
            probe.max_heap_bytes / (1024 * 1024)
        );
        return DeviceTier::Medium;
    }
    log::info!("device tier low (no matching signature)");
    DeviceTier::Low
}

/// GPU-informed second pass. Promotion only: a weak-looking GPU string never
/// demotes a tier the first pass already granted.
pub fn refine(current: DeviceTier, gpu: &GpuInfo) -> DeviceTier {
    if let Some(tier) = table_lookup(GPU_TIERS, &gpu.renderer) {
        if tier > current {
            log::info!(
                "device tier {} -> {} from gpu {:?}",
                current.label(),
                tier.label(),
                gpu.renderer
            );
            return tier;
        }
        return current;
    }
    if gpu.max_texture_size >= GENEROUS_TEXTURE_SIZE && current == DeviceTier::Low {
        log::info!(
            "device tier low -> medium from texture capability ({})",
            gpu.max_texture_size
        );
        return DeviceTier::Medium;
    }
    current
}

/// Per-tier quality defaults and fps thresholds.
///
/// The thresholds came out of field tuning and have shifted between releases;
/// treat them as configuration, not
/// contract. `fps_low < fps_high` must hold for every tier (the hysteresis
/// band), which `controller` tests assert.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierProfile {
    pub tier: DeviceTier,
    pub preset_duration_secs: u32,
    pub transition_duration_secs: u32,
    pub optimization: OptimizationLevel,
    pub target_fps: f32,
    pub fps_low: f32,
    pub fps_high: f32,
}

impl TierProfile {
    pub fn for_tier(tier: DeviceTier) -> Self {
        match tier {
            DeviceTier::Premium => Self {
                tier,
                preset_duration_secs: 35,
                transition_duration_secs: 10,
                optimization: OptimizationLevel::Full,
                target_fps: 60.0,
                fps_low: 50.0,
                fps_high: 55.0,
            },
            DeviceTier::High => Self {
                tier,
                preset_duration_secs: 30,
                transition_duration_secs: 7,
                optimization: OptimizationLevel::Full,
                target_fps: 45.0,
                fps_low: 35.0,
                fps_high: 40.0,
            },
            DeviceTier::Medium => Self {
                tier,
                preset_duration_secs: 25,
                transition_duration_secs: 5,
                optimization: OptimizationLevel::Balanced,
                target_fps: 30.0,
                fps_low: 25.0,
                fps_high: 28.0,
            },
            DeviceTier::Low => Self {
                tier,
                preset_duration_secs: 20,
                transition_duration_secs: 3,
                optimization: OptimizationLevel::Reduced,
                target_fps: 24.0,
                fps_low: 18.0,
                fps_high: 22.0,
            },
        }
    }
}

/// Build a `DeviceProbe` for the current host. Environment overrides let
/// deployments pin identity; everything else falls back to values that land in
/// the conservative branches of `classify`.
pub fn probe_host() -> DeviceProbe {
    DeviceProbe {
        model: env::var("VIZHOST_MODEL").unwrap_or_default(),
        manufacturer: env::var("VIZHOST_MANUFACTURER").unwrap_or_default(),
        os_api_level: env::var("VIZHOST_API_LEVEL")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(MIN_API_FOR_MEDIUM),
        max_heap_bytes: host_memory_bytes().unwrap_or(0),
    }
}

/// GPU facts for the current host. With no native engine linked there is no GL
/// context to query, so this reads the same environment overrides the probe
/// uses; absent values leave refinement a no-op.
pub fn probe_gpu() -> GpuInfo {
    GpuInfo {
        renderer: env::var("VIZHOST_GPU").unwrap_or_default(),
        max_texture_size: env::var("VIZHOST_MAX_TEXTURE_SIZE")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0),
    }
}

fn host_memory_bytes() -> Option<u64> {
    let text = fs::read_to_string("/proc/meminfo").ok()?;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            let kib: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
            return Some(kib * 1024);
        }
    }
    None
}
