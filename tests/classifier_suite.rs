use vizhost::device::{classify, refine, DeviceProbe, DeviceTier, GpuInfo, TierProfile};

fn probe(model: &str, api: u32, heap_mib: u64) -> DeviceProbe {
    DeviceProbe {
        model: model.to_string(),
        manufacturer: String::new(),
        os_api_level: api,
        max_heap_bytes: heap_mib * 1024 * 1024,
    }
}

fn gpu(renderer: &str, max_texture: u32) -> GpuInfo {
    GpuInfo {
        renderer: renderer.to_string(),
        max_texture_size: max_texture,
    }
}

// ── First pass: static identifiers ──────────────────────────────────────────

#[test]
fn known_models_match_case_insensitively() {
    assert_eq!(classify(&probe("NVIDIA SHIELD Android TV", 28, 2048)), DeviceTier::Premium);
    assert_eq!(classify(&probe("Tegra devkit", 26, 512)), DeviceTier::Premium);
    assert_eq!(classify(&probe("Chromecast Ultra", 26, 512)), DeviceTier::High);
    assert_eq!(classify(&probe("MI BOX S", 26, 512)), DeviceTier::High);
    assert_eq!(classify(&probe("Fire TV Stick 4K", 26, 512)), DeviceTier::High);
}

#[test]
fn multi_pattern_signatures_require_every_substring() {
    // Plain Chromecast misses the "ultra" pattern and falls to the heuristic.
    assert_eq!(classify(&probe("Chromecast", 26, 512)), DeviceTier::Low);
    assert_eq!(classify(&probe("Chromecast", 28, 2048)), DeviceTier::Medium);
}

#[test]
fn capability_heuristic_needs_both_api_and_heap() {
    assert_eq!(classify(&probe("generic box", 28, 2048)), DeviceTier::Medium);
    assert_eq!(classify(&probe("generic box", 27, 2048)), DeviceTier::Low);
    // Heap must be strictly above 1 GiB.
    assert_eq!(classify(&probe("generic box", 28, 1024)), DeviceTier::Low);
    assert_eq!(classify(&probe("generic box", 28, 1025)), DeviceTier::Medium);
}

#[test]
fn unknown_hardware_defaults_to_low() {
    assert_eq!(classify(&probe("", 0, 0)), DeviceTier::Low);
}

// ── Second pass: GPU refinement ─────────────────────────────────────────────

#[test]
fn gpu_signatures_promote() {
    assert_eq!(refine(DeviceTier::Low, &gpu("Adreno 650", 0)), DeviceTier::High);
    assert_eq!(refine(DeviceTier::Medium, &gpu("Mali-G76 MC4", 0)), DeviceTier::High);
    assert_eq!(refine(DeviceTier::Low, &gpu("NVIDIA Tegra X1", 0)), DeviceTier::Premium);
    assert_eq!(
        refine(DeviceTier::Low, &gpu("PowerVR Rogue GE8320", 0)),
        DeviceTier::High
    );
}

#[test]
fn refinement_never_demotes() {
    // The GPU table caps out at High for Adreno; a Premium first pass wins.
    assert_eq!(refine(DeviceTier::Premium, &gpu("Adreno 640", 0)), DeviceTier::Premium);
    assert_eq!(refine(DeviceTier::High, &gpu("Mali-G77", 0)), DeviceTier::High);
    // Unknown GPU with no texture signal leaves the tier untouched.
    assert_eq!(refine(DeviceTier::High, &gpu("llvmpipe", 0)), DeviceTier::High);
}

#[test]
fn generous_texture_size_promotes_low_to_medium_only() {
    assert_eq!(refine(DeviceTier::Low, &gpu("unknown", 4096)), DeviceTier::Medium);
    assert_eq!(refine(DeviceTier::Low, &gpu("unknown", 2048)), DeviceTier::Low);
    // Texture capability never pushes past Medium.
    assert_eq!(refine(DeviceTier::Medium, &gpu("unknown", 8192)), DeviceTier::Medium);
}

#[test]
fn powervr_signature_requires_both_parts() {
    assert_eq!(refine(DeviceTier::Low, &gpu("PowerVR SGX540", 0)), DeviceTier::Low);
}

// ── Profiles ────────────────────────────────────────────────────────────────

#[test]
fn every_profile_has_an_open_hysteresis_band() {
    for tier in [
        DeviceTier::Low,
        DeviceTier::Medium,
        DeviceTier::High,
        DeviceTier::Premium,
    ] {
        let p = TierProfile::for_tier(tier);
        assert!(p.fps_low < p.fps_high, "{} band is inverted", tier.label());
        assert!(p.fps_high < p.target_fps, "{} band exceeds target", tier.label());
    }
}

#[test]
fn profiles_scale_monotonically_with_tier() {
    let tiers = [
        DeviceTier::Low,
        DeviceTier::Medium,
        DeviceTier::High,
        DeviceTier::Premium,
    ];
    for pair in tiers.windows(2) {
        let a = TierProfile::for_tier(pair[0]);
        let b = TierProfile::for_tier(pair[1]);
        assert!(a.target_fps < b.target_fps);
        assert!(a.preset_duration_secs < b.preset_duration_secs);
        assert!(a.transition_duration_secs < b.transition_duration_secs);
    }
}

#[test]
fn medium_profile_matches_field_tuning() {
    let p = TierProfile::for_tier(DeviceTier::Medium);
    assert_eq!(p.preset_duration_secs, 25);
    assert_eq!(p.transition_duration_secs, 5);
    assert_eq!(p.target_fps, 30.0);
    assert_eq!((p.fps_low, p.fps_high), (25.0, 28.0));
}
