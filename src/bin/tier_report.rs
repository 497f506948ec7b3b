//! Prints both device-classification passes and the resulting quality profile
//! for the current host. Useful when tuning the signature tables or checking
//! what a deployment target will get.

use vizhost::device::{self, TierProfile};

fn main() {
    env_logger::init();

    let probe = device::probe_host();
    println!("probe:");
    println!("  model         {:?}", probe.model);
    println!("  manufacturer  {:?}", probe.manufacturer);
    println!("  api level     {}", probe.os_api_level);
    println!(
        "  heap          {} MiB",
        probe.max_heap_bytes / (1024 * 1024)
    );

    let initial = device::classify(&probe);
    println!("\npass 1 (static identifiers): {}", initial.label());

    let gpu = device::probe_gpu();
    println!("\ngpu:");
    println!("  renderer      {:?}", gpu.renderer);
    println!("  max texture   {}", gpu.max_texture_size);

    let tier = device::refine(initial, &gpu);
    println!("\npass 2 (gpu refinement): {}", tier.label());

    let profile = TierProfile::for_tier(tier);
    println!("\nprofile:");
    println!("  preset duration      {}s", profile.preset_duration_secs);
    println!("  transition duration  {}s", profile.transition_duration_secs);
    println!("  optimization         {}", profile.optimization.label());
    println!("  target fps           {}", profile.target_fps);
    println!(
        "  hysteresis band      {} .. {}",
        profile.fps_low, profile.fps_high
    );
}
