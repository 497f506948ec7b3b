mod support;

use support::{Call, ScriptedEngine};
use vizhost::engine::Capability;
use vizhost::resolution::{
    step_down, step_up, Negotiator, RenderResolution, LADDER, RES_1080P, RES_480P, RES_4K,
    RES_720P,
};

const PHYSICAL: RenderResolution = RenderResolution::new(1920, 1080);

fn make_negotiator(initial: RenderResolution, max_texture: u32) -> Negotiator {
    Negotiator::new(initial, PHYSICAL, max_texture, Capability::Supported)
}

// ── Texture clamping ────────────────────────────────────────────────────────

#[test]
fn clamp_preserves_aspect_ratio() {
    let clamped = RenderResolution::new(5000, 3000).clamp_to_texture_limit(4096);
    assert_eq!(clamped, RenderResolution::new(4096, 2458));

    let original_ratio = 5000.0 / 3000.0;
    let clamped_ratio = clamped.width as f32 / clamped.height as f32;
    assert!((original_ratio - clamped_ratio).abs() < 0.01);
}

#[test]
fn clamp_is_idempotent() {
    let once = RenderResolution::new(5000, 3000).clamp_to_texture_limit(4096);
    assert_eq!(once.clamp_to_texture_limit(4096), once);
}

#[test]
fn clamp_leaves_fitting_and_unknown_limits_alone() {
    assert_eq!(RES_1080P.clamp_to_texture_limit(4096), RES_1080P);
    assert_eq!(
        RenderResolution::new(5000, 3000).clamp_to_texture_limit(0),
        RenderResolution::new(5000, 3000)
    );
}

// ── Ladder ──────────────────────────────────────────────────────────────────

#[test]
fn ladder_is_ascending() {
    for pair in LADDER.windows(2) {
        assert!(pair[0].width < pair[1].width);
        assert!(pair[0].height < pair[1].height);
    }
}

#[test]
fn step_down_walks_the_ladder_to_the_floor() {
    assert_eq!(step_down(RES_4K), RES_1080P);
    assert_eq!(step_down(RES_1080P), RES_720P);
    assert_eq!(step_down(RES_720P), RES_480P);
    assert_eq!(step_down(RES_480P), RES_480P);
}

#[test]
fn step_down_from_off_ladder_sizes_finds_the_next_rung() {
    // A texture-clamped 4K still steps to 1080p, and anything at or below the
    // floor lands on the floor.
    assert_eq!(step_down(RenderResolution::new(4096, 2458)), RES_1080P);
    assert_eq!(step_down(RenderResolution::new(640, 360)), RES_480P);
}

#[test]
fn step_up_walks_the_ladder_and_stops_at_the_top() {
    assert_eq!(step_up(RES_480P), RES_720P);
    assert_eq!(step_up(RES_720P), RES_1080P);
    assert_eq!(step_up(RES_1080P), RES_4K);
    assert_eq!(step_up(RES_4K), RES_4K);
}

// ── Negotiator ──────────────────────────────────────────────────────────────

#[test]
fn request_asserts_viewport_around_the_resize() {
    let mut e = ScriptedEngine::new();
    let mut n = make_negotiator(RES_720P, 4096);

    let applied = n.request(&mut e, RES_1080P);
    assert_eq!(applied, RES_1080P);
    assert_eq!(n.current(), RES_1080P);
    assert_eq!(
        e.calls,
        [
            Call::SetViewport(0, 0, 1920, 1080),
            Call::Resize(1920, 1080),
            Call::SetViewport(0, 0, 1920, 1080),
        ]
    );
}

#[test]
fn invalid_request_is_a_no_op() {
    let mut e = ScriptedEngine::new();
    let mut n = make_negotiator(RES_720P, 4096);

    let applied = n.request(&mut e, RenderResolution::new(0, 1080));
    assert_eq!(applied, RES_720P);
    assert!(e.calls.is_empty());
}

#[test]
fn request_clamps_to_the_texture_limit() {
    let mut e = ScriptedEngine::new();
    let mut n = make_negotiator(RES_720P, 4096);

    let applied = n.request(&mut e, RenderResolution::new(5000, 3000));
    assert_eq!(applied, RenderResolution::new(4096, 2458));
    assert!(e.calls.contains(&Call::Resize(4096, 2458)));
}

#[test]
fn unsupported_viewport_skips_the_assertions() {
    let mut e = ScriptedEngine::new();
    e.viewport = Capability::Unsupported;
    let mut n = Negotiator::new(RES_720P, PHYSICAL, 4096, Capability::Unsupported);

    n.request(&mut e, RES_1080P);
    assert_eq!(e.calls, [Call::Resize(1920, 1080)]);
}

#[test]
fn failed_large_request_falls_back_to_720p() {
    let mut e = ScriptedEngine::new();
    e.fail_resize = 1;
    let mut n = make_negotiator(RES_480P, 4096);

    let applied = n.request(&mut e, RES_4K);
    assert_eq!(applied, RES_720P);
    assert_eq!(n.current(), RES_720P);
    assert!(e.calls.contains(&Call::Resize(3840, 2160)));
    assert!(e.calls.contains(&Call::Resize(1280, 720)));
    assert_eq!(e.render_size, (1280, 720));
}

#[test]
fn failed_small_request_reverts_without_fallback() {
    let mut e = ScriptedEngine::new();
    e.fail_resize = 1;
    let mut n = make_negotiator(RES_1080P, 4096);

    let applied = n.request(&mut e, RES_480P);
    assert_eq!(applied, RES_1080P);
    assert_eq!(e.count(|c| matches!(c, Call::Resize(..))), 1);
}

#[test]
fn repeated_failures_keep_the_last_good_resolution() {
    let mut e = ScriptedEngine::new();
    // Each failed >720p request burns two resize attempts (target + fallback).
    e.fail_resize = 6;
    let mut n = make_negotiator(RES_720P, 4096);

    for _ in 0..3 {
        assert_eq!(n.request(&mut e, RES_1080P), RES_720P);
    }
    // Failure budget exhausted: the next request goes through.
    assert_eq!(n.request(&mut e, RES_1080P), RES_1080P);
}

#[test]
fn physical_surface_updates_ignore_invalid_sizes() {
    let mut n = make_negotiator(RES_720P, 4096);
    n.set_physical(RenderResolution::new(0, 0));
    assert_eq!(n.physical(), PHYSICAL);

    n.set_physical(RES_4K);
    assert_eq!(n.physical(), RES_4K);
}
