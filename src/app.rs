use crate::audio::AudioCapture;
use crate::config::Config;
use crate::controller::{QualityController, QualityMode};
use crate::device::{self, TierProfile};
use crate::engine::{NullEngine, VisualEngine};
use crate::prefs::{AppPrefs, prefs_storage_path};
use crate::resolution::{self, Negotiator, RenderResolution};
use crate::sampler::FpsSampler;
use crate::terminal::TerminalGuard;
use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, unbounded};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::{ExecutableCommand, cursor, terminal};
use std::io::{BufWriter, Write};
use std::thread;
use std::time::{Duration, Instant};

/// Control messages marshalled from the input thread onto the render thread.
/// All shared render state has exactly one writer because mutations only
/// happen on the dequeue side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlMsg {
    SetResolution(RenderResolution),
    NextPreset,
    PrevPreset,
    RandomPreset,
    ToggleAdaptive,
    ToggleAutoSwitch,
    NudgePresetDuration(i32),
    Quit,
}

/// Automatic preset rotation. While degraded the switch is a hard cut so the
/// engine skips the cross-fade cost.
pub struct PresetRotation {
    last_switch: Instant,
    interval: Duration,
    pub enabled: bool,
}

impl PresetRotation {
    pub fn new(duration_secs: u32, enabled: bool) -> Self {
        Self {
            last_switch: Instant::now(),
            interval: Duration::from_secs(u64::from(duration_secs.max(1))),
            enabled,
        }
    }

    pub fn set_duration(&mut self, duration_secs: u32) {
        self.interval = Duration::from_secs(u64::from(duration_secs.max(1)));
    }

    pub fn duration_secs(&self) -> u32 {
        self.interval.as_secs() as u32
    }

    pub fn reset(&mut self, now: Instant) {
        self.last_switch = now;
    }

    pub fn tick(&mut self, now: Instant, mode: QualityMode, engine: &mut dyn VisualEngine) {
        if !self.enabled || now.duration_since(self.last_switch) < self.interval {
            return;
        }
        let hard_cut = mode == QualityMode::Degraded;
        match engine.select_random_preset(hard_cut) {
            Ok(()) => log::debug!(
                "auto preset change ({})",
                if hard_cut { "hard cut" } else { "transition" }
            ),
            Err(err) => log::warn!("auto preset change failed: {err}"),
        }
        self.last_switch = now;
    }
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let prefs_path = if cfg.no_prefs { None } else { prefs_storage_path() };
    let mut prefs = match AppPrefs::load(prefs_path.as_deref()) {
        Ok(p) => p,
        Err(err) => {
            log::warn!("ignoring unreadable prefs: {err}");
            AppPrefs::default()
        }
    };

    apply_cli_overrides(&mut prefs, &cfg);

    // Classification pass one: static identifiers, before any surface exists.
    let probe = device::probe_host();
    let initial_tier = match cfg.tier {
        Some(choice) => choice.to_tier(),
        None => device::classify(&probe),
    };

    let mut engine: Box<dyn VisualEngine> = Box::new(NullEngine::new());
    engine
        .initialize(cfg.surface.width, cfg.surface.height, &cfg.preset_dir)
        .context("initialize engine")?;

    // Pass two: the GPU string is only readable once the engine is up.
    let gpu = device::probe_gpu();
    let tier = match cfg.tier {
        Some(_) => initial_tier,
        None => device::refine(initial_tier, &gpu),
    };
    let mut profile = TierProfile::for_tier(tier);
    if let Some(secs) = prefs.preset_duration_secs {
        profile.preset_duration_secs = secs;
    }
    if let Some(secs) = prefs.transition_duration_secs {
        profile.transition_duration_secs = secs;
    }

    let negotiator = Negotiator::new(
        cfg.surface,
        cfg.surface,
        gpu.max_texture_size,
        engine.viewport_support(),
    );
    let mut controller = QualityController::new(
        profile,
        FpsSampler::new(cfg.window_ms),
        negotiator,
    );
    controller.set_enabled(prefs.adaptive);
    controller.apply_tier_defaults(&mut *engine);
    if let Some(res) = prefs.resolution {
        controller.request_resolution(&mut *engine, res);
    }

    let mut capture = match AudioCapture::new(cfg.source, cfg.device.as_deref()) {
        Ok(c) => Some(c),
        Err(err) => {
            log::warn!("running without audio capture: {err:#}");
            None
        }
    };

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());

    let (tx, rx) = unbounded::<ControlMsg>();
    spawn_input_thread(tx);

    let mut rotation = PresetRotation::new(profile.preset_duration_secs, prefs.auto_switch);
    let mut pcm = Vec::<i16>::new();
    let target_frame = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);

    draw_hud(&mut out, &controller, &rotation, &*engine)?;

    loop {
        let now = Instant::now();

        let mut hud_dirty = false;
        if !drain_control(
            &rx,
            &mut *engine,
            &mut controller,
            &mut rotation,
            &mut prefs,
            &mut hud_dirty,
        ) {
            break;
        }

        if let Some(capture) = capture.as_mut() {
            capture.drain(&mut pcm);
            if !pcm.is_empty() {
                engine.add_pcm(&pcm, capture.channels());
            }
        }

        controller.begin_frame(&mut *engine);
        if let Err(err) = engine.render_frame() {
            // One bad frame never stops the loop.
            log::warn!("render_frame failed: {err}");
        }
        if controller.end_frame(now, &mut *engine).is_some() {
            hud_dirty = true;
        }

        rotation.tick(now, controller.mode(), &mut *engine);

        if hud_dirty {
            draw_hud(&mut out, &controller, &rotation, &*engine)?;
        }

        let elapsed = now.elapsed();
        if elapsed < target_frame {
            thread::sleep(target_frame - elapsed);
        }
    }

    if let Err(err) = prefs.save(prefs_path.as_deref()) {
        log::warn!("failed to save prefs: {err}");
    }
    Ok(())
}

/// Fold explicit CLI selections over the persisted preferences. Flags the user
/// did not pass leave the stored value in place.
pub fn apply_cli_overrides(prefs: &mut AppPrefs, cfg: &Config) {
    if let Some(choice) = cfg.resolution {
        prefs.resolution = Some(choice.to_resolution());
    }
    if let Some(secs) = cfg.preset_duration {
        prefs.preset_duration_secs = Some(secs);
    }
    if let Some(secs) = cfg.transition_duration {
        prefs.transition_duration_secs = Some(secs);
    }
    if let Some(enabled) = cfg.adaptive {
        prefs.adaptive = enabled;
    }
    if let Some(enabled) = cfg.auto_switch {
        prefs.auto_switch = enabled;
    }
}

/// Apply queued control messages on the render thread. Returns false on quit.
fn drain_control(
    rx: &Receiver<ControlMsg>,
    engine: &mut dyn VisualEngine,
    controller: &mut QualityController,
    rotation: &mut PresetRotation,
    prefs: &mut AppPrefs,
    hud_dirty: &mut bool,
) -> bool {
    while let Ok(msg) = rx.try_recv() {
        *hud_dirty = true;
        match msg {
            ControlMsg::Quit => return false,
            ControlMsg::SetResolution(res) => {
                let applied = controller.request_resolution(engine, res);
                prefs.resolution = Some(applied);
            }
            ControlMsg::NextPreset => {
                if let Err(err) = engine.next_preset(false) {
                    log::warn!("next preset failed: {err}");
                }
                rotation.reset(Instant::now());
            }
            ControlMsg::PrevPreset => {
                if let Err(err) = engine.previous_preset(false) {
                    log::warn!("previous preset failed: {err}");
                }
                rotation.reset(Instant::now());
            }
            ControlMsg::RandomPreset => {
                if let Err(err) = engine.select_random_preset(false) {
                    log::warn!("random preset failed: {err}");
                }
                rotation.reset(Instant::now());
            }
            ControlMsg::ToggleAdaptive => {
                let enabled = !controller.enabled();
                controller.set_enabled(enabled);
                prefs.adaptive = enabled;
                log::info!("adaptive quality {}", if enabled { "on" } else { "off" });
            }
            ControlMsg::ToggleAutoSwitch => {
                rotation.enabled = !rotation.enabled;
                prefs.auto_switch = rotation.enabled;
            }
            ControlMsg::NudgePresetDuration(delta) => {
                let secs = rotation
                    .duration_secs()
                    .saturating_add_signed(delta)
                    .clamp(5, 120);
                rotation.set_duration(secs);
                prefs.preset_duration_secs = Some(secs);
                if let Err(err) = engine.set_preset_duration(secs) {
                    log::warn!("set_preset_duration failed: {err}");
                }
            }
        }
    }
    true
}

/// Input thread: blocks on terminal events, forwards mapped keys. The remote
/// and the keyboard share one routing table; everything mutating render state
/// crosses the channel.
fn spawn_input_thread(tx: Sender<ControlMsg>) {
    thread::spawn(move || {
        loop {
            let ev = match event::read() {
                Ok(ev) => ev,
                Err(err) => {
                    log::warn!("input thread stopping: {err}");
                    let _ = tx.send(ControlMsg::Quit);
                    return;
                }
            };
            let Event::Key(key) = ev else { continue };
            if key.kind == KeyEventKind::Release {
                continue;
            }
            let msg = match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Some(ControlMsg::Quit),
                KeyCode::Char('n') | KeyCode::Right => Some(ControlMsg::NextPreset),
                KeyCode::Char('p') | KeyCode::Left => Some(ControlMsg::PrevPreset),
                KeyCode::Char('r') => Some(ControlMsg::RandomPreset),
                KeyCode::Char('a') => Some(ControlMsg::ToggleAdaptive),
                KeyCode::Char('s') => Some(ControlMsg::ToggleAutoSwitch),
                KeyCode::Char('1') => Some(ControlMsg::SetResolution(resolution::RES_480P)),
                KeyCode::Char('2') => Some(ControlMsg::SetResolution(resolution::RES_720P)),
                KeyCode::Char('3') => Some(ControlMsg::SetResolution(resolution::RES_1080P)),
                KeyCode::Char('4') => Some(ControlMsg::SetResolution(resolution::RES_4K)),
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    Some(ControlMsg::NudgePresetDuration(5))
                }
                KeyCode::Char('-') => Some(ControlMsg::NudgePresetDuration(-5)),
                _ => None,
            };
            let Some(msg) = msg else { continue };
            let quit = msg == ControlMsg::Quit;
            if tx.send(msg).is_err() || quit {
                return;
            }
        }
    });
}

fn draw_hud(
    out: &mut BufWriter<impl Write>,
    controller: &QualityController,
    rotation: &PresetRotation,
    engine: &dyn VisualEngine,
) -> anyhow::Result<()> {
    out.execute(cursor::MoveTo(0, 0))?;
    out.execute(terminal::Clear(terminal::ClearType::CurrentLine))?;
    write!(
        out,
        "{} ({} presets) | tier {} | {:.1} fps | {} | {} | auto {} ({}s) | adaptive {}",
        engine.current_preset_name(),
        engine.preset_count(),
        controller.profile().tier.label(),
        controller.fps(),
        controller.mode().label(),
        controller.resolution(),
        if rotation.enabled { "on" } else { "off" },
        rotation.duration_secs(),
        if controller.enabled() { "on" } else { "off" },
    )?;
    out.flush().context("flush hud")?;
    Ok(())
}
