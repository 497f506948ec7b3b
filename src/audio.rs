use crate::config::AudioSource;
use anyhow::{Context, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};

/// Roughly half a second of stereo 48 kHz; the engine only needs the freshest
/// samples, overflow is silently dropped.
const RING_CAPACITY: usize = 48_000;

/// Capture stream feeding raw i16 PCM across to the render thread.
///
/// Feature extraction (FFT, onset, beat) is deliberately absent: the external
/// engine runs its own analysis, this side only transports samples to it.
pub struct AudioCapture {
    _stream: cpal::Stream,
    consumer: ringbuf::HeapCons<i16>,
    channels: u16,
}

impl AudioCapture {
    pub fn new(source: AudioSource, device_hint: Option<&str>) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = pick_device(&host, source, device_hint)?;
        let name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());
        let config = device
            .default_input_config()
            .with_context(|| format!("query input format of {name:?}"))?;
        let channels = config.channels();
        let sample_format = config.sample_format();
        log::info!(
            "capturing from {name:?}: {} Hz, {} ch, {sample_format:?}",
            config.sample_rate().0,
            channels
        );

        let rb = HeapRb::<i16>::new(RING_CAPACITY);
        let (mut producer, consumer) = rb.split();
        let err_fn = |err| log::warn!("audio stream error: {err}");

        let stream = match sample_format {
            SampleFormat::F32 => device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for &s in data {
                        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                        let _ = producer.try_push(v);
                    }
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    producer.push_slice(data);
                },
                err_fn,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                &config.into(),
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    for &s in data {
                        let _ = producer.try_push((s as i32 - 32768) as i16);
                    }
                },
                err_fn,
                None,
            ),
            other => return Err(anyhow!("unsupported sample format {other:?}")),
        }
        .with_context(|| format!("open input stream on {name:?}"))?;

        stream.play().context("start capture stream")?;

        Ok(Self {
            _stream: stream,
            consumer,
            channels,
        })
    }

    /// Move everything captured since the last call into `buf` (cleared first).
    pub fn drain(&mut self, buf: &mut Vec<i16>) {
        buf.clear();
        while let Some(sample) = self.consumer.try_pop() {
            buf.push(sample);
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

fn pick_device(
    host: &cpal::Host,
    source: AudioSource,
    hint: Option<&str>,
) -> anyhow::Result<cpal::Device> {
    if let Some(hint) = hint {
        let needle = hint.to_ascii_lowercase();
        for device in host.input_devices().context("enumerate input devices")? {
            if let Ok(name) = device.name() {
                if name.to_ascii_lowercase().contains(&needle) {
                    return Ok(device);
                }
            }
        }
        return Err(anyhow!("no input device matching {hint:?}"));
    }

    match source {
        AudioSource::Mic => host
            .default_input_device()
            .ok_or_else(|| anyhow!("no default input device")),
        AudioSource::System => {
            // System capture rides on a loopback/monitor device exposed as an
            // input; there is no portable direct tap.
            const LOOPBACK_HINTS: &[&str] = &["monitor", "loopback", "blackhole", "stereo mix"];
            for device in host.input_devices().context("enumerate input devices")? {
                if let Ok(name) = device.name() {
                    let lower = name.to_ascii_lowercase();
                    if LOOPBACK_HINTS.iter().any(|h| lower.contains(h)) {
                        return Ok(device);
                    }
                }
            }
            Err(anyhow!(
                "no loopback input found; pass --device to pick one (see --list-devices)"
            ))
        }
    }
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    println!("input devices:");
    for device in host.input_devices().context("enumerate input devices")? {
        let name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());
        match device.default_input_config() {
            Ok(cfg) => println!(
                "  {name}  ({} Hz, {} ch, {:?})",
                cfg.sample_rate().0,
                cfg.channels(),
                cfg.sample_format()
            ),
            Err(_) => println!("  {name}"),
        }
    }
    Ok(())
}
