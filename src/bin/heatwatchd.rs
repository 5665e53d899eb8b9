//! heatwatchd - thermal monitoring daemon
//!
//! Per iteration the daemon:
//! 1. Reads a frame from the capture source (bounded retry on empty reads)
//! 2. Decimates: only every Nth frame reaches the classifier
//! 3. Classifies processed frames into person/fire detections
//! 4. Dispatches throttled snapshot alerts per detection
//! 5. Records the annotated (or passthrough raw) frame
//!
//! A classification failure on one frame is logged and skipped; only
//! resource-level failures (capture device, recording sink) end the run.
//! Shutdown order on stop: stop reading, close the recording, best-effort
//! shutdown notice, release the device.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use heatwatch::config::ChannelsSettings;
use heatwatch::{
    now_millis, open_source, read_with_retry, AlertDispatcher, CaptureSource, ChannelSettings,
    ClassifierConfig, FrameClassifier, FrameSampler, HeatwatchConfig, MjpegFileSink, Quality,
    RecordingSink, SampleDecision, TelegramChannel,
};

const EMPTY_READ_BACKOFF: Duration = Duration::from_millis(20);

#[derive(Parser)]
#[command(name = "heatwatchd", about = "Thermal camera monitoring daemon")]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long, env = "HEATWATCH_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = HeatwatchConfig::load_from(args.config.as_deref())?;

    log::info!("starting thermal monitoring");
    let recording_dir = Path::new(&cfg.recording.dir);
    let removed = heatwatch::sweep_expired(recording_dir, cfg.recording.retention_days);
    if removed > 0 {
        log::info!("retention sweep removed {} old recordings", removed);
    }

    let mut source = open_source(&cfg.capture)?;
    let mut sink = MjpegFileSink::create(recording_dir)?;
    log::info!("recording to {}", sink.path().display());

    let mut dispatcher = build_dispatcher(&cfg.channels)?;
    dispatcher.send_notice("heatwatch: monitoring started");

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
    })
    .context("set Ctrl-C handler")?;
    log::info!("press Ctrl-C to stop");

    let run_result = run(&cfg, source.as_mut(), &mut sink, &mut dispatcher, &stop);

    // Orderly release: sink first, then the shutdown notice, then the device.
    if let Err(e) = sink.release() {
        log::error!("failed to close recording: {:#}", e);
    }
    dispatcher.send_notice("heatwatch: monitoring stopped");
    if let Err(e) = source.release() {
        log::error!("failed to release capture source: {:#}", e);
    }

    match &run_result {
        Ok(()) => log::info!("monitoring stopped"),
        Err(e) => log::error!("monitoring aborted: {:#}", e),
    }
    run_result
}

fn run(
    cfg: &HeatwatchConfig,
    source: &mut dyn CaptureSource,
    sink: &mut MjpegFileSink,
    dispatcher: &mut AlertDispatcher<TelegramChannel>,
    stop: &AtomicBool,
) -> Result<()> {
    let classifier = FrameClassifier::new(ClassifierConfig {
        person_percentile: cfg.detection.person_percentile,
        fire_threshold: cfg.detection.fire_threshold,
        min_area: cfg.detection.min_area,
        max_area: cfg.detection.max_area,
        ..ClassifierConfig::default()
    });
    let sampler = FrameSampler::new(cfg.detection.process_every);
    let mut frame_count = 0u64;

    while !stop.load(Ordering::SeqCst) {
        let frame = read_with_retry(source, cfg.capture.max_empty_reads, EMPTY_READ_BACKOFF)?;
        frame_count += 1;

        if sampler.decide(frame_count) == SampleDecision::Passthrough {
            sink.write(&frame)?;
            continue;
        }

        match classifier.classify(&frame) {
            Ok(classified) => {
                for detection in &classified.detections {
                    log::info!(
                        "{} detected: area {} px^2, bbox {}x{} at ({}, {})",
                        detection.kind,
                        detection.area,
                        detection.bbox.width,
                        detection.bbox.height,
                        detection.bbox.x,
                        detection.bbox.y
                    );
                    dispatcher.dispatch(detection, &classified.annotated, now_millis());
                }
                sink.write(&classified.annotated)?;
            }
            Err(e) => {
                // One bad frame must not end the monitoring session.
                log::warn!(
                    "classification failed on frame {}, recording raw: {:#}",
                    frame_count,
                    e
                );
                sink.write(&frame)?;
            }
        }

        if frame_count % 100 == 0 {
            log::info!("frames captured: {}", frame_count);
        }
    }

    Ok(())
}

fn build_dispatcher(channels: &ChannelsSettings) -> Result<AlertDispatcher<TelegramChannel>> {
    let mut dispatcher = AlertDispatcher::new(channels.high.cooldown, channels.low.cooldown);

    for (quality, setting) in [
        (Quality::High, &channels.high),
        (Quality::Low, &channels.low),
    ] {
        if !setting.enabled {
            log::info!("{} quality channel disabled", quality.label());
            continue;
        }
        if setting.bot_token.is_empty() || setting.chat_id.is_empty() {
            log::warn!(
                "{} quality channel enabled but missing credentials, skipping",
                quality.label()
            );
            continue;
        }
        let channel = TelegramChannel::new(&setting.bot_token)?;
        dispatcher = dispatcher.with_channel(
            quality,
            ChannelSettings {
                enabled: true,
                bot_token: setting.bot_token.clone(),
                chat_id: setting.chat_id.clone(),
                cooldown: setting.cooldown,
            },
            channel,
        );
        log::info!(
            "{} quality channel ready (cooldown {}s)",
            quality.label(),
            setting.cooldown.as_secs()
        );
    }

    Ok(dispatcher)
}
