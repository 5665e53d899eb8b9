//! heatwatch - thermal camera monitoring.
//!
//! Ingests a live thermal stream, classifies sampled frames into person and
//! fire detections from the frame's intensity distribution, records the
//! annotated stream, and dispatches rate-limited snapshot alerts over two
//! independently configured notification channels.
//!
//! # Module Structure
//!
//! - `frame`: immutable frame container
//! - `ingest`: capture sources (synthetic stub, V4L2 devices)
//! - `detect`: the classification pipeline (percentile threshold, heat
//!   palette, mask refinement, blob gates, annotation)
//! - `sampler`: frame decimation
//! - `alert`: cooldown throttle, dual-channel dispatch, Telegram delivery
//! - `record`: MJPEG recording sink and retention sweep
//! - `config`: startup configuration
//!
//! Decision logic is per frame and stateless apart from alert cooldown
//! bookkeeping: detections carry no identity and are never tracked across
//! frames.

pub mod alert;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod record;
pub mod sampler;

pub use alert::{
    AlertDispatcher, AlertThrottle, ChannelSettings, MessageChannel, Quality, TelegramChannel,
};
pub use config::HeatwatchConfig;
pub use detect::{
    BoundingBox, Classified, ClassifierConfig, Detection, DetectionKind, FrameClassifier,
};
pub use frame::{now_millis, Frame};
pub use ingest::{open_source, read_with_retry, CaptureSource, StubSource};
pub use record::{sweep_expired, MjpegFileSink, RecordingSink};
pub use sampler::{FrameSampler, SampleDecision};
