//! Passthrough loop between a key source and the virtual keyboard
//!
//! Every key event read from the source is written unchanged to the sink.
//! A failed write is logged and counted, and forwarding continues. The loop
//! ends when the shutdown future completes or the source fails, and
//! [`run`] releases the sink in either case.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;
use crate::ffi::UinputBackend;
use crate::sink::UinputSink;
use crate::source::EventSource;
use crate::time;

/// Counters kept while forwarding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    pub forwarded: u64,
    pub failed: u64,
}

/// Forward key events from `source` to `sink` until `shutdown` completes.
///
/// Statistics are logged at debug level every `tick_interval`.
pub async fn forward<S, B>(
    source: &mut S,
    sink: &UinputSink<B>,
    tick_interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<ForwardStats, SourceError>
where
    S: EventSource,
    B: UinputBackend,
{
    let metronome = time::metronome(tick_interval);
    let mut stats = ForwardStats::default();

    tokio::pin!(shutdown);
    let tick = metronome.tick();
    tokio::pin!(tick);

    loop {
        tokio::select! {
            event = source.next_key() => {
                let event = event?;
                match sink.write(event).await {
                    Ok(()) => stats.forwarded += 1,
                    Err(e) => {
                        stats.failed += 1;
                        tracing::warn!("Dropped output event: {}", e);
                    }
                }
            }
            at = &mut tick => {
                tracing::debug!(
                    "{}: {} event(s) forwarded, {} failed",
                    at.format("%H:%M:%S"),
                    stats.forwarded,
                    stats.failed
                );
                tick.set(metronome.tick());
            }
            () = &mut shutdown => {
                return Ok(stats);
            }
        }
    }
}

/// [`forward`], then release the sink however forwarding ended.
pub async fn run<S, B>(
    source: &mut S,
    sink: &UinputSink<B>,
    tick_interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<ForwardStats, SourceError>
where
    S: EventSource,
    B: UinputBackend,
{
    let result = forward(source, sink, tick_interval, shutdown).await;

    tracing::info!("Shutting down...");
    if let Err(e) = sink.release().await {
        tracing::warn!("{}", e);
    }

    result
}
