//! Live display of telemetry.
//!
//! The engine publishes a copy of every record to an optional [`DisplaySink`].
//! Publishing must never block or fail the loop: the channel sink drops
//! snapshots when the consumer falls behind and goes quiet once the consumer
//! hangs up.

use lf_core::TankId;
use lf_results::TelemetryRecord;
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use tracing::{debug, warn};

pub trait DisplaySink: Send {
    fn publish(&mut self, record: &TelemetryRecord);
}

/// Sink forwarding records over a bounded channel.
pub struct ChannelDisplay {
    tx: SyncSender<TelemetryRecord>,
    dropped: u64,
    disconnected: bool,
}

impl ChannelDisplay {
    /// Snapshots dropped because the consumer was behind or gone.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl DisplaySink for ChannelDisplay {
    fn publish(&mut self, record: &TelemetryRecord) {
        if self.disconnected {
            self.dropped += 1;
            return;
        }
        match self.tx.try_send(*record) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                debug!(time_s = record.time_s, dropped = self.dropped, "display behind, snapshot dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                self.disconnected = true;
                warn!("display consumer disconnected");
            }
        }
    }
}

/// Bounded display channel holding at most `capacity` pending snapshots.
pub fn display_channel(capacity: usize) -> (ChannelDisplay, Receiver<TelemetryRecord>) {
    let (tx, rx) = sync_channel(capacity.max(1));
    (
        ChannelDisplay {
            tx,
            dropped: 0,
            disconnected: false,
        },
        rx,
    )
}

/// One-line console rendering of a record.
pub fn format_record(record: &TelemetryRecord) -> String {
    let a = record.loop_sample(TankId::A);
    let b = record.loop_sample(TankId::B);
    format!(
        "t={:>8.1}s | T1 {:>6.2}% (sp {:>6.2}) CV1 {:>5.3}/{:>5.3} | T2 {:>6.2}% (sp {:>6.2}) CV2 {:>5.3}/{:>5.3}",
        record.time_s,
        a.measurement,
        a.setpoint,
        a.command,
        a.feedback,
        b.measurement,
        b.setpoint,
        b.command,
        b.feedback,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_results::LoopSample;

    fn record(t: f64) -> TelemetryRecord {
        TelemetryRecord {
            time_s: t,
            loops: [LoopSample {
                setpoint: 35.0,
                measurement: 34.5,
                command: 0.42,
                feedback: 0.4,
            }; 2],
        }
    }

    #[test]
    fn full_channel_drops_instead_of_blocking() {
        let (mut sink, rx) = display_channel(2);
        for t in 0..5 {
            sink.publish(&record(t as f64));
        }
        assert_eq!(sink.dropped(), 3);
        let received: Vec<f64> = rx.try_iter().map(|r| r.time_s).collect();
        assert_eq!(received, vec![0.0, 1.0]);
    }

    #[test]
    fn closed_channel_is_tolerated() {
        let (mut sink, rx) = display_channel(4);
        drop(rx);
        sink.publish(&record(0.0));
        sink.publish(&record(1.0));
        assert_eq!(sink.dropped(), 2);
    }

    #[test]
    fn format_shows_both_tanks() {
        let line = format_record(&record(12.0));
        assert!(line.contains("T1  34.50%"));
        assert!(line.contains("T2  34.50%"));
        assert!(line.contains("CV2 0.420/0.400"));
    }
}
