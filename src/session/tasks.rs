//! The sender and receiver background tasks that drive an active control
//! connection. Split into two independent tasks (rather than one fused
//! read/write loop) so a slow or stalled receive can never hold up queued
//! sends, and vice versa.

use super::heartbeat::HeartbeatState;
use crate::{
    constants::SEND_TASK_IDLE_POLL,
    control::ControlSender,
    error::{RemoteControlError, VoiceError},
};
use rand::random;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use voicecore_model::{payload::Heartbeat, ControlPayload};

/// Sends queued outbound payloads and emits heartbeats on schedule until
/// cancelled or a send fails.
///
/// Each iteration: send a heartbeat if one is due (failing with
/// [`RemoteControlError::VoiceGatewayProtocolViolation`] if the previous
/// one was never acked), then dequeue and send at most one pending
/// payload, sleeping for the smaller of the idle poll interval and the
/// time remaining until the next heartbeat.
#[instrument(skip_all)]
pub async fn run_sender(
    sender: ControlSender,
    heartbeat: Arc<AsyncMutex<HeartbeatState>>,
    outbound: flume::Receiver<ControlPayload>,
    safety_margin: Duration,
    cancel: CancellationToken,
) -> Result<(), VoiceError> {
    loop {
        let now = Instant::now();
        let wait = {
            let mut hb = heartbeat.lock().await;
            if hb.is_due(safety_margin, now) {
                if !hb.is_acked() {
                    return Err(VoiceError::RemoteControl(
                        RemoteControlError::VoiceGatewayProtocolViolation,
                    ));
                }

                let nonce: u64 = random();
                sender.send(&ControlPayload::Heartbeat(Heartbeat { nonce })).await?;
                hb.record_send(nonce, now);
            }

            hb.time_until_due(safety_margin, now)
        };

        let poll = wait.min(SEND_TASK_IDLE_POLL);

        tokio::select! {
            _ = cancel.cancelled() => return Err(VoiceError::Cancelled),
            received = outbound.recv_async() => {
                match received {
                    Ok(payload) => sender.send(&payload).await?,
                    // The outbound queue's sending half was dropped: the
                    // session is tearing down normally.
                    Err(_) => return Ok(()),
                }
            },
            _ = tokio::time::sleep(poll) => {},
        }
    }
}

/// What the receiver observed for one payload: either it consumed it
/// internally (an ack) or it is handed back to the lifecycle runner.
pub enum Observed {
    Consumed,
    ForRunner(ControlPayload),
}

/// Reads the control socket until cancelled or the peer closes it.
/// `HeartbeatAck`s update `heartbeat` directly; every other payload is
/// forwarded to `received` for the lifecycle runner to observe.
#[instrument(skip_all)]
pub async fn run_receiver(
    mut receiver: crate::control::ControlReceiver,
    heartbeat: Arc<AsyncMutex<HeartbeatState>>,
    received: flume::Sender<ControlPayload>,
    cancel: CancellationToken,
) -> Result<(), VoiceError> {
    loop {
        let payload = tokio::select! {
            _ = cancel.cancelled() => return Err(VoiceError::Cancelled),
            payload = receiver.recv() => payload?,
        };

        let payload = match payload {
            Some(p) => p,
            None => return Ok(()),
        };

        match observe(payload, &heartbeat).await {
            Observed::Consumed => {},
            Observed::ForRunner(payload) => {
                // The lifecycle runner may have already stopped observing
                // (e.g. mid-teardown); a full queue or closed receiver is
                // not this task's problem to solve.
                let _ = received.send_async(payload).await;
            },
        }
    }
}

async fn observe(payload: ControlPayload, heartbeat: &Arc<AsyncMutex<HeartbeatState>>) -> Observed {
    if let ControlPayload::HeartbeatAck(ack) = &payload {
        heartbeat.lock().await.record_ack(ack.nonce, Instant::now());
        return Observed::Consumed;
    }

    Observed::ForRunner(payload)
}
