//! C5: Voice Session.
//!
//! Owns C2 (control), C3 (media), and C4 (codec) for one voice channel
//! connection, drives the lifecycle state machine, and exposes the public
//! `start`/`stop`/`transmit_audio` surface.

pub mod heartbeat;
pub mod pending;
pub mod reconnect;
pub mod tasks;

use crate::{
    codec::{sample_size_bytes, OpusEncoderWrapper},
    config::SessionConfig,
    constants::{PACING_COMPENSATION_FACTOR, SEND_TASK_IDLE_POLL, SESSION_DESCRIPTION_TIMEOUT},
    control::{self, ControlReceiver},
    error::{LocalError, RemoteControlError, Result, TransportError, VoiceError},
    gateway::{MainGatewayClient, RestUserClient, UpdateVoiceState},
    id::ChannelId,
    media::MediaTransport,
    rendezvous::{HandshakePair, Rendezvous, WaitOutcome},
};
use heartbeat::HeartbeatState;
use pending::PendingTransmission;
use reconnect::ReconnectAction;
use std::{sync::Arc, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::Mutex as AsyncMutex,
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use voicecore_model::{
    id::ServerId,
    payload::{Identify, Resume, SelectProtocol, Speaking},
    protocol_data::ProtocolData,
    speaking_state::SpeakingState,
    ControlPayload,
};

/// Lifecycle state of a [`VoiceSession`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionStatus {
    Offline,
    Connecting,
    Connected,
    Disconnected,
}

struct RuntimeState {
    cancel: CancellationToken,
    outbound_tx: flume::Sender<ControlPayload>,
    media: Arc<AsyncMutex<MediaTransport>>,
    ssrc: u32,
    sender_task: JoinHandle<Result<()>>,
    receiver_task: JoinHandle<Result<()>>,
    observer_task: JoinHandle<()>,
}

impl RuntimeState {
    async fn join(self) {
        self.cancel.cancel();
        let _ = self.sender_task.await;
        let _ = self.receiver_task.await;
        let _ = self.observer_task.await;
    }
}

/// Drives one voice-channel connection end to end.
///
/// Generic over the caller's main-gateway and REST collaborators so this
/// crate never depends on a concrete gateway client implementation.
pub struct VoiceSession<G, R> {
    gateway: Arc<G>,
    rendezvous: Arc<Rendezvous<R>>,
    config: SessionConfig,
    status: parking_lot::Mutex<ConnectionStatus>,
    pair: parking_lot::Mutex<Option<HandshakePair>>,
    pending: PendingTransmission,
    runtime: AsyncMutex<Option<RuntimeState>>,
}

impl<G, R> VoiceSession<G, R>
where
    G: MainGatewayClient + 'static,
    R: RestUserClient + 'static,
{
    pub fn new(gateway: Arc<G>, rendezvous: Arc<Rendezvous<R>>, config: SessionConfig) -> Self {
        Self {
            gateway,
            rendezvous,
            config,
            status: parking_lot::Mutex::new(ConnectionStatus::Offline),
            pair: parking_lot::Mutex::new(None),
            pending: PendingTransmission::new(),
            runtime: AsyncMutex::new(None),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.lock()
    }

    /// Joins `channel_id` in `server_id`. Idempotent only from `Offline`;
    /// any other status fails with [`LocalError::InvalidState`].
    #[instrument(skip(self))]
    pub async fn start(
        self: &Arc<Self>,
        server_id: ServerId,
        channel_id: ChannelId,
        self_mute: bool,
        self_deaf: bool,
    ) -> Result<()> {
        {
            let mut status = self.status.lock();
            if *status != ConnectionStatus::Offline {
                return Err(LocalError::InvalidState.into());
            }
            *status = ConnectionStatus::Connecting;
        }

        self.gateway
            .update_voice_state(UpdateVoiceState {
                server_id,
                channel_id: Some(channel_id),
                self_mute,
                self_deaf,
            })
            .await;

        let cancel = CancellationToken::new();
        let outcome = self.rendezvous.wait_for(server_id, &cancel).await;
        let pair = match outcome {
            WaitOutcome::Pair(pair) => pair,
            WaitOutcome::Timeout => {
                *self.status.lock() = ConnectionStatus::Offline;
                return Err(LocalError::InvalidState.into());
            },
            WaitOutcome::AlreadyPending => {
                *self.status.lock() = ConnectionStatus::Offline;
                return Err(LocalError::AlreadyPending.into());
            },
            WaitOutcome::Cancelled => {
                *self.status.lock() = ConnectionStatus::Offline;
                return Err(VoiceError::Cancelled);
            },
        };

        match self.connect_fresh(&pair, cancel.clone()).await {
            Ok(runtime) => {
                *self.pair.lock() = Some(pair);
                *self.runtime.lock().await = Some(runtime);
                *self.status.lock() = ConnectionStatus::Connected;
                self.spawn_supervisor();
                Ok(())
            },
            Err(e) => {
                *self.status.lock() = ConnectionStatus::Offline;
                Err(e)
            },
        }
    }

    /// Cancels all background tasks, tells the main gateway to leave the
    /// channel, and returns to `Offline`.
    #[instrument(skip(self))]
    pub async fn stop(self: &Arc<Self>, server_id: ServerId) {
        let runtime = self.runtime.lock().await.take();
        if let Some(runtime) = runtime {
            runtime.join().await;
        }

        self.gateway
            .update_voice_state(UpdateVoiceState {
                server_id,
                channel_id: None,
                self_mute: false,
                self_deaf: false,
            })
            .await;

        *self.pair.lock() = None;
        *self.status.lock() = ConnectionStatus::Offline;
    }

    /// Streams PCM16 from `pcm` to the media transport, encoding and
    /// pacing each frame. Only one caller may be transmitting at a time.
    #[instrument(skip(self, pcm))]
    pub async fn transmit_audio<P: AsyncRead + Unpin>(&self, mut pcm: P) -> Result<()> {
        let _guard = self.pending.acquire().ok_or(LocalError::AlreadyTransmitting)?;

        let (outbound_tx, media, ssrc) = {
            let runtime = self.runtime.lock().await;
            let runtime = runtime.as_ref().ok_or(LocalError::NotInitialized)?;
            (runtime.outbound_tx.clone(), runtime.media.clone(), runtime.ssrc)
        };

        let mut encoder = OpusEncoderWrapper::create(self.config.audio_optimization)?;
        let frame_bytes = sample_size_bytes(self.config.sample_duration_ms);
        let pacing_delay = Duration::from_secs_f64(
            self.config.sample_duration_ms as f64 / 1000.0 * PACING_COMPENSATION_FACTOR,
        );

        let _ = outbound_tx.send_async(speaking_payload(ssrc, SpeakingState::MICROPHONE)).await;

        let result =
            self.transmit_loop(&mut pcm, &mut encoder, &media, frame_bytes, pacing_delay).await;

        let _ = outbound_tx.send_async(speaking_payload(ssrc, SpeakingState::empty())).await;

        result
    }

    async fn transmit_loop<P: AsyncRead + Unpin>(
        &self,
        pcm: &mut P,
        encoder: &mut OpusEncoderWrapper,
        media: &Arc<AsyncMutex<MediaTransport>>,
        frame_bytes: usize,
        pacing_delay: Duration,
    ) -> Result<()> {
        let mut pcm_buf = vec![0u8; frame_bytes];
        let mut opus_buf = vec![0u8; 4000];

        loop {
            let mut read = 0;
            while read < frame_bytes {
                let n = pcm
                    .read(&mut pcm_buf[read..])
                    .await
                    .map_err(|e| VoiceError::Transport(TransportError::Io(e)))?;
                if n == 0 {
                    break;
                }
                read += n;
            }

            if read < frame_bytes {
                return Ok(());
            }

            let samples: Vec<i16> =
                pcm_buf.chunks_exact(2).map(|b| i16::from_le_bytes([b[0], b[1]])).collect();

            let written = encoder.encode(&samples, &mut opus_buf)?;

            tokio::time::sleep(pacing_delay).await;

            media.lock().await.send_frame(&opus_buf[..written], frame_bytes).await?;
        }
    }

    /// Runs the `Identify` → `Ready` → IP discovery → `SelectProtocol` →
    /// `SessionDescription` pipeline over a freshly opened control socket.
    ///
    /// The send task (and with it, heartbeating) starts as soon as `Hello`
    /// is received; `Identify`/`SelectProtocol` are enqueued through it
    /// rather than sent directly, so a slow handshake still heartbeats on
    /// schedule. The receive task only starts once `SessionDescription`
    /// arrives and the session is about to become `Connected` — until then
    /// `connect_fresh` reads the control socket itself via `receiver`.
    async fn connect_fresh(&self, pair: &HandshakePair, cancel: CancellationToken) -> Result<RuntimeState> {
        let url = voice_gateway_url(pair)?;
        let (sender, mut receiver) = control::connect(url).await?;

        let hello = await_payload(&mut receiver, |p| match p {
            ControlPayload::Hello(h) => Some(h),
            _ => None,
        })
        .await?;

        let (outbound_tx, received_rx, sender_task, receiver_task) =
            self.spawn_control_tasks(sender, receiver, hello.heartbeat_interval, cancel.clone());

        let handshake = async {
            let identify = Identify {
                server_id: pair.state.server_id,
                session_id: pair.state.session_id.clone(),
                token: pair.server.token.clone(),
                user_id: self.rendezvous.current_user().await,
            };
            enqueue(&outbound_tx, ControlPayload::Identify(identify)).await?;

            let ready = await_from_queue(&received_rx, |p| match p {
                ControlPayload::Ready(r) => Some(r),
                _ => None,
            })
            .await?;

            let mut media = MediaTransport::new();
            let mode = MediaTransport::select_encryption_mode(&ready.modes)?;
            let discovered = media.connect(ready.ip, ready.port, ready.ssrc).await?;

            enqueue(
                &outbound_tx,
                ControlPayload::SelectProtocol(SelectProtocol {
                    protocol: "udp".into(),
                    data: ProtocolData {
                        address: discovered.address,
                        mode: mode.to_request_str().into(),
                        port: discovered.port,
                    },
                }),
            )
            .await?;

            let session_description = tokio::time::timeout(
                SESSION_DESCRIPTION_TIMEOUT,
                await_from_queue(&received_rx, |p| match p {
                    ControlPayload::SessionDescription(sd) => Some(sd),
                    _ => None,
                }),
            )
            .await
            .map_err(|_| VoiceError::from(TransportError::Timeout))??;

            let secret_key: [u8; 32] = session_description
                .secret_key
                .as_slice()
                .try_into()
                .map_err(|_| VoiceError::from(RemoteControlError::VoiceGatewayProtocolViolation))?;
            media.initialize(mode, &secret_key)?;

            Ok::<_, VoiceError>((media, ready.ssrc))
        }
        .await;

        let (media, ssrc) = match handshake {
            Ok(v) => v,
            Err(e) => {
                cancel.cancel();
                let _ = sender_task.await;
                let _ = receiver_task.await;
                return Err(e);
            },
        };

        let observer_task = tokio::spawn(observe_received(received_rx));

        Ok(RuntimeState {
            cancel,
            outbound_tx,
            media: Arc::new(AsyncMutex::new(media)),
            ssrc,
            sender_task,
            receiver_task,
            observer_task,
        })
    }

    /// Re-identifies over a fresh control socket for an already-established
    /// session, reusing the existing media transport and secret key. Follows
    /// the same start-send-task-after-`Hello` sequencing as [`Self::connect_fresh`].
    async fn connect_resume(
        &self,
        pair: &HandshakePair,
        media: Arc<AsyncMutex<MediaTransport>>,
        ssrc: u32,
        cancel: CancellationToken,
    ) -> Result<RuntimeState> {
        let url = voice_gateway_url(pair)?;
        let (sender, mut receiver) = control::connect(url).await?;

        let hello = await_payload(&mut receiver, |p| match p {
            ControlPayload::Hello(h) => Some(h),
            _ => None,
        })
        .await?;

        let (outbound_tx, received_rx, sender_task, receiver_task) =
            self.spawn_control_tasks(sender, receiver, hello.heartbeat_interval, cancel.clone());

        let handshake = async {
            enqueue(
                &outbound_tx,
                ControlPayload::Resume(Resume {
                    server_id: pair.state.server_id,
                    session_id: pair.state.session_id.clone(),
                    token: pair.server.token.clone(),
                }),
            )
            .await?;

            await_from_queue(&received_rx, |p| match p {
                ControlPayload::Resumed => Some(()),
                _ => None,
            })
            .await
        }
        .await;

        if let Err(e) = handshake {
            cancel.cancel();
            let _ = sender_task.await;
            let _ = receiver_task.await;
            return Err(e);
        }

        let observer_task = tokio::spawn(observe_received(received_rx));

        Ok(RuntimeState { cancel, outbound_tx, media, ssrc, sender_task, receiver_task, observer_task })
    }

    /// Spawns the send/receive background tasks right after `Hello`, before
    /// any handshake payload is enqueued, so heartbeating starts on schedule
    /// even if the rest of the handshake is slow.
    fn spawn_control_tasks(
        &self,
        sender: crate::control::ControlSender,
        receiver: ControlReceiver,
        heartbeat_interval_ms: f64,
        cancel: CancellationToken,
    ) -> (
        flume::Sender<ControlPayload>,
        flume::Receiver<ControlPayload>,
        JoinHandle<Result<()>>,
        JoinHandle<Result<()>>,
    ) {
        let (outbound_tx, outbound_rx) = flume::unbounded();
        let (received_tx, received_rx) = flume::unbounded();
        let heartbeat = Arc::new(AsyncMutex::new(HeartbeatState::new(heartbeat_interval(heartbeat_interval_ms))));
        let safety_margin = self.config.effective_heartbeat_margin(heartbeat_interval(heartbeat_interval_ms));

        let sender_task =
            tokio::spawn(tasks::run_sender(sender, heartbeat.clone(), outbound_rx, safety_margin, cancel.clone()));
        let receiver_task = tokio::spawn(tasks::run_receiver(receiver, heartbeat, received_tx, cancel));

        (outbound_tx, received_rx, sender_task, receiver_task)
    }

    /// Watches the sender/receiver tasks and applies the reconnect policy
    /// when either exits. `Resume` is handled in-process; `Reconnect` and
    /// `Fatal` both surface as `Disconnected`/`Offline` for the caller to
    /// re-issue `start`, since rebuilding the handshake rendezvous (C1)
    /// needs a fresh main-gateway voice-state/voice-server pair this
    /// session cannot manufacture on its own.
    fn spawn_supervisor(self: &Arc<Self>) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            session.supervise().await;
        });
    }

    async fn supervise(self: Arc<Self>) {
        loop {
            tokio::time::sleep(SEND_TASK_IDLE_POLL).await;

            let finished = {
                let runtime = self.runtime.lock().await;
                match runtime.as_ref() {
                    Some(r) => r.sender_task.is_finished() || r.receiver_task.is_finished(),
                    None => return,
                }
            };

            if !finished {
                continue;
            }

            let Some(runtime) = self.runtime.lock().await.take() else { return };
            let media = runtime.media.clone();
            let ssrc = runtime.ssrc;
            let error = reap(runtime).await;

            let action = match &error {
                Some(e) => reconnect::classify(e),
                None => ReconnectAction::ExitOk,
            };

            match action {
                ReconnectAction::ExitOk => {
                    info!("voice session closed normally");
                    *self.status.lock() = ConnectionStatus::Offline;
                    return;
                },
                ReconnectAction::Fatal | ReconnectAction::Reconnect => {
                    warn!(?action, ?error, "voice session ended, caller must restart");
                    *self.status.lock() = ConnectionStatus::Offline;
                    return;
                },
                ReconnectAction::Resume => {
                    *self.status.lock() = ConnectionStatus::Disconnected;
                    match self.try_resume(media.clone(), ssrc).await {
                        Ok(()) => {
                            *self.status.lock() = ConnectionStatus::Connected;
                        },
                        Err(e) => {
                            error!(error = %e, "resume failed");
                            *self.status.lock() = ConnectionStatus::Offline;
                            return;
                        },
                    }
                },
            }
        }
    }

    async fn try_resume(
        self: &Arc<Self>,
        media: Arc<AsyncMutex<MediaTransport>>,
        ssrc: u32,
    ) -> Result<()> {
        let pair = self.pair.lock().clone().ok_or(LocalError::InvalidState)?;
        let cancel = CancellationToken::new();
        let runtime = self.connect_resume(&pair, media, ssrc, cancel).await?;
        *self.runtime.lock().await = Some(runtime);
        Ok(())
    }
}

async fn reap(runtime: RuntimeState) -> Option<VoiceError> {
    runtime.cancel.cancel();
    let sender_result = runtime.sender_task.await;
    let receiver_result = runtime.receiver_task.await;
    let _ = runtime.observer_task.await;

    match (sender_result, receiver_result) {
        (Ok(Err(e)), _) => Some(e),
        (_, Ok(Err(e))) => Some(e),
        _ => None,
    }
}

/// Logs payloads the sender/receiver split doesn't act on directly
/// (`Speaking` from other members, `ClientDisconnect`, `CodecDescription`)
/// until the receiver task's half of the channel closes.
async fn observe_received(received: flume::Receiver<ControlPayload>) {
    while let Ok(payload) = received.recv_async().await {
        debug!(?payload, "observed control payload outside the connect pipeline");
    }
}

fn speaking_payload(ssrc: u32, flags: SpeakingState) -> ControlPayload {
    ControlPayload::Speaking(Speaking { delay: Some(0), speaking: flags, ssrc, user_id: None })
}

fn heartbeat_interval(heartbeat_interval_ms: f64) -> Duration {
    Duration::from_secs_f64(heartbeat_interval_ms / 1000.0)
}

fn voice_gateway_url(pair: &HandshakePair) -> Result<url::Url> {
    let endpoint = pair.server.endpoint.as_ref().ok_or_else(|| VoiceError::from(LocalError::InvalidState))?;
    let url_str = format!(
        "wss://{}?v={}",
        endpoint.trim_end_matches(":80").trim_end_matches(":443"),
        crate::constants::VOICE_GATEWAY_VERSION
    );
    url::Url::parse(&url_str).map_err(|_| LocalError::ArgumentOutOfRange.into())
}

async fn await_payload<T>(
    receiver: &mut ControlReceiver,
    extract: impl Fn(ControlPayload) -> Option<T>,
) -> Result<T> {
    loop {
        let payload =
            receiver.recv().await?.ok_or_else(|| VoiceError::from(RemoteControlError::VoiceGatewayProtocolViolation))?;

        if let Some(value) = extract(payload) {
            return Ok(value);
        }
    }
}

/// Enqueues a payload on the send task's outbound queue. Fails only if the
/// send task has already exited (e.g. the control socket closed underneath
/// the handshake).
async fn enqueue(outbound_tx: &flume::Sender<ControlPayload>, payload: ControlPayload) -> Result<()> {
    outbound_tx.send_async(payload).await.map_err(|_| VoiceError::from(LocalError::InvalidState))
}

/// Like [`await_payload`], but reads from the receive task's forwarding
/// queue instead of the raw control socket.
async fn await_from_queue<T>(
    received: &flume::Receiver<ControlPayload>,
    extract: impl Fn(ControlPayload) -> Option<T>,
) -> Result<T> {
    loop {
        let payload = received
            .recv_async()
            .await
            .map_err(|_| VoiceError::from(RemoteControlError::VoiceGatewayProtocolViolation))?;

        if let Some(value) = extract(payload) {
            return Ok(value);
        }
    }
}
