// MIT License - Copyright (c) 2026 Peter Wright

//! The session engine: socket lifecycle, frame dispatch, and the in-memory
//! partition/zone model.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::PanelConfig;
use crate::devices::partition::{AlarmMode, Partition};
use crate::devices::zone::{Zone, ZoneType};
use crate::error::{ControllerErrorKind, QolsysError, Result};
use crate::event::{event_channel, ControllerEvent, EventReceiver, EventSender};
use crate::protocol::{
    ArmingRequest, EventPayload, FrameAssembler, FrameOutcome, PartitionPayload, SummaryRequest,
    ZonePayload,
};

type TlsStream = tokio_native_tls::TlsStream<TcpStream>;
type SharedWriter = Arc<Mutex<Option<WriteHalf<TlsStream>>>>;

/// What the reader loop should do after a chunk has been processed.
enum ChunkDisposition {
    Continue,
    /// The stream can no longer be framed; tear the connection down.
    Abort(String),
}

/// The complete per-connection model and readiness flags.
///
/// Everything lives behind one mutex so that a mutation and the decision to
/// emit for it happen as a single atomic step (the emission gate reads the
/// flags that were in force when the mutation was applied).
struct PanelState {
    partitions: HashMap<u32, Partition>,
    zones: HashMap<u32, Zone>,
    ready_for_operation: bool,
    receiving_notifications: bool,
    first_run: bool,
    assembler: FrameAssembler,
    last_refresh: Instant,
}

impl PanelState {
    fn new(max_partial_bytes: usize) -> Self {
        Self {
            partitions: HashMap::new(),
            zones: HashMap::new(),
            ready_for_operation: false,
            receiving_notifications: false,
            first_run: false,
            assembler: FrameAssembler::new(max_partial_bytes),
            last_refresh: Instant::now(),
        }
    }

    /// Discard the whole model. Run on every (re)connect so no stale device
    /// or flag survives into the new session.
    fn reset(&mut self) {
        self.partitions.clear();
        self.zones.clear();
        self.ready_for_operation = false;
        self.receiving_notifications = false;
        self.first_run = false;
        self.assembler.clear();
        self.last_refresh = Instant::now();
    }

    fn report(&self, tx: &EventSender, kind: ControllerErrorKind, message: String) {
        warn!("{kind}: {message}");
        let _ = tx.send(ControllerEvent::ControllerError { kind, message });
    }

    /// Flag teardown shared by socket timeout, socket error and framing
    /// overflow. The consumer owns the reconnect decision.
    fn mark_connection_lost(&mut self, reason: &str, tx: &EventSender) {
        self.ready_for_operation = false;
        self.receiving_notifications = false;
        self.assembler.clear();
        let _ = tx.send(ControllerEvent::PanelReceivingNotification(false));
        self.report(tx, ControllerErrorKind::ConnectionError, reason.to_string());
    }

    /// Feed one inbound chunk through reassembly and dispatch.
    fn handle_chunk(&mut self, chunk: &[u8], tx: &EventSender) -> ChunkDisposition {
        match self.assembler.feed(chunk) {
            FrameOutcome::Ack => {
                debug!("Panel acknowledgment");
                ChunkDisposition::Continue
            }
            FrameOutcome::Buffered => ChunkDisposition::Continue,
            FrameOutcome::Frame { payload, raw } => {
                self.last_refresh = Instant::now();
                self.dispatch(payload, &raw, tx);
                ChunkDisposition::Continue
            }
            FrameOutcome::Overflow { buffered } => ChunkDisposition::Abort(format!(
                "Partial message buffer overflow ({buffered} bytes)"
            )),
        }
    }

    fn dispatch(&mut self, payload: EventPayload, raw: &str, tx: &EventSender) {
        match payload.event.as_deref() {
            Some("INFO") => match payload.info_type.as_deref() {
                Some("SUMMARY") => self.process_summary(&payload.partition_list, tx),
                _ => self.report(
                    tx,
                    ControllerErrorKind::InvalidPayloadInfoType,
                    format!("Received invalid payload info type: {raw}"),
                ),
            },

            Some("ZONE_EVENT") => match payload.zone_event_type.as_deref() {
                Some("ZONE_UPDATE" | "ZONE_ACTIVE") => {
                    self.process_zone_event(payload.zone.as_ref(), tx);
                }
                _ => self.report(
                    tx,
                    ControllerErrorKind::InvalidZoneEventType,
                    format!("Received invalid zone event type: {raw}"),
                ),
            },

            Some("ARMING") => match payload.arming_type.as_deref().map(AlarmMode::from_wire) {
                Some(mode) if mode != AlarmMode::Unknown => {
                    self.apply_partition_mode(payload.partition_id, mode, tx);
                }
                _ => self.report(
                    tx,
                    ControllerErrorKind::InvalidArmingType,
                    format!("Received invalid arming type: {raw}"),
                ),
            },

            Some("ALARM") => match payload.alarm_type.as_deref() {
                Some("POLICE") => {
                    self.apply_partition_mode(payload.partition_id, AlarmMode::AlarmPolice, tx);
                }
                Some("FIRE") => {
                    self.apply_partition_mode(payload.partition_id, AlarmMode::AlarmFire, tx);
                }
                Some("AUXILIARY") => {
                    self.apply_partition_mode(payload.partition_id, AlarmMode::AlarmAuxiliary, tx);
                }
                _ => self.report(
                    tx,
                    ControllerErrorKind::InvalidAlarmType,
                    format!("Received invalid alarm type: {raw}"),
                ),
            },

            Some("ERROR") => {
                let error_type = payload.error_type.as_deref().unwrap_or("unknown");
                let description = payload.description.as_deref().unwrap_or("");
                self.report(
                    tx,
                    ControllerErrorKind::QolsysPanelError,
                    format!("Error received({error_type}):{description}"),
                );
            }

            _ => self.report(
                tx,
                ControllerErrorKind::InvalidPayloadEvent,
                format!("Received invalid payload event: {raw}"),
            ),
        }
    }

    /// Apply an arming/alarm mode announced for one partition. Emits only on
    /// a genuine transition, and only once the consumer is receiving.
    fn apply_partition_mode(
        &mut self,
        partition_id: Option<u32>,
        mode: AlarmMode,
        tx: &EventSender,
    ) {
        let Some(id) = partition_id else {
            debug!("Arming event without partition id, ignoring");
            return;
        };
        let Some(partition) = self.partitions.get_mut(&id) else {
            debug!("Arming event for unknown partition {id}, ignoring");
            return;
        };
        if partition.set_alarm_mode(mode)
            && self.ready_for_operation
            && self.receiving_notifications
        {
            let _ = tx.send(ControllerEvent::PartitionAlarmModeChange(partition.clone()));
        }
    }

    /// Apply a single zone status update. Zones are created by summaries
    /// only; an update for an unseen zone is dropped.
    fn process_zone_event(&mut self, zone: Option<&ZonePayload>, tx: &EventSender) {
        let Some(payload) = zone else {
            debug!("Zone event without zone body, ignoring");
            return;
        };
        let Some(zone) = self.zones.get_mut(&payload.zone_id) else {
            debug!("Status for unknown zone {}, ignoring", payload.zone_id);
            return;
        };
        if zone.set_status_from_string(&payload.status)
            && self.ready_for_operation
            && self.receiving_notifications
        {
            let _ = tx.send(ControllerEvent::ZoneStatusChange(zone.clone()));
        }
    }

    /// Ingest a full SUMMARY roster.
    ///
    /// This is the only place partitions and zones are created. Names and
    /// secure_arm are overwritten unconditionally; status updates follow the
    /// summary emission rule: announce when a change lands on a ready model,
    /// or announce everything on the first summary after operation starts.
    fn process_summary(&mut self, roster: &[PartitionPayload], tx: &EventSender) {
        for part in roster {
            let partition = self
                .partitions
                .entry(part.partition_id)
                .or_insert_with(|| Partition::new(part.partition_id));
            partition.name = part.name.clone();
            partition.secure_arm = part.secure_arm;

            let changed = partition.set_alarm_mode_from_string(&part.status);
            if (changed && self.ready_for_operation) || self.first_run {
                let _ = tx.send(ControllerEvent::PartitionAlarmModeChange(partition.clone()));
            }

            for zone_entry in &part.zone_list {
                let zone = self
                    .zones
                    .entry(zone_entry.zone_id)
                    .or_insert_with(|| Zone::new(zone_entry.zone_id));
                zone.set_type(&zone_entry.zone_type);
                if zone.zone_type() == ZoneType::Unknown {
                    debug!(
                        "Zone {}: no handler available for type {:?}",
                        zone_entry.zone_id, zone_entry.zone_type
                    );
                }
                zone.name = zone_entry.name.clone();
                if let Some(pid) = zone_entry.partition_id {
                    zone.partition_id = pid;
                }

                let changed = zone.set_status_from_string(&zone_entry.status);
                if (changed && self.ready_for_operation) || self.first_run {
                    let _ = tx.send(ControllerEvent::ZoneStatusChange(zone.clone()));
                }
            }
        }

        if !self.ready_for_operation {
            self.ready_for_operation = true;
            info!(
                "Panel ready: {} partitions, {} zones",
                self.partitions.len(),
                self.zones.len()
            );
            let _ = tx.send(ControllerEvent::PanelReadyForOperation(true));
        }

        self.first_run = false;
    }
}

/// Persistent client session for one Qolsys IQ panel.
///
/// Owns the TLS socket, a reader task that reassembles and dispatches
/// inbound frames, and a keepalive task that requests a summary whenever the
/// stream has been quiet for too long. The engine never reconnects on its
/// own: after a `ControllerError` of kind `ConnectionError` the consumer
/// decides when to call [`connect`](QolsysController::connect) again.
pub struct QolsysController {
    config: PanelConfig,
    event_tx: EventSender,
    state: Arc<Mutex<PanelState>>,
    writer: SharedWriter,
    reader_handle: Option<JoinHandle<()>>,
    keepalive_handle: Option<JoinHandle<()>>,
}

impl QolsysController {
    pub fn new(config: PanelConfig) -> Self {
        let (event_tx, _event_rx) = event_channel(256);
        Self {
            state: Arc::new(Mutex::new(PanelState::new(config.max_partial_bytes))),
            writer: Arc::new(Mutex::new(None)),
            config,
            event_tx,
            reader_handle: None,
            keepalive_handle: None,
        }
    }

    /// Subscribe to controller events.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// (Re)establish the session.
    ///
    /// Discards the entire model and all readiness flags, opens the TLS
    /// socket and immediately requests a summary so the model can be
    /// rebuilt. Any reader or keepalive task from a previous connection is
    /// cancelled first.
    pub async fn connect(&mut self) -> Result<()> {
        self.teardown().await;
        self.state.lock().await.reset();

        info!(
            "Connecting to panel at {}:{}",
            self.config.host, self.config.port
        );
        let tcp = TcpStream::connect((self.config.host.as_str(), self.config.port)).await?;

        // The panel presents a self-signed certificate, so there is nothing
        // to verify against.
        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()?;
        let connector = tokio_native_tls::TlsConnector::from(connector);
        let stream = connector.connect(&self.config.host, tcp).await?;
        debug!("TLS session established");

        let (reader, writer) = tokio::io::split(stream);
        *self.writer.lock().await = Some(writer);

        self.reader_handle = Some(spawn_reader_task(
            reader,
            self.state.clone(),
            self.writer.clone(),
            self.event_tx.clone(),
            Duration::from_millis(self.config.socket_timeout_ms),
        ));

        // Request the roster right away; readiness is announced once it has
        // been ingested.
        self.refresh().await
    }

    /// Begin notification streaming and keepalive.
    ///
    /// Intended to be called from the consumer's `PanelReadyForOperation`
    /// handler. The summary that answers the refresh issued here is
    /// re-announced in full (`first_run`) to seed the consumer's view.
    pub async fn start_operation(&mut self) -> Result<()> {
        info!("Starting panel operation");
        {
            let mut state = self.state.lock().await;
            state.receiving_notifications = true;
            state.first_run = true;
        }
        let _ = self
            .event_tx
            .send(ControllerEvent::PanelReceivingNotification(true));

        self.refresh().await?;

        if let Some(handle) = self.keepalive_handle.take() {
            handle.abort();
        }
        self.keepalive_handle = Some(spawn_keepalive_task(
            self.state.clone(),
            self.writer.clone(),
            self.config.secure_token.clone(),
            Duration::from_millis(self.config.keepalive_timeout_ms),
        ));
        Ok(())
    }

    /// Request a fresh summary from the panel.
    pub async fn refresh(&self) -> Result<()> {
        send_summary_request(&self.writer, &self.config.secure_token).await
    }

    /// Arm or disarm a partition.
    ///
    /// Only `Disarm`, `ArmStay` and `ArmAway` can be requested; any other
    /// mode is rejected with `InvalidArmingType` and nothing is written.
    /// `delay_secs` is the exit delay granted before arming completes and
    /// `bypass` force-arms over open zones.
    pub async fn send_arm_command(
        &self,
        mode: AlarmMode,
        partition_id: u32,
        delay_secs: u32,
        bypass: bool,
    ) -> Result<()> {
        if !mode.is_sendable() {
            let message = format!("Sending invalid arming type: {mode}");
            warn!("{message}");
            let _ = self.event_tx.send(ControllerEvent::ControllerError {
                kind: ControllerErrorKind::InvalidArmingType,
                message,
            });
            return Err(QolsysError::InvalidArmingType { mode });
        }

        debug!("Sending {mode} for partition {partition_id}");
        let frame = serde_json::to_string(&ArmingRequest::new(
            &self.config.secure_token,
            &self.config.user_pin_code,
            partition_id,
            mode.as_wire(),
            delay_secs,
            bypass,
        ))?;
        send_frame(&self.writer, &frame).await
    }

    /// Snapshot of all partitions, keyed by partition id.
    pub async fn partitions(&self) -> HashMap<u32, Partition> {
        self.state.lock().await.partitions.clone()
    }

    /// Snapshot of all zones, keyed by zone id.
    pub async fn zones(&self) -> HashMap<u32, Zone> {
        self.state.lock().await.zones.clone()
    }

    /// Whether the first summary of this connection has been ingested.
    pub async fn ready_for_operation(&self) -> bool {
        self.state.lock().await.ready_for_operation
    }

    /// Whether live change notifications are currently being emitted.
    pub async fn receiving_notifications(&self) -> bool {
        self.state.lock().await.receiving_notifications
    }

    /// Close the session and discard the model.
    pub async fn disconnect(&mut self) {
        info!("Disconnecting from panel");
        self.teardown().await;
        self.state.lock().await.reset();
    }

    async fn teardown(&mut self) {
        if let Some(handle) = self.keepalive_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
        }
        *self.writer.lock().await = None;
    }
}

impl Drop for QolsysController {
    fn drop(&mut self) {
        if let Some(handle) = self.keepalive_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
        }
    }
}

async fn send_frame(writer: &SharedWriter, frame: &str) -> Result<()> {
    let mut guard = writer.lock().await;
    let Some(w) = guard.as_mut() else {
        return Err(QolsysError::Disconnected);
    };
    w.write_all(frame.as_bytes()).await?;
    w.flush().await?;
    Ok(())
}

async fn send_summary_request(writer: &SharedWriter, token: &str) -> Result<()> {
    let frame = serde_json::to_string(&SummaryRequest::new(token))?;
    send_frame(writer, &frame).await
}

/// Read loop: chunks are processed to completion, in order, before the next
/// read. Timeout, EOF, read error and framing overflow all funnel into the
/// same connection-loss path and end the task.
fn spawn_reader_task(
    mut reader: ReadHalf<TlsStream>,
    state: Arc<Mutex<PanelState>>,
    writer: SharedWriter,
    event_tx: EventSender,
    socket_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        loop {
            let failure = match timeout(socket_timeout, reader.read(&mut buf)).await {
                Err(_) => Some("Timeout".to_string()),
                Ok(Ok(0)) => Some("Connection closed by panel".to_string()),
                Ok(Err(e)) => Some(e.to_string()),
                Ok(Ok(n)) => {
                    let mut st = state.lock().await;
                    match st.handle_chunk(&buf[..n], &event_tx) {
                        ChunkDisposition::Continue => None,
                        ChunkDisposition::Abort(reason) => Some(reason),
                    }
                }
            };

            if let Some(reason) = failure {
                error!("Reader: {reason}");
                *writer.lock().await = None;
                state.lock().await.mark_connection_lost(&reason, &event_tx);
                break;
            }
        }
    })
}

/// Self-rescheduling keepalive: checks at half the keepalive timeout and
/// requests a summary whenever the stream has been quiet for the full
/// timeout. The period drifts since each check reschedules itself; the
/// contract is only "at least every N seconds".
fn spawn_keepalive_task(
    state: Arc<Mutex<PanelState>>,
    writer: SharedWriter,
    token: String,
    keepalive_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(keepalive_timeout / 2).await;

            let due = {
                let st = state.lock().await;
                st.last_refresh.elapsed() >= keepalive_timeout
            };
            if !due {
                continue;
            }

            debug!("Keepalive: requesting summary refresh");
            if let Err(e) = send_summary_request(&writer, &token).await {
                warn!("Keepalive refresh failed: {e}");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::zone::ZoneStatus;

    fn test_state() -> (PanelState, EventSender, EventReceiver) {
        let (tx, rx) = event_channel(64);
        (PanelState::new(256 * 1024), tx, rx)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn summary_frame(partition_status: &str, zone_status: &str) -> String {
        format!(
            concat!(
                r#"{{"event":"INFO","info_type":"SUMMARY","partition_list":[{{"#,
                r#""partition_id":"0","name":"Home","secure_arm":false,"status":"{p}","#,
                r#""zone_list":[{{"zone_id":100,"name":"Front Door","partition_id":"0","#,
                r#""type":"Door_Window","status":"{z}"}}]}}]}}"#
            ),
            p = partition_status,
            z = zone_status,
        )
    }

    fn feed(state: &mut PanelState, tx: &EventSender, frame: &str) {
        match state.handle_chunk(frame.as_bytes(), tx) {
            ChunkDisposition::Continue => {}
            ChunkDisposition::Abort(reason) => panic!("unexpected abort: {reason}"),
        }
    }

    #[test]
    fn test_first_run_summary_seeds_everything() {
        let (mut state, tx, mut rx) = test_state();
        state.receiving_notifications = true;
        state.first_run = true;

        feed(&mut state, &tx, &summary_frame("DISARM", "Closed"));

        let events = drain(&mut rx);
        let partition_changes = events
            .iter()
            .filter(|e| matches!(e, ControllerEvent::PartitionAlarmModeChange(_)))
            .count();
        let zone_changes = events
            .iter()
            .filter(|e| matches!(e, ControllerEvent::ZoneStatusChange(_)))
            .count();
        let ready = events
            .iter()
            .filter(|e| matches!(e, ControllerEvent::PanelReadyForOperation(true)))
            .count();
        assert_eq!(partition_changes, 1);
        assert_eq!(zone_changes, 1);
        assert_eq!(ready, 1);

        assert!(state.ready_for_operation);
        assert!(!state.first_run);
        assert_eq!(state.partitions[&0].status(), AlarmMode::Disarm);
        assert_eq!(state.zones[&100].status(), ZoneStatus::Closed);
        assert_eq!(state.zones[&100].partition_id, 0);
        assert_eq!(state.zones[&100].name, "Front Door");
    }

    #[test]
    fn test_identical_summary_is_silent() {
        let (mut state, tx, mut rx) = test_state();
        state.receiving_notifications = true;
        state.first_run = true;
        feed(&mut state, &tx, &summary_frame("DISARM", "Closed"));
        drain(&mut rx);

        feed(&mut state, &tx, &summary_frame("DISARM", "Closed"));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_summary_change_emits_once_ready() {
        let (mut state, tx, mut rx) = test_state();
        state.first_run = true;
        feed(&mut state, &tx, &summary_frame("DISARM", "Closed"));
        drain(&mut rx);

        // Changed statuses on a ready model emit even though notifications
        // have not been started: summaries use the looser rule.
        feed(&mut state, &tx, &summary_frame("ARM_STAY", "Open"));
        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, ControllerEvent::PartitionAlarmModeChange(p) if p.status() == AlarmMode::ArmStay)));
        assert!(events
            .iter()
            .any(|e| matches!(e, ControllerEvent::ZoneStatusChange(z) if z.status() == ZoneStatus::Open)));
        // PanelReadyForOperation is not re-announced
        assert!(!events
            .iter()
            .any(|e| matches!(e, ControllerEvent::PanelReadyForOperation(_))));
    }

    #[test]
    fn test_first_summary_before_operation_is_applied_silently() {
        let (mut state, tx, mut rx) = test_state();

        // connect() flow: first_run is still false, notifications off
        feed(&mut state, &tx, &summary_frame("ARM_AWAY", "Open"));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ControllerEvent::PanelReadyForOperation(true)
        ));
        // ...but the model was fully populated
        assert_eq!(state.partitions[&0].status(), AlarmMode::ArmAway);
        assert_eq!(state.zones[&100].status(), ZoneStatus::Open);
    }

    #[test]
    fn test_zone_event_gated_on_both_flags() {
        let (mut state, tx, mut rx) = test_state();
        feed(&mut state, &tx, &summary_frame("DISARM", "Closed"));
        drain(&mut rx);

        let open_event =
            r#"{"event":"ZONE_EVENT","zone_event_type":"ZONE_UPDATE","zone":{"zone_id":100,"status":"Open"}}"#;

        // Ready but not receiving: applied silently
        feed(&mut state, &tx, open_event);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(state.zones[&100].status(), ZoneStatus::Open);

        // Receiving: a genuine transition emits
        state.receiving_notifications = true;
        let close_event =
            r#"{"event":"ZONE_EVENT","zone_event_type":"ZONE_ACTIVE","zone":{"zone_id":100,"status":"Closed"}}"#;
        feed(&mut state, &tx, close_event);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ControllerEvent::ZoneStatusChange(z) if z.zone_id == 100 && z.status() == ZoneStatus::Closed
        ));

        // Re-announcement of the same status is a no-op
        feed(&mut state, &tx, close_event);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_zone_event_for_unknown_zone_is_dropped() {
        let (mut state, tx, mut rx) = test_state();
        state.ready_for_operation = true;
        state.receiving_notifications = true;

        feed(
            &mut state,
            &tx,
            r#"{"event":"ZONE_EVENT","zone_event_type":"ZONE_UPDATE","zone":{"zone_id":42,"status":"Open"}}"#,
        );
        assert!(drain(&mut rx).is_empty());
        assert!(state.zones.is_empty());
    }

    #[test]
    fn test_entry_delay_preserves_previous_status() {
        let (mut state, tx, mut rx) = test_state();
        state.first_run = true;
        feed(&mut state, &tx, &summary_frame("ARM_STAY", "Closed"));
        state.receiving_notifications = true;
        drain(&mut rx);

        feed(
            &mut state,
            &tx,
            r#"{"event":"ARMING","arming_type":"ENTRY_DELAY","partition_id":0}"#,
        );
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ControllerEvent::PartitionAlarmModeChange(p) => {
                assert_eq!(p.status(), AlarmMode::EntryDelay);
                assert_eq!(p.previous_status(), AlarmMode::ArmStay);
            }
            other => panic!("expected PartitionAlarmModeChange, got {other:?}"),
        }
    }

    #[test]
    fn test_alarm_event_sets_alarm_mode() {
        let (mut state, tx, mut rx) = test_state();
        state.first_run = true;
        feed(&mut state, &tx, &summary_frame("ARM_AWAY", "Closed"));
        state.receiving_notifications = true;
        drain(&mut rx);

        feed(
            &mut state,
            &tx,
            r#"{"event":"ALARM","alarm_type":"POLICE","partition_id":0}"#,
        );
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ControllerEvent::PartitionAlarmModeChange(p) => {
                assert_eq!(p.status(), AlarmMode::AlarmPolice);
                assert!(p.alarm_active());
            }
            other => panic!("expected PartitionAlarmModeChange, got {other:?}"),
        }
    }

    #[test]
    fn test_split_frame_dispatches_once() {
        let (mut state, tx, mut rx) = test_state();
        state.first_run = true;
        feed(&mut state, &tx, &summary_frame("ARM_AWAY", "Closed"));
        state.receiving_notifications = true;
        drain(&mut rx);

        feed(&mut state, &tx, r#"{"event":"ARM"#);
        assert!(drain(&mut rx).is_empty());
        feed(&mut state, &tx, r#"ING","arming_type":"DISARM","partition_id":0}"#);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ControllerEvent::PartitionAlarmModeChange(p) if p.status() == AlarmMode::Disarm
        ));
    }

    #[test]
    fn test_ack_clears_pending_fragment() {
        let (mut state, tx, mut rx) = test_state();
        feed(&mut state, &tx, r#"{"event":"IN"#);
        feed(&mut state, &tx, "ACK");
        assert_eq!(state.assembler.pending(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_incomplete_json_is_not_reported_as_error() {
        let (mut state, tx, mut rx) = test_state();
        feed(&mut state, &tx, r#"{"event":"INFO","info_type"#);
        assert!(drain(&mut rx).is_empty());
        assert!(state.assembler.pending() > 0);
    }

    #[test]
    fn test_invalid_discriminators_are_reported() {
        let cases: &[(&str, ControllerErrorKind)] = &[
            (
                r#"{"event":"PING"}"#,
                ControllerErrorKind::InvalidPayloadEvent,
            ),
            (
                r#"{"event":"INFO","info_type":"DIAGNOSTICS"}"#,
                ControllerErrorKind::InvalidPayloadInfoType,
            ),
            (
                r#"{"event":"ZONE_EVENT","zone_event_type":"ZONE_DELETED"}"#,
                ControllerErrorKind::InvalidZoneEventType,
            ),
            (
                r#"{"event":"ARMING","arming_type":"ARM_NIGHT","partition_id":0}"#,
                ControllerErrorKind::InvalidArmingType,
            ),
            (
                r#"{"event":"ALARM","alarm_type":"MEDICAL","partition_id":0}"#,
                ControllerErrorKind::InvalidAlarmType,
            ),
        ];

        for (frame, expected_kind) in cases {
            let (mut state, tx, mut rx) = test_state();
            state.ready_for_operation = true;
            state.receiving_notifications = true;
            feed(&mut state, &tx, frame);

            let events = drain(&mut rx);
            assert_eq!(events.len(), 1, "frame: {frame}");
            match &events[0] {
                ControllerEvent::ControllerError { kind, message } => {
                    assert_eq!(kind, expected_kind);
                    // The raw frame text is included for diagnosis
                    assert!(message.contains(frame), "message: {message}");
                }
                other => panic!("expected ControllerError, got {other:?}"),
            }
            // The model is left unmodified
            assert!(state.partitions.is_empty());
            assert!(state.zones.is_empty());
        }
    }

    #[test]
    fn test_panel_error_report_carries_description() {
        let (mut state, tx, mut rx) = test_state();
        feed(
            &mut state,
            &tx,
            r#"{"event":"ERROR","error_type":"usercode","description":"Invalid user code"}"#,
        );
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ControllerEvent::ControllerError { kind, message } => {
                assert_eq!(*kind, ControllerErrorKind::QolsysPanelError);
                assert_eq!(message, "Error received(usercode):Invalid user code");
            }
            other => panic!("expected ControllerError, got {other:?}"),
        }
    }

    #[test]
    fn test_buffer_overflow_aborts_stream() {
        let (tx, mut rx) = event_channel(64);
        let mut state = PanelState::new(16);
        state.ready_for_operation = true;
        state.receiving_notifications = true;

        assert!(matches!(
            state.handle_chunk(br#"{"event":"IN"#, &tx),
            ChunkDisposition::Continue
        ));
        let disposition = state.handle_chunk(b"AAAAAAAAAAAAAAAAAAAA", &tx);
        let reason = match disposition {
            ChunkDisposition::Abort(reason) => reason,
            ChunkDisposition::Continue => panic!("expected abort on overflow"),
        };

        // The reader task funnels the reason into the loss path
        state.mark_connection_lost(&reason, &tx);
        let events = drain(&mut rx);
        assert!(matches!(
            events[0],
            ControllerEvent::PanelReceivingNotification(false)
        ));
        assert!(matches!(
            &events[1],
            ControllerEvent::ControllerError {
                kind: ControllerErrorKind::ConnectionError,
                ..
            }
        ));
        assert!(!state.ready_for_operation);
        assert!(!state.receiving_notifications);
    }

    #[test]
    fn test_connection_loss_resets_flags_and_emits_once() {
        let (mut state, tx, mut rx) = test_state();
        state.first_run = true;
        feed(&mut state, &tx, &summary_frame("DISARM", "Closed"));
        state.receiving_notifications = true;
        drain(&mut rx);

        state.mark_connection_lost("Timeout", &tx);

        let events = drain(&mut rx);
        let receiving_flips = events
            .iter()
            .filter(|e| matches!(e, ControllerEvent::PanelReceivingNotification(false)))
            .count();
        assert_eq!(receiving_flips, 1);
        assert!(events.iter().any(|e| matches!(
            e,
            ControllerEvent::ControllerError {
                kind: ControllerErrorKind::ConnectionError,
                ..
            }
        )));
        assert!(!state.ready_for_operation);
        assert!(!state.receiving_notifications);

        // The model itself survives until the next connect() resets it
        assert!(!state.partitions.is_empty());
        state.reset();
        assert!(state.partitions.is_empty());
        assert!(state.zones.is_empty());
    }

    #[tokio::test]
    async fn test_send_arm_command_rejects_unsendable_mode() {
        let controller = QolsysController::new(PanelConfig::default());
        let mut rx = controller.subscribe();

        for mode in [
            AlarmMode::EntryDelay,
            AlarmMode::ExitDelay,
            AlarmMode::AlarmFire,
            AlarmMode::Unknown,
        ] {
            let err = controller
                .send_arm_command(mode, 0, 0, false)
                .await
                .unwrap_err();
            assert!(matches!(err, QolsysError::InvalidArmingType { .. }));
            match rx.try_recv().unwrap() {
                ControllerEvent::ControllerError { kind, .. } => {
                    assert_eq!(kind, ControllerErrorKind::InvalidArmingType);
                }
                other => panic!("expected ControllerError, got {other:?}"),
            }
        }

        // A sendable mode with no socket fails as disconnected, with no
        // error report on the bus
        let err = controller
            .send_arm_command(AlarmMode::Disarm, 0, 0, true)
            .await
            .unwrap_err();
        assert!(matches!(err, QolsysError::Disconnected));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_summary_overwrites_name_and_secure_arm() {
        let (mut state, tx, mut rx) = test_state();
        feed(&mut state, &tx, &summary_frame("DISARM", "Closed"));
        drain(&mut rx);

        let renamed = concat!(
            r#"{"event":"INFO","info_type":"SUMMARY","partition_list":[{"#,
            r#""partition_id":"0","name":"Cottage","secure_arm":true,"status":"DISARM","#,
            r#""zone_list":[]}]}"#
        );
        feed(&mut state, &tx, renamed);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(state.partitions[&0].name, "Cottage");
        assert!(state.partitions[&0].secure_arm);
    }
}
