//! The Oppo telnet media player entity

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use oppo_api::{
    is_success, parse_volume, Command, OppoClient, PlaybackStatus, PowerStatus, TelnetClient,
    Transport,
};
use parking_lot::RwLock;

use crate::config::PlayerConfig;
use crate::entity::{
    DeviceInfo, MediaPlayerDeviceClass, MediaPlayerEntity, MediaPlayerEntityFeature,
    MediaPlayerState, DOMAIN,
};
use crate::state::{NoopStateWriter, PlayerSnapshot, StateWriter};

const MANUFACTURER: &str = "Oppo";
const MODEL: &str = "UDP-203";

/// Outcome of a single command exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Command written, no response requested
    Sent,
    /// Trimmed response text
    Response(String),
    /// The exchange failed; the failure has already been logged
    Failed,
}

impl Reply {
    /// Whether the exchange produced something usable.
    ///
    /// An empty response counts as a failure.
    pub fn succeeded(&self) -> bool {
        match self {
            Reply::Sent => true,
            Reply::Response(text) => !text.is_empty(),
            Reply::Failed => false,
        }
    }

    /// Response text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Response(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Media player entity for one Oppo UDP-203.
///
/// Holds a local cache of power/playback state, volume and mute flag. The
/// cache is only updated by command outcomes and [`MediaPlayerEntity::update`]
/// polls; the device never pushes changes. Every network call opens and
/// closes its own connection, and overlapping calls are not serialized.
pub struct OppoMediaPlayer<T = TelnetClient> {
    host: String,
    client: OppoClient<T>,
    cache: RwLock<PlayerSnapshot>,
    writer: Arc<dyn StateWriter>,
}

impl OppoMediaPlayer<TelnetClient> {
    /// Player on port 23 with no state-change listener
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_client(host, OppoClient::new(), Arc::new(NoopStateWriter))
    }

    /// Player built from a config entry
    pub fn from_config(config: &PlayerConfig, writer: Arc<dyn StateWriter>) -> Self {
        Self::with_client(
            config.host.clone(),
            OppoClient::with_config(config.telnet_config()),
            writer,
        )
    }
}

impl<T: Transport> OppoMediaPlayer<T> {
    /// Player over an arbitrary client and state-change hook
    pub fn with_client(
        host: impl Into<String>,
        client: OppoClient<T>,
        writer: Arc<dyn StateWriter>,
    ) -> Self {
        Self {
            host: host.into(),
            client,
            cache: RwLock::new(PlayerSnapshot::default()),
            writer,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn client(&self) -> &OppoClient<T> {
        &self.client
    }

    /// Run one command exchange, absorbing every failure.
    ///
    /// Errors are logged here and reported as [`Reply::Failed`]; nothing is
    /// propagated to the caller.
    pub async fn send_command(&self, command: &Command, expect_response: bool) -> Reply {
        let result = if expect_response {
            self.client
                .query(&self.host, command)
                .await
                .map(Reply::Response)
        } else {
            self.client.send(&self.host, command).await.map(|_| Reply::Sent)
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(host = %self.host, "Failed to send command {}: {}", command, e);
                Reply::Failed
            }
        }
    }

    fn write_state(&self) {
        let snapshot = *self.cache.read();
        self.writer.write_state(snapshot);
    }

    /// Send a success-only command; on success apply `apply` to the cache
    /// and notify the host.
    async fn send_and_apply(&self, command: Command, apply: impl FnOnce(&mut PlayerSnapshot)) {
        if self.send_command(&command, false).await.succeeded() {
            apply(&mut *self.cache.write());
            self.write_state();
        }
    }

    async fn refresh_power(&self) {
        let Reply::Response(response) = self.send_command(&Command::QueryPower, true).await else {
            return;
        };

        match PowerStatus::from_response(&response) {
            Some(PowerStatus::On) => {
                // Only promote a believed-off player; a known PLAYING/PAUSED
                // state is kept.
                let mut cache = self.cache.write();
                if cache.state == MediaPlayerState::Off {
                    cache.state = MediaPlayerState::Idle;
                }
            }
            Some(PowerStatus::Off) => self.cache.write().state = MediaPlayerState::Off,
            None => {}
        }
    }

    async fn refresh_volume(&self) {
        let Reply::Response(response) = self.send_command(&Command::QueryVolume, true).await else {
            return;
        };

        match parse_volume(&response) {
            Ok(Some(level)) => self.cache.write().volume = f64::from(level) / 100.0,
            Ok(None) => {}
            Err(e) => tracing::warn!(host = %self.host, "Failed to parse volume: {}", e),
        }
    }

    async fn refresh_playback(&self) {
        let Reply::Response(response) = self.send_command(&Command::QueryPlayback, true).await
        else {
            return;
        };

        if let Some(status) = PlaybackStatus::from_response(&response) {
            self.cache.write().state = status.into();
        }
    }
}

/// Convert a normalized volume to the device's 0-100 scale
pub fn volume_to_percent(volume: f64) -> u8 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[async_trait]
impl<T: Transport> MediaPlayerEntity for OppoMediaPlayer<T> {
    fn unique_id(&self) -> String {
        format!("{}_{}", DOMAIN, self.host)
    }

    fn name(&self) -> String {
        format!("Oppo Telnet {}", self.host)
    }

    fn device_class(&self) -> MediaPlayerDeviceClass {
        MediaPlayerDeviceClass::Tv
    }

    fn supported_features(&self) -> MediaPlayerEntityFeature {
        MediaPlayerEntityFeature::PLAY
            | MediaPlayerEntityFeature::STOP
            | MediaPlayerEntityFeature::PAUSE
            | MediaPlayerEntityFeature::VOLUME_SET
            | MediaPlayerEntityFeature::VOLUME_MUTE
            | MediaPlayerEntityFeature::TURN_ON
            | MediaPlayerEntityFeature::TURN_OFF
            | MediaPlayerEntityFeature::NEXT_TRACK
            | MediaPlayerEntityFeature::PREVIOUS_TRACK
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: BTreeSet::from([(DOMAIN.to_string(), self.unique_id())]),
            name: self.name(),
            manufacturer: MANUFACTURER.to_string(),
            model: MODEL.to_string(),
        }
    }

    fn state(&self) -> MediaPlayerState {
        self.cache.read().state
    }

    fn volume_level(&self) -> f64 {
        self.cache.read().volume
    }

    fn is_volume_muted(&self) -> bool {
        self.cache.read().muted
    }

    fn snapshot(&self) -> PlayerSnapshot {
        *self.cache.read()
    }

    async fn set_volume_level(&self, volume: f64) {
        if !volume.is_finite() {
            tracing::warn!(host = %self.host, "Ignoring non-finite volume {}", volume);
            return;
        }

        let volume = volume.clamp(0.0, 1.0);
        let level = volume_to_percent(volume);

        match Command::set_volume(level) {
            Ok(command) => {
                let reply = self.send_command(&command, true).await;
                if reply.text().is_some_and(is_success) {
                    self.cache.write().volume = volume;
                    self.write_state();
                } else {
                    tracing::warn!(
                        host = %self.host,
                        "Failed to set volume to {}: {:?}",
                        level,
                        reply
                    );
                }
            }
            Err(e) => tracing::warn!(host = %self.host, "Rejected volume {}: {}", level, e),
        }

        // Resynchronize with whatever the device actually applied
        self.update().await;
    }

    async fn media_play(&self) {
        self.send_and_apply(Command::Play, |cache| cache.state = MediaPlayerState::Playing)
            .await;
    }

    async fn media_stop(&self) {
        self.send_and_apply(Command::Stop, |cache| cache.state = MediaPlayerState::Idle)
            .await;
    }

    async fn media_pause(&self) {
        self.send_and_apply(Command::Pause, |cache| cache.state = MediaPlayerState::Paused)
            .await;
    }

    async fn media_next_track(&self) {
        self.send_command(&Command::NextTrack, false).await;
    }

    async fn media_previous_track(&self) {
        self.send_command(&Command::PreviousTrack, false).await;
    }

    async fn turn_on(&self) {
        self.send_and_apply(Command::PowerOn, |cache| cache.state = MediaPlayerState::Idle)
            .await;
    }

    async fn turn_off(&self) {
        self.send_and_apply(Command::PowerOff, |cache| cache.state = MediaPlayerState::Off)
            .await;
    }

    async fn mute_volume(&self, mute: bool) {
        // #MUT toggles on the device; the cache records what the host asked for
        self.send_and_apply(Command::MuteToggle, |cache| cache.muted = mute)
            .await;
    }

    async fn update(&self) {
        self.refresh_power().await;
        self.refresh_volume().await;
        self.refresh_playback().await;
        self.write_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oppo_api::{ApiError, Result as ApiResult};
    use proptest::prelude::*;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory device: canned replies keyed by command code
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<HashMap<&'static str, String>>,
        sent: Mutex<Vec<String>>,
        offline: AtomicBool,
    }

    impl ScriptedTransport {
        fn reply(&self, code: &'static str, response: &str) {
            self.replies.lock().unwrap().insert(code, response.to_string());
        }

        fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        fn record(&self, command: &str) -> ApiResult<()> {
            self.sent.lock().unwrap().push(command.to_string());
            if self.offline.load(Ordering::SeqCst) {
                return Err(ApiError::NetworkError("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, _host: &str, command: &str) -> ApiResult<()> {
            self.record(command)
        }

        async fn query(&self, _host: &str, command: &str) -> ApiResult<String> {
            self.record(command)?;
            let code = command.split_whitespace().next().unwrap_or_default();
            Ok(self
                .replies
                .lock()
                .unwrap()
                .get(code)
                .cloned()
                .unwrap_or_default())
        }
    }

    type Notifications = Arc<Mutex<Vec<PlayerSnapshot>>>;

    fn player() -> (OppoMediaPlayer<ScriptedTransport>, Notifications) {
        let notifications: Notifications = Arc::default();
        let sink = Arc::clone(&notifications);
        let writer = move |snapshot: PlayerSnapshot| sink.lock().unwrap().push(snapshot);

        let player = OppoMediaPlayer::with_client(
            "192.168.1.60",
            OppoClient::with_transport(ScriptedTransport::default()),
            Arc::new(writer),
        );
        (player, notifications)
    }

    fn transport(player: &OppoMediaPlayer<ScriptedTransport>) -> &ScriptedTransport {
        player.client().transport()
    }

    /// Log sink shared with a scoped fmt subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    #[test]
    fn test_identity_and_metadata() {
        let (player, _) = player();

        assert_eq!(player.unique_id(), "oppo_telnet_192.168.1.60");
        assert_eq!(player.name(), "Oppo Telnet 192.168.1.60");
        assert_eq!(player.device_class(), MediaPlayerDeviceClass::Tv);

        let info = player.device_info();
        assert_eq!(info.manufacturer, "Oppo");
        assert_eq!(info.model, "UDP-203");
        assert_eq!(info.name, "Oppo Telnet 192.168.1.60");
        assert!(info.identifiers.contains(&(
            "oppo_telnet".to_string(),
            "oppo_telnet_192.168.1.60".to_string()
        )));
    }

    #[test]
    fn test_supported_features() {
        let (player, _) = player();
        let features = player.supported_features();

        for feature in [
            MediaPlayerEntityFeature::PLAY,
            MediaPlayerEntityFeature::STOP,
            MediaPlayerEntityFeature::PAUSE,
            MediaPlayerEntityFeature::VOLUME_SET,
            MediaPlayerEntityFeature::VOLUME_MUTE,
            MediaPlayerEntityFeature::TURN_ON,
            MediaPlayerEntityFeature::TURN_OFF,
            MediaPlayerEntityFeature::NEXT_TRACK,
            MediaPlayerEntityFeature::PREVIOUS_TRACK,
        ] {
            assert!(features.contains(feature), "missing {:?}", feature);
        }
    }

    #[test]
    fn test_initial_state() {
        let (player, _) = player();
        assert_eq!(player.snapshot(), PlayerSnapshot::default());
        assert_eq!(player.state(), MediaPlayerState::Off);
        assert_eq!(player.volume_level(), 0.0);
        assert!(!player.is_volume_muted());
    }

    #[test]
    fn test_reply_truthiness() {
        assert!(Reply::Sent.succeeded());
        assert!(Reply::Response("@OK".to_string()).succeeded());
        assert!(!Reply::Response(String::new()).succeeded());
        assert!(!Reply::Failed.succeeded());
        assert_eq!(Reply::Response(String::new()).text(), None);
    }

    #[tokio::test]
    async fn test_send_command_absorbs_failures() {
        let (player, _) = player();
        transport(&player).set_offline(true);

        assert_eq!(player.send_command(&Command::Play, false).await, Reply::Failed);
        assert_eq!(player.send_command(&Command::QueryVolume, true).await, Reply::Failed);
    }

    #[rstest]
    #[case(Command::Play, MediaPlayerState::Playing)]
    #[case(Command::Stop, MediaPlayerState::Idle)]
    #[case(Command::Pause, MediaPlayerState::Paused)]
    #[case(Command::PowerOn, MediaPlayerState::Idle)]
    #[case(Command::PowerOff, MediaPlayerState::Off)]
    #[tokio::test]
    async fn test_state_commands(#[case] command: Command, #[case] expected: MediaPlayerState) {
        let (player, notifications) = player();

        match command {
            Command::Play => player.media_play().await,
            Command::Stop => player.media_stop().await,
            Command::Pause => player.media_pause().await,
            Command::PowerOn => player.turn_on().await,
            Command::PowerOff => player.turn_off().await,
            other => unreachable!("unexpected case {:?}", other),
        }

        assert_eq!(player.state(), expected);
        assert_eq!(transport(&player).sent(), vec![command.wire()]);
        assert_eq!(notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_play_failure_leaves_state_unchanged() {
        let (player, notifications) = player();
        player.turn_on().await;
        transport(&player).set_offline(true);

        player.media_play().await;

        assert_eq!(player.state(), MediaPlayerState::Idle);
        assert_eq!(notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_turn_off_from_any_state() {
        let (player, _) = player();
        player.media_play().await;
        assert_eq!(player.state(), MediaPlayerState::Playing);

        player.turn_off().await;
        assert_eq!(player.state(), MediaPlayerState::Off);

        player.media_pause().await;
        player.turn_off().await;
        assert_eq!(player.state(), MediaPlayerState::Off);
    }

    #[tokio::test]
    async fn test_mute_records_requested_flag() {
        let (player, _) = player();

        player.mute_volume(true).await;
        assert!(player.is_volume_muted());

        player.mute_volume(false).await;
        assert!(!player.is_volume_muted());

        assert_eq!(transport(&player).sent(), vec!["#MUT", "#MUT"]);
    }

    #[tokio::test]
    async fn test_track_skip_is_fire_and_forget() {
        let (player, notifications) = player();

        player.media_next_track().await;
        player.media_previous_track().await;

        assert_eq!(transport(&player).sent(), vec!["#NXT", "#PRE"]);
        assert_eq!(player.snapshot(), PlayerSnapshot::default());
        assert!(notifications.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_volume_caches_before_refresh() {
        let (player, notifications) = player();
        transport(&player).reply("#SVL", "@OK 42");
        transport(&player).reply("#VOL", "@OK 30");

        player.set_volume_level(0.42).await;

        let notifications = notifications.lock().unwrap().clone();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].volume, 0.42);
        assert_eq!(notifications[1].volume, 0.30);
        assert_eq!(player.volume_level(), 0.30);
        assert_eq!(
            transport(&player).sent(),
            vec!["#SVL 42", "#QPW", "#VOL", "#QPL"]
        );
    }

    #[tokio::test]
    async fn test_set_volume_rejected_still_refreshes() {
        let (logs, _guard) = capture_logs();
        let (player, notifications) = player();
        transport(&player).reply("#SVL", "@ER INVALID");

        player.set_volume_level(0.8).await;

        assert_eq!(player.volume_level(), 0.0);
        // only the refresh notification
        assert_eq!(notifications.lock().unwrap().len(), 1);
        assert_eq!(transport(&player).sent().len(), 4);
        assert!(logs.contents().contains("Failed to set volume to 80"));
    }

    #[tokio::test]
    async fn test_set_volume_clamps_out_of_range() {
        let (player, _) = player();
        transport(&player).reply("#SVL", "@OK");

        player.set_volume_level(1.7).await;

        assert_eq!(transport(&player).sent()[0], "#SVL 100");
        assert_eq!(player.volume_level(), 1.0);
    }

    #[tokio::test]
    async fn test_set_volume_ignores_nan() {
        let (player, _) = player();
        player.set_volume_level(f64::NAN).await;
        assert!(transport(&player).sent().is_empty());
    }

    #[tokio::test]
    async fn test_power_on_promotes_only_from_off() {
        let (player, _) = player();
        transport(&player).reply("#QPW", "@OK ON");

        player.update().await;
        assert_eq!(player.state(), MediaPlayerState::Idle);

        player.media_play().await;
        player.update().await;
        assert_eq!(player.state(), MediaPlayerState::Playing);
    }

    #[tokio::test]
    async fn test_power_response_without_markers_is_noop() {
        let (player, _) = player();
        player.media_pause().await;
        transport(&player).reply("#QPW", "@OK");

        player.update().await;
        assert_eq!(player.state(), MediaPlayerState::Paused);
    }

    #[tokio::test]
    async fn test_power_off_forces_off() {
        let (player, _) = player();
        player.media_play().await;
        transport(&player).reply("#QPW", "@OK OFF");

        player.update().await;
        assert_eq!(player.state(), MediaPlayerState::Off);
    }

    #[tokio::test]
    async fn test_volume_query_updates_cache() {
        let (player, _) = player();
        transport(&player).reply("#VOL", "@OK 57");

        player.update().await;
        assert_eq!(player.volume_level(), 0.57);
    }

    #[tokio::test]
    async fn test_volume_query_parse_failure_warns() {
        let (logs, _guard) = capture_logs();
        let (player, _) = player();
        transport(&player).reply("#VOL", "@OK 25");
        player.update().await;

        transport(&player).reply("#VOL", "@OK abc");
        player.update().await;

        assert_eq!(player.volume_level(), 0.25);
        let output = logs.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains("Failed to parse volume"));
    }

    #[rstest]
    #[case("@OK play", MediaPlayerState::Playing)]
    #[case("@OK pause", MediaPlayerState::Paused)]
    #[case("@OK stop", MediaPlayerState::Idle)]
    #[case("@OK unknown", MediaPlayerState::Off)]
    #[case("", MediaPlayerState::Off)]
    #[tokio::test]
    async fn test_playback_query(#[case] response: &str, #[case] expected: MediaPlayerState) {
        let (player, _) = player();
        transport(&player).reply("#QPL", response);

        player.update().await;
        assert_eq!(player.state(), expected);
    }

    #[tokio::test]
    async fn test_update_notifies_even_when_device_unreachable() {
        let (player, notifications) = player();
        transport(&player).set_offline(true);

        player.update().await;

        assert_eq!(transport(&player).sent(), vec!["#QPW", "#VOL", "#QPL"]);
        assert_eq!(
            notifications.lock().unwrap().clone(),
            vec![PlayerSnapshot::default()]
        );
    }

    #[tokio::test]
    async fn test_update_queries_are_independent() {
        let (player, _) = player();
        transport(&player).reply("#QPW", "@OK ON");
        transport(&player).reply("#VOL", "@OK nope");
        transport(&player).reply("#QPL", "@OK PLAY");

        player.update().await;

        assert_eq!(player.state(), MediaPlayerState::Playing);
        assert_eq!(player.volume_level(), 0.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_set_volume_sends_rounded_percentage(volume in 0.0f64..=1.0) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let (player, _) = player();
            transport(&player).reply("#SVL", "@OK");

            runtime.block_on(player.set_volume_level(volume));

            let expected = (volume * 100.0).round() as u8;
            prop_assert!(expected <= 100);
            prop_assert_eq!(&transport(&player).sent()[0], &format!("#SVL {}", expected));
            prop_assert_eq!(volume_to_percent(volume), expected);
        }
    }
}
