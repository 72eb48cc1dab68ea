// Client-side telemetry sink: current status plus bounded rolling views.
// Invariants: each view owns its buffer; snapshots are applied in arrival order
// without dedup or reordering; disconnect gaps are left unmarked.

use serde::Serialize;

use crate::buffers::RingBuffer;
use crate::constants::{
    CALIBRATION_MS, DASHBOARD_FEED_CAP, MAP_TRACK_CAP, PATH_PLANNING_SPEED_MPS, TELEMETRY_HISTORY_CAP,
};
use crate::model::{
    CommandKind, Coordinates, LinkStatus, Orientation, RoverCommand, RoverMode, TelemetrySnapshot,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurrentStatus {
    pub battery: f64,
    pub mode: RoverMode,
    pub speed: f64,
    pub status: LinkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    pub obstacle_count: usize,
}

impl Default for CurrentStatus {
    fn default() -> Self {
        Self {
            battery: 100.0,
            mode: RoverMode::Standby,
            speed: 0.0,
            status: LinkStatus::Offline,
            coordinates: None,
            orientation: None,
            obstacle_count: 0,
        }
    }
}

impl CurrentStatus {
    pub fn merge(&mut self, snapshot: &TelemetrySnapshot) {
        self.battery = snapshot.battery;
        self.speed = snapshot.speed;
        self.mode = snapshot.mode;
        self.status = snapshot.status;
        self.coordinates = Some(snapshot.coordinates);
        self.orientation = Some(snapshot.orientation);
        self.obstacle_count = snapshot.obstacles.len();
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEntry {
    Telemetry {
        received_at_ms: u64,
        snapshot: TelemetrySnapshot,
    },
    Command {
        at_ms: u64,
        message: String,
    },
}

impl FeedEntry {
    pub fn at_ms(&self) -> u64 {
        match self {
            FeedEntry::Telemetry { received_at_ms, .. } => *received_at_ms,
            FeedEntry::Command { at_ms, .. } => *at_ms,
        }
    }

    pub fn log_line(&self) -> String {
        match self {
            FeedEntry::Telemetry { snapshot, .. } => {
                format!("Bat: {:.0}% | Spd: {:.1}", snapshot.battery, snapshot.speed)
            }
            FeedEntry::Command { message, .. } => message.clone(),
        }
    }
}

/// Mixed telemetry/command log behind the status cards and energy chart.
#[derive(Clone, Debug)]
pub struct DashboardFeed {
    entries: RingBuffer<FeedEntry>,
}

impl DashboardFeed {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: RingBuffer::new(cap),
        }
    }

    pub fn push(&mut self, entry: FeedEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> Vec<FeedEntry> {
        self.entries.to_vec_ordered()
    }

    /// Newest `count` entries, newest first.
    pub fn recent_lines(&self, count: usize) -> Vec<String> {
        self.entries
            .iter()
            .rev()
            .take(count)
            .map(FeedEntry::log_line)
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub t_ms: u64,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub received_at_ms: u64,
    pub snapshot: TelemetrySnapshot,
}

/// Longer telemetry window for the charts page.
#[derive(Clone, Debug)]
pub struct TelemetryHistory {
    points: RingBuffer<HistoryPoint>,
}

impl TelemetryHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            points: RingBuffer::new(cap),
        }
    }

    pub fn push(&mut self, snapshot: &TelemetrySnapshot, received_at_ms: u64) {
        self.points.push(HistoryPoint {
            received_at_ms,
            snapshot: snapshot.clone(),
        });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> Vec<HistoryPoint> {
        self.points.to_vec_ordered()
    }

    pub fn series<F>(&self, value: F) -> Vec<SeriesPoint>
    where
        F: Fn(&TelemetrySnapshot) -> f64,
    {
        self.points
            .iter()
            .map(|point| SeriesPoint {
                t_ms: point.received_at_ms,
                value: value(&point.snapshot),
            })
            .collect()
    }

    pub fn battery_series(&self) -> Vec<SeriesPoint> {
        self.series(|snapshot| snapshot.battery)
    }

    pub fn speed_series(&self) -> Vec<SeriesPoint> {
        self.series(|snapshot| snapshot.speed)
    }
}

/// Rover position and breadcrumb trail for the map.
#[derive(Clone, Debug)]
pub struct MapTrack {
    position: Option<Coordinates>,
    path: RingBuffer<Coordinates>,
}

impl MapTrack {
    pub fn new(cap: usize) -> Self {
        Self {
            position: None,
            path: RingBuffer::new(cap),
        }
    }

    pub fn record(&mut self, coordinates: Coordinates) {
        self.position = Some(coordinates);
        if self.path.last() != Some(&coordinates) {
            self.path.push(coordinates);
        }
    }

    pub fn position(&self) -> Option<Coordinates> {
        self.position
    }

    pub fn path(&self) -> Vec<Coordinates> {
        self.path.to_vec_ordered()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Activity {
    #[serde(rename = "ANALYZING TERRAIN")]
    AnalyzingTerrain,
    #[serde(rename = "AVOIDING OBSTACLE")]
    AvoidingObstacle,
    #[serde(rename = "CALCULATING PATH")]
    CalculatingPath,
    #[serde(rename = "STANDBY - MANUAL OVERRIDE")]
    ManualOverride,
}

impl Activity {
    pub fn from_snapshot(snapshot: &TelemetrySnapshot) -> Self {
        match snapshot.mode {
            RoverMode::Autonomous if snapshot.has_obstacles() => Activity::AvoidingObstacle,
            RoverMode::Autonomous if snapshot.speed < PATH_PLANNING_SPEED_MPS => {
                Activity::CalculatingPath
            }
            RoverMode::Autonomous => Activity::AnalyzingTerrain,
            _ => Activity::ManualOverride,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Activity::AnalyzingTerrain => "ANALYZING TERRAIN",
            Activity::AvoidingObstacle => "AVOIDING OBSTACLE",
            Activity::CalculatingPath => "CALCULATING PATH",
            Activity::ManualOverride => "STANDBY - MANUAL OVERRIDE",
        }
    }
}

/// Latest attitude for the 3D model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PoseView {
    pub orientation: Orientation,
    pub activity: Activity,
}

impl Default for PoseView {
    fn default() -> Self {
        Self {
            orientation: Orientation::default(),
            activity: Activity::AnalyzingTerrain,
        }
    }
}

impl PoseView {
    pub fn update(&mut self, snapshot: &TelemetrySnapshot) {
        self.orientation = snapshot.orientation;
        self.activity = Activity::from_snapshot(snapshot);
    }
}

#[derive(Clone, Debug)]
pub struct SinkCaps {
    pub dashboard: usize,
    pub history: usize,
    pub track: usize,
}

impl Default for SinkCaps {
    fn default() -> Self {
        Self {
            dashboard: DASHBOARD_FEED_CAP,
            history: TELEMETRY_HISTORY_CAP,
            track: MAP_TRACK_CAP,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TelemetrySink {
    status: CurrentStatus,
    dashboard: DashboardFeed,
    history: TelemetryHistory,
    track: MapTrack,
    pose: PoseView,
    connected: bool,
    calibrating_until_ms: Option<u64>,
    received: u64,
}

impl Default for TelemetrySink {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySink {
    pub fn new() -> Self {
        Self::with_caps(SinkCaps::default())
    }

    pub fn with_caps(caps: SinkCaps) -> Self {
        Self {
            status: CurrentStatus::default(),
            dashboard: DashboardFeed::new(caps.dashboard),
            history: TelemetryHistory::new(caps.history),
            track: MapTrack::new(caps.track),
            pose: PoseView::default(),
            connected: false,
            calibrating_until_ms: None,
            received: 0,
        }
    }

    pub fn on_snapshot(&mut self, snapshot: TelemetrySnapshot, received_at_ms: u64) {
        // A revert already due happened before this snapshot; the snapshot wins.
        self.tick(received_at_ms);
        self.status.merge(&snapshot);
        self.track.record(snapshot.coordinates);
        self.pose.update(&snapshot);
        self.history.push(&snapshot, received_at_ms);
        self.dashboard.push(FeedEntry::Telemetry {
            received_at_ms,
            snapshot,
        });
        self.received = self.received.saturating_add(1);
    }

    /// Optimistic local update; nothing acknowledges commands.
    pub fn apply_command(&mut self, command: RoverCommand, now_ms: u64) {
        self.dashboard.push(FeedEntry::Command {
            at_ms: now_ms,
            message: format!("Command sent: {}", command.kind),
        });
        match command.kind {
            CommandKind::Estop => {
                self.status.mode = RoverMode::Emergency;
                self.status.speed = 0.0;
                self.calibrating_until_ms = None;
            }
            CommandKind::Autonav => {
                self.status.mode = RoverMode::Autonomous;
                self.calibrating_until_ms = None;
            }
            CommandKind::Calibrate => {
                self.status.mode = RoverMode::Calibrating;
                self.calibrating_until_ms = Some(now_ms.saturating_add(CALIBRATION_MS));
            }
        }
    }

    /// Drives timed local transitions. Returns true when status changed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        match self.calibrating_until_ms {
            Some(deadline) if now_ms >= deadline => {
                self.calibrating_until_ms = None;
                self.status.mode = RoverMode::Standby;
                true
            }
            _ => false,
        }
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn status(&self) -> &CurrentStatus {
        &self.status
    }

    pub fn dashboard(&self) -> &DashboardFeed {
        &self.dashboard
    }

    pub fn history(&self) -> &TelemetryHistory {
        &self.history
    }

    pub fn track(&self) -> &MapTrack {
        &self.track
    }

    pub fn pose(&self) -> &PoseView {
        &self.pose
    }

    pub fn received(&self) -> u64 {
        self.received
    }
}
