// Synthetic rover telemetry derived from wall-clock time.
// Invariants: pure apart from the injected RNG; generation never fails.

use rand::Rng;

use crate::constants::{
    AUTONOMOUS_CHANCE, BASE_LAT, BASE_LNG, BATTERY_CYCLE_MS, MAX_SPEED_MPS, OBSTACLE_ANGLE_DEG,
    OBSTACLE_CHANCE, OBSTACLE_DISTANCE_M, POSITION_SWING_DEG,
};
use crate::model::{
    Coordinates, LinkStatus, Obstacle, Orientation, RoverMode, TelemetrySnapshot,
};

/// Battery drains linearly from 100 to 0 over each 100 s cycle, then resets.
pub fn battery_at(now_ms: u64) -> f64 {
    let drained = (now_ms % BATTERY_CYCLE_MS) as f64 / 1000.0;
    (100.0 - drained).max(0.0)
}

pub fn speed_at(now_ms: u64) -> f64 {
    (now_ms as f64 / 10_000.0).sin().abs() * MAX_SPEED_MPS
}

pub fn coordinates_at(now_ms: u64) -> Coordinates {
    let phase = now_ms as f64 / 5_000.0;
    Coordinates {
        lat: BASE_LAT + phase.sin() * POSITION_SWING_DEG,
        lng: BASE_LNG + phase.cos() * POSITION_SWING_DEG,
    }
}

pub fn orientation_at(now_ms: u64) -> Orientation {
    let t = now_ms as f64;
    Orientation {
        pitch: (t / 2_000.0).sin() * 5.0,
        roll: (t / 3_000.0).cos() * 2.0,
        yaw: (t / 100.0) % 360.0,
    }
}

pub fn snapshot_at<R: Rng + ?Sized>(now_ms: u64, rng: &mut R) -> TelemetrySnapshot {
    let mode = if rng.gen::<f64>() < AUTONOMOUS_CHANCE {
        RoverMode::Autonomous
    } else {
        RoverMode::Manual
    };
    let obstacles = if rng.gen::<f64>() < OBSTACLE_CHANCE {
        vec![Obstacle {
            distance: OBSTACLE_DISTANCE_M,
            angle: OBSTACLE_ANGLE_DEG,
        }]
    } else {
        Vec::new()
    };

    TelemetrySnapshot {
        battery: battery_at(now_ms),
        speed: speed_at(now_ms),
        coordinates: coordinates_at(now_ms),
        orientation: orientation_at(now_ms),
        status: LinkStatus::Online,
        mode,
        obstacles,
    }
}
