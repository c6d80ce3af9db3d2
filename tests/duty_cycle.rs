//! Duty-cycle scenarios across many wake cycles

use approx::assert_relative_eq;
use lora_telemetry::*;
use std::time::Duration;
use tempfile::TempDir;

const STEP: Duration = Duration::from_millis(40);

fn reading(temperature: f64, humidity: f64, dust: f64) -> Reading {
    Reading::new("SALA_SERVIDORES_01", temperature, humidity, dust)
}

fn engine<T: Transport>(
    sensor: ScriptedSensor,
    radio: T,
    config: NodeConfig,
) -> DutyCycleEngine<ScriptedSensor, T, RecordingPower, SteppingClock> {
    DutyCycleEngine::with_clock(
        config,
        sensor,
        radio,
        RecordingPower::new(),
        SteppingClock::new(STEP),
    )
    .unwrap()
}

// ============================================================================
// Timekeeping
// ============================================================================

#[test]
fn test_accumulated_time_sums_active_and_sleep() {
    let sleep = Duration::from_millis(2500);
    let mut sensor = ScriptedSensor::new(reading(28.0, 45.0, 20.0));
    for i in 0..20 {
        sensor.push(reading(28.0 + (i % 3) as f64, 45.0, 20.0));
    }
    let mut engine = engine(sensor, MemoryTransport::new(), NodeConfig::with_sleep_duration(sleep));
    let mut region = MemoryRetention::new();

    let mut previous = Duration::ZERO;
    let mut expected = Duration::ZERO;
    for _ in 0..21 {
        let report = engine.wake(&mut region);
        expected += report.active_time + sleep;
        assert_eq!(report.accumulated_time, expected);
        assert!(report.accumulated_time >= previous);
        previous = report.accumulated_time;
    }

    assert_relative_eq!(
        previous.as_secs_f64(),
        21.0 * (STEP.as_secs_f64() + 2.5),
        epsilon = 1e-9
    );
    assert_eq!(engine.power().suspensions().len(), 21);
    assert!(engine.power().suspensions().iter().all(|d| *d == sleep));
}

// ============================================================================
// Transmission decisions
// ============================================================================

#[test]
fn test_threshold_boundaries_per_field() {
    let sensor = ScriptedSensor::new(reading(28.0, 45.0, 20.0))
        // Just under every threshold
        .then(reading(28.49, 46.99, 24.99))
        // Humidity exactly at threshold
        .then(reading(28.0, 47.0, 20.0))
        // Dust exactly at threshold, downwards
        .then(reading(28.0, 47.0, 15.0))
        // Temperature exactly at threshold
        .then(reading(28.5, 47.0, 15.0));
    let mut engine = engine(sensor, MemoryTransport::new(), NodeConfig::default());
    let mut state = PersistentState::cold_start();

    let triggers: Vec<_> = (0..5)
        .map(|_| engine.run_cycle(&mut state).outcome.trigger())
        .collect();

    assert_eq!(triggers[0], Some(SendTrigger::NoBaseline));
    assert_eq!(triggers[1], None);
    assert!(matches!(
        triggers[2],
        Some(SendTrigger::Changed(ChangedFields { humidity: true, temperature: false, dust: false }))
    ));
    assert!(matches!(
        triggers[3],
        Some(SendTrigger::Changed(ChangedFields { dust: true, .. }))
    ));
    assert!(matches!(
        triggers[4],
        Some(SendTrigger::Changed(ChangedFields { temperature: true, .. }))
    ));
}

#[test]
fn test_slow_drift_compared_against_last_sent() {
    // Each step is below threshold, the cumulative drift is not
    let mut sensor = ScriptedSensor::new(reading(28.0, 45.0, 20.0));
    for i in 1..=5 {
        sensor.push(reading(28.0 + 0.2 * i as f64, 45.0, 20.0));
    }
    let mut engine = engine(sensor, MemoryTransport::new(), NodeConfig::default());
    let mut state = PersistentState::cold_start();

    let sent: Vec<bool> = (0..6)
        .map(|_| engine.run_cycle(&mut state).outcome.is_sent())
        .collect();

    // 28.0 sent, 28.2 and 28.4 skipped, 28.6 sent, 28.8 skipped, 29.0 skipped
    assert_eq!(sent, vec![true, false, false, true, false, false]);
    assert_relative_eq!(state.last_sent().unwrap().temperature, 28.6, epsilon = 1e-9);
}

#[test]
fn test_bounded_staleness_over_long_quiet_period() {
    let mut engine = engine(
        ScriptedSensor::new(reading(22.0, 40.0, 15.0)),
        MemoryTransport::new(),
        NodeConfig::default(),
    );
    let mut state = PersistentState::cold_start();

    let mut sent_at = Vec::new();
    for cycle in 0..=180 {
        let report = engine.run_cycle(&mut state);
        assert!(report.skip_count < FORCE_SEND_LIMIT);
        if report.outcome.is_sent() {
            sent_at.push(cycle);
        }
    }

    assert_eq!(sent_at, vec![0, 60, 120, 180]);
    assert_eq!(engine.radio().pending_outgoing(), 4);
}

#[test]
fn test_lost_frames_are_not_resent() {
    let mut sensor = ScriptedSensor::new(reading(20.0, 40.0, 10.0));
    for i in 1..50 {
        sensor.push(reading(20.0 + i as f64, 40.0, 10.0));
    }
    let mut engine = engine(sensor, LossyTransport::new(0.5), NodeConfig::default());
    let mut region = MemoryRetention::new();

    for _ in 0..50 {
        let report = engine.wake(&mut region);
        assert!(report.outcome.is_sent());
    }

    let metrics = engine.radio_mut().inner_mut().metrics();
    assert_eq!(metrics.frames_sent, 50);
    assert!(metrics.frames_lost > 0);
    assert_eq!(
        engine.radio_mut().inner_mut().pending_outgoing() as u64,
        50 - metrics.frames_lost
    );
}

// ============================================================================
// Radio faults
// ============================================================================

#[test]
fn test_optimistic_fault_delays_next_send() {
    let sensor = ScriptedSensor::new(reading(28.0, 45.0, 20.0))
        .then(reading(30.0, 45.0, 20.0))
        .then(reading(30.0, 45.0, 20.0));
    let mut engine = engine(sensor, MemoryTransport::new(), NodeConfig::default());
    let mut state = PersistentState::cold_start();
    engine.run_cycle(&mut state);

    engine
        .radio_mut()
        .set_init_failure(Some("SX1276 not found".to_string()));
    let report = engine.run_cycle(&mut state);
    assert!(matches!(report.outcome, CycleOutcome::RadioFault { .. }));
    assert_eq!(state.last_sent().unwrap().temperature, 30.0);
    assert_eq!(state.last_send_time(), Some(Duration::ZERO));

    // Gateway never saw 30.0, but the node believes it did
    engine.radio_mut().set_init_failure(None);
    let report = engine.run_cycle(&mut state);
    assert_eq!(report.outcome, CycleOutcome::Skipped);
    assert_eq!(engine.radio().pending_outgoing(), 1);
}

#[test]
fn test_rollback_fault_retries_change() {
    let config = NodeConfig {
        commit_policy: CommitPolicy::RollbackOnFault,
        ..Default::default()
    };
    let sensor = ScriptedSensor::new(reading(28.0, 45.0, 20.0))
        .then(reading(30.0, 45.0, 20.0))
        .then(reading(30.0, 45.0, 20.0));
    let mut engine = engine(sensor, MemoryTransport::new(), config);
    let mut state = PersistentState::cold_start();
    engine.run_cycle(&mut state);

    engine
        .radio_mut()
        .set_init_failure(Some("SX1276 not found".to_string()));
    engine.run_cycle(&mut state);
    assert_eq!(state.last_sent().unwrap().temperature, 28.0);

    engine.radio_mut().set_init_failure(None);
    let report = engine.run_cycle(&mut state);
    assert!(report.outcome.is_sent());
    assert_eq!(engine.radio().pending_outgoing(), 2);
}

// ============================================================================
// Retention
// ============================================================================

#[test]
fn test_file_retention_across_engine_instances() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("retained.json");
    let sample = reading(28.0, 45.0, 20.0);

    let mut outcomes = Vec::new();
    for _ in 0..4 {
        // Fresh engine per cycle: nothing but the snapshot survives
        let mut engine = engine(
            ScriptedSensor::new(sample.clone()),
            MemoryTransport::new(),
            NodeConfig::default(),
        );
        let report = engine.wake(&mut FileRetention::new(&path));
        outcomes.push((report.outcome.is_sent(), report.skip_count));
    }

    assert_eq!(outcomes, vec![(true, 0), (false, 1), (false, 2), (false, 3)]);

    let state = FileRetention::new(&path).load().unwrap().unwrap();
    assert_eq!(state.last_sent(), Some(&sample));
    assert_eq!(state.accumulated_time(), 4 * (STEP + DEFAULT_SLEEP_DURATION));
}

#[test]
fn test_cleared_region_cold_starts() {
    let mut engine = engine(
        ScriptedSensor::new(reading(28.0, 45.0, 20.0)),
        MemoryTransport::new(),
        NodeConfig::default(),
    );
    let mut region = MemoryRetention::new();
    engine.wake(&mut region);
    engine.wake(&mut region);

    region.clear().unwrap();
    let report = engine.wake(&mut region);

    assert_eq!(report.outcome.trigger(), Some(SendTrigger::NoBaseline));
    assert_eq!(report.accumulated_time, STEP + DEFAULT_SLEEP_DURATION);
}
