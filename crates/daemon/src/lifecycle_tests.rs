// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use tempfile::tempdir;

fn config_in(dir: &std::path::Path) -> Config {
    Config {
        state_dir: dir.to_path_buf(),
        socket_path: dir.join("uspad.sock"),
        lock_path: dir.join("uspad.pid"),
        wal_path: dir.join("wal").join("events.wal"),
        snapshot_path: dir.join("snapshot.json.zst"),
    }
}

#[tokio::test]
#[serial]
async fn first_boot_starts_from_empty_state() {
    let dir = tempdir().expect("tempdir");
    let config = config_in(dir.path());
    let result = startup(&config).await.expect("startup");
    assert_eq!(result.processed_seq, 0);
    assert!(result.state.params.is_empty());
}

#[tokio::test]
#[serial]
async fn restart_replays_wal_entries_written_since_the_last_checkpoint() {
    let dir = tempdir().expect("tempdir");
    let config = config_in(dir.path());
    {
        let mut result = startup(&config).await.expect("first startup");
        result.wal.append(&Event::ParamValueSet { path: "Device.DeviceInfo.Manufacturer".into(), value: "Acme".into() }).expect("append");
        result.wal.flush().expect("flush");
    }

    let result = startup(&config).await.expect("second startup");
    assert_eq!(result.state.params.get("Device.DeviceInfo.Manufacturer").map(String::as_str), Some("Acme"));
}

#[tokio::test]
#[serial]
async fn concurrent_startup_against_the_same_state_dir_fails_the_lock() {
    let dir = tempdir().expect("tempdir");
    let config = config_in(dir.path());
    let held = startup(&config).await.expect("first startup holds the lock");

    let err = startup(&config).await.expect_err("second startup must not acquire the lock");
    assert!(matches!(err, LifecycleError::LockFailed(_)));
    drop(held);
}

#[tokio::test]
#[serial]
async fn seed_file_reset_populates_state_on_first_boot() {
    let dir = tempdir().expect("tempdir");
    let seed_path = dir.path().join("seed.json");
    std::fs::write(&seed_path, r#"[["Device.DeviceInfo.Manufacturer", "Acme"]]"#).expect("write seed");
    std::env::set_var("USPA_RESET_SEED_FILE", &seed_path);

    let config = config_in(dir.path());
    let result = startup(&config).await.expect("startup");
    std::env::remove_var("USPA_RESET_SEED_FILE");

    assert_eq!(result.state.params.get("Device.DeviceInfo.Manufacturer").map(String::as_str), Some("Acme"));
}

#[test]
fn factory_reset_tolerates_a_missing_seed_file() {
    let dir = tempdir().expect("tempdir");
    let wal_path = dir.path().join("events.wal");
    let mut wal = Wal::open(&wal_path, 0).expect("open wal");
    let mut state = MaterializedState::default();

    factory_reset(&mut state, &mut wal, ResetSource::SeedFile(dir.path().join("missing.json"))).expect("reset");

    assert!(state.params.is_empty());
    assert!(wal.entries_after(0).expect("entries").iter().any(|e| matches!(e.event, Event::FactoryReset { .. })));
}

#[test]
fn factory_reset_with_vendor_defaults_applies_every_row() {
    let dir = tempdir().expect("tempdir");
    let wal_path = dir.path().join("events.wal");
    let mut wal = Wal::open(&wal_path, 0).expect("open wal");
    let mut state = MaterializedState::default();

    let rows = vec![
        ("Device.DeviceInfo.Manufacturer".to_string(), "Acme".to_string()),
        ("Device.DeviceInfo.ModelName".to_string(), "USPAgent".to_string()),
    ];
    factory_reset(&mut state, &mut wal, ResetSource::VendorDefaults(rows)).expect("reset");

    assert_eq!(state.params.get("Device.DeviceInfo.Manufacturer").map(String::as_str), Some("Acme"));
    assert_eq!(state.params.get("Device.DeviceInfo.ModelName").map(String::as_str), Some("USPAgent"));
}
