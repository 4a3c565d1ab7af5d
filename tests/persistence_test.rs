#![cfg(feature = "storage-rocksdb")]

mod common;

use assert_cmd::cargo_bin;
use common::{Route, StubServer, countries_body, rates_body};
use std::process::Command;
use tempfile::tempdir;

fn worldstat(db_path: &std::path::Path, cache_dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("worldstat"));
    cmd.arg("--db-path")
        .arg(db_path)
        .arg("--cache-dir")
        .arg(cache_dir);
    cmd
}

#[test]
fn test_rocksdb_snapshot_survives_restart() {
    let server = StubServer::start(vec![
        Route {
            path: "/countries",
            status: 200,
            body: countries_body(),
        },
        Route {
            path: "/rates",
            status: 200,
            body: rates_body(),
        },
    ]);
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");
    let cache_dir = dir.path().join("cache");

    // 1. First run: refresh from the stub feeds
    let refresh = worldstat(&db_path, &cache_dir)
        .arg("--countries-url")
        .arg(server.url("/countries"))
        .arg("--rates-url")
        .arg(server.url("/rates"))
        .arg("refresh")
        .output()
        .expect("Failed to execute command");
    assert!(refresh.status.success());

    // 2. Second run: the snapshot and stamp are still there
    let status = worldstat(&db_path, &cache_dir)
        .arg("status")
        .output()
        .expect("Failed to execute command");
    assert!(status.status.success());
    let report: serde_json::Value = serde_json::from_slice(&status.stdout).unwrap();
    assert_eq!(report["total_countries"], 3);
    assert!(report["last_refreshed_at"].is_string());

    // 3. Third run: delete, then the fourth run no longer finds it
    let delete = worldstat(&db_path, &cache_dir)
        .args(["delete", "MONACO"])
        .output()
        .expect("Failed to execute command");
    assert!(delete.status.success());

    let show = worldstat(&db_path, &cache_dir)
        .args(["show", "monaco"])
        .output()
        .expect("Failed to execute command");
    assert!(!show.status.success());

    let peru = worldstat(&db_path, &cache_dir)
        .args(["show", "peru"])
        .output()
        .expect("Failed to execute command");
    let peru: serde_json::Value = serde_json::from_slice(&peru.stdout).unwrap();
    assert_eq!(peru["name"], "Peru");
    assert_eq!(peru["currency_code"], "PEN");
}

#[test]
fn test_rocksdb_list_csv_export() {
    let server = StubServer::start(vec![
        Route {
            path: "/countries",
            status: 200,
            body: countries_body(),
        },
        Route {
            path: "/rates",
            status: 200,
            body: rates_body(),
        },
    ]);
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");
    let cache_dir = dir.path().join("cache");

    let refresh = worldstat(&db_path, &cache_dir)
        .arg("--countries-url")
        .arg(server.url("/countries"))
        .arg("--rates-url")
        .arg(server.url("/rates"))
        .arg("refresh")
        .output()
        .expect("Failed to execute command");
    assert!(refresh.status.success());

    let list = worldstat(&db_path, &cache_dir)
        .args(["list", "--region", "Europe", "--csv"])
        .output()
        .expect("Failed to execute command");
    assert!(list.status.success());
    let csv = String::from_utf8_lossy(&list.stdout);
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("name,capital,region"));
    assert!(lines.next().unwrap().starts_with("Monaco,Monaco,Europe,39000,EUR,0.92,"));
    assert_eq!(lines.next(), None);
}
