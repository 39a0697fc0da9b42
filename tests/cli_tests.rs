use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;
use tagtrack::models::Status;

mod common;
use common::TestEnv;

#[test]
fn test_init_creates_database_and_device_id() {
    let env = TestEnv::new();

    env.tt(&["--test", "init"])
        .assert()
        .success()
        .stdout(contains("Device id"))
        .stdout(contains("tagtrack initialization completed"));

    assert!(fs::metadata(&env.db_path).is_ok());
}

#[test]
fn test_init_writes_config_file_outside_test_mode() {
    let env = TestEnv::new();

    env.tt(&["init"]).assert().success();
    assert!(env.path("tagtrack.conf").exists());

    env.tt(&["config", "--check"])
        .assert()
        .success()
        .stdout(contains("Configuration file is up to date"));
}

#[test]
fn test_config_migrate_adds_missing_fields() {
    let env = TestEnv::new();
    fs::write(
        env.path("tagtrack.conf"),
        format!("database: {}\n", env.db_path),
    )
    .unwrap();

    env.tt(&["config", "--check"])
        .assert()
        .success()
        .stdout(contains("Missing fields").and(contains("batch_size")));

    env.tt(&["config", "--migrate"])
        .assert()
        .success()
        .stdout(contains("Added fields"));

    env.tt(&["config", "--check"])
        .assert()
        .success()
        .stdout(contains("up to date"));
}

#[test]
fn test_load_holds_the_tag_across_invocations() {
    let env = TestEnv::initialized();

    env.tt(&["load", "T-100"])
        .assert()
        .success()
        .stdout(contains("Loaded T-100."))
        .stdout(contains("UNREGISTERED"));

    env.tt(&["show"]).assert().success().stdout(contains("T-100"));

    env.tt(&["load", "T-200"])
        .assert()
        .failure()
        .stderr(contains("Tag in progress: T-100"));

    // same tag again is a reload, not a conflict
    env.tt(&["load", "  T-100 "])
        .assert()
        .success()
        .stdout(contains("already loaded"));
}

#[test]
fn test_load_rejects_blank_tag() {
    let env = TestEnv::initialized();

    env.tt(&["load", "   "])
        .assert()
        .failure()
        .stderr(contains("Invalid input"));
}

#[test]
fn test_record_offline_queues_and_releases_the_hold() {
    let env = TestEnv::initialized();

    env.tt(&["load", "T-100"]).assert().success();
    env.tt(&["--offline", "record", "CONCLUIDO"])
        .assert()
        .success()
        .stdout(contains("Queued: T-100"))
        .stdout(contains("no coordinates"));

    env.tt(&["queue"])
        .assert()
        .success()
        .stdout(contains("1 events pending."));

    // hold is free again
    env.tt(&["load", "T-200"]).assert().success();
}

#[test]
fn test_record_with_manual_coordinates_uses_decimal_comma() {
    let env = TestEnv::initialized();

    env.tt(&["load", "T-7"]).assert().success();
    env.tt(&[
        "--offline",
        "record",
        "sem acesso",
        "--lat=-23.5",
        "--lon=-46.25",
        "--obs",
        "portao fechado",
    ])
    .assert()
    .success()
    .stdout(contains("-23,5 / -46,25"));

    env.tt(&["queue", "--list"])
        .assert()
        .success()
        .stdout(contains("SEM ACESSO"))
        .stdout(contains("portao fechado"));
}

#[test]
fn test_record_without_hold_fails() {
    let env = TestEnv::initialized();

    env.tt(&["--offline", "record", "CONCLUIDO"])
        .assert()
        .failure()
        .stderr(contains("No tag loaded"));
}

#[test]
fn test_record_rejects_unknown_status() {
    let env = TestEnv::initialized();
    env.tt(&["load", "T-1"]).assert().success();

    env.tt(&["--offline", "record", "FINISHED"])
        .assert()
        .failure()
        .stderr(contains("Invalid status: FINISHED"));
}

#[test]
fn test_reopen_declined_keeps_hold_and_queue() {
    let env = TestEnv::initialized();
    env.seed_tags(&[("T-1", Status::Completed)]);

    env.tt(&["load", "T-1"])
        .assert()
        .success()
        .stdout(contains("COMPLETED"));

    env.tt(&["--offline", "record", "PENDENTE"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(contains("Confirm status change for T-1"))
        .stdout(contains("Not recorded, T-1 is still held."));

    env.tt(&["queue"])
        .assert()
        .success()
        .stdout(contains("0 events pending."));

    env.tt(&["--offline", "record", "PENDENTE", "--yes"])
        .assert()
        .success()
        .stdout(contains("Queued: T-1"));

    env.tt(&["lookup", "T-1"])
        .assert()
        .success()
        .stdout(contains("T-1: PENDING"));
}

#[test]
fn test_geo_requires_a_completed_tag() {
    let env = TestEnv::initialized();
    env.seed_tags(&[("T-5", Status::PendingObra), ("T-6", Status::Completed)]);

    env.tt(&["load", "T-5"]).assert().success();
    env.tt(&["--offline", "geo"])
        .assert()
        .failure()
        .stderr(contains("location refresh is only available"));

    env.tt(&["release"]).assert().success().stdout(contains("Released T-5."));
    env.tt(&["load", "T-6"]).assert().success();
    env.tt(&["--offline", "geo", "--lat=1.5", "--lon=2.5"])
        .assert()
        .success()
        .stdout(contains("Queued: T-6"));

    env.tt(&["queue", "--list"])
        .assert()
        .success()
        .stdout(contains("ATUALIZAR_GEOLOC"));
}

#[test]
fn test_release_without_hold_is_harmless() {
    let env = TestEnv::initialized();

    env.tt(&["release"])
        .assert()
        .success()
        .stdout(contains("No tag loaded."));
}

#[test]
fn test_lookup_reports_cache_state() {
    let env = TestEnv::initialized();
    env.seed_tags(&[("T-9", Status::NoAccess)]);

    env.tt(&["lookup", "T-9"])
        .assert()
        .success()
        .stdout(contains("T-9: NO_ACCESS (sector: NORTE, class: A)"));

    env.tt(&["lookup", "T-404"])
        .assert()
        .success()
        .stdout(contains("T-404: UNREGISTERED"));
}

#[test]
fn test_sync_offline_sends_nothing() {
    let env = TestEnv::initialized();
    env.tt(&["load", "T-1"]).assert().success();
    env.tt(&["--offline", "record", "CONCLUIDO"]).assert().success();

    env.tt(&["--offline", "sync"])
        .assert()
        .success()
        .stdout(contains("Offline: nothing was sent."))
        .stdout(contains("1 events pending."));
}

#[test]
fn test_sync_without_backend_is_a_config_error() {
    let env = TestEnv::initialized();

    env.tt(&["sync"])
        .assert()
        .failure()
        .stderr(contains("backend endpoint not configured"));
}

#[test]
fn test_queue_export_writes_csv() {
    let env = TestEnv::initialized();
    env.tt(&["load", "T-1"]).assert().success();
    env.tt(&["--offline", "record", "PENDENTE_OBRA"]).assert().success();

    let out = env.path("queue.csv");
    let out_str = out.to_string_lossy().to_string();
    env.tt(&["queue", "--export", &out_str])
        .assert()
        .success()
        .stdout(contains("1 events exported"));

    let content = fs::read_to_string(&out).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "event_id,timestamp_iso,tag,status,usuario,lat,lon,accuracy,device_id,obs"
    );
    let row = lines.next().unwrap();
    assert!(row.contains(",T-1,PENDENTE OBRA,campo,"));
}

#[test]
fn test_log_print_shows_audit_trail() {
    let env = TestEnv::initialized();
    env.tt(&["load", "T-1"]).assert().success();
    env.tt(&["release"]).assert().success();

    env.tt(&["log", "--print"])
        .assert()
        .success()
        .stdout(contains("migration_applied"))
        .stdout(contains("load"))
        .stdout(contains("Hold released without event"));
}

#[test]
fn test_db_info_and_check() {
    let env = TestEnv::initialized();
    env.seed_tags(&[("T-1", Status::Pending), ("T-2", Status::Completed)]);

    env.tt(&["db", "--info", "--check"])
        .assert()
        .success()
        .stdout(contains("Cached tags"))
        .stdout(contains("Pending events"))
        .stdout(contains("Integrity check passed"));
}

#[test]
fn test_logout_without_login() {
    let env = TestEnv::initialized();

    env.tt(&["logout"])
        .assert()
        .success()
        .stdout(contains("Nobody is signed in."));
}
