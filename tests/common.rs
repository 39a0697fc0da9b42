#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::path::PathBuf;
use tagtrack::db::initialize::init_db;
use tagtrack::db::queries::replace_tags;
use tagtrack::models::{Status, TagRecord};
use tempfile::TempDir;

/// An isolated tagtrack home: config dir and database live in a temp dir
/// that disappears with the value.
pub struct TestEnv {
    pub home: TempDir,
    pub db_path: String,
}

impl TestEnv {
    pub fn new() -> Self {
        let home = tempfile::tempdir().expect("temp dir");
        let db_path = home
            .path()
            .join("test_tagtrack.sqlite")
            .to_string_lossy()
            .to_string();
        Self { home, db_path }
    }

    /// Fresh env with `init` already run.
    pub fn initialized() -> Self {
        let env = Self::new();
        env.tt(&["--test", "init"]).assert().success();
        env
    }

    /// `tagtrack --db <db> <args>` with the home redirected.
    pub fn tt(&self, args: &[&str]) -> Command {
        let mut cmd = cargo_bin_cmd!("tagtrack");
        cmd.env("TAGTRACK_HOME", self.home.path())
            .env_remove("RUST_LOG")
            .args(["--db", &self.db_path])
            .args(args);
        cmd
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.home.path().join(name)
    }

    /// Seed the status cache as if a refresh had happened.
    pub fn seed_tags(&self, rows: &[(&str, Status)]) {
        let conn = rusqlite::Connection::open(&self.db_path).expect("open db");
        init_db(&conn).expect("init db");
        let records: Vec<(String, TagRecord)> = rows
            .iter()
            .map(|(tag, st)| (tag.to_string(), TagRecord::new(*st, "NORTE", "A")))
            .collect();
        replace_tags(&conn, records.iter().map(|(t, r)| (t, r))).expect("seed tags");
    }
}
