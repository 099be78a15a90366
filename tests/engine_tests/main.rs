//! Engine test suite


use lexikv::config::{Config, WalSyncStrategy};
use lexikv::engine::Engine;
use tempfile::TempDir;

pub fn test_config(dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(dir.path())
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .memtable_size_limit(1024 * 1024)
        .build()
}

pub fn setup_temp_engine() -> (TempDir, Engine) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::open(test_config(&dir)).unwrap();
    (dir, engine)
}
