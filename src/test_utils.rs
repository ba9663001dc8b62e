//! Test utilities: a router served in-process against the memory backend.

use crate::config::{Config, StorageConfig};
use crate::storage::MemoryStore;
use crate::{AppState, build_router};
use axum_test::TestServer;
use std::sync::Arc;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        storage: StorageConfig::Memory {
            bucket: "testing_app_files".to_string(),
        },
        ..Config::default()
    }
}

/// Build a test server around a fresh [`MemoryStore`], returning the store
/// handle so tests can seed and inspect bucket contents.
pub fn create_test_app() -> (TestServer, Arc<MemoryStore>) {
    let config = create_test_config();
    let store = Arc::new(MemoryStore::new(config.storage.bucket()));

    let state = AppState::builder().config(config).store(store.clone()).build();
    let router = build_router(&state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, store)
}
