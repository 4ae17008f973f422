use skusync::{AppConfig, CacheConfig};
use std::path::{Path, PathBuf};

pub const INVENTORY: &str = "sku,qty\nA1,5\nA2,0\nA3,12\n";

/// Config whose cache lives inside `dir`.
pub fn config(dir: &Path) -> AppConfig {
    AppConfig {
        cache: CacheConfig {
            path: dir.join("cache").join("data_gui.db"),
        },
        ..AppConfig::default()
    }
}

pub fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}
