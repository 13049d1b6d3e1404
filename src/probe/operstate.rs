//! Link-layer state from sysfs.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::InterfaceConfig;
use crate::probe::LinkMonitor;

/// Reports reachable when `/sys/class/net/<if>/operstate` reads `up`.
///
/// Tunnel devices often report `unknown` here; use the ping probe for those.
#[derive(Debug, Clone)]
pub struct OperstateMonitor {
    root: PathBuf,
}

impl OperstateMonitor {
    pub fn new() -> Self {
        Self::with_root("/sys/class/net")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for OperstateMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkMonitor for OperstateMonitor {
    async fn check(&self, interface: &InterfaceConfig) -> bool {
        let path = self.root.join(&interface.name).join("operstate");
        match tokio::fs::read_to_string(&path).await {
            Ok(state) => state.trim() == "up",
            Err(e) => {
                tracing::debug!(interface = %interface.name, path = ?path, error = %e, "Cannot read operstate");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_operstate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("eth0")).unwrap();
        std::fs::write(dir.path().join("eth0/operstate"), "up\n").unwrap();
        std::fs::create_dir(dir.path().join("eth1")).unwrap();
        std::fs::write(dir.path().join("eth1/operstate"), "down\n").unwrap();

        let monitor = OperstateMonitor::with_root(dir.path());
        assert!(monitor.check(&InterfaceConfig::new("eth0", 1)).await);
        assert!(!monitor.check(&InterfaceConfig::new("eth1", 2)).await);
        assert!(!monitor.check(&InterfaceConfig::new("eth9", 3)).await);
    }
}
