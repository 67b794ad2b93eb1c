//! Mount options and the blocking mount call.

use std::io;
use std::path::Path;
use std::time::Duration;

use fuser::MountOption;
use tracing::info;

use crate::fs::RoffsFs;

/// How the view is mounted.
#[derive(Debug, Clone)]
pub struct MountConfig {
    /// Name shown in the mount table.
    pub fsname: String,
    /// Let users other than the mounting user see the view.
    pub allow_other: bool,
    /// Unmount when the process exits.
    pub auto_unmount: bool,
    /// Kernel attribute and entry cache lifetime.
    pub ttl: Duration,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            fsname: "roffs".to_string(),
            allow_other: false,
            auto_unmount: false,
            ttl: Duration::from_secs(1),
        }
    }
}

impl MountConfig {
    /// fuser options for this config. Always read-only.
    pub fn options(&self) -> Vec<MountOption> {
        let mut options = vec![
            MountOption::RO,
            MountOption::FSName(self.fsname.clone()),
            MountOption::Subtype("roffs".to_string()),
            MountOption::DefaultPermissions,
            MountOption::NoExec,
        ];

        if self.allow_other {
            options.push(MountOption::AllowOther);
        }
        if self.auto_unmount {
            options.push(MountOption::AutoUnmount);
            // fusermount refuses auto_unmount without one of the allow_* options
            if !self.allow_other {
                options.push(MountOption::AllowRoot);
            }
        }

        options
    }
}

/// Mount `fs` at `mountpoint` and serve until unmounted.
///
/// Blocks the calling thread. Must not be called from inside the tokio
/// runtime the filesystem drives.
pub fn mount(fs: RoffsFs, mountpoint: &Path, config: &MountConfig) -> io::Result<()> {
    info!(
        mountpoint = %mountpoint.display(),
        fsname = %config.fsname,
        allow_other = config.allow_other,
        auto_unmount = config.auto_unmount,
        "mounting"
    );
    fuser::mount2(fs, mountpoint, &config.options())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_read_only() {
        let options = MountConfig::default().options();
        assert!(options.contains(&MountOption::RO));
        assert!(options.contains(&MountOption::FSName("roffs".into())));
        assert!(!options.contains(&MountOption::AllowOther));
        assert!(!options.contains(&MountOption::AutoUnmount));
    }

    #[test]
    fn test_allow_other() {
        let config = MountConfig {
            allow_other: true,
            auto_unmount: true,
            ..Default::default()
        };
        let options = config.options();
        assert!(options.contains(&MountOption::AllowOther));
        assert!(options.contains(&MountOption::AutoUnmount));
        assert!(!options.contains(&MountOption::AllowRoot));
    }

    #[test]
    fn test_auto_unmount_adds_allow_root() {
        let config = MountConfig {
            auto_unmount: true,
            ..Default::default()
        };
        let options = config.options();
        assert!(options.contains(&MountOption::AutoUnmount));
        assert!(options.contains(&MountOption::AllowRoot));
    }

    #[test]
    fn test_custom_fsname() {
        let config = MountConfig {
            fsname: "logs".into(),
            ..Default::default()
        };
        assert!(config.options().contains(&MountOption::FSName("logs".into())));
    }
}
