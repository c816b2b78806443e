use kfd_abi::fs::{OF_TABLE_SIZE, OPEN_MAX};

/// Runtime sizing for the file tables.
///
/// Parsed from `fileio.max_files=N` and `fileio.max_fds=N` on the kernel
/// command line. Values outside `1..=<compile-time maximum>` are clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileioConfig {
    pub max_files: usize,
    pub max_fds: usize,
}

impl Default for FileioConfig {
    fn default() -> Self {
        Self {
            max_files: OF_TABLE_SIZE,
            max_fds: OPEN_MAX,
        }
    }
}

fn parse_limit(value: &str, max: usize) -> Option<usize> {
    value.parse::<usize>().ok().map(|n| n.clamp(1, max))
}

pub fn fileio_config_from_cmdline(cmdline: Option<&str>) -> FileioConfig {
    let mut cfg = FileioConfig::default();
    let Some(cmdline) = cmdline else {
        return cfg;
    };
    for token in cmdline.split_whitespace() {
        if let Some(value) = token.strip_prefix("fileio.max_files=") {
            match parse_limit(value, OF_TABLE_SIZE) {
                Some(n) => cfg.max_files = n,
                None => kfd_lib::klog_warn!("fileio: ignoring bad max_files '{}'", value),
            }
        } else if let Some(value) = token.strip_prefix("fileio.max_fds=") {
            match parse_limit(value, OPEN_MAX) {
                Some(n) => cfg.max_fds = n,
                None => kfd_lib::klog_warn!("fileio: ignoring bad max_fds '{}'", value),
            }
        }
    }
    cfg
}
