//! Process-wide configuration for the `containerv` binary: where the
//! runtime keeps its per-container directories, where pinned policy maps
//! live, and which cgroup hierarchy to attach to. Every field is settable
//! from an environment variable so the binary behaves the same way under a
//! supervisor as it does from an interactive shell.

use clap::Args;
use derive_builder::Builder;
use getset::Getters;
use std::path::PathBuf;

#[derive(Builder, Clone, Debug, Args, Getters)]
#[builder(default, pattern = "owned", setter(into))]
pub struct Config {
    #[get = "pub"]
    #[arg(
        long = "log-level",
        env = "CONTAINERV_LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error", "off"]
    )]
    log_level: String,

    #[get = "pub"]
    #[arg(long = "runtime-dir", env = "CONTAINERV_RUNTIME_DIR", default_value = "/run/containerv")]
    runtime_root: PathBuf,

    #[get = "pub"]
    #[arg(long = "bpf-pin-dir", env = "CONTAINERV_BPF_PIN_DIR", default_value = "/sys/fs/bpf/cvd")]
    bpf_pin_dir: PathBuf,

    #[get = "pub"]
    #[arg(long = "cgroup-root", env = "CONTAINERV_CGROUP_ROOT", default_value = "/sys/fs/cgroup")]
    cgroup_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            runtime_root: PathBuf::from("/run/containerv"),
            bpf_pin_dir: PathBuf::from("/sys/fs/bpf/cvd"),
            cgroup_root: PathBuf::from("/sys/fs/cgroup"),
        }
    }
}

impl Config {
    pub fn manager_config(&self) -> container::ManagerConfig {
        container::ManagerConfig {
            runtime_root: self.runtime_root.clone(),
            cgroup_root: self.cgroup_root.clone(),
            bpf_pin_dir: self.bpf_pin_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_bit_exact_runtime_paths() {
        let config = Config::default();
        assert_eq!(config.runtime_root(), &PathBuf::from("/run/containerv"));
        assert_eq!(config.bpf_pin_dir(), &PathBuf::from("/sys/fs/bpf/cvd"));
        assert_eq!(config.cgroup_root(), &PathBuf::from("/sys/fs/cgroup"));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ConfigBuilder::default()
            .runtime_root(PathBuf::from("/tmp/containerv"))
            .build()
            .unwrap();
        assert_eq!(config.runtime_root(), &PathBuf::from("/tmp/containerv"));
    }
}
