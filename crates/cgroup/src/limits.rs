use getset::Getters;

#[derive(Clone, Debug, Getters)]
#[get = "pub"]
/// cgroup v2 resource limits for a single container. Any field left `None`
/// falls back to the default noted next to it.
pub struct CgroupLimits {
    /// `memory.max` value, e.g. `"512M"` or `"max"`. Default: `"1G"`.
    memory_max: String,
    /// `cpu.weight`, 1-10000. Default: 100.
    cpu_weight: u32,
    /// `pids.max`, an integer or `"max"`. Default: 256.
    pids_max: String,
}

impl CgroupLimits {
    pub fn new(
        memory_max: Option<String>,
        cpu_weight: Option<u32>,
        pids_max: Option<String>,
    ) -> Self {
        Self {
            memory_max: memory_max.unwrap_or_else(|| "1G".to_string()),
            cpu_weight: cpu_weight.unwrap_or(100),
            pids_max: pids_max.unwrap_or_else(|| "256".to_string()),
        }
    }
}

impl Default for CgroupLimits {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let limits = CgroupLimits::default();
        assert_eq!(limits.memory_max(), "1G");
        assert_eq!(*limits.cpu_weight(), 100);
        assert_eq!(limits.pids_max(), "256");
    }

    #[test]
    fn overrides_are_kept() {
        let limits = CgroupLimits::new(Some("512M".into()), Some(50), Some("max".into()));
        assert_eq!(limits.memory_max(), "512M");
        assert_eq!(*limits.cpu_weight(), 50);
        assert_eq!(limits.pids_max(), "max");
    }
}
