//! Resource usage snapshots for a running container: memory, CPU, pids,
//! block I/O and network counters, read straight out of cgroupfs and procfs.
//!
//! Every parser here is tolerant of files that are missing, empty, or in a
//! format the kernel hasn't written yet (e.g. a counter that only appears
//! once a controller is actually enabled). Missing data surfaces as `None`
//! on [`Usage`], never as an error: a monitoring loop should keep polling
//! through a transient gap rather than abort the container.

use getset::Getters;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Point-in-time resource usage for one container's cgroup.
#[derive(Clone, Debug, Default, Getters)]
#[get = "pub"]
pub struct Usage {
    memory_current_bytes: Option<u64>,
    memory_peak_bytes: Option<u64>,
    pids_current: Option<u64>,
    cpu_usage_usec: Option<u64>,
    cpu_percent: Option<f64>,
    io_read_bytes: Option<u64>,
    io_write_bytes: Option<u64>,
    io_read_ops: Option<u64>,
    io_write_ops: Option<u64>,
    net_rx_bytes: Option<u64>,
    net_tx_bytes: Option<u64>,
}

/// Samples [`Usage`] for a single container's cgroup directory over time,
/// keeping enough state (previous CPU usec and wall-clock instant) to turn
/// cumulative `cpu.stat` counters into a CPU percentage.
pub struct UsageMonitor {
    cgroup_dir: PathBuf,
    net_device: Option<String>,
    last_cpu_usec: Option<u64>,
    last_sample_at: Option<Instant>,
}

impl UsageMonitor {
    pub fn new(cgroup_dir: impl Into<PathBuf>, net_device: Option<String>) -> Self {
        Self {
            cgroup_dir: cgroup_dir.into(),
            net_device,
            last_cpu_usec: None,
            last_sample_at: None,
        }
    }

    /// Take a new sample. The first call never populates `cpu_percent`
    /// since there is no prior sample to diff against.
    pub fn sample(&mut self) -> Usage {
        let now = Instant::now();
        let cpu_usec = read_cpu_usage_usec(&self.cgroup_dir);

        let cpu_percent = match (self.last_cpu_usec, cpu_usec, self.last_sample_at) {
            (Some(prev_usec), Some(cur_usec), Some(prev_at)) if cur_usec >= prev_usec => {
                let delta_usec = (cur_usec - prev_usec) as f64;
                let delta_wall = now.duration_since(prev_at).as_micros() as f64;
                if delta_wall > 0.0 {
                    Some((delta_usec / delta_wall) * 100.0)
                } else {
                    None
                }
            }
            _ => None,
        };

        self.last_cpu_usec = cpu_usec;
        self.last_sample_at = Some(now);

        let (io_read_bytes, io_write_bytes, io_read_ops, io_write_ops) =
            read_io_stat(&self.cgroup_dir);
        let (net_rx_bytes, net_tx_bytes) = self
            .net_device
            .as_deref()
            .and_then(read_net_dev)
            .unzip();

        Usage {
            memory_current_bytes: read_u64_file(&self.cgroup_dir.join("memory.current")),
            memory_peak_bytes: read_u64_file(&self.cgroup_dir.join("memory.peak")),
            pids_current: read_pids_current(&self.cgroup_dir),
            cpu_usage_usec: cpu_usec,
            cpu_percent,
            io_read_bytes,
            io_write_bytes,
            io_read_ops,
            io_write_ops,
            net_rx_bytes,
            net_tx_bytes,
        }
    }
}

fn read_u64_file(path: &Path) -> Option<u64> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn read_pids_current(cgroup_dir: &Path) -> Option<u64> {
    // cgroup.procs has one pid per line; pids.current is simpler when
    // present but not guaranteed on every kernel, so fall back to a count.
    if let Some(n) = read_u64_file(&cgroup_dir.join("pids.current")) {
        return Some(n);
    }
    let contents = fs::read_to_string(cgroup_dir.join("cgroup.procs")).ok()?;
    Some(contents.lines().filter(|l| !l.trim().is_empty()).count() as u64)
}

fn read_cpu_usage_usec(cgroup_dir: &Path) -> Option<u64> {
    let contents = fs::read_to_string(cgroup_dir.join("cpu.stat")).ok()?;
    parse_cpu_stat(&contents)
}

fn parse_cpu_stat(contents: &str) -> Option<u64> {
    for line in contents.lines() {
        let mut parts = line.split_whitespace();
        if parts.next() == Some("usage_usec") {
            return parts.next()?.parse().ok();
        }
    }
    None
}

fn read_io_stat(cgroup_dir: &Path) -> (Option<u64>, Option<u64>, Option<u64>, Option<u64>) {
    let contents = match fs::read_to_string(cgroup_dir.join("io.stat")) {
        Ok(c) => c,
        Err(_) => return (None, None, None, None),
    };
    parse_io_stat(&contents)
}

/// Sums per-device `io.stat` counters across every device line, since a
/// container may straddle more than one block device.
fn parse_io_stat(contents: &str) -> (Option<u64>, Option<u64>, Option<u64>, Option<u64>) {
    let mut rbytes = 0u64;
    let mut wbytes = 0u64;
    let mut rios = 0u64;
    let mut wios = 0u64;
    let mut saw_any = false;

    for line in contents.lines() {
        for field in line.split_whitespace().skip(1) {
            if let Some(v) = field.strip_prefix("rbytes=") {
                rbytes += v.parse().unwrap_or(0);
                saw_any = true;
            } else if let Some(v) = field.strip_prefix("wbytes=") {
                wbytes += v.parse().unwrap_or(0);
                saw_any = true;
            } else if let Some(v) = field.strip_prefix("rios=") {
                rios += v.parse().unwrap_or(0);
                saw_any = true;
            } else if let Some(v) = field.strip_prefix("wios=") {
                wios += v.parse().unwrap_or(0);
                saw_any = true;
            }
        }
    }

    if saw_any {
        (Some(rbytes), Some(wbytes), Some(rios), Some(wios))
    } else {
        (None, None, None, None)
    }
}

/// Reads `(rx_bytes, tx_bytes)` for `device` out of `/proc/net/dev`.
fn read_net_dev(device: &str) -> Option<(u64, u64)> {
    let contents = fs::read_to_string("/proc/net/dev").ok()?;
    parse_net_dev(&contents, device)
}

fn parse_net_dev(contents: &str, device: &str) -> Option<(u64, u64)> {
    for line in contents.lines() {
        let (name, rest) = line.split_once(':')?;
        if name.trim() != device {
            continue;
        }
        let mut fields = rest.split_whitespace();
        let rx_bytes = fields.next()?.parse().ok()?;
        // tx_bytes is the 9th whitespace-separated field after rx_bytes:
        // rx: bytes packets errs drop fifo frame compressed multicast
        // tx: bytes ...
        let tx_bytes = fields.nth(7)?.parse().ok()?;
        return Some((rx_bytes, tx_bytes));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn parses_cpu_stat() {
        let sample = "usage_usec 123456\nuser_usec 100000\nsystem_usec 23456\n";
        assert_eq!(parse_cpu_stat(sample), Some(123456));
    }

    #[test]
    fn cpu_stat_missing_field_is_none() {
        assert_eq!(parse_cpu_stat("user_usec 100\n"), None);
    }

    #[test]
    fn parses_io_stat_summed_across_devices() {
        let sample = "8:0 rbytes=100 wbytes=200 rios=1 wios=2\n\
                       8:16 rbytes=50 wbytes=0 rios=1 wios=0\n";
        assert_eq!(
            parse_io_stat(sample),
            (Some(150), Some(200), Some(2), Some(2))
        );
    }

    #[test]
    fn io_stat_empty_is_all_none() {
        assert_eq!(parse_io_stat(""), (None, None, None, None));
    }

    #[test]
    fn parses_net_dev_line() {
        let sample = "Inter-|   Receive                                                |  Transmit\n \
                       face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n \
                       veth0: 1000     10    0    0    0     0          0         0     2000      20    0    0    0     0       0          0\n";
        assert_eq!(parse_net_dev(sample, "veth0"), Some((1000, 2000)));
    }

    #[test]
    fn net_dev_unknown_device_is_none() {
        let sample = "  eth0: 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16\n";
        assert_eq!(parse_net_dev(sample, "veth0"), None);
    }

    #[test]
    fn sample_on_missing_cgroup_dir_returns_empty_usage() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut monitor = UsageMonitor::new(dir.path().join("does-not-exist"), None);
        let usage = monitor.sample();
        assert!(usage.memory_current_bytes().is_none());
        assert!(usage.cpu_percent().is_none());
        Ok(())
    }

    #[test]
    fn second_sample_computes_cpu_percent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("cpu.stat"), "usage_usec 1000\n")?;
        let mut monitor = UsageMonitor::new(dir.path(), None);
        let first = monitor.sample();
        assert!(first.cpu_percent().is_none());

        fs::write(dir.path().join("cpu.stat"), "usage_usec 2000\n")?;
        let second = monitor.sample();
        // cpu_percent is Some because usec advanced between two real calls;
        // the value itself is timing-dependent so we only assert presence.
        assert!(second.cpu_percent().is_some());
        Ok(())
    }
}
