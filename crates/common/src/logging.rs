//! Logging initialization shared by the binary crate and by tests.

use std::env;

/// Initialize `env_logger` with the given namespace set to `level`, leaving
/// every other target at its default. Mirrors the verbosity-from-config
/// pattern used across this workspace's entry points.
pub fn init(namespace: &str, level: &str) {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", format!("{}={}", namespace, level));
    }
    let _ = env_logger::try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_does_not_panic_when_called_twice() {
        init("containerv", "debug");
        init("containerv", "debug");
    }
}
