//! Compiles the two BPF objects (filesystem rules, network rules) into
//! skeletons via `libbpf-cargo`, mirroring how an eBPF-based container MAC
//! layer built on LSM hooks generates its userspace bindings from C sources
//! at build time.

use anyhow::{Context, Result};
use libbpf_cargo::SkeletonBuilder;
use std::env;
use std::path::PathBuf;

const SOURCES: &[(&str, &str)] = &[
    ("fs", "bpf/fs.bpf.c"),
    ("net", "bpf/net.bpf.c"),
];

fn main() -> Result<()> {
    let out_dir = PathBuf::from(env::var("OUT_DIR").context("OUT_DIR not set")?);

    for (name, source) in SOURCES {
        let skel_path = out_dir.join(format!("{}.skel.rs", name));
        SkeletonBuilder::new()
            .source(source)
            .build_and_generate(&skel_path)
            .with_context(|| format!("build BPF skeleton for {}", source))?;
        println!("cargo:rerun-if-changed={}", source);
    }
    println!("cargo:rerun-if-changed=bpf/vmlinux.h");
    println!("cargo:rerun-if-changed=bpf/policy_maps.h");

    Ok(())
}
