//! Compiles a user-supplied [`Policy`] against a resolved rootfs into the
//! `(map, key, value)` triples the policy map manager installs into the
//! kernel. Pure and synchronous: no BPF syscalls happen here, only `stat`
//! calls to resolve paths to `(dev, ino)` and one `fstat` to resolve the
//! cgroup id.

use crate::error::{PolicyError, Result};
use crate::types::{
    AddressFamily, BasenameRule, BasenameToken, DirFlags, DirRule, FileRule, FsAllow, NetAllow,
    NetRule, Policy, SockKind, MAX_BASENAME_BUCKET, MAX_BASENAME_TOKENS, MAX_LITERAL_LEN,
};
use log::warn;
use std::collections::HashMap;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// `(cgroup_id, dev, ino)` — the key shape shared by the file, directory and
/// basename maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct FsKey {
    pub cgroup_id: u64,
    pub dev: u64,
    pub ino: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct FsValue {
    pub allow: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct DirValue {
    pub allow: u32,
    pub flags: u32,
}

/// One packed basename rule record inside a bucket's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct BasenameRuleRecord {
    pub token_count: u8,
    pub tail_wildcard: u8,
    pub allow: u32,
    /// Up to [`MAX_BASENAME_TOKENS`] tokens, each a `(kind, literal)` pair.
    /// `literal` is only meaningful for `Literal` tokens and is NUL-padded.
    pub token_kinds: [u8; MAX_BASENAME_TOKENS],
    pub token_literals: [[u8; MAX_LITERAL_LEN]; MAX_BASENAME_TOKENS],
    pub token_lens: [u8; MAX_BASENAME_TOKENS],
}

impl Default for BasenameRuleRecord {
    fn default() -> Self {
        Self {
            token_count: 0,
            tail_wildcard: 0,
            allow: 0,
            token_kinds: [0; MAX_BASENAME_TOKENS],
            token_literals: [[0; MAX_LITERAL_LEN]; MAX_BASENAME_TOKENS],
            token_lens: [0; MAX_BASENAME_TOKENS],
        }
    }
}

const TOKEN_KIND_LITERAL: u8 = 0;
const TOKEN_KIND_SINGLE_DIGIT: u8 = 1;
const TOKEN_KIND_ONE_OR_MORE_DIGITS: u8 = 2;
const TOKEN_KIND_TAIL_WILDCARD: u8 = 3;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct BasenameValue {
    pub rules: Vec<BasenameRuleRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct NetCreateKey {
    pub cgroup_id: u64,
    pub family: u32,
    pub sock_type: u32,
    pub protocol: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct NetTupleKey {
    pub cgroup_id: u64,
    pub family: u32,
    pub sock_type: u32,
    pub protocol: u32,
    pub port: u16,
    pub addr: [u8; 16],
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct NetUnixKey {
    pub cgroup_id: u64,
    pub sock_type: u32,
    pub protocol: u32,
    pub path: [u8; 108],
}

/// One `(map, key, value)` triple ready for `BPF_MAP_UPDATE_ELEM`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapEntry {
    File { key: FsKey, value: FsValue },
    Dir { key: FsKey, value: DirValue },
    Basename { key: FsKey, value: BasenameValue },
    NetCreate { key: NetCreateKey, value: u32 },
    NetTuple { key: NetTupleKey, value: u32 },
    NetUnix { key: NetUnixKey, value: u32 },
}

/// Reinterprets a `#[repr(C)]` plain-data struct as its raw bytes, for
/// handing straight to `BPF_MAP_UPDATE_ELEM`.
fn as_bytes<T>(value: &T) -> Vec<u8> {
    unsafe { std::slice::from_raw_parts(value as *const T as *const u8, std::mem::size_of::<T>()) }.to_vec()
}

impl MapEntry {
    /// Which of the six pinned maps this entry belongs to.
    pub fn map_name(&self) -> &'static str {
        match self {
            MapEntry::File { .. } => "policy",
            MapEntry::Dir { .. } => "dir_policy",
            MapEntry::Basename { .. } => "basename_policy",
            MapEntry::NetCreate { .. } => "net_create",
            MapEntry::NetTuple { .. } => "net_tuple",
            MapEntry::NetUnix { .. } => "net_unix",
        }
    }

    /// The raw key bytes for this entry, independent of its value.
    pub fn key_bytes(&self) -> Vec<u8> {
        match self {
            MapEntry::File { key, .. } => as_bytes(key),
            MapEntry::Dir { key, .. } => as_bytes(key),
            MapEntry::Basename { key, .. } => as_bytes(key),
            MapEntry::NetCreate { key, .. } => as_bytes(key),
            MapEntry::NetTuple { key, .. } => as_bytes(key),
            MapEntry::NetUnix { key, .. } => as_bytes(key),
        }
    }

    /// The raw value bytes for this entry. `Basename` values are packed to
    /// the map's fixed `count: u32` + `MAX_BASENAME_BUCKET` record layout;
    /// every other variant is already `#[repr(C)]` plain data.
    pub fn value_bytes(&self) -> Vec<u8> {
        match self {
            MapEntry::File { value, .. } => as_bytes(value),
            MapEntry::Dir { value, .. } => as_bytes(value),
            MapEntry::Basename { value, .. } => {
                let mut out = Vec::with_capacity(4 + MAX_BASENAME_BUCKET * std::mem::size_of::<BasenameRuleRecord>());
                out.extend_from_slice(&(value.rules.len() as u32).to_ne_bytes());
                for i in 0..MAX_BASENAME_BUCKET {
                    let record = value.rules.get(i).copied().unwrap_or_default();
                    out.extend_from_slice(&as_bytes(&record));
                }
                out
            }
            MapEntry::NetCreate { value, .. } => value.to_ne_bytes().to_vec(),
            MapEntry::NetTuple { value, .. } => value.to_ne_bytes().to_vec(),
            MapEntry::NetUnix { value, .. } => value.to_ne_bytes().to_vec(),
        }
    }
}

/// The full result of compiling a [`Policy`] against one container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledPolicy {
    pub cgroup_id: u64,
    pub entries: Vec<MapEntry>,
}

/// Resolve `container_id`'s cgroup id as the inode number of
/// `<cgroup_root>/<hostname>`, validating the hostname first (path
/// traversal guard per §4.F step 1).
pub fn resolve_cgroup_id(cgroup_root: &Path, hostname: &str) -> Result<u64> {
    common::validate::hostname(hostname).map_err(|_| PolicyError::InvalidHostname(hostname.into()))?;
    let path = cgroup_root.join(hostname);
    let meta = std::fs::metadata(&path).map_err(|e| PolicyError::CgroupIdUnavailable(path, e))?;
    Ok(meta.ino())
}

/// Compile `policy` against `rootfs`, keyed by the cgroup id for `hostname`
/// under `cgroup_root`. Missing files are skipped with a warning (not
/// fatal); oversize basename buckets or UNIX paths are fatal.
pub fn compile(
    rootfs: &Path,
    cgroup_root: &Path,
    hostname: &str,
    policy: &Policy,
) -> Result<CompiledPolicy> {
    let cgroup_id = resolve_cgroup_id(cgroup_root, hostname)?;
    let mut entries = Vec::new();

    for rule in &policy.files {
        if let Some(entry) = compile_file_rule(cgroup_id, rootfs, rule) {
            entries.push(entry);
        }
    }
    for rule in &policy.dirs {
        if let Some(entry) = compile_dir_rule(cgroup_id, rootfs, rule) {
            entries.push(entry);
        }
    }
    entries.extend(compile_basename_rules(cgroup_id, rootfs, &policy.basenames)?);
    for rule in &policy.nets {
        entries.push(compile_net_rule(cgroup_id, rule)?);
    }

    Ok(CompiledPolicy { cgroup_id, entries })
}

fn resolve_path(rootfs: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        rootfs.join(path)
    } else if let Ok(relative) = path.strip_prefix("/") {
        rootfs.join(relative)
    } else {
        path.to_path_buf()
    }
}

fn stat_dev_ino(path: &Path) -> Option<(u64, u64)> {
    match std::fs::metadata(path) {
        Ok(meta) => Some((meta.dev(), meta.ino())),
        Err(e) => {
            warn!("policy rule path {} unavailable: {}", path.display(), e);
            None
        }
    }
}

fn compile_file_rule(cgroup_id: u64, rootfs: &Path, rule: &FileRule) -> Option<MapEntry> {
    let resolved = resolve_path(rootfs, &rule.path);
    let (dev, ino) = stat_dev_ino(&resolved)?;
    Some(MapEntry::File {
        key: FsKey { cgroup_id, dev, ino },
        value: FsValue {
            allow: rule.allow.bits(),
        },
    })
}

fn compile_dir_rule(cgroup_id: u64, rootfs: &Path, rule: &DirRule) -> Option<MapEntry> {
    let resolved = resolve_path(rootfs, &rule.path);
    let (dev, ino) = stat_dev_ino(&resolved)?;
    Some(MapEntry::Dir {
        key: FsKey { cgroup_id, dev, ino },
        value: DirValue {
            allow: rule.allow.bits(),
            flags: rule.flags.bits(),
        },
    })
}

fn compile_basename_rules(
    cgroup_id: u64,
    rootfs: &Path,
    rules: &[BasenameRule],
) -> Result<Vec<MapEntry>> {
    // Group by resolved parent (dev, ino), preserving first-seen order so
    // the result is deterministic (matches §4.F step 5's "insertion order").
    let mut order: Vec<FsKey> = Vec::new();
    let mut buckets: HashMap<FsKey, Vec<BasenameRuleRecord>> = HashMap::new();

    for rule in rules {
        let resolved = resolve_path(rootfs, &rule.parent);
        let (dev, ino) = match stat_dev_ino(&resolved) {
            Some(v) => v,
            None => continue,
        };
        let key = FsKey { cgroup_id, dev, ino };
        let record = pack_basename_rule(rule)?;

        let bucket = buckets.entry(key).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        if bucket.len() >= MAX_BASENAME_BUCKET {
            return Err(PolicyError::TooManyRules {
                parent: rule.parent.clone(),
                count: bucket.len() + 1,
                max: MAX_BASENAME_BUCKET,
            });
        }
        bucket.push(record);
    }

    Ok(order
        .into_iter()
        .map(|key| MapEntry::Basename {
            key,
            value: BasenameValue {
                rules: buckets.remove(&key).unwrap_or_default(),
            },
        })
        .collect())
}

fn pack_basename_rule(rule: &BasenameRule) -> Result<BasenameRuleRecord> {
    if rule.tokens.len() > MAX_BASENAME_TOKENS {
        return Err(PolicyError::BadBasenamePattern {
            pattern: format!("{:?}", rule.tokens),
            reason: format!(
                "{} tokens exceeds the {}-token limit",
                rule.tokens.len(),
                MAX_BASENAME_TOKENS
            ),
        });
    }

    let mut record = BasenameRuleRecord {
        allow: rule.allow.bits(),
        ..Default::default()
    };
    record.token_count = rule.tokens.len() as u8;

    for (i, token) in rule.tokens.iter().enumerate() {
        let is_last = i + 1 == rule.tokens.len();
        match token {
            BasenameToken::Literal(lit) => {
                if lit.len() > MAX_LITERAL_LEN {
                    return Err(PolicyError::BadBasenamePattern {
                        pattern: lit.clone(),
                        reason: format!(
                            "literal {:?} exceeds the {}-byte limit",
                            lit, MAX_LITERAL_LEN
                        ),
                    });
                }
                record.token_kinds[i] = TOKEN_KIND_LITERAL;
                record.token_literals[i][..lit.len()].copy_from_slice(lit.as_bytes());
                record.token_lens[i] = lit.len() as u8;
            }
            BasenameToken::SingleDigit => record.token_kinds[i] = TOKEN_KIND_SINGLE_DIGIT,
            BasenameToken::OneOrMoreDigits => {
                record.token_kinds[i] = TOKEN_KIND_ONE_OR_MORE_DIGITS
            }
            BasenameToken::TailWildcard => {
                if !is_last {
                    return Err(PolicyError::BadBasenamePattern {
                        pattern: format!("{:?}", rule.tokens),
                        reason: "tail wildcard may only appear as the final token".into(),
                    });
                }
                record.token_kinds[i] = TOKEN_KIND_TAIL_WILDCARD;
                record.tail_wildcard = 1;
            }
        }
    }

    Ok(record)
}

fn compile_net_rule(cgroup_id: u64, rule: &NetRule) -> Result<MapEntry> {
    match rule {
        NetRule::Create {
            family,
            kind,
            protocol,
            allow,
        } => Ok(MapEntry::NetCreate {
            key: NetCreateKey {
                cgroup_id,
                family: family_to_u32(*family),
                sock_type: sock_kind_to_u32(*kind),
                protocol: *protocol,
            },
            value: allow.bits(),
        }),
        NetRule::Tuple {
            family,
            kind,
            protocol,
            port,
            addr,
            allow,
        } => Ok(MapEntry::NetTuple {
            key: NetTupleKey {
                cgroup_id,
                family: family_to_u32(*family),
                sock_type: sock_kind_to_u32(*kind),
                protocol: *protocol,
                port: *port,
                addr: *addr,
            },
            value: allow.bits(),
        }),
        NetRule::Unix {
            kind,
            protocol,
            path,
            allow,
        } => {
            // 108 bytes total, one reserved for the NUL terminator.
            if path.len() > 107 {
                return Err(PolicyError::UnixPathTooLong(path.clone()));
            }
            let mut buf = [0u8; 108];
            buf[..path.len()].copy_from_slice(path.as_bytes());
            Ok(MapEntry::NetUnix {
                key: NetUnixKey {
                    cgroup_id,
                    sock_type: sock_kind_to_u32(*kind),
                    protocol: *protocol,
                    path: buf,
                },
                value: allow.bits(),
            })
        }
    }
}

fn family_to_u32(family: AddressFamily) -> u32 {
    match family {
        AddressFamily::Inet => libc::AF_INET as u32,
        AddressFamily::Inet6 => libc::AF_INET6 as u32,
        AddressFamily::Unix => libc::AF_UNIX as u32,
    }
}

fn sock_kind_to_u32(kind: SockKind) -> u32 {
    match kind {
        SockKind::Stream => libc::SOCK_STREAM as u32,
        SockKind::Dgram => libc::SOCK_DGRAM as u32,
    }
}

/// Parse a basename pattern string using the grammar
/// `{ literal-char | '?' | '[0-9]' | '[0-9]+' | '*' (final) }` into the
/// structured [`BasenameToken`] sequence [`BasenameRule`] expects.
pub fn parse_pattern(pattern: &str) -> Result<Vec<BasenameToken>> {
    let bytes = pattern.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut literal = String::new();

    let flush_literal = |literal: &mut String, tokens: &mut Vec<BasenameToken>| -> Result<()> {
        if literal.is_empty() {
            return Ok(());
        }
        if literal.len() > MAX_LITERAL_LEN {
            return Err(PolicyError::BadBasenamePattern {
                pattern: literal.clone(),
                reason: format!("literal exceeds the {}-byte limit", MAX_LITERAL_LEN),
            });
        }
        tokens.push(BasenameToken::Literal(std::mem::take(literal)));
        Ok(())
    };

    while i < bytes.len() {
        if bytes[i] == b'[' && pattern[i..].starts_with("[0-9]") {
            flush_literal(&mut literal, &mut tokens)?;
            if pattern[i..].starts_with("[0-9]+") {
                tokens.push(BasenameToken::OneOrMoreDigits);
                i += 6;
            } else {
                tokens.push(BasenameToken::SingleDigit);
                i += 5;
            }
        } else if bytes[i] == b'*' {
            flush_literal(&mut literal, &mut tokens)?;
            if i + 1 != bytes.len() {
                return Err(PolicyError::BadBasenamePattern {
                    pattern: pattern.into(),
                    reason: "tail wildcard '*' may only appear as the final character".into(),
                });
            }
            tokens.push(BasenameToken::TailWildcard);
            i += 1;
        } else {
            literal.push(bytes[i] as char);
            i += 1;
        }
    }
    flush_literal(&mut literal, &mut tokens)?;

    if tokens.len() > MAX_BASENAME_TOKENS {
        return Err(PolicyError::BadBasenamePattern {
            pattern: pattern.into(),
            reason: format!(
                "{} tokens exceeds the {}-token limit",
                tokens.len(),
                MAX_BASENAME_TOKENS
            ),
        });
    }

    Ok(tokens)
}

/// Reference matcher for the basename grammar, used by tests and by the
/// in-kernel enforcement layer's userspace counterpart (the kernel side
/// implements the same logic in BPF C). Matching consumes exactly
/// `name`'s length when accepting, unless a tail wildcard is present.
pub fn matches_pattern(tokens: &[BasenameToken], name: &str) -> bool {
    let bytes = name.as_bytes();
    let mut pos = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token {
            BasenameToken::Literal(lit) => {
                let lit_bytes = lit.as_bytes();
                if pos + lit_bytes.len() > bytes.len() {
                    return false;
                }
                for (a, b) in lit_bytes.iter().zip(&bytes[pos..pos + lit_bytes.len()]) {
                    if *a != b'?' && *a != *b {
                        return false;
                    }
                }
                pos += lit_bytes.len();
            }
            BasenameToken::SingleDigit => {
                if pos >= bytes.len() || !bytes[pos].is_ascii_digit() {
                    return false;
                }
                pos += 1;
            }
            BasenameToken::OneOrMoreDigits => {
                let start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                if pos == start {
                    return false;
                }
            }
            BasenameToken::TailWildcard => {
                debug_assert_eq!(i, tokens.len() - 1, "tail wildcard must be last token");
                return true;
            }
        }
    }

    pos == bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FsAllow;
    use anyhow::Result as AnyResult;
    use std::os::unix::fs::symlink;

    #[test]
    fn invalid_hostname_is_rejected_before_cgroup_lookup() {
        let err = resolve_cgroup_id(Path::new("/sys/fs/cgroup"), "..foo").unwrap_err();
        assert!(matches!(err, PolicyError::InvalidHostname(_)));

        let err = resolve_cgroup_id(Path::new("/sys/fs/cgroup"), "foo/bar").unwrap_err();
        assert!(matches!(err, PolicyError::InvalidHostname(_)));
    }

    #[test]
    fn missing_file_rule_is_skipped_not_fatal() -> AnyResult<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("c-test"))?;
        let cgroup_id = resolve_cgroup_id(dir.path(), "c-test")?;

        let policy = Policy {
            files: vec![FileRule {
                path: dir.path().join("does-not-exist"),
                allow: FsAllow::READ,
            }],
            ..Default::default()
        };
        let compiled = compile(dir.path(), dir.path(), "c-test", &policy)?;
        assert_eq!(compiled.cgroup_id, cgroup_id);
        assert!(compiled.entries.is_empty());
        Ok(())
    }

    #[test]
    fn existing_file_rule_resolves_dev_ino() -> AnyResult<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("c-test"))?;
        std::fs::write(dir.path().join("hosts"), b"127.0.0.1 localhost")?;

        let policy = Policy {
            files: vec![FileRule {
                path: PathBuf::from("/hosts"),
                allow: FsAllow::READ,
            }],
            ..Default::default()
        };
        let compiled = compile(dir.path(), dir.path(), "c-test", &policy)?;
        assert_eq!(compiled.entries.len(), 1);
        assert!(matches!(compiled.entries[0], MapEntry::File { .. }));
        Ok(())
    }

    #[test]
    fn basename_bucket_over_capacity_is_exhausted() -> AnyResult<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("c-test"))?;
        std::fs::create_dir(dir.path().join("dev"))?;

        let rules: Vec<_> = (0..MAX_BASENAME_BUCKET + 1)
            .map(|i| BasenameRule {
                parent: PathBuf::from("/dev"),
                tokens: vec![BasenameToken::Literal(format!("rule{}", i))],
                allow: FsAllow::READ,
            })
            .collect();
        let policy = Policy {
            basenames: rules,
            ..Default::default()
        };
        let err = compile(dir.path(), dir.path(), "c-test", &policy).unwrap_err();
        assert!(matches!(err, PolicyError::TooManyRules { .. }));
        Ok(())
    }

    #[test]
    fn unix_path_over_limit_is_rejected() {
        let rule = NetRule::Unix {
            kind: SockKind::Stream,
            protocol: 0,
            path: "a".repeat(108),
            allow: NetAllow::CONNECT,
        };
        let err = compile_net_rule(1, &rule).unwrap_err();
        assert!(matches!(err, PolicyError::UnixPathTooLong(_)));
    }

    #[test]
    fn parse_nvme_pattern_matches_expected_strings() -> AnyResult<()> {
        let tokens = parse_pattern("nvme[0-9]+n[0-9]+p[0-9]+")?;
        assert_eq!(tokens.len(), 6);

        assert!(matches_pattern(&tokens, "nvme0n1p2"));
        assert!(matches_pattern(&tokens, "nvme12n3p456"));
        assert!(!matches_pattern(&tokens, "nvme0n1"));
        assert!(!matches_pattern(&tokens, "nvme0n1p"));
        assert!(!matches_pattern(&tokens, "nvmen1p1"));
        Ok(())
    }

    #[test]
    fn tail_wildcard_only_valid_as_final_token() {
        assert!(parse_pattern("abc*").is_ok());
        assert!(parse_pattern("abc*def").is_err());
    }

    #[test]
    fn tail_wildcard_accepts_any_suffix() -> AnyResult<()> {
        let tokens = parse_pattern("log-*")?;
        assert!(matches_pattern(&tokens, "log-"));
        assert!(matches_pattern(&tokens, "log-anything"));
        assert!(!matches_pattern(&tokens, "log"));
        Ok(())
    }

    #[test]
    fn question_mark_matches_single_char_within_literal() -> AnyResult<()> {
        let tokens = parse_pattern("tty?")?;
        assert!(matches_pattern(&tokens, "tty0"));
        assert!(matches_pattern(&tokens, "ttyX"));
        assert!(!matches_pattern(&tokens, "tty"));
        assert!(!matches_pattern(&tokens, "ttyXX"));
        Ok(())
    }

    #[test]
    fn basename_rule_pack_rejects_too_many_tokens() {
        let rule = BasenameRule {
            parent: PathBuf::from("/dev"),
            tokens: vec![BasenameToken::SingleDigit; MAX_BASENAME_TOKENS + 1],
            allow: FsAllow::READ,
        };
        assert!(pack_basename_rule(&rule).is_err());
    }

    #[test]
    fn symlinked_rootfs_paths_still_resolve() -> AnyResult<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("c-test"))?;
        std::fs::write(dir.path().join("real"), b"data")?;
        symlink(dir.path().join("real"), dir.path().join("link"))?;

        let policy = Policy {
            files: vec![FileRule {
                path: PathBuf::from("/link"),
                allow: FsAllow::READ,
            }],
            ..Default::default()
        };
        let compiled = compile(dir.path(), dir.path(), "c-test", &policy)?;
        assert_eq!(compiled.entries.len(), 1);
        Ok(())
    }
}
