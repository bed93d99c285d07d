//! Filesystem cache backend
//!
//! Stores each cached API response as a JSON file named after its cache key.
//! Keys are percent-encoded into file names so any key maps to exactly one
//! file and the key can be recovered from the name for mask matching.

use directories::ProjectDirs;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::trace;

use super::{decode_entry, CacheBackend};
use crate::error::CacheError;

/// Extension of every cache file
const CACHE_FILE_EXTENSION: &str = "json";

/// Stores cached responses as files in one directory
///
/// The directory is created on first write. Entries never expire; they are
/// removed only through [`CacheBackend::delete`] and
/// [`CacheBackend::delete_matching`].
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl FileCache {
    /// Creates a FileCache in the platform cache directory
    ///
    /// Uses `~/.cache/chgk-rating/` on Linux, or equivalent XDG path on other
    /// platforms. Returns `None` if the directory cannot be determined.
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "chgk-rating")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a FileCache with a custom cache directory
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Directory the cache files live in
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to the cache file for the given key
    pub fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", encode_key(key), CACHE_FILE_EXTENSION))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Cache files currently on disk, paired with their decoded keys
    fn entries(&self) -> Result<Vec<(String, PathBuf)>, CacheError> {
        let dir = match fs::read_dir(&self.cache_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in dir {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_FILE_EXTENSION) {
                continue;
            }
            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_key);
            if let Some(key) = key {
                entries.push((key, path));
            }
        }
        Ok(entries)
    }
}

impl CacheBackend for FileCache {
    fn name(&self) -> &'static str {
        "file"
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>, CacheError> {
        let path = self.cache_path(key);
        trace!("Reading cache file {:?}", path);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        decode_entry(key, &content).map(Some)
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), CacheError> {
        self.ensure_dir()?;

        let json = serde_json::to_string_pretty(value)?;
        let path = self.cache_path(key);
        trace!("Writing {} bytes to {:?}", json.len(), path);
        fs::write(path, json)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.cache_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_matching(&mut self, mask: &str) -> Result<usize, CacheError> {
        let pattern = mask_pattern(mask)?;

        let mut removed = 0;
        for (key, path) in self.entries()? {
            if pattern.matches(&key) {
                trace!("Deleting cache file {:?}", path);
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Compiles a Redis-style mask into a glob pattern
///
/// Both tiers must select the same keys for the same mask, so the Redis
/// dialect is translated: `[^..]` becomes `[!..]`, `\x` becomes a literal
/// `x`, runs of `*` collapse to one and an unclosed `[` is literal.
fn mask_pattern(mask: &str) -> Result<glob::Pattern, CacheError> {
    glob::Pattern::new(&translate_mask(mask)).map_err(|source| CacheError::InvalidMask {
        mask: mask.to_string(),
        source,
    })
}

fn translate_mask(mask: &str) -> String {
    let chars: Vec<char> = mask.chars().collect();
    let mut out = String::with_capacity(mask.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                push_literal(&mut out, chars[i + 1]);
                i += 2;
            }
            '*' => {
                out.push('*');
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
            }
            '[' => match read_class(&chars[i + 1..]) {
                Some((negated, members, len)) => {
                    push_class(&mut out, negated, members);
                    i += 1 + len;
                }
                None => {
                    push_literal(&mut out, '[');
                    i += 1;
                }
            },
            c => {
                push_literal(&mut out, c);
                i += 1;
            }
        }
    }
    out
}

/// Reads a character class body following `[`; returns whether it is
/// negated, its members and how many chars it spans including the closing
/// `]`, or `None` when the class never closes
fn read_class(chars: &[char]) -> Option<(bool, Vec<char>, usize)> {
    let negated = chars.first() == Some(&'^');
    let mut i = usize::from(negated);
    let mut members = Vec::new();
    loop {
        match *chars.get(i)? {
            ']' => return Some((negated, members, i + 1)),
            '\\' if i + 1 < chars.len() => {
                members.push(chars[i + 1]);
                i += 2;
            }
            c => {
                members.push(c);
                i += 1;
            }
        }
    }
}

fn push_class(out: &mut String, negated: bool, mut members: Vec<char>) {
    if members.is_empty() {
        // `[]` matches nothing in Redis, `[^]` matches any one character
        out.push_str(if negated { "?" } else { "[!\u{0}-\u{10FFFF}]" });
        return;
    }
    if !negated && members == ['!'] {
        out.push('!');
        return;
    }
    // glob reads a leading `]` as a member and a leading `!` as negation
    if let Some(pos) = members.iter().position(|&c| c == ']') {
        let bracket = members.remove(pos);
        members.insert(0, bracket);
    } else if members[0] == '!' {
        members.rotate_left(1);
    }

    out.push('[');
    if negated {
        out.push('!');
    }
    out.extend(members);
    out.push(']');
}

fn push_literal(out: &mut String, c: char) {
    if matches!(c, '*' | '?' | '[' | ']') {
        out.push('[');
        out.push(c);
        out.push(']');
    } else {
        out.push(c);
    }
}

/// Whether a byte may appear unescaped in a cache file name
fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')
}

/// Encodes a cache key into a filesystem-safe name
///
/// Bytes outside `[A-Za-z0-9_.-]` become `%XX`, so `tournament_rosters:5773`
/// is stored as `tournament_rosters%3A5773`.
pub fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for b in key.bytes() {
        if is_safe_byte(b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{:02X}", b));
        }
    }
    encoded
}

/// Reverses [`encode_key`]; returns `None` for names it could not have produced
pub fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}
