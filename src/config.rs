use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use cross_xdg::BaseDirs;
use tracing::{debug, warn};

pub const DEFAULT_TAPE_CELLS: usize = 30_000;
pub const DEFAULT_MAX_PROGRAM_LEN: usize = 64 * 1024;
pub const DEFAULT_MAX_LOOP_DEPTH: usize = 512;
/// Byte stored by `,` once input is exhausted (what a C `EOF` truncates to).
pub const DEFAULT_EOF_BYTE: u8 = 0xFF;

/// Size limits applied while parsing and executing a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Number of cells on the tape.
    pub tape_cells: NonZeroUsize,
    /// Maximum number of instructions in a program.
    pub max_program_len: usize,
    /// Maximum nesting depth of `[` `]` pairs.
    pub max_loop_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            tape_cells: NonZeroUsize::new(DEFAULT_TAPE_CELLS).unwrap_or(NonZeroUsize::MIN),
            max_program_len: DEFAULT_MAX_PROGRAM_LEN,
            max_loop_depth: DEFAULT_MAX_LOOP_DEPTH,
        }
    }
}

/// Everything the `bf` binary can be configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub limits: Limits,
    pub eof_byte: u8,
    pub max_steps: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            eof_byte: DEFAULT_EOF_BYTE,
            max_steps: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("line {line}: expected `key = value`")]
    MissingEquals { line: usize },

    #[error("line {line}: unknown section [{section}]")]
    UnknownSection { line: usize, section: String },

    #[error("line {line}: unknown key `{key}`")]
    UnknownKey { line: usize, key: String },

    #[error("line {line}: invalid value `{value}` for `{key}`")]
    InvalidValue { line: usize, key: String, value: String },
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Root,
    Limits,
    Runtime,
}

impl Config {
    /// Defaults, then the config file, then `BF_*` environment variables.
    pub fn load() -> Self {
        let mut cfg = Config::default();
        if let Some(path) = config_path() {
            match fs::read_to_string(&path) {
                Ok(content) => match Config::from_toml_str(&content) {
                    Ok(parsed) => {
                        debug!(path = %path.display(), "loaded config file");
                        cfg = parsed;
                    }
                    Err(e) => warn!(path = %path.display(), "ignoring config file: {e}"),
                },
                Err(e) => debug!(path = %path.display(), "no config file read: {e}"),
            }
        }
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg
    }

    /// Parse the `[limits]` / `[runtime]` key-value format on top of the defaults.
    ///
    /// Values may be quoted. Lines starting with `#` are comments.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut cfg = Config::default();
        let mut section = Section::Root;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') { continue; }

            if line.starts_with('[') && line.ends_with(']') {
                section = match line[1..line.len() - 1].trim() {
                    "limits" => Section::Limits,
                    "runtime" => Section::Runtime,
                    other => {
                        return Err(ConfigError::UnknownSection {
                            line: line_no,
                            section: other.to_string(),
                        });
                    }
                };
                continue;
            }

            let Some(eq) = line.find('=') else {
                return Err(ConfigError::MissingEquals { line: line_no });
            };
            let key = line[..eq].trim();
            let val_raw = line[eq + 1..].trim();
            let val = if val_raw.starts_with('"') && val_raw.ends_with('"') && val_raw.len() >= 2 {
                &val_raw[1..val_raw.len() - 1]
            } else {
                val_raw
            };

            let invalid = || ConfigError::InvalidValue {
                line: line_no,
                key: key.to_string(),
                value: val.to_string(),
            };

            match (section, key) {
                (Section::Limits, "tape_cells") => {
                    cfg.limits.tape_cells = val.parse().map_err(|_| invalid())?;
                }
                (Section::Limits, "max_program_len") => {
                    cfg.limits.max_program_len = val.parse().map_err(|_| invalid())?;
                }
                (Section::Limits, "max_loop_depth") => {
                    cfg.limits.max_loop_depth = val.parse().map_err(|_| invalid())?;
                }
                (Section::Runtime, "eof") => {
                    cfg.eof_byte = val.parse().map_err(|_| invalid())?;
                }
                (Section::Runtime, "max_steps") => {
                    cfg.max_steps = Some(val.parse().map_err(|_| invalid())?);
                }
                _ => {
                    return Err(ConfigError::UnknownKey {
                        line: line_no,
                        key: key.to_string(),
                    });
                }
            }
        }

        Ok(cfg)
    }

    /// Override fields from `BF_*` variables, looked up through `lookup`.
    /// Values that do not parse are skipped with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            let raw = lookup(key)?;
            match raw.trim().parse::<T>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("ignoring {key}={raw:?}: not a valid value");
                    None
                }
            }
        }

        if let Some(v) = parsed(&lookup, "BF_TAPE_CELLS") { self.limits.tape_cells = v; }
        if let Some(v) = parsed(&lookup, "BF_MAX_PROGRAM_LEN") { self.limits.max_program_len = v; }
        if let Some(v) = parsed(&lookup, "BF_MAX_LOOP_DEPTH") { self.limits.max_loop_depth = v; }
        if let Some(v) = parsed(&lookup, "BF_EOF") { self.eof_byte = v; }
        if let Some(v) = parsed(&lookup, "BF_MAX_STEPS") { self.max_steps = Some(v); }
    }
}

/// `$BF_CONFIG`, else `bf.toml` under the XDG config home.
fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os("BF_CONFIG") {
        return Some(PathBuf::from(explicit));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_limits() {
        let cfg = Config::default();
        assert_eq!(cfg.limits.tape_cells.get(), 30_000);
        assert_eq!(cfg.limits.max_program_len, 65_536);
        assert_eq!(cfg.limits.max_loop_depth, 512);
        assert_eq!(cfg.eof_byte, 0xFF);
        assert_eq!(cfg.max_steps, None);
    }

    #[test]
    fn parses_sections_and_comments() {
        let text = r#"
# limits for small machines
[limits]
tape_cells = 100
max_program_len = "2048"
max_loop_depth = 8

[runtime]
eof = 0
max_steps = 1000
"#;
        let cfg = Config::from_toml_str(text).unwrap();
        assert_eq!(cfg.limits.tape_cells.get(), 100);
        assert_eq!(cfg.limits.max_program_len, 2048);
        assert_eq!(cfg.limits.max_loop_depth, 8);
        assert_eq!(cfg.eof_byte, 0);
        assert_eq!(cfg.max_steps, Some(1000));
    }

    #[test]
    fn zero_tape_is_rejected() {
        let err = Config::from_toml_str("[limits]\ntape_cells = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { line: 2, .. }));
    }

    #[test]
    fn unknown_key_and_section_are_errors() {
        assert!(matches!(
            Config::from_toml_str("[colors]\n"),
            Err(ConfigError::UnknownSection { line: 1, .. })
        ));
        assert!(matches!(
            Config::from_toml_str("[limits]\ntape = 3\n"),
            Err(ConfigError::UnknownKey { line: 2, .. })
        ));
        assert!(matches!(
            Config::from_toml_str("[runtime]\neof\n"),
            Err(ConfigError::MissingEquals { line: 2 })
        ));
    }

    #[test]
    fn eof_must_fit_in_a_byte() {
        assert!(Config::from_toml_str("[runtime]\neof = 256\n").is_err());
    }

    #[test]
    fn env_overrides_and_skips_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BF_TAPE_CELLS", "16"),
            ("BF_MAX_LOOP_DEPTH", "not-a-number"),
            ("BF_EOF", "0"),
        ]);
        let mut cfg = Config::default();
        cfg.apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.limits.tape_cells.get(), 16);
        assert_eq!(cfg.limits.max_loop_depth, DEFAULT_MAX_LOOP_DEPTH);
        assert_eq!(cfg.eof_byte, 0);
    }
}
