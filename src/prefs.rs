use crate::resolution::RenderResolution;
use std::fmt;
use std::path::{Path, PathBuf};

/// User selections that survive restarts. CLI flags override these at startup;
/// the running app writes them back on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppPrefs {
    pub resolution: Option<RenderResolution>,
    pub preset_duration_secs: Option<u32>,
    pub transition_duration_secs: Option<u32>,
    pub adaptive: bool,
    pub auto_switch: bool,
}

impl Default for AppPrefs {
    fn default() -> Self {
        Self {
            resolution: None,
            preset_duration_secs: None,
            transition_duration_secs: None,
            adaptive: true,
            auto_switch: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefsError {
    Io(String),
    Parse { line: usize, message: String },
}

impl fmt::Display for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
        }
    }
}

impl std::error::Error for PrefsError {}

impl AppPrefs {
    pub fn load(path: Option<&Path>) -> Result<Self, PrefsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(PrefsError::Io(err.to_string())),
        };

        let mut prefs = Self::default();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key_raw, value_raw)) = line.split_once('=') else {
                return Err(PrefsError::Parse {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            let key = key_raw.trim();
            let value = value_raw.trim();
            match key {
                "resolution" => {
                    prefs.resolution =
                        Some(parse_resolution(value).ok_or_else(|| PrefsError::Parse {
                            line: line_no,
                            message: "resolution must be <width>x<height>".to_string(),
                        })?);
                }
                "preset_duration_secs" => {
                    prefs.preset_duration_secs =
                        Some(value.parse().map_err(|_| PrefsError::Parse {
                            line: line_no,
                            message: "preset_duration_secs must be an integer".to_string(),
                        })?);
                }
                "transition_duration_secs" => {
                    prefs.transition_duration_secs =
                        Some(value.parse().map_err(|_| PrefsError::Parse {
                            line: line_no,
                            message: "transition_duration_secs must be an integer".to_string(),
                        })?);
                }
                "adaptive" => {
                    prefs.adaptive = parse_bool(value).ok_or_else(|| PrefsError::Parse {
                        line: line_no,
                        message: "adaptive must be true/false".to_string(),
                    })?;
                }
                "auto_switch" => {
                    prefs.auto_switch = parse_bool(value).ok_or_else(|| PrefsError::Parse {
                        line: line_no,
                        message: "auto_switch must be true/false".to_string(),
                    })?;
                }
                _ => {}
            }
        }
        Ok(prefs)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<(), PrefsError> {
        let Some(path) = path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PrefsError::Io(e.to_string()))?;
        }
        let mut body = String::from("# vizhost runtime prefs v1\n");
        if let Some(res) = self.resolution {
            body.push_str(&format!("resolution={}x{}\n", res.width, res.height));
        }
        if let Some(secs) = self.preset_duration_secs {
            body.push_str(&format!("preset_duration_secs={secs}\n"));
        }
        if let Some(secs) = self.transition_duration_secs {
            body.push_str(&format!("transition_duration_secs={secs}\n"));
        }
        body.push_str(&format!(
            "adaptive={}\nauto_switch={}\n",
            self.adaptive, self.auto_switch
        ));
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &body).map_err(|e| PrefsError::Io(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| PrefsError::Io(e.to_string()))
    }
}

pub fn prefs_storage_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Some(PathBuf::from(xdg).join("vizhost").join("prefs.txt"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".config").join("vizhost").join("prefs.txt"))
}

fn parse_resolution(raw: &str) -> Option<RenderResolution> {
    let (w, h) = raw.split_once(['x', 'X'])?;
    let res = RenderResolution::new(w.trim().parse().ok()?, h.trim().parse().ok()?);
    res.is_valid().then_some(res)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
