use anyhow::Context;
use serde::Deserialize;
use std::{env, fs};

#[derive(Debug, Clone)]
pub struct Config {
    pub animation: AnimationConfig,
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            animation: AnimationConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Looks for a `config.toml` next to the executable or in the working
    /// directory. A missing file yields the defaults; a broken one is an error.
    pub fn load() -> anyhow::Result<Self> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = env::current_dir() {
            candidates.push(current_dir.join("config.toml"));
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join("config.toml"));
            }
        }

        for path in candidates {
            if path.exists() {
                let data = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                return Self::from_str(&data)
                    .with_context(|| format!("Failed to parse config: {}", path.display()));
            }
        }

        Ok(Config::default())
    }

    pub fn from_str(data: &str) -> anyhow::Result<Self> {
        let doc: ConfigDocument = toml::from_str(data)?;
        Ok(doc.into())
    }
}

#[derive(Debug, Clone)]
pub struct AnimationConfig {
    /// Inclusive lower bound of the starting speed, in pixels per tick.
    pub min_speed: i32,
    /// Exclusive upper bound of the starting speed.
    pub max_speed: i32,
    pub tick_interval_ms: u64,
    /// The sprite's side length is the drawable width divided by this.
    pub art_size_divisor: i32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            min_speed: 1,
            max_speed: 3,
            tick_interval_ms: 10,
            art_size_divisor: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub background: [u8; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            background: [18, 18, 18],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    animation: AnimationSection,
    #[serde(default)]
    display: DisplaySection,
}

impl From<ConfigDocument> for Config {
    fn from(value: ConfigDocument) -> Self {
        let defaults = AnimationConfig::default();
        let min_speed = value
            .animation
            .min_speed
            .unwrap_or(defaults.min_speed)
            .max(0);
        let max_speed = value
            .animation
            .max_speed
            .unwrap_or(defaults.max_speed)
            .max(min_speed);
        let animation = AnimationConfig {
            min_speed,
            max_speed,
            tick_interval_ms: value
                .animation
                .tick_interval_ms
                .unwrap_or(defaults.tick_interval_ms)
                .max(1),
            art_size_divisor: value
                .animation
                .art_size_divisor
                .unwrap_or(defaults.art_size_divisor)
                .max(1),
        };

        let display = DisplayConfig {
            background: value
                .display
                .background
                .unwrap_or(DisplayConfig::default().background),
        };

        Config { animation, display }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AnimationSection {
    min_speed: Option<i32>,
    max_speed: Option<i32>,
    tick_interval_ms: Option<u64>,
    art_size_divisor: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct DisplaySection {
    background: Option<[u8; 3]>,
}
