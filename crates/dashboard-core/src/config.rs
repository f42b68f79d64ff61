use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub server: ServerConfig,
    pub assets: AssetsConfig,
    pub map: MapConfig,
}

impl AppConfig {
    /// Load configuration from default path (~/.config/chatbot-dashboard/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write current configuration to the default path.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chatbot-dashboard")
            .join("config.toml")
    }
}

/// Source dataset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path to the CSV file of per-day statistics.
    pub csv_path: PathBuf,
    /// Reject unknown feedback labels and regions instead of logging a warning.
    pub strict_vocabulary: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/data.csv"),
            strict_vocabulary: false,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Bearer token for the /api routes (None = no auth).
    pub auth_token: Option<String>,
    /// Enable CORS.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8050,
            auth_token: None,
            cors: true,
        }
    }
}

/// Generated static assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory served under /assets; created on startup.
    pub dir: PathBuf,
    pub wordcloud: WordCloudConfig,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            wordcloud: WordCloudConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WordCloudConfig {
    pub width: u32,
    pub height: u32,
    pub background: String,
    /// Maximum number of distinct words drawn.
    pub max_words: usize,
    pub min_font_size: f64,
    pub max_font_size: f64,
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            background: "#fefefc".into(),
            max_words: 200,
            min_font_size: 12.0,
            max_font_size: 64.0,
        }
    }
}

/// Choropleth map settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Region boundaries, fetched by the browser.
    pub geojson_url: String,
    /// GeoJSON property matched against the record's region label.
    pub feature_id_key: String,
    pub center_lat: f64,
    pub center_lon: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            geojson_url: "https://raw.githubusercontent.com/codeforamerica/click_that_hood/master/public/data/brazil-states.geojson".into(),
            feature_id_key: "properties.name".into(),
            center_lat: -30.0,
            center_lon: -58.9253,
        }
    }
}
