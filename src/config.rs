use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "yatube", about = "A small social blogging site")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory (database and uploaded media)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    pub cache: CacheConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

/// Where uploaded post images and avatars are written.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub media_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    pub login_url: String,
    pub bcrypt_cost: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PaginationConfig {
    pub posts_per_page: u32,
    pub listing_per_page: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub index_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "yatube_session".to_string(),
            session_hours: 336,
            login_url: "/auth/login/".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            posts_per_page: 10,
            listing_per_page: 20,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { index_ttl_secs: 300 }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli)?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        config.resolve_paths(&data_dir);
        config.validate()?;

        Ok(config)
    }

    /// Fill in database and media locations that were left unset.
    pub fn resolve_paths(&mut self, data_dir: &std::path::Path) {
        if self.database.path.is_none() {
            self.database.path = Some(data_dir.join("yatube.db"));
        }
        if self.storage.media_path.is_none() {
            self.storage.media_path = Some(data_dir.join("media"));
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            anyhow::bail!("auth.bcrypt_cost must be between 4 and 31");
        }
        if self.pagination.posts_per_page == 0 || self.pagination.listing_per_page == 0 {
            anyhow::bail!("pagination sizes must be greater than zero");
        }
        Ok(())
    }

    pub fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
        match cli.data_dir.clone() {
            Some(dir) => Ok(dir),
            None => dirs::home_dir()
                .map(|home| home.join(".yatube"))
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory")),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("yatube.db"))
    }

    pub fn media_path(&self) -> PathBuf {
        self.storage
            .media_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("media"))
    }
}
