//! Configuration file support for SNH.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/snh/config.toml`.

use crate::audit::USUARIO_PADRAO;
use crate::notify::{estrategia_embutida, NotificationService};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub auditoria: AuditoriaConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub notificacao: NotificacaoConfig,
}

/// Audit defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditoriaConfig {
    #[serde(default = "default_usuario_padrao")]
    pub usuario_padrao: String,
}

impl Default for AuditoriaConfig {
    fn default() -> Self {
        Self {
            usuario_padrao: default_usuario_padrao(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_nivel")]
    pub nivel: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            nivel: default_nivel(),
        }
    }
}

/// One notification channel entry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CanalConfig {
    pub nome: String,
    /// Built-in strategy: "email", "push" or "log"
    pub tipo: String,
    pub destinatarios: Vec<String>,
}

/// Notification channels configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct NotificacaoConfig {
    #[serde(default)]
    pub canais: Vec<CanalConfig>,
}

// Default value functions
fn default_usuario_padrao() -> String {
    USUARIO_PADRAO.to_string()
}

fn default_nivel() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let base = match dirs::config_dir() {
            Some(dir) => dir,
            None => dirs::home_dir()
                .map(|home| home.join(".config"))
                .ok_or_else(|| Error::Config("Cannot determine config directory".into()))?,
        };
        Ok(base.join("snh").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Build a notification service from the configured channels
    pub fn notification_service(&self) -> Result<NotificationService> {
        let mut servico = NotificationService::new();
        for canal in &self.notificacao.canais {
            let estrategia = estrategia_embutida(&canal.tipo)
                .map_err(|e| Error::Config(format!("Canal '{}': {}", canal.nome, e)))?;
            servico
                .register(&canal.nome, estrategia, &canal.destinatarios)
                .map_err(|e| Error::Config(format!("Canal '{}': {}", canal.nome, e)))?;
        }
        Ok(servico)
    }
}
