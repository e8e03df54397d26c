//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável, com seções `[sender]`
//! e `[receiver]`. Campos ausentes usam o valor padrão.

use crate::header::FrameVariant;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Faixa aceita para `interval_secs`.
pub const SEND_INTERVAL_RANGE: std::ops::RangeInclusive<f64> = 0.1..=60.0;

/// Configuração do Sender (sensor simulado).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Modo de envio: "broadcast" ou "unicast"
    pub mode: String,
    /// IP de destino
    pub dest_ip: String,
    /// Porta UDP
    pub port: u16,
    /// Intervalo de envio em segundos
    pub interval_secs: f64,
    /// IP local para bind (vazio = auto)
    pub bind_ip: String,
    /// Layout dos frames gerados: "a" ou "b"
    pub variant: FrameVariant,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            mode: "unicast".into(),
            dest_ip: "127.0.0.1".into(),
            port: 5005,
            interval_secs: 1.0,
            bind_ip: String::new(),
            variant: FrameVariant::A,
        }
    }
}

impl SenderConfig {
    /// Intervalo de envio efetivo; fora da faixa (ou NaN) cai no padrão.
    pub fn effective_interval_secs(&self) -> f64 {
        if SEND_INTERVAL_RANGE.contains(&self.interval_secs) {
            self.interval_secs
        } else {
            Self::default().interval_secs
        }
    }
}

/// Configuração do Receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Porta UDP para escutar
    pub port: u16,
    /// IP do sender (vazio = aceita qualquer origem)
    pub sender_ip: String,
    /// Rótulo anexado a cada registro armazenado
    pub topic: String,
    /// Quantidade máxima de registros no histórico
    pub history_size: usize,
    /// Armazena registros com diagnósticos
    pub store_partial: bool,
    /// Emite cada registro como uma linha JSON no stdout
    pub json_output: bool,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            port: 5005,
            sender_ip: String::new(),
            topic: "qingping/up".into(),
            history_size: 50,
            store_partial: true,
            json_output: false,
        }
    }
}

/// Configuração raiz do aplicativo (unifica sender e receiver).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sender: SenderConfig,
    pub receiver: ReceiverConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sender.port == 0 {
            errors.push("Porta do sender não pode ser 0".into());
        }
        if !SEND_INTERVAL_RANGE.contains(&self.sender.interval_secs) {
            errors.push(format!(
                "Intervalo do sender inválido: {} (0.1–60.0)",
                self.sender.interval_secs
            ));
        }
        if self.sender.variant == FrameVariant::Unrecognized {
            errors.push("Variante do sender deve ser \"a\" ou \"b\"".into());
        }
        if self.receiver.port == 0 {
            errors.push("Porta do receiver não pode ser 0".into());
        }
        if self.receiver.history_size == 0 {
            errors.push("Histórico do receiver precisa de pelo menos 1 registro".into());
        }

        errors
    }
}
