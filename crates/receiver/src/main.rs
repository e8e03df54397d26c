//! # Sensor Receiver
//!
//! Recebe frames do sensor ambiental via UDP, decodifica cada um em um
//! registro tipado e mantém um histórico limitado dos mais recentes.
//!
//! ## Uso
//! ```bash
//! sensor_receiver                      # Escuta na porta do config.toml
//! sensor_receiver --decode 434734...   # Decodifica um frame em hex e sai
//! ```

mod net_thread;
mod store;

use sensor_core::config::AppConfig;
use sensor_core::protocol::decode_frame;
use std::process::ExitCode;
use store::RecordStore;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().position(|a| a == "--decode") {
        return match args.get(pos + 1) {
            Some(hex_frame) => decode_once(hex_frame),
            None => {
                error!("Uso: sensor_receiver --decode <hex>");
                ExitCode::FAILURE
            }
        };
    }

    // ── Config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    if !config_path.exists() {
        let _ = config.save(&config_path);
    }
    for problem in config.validate() {
        warn!("Config: {problem}");
    }

    let recv_cfg = &config.receiver;
    let rx = match net_thread::spawn_receiver_thread(recv_cfg.port, recv_cfg.sender_ip.clone()) {
        Ok(rx) => rx,
        Err(e) => {
            error!("Falha ao criar thread de rede: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Receiver ativo – tópico '{}', histórico de {} registros",
        recv_cfg.topic, recv_cfg.history_size
    );

    let mut store = RecordStore::new(recv_cfg);
    let mut stdout = std::io::stdout().lock();
    for msg in rx.iter() {
        store.accept(msg, &mut stdout);
    }

    info!("Thread de rede encerrada");
    ExitCode::SUCCESS
}

/// Decodifica um único frame em hex e imprime o registro.
fn decode_once(hex_frame: &str) -> ExitCode {
    let cleaned: String = hex_frame.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = match hex::decode(&cleaned) {
        Ok(b) => b,
        Err(e) => {
            error!("Hex inválido: {e}");
            return ExitCode::FAILURE;
        }
    };

    match decode_frame(&bytes) {
        Ok(record) => {
            if let Some(problem) = record.error_message() {
                warn!("Registro parcial: {problem}");
            }
            match serde_json::to_string_pretty(&record) {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!("Erro ao serializar registro: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
