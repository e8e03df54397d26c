//! # Sensor Core
//!
//! Crate compartilhada com o decoder do frame binário do sensor ambiental
//! (temperatura, umidade, pressão, bateria, RSSI), o encoder usado pelo
//! simulador e pelos testes, a configuração TOML e o histórico limitado.
//!
//! ## Módulos
//! - [`cursor`] – Leitor de bytes com verificação de limites
//! - [`header`] – Magic, variante e comprimento declarado
//! - [`tlv`] – Scanner das entradas tag-length-value
//! - [`fields`] – Campo composto temperatura/umidade e layouts por variante
//! - [`assembler`] – Montagem do registro final
//! - [`protocol`] – Erros, `decode_frame` e encoder
//! - [`types`] – Registro decodificado, leitura e registro armazenado
//! - [`config`] – Configuração unificada via TOML
//! - [`history`] – Buffer circular de registros recentes

pub mod assembler;
pub mod config;
pub mod cursor;
pub mod fields;
pub mod header;
pub mod history;
pub mod protocol;
pub mod tlv;
pub mod types;

// Re-exports convenientes
pub use config::{AppConfig, ReceiverConfig, SenderConfig};
pub use header::FrameVariant;
pub use history::RecordHistory;
pub use protocol::{decode_frame, encode_reading, Diagnostic, FrameError};
pub use types::{DecodedRecord, SensorReading, StoredRecord};
