//! Tipos de dados produzidos e consumidos pelo decoder.

use crate::header::FrameVariant;
use crate::protocol::Diagnostic;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Registro decodificado
// ──────────────────────────────────────────────

/// Resultado da decodificação de um frame. Imutável depois de montado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedRecord {
    /// Layout do frame (magic)
    pub variant: FrameVariant,
    /// Epoch em segundos informado pelo sensor
    pub timestamp: Option<u32>,
    /// Intervalo de armazenamento (s), só na variante B
    pub interval: Option<u16>,
    /// Temperatura (°C)
    pub temperature: Option<f64>,
    /// Umidade relativa (%)
    pub humidity: Option<f64>,
    /// Pressão (código / 100)
    pub pressure: Option<f64>,
    /// Bateria (%)
    pub battery: Option<u8>,
    /// Intensidade de sinal (dBm), só na variante A
    pub rssi: Option<i8>,
    /// Hex dos bytes de sensor da tag composta
    pub sensor_hex: Option<String>,
    /// Frame completo em hex
    pub raw_hex: String,
    /// Tag → valor bruto em hex, na ordem do buffer (última ocorrência vence)
    #[serde(with = "tag_keys")]
    pub raw_tags: IndexMap<u8, String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DecodedRecord {
    /// `true` se algum problema não fatal foi encontrado.
    pub fn is_partial(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Mensagem legível com todos os diagnósticos.
    pub fn error_message(&self) -> Option<String> {
        if self.diagnostics.is_empty() {
            return None;
        }
        Some(
            self.diagnostics
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Chaves de `raw_tags` serializadas como `"0x14"`.
mod tag_keys {
    use indexmap::IndexMap;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(map: &IndexMap<u8, String>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_map(map.iter().map(|(tag, value)| (format!("0x{tag:02x}"), value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<IndexMap<u8, String>, D::Error> {
        IndexMap::<String, String>::deserialize(d)?
            .into_iter()
            .map(|(key, value)| {
                let digits = key.strip_prefix("0x").unwrap_or(key.as_str());
                u8::from_str_radix(digits, 16)
                    .map(|tag| (tag, value))
                    .map_err(|_| D::Error::custom(format!("tag inválida: {key}")))
            })
            .collect()
    }
}

// ──────────────────────────────────────────────
// Leitura para o encoder
// ──────────────────────────────────────────────

/// Leitura completa em unidades físicas, entrada do encoder.
///
/// Campos ausentes no layout da variante são ignorados.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: u32,
    pub interval: u16,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub battery: u8,
    pub rssi: i8,
}

// ──────────────────────────────────────────────
// Registro armazenado
// ──────────────────────────────────────────────

/// Registro com metadados de chegada, anexados por quem recebe o frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Epoch (s) de chegada no receiver
    pub received_at: u64,
    /// Rótulo do tópico/canal de origem
    pub topic: String,
    pub record: DecodedRecord,
}
