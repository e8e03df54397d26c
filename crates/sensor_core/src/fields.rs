//! Interpretação dos valores TLV em grandezas físicas.
//!
//! Cada variante lê o bloco de leitura atual de uma tag diferente e com
//! layout próprio. Os layouts nunca se misturam:
//!
//! | Variante | Tag    | Layout                                                  |
//! |----------|--------|---------------------------------------------------------|
//! | A        | `0x14` | timestamp(4) temp+umid(3) pressão(2) bateria(1) rssi(1) |
//! | B        | `0x03` | timestamp(4) intervalo(2) temp+umid(3) pressão(2) bateria(1) |
//!
//! Valores curtos deixam os campos seguintes ausentes, sem invalidar o
//! registro.

use crate::cursor::{ByteCursor, CursorError};
use crate::header::FrameVariant;
use crate::protocol::Diagnostic;
use crate::tlv::TlvEntry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Offset aplicado ao código bruto de temperatura (décimos de °C).
pub const TEMPERATURE_OFFSET: i32 = 500;

/// Maior código representável em 12 bits.
pub const MAX_RAW_CODE: u16 = 0x0FFF;

// ──────────────────────────────────────────────
// Leitura composta (temperatura + umidade)
// ──────────────────────────────────────────────

/// Campo de 24 bits: 12 bits altos de temperatura, 12 bits baixos de umidade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeReading {
    pub temp_raw: u16,
    pub humi_raw: u16,
}

impl CompositeReading {
    /// Separa o valor de 24 bits já montado em little-endian.
    pub fn from_packed(v: u32) -> Self {
        Self {
            temp_raw: ((v >> 12) & 0x0FFF) as u16,
            humi_raw: (v & 0x0FFF) as u16,
        }
    }

    pub fn packed(self) -> u32 {
        ((self.temp_raw as u32 & 0x0FFF) << 12) | (self.humi_raw as u32 & 0x0FFF)
    }

    /// Temperatura em °C: `(raw - 500) / 10`.
    pub fn temperature(self) -> f64 {
        (self.temp_raw as i32 - TEMPERATURE_OFFSET) as f64 / 10.0
    }

    /// Umidade relativa em %: `raw / 10`. Não é limitada a 100.
    pub fn humidity(self) -> f64 {
        self.humi_raw as f64 / 10.0
    }

    /// Converte valores físicos para códigos de 12 bits.
    ///
    /// Retorna a grandeza fora da faixa representável em caso de erro.
    pub fn from_physical(temperature: f64, humidity: f64) -> Result<Self, (Quantity, f64)> {
        let temp_code = (temperature * 10.0).round() + TEMPERATURE_OFFSET as f64;
        if !(0.0..=MAX_RAW_CODE as f64).contains(&temp_code) {
            return Err((Quantity::Temperature, temperature));
        }
        let humi_code = (humidity * 10.0).round();
        if !(0.0..=MAX_RAW_CODE as f64).contains(&humi_code) {
            return Err((Quantity::Humidity, humidity));
        }
        Ok(Self {
            temp_raw: temp_code as u16,
            humi_raw: humi_code as u16,
        })
    }
}

// ──────────────────────────────────────────────
// Layouts
// ──────────────────────────────────────────────

/// Subcampos do bloco de leitura.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodedField {
    Timestamp,
    Interval,
    /// Temperatura + umidade empacotadas.
    Composite,
    Pressure,
    Battery,
    Rssi,
}

impl std::fmt::Display for DecodedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DecodedField::Timestamp => "timestamp",
            DecodedField::Interval => "interval",
            DecodedField::Composite => "temperature+humidity",
            DecodedField::Pressure => "pressure",
            DecodedField::Battery => "battery",
            DecodedField::Rssi => "rssi",
        };
        f.write_str(name)
    }
}

/// Grandeza física aceita pelo encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Temperature,
    Humidity,
    Pressure,
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Quantity::Temperature => "temperature",
            Quantity::Humidity => "humidity",
            Quantity::Pressure => "pressure",
        };
        f.write_str(name)
    }
}

const LAYOUT_A: &[DecodedField] = &[
    DecodedField::Timestamp,
    DecodedField::Composite,
    DecodedField::Pressure,
    DecodedField::Battery,
    DecodedField::Rssi,
];

const LAYOUT_B: &[DecodedField] = &[
    DecodedField::Timestamp,
    DecodedField::Interval,
    DecodedField::Composite,
    DecodedField::Pressure,
    DecodedField::Battery,
];

/// Sequência de subcampos da tag composta de cada variante.
pub fn layout(variant: FrameVariant) -> &'static [DecodedField] {
    match variant {
        FrameVariant::A => LAYOUT_A,
        FrameVariant::B => LAYOUT_B,
        FrameVariant::Unrecognized => &[],
    }
}

// ──────────────────────────────────────────────
// Decoder
// ──────────────────────────────────────────────

/// Campos escalares extraídos da tag composta.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFields {
    pub timestamp: Option<u32>,
    pub interval: Option<u16>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub battery: Option<u8>,
    pub rssi: Option<i8>,
    /// Hex dos bytes de sensor (depois de timestamp/intervalo).
    pub sensor_hex: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decodifica os campos da variante a partir das entradas TLV.
///
/// Com tags repetidas vale a última ocorrência.
pub fn decode(variant: FrameVariant, entries: &[TlvEntry<'_>]) -> DecodedFields {
    let mut out = DecodedFields::default();

    let Some(tag) = variant.composite_tag() else {
        return out;
    };

    let Some(entry) = entries.iter().rev().find(|e| e.tag == tag) else {
        debug!("Tag 0x{tag:02x} ausente no frame {variant}");
        out.diagnostics.push(Diagnostic::MissingExpectedTag { tag });
        return out;
    };

    let mut cursor = ByteCursor::new(entry.value);
    for &field in layout(variant) {
        if field == DecodedField::Composite && cursor.remaining() > 0 {
            out.sensor_hex = Some(hex::encode(cursor.rest()));
        }
        if read_field(&mut cursor, field, &mut out).is_err() {
            debug!(
                "Tag 0x{tag:02x} curta ({} bytes), {field} e seguintes ausentes",
                entry.value.len()
            );
            out.diagnostics.push(Diagnostic::ShortCompositeValue {
                tag,
                length: entry.value.len(),
                field,
            });
            break;
        }
    }

    out
}

fn read_field(
    cursor: &mut ByteCursor<'_>,
    field: DecodedField,
    out: &mut DecodedFields,
) -> Result<(), CursorError> {
    match field {
        DecodedField::Timestamp => {
            let ts = cursor.read_u32_le()?;
            debug!("Timestamp: {ts}");
            out.timestamp = Some(ts);
        }
        DecodedField::Interval => {
            let interval = cursor.read_u16_le()?;
            debug!("Intervalo de armazenamento: {interval}s");
            out.interval = Some(interval);
        }
        DecodedField::Composite => {
            let reading = CompositeReading::from_packed(cursor.read_u24_le()?);
            out.temperature = Some(reading.temperature());
            out.humidity = Some(reading.humidity());
            debug!(
                "Temperatura={:.1}°C, Umidade={:.1}%",
                reading.temperature(),
                reading.humidity()
            );
        }
        DecodedField::Pressure => {
            let pressure = cursor.read_u16_le()? as f64 / 100.0;
            debug!("Pressão={pressure:.2}");
            out.pressure = Some(pressure);
        }
        DecodedField::Battery => {
            let battery = cursor.read_u8()?;
            debug!("Bateria={battery}%");
            out.battery = Some(battery);
        }
        DecodedField::Rssi => {
            let rssi = cursor.read_i8()?;
            debug!("RSSI={rssi} dBm");
            out.rssi = Some(rssi);
        }
    }
    Ok(())
}
