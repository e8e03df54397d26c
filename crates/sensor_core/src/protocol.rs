//! Protocolo binário do sensor ambiental.
//!
//! Formato do frame:
//!
//! ```text
//! ┌──────────┬──────────────┬───────────────────────────────┬────────────┐
//! │ Magic(3) │ Len(2) LE    │ TLV: tag(1) len(2) valor(N)…  │ Terminador │
//! └──────────┴──────────────┴───────────────────────────────┴────────────┘
//! ```
//!
//! - Magic `434734` (variante A) ou `434731` (variante B)
//! - Comprimento declarado é só indicativo; o buffer real prevalece
//! - Bytes depois do payload declarado são ignorados
//!
//! [`decode_frame`] nunca entra em pânico: falhas fatais viram
//! [`FrameError`], as demais viram [`Diagnostic`] no registro.

use crate::assembler;
use crate::fields::{self, CompositeReading, DecodedField, Quantity};
use crate::header::{self, FrameVariant, HEADER_SIZE};
use crate::tlv::{self, TlvEntry};
use crate::types::{DecodedRecord, SensorReading};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Erros fatais: nenhum registro é produzido.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Frame muito curto ({0} bytes, mínimo {HEADER_SIZE})")]
    TooShort(usize),

    #[error("Magic não reconhecido: {} (frame: {raw_hex})", hex::encode(.magic))]
    UnrecognizedMagic { magic: [u8; 3], raw_hex: String },
}

/// Problemas não fatais anexados a um registro parcial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error(
        "Valor truncado na tag 0x{tag:02x} (offset {offset}): declara {length} bytes, restam {available}"
    )]
    TruncatedValue {
        tag: u8,
        offset: usize,
        length: u16,
        available: usize,
    },

    #[error("Tag esperada 0x{tag:02x} ausente")]
    MissingExpectedTag { tag: u8 },

    #[error("Valor da tag 0x{tag:02x} curto ({length} bytes): {field} e seguintes ausentes")]
    ShortCompositeValue {
        tag: u8,
        length: usize,
        field: DecodedField,
    },
}

/// Erros do encoder.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("Valor da tag 0x{tag:02x} longo demais: {len} bytes (máximo {})", u16::MAX)]
    ValueTooLong { tag: u8, len: usize },

    #[error("Payload longo demais: {len} bytes (máximo {})", u16::MAX)]
    PayloadTooLong { len: usize },

    #[error("{quantity} fora da faixa codificável: {value}")]
    OutOfRange { quantity: Quantity, value: f64 },

    #[error("Variante sem magic não pode ser codificada")]
    UnrecognizedVariant,
}

/// Decodifica um frame recebido em um [`DecodedRecord`].
///
/// Falha apenas com [`FrameError::TooShort`] ou
/// [`FrameError::UnrecognizedMagic`]; qualquer outro problema produz um
/// registro parcial com diagnósticos.
pub fn decode_frame(buffer: &[u8]) -> Result<DecodedRecord, FrameError> {
    let envelope = header::classify(buffer)?;
    debug!(
        "Frame {}: payload declarado {} bytes, recebidos {}",
        envelope.variant,
        envelope.declared_payload_length,
        buffer.len()
    );

    let (entries, truncation) = tlv::scan(buffer, &envelope);
    debug!("{} entradas TLV", entries.len());

    let fields = fields::decode(envelope.variant, &entries);
    Ok(assembler::assemble(buffer, &envelope, &entries, truncation, fields))
}

/// Codifica entradas TLV em um frame completo.
///
/// O comprimento declarado é o tamanho do corpo TLV.
pub fn encode_frame(variant: FrameVariant, entries: &[TlvEntry<'_>]) -> Result<Vec<u8>, EncodeError> {
    let magic = variant.magic().ok_or(EncodeError::UnrecognizedVariant)?;

    let mut body = Vec::new();
    for entry in entries {
        let len = u16::try_from(entry.value.len()).map_err(|_| EncodeError::ValueTooLong {
            tag: entry.tag,
            len: entry.value.len(),
        })?;
        body.push(entry.tag);
        body.extend_from_slice(&len.to_le_bytes());
        body.extend_from_slice(entry.value);
    }
    let declared =
        u16::try_from(body.len()).map_err(|_| EncodeError::PayloadTooLong { len: body.len() })?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + body.len());
    frame.extend_from_slice(&magic);
    frame.extend_from_slice(&declared.to_le_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Monta o valor da tag composta de uma leitura, no layout da variante.
pub fn encode_composite(variant: FrameVariant, reading: &SensorReading) -> Result<Vec<u8>, EncodeError> {
    let composite = CompositeReading::from_physical(reading.temperature, reading.humidity)
        .map_err(|(quantity, value)| EncodeError::OutOfRange { quantity, value })?;

    let pressure_code = (reading.pressure * 100.0).round();
    if !(0.0..=u16::MAX as f64).contains(&pressure_code) {
        return Err(EncodeError::OutOfRange {
            quantity: Quantity::Pressure,
            value: reading.pressure,
        });
    }

    let mut value = Vec::with_capacity(12);
    for &field in fields::layout(variant) {
        match field {
            DecodedField::Timestamp => value.extend_from_slice(&reading.timestamp.to_le_bytes()),
            DecodedField::Interval => value.extend_from_slice(&reading.interval.to_le_bytes()),
            DecodedField::Composite => value.extend_from_slice(&composite.packed().to_le_bytes()[..3]),
            DecodedField::Pressure => value.extend_from_slice(&(pressure_code as u16).to_le_bytes()),
            DecodedField::Battery => value.push(reading.battery),
            DecodedField::Rssi => value.extend_from_slice(&reading.rssi.to_le_bytes()),
        }
    }
    Ok(value)
}

/// Codifica uma leitura como frame completo da variante.
pub fn encode_reading(variant: FrameVariant, reading: &SensorReading) -> Result<Vec<u8>, EncodeError> {
    let tag = variant.composite_tag().ok_or(EncodeError::UnrecognizedVariant)?;
    let value = encode_composite(variant, reading)?;
    encode_frame(variant, &[TlvEntry { tag, value: &value }])
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reading() -> SensorReading {
        SensorReading {
            timestamp: 1_700_000_000,
            interval: 900,
            temperature: 25.5,
            humidity: 45.0,
            pressure: 101.32,
            battery: 85,
            rssi: -75,
        }
    }

    fn entry(tag: u8, value: &[u8]) -> TlvEntry<'_> {
        TlvEntry { tag, value }
    }

    #[test]
    fn variant_a_roundtrip_on_populated_fields() {
        let reading = sample_reading();
        let frame = encode_reading(FrameVariant::A, &reading).unwrap();
        let record = decode_frame(&frame).unwrap();

        assert_eq!(record.variant, FrameVariant::A);
        assert_eq!(record.timestamp, Some(reading.timestamp));
        assert_eq!(record.temperature, Some(reading.temperature));
        assert_eq!(record.humidity, Some(reading.humidity));
        assert_eq!(record.pressure, Some(reading.pressure));
        assert_eq!(record.battery, Some(reading.battery));
        assert_eq!(record.rssi, Some(reading.rssi));
        // Intervalo não existe na variante A.
        assert_eq!(record.interval, None);
        assert!(record.diagnostics.is_empty());
    }

    #[test]
    fn variant_b_roundtrip_on_populated_fields() {
        let reading = sample_reading();
        let frame = encode_reading(FrameVariant::B, &reading).unwrap();
        let record = decode_frame(&frame).unwrap();

        assert_eq!(record.variant, FrameVariant::B);
        assert_eq!(record.timestamp, Some(reading.timestamp));
        assert_eq!(record.interval, Some(reading.interval));
        assert_eq!(record.temperature, Some(reading.temperature));
        assert_eq!(record.humidity, Some(reading.humidity));
        assert_eq!(record.pressure, Some(reading.pressure));
        assert_eq!(record.battery, Some(reading.battery));
        assert_eq!(record.rssi, None);
        assert!(record.diagnostics.is_empty());
    }

    #[test]
    fn roundtrip_over_reading_grid() {
        let temperatures = [-50.0, -10.3, 0.0, 25.5, 105.0, 359.5];
        let humidities = [0.0, 0.1, 45.0, 99.9, 409.5];
        let pressures = [0.0, 101.32, 655.35];
        let edges = [(0u8, i8::MIN, 0u16), (100, -75, 900), (255, i8::MAX, u16::MAX)];

        for variant in [FrameVariant::A, FrameVariant::B] {
            for &temperature in &temperatures {
                for &humidity in &humidities {
                    for &pressure in &pressures {
                        for &(battery, rssi, interval) in &edges {
                            let reading = SensorReading {
                                timestamp: u32::MAX - battery as u32,
                                interval,
                                temperature,
                                humidity,
                                pressure,
                                battery,
                                rssi,
                            };
                            let frame = encode_reading(variant, &reading).unwrap();
                            let record = decode_frame(&frame).unwrap();
                            let ctx = format!("{variant} {reading:?}");

                            assert_eq!(record.variant, variant, "{ctx}");
                            assert_eq!(record.timestamp, Some(reading.timestamp), "{ctx}");
                            assert_eq!(record.temperature, Some(temperature), "{ctx}");
                            assert_eq!(record.humidity, Some(humidity), "{ctx}");
                            assert_eq!(record.pressure, Some(pressure), "{ctx}");
                            assert_eq!(record.battery, Some(battery), "{ctx}");
                            match variant {
                                FrameVariant::A => {
                                    assert_eq!(record.rssi, Some(rssi), "{ctx}");
                                    assert_eq!(record.interval, None, "{ctx}");
                                }
                                _ => {
                                    assert_eq!(record.interval, Some(interval), "{ctx}");
                                    assert_eq!(record.rssi, None, "{ctx}");
                                }
                            }
                            assert!(record.diagnostics.is_empty(), "{ctx}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn header_is_correct() {
        let frame = encode_frame(FrameVariant::A, &[entry(0x01, &[1, 2])]).unwrap();
        assert_eq!(&frame[..3], &header::MAGIC_VARIANT_A);
        assert_eq!(u16::from_le_bytes([frame[3], frame[4]]), 5);
        assert_eq!(frame.len(), HEADER_SIZE + 5);
    }

    #[test]
    fn concrete_scenario_25_5_degrees_45_percent() {
        // Tag 0x14: timestamp + código 755/450 + pressão + bateria + rssi.
        let frame = hex::decode("434734 0e00 14 0b00 00f15365 c2312f 9427 55 b5".replace(' ', "")).unwrap();
        let record = decode_frame(&frame).unwrap();
        assert_eq!(record.temperature, Some(25.5));
        assert_eq!(record.humidity, Some(45.0));
        assert_eq!(record.timestamp, Some(0x6553_f100));
        assert_eq!(record.raw_hex, hex::encode(&frame));
    }

    #[test]
    fn rejects_short_frames() {
        for len in 0..HEADER_SIZE {
            let buf = vec![0x43; len];
            assert_eq!(decode_frame(&buf), Err(FrameError::TooShort(len)));
        }
    }

    #[test]
    fn rejects_invalid_magic() {
        let mut frame = encode_reading(FrameVariant::A, &sample_reading()).unwrap();
        frame[2] = 0x35;
        assert!(matches!(
            decode_frame(&frame),
            Err(FrameError::UnrecognizedMagic { magic: [0x43, 0x47, 0x35], .. })
        ));
    }

    #[test]
    fn oversized_tag_length_is_truncated_and_omitted() {
        let mut frame =
            encode_frame(FrameVariant::A, &[entry(0x01, &[0xAA]), entry(0x02, &[0xBB; 4])]).unwrap();
        // Tag 0x02 passa a declarar 200 bytes.
        let len_pos = HEADER_SIZE + 4 + 1;
        frame[len_pos..len_pos + 2].copy_from_slice(&200u16.to_le_bytes());

        let record = decode_frame(&frame).unwrap();
        assert_eq!(record.raw_tags.get(&0x01).map(String::as_str), Some("aa"));
        assert!(!record.raw_tags.contains_key(&0x02));
        assert!(matches!(
            record.diagnostics[0],
            Diagnostic::TruncatedValue { tag: 0x02, length: 200, .. }
        ));
        assert!(record.is_partial());
    }

    #[test]
    fn truncating_anywhere_never_panics() {
        let reading = sample_reading();
        let value_b = encode_composite(FrameVariant::B, &reading).unwrap();
        let full = encode_frame(
            FrameVariant::B,
            &[entry(0x01, &[1, 2, 3]), entry(0x03, &value_b), entry(0x0A, &[0x55])],
        )
        .unwrap();
        // Fim de cada entrada no buffer completo.
        let ends = [(0x01u8, 11usize), (0x03, 11 + 3 + value_b.len()), (0x0A, full.len())];

        for k in HEADER_SIZE..full.len() {
            let record = decode_frame(&full[..k]).unwrap();
            for (tag, end) in ends {
                assert_eq!(record.raw_tags.contains_key(&tag), end <= k, "k={k} tag={tag:#x}");
            }
            let truncated = record
                .diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::TruncatedValue { .. }));
            let starts = [HEADER_SIZE, 11, 11 + 3 + value_b.len()];
            let cut_inside_value = starts
                .iter()
                .zip(ends.iter())
                .any(|(&s, &(_, e))| k >= s + 3 && k < e);
            assert_eq!(truncated, cut_inside_value, "k={k}");
        }
    }

    #[test]
    fn missing_composite_tag_gives_partial_record() {
        let frame = encode_frame(FrameVariant::B, &[entry(0x01, &[0xAA])]).unwrap();
        let record = decode_frame(&frame).unwrap();
        assert_eq!(record.temperature, None);
        assert_eq!(record.humidity, None);
        assert_eq!(record.diagnostics, vec![Diagnostic::MissingExpectedTag { tag: 0x03 }]);
        assert_eq!(record.raw_tags.len(), 1);
    }

    #[test]
    fn duplicate_tag_keeps_last_occurrence() {
        let frame = encode_frame(
            FrameVariant::A,
            &[entry(0x05, &[0x01]), entry(0x06, &[0x02]), entry(0x05, &[0x03])],
        )
        .unwrap();
        let record = decode_frame(&frame).unwrap();
        assert_eq!(record.raw_tags.get(&0x05).map(String::as_str), Some("03"));
        assert_eq!(record.raw_tags.len(), 2);
    }

    #[test]
    fn concurrent_decodes_are_equal() {
        let frame = encode_reading(FrameVariant::A, &sample_reading()).unwrap();
        let (a, b) = std::thread::scope(|s| {
            let ha = s.spawn(|| decode_frame(&frame));
            let hb = s.spawn(|| decode_frame(&frame));
            (ha.join().unwrap(), hb.join().unwrap())
        });
        assert_eq!(a, b);
        assert!(a.is_ok());
    }

    #[test]
    fn encoder_rejects_out_of_range_readings() {
        let reading = SensorReading {
            pressure: 1013.25,
            ..sample_reading()
        };
        assert_eq!(
            encode_reading(FrameVariant::A, &reading),
            Err(EncodeError::OutOfRange {
                quantity: Quantity::Pressure,
                value: 1013.25
            })
        );
        assert_eq!(
            encode_reading(FrameVariant::Unrecognized, &sample_reading()),
            Err(EncodeError::UnrecognizedVariant)
        );
    }

    #[test]
    fn encoder_rejects_oversized_value() {
        let big = vec![0u8; u16::MAX as usize + 1];
        assert_eq!(
            encode_frame(FrameVariant::A, &[entry(0x01, &big)]),
            Err(EncodeError::ValueTooLong {
                tag: 0x01,
                len: u16::MAX as usize + 1
            })
        );
    }

    #[test]
    fn encoder_rejects_oversized_payload() {
        let half = vec![0u8; 40_000];
        let err = encode_frame(FrameVariant::B, &[entry(0x01, &half), entry(0x02, &half)])
            .unwrap_err();
        assert_eq!(err, EncodeError::PayloadTooLong { len: 2 * (3 + 40_000) });
        assert!(err.to_string().contains("80006 bytes"), "{err}");
    }

    #[test]
    fn out_of_range_error_names_the_quantity() {
        let reading = SensorReading {
            humidity: 500.0,
            ..sample_reading()
        };
        let err = encode_reading(FrameVariant::B, &reading).unwrap_err();
        assert_eq!(
            err,
            EncodeError::OutOfRange {
                quantity: Quantity::Humidity,
                value: 500.0
            }
        );
        assert_eq!(err.to_string(), "humidity fora da faixa codificável: 500");
    }
}
