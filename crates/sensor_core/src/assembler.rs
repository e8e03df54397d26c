//! Montagem do [`DecodedRecord`] final.
//!
//! Junta o envelope, o diagnóstico do scanner e os campos decodificados.
//! O hex do frame inteiro vai sempre no registro, mesmo quando quase nada
//! foi decodificado.

use crate::fields::DecodedFields;
use crate::header::Envelope;
use crate::protocol::Diagnostic;
use crate::tlv::TlvEntry;
use crate::types::DecodedRecord;
use indexmap::IndexMap;

/// Mapa tag → hex na ordem do buffer.
///
/// Tags repetidas ficam na posição da primeira ocorrência com o valor da
/// última.
pub fn raw_tag_map(entries: &[TlvEntry<'_>]) -> IndexMap<u8, String> {
    entries
        .iter()
        .map(|e| (e.tag, hex::encode(e.value)))
        .collect()
}

/// Monta o registro sem alterar as entradas.
pub fn assemble(
    frame: &[u8],
    envelope: &Envelope,
    entries: &[TlvEntry<'_>],
    truncation: Option<Diagnostic>,
    fields: DecodedFields,
) -> DecodedRecord {
    let mut diagnostics: Vec<Diagnostic> = truncation.into_iter().collect();
    diagnostics.extend(fields.diagnostics);

    DecodedRecord {
        variant: envelope.variant,
        timestamp: fields.timestamp,
        interval: fields.interval,
        temperature: fields.temperature,
        humidity: fields.humidity,
        pressure: fields.pressure,
        battery: fields.battery,
        rssi: fields.rssi,
        sensor_hex: fields.sensor_hex,
        raw_hex: hex::encode(frame),
        raw_tags: raw_tag_map(entries),
        diagnostics,
    }
}
