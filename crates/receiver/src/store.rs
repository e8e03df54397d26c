//! Destino dos registros decodificados.
//!
//! Aplica a política de registros parciais, anexa tópico e horário de
//! chegada, mantém o histórico e opcionalmente emite JSON por linha.

use crate::net_thread::NetMessage;
use sensor_core::config::ReceiverConfig;
use sensor_core::history::RecordHistory;
use sensor_core::types::StoredRecord;
use std::io::Write;
use tracing::{debug, info, warn};

pub struct RecordStore {
    history: RecordHistory,
    topic: String,
    store_partial: bool,
    json_output: bool,
}

impl RecordStore {
    pub fn new(config: &ReceiverConfig) -> Self {
        Self {
            history: RecordHistory::new(config.history_size),
            topic: config.topic.clone(),
            store_partial: config.store_partial,
            json_output: config.json_output,
        }
    }

    pub fn history(&self) -> &RecordHistory {
        &self.history
    }

    /// Processa uma mensagem da thread de rede.
    ///
    /// Retorna `false` se o registro foi descartado pela política.
    pub fn accept(&mut self, msg: NetMessage, out: &mut impl Write) -> bool {
        let record = msg.record;

        if let Some(problem) = record.error_message() {
            if !self.store_partial {
                warn!("Registro parcial de {} descartado: {problem}", msg.source_addr);
                return false;
            }
            warn!("Registro parcial de {}: {problem}", msg.source_addr);
        }

        info!(
            "← {} bytes de {} [{}] | {} | {} | {} | bat {} | rssi {}",
            msg.raw_size,
            msg.source_addr,
            record.variant,
            fmt_opt(record.temperature, "°C"),
            fmt_opt(record.humidity, "%"),
            fmt_opt(record.pressure, ""),
            record.battery.map_or("-".into(), |b| format!("{b}%")),
            record.rssi.map_or("-".into(), |r| format!("{r} dBm")),
        );

        let stored = StoredRecord {
            received_at: msg.received_at,
            topic: self.topic.clone(),
            record,
        };

        if self.json_output {
            match serde_json::to_string(&stored) {
                Ok(line) => {
                    if let Err(e) = writeln!(out, "{line}") {
                        warn!("Erro ao escrever JSON: {e}");
                    }
                }
                Err(e) => warn!("Erro ao serializar registro: {e}"),
            }
        }

        if let Some(evicted) = self.history.push(stored) {
            debug!("Histórico cheio, descartado registro de {}", evicted.received_at);
        }
        true
    }
}

fn fmt_opt(value: Option<f64>, unit: &str) -> String {
    value.map_or("-".into(), |v| format!("{v:.1}{unit}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_core::protocol::{decode_frame, encode_frame};
    use sensor_core::tlv::TlvEntry;
    use sensor_core::{FrameVariant, SensorReading, encode_reading};

    fn message(frame: &[u8], received_at: u64) -> NetMessage {
        NetMessage {
            record: decode_frame(frame).unwrap(),
            source_addr: "127.0.0.1".into(),
            raw_size: frame.len(),
            received_at,
        }
    }

    fn complete_frame() -> Vec<u8> {
        encode_reading(
            FrameVariant::A,
            &SensorReading {
                temperature: 23.8,
                humidity: 62.5,
                pressure: 101.03,
                battery: 78,
                rssi: -75,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn partial_frame() -> Vec<u8> {
        encode_frame(FrameVariant::A, &[TlvEntry { tag: 0x01, value: &[0xAA] }]).unwrap()
    }

    #[test]
    fn stores_with_topic_and_arrival_time() {
        let mut store = RecordStore::new(&ReceiverConfig::default());
        let mut out = Vec::new();
        assert!(store.accept(message(&complete_frame(), 1234), &mut out));

        let latest = store.history().latest().unwrap();
        assert_eq!(latest.received_at, 1234);
        assert_eq!(latest.topic, "qingping/up");
        assert_eq!(latest.record.battery, Some(78));
        assert!(out.is_empty());
    }

    #[test]
    fn partial_records_follow_policy() {
        let config = ReceiverConfig {
            store_partial: false,
            ..Default::default()
        };
        let mut store = RecordStore::new(&config);
        let mut out = Vec::new();
        assert!(!store.accept(message(&partial_frame(), 1), &mut out));
        assert!(store.history().is_empty());

        let mut store = RecordStore::new(&ReceiverConfig::default());
        assert!(store.accept(message(&partial_frame(), 1), &mut out));
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn json_output_writes_one_line_per_record() {
        let config = ReceiverConfig {
            json_output: true,
            ..Default::default()
        };
        let mut store = RecordStore::new(&config);
        let mut out = Vec::new();
        store.accept(message(&complete_frame(), 10), &mut out);
        store.accept(message(&complete_frame(), 11), &mut out);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: StoredRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.received_at, 11);
        assert_eq!(parsed.record.temperature, Some(23.8));
        assert_eq!(parsed.record.variant, FrameVariant::A);
    }

    #[test]
    fn history_is_bounded() {
        let config = ReceiverConfig {
            history_size: 2,
            ..Default::default()
        };
        let mut store = RecordStore::new(&config);
        let mut out = Vec::new();
        for t in 0..5 {
            store.accept(message(&complete_frame(), t), &mut out);
        }
        assert_eq!(store.history().len(), 2);
        assert_eq!(store.history().latest().unwrap().received_at, 4);
    }
}
