//! Sensor simulado – gera leituras plausíveis e determinísticas.
//!
//! Temperatura e umidade seguem um ciclo diário comprimido, a bateria
//! descarrega devagar e o RSSI oscila em torno de -70 dBm.

use std::time::{SystemTime, UNIX_EPOCH};
use sensor_core::SensorReading;
use tracing::debug;

/// Amostras por ciclo completo de temperatura/umidade.
const CYCLE_SAMPLES: f64 = 240.0;

/// Amostras para a bateria perder 1%.
const SAMPLES_PER_BATTERY_PERCENT: u64 = 500;

pub struct SensorSimulator {
    sample: u64,
    interval_secs: u16,
}

impl SensorSimulator {
    /// `interval_secs` vira o campo de intervalo (s) da variante B, mínimo 1.
    pub fn new(interval_secs: f64) -> Self {
        let interval_secs = if interval_secs.is_nan() {
            1
        } else {
            interval_secs.round().clamp(1.0, u16::MAX as f64) as u16
        };
        Self {
            sample: 0,
            interval_secs,
        }
    }

    /// Gera a próxima leitura.
    pub fn next_reading(&mut self) -> SensorReading {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default();
        let reading = self.reading_at(self.sample, timestamp);
        self.sample += 1;
        debug!("Amostra {}: {:?}", self.sample, reading);
        reading
    }

    fn reading_at(&self, sample: u64, timestamp: u32) -> SensorReading {
        let phase = (sample as f64 / CYCLE_SAMPLES) * std::f64::consts::TAU;
        let drained = (sample / SAMPLES_PER_BATTERY_PERCENT).min(99) as u8;

        SensorReading {
            timestamp,
            interval: self.interval_secs,
            temperature: round1(22.0 + 4.0 * phase.sin()),
            humidity: round1(50.0 - 12.0 * phase.sin()),
            pressure: 101.3 + 0.2 * (phase / 3.0).cos(),
            battery: 100 - drained,
            rssi: (-70.0 + 6.0 * (phase * 5.0).sin()).round() as i8,
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
