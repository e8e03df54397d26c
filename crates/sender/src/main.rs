//! # Sensor Sender
//!
//! Sensor ambiental simulado: gera leituras, codifica no frame TLV da
//! variante configurada e envia cada frame como um datagrama UDP.
//!
//! ## Uso
//! ```bash
//! sensor_sender              # Usa config.toml ao lado do executável
//! sensor_sender --variant b  # Força a variante B
//! ```

mod simulator;

use sensor_core::config::AppConfig;
use sensor_core::{FrameVariant, encode_reading};
use simulator::SensorSimulator;
use std::net::UdpSocket;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

fn main() -> std::io::Result<()> {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = AppConfig::default_path();
    let mut config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    if let Some(variant) = variant_from_args(std::env::args()) {
        config.sender.variant = variant;
    }

    for problem in config.validate() {
        warn!("Config: {problem}");
    }

    let sender_cfg = &config.sender;
    let dest_ip = &sender_cfg.dest_ip;
    let port = sender_cfg.port;
    let variant = sender_cfg.variant;
    let interval_secs = sender_cfg.effective_interval_secs();
    let interval = Duration::from_secs_f64(interval_secs);

    // ── Socket UDP ──
    let sock = UdpSocket::bind(if sender_cfg.bind_ip.is_empty() {
        "0.0.0.0:0".to_string()
    } else {
        format!("{}:0", sender_cfg.bind_ip)
    })?;

    if sender_cfg.mode == "broadcast" || dest_ip == "255.255.255.255" {
        sock.set_broadcast(true)?;
        info!("Modo BROADCAST ativado");
    } else {
        info!("Modo UNICAST → {dest_ip}");
    }

    let dest_addr = format!("{dest_ip}:{port}");
    let mut sim = SensorSimulator::new(interval_secs);

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⚡ SENSOR SENDER – ATIVO (simulado)");
    println!("══════════════════════════════════════════════");
    println!("  Destino:   {dest_addr}");
    println!("  Intervalo: {:.1}s", interval.as_secs_f64());
    println!("  Variante:  {variant}");
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    loop {
        let cycle_start = Instant::now();

        let reading = sim.next_reading();
        match encode_reading(variant, &reading) {
            Ok(frame) => match sock.send_to(&frame, &dest_addr) {
                Ok(sent) => {
                    info!(
                        "→ {} bytes para {} | {:.1}°C {:.1}% | {:.2} | bat {}% | {} dBm",
                        sent,
                        dest_addr,
                        reading.temperature,
                        reading.humidity,
                        reading.pressure,
                        reading.battery,
                        reading.rssi
                    );
                }
                Err(e) => error!("Erro ao enviar UDP: {e}"),
            },
            Err(e) => error!("Erro ao codificar leitura: {e}"),
        }

        // Dormir pelo tempo restante do intervalo
        let elapsed = cycle_start.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }
}

/// Lê `--variant a|b` da linha de comando.
fn variant_from_args(args: impl IntoIterator<Item = String>) -> Option<FrameVariant> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--variant" {
            return match args.next()?.to_ascii_lowercase().as_str() {
                "a" => Some(FrameVariant::A),
                "b" => Some(FrameVariant::B),
                other => {
                    warn!("Variante desconhecida '{other}', usando a do config");
                    None
                }
            };
        }
    }
    None
}
