//! Thread de rede que escuta UDP, decodifica frames e envia registros via channel.

use crossbeam_channel::{Receiver, Sender, bounded};
use sensor_core::protocol::decode_frame;
use sensor_core::types::DecodedRecord;
use std::net::UdpSocket;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

/// Mensagem enviada da thread de rede para o loop principal.
#[derive(Debug, Clone)]
pub struct NetMessage {
    pub record: DecodedRecord,
    pub source_addr: String,
    pub raw_size: usize,
    /// Epoch (s) de chegada
    pub received_at: u64,
}

/// Inicia a thread de rede. Retorna o receiver do channel.
pub fn spawn_receiver_thread(
    port: u16,
    sender_ip_filter: String,
) -> std::io::Result<Receiver<NetMessage>> {
    let (tx, rx) = bounded::<NetMessage>(64); // Buffer de 64 mensagens

    std::thread::Builder::new()
        .name("udp-receiver".into())
        .spawn(move || {
            receiver_loop(&tx, port, &sender_ip_filter);
        })?;

    Ok(rx)
}

pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn receiver_loop(tx: &Sender<NetMessage>, port: u16, sender_ip_filter: &str) {
    loop {
        match UdpSocket::bind(format!("0.0.0.0:{port}")) {
            Ok(sock) => {
                sock.set_read_timeout(Some(std::time::Duration::from_secs(1)))
                    .ok();

                let mode = if sender_ip_filter.is_empty() {
                    "Qualquer origem"
                } else {
                    sender_ip_filter
                };
                info!("Receiver escutando em 0.0.0.0:{port} – Filtro: {mode}");

                let mut buf = [0u8; 65536];
                loop {
                    match sock.recv_from(&mut buf) {
                        Ok((size, addr)) => {
                            let source = addr.ip().to_string();

                            // Filtro de IP se configurado
                            if !sender_ip_filter.is_empty() && source != sender_ip_filter {
                                debug!("Ignorando frame de {source} (esperado: {sender_ip_filter})");
                                continue;
                            }

                            match decode_frame(&buf[..size]) {
                                Ok(record) => {
                                    let msg = NetMessage {
                                        record,
                                        source_addr: source,
                                        raw_size: size,
                                        received_at: now_epoch_secs(),
                                    };
                                    if tx.send(msg).is_err() {
                                        info!("Channel fechado, encerrando thread de rede");
                                        return;
                                    }
                                }
                                Err(e) => {
                                    warn!("Frame descartado de {source}: {e}");
                                }
                            }
                        }
                        Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut
                            || e.kind() == std::io::ErrorKind::WouldBlock =>
                        {
                            // Timeout normal, continua
                        }
                        Err(e) => {
                            warn!("Erro ao receber UDP: {e}");
                        }
                    }
                }
            }
            Err(e) => {
                error!("Falha ao bind porta {port}: {e}. Tentando novamente em 2s...");
                std::thread::sleep(std::time::Duration::from_secs(2));
            }
        }
    }
}
