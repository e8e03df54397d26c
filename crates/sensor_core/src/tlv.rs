//! Scanner das entradas TLV do corpo do frame.
//!
//! Cada entrada: tag (1 byte), comprimento (2 bytes LE), valor (N bytes).
//! O scan para em silêncio quando sobram menos de 3 bytes (padding ou
//! terminador) e para com [`Diagnostic::TruncatedValue`] quando o valor
//! declarado não cabe no buffer. Entradas já lidas são mantidas.

use crate::cursor::ByteCursor;
use crate::header::Envelope;
use crate::protocol::Diagnostic;
use std::iter::FusedIterator;
use tracing::{debug, warn};

/// Tamanho do cabeçalho de cada entrada (tag + comprimento).
pub const ENTRY_HEADER_SIZE: usize = 3;

/// Entrada TLV emprestada do frame original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvEntry<'a> {
    pub tag: u8,
    pub value: &'a [u8],
}

/// Iterador preguiçoso sobre as entradas TLV de um frame.
///
/// Consumido uma única vez. Depois do fim, [`TlvScanner::truncation`]
/// informa se o scan parou por valor truncado.
#[derive(Debug)]
pub struct TlvScanner<'a> {
    cursor: ByteCursor<'a>,
    limit: usize,
    truncation: Option<Diagnostic>,
    done: bool,
}

impl<'a> TlvScanner<'a> {
    pub fn new(buffer: &'a [u8], envelope: &Envelope) -> Self {
        Self {
            cursor: ByteCursor::at(buffer, envelope.body_offset),
            limit: envelope.scan_limit(buffer.len()),
            truncation: None,
            done: false,
        }
    }

    /// Diagnóstico de truncamento, se o scan parou por valor incompleto.
    pub fn truncation(&self) -> Option<&Diagnostic> {
        self.truncation.as_ref()
    }

    /// Consome o scanner e devolve o diagnóstico de truncamento.
    pub fn into_truncation(self) -> Option<Diagnostic> {
        self.truncation
    }

    fn scan_next(&mut self) -> Option<TlvEntry<'a>> {
        let offset = self.cursor.position();
        if offset >= self.limit || self.cursor.remaining() < ENTRY_HEADER_SIZE {
            return None;
        }

        let tag = self.cursor.read_u8().ok()?;
        let length = self.cursor.read_u16_le().ok()?;

        match self.cursor.take(length as usize) {
            Ok(value) => {
                debug!("TLV 0x{tag:02x} @ {offset}: {} ({length} bytes)", hex::encode(value));
                Some(TlvEntry { tag, value })
            }
            Err(_) => {
                let available = self.cursor.remaining();
                warn!(
                    "Valor truncado: tag=0x{tag:02x}, comprimento={length}, offset={offset}, disponíveis={available}"
                );
                self.truncation = Some(Diagnostic::TruncatedValue {
                    tag,
                    offset,
                    length,
                    available,
                });
                None
            }
        }
    }
}

impl<'a> Iterator for TlvScanner<'a> {
    type Item = TlvEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let entry = self.scan_next();
        if entry.is_none() {
            self.done = true;
        }
        entry
    }
}

impl FusedIterator for TlvScanner<'_> {}

/// Executa o scan completo e devolve as entradas e o eventual truncamento.
pub fn scan<'a>(buffer: &'a [u8], envelope: &Envelope) -> (Vec<TlvEntry<'a>>, Option<Diagnostic>) {
    let mut scanner = TlvScanner::new(buffer, envelope);
    let entries: Vec<_> = scanner.by_ref().collect();
    (entries, scanner.into_truncation())
}
