//! Envelope externo do frame: magic de 3 bytes + comprimento declarado.
//!
//! ```text
//! ┌───────────┬──────────────────┬──────────────────────┐
//! │ Magic(3)  │ Payload len (2)  │ Entradas TLV (N)     │
//! │           │ u16 little-end.  │ tag(1) len(2) valor  │
//! └───────────┴──────────────────┴──────────────────────┘
//! ```

use crate::protocol::FrameError;
use serde::{Deserialize, Serialize};

/// Magic da variante A (`"CG4"`), leitura atual na tag `0x14`.
pub const MAGIC_VARIANT_A: [u8; 3] = [0x43, 0x47, 0x34];

/// Magic da variante B (`"CG1"`), leitura atual na tag `0x03`.
pub const MAGIC_VARIANT_B: [u8; 3] = [0x43, 0x47, 0x31];

/// Tamanho do magic.
pub const MAGIC_SIZE: usize = 3;

/// Tamanho do header (magic + comprimento declarado).
pub const HEADER_SIZE: usize = 5;

/// Layout do frame no fio, identificado pelo magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameVariant {
    A,
    B,
    Unrecognized,
}

impl FrameVariant {
    /// Classifica os 3 primeiros bytes do frame.
    pub fn from_magic(magic: &[u8]) -> Self {
        if magic == MAGIC_VARIANT_A {
            FrameVariant::A
        } else if magic == MAGIC_VARIANT_B {
            FrameVariant::B
        } else {
            FrameVariant::Unrecognized
        }
    }

    /// Magic correspondente (nenhum para `Unrecognized`).
    pub fn magic(self) -> Option<[u8; 3]> {
        match self {
            FrameVariant::A => Some(MAGIC_VARIANT_A),
            FrameVariant::B => Some(MAGIC_VARIANT_B),
            FrameVariant::Unrecognized => None,
        }
    }

    /// Tag que carrega o bloco de leitura atual nesta variante.
    pub fn composite_tag(self) -> Option<u8> {
        match self {
            FrameVariant::A => Some(0x14),
            FrameVariant::B => Some(0x03),
            FrameVariant::Unrecognized => None,
        }
    }
}

impl std::fmt::Display for FrameVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.magic() {
            Some(m) => write!(f, "{}", hex::encode(m)),
            None => write!(f, "unrecognized"),
        }
    }
}

/// Header validado de um frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub variant: FrameVariant,
    /// Comprimento declarado pelo dispositivo. Apenas indicativo.
    pub declared_payload_length: u16,
    pub body_offset: usize,
}

impl Envelope {
    /// Offset a partir do qual nenhuma entrada TLV nova é iniciada.
    ///
    /// `min(tamanho real, declarado + 3)`.
    pub fn scan_limit(&self, buffer_len: usize) -> usize {
        buffer_len.min(self.declared_payload_length as usize + MAGIC_SIZE)
    }
}

/// Valida e classifica o envelope do frame.
///
/// Não compara o comprimento declarado com o tamanho real; isso fica
/// com o [`TlvScanner`](crate::tlv::TlvScanner).
pub fn classify(buffer: &[u8]) -> Result<Envelope, FrameError> {
    if buffer.len() < HEADER_SIZE {
        return Err(FrameError::TooShort(buffer.len()));
    }

    let magic = &buffer[..MAGIC_SIZE];
    let variant = FrameVariant::from_magic(magic);
    if variant == FrameVariant::Unrecognized {
        return Err(FrameError::UnrecognizedMagic {
            magic: [magic[0], magic[1], magic[2]],
            raw_hex: hex::encode(buffer),
        });
    }

    Ok(Envelope {
        variant,
        declared_payload_length: u16::from_le_bytes([buffer[3], buffer[4]]),
        body_offset: HEADER_SIZE,
    })
}
