//! Leitor sequencial com verificação de limites sobre um buffer de bytes.
//!
//! Base de todas as camadas do decoder. Nenhuma leitura passa do fim do
//! buffer: quem chama usa o [`CursorError::OutOfBounds`] para encerrar o
//! scan em vez de calcular offsets na mão.

/// Erros do cursor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    #[error("Leitura fora dos limites: pedidos {requested} bytes, restam {remaining}")]
    OutOfBounds { requested: usize, remaining: usize },
}

/// Cursor de leitura sobre um slice emprestado.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Cria um cursor já posicionado em `pos` (saturado no fim do buffer).
    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self {
            buf,
            pos: pos.min(buf.len()),
        }
    }

    /// Posição atual de leitura.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes ainda não consumidos.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Retorna os próximos `n` bytes sem avançar.
    pub fn peek(&self, n: usize) -> Result<&'a [u8], CursorError> {
        if n > self.remaining() {
            return Err(CursorError::OutOfBounds {
                requested: n,
                remaining: self.remaining(),
            });
        }
        Ok(&self.buf[self.pos..self.pos + n])
    }

    /// Consome e retorna os próximos `n` bytes.
    ///
    /// Em caso de erro a posição não muda.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        let bytes = self.peek(n)?;
        self.pos += n;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Byte com sinal (complemento de dois).
    pub fn read_i8(&mut self) -> Result<i8, CursorError> {
        Ok(i8::from_le_bytes(self.take_array()?))
    }

    pub fn read_u16_le(&mut self) -> Result<u16, CursorError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    /// Inteiro de 24 bits montado em little-endian (`b0 | b1<<8 | b2<<16`).
    pub fn read_u24_le(&mut self) -> Result<u32, CursorError> {
        let [b0, b1, b2] = self.take_array()?;
        Ok(u32::from_le_bytes([b0, b1, b2, 0]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, CursorError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    /// Resto do buffer a partir da posição atual.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}
