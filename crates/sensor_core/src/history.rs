//! Histórico limitado dos registros recebidos.
//!
//! Buffer circular com capacidade fixa: o registro mais novo fica na
//! frente e o mais antigo é descartado quando a capacidade é atingida.

use crate::types::StoredRecord;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RecordHistory {
    records: VecDeque<StoredRecord>,
    capacity: usize,
}

impl RecordHistory {
    /// Cria um histórico vazio. Capacidade mínima de 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insere um registro e devolve o mais antigo, se foi descartado.
    pub fn push(&mut self, record: StoredRecord) -> Option<StoredRecord> {
        let evicted = if self.records.len() >= self.capacity {
            self.records.pop_back()
        } else {
            None
        };
        self.records.push_front(record);
        evicted
    }

    pub fn latest(&self) -> Option<&StoredRecord> {
        self.records.front()
    }

    /// Do mais novo para o mais antigo.
    pub fn iter(&self) -> impl Iterator<Item = &StoredRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
