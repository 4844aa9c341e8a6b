use std::collections::VecDeque;

use chrono::Utc;
use uuid::Uuid;

use super::{StageEvent, StageEventKind};

/// Eventos por record retenidos por defecto.
pub const DEFAULT_RECORD_CAPACITY: usize = 1024;

/// Almacenamiento de eventos append-only.
pub trait EventLog {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, stage_id: Uuid, kind: StageEventKind) -> StageEvent;
    /// Eventos en orden ascendente por seq.
    fn list(&self) -> Vec<StageEvent>;
}

/// Bitácora en memoria. Los eventos de ciclo de vida se conservan todos; de
/// los eventos por record sólo los últimos `record_capacity`. `seq` sigue
/// contando los descartados.
#[derive(Debug)]
pub struct InMemoryEventLog {
    lifecycle: Vec<StageEvent>,
    records: VecDeque<StageEvent>,
    record_capacity: usize,
    next_seq: u64,
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECORD_CAPACITY)
    }
}

impl InMemoryEventLog {
    pub fn with_capacity(record_capacity: usize) -> Self {
        Self { lifecycle: Vec::new(),
               records: VecDeque::with_capacity(record_capacity.min(DEFAULT_RECORD_CAPACITY)),
               record_capacity,
               next_seq: 0 }
    }

    /// Eventos retenidos.
    pub fn len(&self) -> usize {
        self.lifecycle.len() + self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Eventos agregados desde la creación, incluidos los descartados.
    pub fn appended(&self) -> u64 {
        self.next_seq
    }
}

impl EventLog for InMemoryEventLog {
    fn append_kind(&mut self, stage_id: Uuid, kind: StageEventKind) -> StageEvent {
        let ev = StageEvent { seq: self.next_seq,
                              stage_id,
                              kind,
                              ts: Utc::now() };
        self.next_seq += 1;
        if ev.kind.is_per_record() {
            if self.record_capacity == 0 {
                return ev;
            }
            if self.records.len() == self.record_capacity {
                self.records.pop_front();
            }
            self.records.push_back(ev.clone());
        } else {
            self.lifecycle.push(ev.clone());
        }
        ev
    }

    fn list(&self) -> Vec<StageEvent> {
        let mut all: Vec<StageEvent> = self.lifecycle.iter().chain(self.records.iter()).cloned().collect();
        all.sort_by_key(|e| e.seq);
        all
    }
}
