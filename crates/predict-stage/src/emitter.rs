use predict_core::Record;

/// Destino de los records de salida, uno por record de entrada.
pub trait Emitter {
    fn emit(&mut self, record: Record);
}

/// Emitter que acumula en memoria.
#[derive(Debug, Default)]
pub struct VecEmitter {
    pub records: Vec<Record>,
}

impl VecEmitter {
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl Emitter for VecEmitter {
    fn emit(&mut self, record: Record) {
        self.records.push(record);
    }
}
