//! Identifier allocation for generated records.

use uuid::Uuid;

/// Source of unique record identifiers
///
/// The assembler calls this in a fixed order, so a deterministic generator
/// yields reproducible output.
pub trait IdGenerator {
    fn next_id(&mut self) -> Uuid;
}

/// Random version-4 identifiers
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&mut self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Counter-based identifiers starting after `seed`
#[derive(Debug, Default, Clone)]
pub struct SequentialIdGenerator {
    next: u128,
}

impl SequentialIdGenerator {
    pub fn new(seed: u128) -> Self {
        Self { next: seed }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> Uuid {
        self.next += 1;
        Uuid::from_u128(self.next)
    }
}
