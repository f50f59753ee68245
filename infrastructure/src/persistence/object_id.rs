use domain::DocumentId;
use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// Generates 12-byte, ObjectId-shaped document ids rendered as 24 lowercase hex chars:
/// 4 bytes of unix seconds, 5 random bytes fixed per generator, 3 bytes of counter.
#[derive(Debug)]
pub struct ObjectIdGenerator {
    process_unique: [u8; 5],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let mut process_unique = [0u8; 5];
        rng.fill(&mut process_unique);
        Self {
            process_unique,
            counter: AtomicU32::new(rng.gen_range(0..=COUNTER_MASK)),
        }
    }

    pub fn next_id(&self) -> DocumentId {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or(0);
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process_unique);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        DocumentId::new(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_24_lowercase_hex_chars() {
        let id = ObjectIdGenerator::new().next_id();
        assert_eq!(id.as_str().len(), 24);
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn ids_from_one_generator_are_distinct() {
        let generator = ObjectIdGenerator::new();
        let ids: HashSet<_> = (0..10_000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn ids_share_the_process_component() {
        let generator = ObjectIdGenerator::new();
        let a = generator.next_id();
        let b = generator.next_id();
        assert_eq!(a.as_str()[8..18], b.as_str()[8..18]);
    }
}
