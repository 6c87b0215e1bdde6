//! Entity handle with generational index
//!
//! Entities are lightweight handles (8 bytes). Components never own an
//! entity; they only record which one they belong to.

/// Entity handle (generation-indexed for safety)
///
/// Format: [32-bit index | 32-bit generation]
/// - Index: dense, stable small integer used for table addressing
/// - Generation: incremented when the registry recycles the index
///
/// [`Entity::NULL`] marks a vacant table slot and is never issued.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Sentinel stored in cleared slots.
    pub const NULL: Entity = Entity {
        index: u32::MAX,
        generation: 0,
    };

    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_null(&self) -> bool {
        self.index == u32::MAX
    }

    /// Serialize to 64-bit integer (for save files)
    pub fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Deserialize from 64-bit integer
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_round_trip() {
        let e = Entity::new(7, 3);
        assert_eq!(Entity::from_bits(e.to_bits()), e);
    }

    #[test]
    fn default_is_null() {
        assert!(Entity::default().is_null());
        assert!(!Entity::new(0, 0).is_null());
    }
}
