use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a car tracked on the belt. Stable for the car's lifetime.
    pub struct CarId;
}

/// Identifies an archetype in the classifier's rule table. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchetypeId(pub u16);

impl ArchetypeId {
    /// Index into the classifier's archetype list.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn archetype_id_equality() {
        assert_eq!(ArchetypeId(0), ArchetypeId(0));
        assert_ne!(ArchetypeId(0), ArchetypeId(1));
        assert_eq!(ArchetypeId(3).index(), 3);
    }

    #[test]
    fn car_ids_are_unique_after_removal() {
        let mut cars = SlotMap::<CarId, u32>::with_key();
        let a = cars.insert(1);
        cars.remove(a);
        let b = cars.insert(2);
        assert_ne!(a, b);
        assert!(cars.get(a).is_none());
    }
}
