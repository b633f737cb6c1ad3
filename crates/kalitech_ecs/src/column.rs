use std::any::Any;

/// Dense, index-addressed storage for one component type; array index is
/// the entity id. Grows in powers of two (§4.D invariant).
pub struct Column<T> {
    data: Vec<Option<T>>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<T> Column<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_capacity(&mut self, index: usize) {
        if index < self.data.len() {
            return;
        }
        let mut capacity = self.data.len().max(1);
        while capacity <= index {
            capacity *= 2;
        }
        self.data.resize_with(capacity, || None);
    }

    pub fn set(&mut self, index: usize, value: T) {
        self.ensure_capacity(index);
        self.data[index] = Some(value);
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index).and_then(Option::as_ref)
    }

    pub fn has(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        self.data.get_mut(index).and_then(Option::take)
    }

    pub fn clear_at(&mut self, index: usize) {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = None;
        }
    }

    pub fn for_each(&self, mut f: impl FnMut(usize, &T)) {
        for (index, slot) in self.data.iter().enumerate() {
            if let Some(value) = slot {
                f(index, value);
            }
        }
    }
}

/// Type-erased handle onto a `Column<T>` so `EcsStore` can hold columns of
/// differing `T` in one map and still clear a dead entity's slot across all
/// of them without knowing each `T`.
pub(crate) trait ErasedColumn: Any {
    fn clear_at(&mut self, index: usize);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> ErasedColumn for Column<T> {
    fn clear_at(&mut self, index: usize) {
        Column::clear_at(self, index);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_in_powers_of_two() {
        let mut col: Column<u32> = Column::new();
        col.set(5, 1);
        assert_eq!(col.data.len(), 8);
        col.set(8, 2);
        assert_eq!(col.data.len(), 16);
    }

    #[test]
    fn remove_and_clear_at_empty_the_slot() {
        let mut col: Column<&str> = Column::new();
        col.set(2, "a");
        assert_eq!(col.remove(2), Some("a"));
        assert!(!col.has(2));

        col.set(3, "b");
        col.clear_at(3);
        assert!(!col.has(3));
    }

    #[test]
    fn for_each_skips_empty_slots() {
        let mut col: Column<u32> = Column::new();
        col.set(0, 10);
        col.set(3, 40);
        let mut seen = Vec::new();
        col.for_each(|i, v| seen.push((i, *v)));
        assert_eq!(seen, vec![(0, 10), (3, 40)]);
    }
}
