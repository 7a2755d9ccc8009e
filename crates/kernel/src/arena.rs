/// Stable reference to a slot in an [`Arena`].
///
/// A handle stays valid until its value is removed; after that the slot's
/// generation moves on and the handle reads as dead forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    generation: u32,
}

/// Generational slot storage.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
    /// Generation given to freshly pushed slots. Raised by `compact` so a slot
    /// index that was truncated and later re-pushed cannot revive old handles.
    fresh_generation: u32,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            fresh_generation: 0,
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            // generation already bumped on removal
            slot.value = Some(value);
            Handle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            let generation = self.fresh_generation;
            self.slots.push(Slot {
                value: Some(value),
                generation,
            });
            Handle { index, generation }
        }
    }

    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        // reject stale handles
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation == handle.generation {
            slot.value.as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation == handle.generation {
            slot.value.as_mut()
        } else {
            None
        }
    }

    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated slots, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation,
                    },
                    v,
                )
            })
        })
    }

    /// Drop trailing free slots and return how many were reclaimed.
    pub fn compact(&mut self) -> usize {
        let mut reclaimed = 0;
        while let Some(last) = self.slots.last() {
            if last.value.is_some() {
                break;
            }
            self.fresh_generation = self.fresh_generation.max(last.generation);
            self.slots.pop();
            reclaimed += 1;
        }
        if reclaimed > 0 {
            let live = self.slots.len() as u32;
            self.free_list.retain(|&i| i < live);
            // lowest indices first keeps the live range dense
            self.free_list.sort_unstable_by(|a, b| b.cmp(a));
        }
        reclaimed
    }
}
