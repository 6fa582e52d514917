//! Slot-based reuse pool for fixed-shape allocations.
//!
//! Objects live in the pool for its whole lifetime; callers hold a
//! [`PoolSlot`] and borrow through it. Releasing a slot runs the reset
//! function and puts the object back on the free list, so the next
//! `acquire` hands out the same storage without reallocating.

/// Index of an object owned by an [`ObjectPool`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolSlot(usize);

pub struct ObjectPool<T> {
    create: Box<dyn Fn() -> T>,
    reset: Box<dyn Fn(&mut T)>,
    objects: Vec<T>,
    active: Vec<bool>,
    free: Vec<usize>,
    active_count: usize,
}

impl<T> ObjectPool<T> {
    /// Create a pool and preallocate `initial_size` objects
    pub fn new<C, R>(create: C, reset: R, initial_size: usize) -> Self
    where
        C: Fn() -> T + 'static,
        R: Fn(&mut T) + 'static,
    {
        let mut pool = Self {
            create: Box::new(create),
            reset: Box::new(reset),
            objects: Vec::with_capacity(initial_size),
            active: Vec::with_capacity(initial_size),
            free: Vec::with_capacity(initial_size),
            active_count: 0,
        };
        for _ in 0..initial_size {
            let obj = (pool.create)();
            pool.objects.push(obj);
            pool.active.push(false);
        }
        // Pop order hands out slot 0 first.
        pool.free.extend((0..initial_size).rev());
        pool
    }

    /// Take an object from the free list, growing the pool when it is empty
    pub fn acquire(&mut self) -> PoolSlot {
        let idx = match self.free.pop() {
            Some(idx) => idx,
            None => {
                self.objects.push((self.create)());
                self.active.push(false);
                self.objects.len() - 1
            }
        };
        self.active[idx] = true;
        self.active_count += 1;
        PoolSlot(idx)
    }

    /// Return an object to the pool. Unknown or already released slots are ignored.
    pub fn release(&mut self, slot: PoolSlot) -> bool {
        match self.active.get(slot.0) {
            Some(true) => {
                (self.reset)(&mut self.objects[slot.0]);
                self.active[slot.0] = false;
                self.free.push(slot.0);
                self.active_count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn release_all(&mut self) {
        for idx in 0..self.objects.len() {
            self.release(PoolSlot(idx));
        }
    }

    pub fn get(&self, slot: PoolSlot) -> Option<&T> {
        if self.is_active(slot) { self.objects.get(slot.0) } else { None }
    }

    pub fn get_mut(&mut self, slot: PoolSlot) -> Option<&mut T> {
        if self.is_active(slot) { self.objects.get_mut(slot.0) } else { None }
    }

    pub fn is_active(&self, slot: PoolSlot) -> bool {
        self.active.get(slot.0).copied().unwrap_or(false)
    }

    pub fn active_count(&self) -> usize { self.active_count }

    pub fn free_count(&self) -> usize { self.free.len() }

    /// Total objects ever created by this pool
    pub fn capacity(&self) -> usize { self.objects.len() }
}
