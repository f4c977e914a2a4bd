//! The field set: slot pool, role table and role-swap commits.
//!
//! [`GridFieldSet`] owns every buffer of a simulation. The lifecycle of a
//! field update is:
//! 1. `take_scratch()`: check a free slot out of the pool
//! 2. an operator reads `current(..)` fields and writes the scratch buffer
//! 3. `commit(field, scratch)`: the scratch slot becomes current, the old
//!    current slot returns to the pool
//!
//! The pool is LIFO, so the slot retired by a commit is the next one
//! handed out.

use std::mem;

use inkflow_core::{Field, FrameId, GridDims};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::handle::{ScratchBuffer, SlotId};
use crate::read::FieldSnapshot;

/// Owner of all field storage for one simulation instance.
///
/// # Slot layout
///
/// ```text
/// slot:   0   1   2   3     4     5     6   7   ...
/// start:  u   v   p   ink_r ink_g ink_b [scratch pool]
/// ```
///
/// After any number of commits the mapping is arbitrary; only the role
/// table knows which slot is which field.
pub struct GridFieldSet {
    /// Validated configuration.
    config: ArenaConfig,
    /// Backing storage, one buffer per slot. A checked-out slot holds an
    /// empty placeholder until its buffer comes back.
    slots: Vec<Vec<f32>>,
    /// Whether each slot is currently checked out as a [`ScratchBuffer`].
    checked_out: Vec<bool>,
    /// Current slot of each logical field, indexed by [`Field::index`].
    roles: [SlotId; Field::COUNT],
    /// Free scratch slots; the top of the stack is handed out next.
    free: Vec<SlotId>,
    /// Number of role swaps performed since allocation or reset.
    generation: u64,
}

impl GridFieldSet {
    /// Allocate a zero-initialised field set for a `width × height` grid
    /// with default limits.
    pub fn new(width: usize, height: usize) -> Result<Self, ArenaError> {
        Self::allocate(ArenaConfig::new(width, height))
    }

    /// Allocate every slot described by `config`, zero-initialised.
    ///
    /// Fails with `InvalidConfig` for grids without an interior or a
    /// scratch pool below two slots, `CapacityExceeded` when the grid is
    /// over `max_cells`, and `AllocationFailed` when the allocator
    /// refuses the reservation. Nothing is resized after this returns.
    pub fn allocate(config: ArenaConfig) -> Result<Self, ArenaError> {
        let dims = config.dims;
        if dims.width < ArenaConfig::MIN_SIDE || dims.height < ArenaConfig::MIN_SIDE {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "grid must be at least {min}x{min} (got {dims})",
                    min = ArenaConfig::MIN_SIDE,
                ),
            });
        }
        if config.scratch_slots < ArenaConfig::DEFAULT_SCRATCH_SLOTS {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "scratch_slots must be >= {} (got {})",
                    ArenaConfig::DEFAULT_SCRATCH_SLOTS,
                    config.scratch_slots,
                ),
            });
        }
        let slot_count = config.slot_count();
        if slot_count > usize::from(u16::MAX) {
            return Err(ArenaError::InvalidConfig {
                reason: format!("too many slots: {slot_count}"),
            });
        }

        let cells = dims
            .checked_cell_count()
            .ok_or(ArenaError::CapacityExceeded {
                requested: usize::MAX,
                capacity: config.max_cells,
            })?;
        if cells > config.max_cells {
            return Err(ArenaError::CapacityExceeded {
                requested: cells,
                capacity: config.max_cells,
            });
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(slot_count)
            .map_err(|_| ArenaError::AllocationFailed {
                bytes: slot_count * mem::size_of::<Vec<f32>>(),
            })?;
        for _ in 0..slot_count {
            slots.push(zeroed(cells)?);
        }

        Ok(Self {
            roles: Self::initial_roles(),
            free: Self::initial_free(slot_count),
            checked_out: vec![false; slot_count],
            slots,
            config,
            generation: 0,
        })
    }

    fn initial_roles() -> [SlotId; Field::COUNT] {
        // Field::COUNT is far below u16::MAX.
        std::array::from_fn(|i| SlotId(i as u16))
    }

    fn initial_free(slot_count: usize) -> Vec<SlotId> {
        // Reversed so the lowest scratch slot is handed out first.
        (Field::COUNT..slot_count)
            .rev()
            .map(|i| SlotId(i as u16))
            .collect()
    }

    /// Grid dimensions shared by every field.
    pub fn dims(&self) -> GridDims {
        self.config.dims
    }

    /// The configuration this field set was allocated with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Number of role swaps performed since allocation or the last reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of scratch slots currently free.
    pub fn scratch_available(&self) -> usize {
        self.free.len()
    }

    /// The slot currently holding `field`.
    pub fn slot_of(&self, field: Field) -> SlotId {
        self.roles[field.index()]
    }

    /// Bytes of field storage held by this set.
    pub fn memory_bytes(&self) -> usize {
        self.config.slot_count() * self.dims().cell_count() * mem::size_of::<f32>()
    }

    /// Current (authoritative) data of `field`.
    pub fn current(&self, field: Field) -> &[f32] {
        &self.slots[self.slot_index(field)]
    }

    /// Mutable access to the current data of `field`, for in-place
    /// operators (boundary enforcement, ink injection).
    pub fn current_mut(&mut self, field: Field) -> &mut [f32] {
        let idx = self.slot_index(field);
        &mut self.slots[idx]
    }

    /// Mutable access to three distinct fields at once.
    ///
    /// Fails with `DuplicateField` if any two of the fields are the same.
    pub fn current_mut3(
        &mut self,
        a: Field,
        b: Field,
        c: Field,
    ) -> Result<(&mut [f32], &mut [f32], &mut [f32]), ArenaError> {
        let idx = [self.slot_index(a), self.slot_index(b), self.slot_index(c)];
        match self.slots.get_disjoint_mut(idx) {
            Ok([ra, rb, rc]) => Ok((ra.as_mut_slice(), rb.as_mut_slice(), rc.as_mut_slice())),
            Err(_) => Err(ArenaError::DuplicateField {
                field: if a == b || a == c { a } else { b },
            }),
        }
    }

    fn slot_index(&self, field: Field) -> usize {
        usize::from(self.roles[field.index()].0)
    }

    /// Check a free scratch slot out of the pool.
    ///
    /// The returned buffer holds stale data from the slot's previous
    /// role. Fails with `ScratchExhausted` if every scratch slot is out.
    pub fn take_scratch(&mut self) -> Result<ScratchBuffer, ArenaError> {
        let slot = self.free.pop().ok_or(ArenaError::ScratchExhausted {
            pool: self.config.scratch_slots,
        })?;
        let idx = usize::from(slot.0);
        self.checked_out[idx] = true;
        Ok(ScratchBuffer {
            slot,
            data: mem::take(&mut self.slots[idx]),
        })
    }

    /// Make `scratch` the current version of `field`.
    ///
    /// The previously current slot of `field` returns to the pool and is
    /// the next slot [`take_scratch`](Self::take_scratch) hands out.
    pub fn commit(&mut self, field: Field, scratch: ScratchBuffer) -> Result<(), ArenaError> {
        let slot = self.check_in(scratch)?;
        let old = mem::replace(&mut self.roles[field.index()], slot);
        self.free.push(old);
        self.generation += 1;
        Ok(())
    }

    /// Make `scratch` the current version of `field` and hand the old
    /// current slot back as a checked-out buffer.
    ///
    /// Used to keep a field's pre-update value alive (for example as a
    /// fixed right-hand side) while new versions are committed over it.
    pub fn exchange(
        &mut self,
        field: Field,
        scratch: ScratchBuffer,
    ) -> Result<ScratchBuffer, ArenaError> {
        let slot = self.check_in(scratch)?;
        let old = mem::replace(&mut self.roles[field.index()], slot);
        self.generation += 1;
        let idx = usize::from(old.0);
        self.checked_out[idx] = true;
        Ok(ScratchBuffer {
            slot: old,
            data: mem::take(&mut self.slots[idx]),
        })
    }

    /// Return a checked-out buffer to the pool without committing it.
    pub fn release(&mut self, scratch: ScratchBuffer) -> Result<(), ArenaError> {
        let slot = self.check_in(scratch)?;
        self.free.push(slot);
        Ok(())
    }

    fn check_in(&mut self, scratch: ScratchBuffer) -> Result<SlotId, ArenaError> {
        let ScratchBuffer { slot, data } = scratch;
        let idx = usize::from(slot.0);
        let owned_here = self.checked_out.get(idx).copied().unwrap_or(false);
        if !owned_here || data.len() != self.dims().cell_count() {
            return Err(ArenaError::ForeignScratch { slot });
        }
        self.slots[idx] = data;
        self.checked_out[idx] = false;
        Ok(slot)
    }

    /// Zero every field and restore the initial slot layout.
    ///
    /// Fails with `ScratchOutstanding` if any scratch buffer is still
    /// checked out.
    pub fn reset(&mut self) -> Result<(), ArenaError> {
        let count = self.checked_out.iter().filter(|&&c| c).count();
        if count > 0 {
            return Err(ArenaError::ScratchOutstanding { count });
        }
        for slot in &mut self.slots {
            slot.fill(0.0);
        }
        self.roles = Self::initial_roles();
        self.free = Self::initial_free(self.slots.len());
        self.generation = 0;
        Ok(())
    }

    /// Borrow the current fields as a read-only snapshot for `frame`.
    pub fn snapshot(&self, frame: FrameId) -> FieldSnapshot<'_> {
        FieldSnapshot::new(self, frame)
    }
}

impl std::fmt::Debug for GridFieldSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridFieldSet")
            .field("dims", &self.config.dims)
            .field("roles", &self.roles)
            .field("free", &self.free)
            .field("generation", &self.generation)
            .finish()
    }
}

fn zeroed(cells: usize) -> Result<Vec<f32>, ArenaError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(cells)
        .map_err(|_| ArenaError::AllocationFailed {
            bytes: cells.saturating_mul(mem::size_of::<f32>()),
        })?;
    buf.resize(cells, 0.0);
    Ok(buf)
}
