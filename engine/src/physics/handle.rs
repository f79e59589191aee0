//! Generation-tagged handles into a physics world
//!
//! Every `simulation_start` creates a world with a new epoch. Handles stored in
//! components remember the epoch they were created in, so a handle left over
//! from a torn-down world is recognised as stale and never handed back to the
//! physics engine.

/// Monotonic epoch counter owned by a physics bridge
#[derive(Debug, Default, Clone, Copy)]
pub struct EpochCounter {
    current: u64,
}

impl EpochCounter {
    /// Advance to a new epoch and return it
    pub fn advance(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    pub fn current(&self) -> u64 {
        self.current
    }
}

/// A raw physics handle tagged with the epoch of the world that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochHandle<H> {
    pub epoch: u64,
    pub raw: H,
}

impl<H: Copy> EpochHandle<H> {
    pub fn new(epoch: u64, raw: H) -> Self {
        Self { epoch, raw }
    }

    /// The raw handle, only if it belongs to the world with `live_epoch`
    pub fn resolve(&self, live_epoch: Option<u64>) -> Option<H> {
        match live_epoch {
            Some(epoch) if epoch == self.epoch => Some(self.raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_resolves_only_in_its_epoch() {
        let mut counter = EpochCounter::default();
        let first = counter.advance();
        let handle = EpochHandle::new(first, 7u32);

        assert_eq!(handle.resolve(Some(first)), Some(7));
        assert_eq!(handle.resolve(None), None);

        let second = counter.advance();
        assert_ne!(first, second);
        assert_eq!(handle.resolve(Some(second)), None);
    }
}
