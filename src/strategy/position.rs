/// FLAT or LONG, as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    Flat,
    Long,
}

/// The single open/closed position tracked during a run.
///
/// Owned by the evaluation loop and passed by `&mut`; the entry price only
/// exists while long.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long { entry_price: f64 },
}

impl PositionState {
    pub fn flat() -> Self {
        Self::Flat
    }

    pub fn status(&self) -> PositionStatus {
        match self {
            PositionState::Flat => PositionStatus::Flat,
            PositionState::Long { .. } => PositionStatus::Long,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn is_long(&self) -> bool {
        !self.is_flat()
    }

    pub fn entry_price(&self) -> Option<f64> {
        match self {
            PositionState::Flat => None,
            PositionState::Long { entry_price } => Some(*entry_price),
        }
    }

    /// Go long at `price`
    pub(crate) fn open(&mut self, price: f64) {
        debug_assert!(self.is_flat(), "open called while already long");
        *self = PositionState::Long { entry_price: price };
    }

    /// Go flat, returning the entry price that was cleared
    pub(crate) fn close(&mut self) -> Option<f64> {
        let entry = self.entry_price();
        *self = PositionState::Flat;
        entry
    }
}
