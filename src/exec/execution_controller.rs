use crate::exec::execution_state::ComputeState;

/// Identifies one recomputation of a node. Only the ticket handed out by the
/// most recent [`ComputeController::begin`] may commit.
pub type Ticket = u64;

/// Per-node generation counter that decides which recomputation is current.
///
/// Every `begin` supersedes all earlier tickets; `cancel` supersedes them
/// without starting a new one.
#[derive(Debug, Clone, Default)]
pub struct ComputeController {
    state: ComputeState,
    generation: Ticket,
}

impl ComputeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.state = ComputeState::Computing;
        self.generation
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
        self.state = ComputeState::Idle;
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation == ticket
    }

    /// Marks the computation for `ticket` as done. Stale tickets are ignored.
    pub fn finish(&mut self, ticket: Ticket) -> bool {
        if self.is_current(ticket) {
            self.state = ComputeState::Idle;
            true
        } else {
            false
        }
    }

    pub fn state(&self) -> ComputeState {
        self.state
    }

    pub fn generation(&self) -> Ticket {
        self.generation
    }
}
