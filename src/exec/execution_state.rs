use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ComputeState {
    #[default]
    Idle,
    Computing,
}

impl fmt::Display for ComputeState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ComputeState::Idle => write!(f, "Idle"),
            ComputeState::Computing => write!(f, "Computing"),
        }
    }
}
