use std::fmt;

/// Estado del stage en su ciclo de vida.
///
/// Transiciones válidas:
/// - `Unconfigured` -> `Configured` (configure)
/// - `Configured` -> `Initialized` (initialize)
/// - `Initialized` -> `Running` (primer record)
/// - cualquiera -> `Destroyed` (destroy)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Unconfigured,
    Configured,
    Initialized,
    Running,
    Destroyed,
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageState::Unconfigured => "unconfigured",
            StageState::Configured => "configured",
            StageState::Initialized => "initialized",
            StageState::Running => "running",
            StageState::Destroyed => "destroyed",
        };
        f.write_str(s)
    }
}
