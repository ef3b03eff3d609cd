//! Menu actions, one variant per numbered entry.

use std::fmt;
use std::str::FromStr;

use crate::error::TorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Exit,
    Install,
    Update,
    Uninstall,
    ExitIp,
    Schedule,
    ChangeIp,
    ChangePort,
    ChangeCountries,
    Start,
    Stop,
    Restart,
    Reload,
    Status,
}

impl Action {
    /// Menu order.
    pub const ALL: [Action; 14] = [
        Action::Install,
        Action::Update,
        Action::Uninstall,
        Action::ExitIp,
        Action::Schedule,
        Action::ChangeIp,
        Action::ChangePort,
        Action::ChangeCountries,
        Action::Start,
        Action::Stop,
        Action::Restart,
        Action::Reload,
        Action::Status,
        Action::Exit,
    ];

    pub fn code(&self) -> u8 {
        match self {
            Action::Exit => 0,
            Action::Install => 1,
            Action::Update => 2,
            Action::Uninstall => 3,
            Action::ExitIp => 4,
            Action::Schedule => 5,
            Action::ChangeIp => 6,
            Action::ChangePort => 7,
            Action::ChangeCountries => 8,
            Action::Start => 9,
            Action::Stop => 10,
            Action::Restart => 11,
            Action::Reload => 12,
            Action::Status => 13,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::Exit => "Exit",
            Action::Install => "Install Tor",
            Action::Update => "Update Tor",
            Action::Uninstall => "Uninstall Tor",
            Action::ExitIp => "Get Tor IP",
            Action::Schedule => "Schedule IP rotation",
            Action::ChangeIp => "Change IP (reload/restart)",
            Action::ChangePort => "Change port",
            Action::ChangeCountries => "Change countries",
            Action::Start => "Start Tor",
            Action::Stop => "Stop Tor",
            Action::Restart => "Restart Tor",
            Action::Reload => "Reload Tor",
            Action::Status => "Show status",
        }
    }
}

impl FromStr for Action {
    type Err = TorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        input
            .parse::<u8>()
            .ok()
            .and_then(|code| Action::ALL.into_iter().find(|a| a.code() == code))
            .ok_or_else(|| TorError::InvalidInput(format!("unknown menu choice: {:?}", input)))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>2}) {}", self.code(), self.label())
    }
}
