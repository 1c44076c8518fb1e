//! Relay channels and the commands rules issue against them.

use super::{Label, RelayId};

/// A physical input or output channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Relay {
    pub id: RelayId,
    pub pin: u8,
    pub is_output: bool,
    pub is_digital: bool,
    /// Current pin level (`stp`).
    pub state: bool,
    /// Level captured by the last save (`lst`).
    pub last_state: bool,
    /// Set by manual on/off commands, cleared by reset.
    pub manual: bool,
    pub is_pwm: bool,
    pub pwm: u8,
    pub label: Label,
}

/// Desired effect of a rule on one relay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputCommand {
    pub enabled: bool,
    pub relay_id: RelayId,
    pub state: bool,
    /// Per-rule cache of the relay level before this rule touched it.
    pub last_state: bool,
    /// Return the relay to its cached level when the rule lets go.
    pub return_on_clear: bool,
    pub is_pwm: bool,
    pub pwm: u8,
}

impl OutputCommand {
    pub fn new(relay_id: RelayId, state: bool) -> Self {
        Self {
            enabled: true,
            relay_id,
            state,
            ..Self::default()
        }
    }
}
