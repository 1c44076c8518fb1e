//! Manual relay commands from the transport layer.

use core::fmt;
use core::str::FromStr;

use crate::model::{Device, RelayId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayAction {
    On,
    Off,
    /// Clear the manual-override flag on one relay.
    Reset,
    /// Clear manual override and force every output low.
    ResetAll,
}

impl FromStr for RelayAction {
    type Err = RelayCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "reset" => Ok(Self::Reset),
            "reset_all" => Ok(Self::ResetAll),
            _ => Err(RelayCommandError::UnknownAction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommandError {
    UnknownAction,
    MissingRelayId,
    UnknownRelay,
    NoOutputs,
}

impl fmt::Display for RelayCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RelayCommandError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownAction => "unknown action",
            Self::MissingRelayId => "relay id required",
            Self::UnknownRelay => "relay not found",
            Self::NoOutputs => "no output relays",
        }
    }
}

/// Apply a command.  Either it fully applies or nothing changes.
///
/// Repeating an on/off that is already in effect is a successful no-op.
pub fn apply_relay_command(
    device: &mut Device,
    relay_id: Option<RelayId>,
    action: RelayAction,
) -> Result<(), RelayCommandError> {
    if action == RelayAction::ResetAll {
        let mut any = false;
        for relay in device.relays.iter_mut().filter(|r| r.is_output) {
            relay.manual = false;
            relay.state = false;
            any = true;
        }
        return if any {
            Ok(())
        } else {
            Err(RelayCommandError::NoOutputs)
        };
    }

    let id = relay_id.ok_or(RelayCommandError::MissingRelayId)?;
    let relay = device
        .relay_mut(id)
        .ok_or(RelayCommandError::UnknownRelay)?;

    match action {
        RelayAction::On | RelayAction::Off => {
            let level = action == RelayAction::On;
            if relay.state != level || !relay.manual {
                relay.state = level;
                relay.manual = true;
            }
        }
        RelayAction::Reset => relay.manual = false,
        RelayAction::ResetAll => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::factory::factory_device;

    #[test]
    fn on_sets_manual_override() {
        let mut d = factory_device();
        apply_relay_command(&mut d, Some(1), RelayAction::On).unwrap();
        let r = d.relay(1).unwrap();
        assert!(r.state && r.manual);
    }

    #[test]
    fn repeated_command_is_idempotent() {
        let mut d = factory_device();
        apply_relay_command(&mut d, Some(2), RelayAction::Off).unwrap();
        let once = d.clone();
        apply_relay_command(&mut d, Some(2), RelayAction::Off).unwrap();
        assert_eq!(d, once);
    }

    #[test]
    fn reset_all_clears_outputs_only() {
        let mut d = factory_device();
        apply_relay_command(&mut d, None, RelayAction::ResetAll).unwrap();
        assert!(d.output_relays().all(|r| !r.state && !r.manual));
    }

    #[test]
    fn reset_all_without_outputs_fails() {
        let mut d = factory_device();
        d.relays.retain(|r| !r.is_output);
        assert_eq!(
            apply_relay_command(&mut d, None, RelayAction::ResetAll),
            Err(RelayCommandError::NoOutputs)
        );
    }

    #[test]
    fn unknown_relay_changes_nothing() {
        let mut d = factory_device();
        let before = d.clone();
        assert_eq!(
            apply_relay_command(&mut d, Some(42), RelayAction::On),
            Err(RelayCommandError::UnknownRelay)
        );
        assert_eq!(
            apply_relay_command(&mut d, None, RelayAction::On),
            Err(RelayCommandError::MissingRelayId)
        );
        assert_eq!(d, before);
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("reset_all".parse(), Ok(RelayAction::ResetAll));
        assert_eq!(
            "toggle".parse::<RelayAction>(),
            Err(RelayCommandError::UnknownAction)
        );
    }
}
