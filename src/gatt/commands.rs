//! Control command handlers
//!
//! Holds at most one handler per [`ControlCommand`]. A command without a
//! handler is dropped silently.

use crate::gatt::types::ControlCommand;
use log::debug;

/// Zero-argument command handler
pub type Handler<'h> = &'h dyn Fn();

/// Per-command handler slots
pub struct CommandHandlers<'h> {
    slots: [Option<Handler<'h>>; 3],
}

impl<'h> CommandHandlers<'h> {
    /// Create a registry with no handlers
    pub const fn new() -> Self {
        Self { slots: [None; 3] }
    }

    /// Register (or replace) the handler for `command`
    pub fn set(&mut self, command: ControlCommand, handler: Handler<'h>) {
        self.slots[command.index()] = Some(handler);
    }

    /// Remove the handler for `command`
    pub fn clear(&mut self, command: ControlCommand) {
        self.slots[command.index()] = None;
    }

    /// Whether `command` has a handler
    pub fn is_registered(&self, command: ControlCommand) -> bool {
        self.slots[command.index()].is_some()
    }

    /// Invoke the handler for `command`, if any.
    ///
    /// Returns whether a handler ran.
    pub fn dispatch(&self, command: ControlCommand) -> bool {
        match self.slots[command.index()] {
            Some(handler) => {
                debug!("COMMAND: Dispatching {:?}", command);
                handler();
                true
            }
            None => {
                debug!("COMMAND: No handler for {:?}", command);
                false
            }
        }
    }
}

impl Default for CommandHandlers<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn test_dispatch_without_handler() {
        let handlers = CommandHandlers::new();
        for command in ControlCommand::ALL {
            assert!(!handlers.dispatch(command));
        }
    }

    #[test]
    fn test_dispatch_invokes_only_matching_handler() {
        let zero = Cell::new(0);
        let reset = Cell::new(0);
        let on_zero = || zero.set(zero.get() + 1);
        let on_reset = || reset.set(reset.get() + 1);

        let mut handlers = CommandHandlers::new();
        handlers.set(ControlCommand::ZeroSensor, &on_zero);
        handlers.set(ControlCommand::ResetZeroing, &on_reset);

        assert!(handlers.dispatch(ControlCommand::ResetZeroing));
        assert_eq!((zero.get(), reset.get()), (0, 1));

        assert!(!handlers.dispatch(ControlCommand::ResetMaxPressure));
        assert_eq!((zero.get(), reset.get()), (0, 1));
    }

    #[test]
    fn test_reregistration_replaces_handler() {
        let first = Cell::new(0);
        let second = Cell::new(0);
        let on_first = || first.set(first.get() + 1);
        let on_second = || second.set(second.get() + 1);

        let mut handlers = CommandHandlers::new();
        handlers.set(ControlCommand::ResetMaxPressure, &on_first);
        handlers.set(ControlCommand::ResetMaxPressure, &on_second);
        handlers.dispatch(ControlCommand::ResetMaxPressure);

        assert_eq!((first.get(), second.get()), (0, 1));
    }

    #[test]
    fn test_clear() {
        let calls = Cell::new(0);
        let on_zero = || calls.set(calls.get() + 1);

        let mut handlers = CommandHandlers::new();
        handlers.set(ControlCommand::ZeroSensor, &on_zero);
        assert!(handlers.is_registered(ControlCommand::ZeroSensor));

        handlers.clear(ControlCommand::ZeroSensor);
        assert!(!handlers.dispatch(ControlCommand::ZeroSensor));
        assert_eq!(calls.get(), 0);
    }
}
