//! Operator input seam.
//!
//! Commands consume operator input through the [`OperatorInput`] trait:
//! semantic queries (cancel requested, heading reset, rotate target), not
//! raw buttons. The raw side is a [`GamepadState`] snapshot plus an
//! [`InputMap`] describing one controller model, so supporting a new
//! gamepad is a mapping-table entry rather than a new type.
//!
//! Input is polled exactly once per tick, before any command runs; all
//! getters return tick-stable values.

use bitflags::bitflags;

/// One joystick's deflection, each axis in [-1.0, 1.0].
///
/// Joystick convention: pushing forward gives a negative `y`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StickPosition {
    pub x: f64,
    pub y: f64,
}

impl StickPosition {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

bitflags! {
    /// Gamepad button states, one bit per button.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u16 {
        const A           = 0x0001;
        const B           = 0x0002;
        const X           = 0x0004;
        const Y           = 0x0008;
        const LEFT_BUMPER  = 0x0010;
        const RIGHT_BUMPER = 0x0020;
        const BACK        = 0x0040;
        const START       = 0x0080;
        const LEFT_STICK  = 0x0100;
        const RIGHT_STICK = 0x0200;
    }
}

/// Raw controller snapshot for one poll.
///
/// `axes` indices are controller-model specific; the [`InputMap`] knows
/// which index is which. `pov` is the hat angle in degrees when pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadState {
    pub axes: [f64; 6],
    pub buttons: Buttons,
    pub pov: Option<u16>,
}

/// Source of raw gamepad snapshots (the HID layer, out of scope here).
pub trait GamepadSource {
    fn read(&self) -> GamepadState;
}

/// Per-model mapping from raw controller state to semantic actions.
#[derive(Debug, Clone, Copy)]
pub struct InputMap {
    /// Axis indices for the left stick (x, y).
    pub left_axes: (usize, usize),
    /// Axis indices for the right stick (x, y).
    pub right_axes: (usize, usize),
    /// Button that cancels the running command.
    pub cancel: Buttons,
    /// Button that re-zeroes the robot heading.
    pub reset_heading: Buttons,
    /// Button that toggles the drive speed PIDs.
    pub speed_pid_toggle: Buttons,
}

impl InputMap {
    /// XInput-style controller (Xbox layout).
    pub const fn xbox() -> Self {
        Self {
            left_axes: (0, 1),
            right_axes: (4, 5),
            cancel: Buttons::BACK,
            reset_heading: Buttons::START,
            speed_pid_toggle: Buttons::LEFT_BUMPER,
        }
    }

    /// Logitech F310 in DirectInput mode.
    pub const fn logitech() -> Self {
        Self {
            left_axes: (0, 1),
            right_axes: (2, 3),
            cancel: Buttons::BACK,
            reset_heading: Buttons::START,
            speed_pid_toggle: Buttons::LEFT_BUMPER,
        }
    }
}

/// Semantic operator input, polled once per tick before commands run.
pub trait OperatorInput {
    /// Take one input snapshot. Called exactly once per tick; all other
    /// methods return values from the most recent poll.
    fn poll(&mut self);

    /// Left drive stick position.
    fn left_stick(&self) -> StickPosition;

    /// Right drive stick position.
    fn right_stick(&self) -> StickPosition;

    /// Operator pressed the cancel control since the previous poll.
    fn cancel_requested(&self) -> bool;

    /// Operator pressed the heading-reset control since the previous poll.
    fn reset_heading_requested(&self) -> bool;

    /// Operator pressed the speed-PID toggle since the previous poll.
    fn speed_pid_toggle_pressed(&self) -> bool;

    /// Requested rotate-to target heading in degrees, if any (POV hat).
    fn rotate_target(&self) -> Option<f64>;
}

/// [`OperatorInput`] over a raw [`GamepadSource`] and an [`InputMap`].
///
/// Button presses are edge-detected across polls: a press held over many
/// ticks reports `true` only on the tick after it went down.
pub struct MappedGamepad<S: GamepadSource> {
    source: S,
    map: InputMap,
    current: GamepadState,
    pressed: Buttons,
    prev_buttons: Buttons,
}

impl<S: GamepadSource> MappedGamepad<S> {
    pub fn new(source: S, map: InputMap) -> Self {
        Self {
            source,
            map,
            current: GamepadState::default(),
            pressed: Buttons::empty(),
            prev_buttons: Buttons::empty(),
        }
    }

    fn axis(&self, index: usize) -> f64 {
        self.current.axes.get(index).copied().unwrap_or(0.0)
    }
}

impl<S: GamepadSource> OperatorInput for MappedGamepad<S> {
    fn poll(&mut self) {
        self.current = self.source.read();
        let prev = std::mem::replace(&mut self.prev_buttons, self.current.buttons);
        self.pressed = self.current.buttons & !prev;
    }

    fn left_stick(&self) -> StickPosition {
        StickPosition::new(self.axis(self.map.left_axes.0), self.axis(self.map.left_axes.1))
    }

    fn right_stick(&self) -> StickPosition {
        StickPosition::new(
            self.axis(self.map.right_axes.0),
            self.axis(self.map.right_axes.1),
        )
    }

    fn cancel_requested(&self) -> bool {
        self.pressed.intersects(self.map.cancel)
    }

    fn reset_heading_requested(&self) -> bool {
        self.pressed.intersects(self.map.reset_heading)
    }

    fn speed_pid_toggle_pressed(&self) -> bool {
        self.pressed.intersects(self.map.speed_pid_toggle)
    }

    fn rotate_target(&self) -> Option<f64> {
        self.current.pov.map(f64::from)
    }
}
