//! Pointer and keyboard input for the frame loop.
//!
//! Events may be produced on any thread through an [`InputSender`]. The frame
//! loop owns the [`InputQueue`] and the [`InputState`], draining all pending
//! events at the start of each frame so every component sees one coherent
//! snapshot.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

/// Key held for mow mode.
pub const MOW_KEY: char = 't';

/// Key held for free-orbit camera mode.
pub const ORBIT_KEY: char = 'g';

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Input event. Pointer coordinates are normalized device coordinates
/// ([-1, 1] on both axes, +y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerMove { x: f32, y: f32 },
    ButtonDown { button: MouseButton },
    ButtonUp { button: MouseButton },
    Scroll { delta: f32 },
    Key { key: char, pressed: bool },
    Resize { width: u32, height: u32 },
}

/// Input snapshot read by the frame pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    /// Last pointer position, `None` until the pointer first moves
    pub pointer: Option<Vec2>,
    /// Primary button held
    pub drag_active: bool,
    /// Mow key held
    pub mow_mode: bool,
    /// Orbit key held
    pub orbit_mode: bool,
    /// Pointer movement this frame while the primary button was held
    pub drag_delta: Vec2,
    /// Scroll steps this frame
    pub scroll: f32,
    /// Latest viewport size reported this frame
    pub resize: Option<(u32, u32)>,
}

impl InputState {
    /// Clear per-frame accumulators. Held buttons and keys persist.
    pub fn begin_frame(&mut self) {
        self.drag_delta = Vec2::ZERO;
        self.scroll = 0.0;
        self.resize = None;
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMove { x, y } => {
                let position = Vec2::new(x, y);
                if let (true, Some(previous)) = (self.drag_active, self.pointer) {
                    self.drag_delta += position - previous;
                }
                self.pointer = Some(position);
            }
            InputEvent::ButtonDown { button: MouseButton::Left } => self.drag_active = true,
            InputEvent::ButtonUp { button: MouseButton::Left } => self.drag_active = false,
            InputEvent::ButtonDown { .. } | InputEvent::ButtonUp { .. } => {}
            InputEvent::Scroll { delta } => self.scroll += delta,
            InputEvent::Key { key, pressed } => match key.to_ascii_lowercase() {
                MOW_KEY => self.mow_mode = pressed,
                ORBIT_KEY => self.orbit_mode = pressed,
                _ => {}
            },
            InputEvent::Resize { width, height } => self.resize = Some((width, height)),
        }
    }

    /// Whether pointer drags should sculpt this frame.
    pub fn sculpting(&self) -> bool {
        self.drag_active && !self.orbit_mode
    }
}

/// Sending half of the input channel. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: mpsc::UnboundedSender<InputEvent>,
}

impl InputSender {
    /// Queue an event. Returns false once the frame loop has shut down.
    pub fn send(&self, event: InputEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, owned by the frame loop.
#[derive(Debug)]
pub struct InputQueue {
    rx: mpsc::UnboundedReceiver<InputEvent>,
}

impl InputQueue {
    /// Apply every pending event to `state`, after clearing its per-frame
    /// accumulators. Returns the number of events applied.
    pub fn drain_into(&mut self, state: &mut InputState) -> usize {
        state.begin_frame();
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            state.apply(event);
            applied += 1;
        }
        if applied > 0 {
            trace!(applied, "Drained input events");
        }
        applied
    }
}

/// Create a connected sender/queue pair.
pub fn input_channel() -> (InputSender, InputQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InputSender { tx }, InputQueue { rx })
}
