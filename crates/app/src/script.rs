//! Scripted input producer
//!
//! Stands in for a windowing system: a background thread replays a fixed
//! sequence of pointer and key events into the frame loop's input queue.

use planet_config::DisplayConfig;
use sculpting::{InputEvent, InputSender, MouseButton};
use std::f32::consts::TAU;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info};

/// Events delivered together, followed by a pause
pub type ScriptStep = Vec<InputEvent>;

/// Pointer move at a pixel position (origin top-left)
fn pointer_at(display: &DisplayConfig, x: f32, y: f32) -> InputEvent {
    let (x, y) = display.pixel_to_ndc(x, y);
    InputEvent::PointerMove { x, y }
}

/// Pointer circling the viewport centre, `radius` in pixels
fn pointer_circle(
    display: &DisplayConfig,
    steps: usize,
    radius: f32,
) -> impl Iterator<Item = ScriptStep> {
    let cx = display.width as f32 * 0.5;
    let cy = display.height as f32 * 0.5;
    (0..steps).map(move |i| {
        let angle = i as f32 / steps as f32 * TAU;
        vec![pointer_at(display, cx + radius * angle.cos(), cy + radius * angle.sin())]
    })
}

fn key(key: char, pressed: bool) -> InputEvent {
    InputEvent::Key { key, pressed }
}

/// Hover, sculpt, mow, then orbit the camera
pub fn demo_script() -> Vec<ScriptStep> {
    let press = InputEvent::ButtonDown {
        button: MouseButton::Left,
    };
    let release = InputEvent::ButtonUp {
        button: MouseButton::Left,
    };

    let display = DisplayConfig::new(1280, 720);
    let mut steps = Vec::new();
    steps.push(vec![InputEvent::Resize {
        width: display.width,
        height: display.height,
    }]);
    steps.extend(pointer_circle(&display, 30, 72.0));

    steps.push(vec![press]);
    steps.extend(pointer_circle(&display, 60, 54.0));
    steps.push(vec![release]);

    steps.push(vec![key('t', true), press]);
    steps.extend(pointer_circle(&display, 40, 90.0));
    steps.push(vec![release, key('t', false)]);

    steps.push(vec![key('g', true), press]);
    steps.extend((0..30).map(|i| vec![pointer_at(&display, 800.0 + i as f32 * 6.4, 360.0)]));
    steps.push(vec![release, key('g', false)]);
    steps.push(vec![InputEvent::Scroll { delta: 1.0 }]);
    steps
}

/// Replay `steps` on a background thread, one step per `interval`.
///
/// Returns the number of events delivered. Stops early once the frame loop
/// drops its queue.
pub fn spawn_script(sender: InputSender, steps: Vec<ScriptStep>, interval: Duration) -> JoinHandle<usize> {
    std::thread::spawn(move || {
        let mut delivered = 0;
        for step in steps {
            for event in step {
                if !sender.send(event) {
                    debug!(delivered, "Input queue closed, stopping script");
                    return delivered;
                }
                delivered += 1;
            }
            std::thread::sleep(interval);
        }
        info!(delivered, "Input script finished");
        delivered
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sculpting::{input_channel, InputState};

    #[test]
    fn test_demo_script_leaves_no_key_held() {
        let mut state = InputState::default();
        for event in demo_script().into_iter().flatten() {
            state.apply(event);
        }
        assert!(!state.drag_active);
        assert!(!state.mow_mode);
        assert!(!state.orbit_mode);
    }

    #[test]
    fn test_demo_script_stays_inside_viewport() {
        for event in demo_script().into_iter().flatten() {
            if let InputEvent::PointerMove { x, y } = event {
                assert!((-1.0..=1.0).contains(&x) && (-1.0..=1.0).contains(&y));
            }
        }
    }

    #[test]
    fn test_script_delivers_all_events() {
        let (sender, mut queue) = input_channel();
        let steps = vec![vec![key('t', true)], vec![key('t', false), key('g', true)]];
        let delivered = spawn_script(sender, steps, Duration::ZERO).join().unwrap();
        assert_eq!(delivered, 3);

        let mut state = InputState::default();
        assert_eq!(queue.drain_into(&mut state), 3);
        assert!(state.orbit_mode && !state.mow_mode);
    }

    #[test]
    fn test_script_stops_when_queue_dropped() {
        let (sender, queue) = input_channel();
        drop(queue);
        let delivered = spawn_script(sender, demo_script(), Duration::ZERO).join().unwrap();
        assert_eq!(delivered, 0);
    }
}
