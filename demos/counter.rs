//! Counter demo - reactive state driving incremental repaints.
//!
//! A click anywhere increments the counter; the label re-measures and the
//! accent panel re-tints, each through its own observe binding. Press `q`
//! to quit.
//!
//! Run with: cargo run --example counter

use std::io;
use std::time::{Duration, Instant};

use kindling::host::{self, TerminalSurface};
use kindling::{
    fill, label, Behavior, Element, FrameClock, InputEvent, Interaction, KeyEvent, MouseEvent,
    Mutable, Rgba, Root, Value,
};

/// Captures the press so the release stays ours, then increments on tap.
struct Tap {
    count: Mutable<i64>,
}

impl Interaction for Tap {
    fn released(&mut self, _event: &MouseEvent) {
        self.count.update(self.count.current() + 1);
    }
}

/// Full-surface click target that also owns the quit key.
struct ClickSurface {
    count: Mutable<i64>,
    running: Mutable<bool>,
}

impl Behavior for ClickSurface {
    fn mouse_down(&mut self, _element: &Element, _event: &MouseEvent) -> Option<Box<dyn Interaction>> {
        Some(Box::new(Tap {
            count: self.count.clone(),
        }))
    }

    fn key_down(&mut self, _element: &Element, event: &KeyEvent) -> bool {
        if event.key == "q" {
            self.running.update(false);
            return true;
        }
        false
    }
}

fn main() -> io::Result<()> {
    let count = Mutable::new(0i64);
    let running = Mutable::new(true);

    let mut surface = TerminalSurface::new()?;
    surface.enter_fullscreen()?;
    let mut root = Root::new(surface);

    // Content, bottom to top: an accent wash tinted by the count, then the
    // caption (the stack root sizes each layer to the full surface).
    root.element().add_child(fill(count.map(|c| {
        let t = ((c % 32) as f32) / 32.0;
        Rgba::lerp(Rgba::from_rgb_int(0x282a36), Rgba::from_rgb_int(0x44475a), t)
    })));
    root.element().add_child(label(
        count.map(|c| format!("count: {c}   (click to increment, q to quit)")),
        Value::constant(Rgba::from_rgb_int(0xf8f8f2)),
    ));

    // Topmost: the transparent click/key surface.
    let clicks = Element::new(ClickSurface {
        count: count.clone(),
        running: running.clone(),
    });
    root.element().add_child(clicks.clone());
    root.set_focus(Some(clicks));

    let started = Instant::now();
    let mut previous = Duration::ZERO;
    let mut tick = 0u64;
    while running.current() {
        if let Some(event) = host::poll_event(Duration::from_millis(16))? {
            match event {
                InputEvent::Resize(width, height) => root.surface_mut().resize(width, height),
                event => root.dispatch(event),
            }
        }
        let elapsed = started.elapsed();
        root.update(FrameClock::new(tick, elapsed, elapsed - previous));
        previous = elapsed;
        tick += 1;
    }

    root.surface_mut().exit_fullscreen()
}
