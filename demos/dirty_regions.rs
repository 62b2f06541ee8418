//! Dirty-region demo - watch repaint stay proportional to change.
//!
//! A panel bounces across the screen; each frame only the union of its old
//! and new bounds is repainted (the `set_bounds` dirt accounting), while
//! the static caption repaints only when its text actually changes. Press
//! `q` or Escape to quit.
//!
//! Run with: cargo run --example dirty_regions

use std::io;
use std::time::{Duration, Instant};

use kindling::host::{self, TerminalSurface};
use kindling::{
    fill, label, Element, FrameClock, InputEvent, Mutable, Rect, Rgba, Root, Size, Value,
};

fn main() -> io::Result<()> {
    let mut surface = TerminalSurface::new()?;
    surface.enter_fullscreen()?;
    let mut root = Root::with_element(surface, Element::empty());

    let caption = Mutable::new(String::from("dirty regions: q to quit"));
    let caption_label = label(caption.as_value(), Value::constant(Rgba::from_rgb_int(0x8be9fd)));
    caption_label.set_bounds(Rect::new(1, 0, 60, 1));
    root.element().add_child(caption_label);

    let panel = fill(Value::constant(Rgba::from_rgb_int(0x50fa7b)));
    let panel_size = Size::new(12, 4);
    panel.set_bounds(Rect::new(1, 2, panel_size.width, panel_size.height));
    root.element().add_child(panel.clone());

    // Bounce the panel; set_bounds dirties vacated + occupied area only.
    let mut position = (1i32, 2i32);
    let mut velocity = (1i32, 1i32);
    let mut step = {
        let panel = panel.clone();
        let caption = caption.clone();
        move |bounds_in: Size| {
            let max_x = (bounds_in.width - panel_size.width).max(1);
            let max_y = (bounds_in.height - panel_size.height).max(3);
            position.0 += velocity.0;
            position.1 += velocity.1;
            if position.0 <= 0 || position.0 >= max_x {
                velocity.0 = -velocity.0;
                position.0 = position.0.clamp(0, max_x);
            }
            if position.1 <= 2 || position.1 >= max_y {
                velocity.1 = -velocity.1;
                position.1 = position.1.clamp(2, max_y);
            }
            panel.set_bounds(Rect::new(
                position.0,
                position.1,
                panel_size.width,
                panel_size.height,
            ));
            caption.update(format!(
                "dirty regions: panel at {},{}  (q to quit)",
                position.0, position.1
            ));
        }
    };

    let started = Instant::now();
    let mut previous = Duration::ZERO;
    let mut tick = 0u64;
    loop {
        if let Some(event) = host::poll_event(Duration::from_millis(33))? {
            match event {
                InputEvent::Key(key) if key.key == "q" || key.key == "Escape" => break,
                InputEvent::Resize(width, height) => root.surface_mut().resize(width, height),
                event => root.dispatch(event),
            }
        }

        step(root.element().bounds().size());
        let elapsed = started.elapsed();
        root.update(FrameClock::new(tick, elapsed, elapsed - previous));
        previous = elapsed;
        tick += 1;
    }

    root.surface_mut().exit_fullscreen()
}
