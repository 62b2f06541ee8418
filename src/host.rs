//! Terminal host - a crossterm-backed reference surface.
//!
//! Rasterizes the toolkit's paint commands into a cell grid (one surface
//! unit = one terminal cell) and presents differentially: only cells that
//! changed since the previous frame are written, inside a synchronized
//! update block, flushed in one syscall. A resize or corruption drops the
//! previous frame and forces a full redraw.
//!
//! Also translates crossterm input events into the toolkit's
//! [`InputEvent`] vocabulary for the root to dispatch.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    poll, read, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode,
    KeyEvent as CrosstermKeyEvent, KeyEventKind, KeyModifiers,
    MouseButton as CrosstermMouseButton, MouseEvent as CrosstermMouseEvent, MouseEventKind,
};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, size as terminal_size, BeginSynchronizedUpdate, Clear,
    ClearType, EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use unicode_width::UnicodeWidthChar;

use crate::input::{
    InputEvent, KeyEvent, KeyState, Modifiers, MouseAction, MouseButton, MouseEvent,
    ScrollDirection, ScrollInfo,
};
use crate::render::{Canvas, Surface};
use crate::types::{Point, Rect, Rgba, Size};

// =============================================================================
// Cell grid
// =============================================================================

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgba,
    pub bg: Rgba,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Rgba::WHITE,
            bg: Rgba::BLACK,
        }
    }
}

/// The rasterization target: a width x height grid of cells.
pub struct CellBuffer {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl CellBuffer {
    /// Create a buffer of default cells.
    pub fn new(width: i32, height: i32) -> Self {
        let count = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width: width.max(0),
            height: height.max(0),
            cells: vec![Cell::default(); count],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Resize and reset to default cells.
    pub fn resize(&mut self, width: i32, height: i32) {
        *self = Self::new(width, height);
    }

    /// The cell at (x, y), if in bounds.
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get((y * self.width + x) as usize)
    }

    fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get_mut((y * self.width + x) as usize)
    }

    fn clip(&self, rect: Rect) -> Rect {
        rect.intersect(&Rect::new(0, 0, self.width, self.height))
    }
}

impl Canvas for CellBuffer {
    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let target = self.clip(rect);
        for y in target.y..target.bottom() {
            for x in target.x..target.right() {
                if let Some(cell) = self.get_mut(x, y) {
                    cell.bg = Rgba::blend(color, cell.bg);
                    cell.ch = ' ';
                }
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba) {
        let target = self.clip(rect);
        if target.is_empty() {
            return;
        }
        for x in target.x..target.right() {
            for (y, ch) in [(target.y, '─'), (target.bottom() - 1, '─')] {
                if let Some(cell) = self.get_mut(x, y) {
                    cell.ch = ch;
                    cell.fg = color;
                }
            }
        }
        for y in target.y..target.bottom() {
            for x in [target.x, target.right() - 1] {
                if let Some(cell) = self.get_mut(x, y) {
                    cell.ch = '│';
                    cell.fg = color;
                }
            }
        }
        for (x, y, ch) in [
            (target.x, target.y, '┌'),
            (target.right() - 1, target.y, '┐'),
            (target.x, target.bottom() - 1, '└'),
            (target.right() - 1, target.bottom() - 1, '┘'),
        ] {
            if let Some(cell) = self.get_mut(x, y) {
                cell.ch = ch;
                cell.fg = color;
            }
        }
    }

    fn draw_text(&mut self, origin: Point, text: &str, color: Rgba) {
        let mut x = origin.x;
        for ch in text.chars() {
            let advance = UnicodeWidthChar::width(ch).unwrap_or(0) as i32;
            if advance == 0 {
                continue;
            }
            if let Some(cell) = self.get_mut(x, origin.y) {
                cell.ch = ch;
                cell.fg = color;
            }
            // A wide char spills into its continuation cell.
            if advance == 2 {
                if let Some(cell) = self.get_mut(x + 1, origin.y) {
                    cell.ch = ' ';
                    cell.fg = color;
                }
            }
            x += advance;
        }
    }
}

/// Cells in `region` that differ from the previous frame.
///
/// With no previous frame (or a size mismatch) every cell in the region is
/// reported.
fn changed_cells(previous: Option<&CellBuffer>, current: &CellBuffer, region: Rect) -> Vec<(i32, i32)> {
    let target = current.clip(region);
    let mut changed = Vec::new();
    let comparable = previous
        .filter(|prev| prev.width == current.width && prev.height == current.height);
    for y in target.y..target.bottom() {
        for x in target.x..target.right() {
            let same = match comparable {
                Some(prev) => prev.get(x, y) == current.get(x, y),
                None => false,
            };
            if !same {
                changed.push((x, y));
            }
        }
    }
    changed
}

// =============================================================================
// Terminal surface
// =============================================================================

/// A terminal-backed [`Surface`] with differential present.
pub struct TerminalSurface {
    buffer: CellBuffer,
    previous: Option<CellBuffer>,
    fullscreen: bool,
}

impl TerminalSurface {
    /// Create a surface sized to the current terminal.
    pub fn new() -> io::Result<Self> {
        let (width, height) = terminal_size()?;
        Ok(Self {
            buffer: CellBuffer::new(width as i32, height as i32),
            previous: None,
            fullscreen: false,
        })
    }

    /// Enter raw mode and the alternate screen, with mouse capture.
    pub fn enter_fullscreen(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            Hide,
            Clear(ClearType::All)
        )?;
        self.fullscreen = true;
        self.invalidate();
        Ok(())
    }

    /// Leave the alternate screen and restore the terminal.
    pub fn exit_fullscreen(&mut self) -> io::Result<()> {
        execute!(
            io::stdout(),
            ResetColor,
            Show,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        disable_raw_mode()?;
        self.fullscreen = false;
        Ok(())
    }

    /// Resize the cell grid (called on a host resize event). Forces a full
    /// redraw on the next present.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.buffer.resize(width, height);
        self.invalidate();
    }

    /// Drop the previous frame; the next present redraws every cell.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Direct access to the cell grid.
    pub fn buffer(&self) -> &CellBuffer {
        &self.buffer
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> Size {
        Size::new(self.buffer.width, self.buffer.height)
    }

    fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.buffer
    }

    fn present(&mut self, region: Rect) -> io::Result<()> {
        // A full redraw is pending: ignore the region and flush everything.
        let target = if self.previous.is_none() {
            Rect::new(0, 0, self.buffer.width, self.buffer.height)
        } else {
            region
        };

        let changed = changed_cells(self.previous.as_ref(), &self.buffer, target);
        if !changed.is_empty() {
            let mut out = io::stdout();
            queue!(out, BeginSynchronizedUpdate)?;
            for (x, y) in changed {
                let cell = *self.buffer.get(x, y).expect("changed cell in bounds");
                queue!(
                    out,
                    MoveTo(x as u16, y as u16),
                    SetForegroundColor(to_color(cell.fg)),
                    SetBackgroundColor(to_color(cell.bg)),
                    Print(cell.ch)
                )?;
            }
            queue!(out, EndSynchronizedUpdate)?;
            out.flush()?;
        }

        self.previous = Some(CellBuffer {
            width: self.buffer.width,
            height: self.buffer.height,
            cells: self.buffer.cells.clone(),
        });
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        if self.fullscreen {
            // Best effort: never leave the terminal in raw mode.
            let _ = self.exit_fullscreen();
        }
    }
}

fn to_color(color: Rgba) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

// =============================================================================
// Event translation
// =============================================================================

/// Wait up to `timeout` for one input event.
pub fn poll_event(timeout: Duration) -> io::Result<Option<InputEvent>> {
    if !poll(timeout)? {
        return Ok(None);
    }
    Ok(convert_event(read()?))
}

/// Convert a crossterm event into the toolkit's vocabulary.
pub fn convert_event(event: CrosstermEvent) -> Option<InputEvent> {
    match event {
        CrosstermEvent::Mouse(mouse) => Some(InputEvent::Mouse(convert_mouse_event(mouse))),
        CrosstermEvent::Key(key) => convert_key_event(key).map(InputEvent::Key),
        CrosstermEvent::Resize(width, height) => {
            Some(InputEvent::Resize(width as i32, height as i32))
        }
        _ => None,
    }
}

fn convert_mouse_event(event: CrosstermMouseEvent) -> MouseEvent {
    let position = Point::new(event.column as i32, event.row as i32);
    let (action, button) = match event.kind {
        MouseEventKind::Down(button) => (MouseAction::Down, convert_mouse_button(button)),
        MouseEventKind::Up(button) => (MouseAction::Up, convert_mouse_button(button)),
        // Captured interactions only care that the pointer moved.
        MouseEventKind::Drag(_) | MouseEventKind::Moved => (MouseAction::Move, MouseButton::None),
        MouseEventKind::ScrollUp
        | MouseEventKind::ScrollDown
        | MouseEventKind::ScrollLeft
        | MouseEventKind::ScrollRight => (MouseAction::Scroll, MouseButton::None),
    };

    let scroll = match event.kind {
        MouseEventKind::ScrollUp => Some(ScrollDirection::Up),
        MouseEventKind::ScrollDown => Some(ScrollDirection::Down),
        MouseEventKind::ScrollLeft => Some(ScrollDirection::Left),
        MouseEventKind::ScrollRight => Some(ScrollDirection::Right),
        _ => None,
    }
    .map(|direction| ScrollInfo {
        direction,
        delta: 1,
    });

    MouseEvent {
        action,
        button,
        position,
        modifiers: convert_modifiers(event.modifiers),
        scroll,
    }
}

fn convert_mouse_button(button: CrosstermMouseButton) -> MouseButton {
    match button {
        CrosstermMouseButton::Left => MouseButton::Left,
        CrosstermMouseButton::Middle => MouseButton::Middle,
        CrosstermMouseButton::Right => MouseButton::Right,
    }
}

fn convert_key_event(event: CrosstermKeyEvent) -> Option<KeyEvent> {
    let key = match event.code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Insert => "Insert".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => return None,
    };

    let state = match event.kind {
        KeyEventKind::Press => KeyState::Press,
        KeyEventKind::Repeat => KeyState::Repeat,
        KeyEventKind::Release => KeyState::Release,
    };

    Some(KeyEvent {
        key,
        modifiers: convert_modifiers(event.modifiers),
        state,
    })
}

fn convert_modifiers(modifiers: KeyModifiers) -> Modifiers {
    let mut result = Modifiers::NONE;
    if modifiers.contains(KeyModifiers::SHIFT) {
        result |= Modifiers::SHIFT;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        result |= Modifiers::CTRL;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        result |= Modifiers::ALT;
    }
    if modifiers.contains(KeyModifiers::SUPER) {
        result |= Modifiers::META;
    }
    result
}

// =============================================================================
// Tests
// =============================================================================
