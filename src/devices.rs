//! The interfaces between the chip and the outside world, together with the
//! keyboard state.
use hashbrown::HashMap;
use once_cell::sync::Lazy;

use crate::definitions::{display, keyboard};

#[cfg_attr(test, mockall::automock)]
/// The traits responsible for the display based code
pub trait DisplayCommands {
    /// Flips the pixel at the given position, returns `true` if the pixel
    /// was turned from on to off.
    fn toggle_pixel(&mut self, x: usize, y: usize) -> bool;
    /// Will clear the display
    fn clear(&mut self);
    /// Requests a repaint after a batch of changes
    fn render(&mut self);
}

#[cfg_attr(test, mockall::automock)]
/// The traits responsible for the sound based code, starting and stopping
/// has to be idempotent.
pub trait AudioCommands {
    fn start_tone(&mut self);
    fn stop_tone(&mut self);
    fn is_playing(&self) -> bool;
}

/// An in memory `64x32` monochrome display, usable by headless drivers.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pixels: Vec<Vec<bool>>,
    redraw: bool,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    pub fn new() -> Self {
        Self {
            pixels: vec![vec![false; display::WIDTH]; display::HEIGHT],
            redraw: false,
        }
    }

    /// The pixels row by row.
    pub fn get_pixels(&self) -> &[Vec<bool>] {
        &self.pixels
    }

    /// Returns if a repaint was requested since the last call.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.redraw, false)
    }
}

impl DisplayCommands for Screen {
    fn toggle_pixel(&mut self, x: usize, y: usize) -> bool {
        let pixel = &mut self.pixels[y][x];
        let was_set = *pixel;
        *pixel = !was_set;
        was_set
    }

    fn clear(&mut self) {
        for row in self.pixels.iter_mut() {
            for cell in row.iter_mut() {
                *cell = false;
            }
        }
    }

    fn render(&mut self) {
        self.redraw = true;
    }
}

/// An audio device that only remembers whether it should be sounding.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Silence {
    playing: bool,
}

impl AudioCommands for Silence {
    fn start_tone(&mut self) {
        self.playing = true;
    }

    fn stop_tone(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// maps the external keyboard layout to the internaly given.
static LAYOUT_MAP: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    keyboard::PHYSICAL_LAYOUT
        .iter()
        .flatten()
        .zip(keyboard::LAYOUT.iter().flatten())
        .map(|(&physical, &logical)| (physical, logical))
        .collect()
});

/// Will store the current state of the keyboard.
///
/// Input is done with a hex keyboard that has 16 keys ranging `0-F`. The `8`, `4`, `6`, and
/// `2` keys are typically used for directional input. Three opcodes are used to detect input.
/// One skips an instruction if a specific key is pressed, while another does the same if a
/// specific key is not pressed. The third waits for a key press, and then stores it in one of
/// the data registers.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Keyboard {
    keys: [bool; keyboard::SIZE],
    /// The register waiting for the next key press.
    awaiting: Option<usize>,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Translates a physical key (browser `KeyboardEvent.key` naming) into
    /// the logical key.
    pub fn map_key(key: &str) -> Option<usize> {
        LAYOUT_MAP.get(key.to_ascii_lowercase().as_str()).copied()
    }

    /// Marks the key as pressed, returns the register that was waiting for
    /// a key press if there was one.
    pub fn press(&mut self, key: usize) -> Option<usize> {
        let cell = self.keys.get_mut(key)?;
        *cell = true;
        self.awaiting.take()
    }

    pub fn release(&mut self, key: usize) {
        if let Some(cell) = self.keys.get_mut(key) {
            *cell = false;
        }
    }

    pub fn is_pressed(&self, key: usize) -> bool {
        self.keys.get(key).copied().unwrap_or(false)
    }

    /// Arms the wait for the next key press, which will be stored into the
    /// given register.
    pub fn await_key(&mut self, register: usize) {
        self.awaiting = Some(register);
    }

    pub fn is_waiting(&self) -> bool {
        self.awaiting.is_some()
    }

    pub fn get_keys(&self) -> &[bool] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_key() {
        let expected = [
            ("1", 0x1),
            ("2", 0x2),
            ("3", 0x3),
            ("4", 0xC),
            ("q", 0x4),
            ("w", 0x5),
            ("e", 0x6),
            ("r", 0xD),
            ("a", 0x7),
            ("s", 0x8),
            ("d", 0x9),
            ("f", 0xE),
            ("z", 0xA),
            ("x", 0x0),
            ("c", 0xB),
            ("v", 0xF),
        ];
        for (physical, logical) in expected.iter() {
            assert_eq!(Keyboard::map_key(physical), Some(*logical));
        }
        assert_eq!(Keyboard::map_key("V"), Some(0xF));
        assert_eq!(Keyboard::map_key("p"), None);
        assert_eq!(Keyboard::map_key("Enter"), None);
    }

    #[test]
    fn test_press_release() {
        let mut keyboard = Keyboard::new();
        assert_eq!(keyboard.press(0x7), None);
        assert!(keyboard.is_pressed(0x7));
        assert!(!keyboard.is_pressed(0x8));

        keyboard.release(0x7);
        assert!(!keyboard.is_pressed(0x7));

        // out of range keys are ignored
        assert_eq!(keyboard.press(0x10), None);
        keyboard.release(0x10);
        assert!(!keyboard.is_pressed(0x10));
    }

    #[test]
    fn test_await_key() {
        let mut keyboard = Keyboard::new();
        keyboard.await_key(0xA);
        assert!(keyboard.is_waiting());

        // an unknown key doesn't resolve the wait
        assert_eq!(keyboard.press(0x42), None);
        assert!(keyboard.is_waiting());

        assert_eq!(keyboard.press(0x7), Some(0xA));
        assert!(!keyboard.is_waiting());
        assert_eq!(keyboard.press(0x7), None);
    }

    #[test]
    fn test_screen_toggle() {
        let mut screen = Screen::new();
        assert!(!screen.toggle_pixel(3, 4));
        assert!(screen.get_pixels()[4][3]);
        assert!(screen.toggle_pixel(3, 4));
        assert!(!screen.get_pixels()[4][3]);

        screen.toggle_pixel(display::WIDTH - 1, display::HEIGHT - 1);
        screen.clear();
        assert!(screen.get_pixels().iter().flatten().all(|&p| !p));

        assert!(!screen.take_redraw());
        screen.render();
        assert!(screen.take_redraw());
        assert!(!screen.take_redraw());
    }
}
