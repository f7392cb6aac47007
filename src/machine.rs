use crate::error::{Error, Result};

pub const MEMORY_SIZE: usize = 0x1000;
pub const ROM_START: u16 = 0x200;
pub const STACK_DEPTH: usize = 16;
pub const KEY_COUNT: usize = 0x10;
pub const DEFAULT_DISPLAY_WIDTH: usize = 64;
pub const DEFAULT_DISPLAY_HEIGHT: usize = 32;

const GLYPH_HEIGHT: usize = 5;

// Built-in hexadecimal font, glyph d at offset 5*d.
const FONT: [u8; 0x10 * GLYPH_HEIGHT] = [
    0xf0, 0x90, 0x90, 0x90, 0xf0,
    0x20, 0x60, 0x20, 0x20, 0x70,
    0xf0, 0x10, 0xf0, 0x80, 0xf0,
    0xf0, 0x10, 0xf0, 0x10, 0xf0,
    0x90, 0x90, 0xf0, 0x10, 0x10,
    0xf0, 0x80, 0xf0, 0x10, 0xf0,
    0xf0, 0x80, 0xf0, 0x90, 0xf0,
    0xf0, 0x10, 0x20, 0x40, 0x40,
    0xf0, 0x90, 0xf0, 0x90, 0xf0,
    0xf0, 0x90, 0xf0, 0x10, 0xf0,
    0xf0, 0x90, 0xf0, 0x90, 0x90,
    0xe0, 0x90, 0xe0, 0x90, 0xe0,
    0xf0, 0x80, 0x80, 0x80, 0xf0,
    0xe0, 0x90, 0x90, 0x90, 0xe0,
    0xf0, 0x80, 0xf0, 0x80, 0xf0,
    0xf0, 0x80, 0xf0, 0x80, 0x80,
];

/// Sub-state of the blocking key-read instruction (FX0A). The instruction
/// first waits for any key to go down, latches it, then waits for that same
/// key to come back up before writing it to `v[dest]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyWait {
    pub dest: usize,
    pub latched: Option<u8>,
}

/// All CPU state, exclusively owned by the run loop. The interpreter and the
/// frame scheduler mutate it; the host only reads the display and writes the
/// keypad between frames.
pub struct Machine {
    pub(crate) memory: [u8; MEMORY_SIZE],
    pub(crate) v: [u8; 16],
    pub(crate) i: u16,
    pub(crate) pc: u16,
    pub(crate) stack: [u16; STACK_DEPTH],
    pub(crate) sp: usize,
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,
    pub(crate) keypad: [bool; KEY_COUNT],
    pub(crate) wait_key: Option<KeyWait>,
    display: Vec<bool>,
    width: usize,
    height: usize,
}

impl Machine {
    pub fn new(width: usize, height: usize) -> Self {
        // the draw path takes coordinates mod width/height, so neither
        // dimension may be zero
        let width = width.max(1);
        let height = height.max(1);
        let mut memory = [0u8; MEMORY_SIZE];
        memory[..FONT.len()].copy_from_slice(&FONT);

        Self {
            memory,
            v: [0; 16],
            i: 0,
            pc: ROM_START,
            stack: [0; STACK_DEPTH],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            keypad: [false; KEY_COUNT],
            wait_key: None,
            display: vec![false; width * height],
            width,
            height,
        }
    }

    /// Places the program bytes verbatim at the entry point. Rejects images
    /// that do not fit; a rejected machine is never started.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        let max = MEMORY_SIZE - ROM_START as usize;
        if rom.len() > max {
            return Err(Error::RomTooLarge { size: rom.len() });
        }
        let start = ROM_START as usize;
        self.memory[start..start + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    pub fn set_key(&mut self, key: usize, pressed: bool) {
        if key < KEY_COUNT {
            self.keypad[key] = pressed;
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x < self.width && y < self.height {
            self.display[y * self.width + x]
        } else {
            false
        }
    }

    pub fn is_tone_on(&self) -> bool {
        self.sound_timer != 0
    }

    pub(crate) fn clear_display(&mut self) {
        self.display.fill(false);
    }

    /// XORs one 8-bit sprite row into the display, MSB leftmost. Columns past
    /// the right edge are clipped, not wrapped. Returns true if any lit pixel
    /// was toggled off.
    pub(crate) fn blit_row(&mut self, x: usize, y: usize, bits: u8) -> bool {
        let mut collision = false;
        if y >= self.height {
            return false;
        }
        for bit in 0..8 {
            let col = x + bit;
            if col >= self.width {
                break;
            }
            if bits & (0x80 >> bit) != 0 {
                let cell = &mut self.display[y * self.width + col];
                collision |= *cell;
                *cell = !*cell;
            }
        }
        collision
    }

    pub(crate) fn push(&mut self, addr: u16) -> Result<()> {
        if self.sp >= STACK_DEPTH {
            return Err(Error::StackOverflow);
        }
        self.stack[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Result<u16> {
        if self.sp == 0 {
            return Err(Error::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.stack[self.sp])
    }

    /// One 60 Hz tick: both timers count down by at most 1, never below 0.
    pub(crate) fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}
