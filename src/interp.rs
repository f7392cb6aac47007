use crate::error::{Error, Result};
use crate::instruction::Instruction;
use crate::machine::{KeyWait, Machine, MEMORY_SIZE};
use crate::quirks::QuirkProfile;

/// What a single `step` call did to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One instruction was fetched and executed.
    Executed,
    /// The machine is parked on the blocking key read; no fetch happened.
    Waiting,
}

/// Executes one instruction per `step` call. Holds the immutable quirk
/// profile and the random source; all mutable state lives in `Machine`.
pub struct Interpreter {
    quirks: QuirkProfile,
    random: fn() -> u8,
}

impl Interpreter {
    pub fn new(quirks: QuirkProfile, random: fn() -> u8) -> Self {
        Self { quirks, random }
    }

    /// Fetch two bytes at PC, advance PC by 2 before dispatch, then execute.
    /// While the blocking key read is pending, PC stays put and no fetch
    /// happens until the latched key is released.
    pub fn step(&self, m: &mut Machine) -> Result<StepOutcome> {
        if m.wait_key.is_some() {
            return Ok(self.poll_wait_key(m));
        }

        let pc = m.pc as usize;
        if pc + 1 >= MEMORY_SIZE {
            return Err(Error::OutOfRange { addr: m.pc });
        }
        let opcode = u16::from_be_bytes([m.memory[pc], m.memory[pc + 1]]);
        m.pc = m.pc.wrapping_add(2);

        self.execute(m, Instruction::decode(opcode))?;

        if m.wait_key.is_some() {
            Ok(StepOutcome::Waiting)
        } else {
            Ok(StepOutcome::Executed)
        }
    }

    /// FX0A wait logic: latch the first key that goes down, complete once it
    /// comes back up. The host refreshes the keypad snapshot between frames.
    fn poll_wait_key(&self, m: &mut Machine) -> StepOutcome {
        let Some(mut wait) = m.wait_key.take() else {
            return StepOutcome::Executed;
        };
        match wait.latched {
            None => {
                if let Some(key) = m.keypad.iter().position(|&pressed| pressed) {
                    wait.latched = Some(key as u8);
                }
                m.wait_key = Some(wait);
                StepOutcome::Waiting
            }
            Some(key) if m.keypad[key as usize] => {
                m.wait_key = Some(wait);
                StepOutcome::Waiting
            }
            Some(key) => {
                m.v[wait.dest] = key;
                m.pc = m.pc.wrapping_add(2);
                StepOutcome::Executed
            }
        }
    }

    fn execute(&self, m: &mut Machine, instr: Instruction) -> Result<()> {
        match instr {
            Instruction::ClearScreen => m.clear_display(),
            Instruction::Return => m.pc = m.pop()?,
            Instruction::Jump { nnn } => m.pc = nnn,
            Instruction::Call { nnn } => {
                m.push(m.pc)?;
                m.pc = nnn;
            }
            Instruction::SkipEqImm { x, nn } => {
                if m.v[x] == nn {
                    m.pc = m.pc.wrapping_add(2);
                }
            }
            Instruction::SkipNeImm { x, nn } => {
                if m.v[x] != nn {
                    m.pc = m.pc.wrapping_add(2);
                }
            }
            Instruction::SkipEqReg { x, y } => {
                if m.v[x] == m.v[y] {
                    m.pc = m.pc.wrapping_add(2);
                }
            }
            Instruction::SetImm { x, nn } => m.v[x] = nn,
            Instruction::AddImm { x, nn } => m.v[x] = m.v[x].wrapping_add(nn),
            Instruction::Copy { x, y } => m.v[x] = m.v[y],
            Instruction::Or { x, y } => {
                m.v[x] |= m.v[y];
                if self.quirks.logic_resets_vf {
                    m.v[0xf] = 0;
                }
            }
            Instruction::And { x, y } => {
                m.v[x] &= m.v[y];
                if self.quirks.logic_resets_vf {
                    m.v[0xf] = 0;
                }
            }
            Instruction::Xor { x, y } => {
                m.v[x] ^= m.v[y];
                if self.quirks.logic_resets_vf {
                    m.v[0xf] = 0;
                }
            }
            Instruction::Add { x, y } => {
                let (val, carry) = m.v[x].overflowing_add(m.v[y]);
                m.v[x] = val;
                m.v[0xf] = carry as u8;
            }
            Instruction::Sub { x, y } => {
                let (val, borrow) = m.v[x].overflowing_sub(m.v[y]);
                m.v[x] = val;
                m.v[0xf] = !borrow as u8;
            }
            Instruction::ShiftRight { x, y } => {
                let src = if self.quirks.shift_reads_vy { m.v[y] } else { m.v[x] };
                m.v[0xf] = src & 0x1;
                m.v[x] = src >> 1;
            }
            Instruction::SubFrom { x, y } => {
                let (val, borrow) = m.v[y].overflowing_sub(m.v[x]);
                m.v[x] = val;
                m.v[0xf] = !borrow as u8;
            }
            Instruction::ShiftLeft { x, y } => {
                let src = if self.quirks.shift_reads_vy { m.v[y] } else { m.v[x] };
                m.v[0xf] = (src & 0x80) >> 7;
                m.v[x] = src << 1;
            }
            Instruction::SkipNeReg { x, y } => {
                if m.v[x] != m.v[y] {
                    m.pc = m.pc.wrapping_add(2);
                }
            }
            Instruction::SetIndex { nnn } => m.i = nnn,
            Instruction::JumpOffset { nnn } => m.pc = nnn.wrapping_add(m.v[0] as u16),
            Instruction::Random { x, nn } => m.v[x] = (self.random)() & nn,
            Instruction::Draw { x, y, n } => {
                let x0 = m.v[x] as usize % m.width();
                let y0 = m.v[y] as usize % m.height();
                let mut collision = false;
                for row in 0..n as usize {
                    // rows below the bottom edge clip the rest of the sprite
                    // and are never read from memory
                    if y0 + row >= m.height() {
                        break;
                    }
                    let addr = m.i as usize + row;
                    if addr >= MEMORY_SIZE {
                        return Err(Error::OutOfRange {
                            addr: m.i.wrapping_add(row as u16),
                        });
                    }
                    let bits = m.memory[addr];
                    collision |= m.blit_row(x0, y0 + row, bits);
                }
                m.v[0xf] = collision as u8;
            }
            Instruction::SkipKeyPressed { x } => {
                if m.keypad[(m.v[x] & 0xf) as usize] {
                    m.pc = m.pc.wrapping_add(2);
                }
            }
            Instruction::SkipKeyReleased { x } => {
                if !m.keypad[(m.v[x] & 0xf) as usize] {
                    m.pc = m.pc.wrapping_add(2);
                }
            }
            Instruction::ReadDelay { x } => m.v[x] = m.delay_timer,
            Instruction::WaitKey { x } => {
                // park on this instruction; poll_wait_key advances PC once
                // the latched key is released
                m.pc = m.pc.wrapping_sub(2);
                m.wait_key = Some(KeyWait {
                    dest: x,
                    latched: None,
                });
            }
            Instruction::SetDelay { x } => m.delay_timer = m.v[x],
            Instruction::SetSound { x } => m.sound_timer = m.v[x],
            Instruction::AddIndex { x } => m.i = m.i.wrapping_add(m.v[x] as u16),
            Instruction::FontGlyph { x } => m.i = (m.v[x] & 0xf) as u16 * 5,
            Instruction::StoreBcd { x } => {
                let base = checked_index_range(m, 3)?;
                m.memory[base] = m.v[x] / 100;
                m.memory[base + 1] = (m.v[x] / 10) % 10;
                m.memory[base + 2] = m.v[x] % 10;
            }
            Instruction::StoreRegs { x } => {
                let base = checked_index_range(m, x + 1)?;
                for r in 0..=x {
                    m.memory[base + r] = m.v[r];
                }
                if self.quirks.index_increments {
                    m.i = m.i.wrapping_add(x as u16 + 1);
                }
            }
            Instruction::LoadRegs { x } => {
                let base = checked_index_range(m, x + 1)?;
                for r in 0..=x {
                    m.v[r] = m.memory[base + r];
                }
                if self.quirks.index_increments {
                    m.i = m.i.wrapping_add(x as u16 + 1);
                }
            }
            Instruction::Unknown(opcode) => {
                log::warn!("unrecognized opcode {opcode:#06x}, ignoring");
            }
        }
        Ok(())
    }
}

/// Bounds check for an I-relative access of `len` bytes; faults instead of
/// wrapping into adjacent memory.
fn checked_index_range(m: &Machine, len: usize) -> Result<usize> {
    let base = m.i as usize;
    if base + len > MEMORY_SIZE {
        return Err(Error::OutOfRange { addr: m.i });
    }
    Ok(base)
}
