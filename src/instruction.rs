/// One decoded instruction. Field naming follows the conventional opcode
/// notation: `nnn` is a 12-bit address, `nn` a byte immediate, `n` a nibble,
/// `x`/`y` register indices taken from bits 8-11 and 4-7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1NNN
    Jump { nnn: u16 },
    /// 2NNN
    Call { nnn: u16 },
    /// 3XNN
    SkipEqImm { x: usize, nn: u8 },
    /// 4XNN
    SkipNeImm { x: usize, nn: u8 },
    /// 5XY0
    SkipEqReg { x: usize, y: usize },
    /// 6XNN
    SetImm { x: usize, nn: u8 },
    /// 7XNN, wraps, leaves VF alone
    AddImm { x: usize, nn: u8 },
    /// 8XY0
    Copy { x: usize, y: usize },
    /// 8XY1
    Or { x: usize, y: usize },
    /// 8XY2
    And { x: usize, y: usize },
    /// 8XY3
    Xor { x: usize, y: usize },
    /// 8XY4, VF = carry
    Add { x: usize, y: usize },
    /// 8XY5, VF = no-borrow
    Sub { x: usize, y: usize },
    /// 8XY6, source register depends on the quirk profile
    ShiftRight { x: usize, y: usize },
    /// 8XY7, V[X] = V[Y] - V[X]
    SubFrom { x: usize, y: usize },
    /// 8XYE, mirrored source rule to 8XY6
    ShiftLeft { x: usize, y: usize },
    /// 9XY0
    SkipNeReg { x: usize, y: usize },
    /// ANNN
    SetIndex { nnn: u16 },
    /// BNNN
    JumpOffset { nnn: u16 },
    /// CXNN
    Random { x: usize, nn: u8 },
    /// DXYN
    Draw { x: usize, y: usize, n: u8 },
    /// EX9E
    SkipKeyPressed { x: usize },
    /// EXA1
    SkipKeyReleased { x: usize },
    /// FX07
    ReadDelay { x: usize },
    /// FX0A, blocks until a key is pressed and released
    WaitKey { x: usize },
    /// FX15
    SetDelay { x: usize },
    /// FX18
    SetSound { x: usize },
    /// FX1E
    AddIndex { x: usize },
    /// FX29
    FontGlyph { x: usize },
    /// FX33
    StoreBcd { x: usize },
    /// FX55
    StoreRegs { x: usize },
    /// FX65
    LoadRegs { x: usize },
    /// Anything else executes as a no-op.
    Unknown(u16),
}

impl Instruction {
    /// Pure and total over all 65536 opcode values; unrecognized bit patterns
    /// come back as `Unknown` and are dispatched to a no-op.
    pub fn decode(opcode: u16) -> Self {
        let x = nibble(opcode, 1) as usize;
        let y = nibble(opcode, 2) as usize;
        let n = nibble(opcode, 3);
        let nn = (opcode & 0x00ff) as u8;
        let nnn = opcode & 0x0fff;

        match nibble(opcode, 0) {
            0x0 => match opcode {
                0x00e0 => Instruction::ClearScreen,
                0x00ee => Instruction::Return,
                // 0NNN machine-code call on the original hardware
                _ => Instruction::Unknown(opcode),
            },
            0x1 => Instruction::Jump { nnn },
            0x2 => Instruction::Call { nnn },
            0x3 => Instruction::SkipEqImm { x, nn },
            0x4 => Instruction::SkipNeImm { x, nn },
            0x5 if n == 0 => Instruction::SkipEqReg { x, y },
            0x6 => Instruction::SetImm { x, nn },
            0x7 => Instruction::AddImm { x, nn },
            0x8 => match n {
                0x0 => Instruction::Copy { x, y },
                0x1 => Instruction::Or { x, y },
                0x2 => Instruction::And { x, y },
                0x3 => Instruction::Xor { x, y },
                0x4 => Instruction::Add { x, y },
                0x5 => Instruction::Sub { x, y },
                0x6 => Instruction::ShiftRight { x, y },
                0x7 => Instruction::SubFrom { x, y },
                0xe => Instruction::ShiftLeft { x, y },
                _ => Instruction::Unknown(opcode),
            },
            0x9 if n == 0 => Instruction::SkipNeReg { x, y },
            0xa => Instruction::SetIndex { nnn },
            0xb => Instruction::JumpOffset { nnn },
            0xc => Instruction::Random { x, nn },
            0xd => Instruction::Draw { x, y, n },
            0xe => match nn {
                0x9e => Instruction::SkipKeyPressed { x },
                0xa1 => Instruction::SkipKeyReleased { x },
                _ => Instruction::Unknown(opcode),
            },
            0xf => match nn {
                0x07 => Instruction::ReadDelay { x },
                0x0a => Instruction::WaitKey { x },
                0x15 => Instruction::SetDelay { x },
                0x18 => Instruction::SetSound { x },
                0x1e => Instruction::AddIndex { x },
                0x29 => Instruction::FontGlyph { x },
                0x33 => Instruction::StoreBcd { x },
                0x55 => Instruction::StoreRegs { x },
                0x65 => Instruction::LoadRegs { x },
                _ => Instruction::Unknown(opcode),
            },
            _ => Instruction::Unknown(opcode),
        }
    }
}

fn nibble(opcode: u16, nth: u8) -> u8 {
    ((opcode >> (12 - 4 * nth)) & 0xf) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_extraction() {
        assert_eq!(Instruction::decode(0x1abc), Instruction::Jump { nnn: 0xabc });
        assert_eq!(
            Instruction::decode(0x3a42),
            Instruction::SkipEqImm { x: 0xa, nn: 0x42 }
        );
        assert_eq!(
            Instruction::decode(0xd123),
            Instruction::Draw { x: 1, y: 2, n: 3 }
        );
    }

    #[test]
    fn zero_family() {
        assert_eq!(Instruction::decode(0x00e0), Instruction::ClearScreen);
        assert_eq!(Instruction::decode(0x00ee), Instruction::Return);
        // machine-code call, ignored
        assert_eq!(Instruction::decode(0x0123), Instruction::Unknown(0x0123));
    }

    #[test]
    fn alu_family_second_level() {
        assert_eq!(Instruction::decode(0x8ab4), Instruction::Add { x: 0xa, y: 0xb });
        assert_eq!(
            Instruction::decode(0x8ab6),
            Instruction::ShiftRight { x: 0xa, y: 0xb }
        );
        assert_eq!(
            Instruction::decode(0x8abe),
            Instruction::ShiftLeft { x: 0xa, y: 0xb }
        );
        assert_eq!(Instruction::decode(0x8ab8), Instruction::Unknown(0x8ab8));
    }

    #[test]
    fn compare_families_require_trailing_zero() {
        assert_eq!(Instruction::decode(0x5120), Instruction::SkipEqReg { x: 1, y: 2 });
        assert_eq!(Instruction::decode(0x5121), Instruction::Unknown(0x5121));
        assert_eq!(Instruction::decode(0x9120), Instruction::SkipNeReg { x: 1, y: 2 });
        assert_eq!(Instruction::decode(0x9127), Instruction::Unknown(0x9127));
    }

    #[test]
    fn decode_is_total() {
        // every opcode value decodes without panicking
        for opcode in 0..=0xffffu16 {
            let _ = Instruction::decode(opcode);
        }
    }
}
