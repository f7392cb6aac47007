use crate::machine::{MEMORY_SIZE, ROM_START, STACK_DEPTH};

/// Faults raised by the core. Unrecognized opcodes are deliberately absent:
/// real-world ROMs run into data words often enough that they execute as
/// no-ops instead.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("ROM is too large ({size} bytes), max size is {max} bytes", max = MEMORY_SIZE - ROM_START as usize)]
    RomTooLarge { size: usize },

    #[error("call stack overflow (depth {})", STACK_DEPTH)]
    StackOverflow,

    #[error("return with empty call stack")]
    StackUnderflow,

    #[error("memory access out of range at {addr:#06x}")]
    OutOfRange { addr: u16 },
}

pub type Result<T> = std::result::Result<T, Error>;
