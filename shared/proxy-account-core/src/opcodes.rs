use core::fmt;

/// EVM opcodes understood by the proxy assembler, decoder and interpreter.
///
/// Only the subset the proxy's init and runtime code use (plus a few neighbours needed to
/// disassemble it) is modelled; every other byte is rejected as unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Stop,
    CallDataSize,
    CallDataCopy,
    CodeCopy,
    ReturnDataSize,
    ReturnDataCopy,
    Pop,
    Jump,
    Jumpi,
    Gas,
    Jumpdest,
    /// `PUSH0` .. `PUSH32`; the payload is the immediate width in bytes.
    Push(u8),
    /// `DUP1` .. `DUP16`.
    Dup(u8),
    /// `SWAP1` .. `SWAP16`.
    Swap(u8),
    Return,
    DelegateCall,
    Revert,
}

pub const STOP: u8 = 0x00;
pub const CALLDATASIZE: u8 = 0x36;
pub const CALLDATACOPY: u8 = 0x37;
pub const CODECOPY: u8 = 0x39;
pub const RETURNDATASIZE: u8 = 0x3d;
pub const RETURNDATACOPY: u8 = 0x3e;
pub const POP: u8 = 0x50;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const GAS: u8 = 0x5a;
pub const JUMPDEST: u8 = 0x5b;
pub const PUSH0: u8 = 0x5f;
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;
pub const DUP1: u8 = 0x80;
pub const DUP2: u8 = 0x81;
pub const DUP16: u8 = 0x8f;
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9f;
pub const RETURN: u8 = 0xf3;
pub const DELEGATECALL: u8 = 0xf4;
pub const REVERT: u8 = 0xfd;

impl Opcode {
    /// Encoded byte of this opcode.
    pub fn byte(self) -> u8 {
        use Opcode::*;
        match self {
            Stop => STOP,
            CallDataSize => CALLDATASIZE,
            CallDataCopy => CALLDATACOPY,
            CodeCopy => CODECOPY,
            ReturnDataSize => RETURNDATASIZE,
            ReturnDataCopy => RETURNDATACOPY,
            Pop => POP,
            Jump => JUMP,
            Jumpi => JUMPI,
            Gas => GAS,
            Jumpdest => JUMPDEST,
            Push(width) => PUSH0 + width,
            Dup(n) => DUP1 + n - 1,
            Swap(n) => SWAP1 + n - 1,
            Return => RETURN,
            DelegateCall => DELEGATECALL,
            Revert => REVERT,
        }
    }

    /// Number of immediate bytes following the opcode in the code stream.
    pub fn immediate_len(self) -> usize {
        match self {
            Opcode::Push(width) => width as usize,
            _ => 0,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Opcode::*;
        let op = match value {
            STOP => Stop,
            CALLDATASIZE => CallDataSize,
            CALLDATACOPY => CallDataCopy,
            CODECOPY => CodeCopy,
            RETURNDATASIZE => ReturnDataSize,
            RETURNDATACOPY => ReturnDataCopy,
            POP => Pop,
            JUMP => Jump,
            JUMPI => Jumpi,
            GAS => Gas,
            JUMPDEST => Jumpdest,
            PUSH0..=PUSH32 => Push(value - PUSH0),
            DUP1..=DUP16 => Dup(value - DUP1 + 1),
            SWAP1..=SWAP16 => Swap(value - SWAP1 + 1),
            RETURN => Return,
            DELEGATECALL => DelegateCall,
            REVERT => Revert,
            _ => return Err(()),
        };
        Ok(op)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Stop => f.write_str("STOP"),
            Opcode::CallDataSize => f.write_str("CALLDATASIZE"),
            Opcode::CallDataCopy => f.write_str("CALLDATACOPY"),
            Opcode::CodeCopy => f.write_str("CODECOPY"),
            Opcode::ReturnDataSize => f.write_str("RETURNDATASIZE"),
            Opcode::ReturnDataCopy => f.write_str("RETURNDATACOPY"),
            Opcode::Pop => f.write_str("POP"),
            Opcode::Jump => f.write_str("JUMP"),
            Opcode::Jumpi => f.write_str("JUMPI"),
            Opcode::Gas => f.write_str("GAS"),
            Opcode::Jumpdest => f.write_str("JUMPDEST"),
            Opcode::Push(width) => write!(f, "PUSH{width}"),
            Opcode::Dup(n) => write!(f, "DUP{n}"),
            Opcode::Swap(n) => write!(f, "SWAP{n}"),
            Opcode::Return => f.write_str("RETURN"),
            Opcode::DelegateCall => f.write_str("DELEGATECALL"),
            Opcode::Revert => f.write_str("REVERT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_byte_round_trips() {
        for byte in 0u8..=255 {
            if let Ok(op) = Opcode::try_from(byte) {
                assert_eq!(op.byte(), byte, "{op}");
            }
        }
    }

    #[test]
    fn push_family_widths() {
        assert_eq!(Opcode::try_from(0x5f), Ok(Opcode::Push(0)));
        assert_eq!(Opcode::try_from(0x71), Ok(Opcode::Push(18)));
        assert_eq!(Opcode::try_from(0x73), Ok(Opcode::Push(20)));
        assert_eq!(Opcode::Push(18).to_string(), "PUSH18");
        assert_eq!(Opcode::Push(32).byte(), PUSH32);
    }

    #[test]
    fn unknown_bytes_are_rejected() {
        assert!(Opcode::try_from(0x01).is_err());
        assert!(Opcode::try_from(0xff).is_err());
    }
}
