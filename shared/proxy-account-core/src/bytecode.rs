//! Minimal delegating proxy assembly.
//!
//! Deployment code layout (`n` = implementation width once its leading zero bytes are stripped):
//!
//! | bytes | content                                                      |
//! |-------|--------------------------------------------------------------|
//! | 9     | init: `60 <R> 3d 81 60 09 3d 39 f3` (return runtime)         |
//! | 10    | `3d 3d 3d 3d 36 3d 3d 37 36 3d` (copy calldata, zero args)   |
//! | 1     | `PUSHn` (`0x5f + n`)                                         |
//! | n     | implementation, zero-stripped                                |
//! | 13    | `5a f4 3d 3d 93 80 3e 60 <J> 57 fd 5b f3` (delegate, relay)  |
//! | 20    | owner, full width                                            |
//!
//! `R` is the runtime length and `J` the runtime offset of the `JUMPDEST`; both move with `n`.

use alloc::vec::Vec;
use core::fmt;

use alloy_primitives::{keccak256, Address, B256};

use crate::opcodes::{
    CALLDATACOPY, CALLDATASIZE, CODECOPY, DELEGATECALL, DUP1, DUP2, GAS, JUMPDEST, JUMPI, PUSH0,
    PUSH1, RETURN, RETURNDATACOPY, RETURNDATASIZE, REVERT, SWAP1,
};

pub const ADDRESS_LEN: usize = 20;

pub const INIT_CODE_LEN: usize = 9;

/// Offset of the runtime code inside the deployment code (operand of the init `CODECOPY`).
pub const RUNTIME_OFFSET: u8 = INIT_CODE_LEN as u8;

pub const RUNTIME_PREFIX: [u8; 10] = [
    RETURNDATASIZE,
    RETURNDATASIZE,
    RETURNDATASIZE,
    RETURNDATASIZE,
    CALLDATASIZE,
    RETURNDATASIZE,
    RETURNDATASIZE,
    CALLDATACOPY,
    CALLDATASIZE,
    RETURNDATASIZE,
];

pub const RUNTIME_SUFFIX_LEN: usize = 13;

/// Position of the jump target operand within the runtime suffix.
const JUMP_OPERAND_IN_SUFFIX: usize = 8;
/// Position of the `JUMPDEST` within the runtime suffix.
const JUMPDEST_IN_SUFFIX: usize = 11;

const SWAP4: u8 = SWAP1 + 3;

/// Upper bound of the deployment code (unstripped implementation).
pub const MAX_DEPLOY_CODE_LEN: usize =
    INIT_CODE_LEN + RUNTIME_PREFIX.len() + 1 + ADDRESS_LEN + RUNTIME_SUFFIX_LEN + ADDRESS_LEN;

/// Length arithmetic for a given implementation width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProxyLayout {
    implementation_width: usize,
}

impl ProxyLayout {
    /// Layout for an `n`-byte implementation. `None` above 20 bytes.
    pub const fn new(implementation_width: usize) -> Option<Self> {
        if implementation_width > ADDRESS_LEN {
            return None;
        }
        Some(Self {
            implementation_width,
        })
    }

    pub fn for_implementation(implementation: Address) -> Self {
        Self {
            implementation_width: stripped_width(implementation),
        }
    }

    pub const fn implementation_width(&self) -> usize {
        self.implementation_width
    }

    pub const fn push_opcode(&self) -> u8 {
        PUSH0 + self.implementation_width as u8
    }

    /// Runtime offset of the implementation bytes.
    pub const fn implementation_offset(&self) -> usize {
        RUNTIME_PREFIX.len() + 1
    }

    /// Runtime offset of the delegate/relay suffix.
    pub const fn suffix_offset(&self) -> usize {
        self.implementation_offset() + self.implementation_width
    }

    /// Runtime offset of the `JUMPDEST` taken when the delegate call succeeds.
    pub const fn jumpdest(&self) -> usize {
        self.suffix_offset() + JUMPDEST_IN_SUFFIX
    }

    /// Runtime offset of the embedded owner.
    pub const fn owner_offset(&self) -> usize {
        self.suffix_offset() + RUNTIME_SUFFIX_LEN
    }

    pub const fn runtime_len(&self) -> usize {
        self.owner_offset() + ADDRESS_LEN
    }

    pub const fn deploy_len(&self) -> usize {
        INIT_CODE_LEN + self.runtime_len()
    }

    /// `PUSH1 R, RETURNDATASIZE, DUP2, PUSH1 9, RETURNDATASIZE, CODECOPY, RETURN`.
    pub const fn init_code(&self) -> [u8; INIT_CODE_LEN] {
        [
            PUSH1,
            self.runtime_len() as u8,
            RETURNDATASIZE,
            DUP2,
            PUSH1,
            RUNTIME_OFFSET,
            RETURNDATASIZE,
            CODECOPY,
            RETURN,
        ]
    }

    /// `GAS, DELEGATECALL, RETURNDATASIZE x2, SWAP4, DUP1, RETURNDATACOPY, PUSH1 J, JUMPI,
    /// REVERT, JUMPDEST, RETURN`.
    pub const fn runtime_suffix(&self) -> [u8; RUNTIME_SUFFIX_LEN] {
        let mut suffix = [
            GAS,
            DELEGATECALL,
            RETURNDATASIZE,
            RETURNDATASIZE,
            SWAP4,
            DUP1,
            RETURNDATACOPY,
            PUSH1,
            0,
            JUMPI,
            REVERT,
            JUMPDEST,
            RETURN,
        ];
        suffix[JUMP_OPERAND_IN_SUFFIX] = self.jumpdest() as u8;
        suffix
    }
}

/// Width of `address` once its leading zero bytes are stripped.
pub fn stripped_width(address: Address) -> usize {
    let leading = address.as_slice().iter().take_while(|b| **b == 0).count();
    ADDRESS_LEN - leading
}

/// Deployment code of a proxy account.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ProxyBytecode {
    buf: [u8; MAX_DEPLOY_CODE_LEN],
    layout: ProxyLayout,
}

impl ProxyBytecode {
    /// Assemble the deployment code delegating to `implementation` and embedding `owner`.
    ///
    /// Panics if the assembled length disagrees with the layout; that is a bug in this module,
    /// never a property of the inputs.
    pub fn assemble(implementation: Address, owner: Address) -> Self {
        let layout = ProxyLayout::for_implementation(implementation);
        let stripped = &implementation.as_slice()[ADDRESS_LEN - layout.implementation_width()..];

        let mut buf = [0u8; MAX_DEPLOY_CODE_LEN];
        let mut cursor = 0usize;
        put(&mut buf, &mut cursor, &layout.init_code());
        put(&mut buf, &mut cursor, &RUNTIME_PREFIX);
        put(&mut buf, &mut cursor, &[layout.push_opcode()]);
        put(&mut buf, &mut cursor, stripped);
        put(&mut buf, &mut cursor, &layout.runtime_suffix());
        put(&mut buf, &mut cursor, owner.as_slice());

        if cursor != layout.deploy_len() || buf[INIT_CODE_LEN + layout.jumpdest()] != JUMPDEST {
            panic!(
                "MalformedBytecode: assembled {cursor} bytes, layout expects {}",
                layout.deploy_len()
            );
        }

        Self { buf, layout }
    }

    pub fn layout(&self) -> ProxyLayout {
        self.layout
    }

    /// Full deployment code (init + runtime).
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.layout.deploy_len()]
    }

    /// Code left at the account address once the init code has run.
    pub fn runtime(&self) -> &[u8] {
        &self.as_bytes()[INIT_CODE_LEN..]
    }

    pub fn len(&self) -> usize {
        self.layout.deploy_len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// `keccak256` of the deployment code, as consumed by CREATE2.
    pub fn code_hash(&self) -> B256 {
        keccak256(self.as_bytes())
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl AsRef<[u8]> for ProxyBytecode {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for ProxyBytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProxyBytecode(0x")?;
        for b in self.as_bytes() {
            write!(f, "{b:02x}")?;
        }
        f.write_str(")")
    }
}

fn put(buf: &mut [u8], cursor: &mut usize, bytes: &[u8]) {
    buf[*cursor..*cursor + bytes.len()].copy_from_slice(bytes);
    *cursor += bytes.len();
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, hex};

    const OWNER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

    /// Implementation with two leading zero bytes (PUSH18 form).
    const IMPLEMENTATION: Address = address!("0000ab1c2d3e4f5a6b7c8d9eafbacbdcedfe0f11");

    fn address_with_leading_zeros(zeros: usize) -> Address {
        let mut bytes = [0u8; ADDRESS_LEN];
        for (i, b) in bytes.iter_mut().enumerate().skip(zeros) {
            *b = 0x11 + i as u8;
        }
        Address::from(bytes)
    }

    #[test]
    fn reference_layout_for_push18() {
        let code = ProxyBytecode::assemble(IMPLEMENTATION, OWNER);
        let expected = [
            &hex!("603e3d8160093d39f33d3d3d3d363d3d37363d71")[..],
            &hex!("ab1c2d3e4f5a6b7c8d9eafbacbdcedfe0f11")[..],
            &hex!("5af43d3d93803e602857fd5bf3")[..],
            OWNER.as_slice(),
        ]
        .concat();
        assert_eq!(code.as_bytes(), expected.as_slice());
        assert_eq!(code.layout().runtime_len(), 0x3e);
        assert_eq!(code.layout().jumpdest(), 0x28);
    }

    #[test]
    fn full_width_implementation_uses_push20() {
        let implementation = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
        let code = ProxyBytecode::assemble(implementation, OWNER);
        assert_eq!(code.len(), MAX_DEPLOY_CODE_LEN);
        assert_eq!(code.runtime()[10], 0x73);
        assert_eq!(&code.runtime()[11..31], implementation.as_slice());
    }

    #[test]
    fn lengths_track_every_width() {
        for zeros in 0..=ADDRESS_LEN {
            let implementation = address_with_leading_zeros(zeros);
            let code = ProxyBytecode::assemble(implementation, OWNER);
            let n = ADDRESS_LEN - zeros;
            let layout = code.layout();
            assert_eq!(layout.implementation_width(), n);
            assert_eq!(code.len(), 53 + n);
            assert_eq!(layout.runtime_len(), 44 + n);
            assert_eq!(code.as_bytes()[1] as usize, 44 + n);
            assert_eq!(layout.jumpdest(), 22 + n);
            assert_eq!(code.runtime()[layout.jumpdest()], JUMPDEST);
            assert_eq!(code.runtime()[10], PUSH0 + n as u8);
            assert_eq!(&code.runtime()[layout.owner_offset()..], OWNER.as_slice());
        }
    }

    #[test]
    fn owner_keeps_leading_zero_bytes() {
        let owner = address_with_leading_zeros(5);
        let code = ProxyBytecode::assemble(IMPLEMENTATION, owner);
        assert_eq!(&code.as_bytes()[code.len() - ADDRESS_LEN..], owner.as_slice());
    }

    #[test]
    fn assembly_is_deterministic() {
        let a = ProxyBytecode::assemble(IMPLEMENTATION, OWNER);
        let b = ProxyBytecode::assemble(IMPLEMENTATION, OWNER);
        assert_eq!(a, b);
        assert_eq!(a.code_hash(), b.code_hash());
        assert_ne!(a, ProxyBytecode::assemble(IMPLEMENTATION, Address::ZERO));
    }

    #[test]
    fn layout_rejects_oversized_width() {
        assert!(ProxyLayout::new(20).is_some());
        assert!(ProxyLayout::new(21).is_none());
    }
}
