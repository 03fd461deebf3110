use alloc::vec::Vec;

use alloy_primitives::Address;

use crate::{
    bytecode::{ProxyLayout, ADDRESS_LEN, INIT_CODE_LEN, RUNTIME_PREFIX},
    errors::DecodeError,
    opcodes::{Opcode, PUSH0},
};

/// Addresses recovered from proxy code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedProxy {
    pub implementation: Address,
    pub owner: Address,
    pub layout: ProxyLayout,
}

/// Decode full deployment code (init + runtime).
pub fn decode_deploy_code(code: &[u8]) -> Result<DecodedProxy, DecodeError> {
    if code.len() < INIT_CODE_LEN {
        return Err(DecodeError::Truncated { offset: code.len() });
    }
    let decoded = decode_at(&code[INIT_CODE_LEN..], INIT_CODE_LEN)?;
    expect_bytes(code, 0, &decoded.layout.init_code())?;
    Ok(decoded)
}

/// Decode the runtime code left at a proxy account.
pub fn decode_runtime(code: &[u8]) -> Result<DecodedProxy, DecodeError> {
    decode_at(code, 0)
}

/// Owner appended to the end of the runtime code, as read by the implementation.
pub fn embedded_owner(runtime: &[u8]) -> Option<Address> {
    if runtime.len() < ADDRESS_LEN {
        return None;
    }
    Some(Address::from_slice(&runtime[runtime.len() - ADDRESS_LEN..]))
}

/// `runtime` decoded from `base` bytes into the enclosing code, so errors carry absolute offsets.
fn decode_at(runtime: &[u8], base: usize) -> Result<DecodedProxy, DecodeError> {
    expect_bytes(runtime, base, &RUNTIME_PREFIX)?;

    let push_at = RUNTIME_PREFIX.len();
    let push = *runtime
        .get(push_at)
        .ok_or(DecodeError::Truncated { offset: base + push_at })?;
    let layout = push
        .checked_sub(PUSH0)
        .and_then(|width| ProxyLayout::new(width as usize))
        .ok_or(DecodeError::InvalidPushWidth {
            offset: base + push_at,
            found: push,
        })?;

    if runtime.len() != layout.runtime_len() {
        return Err(DecodeError::LengthMismatch {
            expected: base + layout.runtime_len(),
            found: base + runtime.len(),
        });
    }

    let implementation_bytes = &runtime[layout.implementation_offset()..layout.suffix_offset()];
    if implementation_bytes.first() == Some(&0) {
        return Err(DecodeError::LeadingZeroByte {
            offset: base + layout.implementation_offset(),
        });
    }
    let mut padded = [0u8; ADDRESS_LEN];
    padded[ADDRESS_LEN - implementation_bytes.len()..].copy_from_slice(implementation_bytes);

    let suffix_region = &runtime[layout.suffix_offset()..layout.owner_offset()];
    expect_bytes(
        suffix_region,
        base + layout.suffix_offset(),
        &layout.runtime_suffix(),
    )?;

    Ok(DecodedProxy {
        implementation: Address::from(padded),
        owner: Address::from_slice(&runtime[layout.owner_offset()..]),
        layout,
    })
}

fn expect_bytes(code: &[u8], base: usize, expected: &[u8]) -> Result<(), DecodeError> {
    for (i, want) in expected.iter().enumerate() {
        let found = *code
            .get(i)
            .ok_or(DecodeError::Truncated { offset: base + i })?;
        if found != *want {
            return Err(DecodeError::UnexpectedByte {
                offset: base + i,
                expected: *want,
                found,
            });
        }
    }
    Ok(())
}

/// Single disassembled instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: Opcode,
    pub immediate: Vec<u8>,
}

/// Disassemble `code` into instructions.
///
/// Stops at `stop_at` when given, so trailing data (the embedded owner) is not read as code.
pub fn disassemble(code: &[u8], stop_at: Option<usize>) -> Result<Vec<Instruction>, DecodeError> {
    let end = stop_at.unwrap_or(code.len()).min(code.len());
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < end {
        let byte = code[i];
        let opcode = Opcode::try_from(byte)
            .map_err(|_| DecodeError::UnknownOpcode { offset: i, byte })?;
        let len = opcode.immediate_len();
        if i + 1 + len > code.len() {
            return Err(DecodeError::Truncated { offset: code.len() });
        }
        out.push(Instruction {
            offset: i,
            opcode,
            immediate: code[i + 1..i + 1 + len].to_vec(),
        });
        i += 1 + len;
    }

    Ok(out)
}

/// Disassemble proxy runtime code, excluding the trailing owner bytes.
pub fn disassemble_runtime(runtime: &[u8]) -> Result<Vec<Instruction>, DecodeError> {
    let decoded = decode_runtime(runtime)?;
    disassemble(runtime, Some(decoded.layout.owner_offset()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::ProxyBytecode;
    use alloy_primitives::address;

    const OWNER: Address = address!("00000000000000000000000000000000000000aa");

    fn implementation_with_leading_zeros(zeros: usize) -> Address {
        let mut bytes = [0xeeu8; ADDRESS_LEN];
        bytes[..zeros].fill(0);
        Address::from(bytes)
    }

    #[test]
    fn recovers_addresses_for_every_width() {
        for zeros in 0..=ADDRESS_LEN {
            let implementation = implementation_with_leading_zeros(zeros);
            let code = ProxyBytecode::assemble(implementation, OWNER);

            let decoded = decode_deploy_code(code.as_bytes()).unwrap();
            assert_eq!(decoded.implementation, implementation, "zeros={zeros}");
            assert_eq!(decoded.owner, OWNER);

            let runtime = decode_runtime(code.runtime()).unwrap();
            assert_eq!(runtime, decoded);
            assert_eq!(embedded_owner(code.runtime()), Some(OWNER));
        }
    }

    #[test]
    fn rejects_a_shifted_jump_target() {
        let implementation = implementation_with_leading_zeros(2);
        let mut code = ProxyBytecode::assemble(implementation, OWNER).to_vec();
        let operand = INIT_CODE_LEN + 11 + 18 + 8;
        code[operand] += 1;
        assert_eq!(
            decode_deploy_code(&code),
            Err(DecodeError::UnexpectedByte {
                offset: operand,
                expected: 0x28,
                found: 0x29,
            })
        );
    }

    #[test]
    fn rejects_wrong_runtime_length_byte() {
        let mut code = ProxyBytecode::assemble(implementation_with_leading_zeros(0), OWNER).to_vec();
        code[1] = 0x3e;
        assert!(matches!(
            decode_deploy_code(&code),
            Err(DecodeError::UnexpectedByte { offset: 1, .. })
        ));
    }

    #[test]
    fn rejects_truncated_and_padded_code() {
        let code = ProxyBytecode::assemble(implementation_with_leading_zeros(3), OWNER).to_vec();
        assert!(matches!(
            decode_deploy_code(&code[..code.len() - 1]),
            Err(DecodeError::LengthMismatch { .. })
        ));
        let mut padded = code.clone();
        padded.push(0);
        assert!(matches!(
            decode_deploy_code(&padded),
            Err(DecodeError::LengthMismatch { .. })
        ));
        assert_eq!(
            decode_runtime(&code[INIT_CODE_LEN..INIT_CODE_LEN + 4]),
            Err(DecodeError::Truncated { offset: 4 })
        );
    }

    #[test]
    fn rejects_unstripped_implementation() {
        let code = ProxyBytecode::assemble(implementation_with_leading_zeros(0), OWNER);
        let mut runtime = code.runtime().to_vec();
        // Claim a full-width push but start the address with a zero byte.
        runtime[11] = 0;
        assert_eq!(
            decode_runtime(&runtime),
            Err(DecodeError::LeadingZeroByte { offset: 11 })
        );
    }

    #[test]
    fn rejects_oversized_push() {
        let code = ProxyBytecode::assemble(implementation_with_leading_zeros(0), OWNER);
        let mut runtime = code.runtime().to_vec();
        runtime[10] = 0x74;
        assert_eq!(
            decode_runtime(&runtime),
            Err(DecodeError::InvalidPushWidth {
                offset: 10,
                found: 0x74
            })
        );
    }

    #[test]
    fn disassembles_runtime_without_owner() {
        let code = ProxyBytecode::assemble(implementation_with_leading_zeros(2), OWNER);
        let listing = disassemble_runtime(code.runtime()).unwrap();
        let ops: Vec<Opcode> = listing.iter().map(|ins| ins.opcode).collect();
        assert_eq!(ops[10], Opcode::Push(18));
        assert_eq!(listing[10].immediate.len(), 18);
        assert_eq!(ops.last(), Some(&Opcode::Return));
        let jumpdest = listing
            .iter()
            .find(|ins| ins.opcode == Opcode::Jumpdest)
            .unwrap();
        assert_eq!(jumpdest.offset, 0x28);
    }

    #[test]
    fn disassembly_reports_unknown_opcodes() {
        assert_eq!(
            disassemble(&[0x3d, 0x01], None),
            Err(DecodeError::UnknownOpcode { offset: 1, byte: 0x01 })
        );
        assert_eq!(
            disassemble(&[0x61, 0x01], None),
            Err(DecodeError::Truncated { offset: 2 })
        );
    }
}
