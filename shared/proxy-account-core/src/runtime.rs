//! Interpreter for the opcode subset used by proxy init and runtime code.
//!
//! There is no gas metering: `GAS` reports the frame's budget unchanged and the budget is
//! forwarded to delegate calls as-is. Everything else follows EVM semantics closely enough
//! that executing the assembled code is a faithful check of its byte layout.

use alloc::vec::Vec;

use alloy_primitives::{Address, U256};

use crate::{errors::RuntimeError, opcodes::Opcode};

pub const STACK_LIMIT: usize = 1024;

/// Memory ceiling per frame.
pub const MEMORY_LIMIT: usize = 1 << 20;

pub const STEP_LIMIT: usize = 10_000;

/// Result of a delegate call as seen by the calling frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallOutcome {
    pub success: bool,
    pub output: Vec<u8>,
}

impl CallOutcome {
    pub fn success(output: Vec<u8>) -> Self {
        Self {
            success: true,
            output,
        }
    }

    pub fn failure(output: Vec<u8>) -> Self {
        Self {
            success: false,
            output,
        }
    }
}

/// How a frame ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Halt {
    Stop,
    Return(Vec<u8>),
    Revert(Vec<u8>),
}

impl Halt {
    pub fn into_outcome(self) -> CallOutcome {
        match self {
            Halt::Stop => CallOutcome::success(Vec::new()),
            Halt::Return(data) => CallOutcome::success(data),
            Halt::Revert(data) => CallOutcome::failure(data),
        }
    }
}

/// Environment reachable from a frame.
pub trait Host {
    /// Run `target`'s logic against the calling frame's account, sender and value.
    fn delegate_call(&mut self, gas: u64, target: Address, input: &[u8]) -> CallOutcome;
}

/// Host for code that must not call out (init code). Delegate calls fail without output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCalls;

impl Host for NoCalls {
    fn delegate_call(&mut self, _gas: u64, _target: Address, _input: &[u8]) -> CallOutcome {
        CallOutcome::failure(Vec::new())
    }
}

/// Execute `code` with `calldata` until it halts.
pub fn execute<H: Host + ?Sized>(
    code: &[u8],
    calldata: &[u8],
    gas: u64,
    host: &mut H,
) -> Result<Halt, RuntimeError> {
    Frame::new(code, calldata, gas).run(host)
}

/// Run deployment code and return the runtime code it leaves behind.
pub fn run_init_code(deploy_code: &[u8]) -> Result<Halt, RuntimeError> {
    execute(deploy_code, &[], u64::MAX, &mut NoCalls)
}

struct Frame<'a> {
    code: &'a [u8],
    calldata: &'a [u8],
    gas: u64,
    pc: usize,
    stack: Vec<U256>,
    memory: Vec<u8>,
    return_data: Vec<u8>,
    jumpdests: Vec<bool>,
}

impl<'a> Frame<'a> {
    fn new(code: &'a [u8], calldata: &'a [u8], gas: u64) -> Self {
        Self {
            code,
            calldata,
            gas,
            pc: 0,
            stack: Vec::new(),
            memory: Vec::new(),
            return_data: Vec::new(),
            jumpdests: analyze_jumpdests(code),
        }
    }

    fn run<H: Host + ?Sized>(mut self, host: &mut H) -> Result<Halt, RuntimeError> {
        let mut steps = 0usize;
        while self.pc < self.code.len() {
            steps += 1;
            if steps > STEP_LIMIT {
                return Err(RuntimeError::StepLimit);
            }

            let pc = self.pc;
            let byte = self.code[pc];
            let opcode =
                Opcode::try_from(byte).map_err(|_| RuntimeError::UnsupportedOpcode { pc, byte })?;
            self.pc += 1;

            match opcode {
                Opcode::Stop => return Ok(Halt::Stop),
                Opcode::Pop => {
                    self.pop()?;
                }
                Opcode::CallDataSize => self.push(U256::from(self.calldata.len()))?,
                Opcode::ReturnDataSize => self.push(U256::from(self.return_data.len()))?,
                Opcode::Gas => self.push(U256::from(self.gas))?,
                Opcode::CallDataCopy => {
                    let (dest, offset, size) = (self.pop()?, self.pop()?, self.pop()?);
                    let source = self.calldata;
                    self.copy_padded(source, dest, offset, size)?;
                }
                Opcode::CodeCopy => {
                    let (dest, offset, size) = (self.pop()?, self.pop()?, self.pop()?);
                    let source = self.code;
                    self.copy_padded(source, dest, offset, size)?;
                }
                Opcode::ReturnDataCopy => {
                    let (dest, offset, size) = (self.pop()?, self.pop()?, self.pop()?);
                    let offset = self.as_index(offset)?;
                    let size = self.as_index(size)?;
                    if offset + size > self.return_data.len() {
                        return Err(RuntimeError::ReturnDataOutOfBounds { pc });
                    }
                    let dest = self.as_index(dest)?;
                    let chunk = self.return_data[offset..offset + size].to_vec();
                    self.write_memory(dest, &chunk)?;
                }
                Opcode::Jump => {
                    let dest = self.pop()?;
                    self.jump(dest)?;
                }
                Opcode::Jumpi => {
                    let (dest, condition) = (self.pop()?, self.pop()?);
                    if !condition.is_zero() {
                        self.jump(dest)?;
                    }
                }
                Opcode::Jumpdest => {}
                Opcode::Push(width) => {
                    let width = width as usize;
                    let start = self.pc.min(self.code.len());
                    let end = (self.pc + width).min(self.code.len());
                    let mut word = [0u8; 32];
                    // Immediates running past the end of code are zero-padded on the right.
                    word[32 - width..32 - width + (end - start)]
                        .copy_from_slice(&self.code[start..end]);
                    self.push(U256::from_be_bytes(word))?;
                    self.pc += width;
                }
                Opcode::Dup(n) => {
                    let n = n as usize;
                    if self.stack.len() < n {
                        return Err(RuntimeError::StackUnderflow { pc });
                    }
                    let value = self.stack[self.stack.len() - n];
                    self.push(value)?;
                }
                Opcode::Swap(n) => {
                    let n = n as usize;
                    let len = self.stack.len();
                    if len < n + 1 {
                        return Err(RuntimeError::StackUnderflow { pc });
                    }
                    self.stack.swap(len - 1, len - 1 - n);
                }
                Opcode::DelegateCall => {
                    let gas = self.pop()?;
                    let target = self.pop()?;
                    let (args_offset, args_size) = (self.pop()?, self.pop()?);
                    let (ret_offset, ret_size) = (self.pop()?, self.pop()?);

                    let input = self.read_memory(args_offset, args_size)?;
                    let gas = if gas > U256::from(self.gas) {
                        self.gas
                    } else {
                        gas.to::<u64>()
                    };
                    let outcome = host.delegate_call(gas, word_to_address(target), &input);

                    let ret_offset = self.as_index(ret_offset)?;
                    let ret_size = self.as_index(ret_size)?;
                    let copied = ret_size.min(outcome.output.len());
                    self.write_memory(ret_offset, &outcome.output[..copied])?;
                    self.return_data = outcome.output;
                    self.push(U256::from(outcome.success as u8))?;
                }
                Opcode::Return => {
                    let (offset, size) = (self.pop()?, self.pop()?);
                    return Ok(Halt::Return(self.read_memory(offset, size)?));
                }
                Opcode::Revert => {
                    let (offset, size) = (self.pop()?, self.pop()?);
                    return Ok(Halt::Revert(self.read_memory(offset, size)?));
                }
            }
        }
        Ok(Halt::Stop)
    }

    fn push(&mut self, value: U256) -> Result<(), RuntimeError> {
        if self.stack.len() >= STACK_LIMIT {
            return Err(RuntimeError::StackOverflow { pc: self.pc - 1 });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<U256, RuntimeError> {
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { pc: self.pc - 1 })
    }

    fn jump(&mut self, dest: U256) -> Result<(), RuntimeError> {
        let pc = self.pc - 1;
        let target = if dest >= U256::from(self.code.len()) {
            usize::MAX
        } else {
            dest.to::<u64>() as usize
        };
        if !self.jumpdests.get(target).copied().unwrap_or(false) {
            return Err(RuntimeError::InvalidJump {
                pc,
                dest: target.min(self.code.len()),
            });
        }
        self.pc = target;
        Ok(())
    }

    fn as_index(&self, value: U256) -> Result<usize, RuntimeError> {
        if value > U256::from(MEMORY_LIMIT) {
            return Err(RuntimeError::MemoryLimit { pc: self.pc - 1 });
        }
        Ok(value.to::<u64>() as usize)
    }

    fn ensure_memory(&mut self, end: usize) -> Result<(), RuntimeError> {
        if end > MEMORY_LIMIT {
            return Err(RuntimeError::MemoryLimit { pc: self.pc - 1 });
        }
        if end > self.memory.len() {
            // Memory grows in 32-byte words.
            let words = end.div_ceil(32);
            self.memory.resize(words * 32, 0);
        }
        Ok(())
    }

    fn write_memory(&mut self, offset: usize, bytes: &[u8]) -> Result<(), RuntimeError> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.ensure_memory(offset + bytes.len())?;
        self.memory[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn read_memory(&mut self, offset: U256, size: U256) -> Result<Vec<u8>, RuntimeError> {
        let size = self.as_index(size)?;
        if size == 0 {
            return Ok(Vec::new());
        }
        let offset = self.as_index(offset)?;
        self.ensure_memory(offset + size)?;
        Ok(self.memory[offset..offset + size].to_vec())
    }

    /// `*COPY` semantics: bytes past the end of `source` read as zero.
    fn copy_padded(
        &mut self,
        source: &[u8],
        dest: U256,
        offset: U256,
        size: U256,
    ) -> Result<(), RuntimeError> {
        let size = self.as_index(size)?;
        if size == 0 {
            return Ok(());
        }
        let dest = self.as_index(dest)?;
        let mut chunk = alloc::vec![0u8; size];
        if offset < U256::from(source.len()) {
            let offset = offset.to::<u64>() as usize;
            let available = (source.len() - offset).min(size);
            chunk[..available].copy_from_slice(&source[offset..offset + available]);
        }
        self.write_memory(dest, &chunk)
    }
}

/// Valid jump targets: `JUMPDEST` bytes that are not inside push immediates.
fn analyze_jumpdests(code: &[u8]) -> Vec<bool> {
    let mut valid = alloc::vec![false; code.len()];
    let mut i = 0usize;
    while i < code.len() {
        match Opcode::try_from(code[i]) {
            Ok(Opcode::Jumpdest) => valid[i] = true,
            Ok(op) => i += op.immediate_len(),
            Err(_) => {}
        }
        i += 1;
    }
    valid
}

fn word_to_address(word: U256) -> Address {
    let bytes = word.to_be_bytes::<32>();
    Address::from_slice(&bytes[12..32])
}
