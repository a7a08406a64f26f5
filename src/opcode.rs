//! # Opcodes
//!
//! The closed opcode enumeration covering every defined byte through the
//! Shanghai fork, plus EIP-1153 transient storage and EIP-5656 MCOPY.

/// EVM opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    // 0x00 - Stop and arithmetic
    Stop = 0x00,
    Add = 0x01,
    Mul = 0x02,
    Sub = 0x03,
    Div = 0x04,
    SDiv = 0x05,
    Mod = 0x06,
    SMod = 0x07,
    AddMod = 0x08,
    MulMod = 0x09,
    Exp = 0x0A,
    SignExtend = 0x0B,

    // 0x10 - Comparison and bitwise
    Lt = 0x10,
    Gt = 0x11,
    SLt = 0x12,
    SGt = 0x13,
    Eq = 0x14,
    IsZero = 0x15,
    And = 0x16,
    Or = 0x17,
    Xor = 0x18,
    Not = 0x19,
    Byte = 0x1A,
    Shl = 0x1B,
    Shr = 0x1C,
    Sar = 0x1D,

    // 0x20
    Keccak256 = 0x20,

    // 0x30 - Environment
    Address = 0x30,
    Balance = 0x31,
    Origin = 0x32,
    Caller = 0x33,
    CallValue = 0x34,
    CallDataLoad = 0x35,
    CallDataSize = 0x36,
    CallDataCopy = 0x37,
    CodeSize = 0x38,
    CodeCopy = 0x39,
    GasPrice = 0x3A,
    ExtCodeSize = 0x3B,
    ExtCodeCopy = 0x3C,
    ReturnDataSize = 0x3D,
    ReturnDataCopy = 0x3E,
    ExtCodeHash = 0x3F,

    // 0x40 - Block information
    BlockHash = 0x40,
    Coinbase = 0x41,
    Timestamp = 0x42,
    Number = 0x43,
    PrevRandao = 0x44,
    GasLimit = 0x45,
    ChainId = 0x46,
    SelfBalance = 0x47,
    BaseFee = 0x48,

    // 0x50 - Stack, memory, storage, flow
    Pop = 0x50,
    MLoad = 0x51,
    MStore = 0x52,
    MStore8 = 0x53,
    SLoad = 0x54,
    SStore = 0x55,
    Jump = 0x56,
    JumpI = 0x57,
    Pc = 0x58,
    MSize = 0x59,
    Gas = 0x5A,
    JumpDest = 0x5B,
    TLoad = 0x5C,
    TStore = 0x5D,
    MCopy = 0x5E,

    // 0x5F-0x7F - Pushes
    Push0 = 0x5F,
    Push1 = 0x60,
    Push2 = 0x61,
    Push3 = 0x62,
    Push4 = 0x63,
    Push5 = 0x64,
    Push6 = 0x65,
    Push7 = 0x66,
    Push8 = 0x67,
    Push9 = 0x68,
    Push10 = 0x69,
    Push11 = 0x6A,
    Push12 = 0x6B,
    Push13 = 0x6C,
    Push14 = 0x6D,
    Push15 = 0x6E,
    Push16 = 0x6F,
    Push17 = 0x70,
    Push18 = 0x71,
    Push19 = 0x72,
    Push20 = 0x73,
    Push21 = 0x74,
    Push22 = 0x75,
    Push23 = 0x76,
    Push24 = 0x77,
    Push25 = 0x78,
    Push26 = 0x79,
    Push27 = 0x7A,
    Push28 = 0x7B,
    Push29 = 0x7C,
    Push30 = 0x7D,
    Push31 = 0x7E,
    Push32 = 0x7F,

    // 0x80 - Dups
    Dup1 = 0x80,
    Dup2 = 0x81,
    Dup3 = 0x82,
    Dup4 = 0x83,
    Dup5 = 0x84,
    Dup6 = 0x85,
    Dup7 = 0x86,
    Dup8 = 0x87,
    Dup9 = 0x88,
    Dup10 = 0x89,
    Dup11 = 0x8A,
    Dup12 = 0x8B,
    Dup13 = 0x8C,
    Dup14 = 0x8D,
    Dup15 = 0x8E,
    Dup16 = 0x8F,

    // 0x90 - Swaps
    Swap1 = 0x90,
    Swap2 = 0x91,
    Swap3 = 0x92,
    Swap4 = 0x93,
    Swap5 = 0x94,
    Swap6 = 0x95,
    Swap7 = 0x96,
    Swap8 = 0x97,
    Swap9 = 0x98,
    Swap10 = 0x99,
    Swap11 = 0x9A,
    Swap12 = 0x9B,
    Swap13 = 0x9C,
    Swap14 = 0x9D,
    Swap15 = 0x9E,
    Swap16 = 0x9F,

    // 0xA0 - Logs
    Log0 = 0xA0,
    Log1 = 0xA1,
    Log2 = 0xA2,
    Log3 = 0xA3,
    Log4 = 0xA4,

    // 0xF0 - System
    Create = 0xF0,
    Call = 0xF1,
    CallCode = 0xF2,
    Return = 0xF3,
    DelegateCall = 0xF4,
    Create2 = 0xF5,
    StaticCall = 0xFA,
    Revert = 0xFD,
    Invalid = 0xFE,
    SelfDestruct = 0xFF,
}

impl Opcode {
    /// Decodes a byte, returning `None` for undefined opcodes.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        use Opcode::*;
        Some(match byte {
            0x00 => Stop,
            0x01 => Add,
            0x02 => Mul,
            0x03 => Sub,
            0x04 => Div,
            0x05 => SDiv,
            0x06 => Mod,
            0x07 => SMod,
            0x08 => AddMod,
            0x09 => MulMod,
            0x0A => Exp,
            0x0B => SignExtend,
            0x10 => Lt,
            0x11 => Gt,
            0x12 => SLt,
            0x13 => SGt,
            0x14 => Eq,
            0x15 => IsZero,
            0x16 => And,
            0x17 => Or,
            0x18 => Xor,
            0x19 => Not,
            0x1A => Byte,
            0x1B => Shl,
            0x1C => Shr,
            0x1D => Sar,
            0x20 => Keccak256,
            0x30 => Address,
            0x31 => Balance,
            0x32 => Origin,
            0x33 => Caller,
            0x34 => CallValue,
            0x35 => CallDataLoad,
            0x36 => CallDataSize,
            0x37 => CallDataCopy,
            0x38 => CodeSize,
            0x39 => CodeCopy,
            0x3A => GasPrice,
            0x3B => ExtCodeSize,
            0x3C => ExtCodeCopy,
            0x3D => ReturnDataSize,
            0x3E => ReturnDataCopy,
            0x3F => ExtCodeHash,
            0x40 => BlockHash,
            0x41 => Coinbase,
            0x42 => Timestamp,
            0x43 => Number,
            0x44 => PrevRandao,
            0x45 => GasLimit,
            0x46 => ChainId,
            0x47 => SelfBalance,
            0x48 => BaseFee,
            0x50 => Pop,
            0x51 => MLoad,
            0x52 => MStore,
            0x53 => MStore8,
            0x54 => SLoad,
            0x55 => SStore,
            0x56 => Jump,
            0x57 => JumpI,
            0x58 => Pc,
            0x59 => MSize,
            0x5A => Gas,
            0x5B => JumpDest,
            0x5C => TLoad,
            0x5D => TStore,
            0x5E => MCopy,
            0x5F => Push0,
            0x60 => Push1,
            0x61 => Push2,
            0x62 => Push3,
            0x63 => Push4,
            0x64 => Push5,
            0x65 => Push6,
            0x66 => Push7,
            0x67 => Push8,
            0x68 => Push9,
            0x69 => Push10,
            0x6A => Push11,
            0x6B => Push12,
            0x6C => Push13,
            0x6D => Push14,
            0x6E => Push15,
            0x6F => Push16,
            0x70 => Push17,
            0x71 => Push18,
            0x72 => Push19,
            0x73 => Push20,
            0x74 => Push21,
            0x75 => Push22,
            0x76 => Push23,
            0x77 => Push24,
            0x78 => Push25,
            0x79 => Push26,
            0x7A => Push27,
            0x7B => Push28,
            0x7C => Push29,
            0x7D => Push30,
            0x7E => Push31,
            0x7F => Push32,
            0x80 => Dup1,
            0x81 => Dup2,
            0x82 => Dup3,
            0x83 => Dup4,
            0x84 => Dup5,
            0x85 => Dup6,
            0x86 => Dup7,
            0x87 => Dup8,
            0x88 => Dup9,
            0x89 => Dup10,
            0x8A => Dup11,
            0x8B => Dup12,
            0x8C => Dup13,
            0x8D => Dup14,
            0x8E => Dup15,
            0x8F => Dup16,
            0x90 => Swap1,
            0x91 => Swap2,
            0x92 => Swap3,
            0x93 => Swap4,
            0x94 => Swap5,
            0x95 => Swap6,
            0x96 => Swap7,
            0x97 => Swap8,
            0x98 => Swap9,
            0x99 => Swap10,
            0x9A => Swap11,
            0x9B => Swap12,
            0x9C => Swap13,
            0x9D => Swap14,
            0x9E => Swap15,
            0x9F => Swap16,
            0xA0 => Log0,
            0xA1 => Log1,
            0xA2 => Log2,
            0xA3 => Log3,
            0xA4 => Log4,
            0xF0 => Create,
            0xF1 => Call,
            0xF2 => CallCode,
            0xF3 => Return,
            0xF4 => DelegateCall,
            0xF5 => Create2,
            0xFA => StaticCall,
            0xFD => Revert,
            0xFE => Invalid,
            0xFF => SelfDestruct,
            _ => return None,
        })
    }

    /// Raw byte value.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Number of immediate data bytes for PUSH1..PUSH32, `None` otherwise.
    #[must_use]
    pub fn push_bytes(self) -> Option<usize> {
        let byte = self.as_byte();
        (0x60..=0x7F)
            .contains(&byte)
            .then(|| usize::from(byte - 0x5F))
    }

    /// Operand depth for DUP1..DUP16, `None` otherwise.
    #[must_use]
    pub fn dup_depth(self) -> Option<usize> {
        let byte = self.as_byte();
        (0x80..=0x8F)
            .contains(&byte)
            .then(|| usize::from(byte - 0x7F))
    }

    /// Operand depth for SWAP1..SWAP16, `None` otherwise.
    #[must_use]
    pub fn swap_depth(self) -> Option<usize> {
        let byte = self.as_byte();
        (0x90..=0x9F)
            .contains(&byte)
            .then(|| usize::from(byte - 0x8F))
    }

    /// Topic count for LOG0..LOG4, `None` otherwise.
    #[must_use]
    pub fn log_topics(self) -> Option<usize> {
        let byte = self.as_byte();
        (0xA0..=0xA4)
            .contains(&byte)
            .then(|| usize::from(byte - 0xA0))
    }
}

// =============================================================================
// TESTS
// =============================================================================
