use crate::error::SerdeErr;

// 7 value bits per byte, high bit set when another byte follows
const VALUE_BITS: u32 = 7;
const CONTINUE_FLAG: u8 = 0x80;
const VALUE_MASK: u8 = 0x7F;

/// Maximum number of bytes a u64 var-uint can occupy
pub const MAX_VAR_UINT_BYTES: usize = 10;

/// Number of bytes `value` occupies when written as a var-uint
pub const fn var_uint_size(value: u64) -> usize {
    let mut size = 1;
    let mut rest = value >> VALUE_BITS;
    while rest != 0 {
        size += 1;
        rest >>= VALUE_BITS;
    }
    size
}

pub(crate) fn write_var_uint(buffer: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value as u8) & VALUE_MASK;
        value >>= VALUE_BITS;
        if value == 0 {
            buffer.push(byte);
            return;
        }
        buffer.push(byte | CONTINUE_FLAG);
    }
}

/// Returns the decoded value and how many bytes it used
pub(crate) fn read_var_uint(bytes: &[u8]) -> Result<(u64, usize), SerdeErr> {
    let mut output: u64 = 0;

    for (index, byte) in bytes.iter().enumerate() {
        if index == MAX_VAR_UINT_BYTES {
            break;
        }
        let shift = index as u32 * VALUE_BITS;
        let bits = (byte & VALUE_MASK) as u64;

        // the 10th byte may only carry the single remaining bit of a u64
        if index == MAX_VAR_UINT_BYTES - 1 && bits > 1 {
            return Err(SerdeErr::VarUIntOverflow {
                max_bytes: MAX_VAR_UINT_BYTES,
            });
        }
        output |= bits << shift;

        if byte & CONTINUE_FLAG == 0 {
            return Ok((output, index + 1));
        }
    }

    if bytes.len() >= MAX_VAR_UINT_BYTES {
        Err(SerdeErr::VarUIntOverflow {
            max_bytes: MAX_VAR_UINT_BYTES,
        })
    } else {
        Err(SerdeErr::UnexpectedEnd {
            needed: bytes.len() + 1,
            remaining: bytes.len(),
        })
    }
}
