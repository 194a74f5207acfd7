use crate::{error::SerdeErr, var_uint::read_var_uint};

/// A cursor over a borrowed byte slice. Every read is bounds-checked, so
/// malformed input surfaces as a `SerdeErr` rather than a panic.
#[derive(Debug, Clone)]
pub struct NetworkReader<'b> {
    buffer: &'b [u8],
    position: usize,
}

impl<'b> NetworkReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn take(&mut self, count: usize) -> Result<&'b [u8], SerdeErr> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(SerdeErr::UnexpectedEnd {
                needed: count,
                remaining,
            });
        }
        let start = self.position;
        self.position += count;
        Ok(&self.buffer[start..self.position])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], SerdeErr> {
        let mut output = [0u8; N];
        output.copy_from_slice(self.take(N)?);
        Ok(output)
    }

    pub fn read_u8(&mut self) -> Result<u8, SerdeErr> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, SerdeErr> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(SerdeErr::InvalidBool { byte }),
        }
    }

    pub fn read_u16(&mut self) -> Result<u16, SerdeErr> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    /// Reads a u16 without advancing
    pub fn peek_u16(&self) -> Result<u16, SerdeErr> {
        self.clone().read_u16()
    }

    pub fn read_u32(&mut self) -> Result<u32, SerdeErr> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, SerdeErr> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, SerdeErr> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, SerdeErr> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'b [u8], SerdeErr> {
        self.take(count)
    }

    pub fn read_var_uint(&mut self) -> Result<u64, SerdeErr> {
        let (value, used) = read_var_uint(&self.buffer[self.position..])?;
        self.position += used;
        Ok(value)
    }

    /// Reads a var-uint length prefix and checks it against what is left,
    /// so a hostile length can't trigger a huge allocation
    pub fn read_length(&mut self) -> Result<usize, SerdeErr> {
        let length = self.read_var_uint()?;
        let length =
            usize::try_from(length).map_err(|_| SerdeErr::LengthTooLarge { length })?;
        let remaining = self.remaining();
        if length > remaining {
            return Err(SerdeErr::UnexpectedEnd {
                needed: length,
                remaining,
            });
        }
        Ok(length)
    }
}
