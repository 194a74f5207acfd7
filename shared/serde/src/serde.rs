use crate::{error::SerdeErr, reader::NetworkReader, writer::NetworkWriter};

/// A type that can be written to and read back from the wire
pub trait Serde: Sized {
    /// Serialize Self into the writer
    fn ser(&self, writer: &mut NetworkWriter);

    /// Parse Self from the reader
    fn de(reader: &mut NetworkReader) -> Result<Self, SerdeErr>;
}

macro_rules! impl_serde_for_number {
    ($type:ty, $write:ident, $read:ident) => {
        impl Serde for $type {
            fn ser(&self, writer: &mut NetworkWriter) {
                writer.$write(*self);
            }

            fn de(reader: &mut NetworkReader) -> Result<Self, SerdeErr> {
                reader.$read()
            }
        }
    };
}

impl_serde_for_number!(u8, write_u8, read_u8);
impl_serde_for_number!(u16, write_u16, read_u16);
impl_serde_for_number!(u32, write_u32, read_u32);
impl_serde_for_number!(u64, write_u64, read_u64);
impl_serde_for_number!(f32, write_f32, read_f32);
impl_serde_for_number!(f64, write_f64, read_f64);
impl_serde_for_number!(bool, write_bool, read_bool);

impl Serde for i32 {
    fn ser(&self, writer: &mut NetworkWriter) {
        writer.write_u32(*self as u32);
    }

    fn de(reader: &mut NetworkReader) -> Result<Self, SerdeErr> {
        Ok(reader.read_u32()? as i32)
    }
}

impl Serde for i64 {
    fn ser(&self, writer: &mut NetworkWriter) {
        writer.write_u64(*self as u64);
    }

    fn de(reader: &mut NetworkReader) -> Result<Self, SerdeErr> {
        Ok(reader.read_u64()? as i64)
    }
}

impl Serde for () {
    fn ser(&self, _writer: &mut NetworkWriter) {}

    fn de(_reader: &mut NetworkReader) -> Result<Self, SerdeErr> {
        Ok(())
    }
}

impl Serde for String {
    fn ser(&self, writer: &mut NetworkWriter) {
        writer.write_var_uint(self.len() as u64);
        writer.write_bytes(self.as_bytes());
    }

    fn de(reader: &mut NetworkReader) -> Result<Self, SerdeErr> {
        let length = reader.read_length()?;
        let bytes = reader.read_bytes(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerdeErr::InvalidUtf8 { length })
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut NetworkWriter) {
        match self {
            Some(value) => {
                writer.write_u8(1);
                value.ser(writer);
            }
            None => writer.write_u8(0),
        }
    }

    fn de(reader: &mut NetworkReader) -> Result<Self, SerdeErr> {
        match reader.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(T::de(reader)?)),
            tag => Err(SerdeErr::InvalidOptionTag { tag }),
        }
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut NetworkWriter) {
        writer.write_var_uint(self.len() as u64);
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut NetworkReader) -> Result<Self, SerdeErr> {
        // every element takes at least one byte, except zero-sized ones,
        // so the remaining length bounds the preallocation
        let length = reader.read_var_uint()?;
        let length =
            usize::try_from(length).map_err(|_| SerdeErr::LengthTooLarge { length })?;
        let mut output = Vec::with_capacity(length.min(reader.remaining()));
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }
}
