use tern_serde::{NetworkReader, NetworkWriter, Serde, SerdeErr};

/// Size of the message id header in front of every message body
pub const ID_SIZE: usize = 2;

/// A typed message that can be framed with a 16-bit id.
///
/// The id is derived from `NAME` at compile time, so both peers agree on it
/// without exchanging a registry. `NAME` should be fully qualified, e.g.
/// `"my_game::ChatMessage"`, to keep collisions unlikely.
pub trait Message: Serde + 'static {
    const NAME: &'static str;
    const ID: u16 = stable_id(Self::NAME);
}

/// Deterministic 32-bit string hash. Unlike `std::hash`, the result never
/// changes between builds, platforms or processes.
pub const fn stable_hash(name: &str) -> u32 {
    let bytes = name.as_bytes();
    let mut hash: u32 = 23;
    let mut i = 0;
    while i < bytes.len() {
        hash = hash.wrapping_mul(31).wrapping_add(bytes[i] as u32);
        i += 1;
    }
    hash
}

/// `stable_hash` folded into 16 bits
pub const fn stable_id(name: &str) -> u16 {
    let hash = stable_hash(name);
    ((hash >> 16) ^ hash) as u16
}

/// Writes `[id: u16][body]`
pub fn pack<M: Message>(message: &M, writer: &mut NetworkWriter) {
    writer.write_u16(M::ID);
    message.ser(writer);
}

/// Reads the id header. None if the input is too short to hold one.
pub fn unpack_id(reader: &mut NetworkReader) -> Option<u16> {
    reader.read_u16().ok()
}

/// Reads a message body. The reader must be positioned after the id.
pub fn unpack<M: Message>(reader: &mut NetworkReader) -> Result<M, SerdeErr> {
    M::de(reader)
}
