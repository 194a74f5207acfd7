mod harness;

pub use harness::{Harness, Inbox, TestClient, STEP};

use tern_shared::{pack, Batcher, Message, NetworkWriter};

/// A message framed with its id, the way it travels inside a batch
pub fn packed<M: Message>(message: &M) -> Vec<u8> {
    let mut writer = NetworkWriter::new();
    pack(message, &mut writer);
    writer.to_bytes()
}

/// One batch holding `messages`, stamped with `timestamp`
pub fn batch_of(messages: &[Vec<u8>], timestamp: f64) -> Vec<u8> {
    let mut batcher = Batcher::new(usize::MAX);
    for message in messages {
        batcher.add_message(message, timestamp);
    }
    let mut writer = NetworkWriter::new();
    batcher.get_batch(&mut writer);
    writer.to_bytes()
}
