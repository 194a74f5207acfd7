/// PROPERTY-BASED TESTS: batching invariants
///
/// 1. Messages come out in the order they went in, byte for byte
/// 2. Every message carries the timestamp of the batch it travelled in
/// 3. Only a batch holding a single oversized message exceeds the threshold

use proptest::prelude::*;
use tern_shared::{Batcher, NetworkWriter, Unbatcher};

fn messages_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 0..40)
}

fn message_count(batch: &[u8]) -> usize {
    let mut unbatcher = Unbatcher::new();
    unbatcher.add_batch(batch).unwrap();
    let mut count = 0;
    while unbatcher.next_message().unwrap().is_some() {
        count += 1;
    }
    count
}

proptest! {
    #[test]
    fn prop_batches_preserve_order_and_bytes(
        messages in messages_strategy(),
        threshold in 16usize..1500,
        timestamp in 0.0f64..10_000.0,
    ) {
        let mut batcher = Batcher::new(threshold);
        for message in &messages {
            batcher.add_message(message, timestamp);
        }

        let mut unbatcher = Unbatcher::new();
        let mut writer = NetworkWriter::new();
        while batcher.get_batch(&mut writer) {
            if writer.len() > threshold {
                prop_assert_eq!(message_count(writer.as_slice()), 1);
            }
            unbatcher.add_batch(writer.as_slice()).unwrap();
        }
        prop_assert!(!batcher.has_pending());

        let mut received = Vec::new();
        while let Some(message) = unbatcher.next_message().unwrap() {
            prop_assert_eq!(message.remote_time, timestamp);
            received.push(message.payload);
        }
        prop_assert_eq!(received, messages);
    }

    #[test]
    fn prop_truncated_batches_never_panic(
        messages in messages_strategy(),
        cut in any::<prop::sample::Index>(),
    ) {
        let mut batcher = Batcher::new(1200);
        for message in &messages {
            batcher.add_message(message, 1.0);
        }
        let mut writer = NetworkWriter::new();
        prop_assume!(batcher.get_batch(&mut writer));

        let bytes = writer.as_slice();
        let truncated = &bytes[..cut.index(bytes.len())];

        let mut unbatcher = Unbatcher::new();
        if unbatcher.add_batch(truncated).is_ok() {
            // either a prefix of the messages comes out, or an error stops it
            while let Ok(Some(_)) = unbatcher.next_message() {}
        }
    }
}
