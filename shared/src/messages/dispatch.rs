use log::warn;
use tern_serde::NetworkReader;

use crate::{connection::Connection, messages::MessageHandlers, types::Channel};

/// Feeds one received batch into `connection` and dispatches every message
/// in it. Messages with an id in `system_handlers` go there, everything else
/// goes to `handlers`.
///
/// Stops at the first framing or dispatch failure: by then the connection
/// is disconnecting and the rest of what it sent is ignored. Batches that
/// arrive for a disconnecting connection are dropped unread.
#[allow(clippy::too_many_arguments)]
pub fn dispatch_batch<S: 'static, C: 'static>(
    connection: &mut Connection,
    bytes: &[u8],
    channel: Channel,
    now: f64,
    system_handlers: &mut MessageHandlers<S>,
    system_context: &mut S,
    handlers: &mut MessageHandlers<C>,
    context: &mut C,
) {
    // nothing queues up while the transport confirms the disconnect
    if connection.is_disconnect_requested() {
        return;
    }

    if let Err(batch_error) = connection.receive_batch(bytes, now) {
        warn!("Disconnecting {}: {}", connection.id(), batch_error);
        connection.disconnect();
        return;
    }

    while !connection.is_disconnect_requested() {
        let message = match connection.next_message() {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(batch_error) => {
                warn!("Disconnecting {}: {}", connection.id(), batch_error);
                connection.disconnect();
                break;
            }
        };

        let is_system = NetworkReader::new(&message.payload)
            .peek_u16()
            .is_ok_and(|id| system_handlers.contains(id));

        // failures are logged, and the connection disconnected, by dispatch
        let _ = if is_system {
            system_handlers.dispatch(system_context, connection, &message.payload, channel)
        } else {
            handlers.dispatch(context, connection, &message.payload, channel)
        };
    }
}
