use std::{
    any::Any,
    collections::HashMap,
    error::Error,
    panic::{self, AssertUnwindSafe},
};

use log::{error, warn};
use tern_serde::NetworkReader;

use crate::{
    connection::Connection,
    messages::{
        error::{DispatchError, MessageError},
        message::{unpack, unpack_id, Message},
    },
    types::Channel,
};

/// What a message handler returns. Any error disconnects the sender.
pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

type BoxedHandler<C> = Box<
    dyn FnMut(&mut C, &mut Connection, &mut NetworkReader<'_>, Channel) -> Result<(), DispatchError>,
>;

struct Handler<C> {
    name: &'static str,
    require_authentication: bool,
    invoke: BoxedHandler<C>,
}

/// Message id -> handler table for one context type `C`.
///
/// `dispatch` is the isolation boundary: whatever a peer sends, and whatever
/// a handler does with it, the worst outcome is that one connection gets
/// disconnected.
pub struct MessageHandlers<C> {
    handlers: HashMap<u16, Handler<C>>,
}

impl<C: 'static> MessageHandlers<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for `M`, replacing a previous handler for the same
    /// message. Fails if another message already owns the id.
    pub fn register<M, F>(
        &mut self,
        require_authentication: bool,
        mut handler: F,
    ) -> Result<(), MessageError>
    where
        M: Message,
        F: FnMut(&mut C, &mut Connection, M, Channel) -> HandlerResult + 'static,
    {
        if let Some(existing) = self.handlers.get(&M::ID) {
            if existing.name != M::NAME {
                return Err(MessageError::IdCollision {
                    id: M::ID,
                    name: M::NAME,
                    existing: existing.name,
                });
            }
            warn!("Replacing handler for {}", M::NAME);
        }

        let invoke = boxed(move |context: &mut C, connection: &mut Connection, reader, channel| {
            let message = unpack::<M>(reader).map_err(|error| DispatchError::Malformed {
                message: M::NAME,
                error,
            })?;

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                handler(context, connection, message, channel)
            }));

            match outcome {
                Ok(Ok(())) => Ok(()),
                Ok(Err(failure)) => Err(DispatchError::HandlerFailed {
                    message: M::NAME,
                    reason: failure.to_string(),
                }),
                Err(payload) => Err(DispatchError::HandlerPanicked {
                    message: M::NAME,
                    reason: panic_reason(payload.as_ref()),
                }),
            }
        });

        self.handlers.insert(
            M::ID,
            Handler {
                name: M::NAME,
                require_authentication,
                invoke,
            },
        );
        Ok(())
    }

    /// Returns true if a handler was removed
    pub fn unregister<M: Message>(&mut self) -> bool {
        self.handlers.remove(&M::ID).is_some()
    }

    pub fn contains(&self, id: u16) -> bool {
        self.handlers.contains_key(&id)
    }

    /// Name of the message registered under `id`
    pub fn name(&self, id: u16) -> Option<&'static str> {
        self.handlers.get(&id).map(|handler| handler.name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Routes one framed message (`[id][body]`) to its handler.
    ///
    /// On success returns the number of bytes the message occupied, which is
    /// also recorded in the connection's diagnostics. On failure the
    /// connection has already been told to disconnect.
    pub fn dispatch(
        &mut self,
        context: &mut C,
        connection: &mut Connection,
        message: &[u8],
        channel: Channel,
    ) -> Result<usize, DispatchError> {
        let mut reader = NetworkReader::new(message);
        match self.invoke(context, connection, &mut reader, channel) {
            Ok(id) => {
                let size = reader.position();
                connection.diagnostics_mut().on_receive(id, size);
                Ok(size)
            }
            Err(dispatch_error) => {
                match &dispatch_error {
                    DispatchError::HandlerFailed { .. } | DispatchError::HandlerPanicked { .. } => {
                        error!("Disconnecting {}: {}", connection.id(), dispatch_error)
                    }
                    _ => warn!("Disconnecting {}: {}", connection.id(), dispatch_error),
                }
                connection.disconnect();
                Err(dispatch_error)
            }
        }
    }

    fn invoke(
        &mut self,
        context: &mut C,
        connection: &mut Connection,
        reader: &mut NetworkReader<'_>,
        channel: Channel,
    ) -> Result<u16, DispatchError> {
        let Some(id) = unpack_id(reader) else {
            return Err(DispatchError::MissingMessageId {
                length: reader.capacity(),
            });
        };

        let Some(handler) = self.handlers.get_mut(&id) else {
            return Err(DispatchError::UnknownMessageId { id });
        };

        if handler.require_authentication && !connection.is_authenticated() {
            return Err(DispatchError::Unauthenticated {
                message: handler.name,
                connection_id: connection.id(),
            });
        }

        (handler.invoke)(context, connection, reader, channel)?;
        Ok(id)
    }
}

impl<C: 'static> Default for MessageHandlers<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn boxed<C, F>(handler: F) -> BoxedHandler<C>
where
    F: FnMut(&mut C, &mut Connection, &mut NetworkReader<'_>, Channel) -> Result<(), DispatchError>
        + 'static,
{
    Box::new(handler)
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        reason.to_string()
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        reason.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
