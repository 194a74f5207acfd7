//! Messages the library itself exchanges, framed and dispatched exactly like
//! user messages.

use tern_serde::{NetworkReader, NetworkWriter, Serde, SerdeErr};

use super::message::Message;

/// Client -> server: the client finished loading and wants entity state
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReadyMessage;

/// Server -> client: stop expecting entity state until ready again
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NotReadyMessage;

/// Either direction. Empty: the batch timestamp it travels in is the payload.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeSnapshotMessage;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NetworkPingMessage {
    /// Sender's local time when the ping was sent
    pub local_time: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NetworkPongMessage {
    /// `local_time` of the ping being answered
    pub local_time: f64,
}

macro_rules! impl_empty_message {
    ($($ty:ident => $name:literal),*) => {$(
        impl Serde for $ty {
            fn ser(&self, _writer: &mut NetworkWriter) {}

            fn de(_reader: &mut NetworkReader) -> Result<Self, SerdeErr> {
                Ok(Self)
            }
        }

        impl Message for $ty {
            const NAME: &'static str = $name;
        }
    )*};
}

impl_empty_message!(
    ReadyMessage => "tern::ReadyMessage",
    NotReadyMessage => "tern::NotReadyMessage",
    TimeSnapshotMessage => "tern::TimeSnapshotMessage"
);

impl Serde for NetworkPingMessage {
    fn ser(&self, writer: &mut NetworkWriter) {
        writer.write_f64(self.local_time);
    }

    fn de(reader: &mut NetworkReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            local_time: reader.read_f64()?,
        })
    }
}

impl Message for NetworkPingMessage {
    const NAME: &'static str = "tern::NetworkPingMessage";
}

impl Serde for NetworkPongMessage {
    fn ser(&self, writer: &mut NetworkWriter) {
        writer.write_f64(self.local_time);
    }

    fn de(reader: &mut NetworkReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            local_time: reader.read_f64()?,
        })
    }
}

impl Message for NetworkPongMessage {
    const NAME: &'static str = "tern::NetworkPongMessage";
}
