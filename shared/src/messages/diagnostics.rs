use std::collections::HashMap;

/// Running totals for one message id
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageStats {
    pub count: u64,
    pub bytes: u64,
}

impl MessageStats {
    fn record(&mut self, bytes: usize) {
        self.count += 1;
        self.bytes += bytes as u64;
    }
}

/// Per message id traffic accounting. Sizes include the id header.
#[derive(Clone, Debug, Default)]
pub struct MessageDiagnostics {
    inbound: HashMap<u16, MessageStats>,
    outbound: HashMap<u16, MessageStats>,
}

impl MessageDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_receive(&mut self, id: u16, bytes: usize) {
        self.inbound.entry(id).or_default().record(bytes);
    }

    pub fn on_send(&mut self, id: u16, bytes: usize) {
        self.outbound.entry(id).or_default().record(bytes);
    }

    pub fn inbound(&self, id: u16) -> MessageStats {
        self.inbound.get(&id).copied().unwrap_or_default()
    }

    pub fn outbound(&self, id: u16) -> MessageStats {
        self.outbound.get(&id).copied().unwrap_or_default()
    }

    pub fn total_inbound(&self) -> MessageStats {
        sum(&self.inbound)
    }

    pub fn total_outbound(&self) -> MessageStats {
        sum(&self.outbound)
    }

    pub fn clear(&mut self) {
        self.inbound.clear();
        self.outbound.clear();
    }
}

fn sum(stats: &HashMap<u16, MessageStats>) -> MessageStats {
    stats.values().fold(MessageStats::default(), |total, stats| MessageStats {
        count: total.count + stats.count,
        bytes: total.bytes + stats.bytes,
    })
}
