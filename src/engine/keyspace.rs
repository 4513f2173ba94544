//! Keyspaces
//!
//! Every key the engine stores carries a one-byte tag naming its keyspace,
//! so caller data and sequence leases can never overwrite each other no
//! matter what bytes the caller picks.

/// Disjoint key namespaces within one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyspace {
    /// Keys written through [`Engine::put`](super::Engine::put)
    Data,
    /// Sequence leases
    Sequences,
}

impl Keyspace {
    fn tag(self) -> u8 {
        match self {
            Keyspace::Data => b'd',
            Keyspace::Sequences => b's',
        }
    }

    /// Physical key for `key` in this keyspace
    pub(crate) fn scoped(self, key: &[u8]) -> Vec<u8> {
        let mut scoped = Vec::with_capacity(key.len() + 1);
        scoped.push(self.tag());
        scoped.extend_from_slice(key);
        scoped
    }
}
