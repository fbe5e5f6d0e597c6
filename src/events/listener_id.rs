//! Registration handles.

/// Opaque handle naming one listener registration.
///
/// Only the emitter mints handles, one per `on`, `on_event` or `once`
/// call, so registering the same listener twice yields two handles. Pass
/// it to [`EventEmitter::remove`](super::EventEmitter::remove) to drop
/// exactly that registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(uuid::Uuid);

impl ListenerId {
    pub(super) fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_registration_gets_a_distinct_handle() {
        let first = ListenerId::new();
        assert_ne!(first, ListenerId::new());
    }
}
