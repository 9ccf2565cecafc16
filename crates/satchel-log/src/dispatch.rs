//! Runtime routing of decoded records to registered handlers.

use std::collections::HashMap;

use satchel_schema::TypeRef;
use satchel_wire::WireScalar;

use crate::framer::RecordHeader;
use satchel_dynamic::UnpackError;

type Handler<'a> = Box<dyn FnMut(&TypeRef, &[u8]) + 'a>;

struct Route<'a> {
    descriptor: TypeRef,
    handlers: Vec<Handler<'a>>,
}

/// An inverse map from message UID to consumers.
///
/// Handlers are invoked in registration order, each receiving the message
/// descriptor and the full record bytes (header included). A record whose
/// UID nothing registered is a legitimate "not interested" case and is
/// skipped without error.
#[derive(Default)]
pub struct Dispatcher<'a> {
    routes: HashMap<u32, Route<'a>>,
}

impl<'a> Dispatcher<'a> {
    /// An empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for one message type.
    ///
    /// Multiple handlers may register for the same UID; all run on each
    /// matching record, in registration order.
    pub fn register(
        &mut self,
        message: &TypeRef,
        handler: impl FnMut(&TypeRef, &[u8]) + 'a,
    ) {
        self.routes
            .entry(message.uid())
            .or_insert_with(|| Route { descriptor: message.clone(), handlers: Vec::new() })
            .handlers
            .push(Box::new(handler));
    }

    /// Message UIDs with at least one registered handler.
    pub fn registered_uids(&self) -> impl Iterator<Item = u32> + '_ {
        self.routes.keys().copied()
    }

    /// Route one record to its handlers.
    ///
    /// Returns the number of handlers invoked, which is zero when the UID has no
    /// registration (skipped, not an error).
    ///
    /// # Errors
    ///
    /// [`UnpackError::InvalidLen`] if the buffer cannot hold a header, or if
    /// a registered record's header `len` disagrees with either the buffer
    /// length or the descriptor's packed size.
    pub fn dispatch(&mut self, buf: &[u8]) -> Result<usize, UnpackError> {
        if buf.len() < RecordHeader::SIZE {
            return Err(UnpackError::InvalidLen {
                expected: RecordHeader::SIZE,
                actual: buf.len(),
            });
        }

        let uid = u32::unpack_be(buf);
        let len = usize::from(u16::unpack_be(&buf[4..]));

        let Some(route) = self.routes.get_mut(&uid) else {
            return Ok(0);
        };

        if len != buf.len() {
            return Err(UnpackError::InvalidLen { expected: len, actual: buf.len() });
        }
        if len != route.descriptor.packed_size() {
            return Err(UnpackError::InvalidLen {
                expected: route.descriptor.packed_size(),
                actual: len,
            });
        }

        for handler in &mut route.handlers {
            handler(&route.descriptor, buf);
        }
        Ok(route.handlers.len())
    }
}

impl std::fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("routes", &self.routes.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use satchel_schema::DescriptorBuilder;

    use super::*;

    fn types() -> DescriptorBuilder {
        DescriptorBuilder::from_str(concat!(
            "Ping:\n  type: Message\n  fields:\n    - counter: uint32\n",
            "Pong:\n  type: Message\n  fields:\n    - counter: uint32\n",
        ))
        .expect("schema should parse")
    }

    fn packed(msg: &TypeRef, counter: u32) -> Vec<u8> {
        let mut buf = vec![0u8; msg.packed_size()];
        msg.uid().pack_be(&mut buf);
        (msg.packed_size() as u16).pack_be(&mut buf[4..]);
        counter.pack_be(&mut buf[6..]);
        buf
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let types = types();
        let ping = types.get("Ping").unwrap().clone();

        let order = std::cell::RefCell::new(Vec::new());
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(&ping, |_, _| order.borrow_mut().push("first"));
        dispatcher.register(&ping, |_, _| order.borrow_mut().push("second"));

        let invoked = dispatcher.dispatch(&packed(&ping, 1)).unwrap();
        assert_eq!(invoked, 2);
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unknown_uid_is_skipped_silently() {
        let types = types();
        let ping = types.get("Ping").unwrap().clone();
        let pong = types.get("Pong").unwrap().clone();

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(&ping, |_, _| panic!("ping handler must not run"));

        let invoked = dispatcher.dispatch(&packed(&pong, 1)).unwrap();
        assert_eq!(invoked, 0);
    }

    #[test]
    fn length_mismatch_is_reported() {
        let types = types();
        let ping = types.get("Ping").unwrap().clone();

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(&ping, |_, _| {});

        // Header claims the right length but the buffer carries a stray
        // trailing byte.
        let mut buf = packed(&ping, 1);
        buf.push(0xFF);
        let err = dispatcher.dispatch(&buf).unwrap_err();
        assert_eq!(err, UnpackError::InvalidLen { expected: 10, actual: 11 });
    }

    #[test]
    fn handler_receives_full_record() {
        let types = types();
        let ping = types.get("Ping").unwrap().clone();
        let record = packed(&ping, 0xFEED);

        let seen = std::cell::RefCell::new(Vec::new());
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(&ping, |desc, bytes| {
            assert_eq!(desc.name(), "Ping");
            seen.borrow_mut().extend_from_slice(bytes);
        });
        dispatcher.dispatch(&record).unwrap();

        assert_eq!(*seen.borrow(), record);
    }
}
