use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::collections::map::HashMap;

/// Opaque signal travelling up the tree until some node handles it.
pub trait PmMessage: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug> PmMessage for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

type Handler = Rc<dyn Fn(&dyn Any) -> bool>;

/// Typed message handlers registered on one node.
///
/// Handlers live as long as the node; capture the owning presentation model
/// weakly to avoid a reference cycle.
#[derive(Default)]
pub struct MessageHandler {
    handlers: RefCell<HashMap<TypeId, Vec<Handler>>>,
}

impl MessageHandler {
    /// Registers a handler for messages of type `M`. Returning `true` marks
    /// the message handled and stops forwarding.
    pub fn on<M: PmMessage>(&self, handler: impl Fn(&M) -> bool + 'static) {
        let handler: Handler = Rc::new(move |message: &dyn Any| {
            message.downcast_ref::<M>().is_some_and(|message| handler(message))
        });
        self.handlers
            .borrow_mut()
            .entry(TypeId::of::<M>())
            .or_default()
            .push(handler);
    }

    pub(crate) fn dispatch(&self, message: &dyn PmMessage) -> bool {
        let message = PmMessage::as_any(message);
        let handlers = self
            .handlers
            .borrow()
            .get(&Any::type_id(message))
            .cloned()
            .unwrap_or_default();
        handlers.iter().any(|handler| handler(message))
    }
}

impl fmt::Debug for MessageHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageHandler")
            .field("types", &self.handlers.borrow().len())
            .finish()
    }
}
