#![doc = r"Presentation-model trees: lifecycle propagation, navigation and state snapshots."]

pub mod codec;
pub mod collections;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod navigation;
pub mod node;
mod saveable;
pub mod scope;
pub mod snapshot;
pub mod state;

pub use codec::{JsonStateCodec, SerializedValue, StateCodec, TypeDescriptor};
pub use error::{CodecError, PmError};
pub use lifecycle::{transition_path, Lifecycle, LifecycleEvent, LifecycleEvents, LifecycleState};
pub use message::{MessageHandler, PmMessage};
pub use navigation::{
    BackStackEntry, NavigationChanges, Navigator, SetNavigator, StackChange, StackNavigator,
};
pub use node::{
    downcast_pm, new_pm, AsAny, Description, Pm, PmContext, PmFactory, PmNode, PmParams,
    PresentationModel, SequentialTags, TagGenerator, WeakPmNode,
};
pub use scope::{WorkFailure, WorkScope};
pub use snapshot::{BackStackEntryState, PmState};
pub use state::{State, StateStream};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
