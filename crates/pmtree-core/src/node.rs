//! Presentation-model nodes and the tree wiring between them.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::StateCodec;
use crate::error::PmError;
use crate::lifecycle::{transition_path, Lifecycle, LifecycleEvent, LifecycleState};
use crate::message::{MessageHandler, PmMessage};
use crate::navigation::{EntrySpec, HostLink, Navigator, SetNavigator, StackNavigator};
use crate::saveable::SaveableRegistry;
use crate::scope::WorkScope;
use crate::snapshot::PmState;
use crate::state::State;

/// Value describing how to (re)build a presentation model. Usually an
/// application enum matched by the [`PmFactory`].
pub trait Description: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static {}

impl<T> Description for T where T: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static {}

pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// A screen-level state holder. Implementors own a [`PmNode`] and override
/// the hooks they care about.
pub trait PresentationModel<D: Description>: AsAny {
    fn node(&self) -> &PmNode<D>;

    fn on_create(&self) {}

    fn on_foreground(&self) {}

    fn on_background(&self) {}

    fn on_destroy(&self) {}

    /// Returns `true` when the message was consumed here.
    fn handle_message(&self, _message: &dyn PmMessage) -> bool {
        false
    }
}

pub type Pm<D> = Rc<dyn PresentationModel<D>>;

impl<D: Description> dyn PresentationModel<D> {
    pub fn tag(&self) -> String {
        self.node().tag()
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.node().lifecycle_state()
    }

    pub fn downcast_ref<P: PresentationModel<D>>(&self) -> Option<&P> {
        AsAny::as_any(self).downcast_ref::<P>()
    }
}

impl<D: Description> fmt::Debug for dyn PresentationModel<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.node(), f)
    }
}

pub fn downcast_pm<D: Description, P: PresentationModel<D>>(pm: &Pm<D>) -> Option<Rc<P>> {
    Rc::clone(pm).into_any_rc().downcast::<P>().ok()
}

pub trait PmFactory<D: Description> {
    fn create_pm(&self, params: PmParams<D>) -> Result<Pm<D>, PmError>;
}

impl<D, F> PmFactory<D> for F
where
    D: Description,
    F: Fn(PmParams<D>) -> Result<Pm<D>, PmError>,
{
    fn create_pm(&self, params: PmParams<D>) -> Result<Pm<D>, PmError> {
        self(params)
    }
}

pub trait TagGenerator {
    fn next_tag(&self) -> String;

    /// Called with tags chosen elsewhere (explicit or restored) so generated
    /// tags do not collide with them.
    fn observe(&self, _tag: &str) {}
}

/// Generates `"{prefix}-{n}"` with an increasing `n`.
#[derive(Debug)]
pub struct SequentialTags {
    prefix: String,
    next: Cell<u64>,
}

impl SequentialTags {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Cell::new(1),
        }
    }
}

impl Default for SequentialTags {
    fn default() -> Self {
        Self::new("pm")
    }
}

impl TagGenerator for SequentialTags {
    fn next_tag(&self) -> String {
        let n = self.next.get();
        self.next.set(n.saturating_add(1));
        format!("{}-{n}", self.prefix)
    }

    fn observe(&self, tag: &str) {
        let seen = tag
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|n| n.parse::<u64>().ok());
        if let Some(n) = seen {
            if n >= self.next.get() {
                self.next.set(n.saturating_add(1));
            }
        }
    }
}

/// Services shared by every node of one tree.
pub struct PmContext<D: Description> {
    pub factory: Rc<dyn PmFactory<D>>,
    pub codec: Rc<dyn StateCodec>,
    pub tags: Rc<dyn TagGenerator>,
}

impl<D: Description> Clone for PmContext<D> {
    fn clone(&self) -> Self {
        Self {
            factory: Rc::clone(&self.factory),
            codec: Rc::clone(&self.codec),
            tags: Rc::clone(&self.tags),
        }
    }
}

impl<D: Description> PmContext<D> {
    pub fn new(
        factory: Rc<dyn PmFactory<D>>,
        codec: Rc<dyn StateCodec>,
        tags: Rc<dyn TagGenerator>,
    ) -> Self {
        Self {
            factory,
            codec,
            tags,
        }
    }

    /// Builds a parentless node, optionally from a prior snapshot.
    pub fn create_root(
        &self,
        description: D,
        tag: impl Into<String>,
        state: Option<PmState<D>>,
    ) -> Result<Pm<D>, PmError> {
        self.factory.create_pm(PmParams {
            tag: tag.into(),
            parent: None,
            state,
            description,
            context: self.clone(),
        })
    }
}

/// Everything a factory needs to build one node.
pub struct PmParams<D: Description> {
    pub tag: String,
    pub parent: Option<WeakPmNode<D>>,
    /// Snapshot to rehydrate from while constructing.
    pub state: Option<PmState<D>>,
    pub description: D,
    pub context: PmContext<D>,
}

/// Builds a presentation model around a fresh node and binds the node to it
/// so lifecycle hooks reach the model.
pub fn new_pm<D, P>(
    params: PmParams<D>,
    build: impl FnOnce(PmNode<D>) -> Result<P, PmError>,
) -> Result<Rc<P>, PmError>
where
    D: Description,
    P: PresentationModel<D>,
{
    let pm = Rc::new(build(PmNode::new(params))?);
    let owner: Pm<D> = pm.clone();
    pm.node().bind(Rc::downgrade(&owner));
    Ok(pm)
}

pub(crate) struct NodeInner<D: Description> {
    tag: RefCell<String>,
    description: D,
    parent: Option<WeakPmNode<D>>,
    owner: RefCell<Option<Weak<dyn PresentationModel<D>>>>,
    context: PmContext<D>,
    prior_state: Option<PmState<D>>,
    lifecycle: Lifecycle,
    scope: WorkScope,
    foreground_scope: RefCell<Option<WorkScope>>,
    saveable: SaveableRegistry,
    children: RefCell<Vec<Pm<D>>>,
    navigator: RefCell<Option<Navigator<D>>>,
    messages: MessageHandler,
    in_transition: Cell<bool>,
    pending_target: Cell<Option<LifecycleState>>,
}

pub struct PmNode<D: Description> {
    inner: Rc<NodeInner<D>>,
}

impl<D: Description> Clone for PmNode<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

pub struct WeakPmNode<D: Description> {
    inner: Weak<NodeInner<D>>,
}

impl<D: Description> Clone for WeakPmNode<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<D: Description> WeakPmNode<D> {
    pub fn upgrade(&self) -> Option<PmNode<D>> {
        self.inner.upgrade().map(|inner| PmNode { inner })
    }
}

impl<D: Description> PmNode<D> {
    pub fn new(params: PmParams<D>) -> Self {
        let PmParams {
            tag,
            parent,
            state,
            description,
            context,
        } = params;
        let tag = state.as_ref().map_or(tag, |state| state.tag.clone());
        context.tags.observe(&tag);
        Self {
            inner: Rc::new(NodeInner {
                scope: WorkScope::new(tag.clone()),
                tag: RefCell::new(tag),
                description,
                parent,
                owner: RefCell::new(None),
                context,
                prior_state: state,
                lifecycle: Lifecycle::new(),
                foreground_scope: RefCell::new(None),
                saveable: SaveableRegistry::default(),
                children: RefCell::new(Vec::new()),
                navigator: RefCell::new(None),
                messages: MessageHandler::default(),
                in_transition: Cell::new(false),
                pending_target: Cell::new(None),
            }),
        }
    }

    pub(crate) fn bind(&self, owner: Weak<dyn PresentationModel<D>>) {
        *self.inner.owner.borrow_mut() = Some(owner);
    }

    fn owner(&self) -> Option<Pm<D>> {
        self.inner.owner.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn downgrade(&self) -> WeakPmNode<D> {
        WeakPmNode {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn tag(&self) -> String {
        self.inner.tag.borrow().clone()
    }

    pub(crate) fn set_tag(&self, tag: String) {
        self.inner.context.tags.observe(&tag);
        *self.inner.tag.borrow_mut() = tag;
    }

    pub fn description(&self) -> &D {
        &self.inner.description
    }

    pub fn parent(&self) -> Option<PmNode<D>> {
        self.inner.parent.as_ref().and_then(WeakPmNode::upgrade)
    }

    pub fn context(&self) -> &PmContext<D> {
        &self.inner.context
    }

    pub(crate) fn codec(&self) -> &dyn StateCodec {
        &*self.inner.context.codec
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.inner.lifecycle
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.inner.lifecycle.state()
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle_state().is_destroyed()
    }

    /// Work scope living until the node is destroyed.
    pub fn scope(&self) -> WorkScope {
        self.inner.scope.clone()
    }

    /// Work scope of the current foreground period, if the node is in
    /// foreground.
    pub fn foreground_scope(&self) -> Option<WorkScope> {
        self.inner.foreground_scope.borrow().clone()
    }

    pub fn messages(&self) -> &MessageHandler {
        &self.inner.messages
    }

    pub fn children(&self) -> Vec<Pm<D>> {
        self.inner.children.borrow().clone()
    }

    pub fn navigator(&self) -> Option<Navigator<D>> {
        self.inner.navigator.borrow().clone()
    }

    pub(crate) fn saveable(&self) -> &SaveableRegistry {
        &self.inner.saveable
    }

    pub fn saveable_keys(&self) -> Vec<String> {
        self.inner.saveable.keys()
    }

    /// Registers a cell that survives snapshots. When the node is being
    /// rebuilt from a snapshot holding `key`, the saved value replaces
    /// `initial`.
    pub fn saveable_state<T>(&self, key: &str, initial: T) -> State<T>
    where
        T: Clone + Serialize + DeserializeOwned + 'static,
    {
        let state = State::new(initial);
        self.inner.saveable.register(key, state.clone());
        if let Some(saved) = self
            .inner
            .prior_state
            .as_ref()
            .and_then(|prior| prior.states.get(key))
        {
            self.inner
                .saveable
                .restore_key(self.codec(), key, saved, &self.tag());
        }
        state
    }

    pub(crate) fn create_child(
        &self,
        description: D,
        tag: Option<String>,
        state: Option<PmState<D>>,
    ) -> Result<Pm<D>, PmError> {
        let tag = match tag {
            Some(tag) => tag,
            None => self.inner.context.tags.next_tag(),
        };
        self.inner.context.factory.create_pm(PmParams {
            tag,
            parent: Some(self.downgrade()),
            state,
            description,
            context: self.inner.context.clone(),
        })
    }

    /// Creates a child that shares this node's lifecycle without being part
    /// of any navigator.
    pub fn attached_child(&self, description: D, tag: impl Into<String>) -> Result<Pm<D>, PmError> {
        let index = self.inner.children.borrow().len();
        let state = self
            .inner
            .prior_state
            .as_ref()
            .and_then(|prior| prior.children.get(index))
            .cloned();
        let child = self.create_child(description, Some(tag.into()), state)?;
        child.node().move_lifecycle_to(self.lifecycle_state());
        self.inner.children.borrow_mut().push(Rc::clone(&child));
        Ok(child)
    }

    fn host_link(&self) -> HostLink<D> {
        HostLink::new(self.downgrade())
    }

    /// Installs a stack navigator starting at `initial`, or at the saved
    /// backstack when the node is being rebuilt from a snapshot. Calling it
    /// again returns the installed navigator.
    pub fn stack_navigator(&self, initial: D) -> Result<StackNavigator<D>, PmError> {
        if let Some(installed) = self.inner.navigator.borrow().as_ref() {
            return match installed {
                Navigator::Stack(stack) => Ok(stack.clone()),
                Navigator::Set(_) => Err(PmError::NavigatorInstalled { tag: self.tag() }),
            };
        }

        let navigator = StackNavigator::new(self.host_link());
        let saved = self
            .inner
            .prior_state
            .as_ref()
            .and_then(|prior| prior.backstack.as_ref())
            .filter(|backstack| !backstack.is_empty());
        match saved {
            Some(backstack) => {
                let specs = backstack
                    .iter()
                    .map(|entry| EntrySpec {
                        description: entry.description.clone(),
                        tag: Some(entry.state.tag.clone()),
                        state: Some(entry.state.clone()),
                    })
                    .collect();
                navigator.replace_with(specs)?;
            }
            None => {
                navigator.push(initial)?;
            }
        }
        *self.inner.navigator.borrow_mut() = Some(Navigator::Stack(navigator.clone()));
        Ok(navigator)
    }

    /// Installs a set navigator over `entries` (description and tag each),
    /// with the first entry current unless a snapshot says otherwise.
    pub fn set_navigator(
        &self,
        entries: impl IntoIterator<Item = (D, String)>,
    ) -> Result<SetNavigator<D>, PmError> {
        if let Some(installed) = self.inner.navigator.borrow().as_ref() {
            return match installed {
                Navigator::Set(set) => Ok(set.clone()),
                Navigator::Stack(_) => Err(PmError::NavigatorInstalled { tag: self.tag() }),
            };
        }

        let prior = self.inner.prior_state.as_ref();
        let saved = prior.and_then(|prior| prior.backstack.as_ref());
        let specs: Vec<EntrySpec<D>> = entries
            .into_iter()
            .enumerate()
            .map(|(index, (description, tag))| EntrySpec {
                description,
                tag: Some(tag),
                state: saved
                    .and_then(|backstack| backstack.get(index))
                    .map(|entry| entry.state.clone()),
            })
            .collect();
        let len = specs.len();
        let current = match prior.and_then(|prior| prior.current) {
            Some(index) if index >= len => {
                log::warn!(
                    "{}: saved current entry {index} is out of range for {len} entries",
                    self.tag()
                );
                0
            }
            Some(index) => index,
            None => 0,
        };
        let navigator = SetNavigator::new(self.host_link(), specs, current)?;
        *self.inner.navigator.borrow_mut() = Some(Navigator::Set(navigator.clone()));
        Ok(navigator)
    }

    /// Walks the lifecycle to `target`, firing hooks and propagating each step
    /// to attached children and the navigator's current entry. Requests made
    /// while a transition of this node is running are applied after it.
    pub fn move_lifecycle_to(&self, target: LifecycleState) {
        if self.inner.in_transition.replace(true) {
            self.inner.pending_target.set(Some(target));
            return;
        }
        let mut next = Some(target);
        while let Some(target) = next {
            self.walk_to(target);
            next = self.inner.pending_target.take();
        }
        self.inner.in_transition.set(false);
    }

    fn walk_to(&self, target: LifecycleState) {
        let owner = self.owner();
        for &event in transition_path(self.lifecycle_state(), target) {
            self.inner.lifecycle.apply(event);
            log::trace!("{}: {event:?}", self.tag());

            match event {
                LifecycleEvent::OnCreate => {
                    if let Some(pm) = &owner {
                        pm.on_create();
                    }
                }
                LifecycleEvent::OnForeground => {
                    let scope = self.inner.scope.child(format!("{}/foreground", self.tag()));
                    *self.inner.foreground_scope.borrow_mut() = Some(scope);
                    if let Some(pm) = &owner {
                        pm.on_foreground();
                    }
                }
                LifecycleEvent::OnBackground => {
                    if let Some(pm) = &owner {
                        pm.on_background();
                    }
                }
                LifecycleEvent::OnDestroy => {
                    if let Some(pm) = &owner {
                        pm.on_destroy();
                    }
                }
            }

            self.propagate(event.resulting_state());

            match event {
                LifecycleEvent::OnBackground => {
                    let scope = self.inner.foreground_scope.borrow_mut().take();
                    if let Some(scope) = scope {
                        scope.cancel();
                    }
                }
                LifecycleEvent::OnDestroy => self.inner.scope.cancel(),
                _ => {}
            }
        }
    }

    fn propagate(&self, state: LifecycleState) {
        for child in self.children() {
            child.node().move_lifecycle_to(state);
        }
        if let Some(navigator) = self.navigator() {
            if let Some(current) = navigator.current() {
                current.node().move_lifecycle_to(state);
            }
            if state.is_destroyed() {
                navigator.destroy_hidden();
            }
        }
    }

    /// Offers a back press to the deepest navigator first. Returns `false`
    /// when nothing in this subtree could go back.
    pub fn handle_back(&self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let Some(navigator) = self.navigator() else {
            return false;
        };
        if let Some(current) = navigator.current() {
            if current.node().handle_back() {
                return true;
            }
        }
        navigator.pop_for_back()
    }

    /// Closes the current screen: pops this node's own stack when it can,
    /// otherwise asks the parent to.
    pub fn back(&self) {
        if let Some(Navigator::Stack(stack)) = self.navigator() {
            if stack.pop() {
                return;
            }
        }
        if let Some(parent) = self.parent() {
            parent.back();
        }
    }

    /// Delivers `message` to this node, then to its ancestors until one
    /// handles it. Returns whether anyone did.
    pub fn send_message(&self, message: impl PmMessage) -> bool {
        self.dispatch_message(&message)
    }

    fn dispatch_message(&self, message: &dyn PmMessage) -> bool {
        if self.is_destroyed() {
            log::debug!("{}: destroyed, dropping {message:?}", self.tag());
            return false;
        }
        let handled_by_owner = self
            .owner()
            .is_some_and(|owner| owner.handle_message(message));
        if handled_by_owner || self.inner.messages.dispatch(message) {
            return true;
        }
        match self.parent() {
            Some(parent) => parent.dispatch_message(message),
            None => {
                log::debug!("{}: unhandled message {message:?} dropped", self.tag());
                false
            }
        }
    }
}

impl<D: Description> fmt::Debug for PmNode<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PmNode")
            .field("tag", &self.tag())
            .field("description", self.description())
            .field("state", &self.lifecycle_state())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/node_tests.rs"]
mod tests;
