//! Fixture presentation models shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{
    downcast_pm, new_pm, JsonStateCodec, Pm, PmContext, PmError, PmFactory, PmNode, PmParams,
    PmState, PresentationModel, SequentialTags, SetNavigator, StackNavigator, State,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum Screen {
    Root,
    Leaf { name: String },
    Tabs,
    Tab { name: String },
    Broken,
}

impl Screen {
    pub(crate) fn leaf(name: &str) -> Self {
        Screen::Leaf {
            name: name.to_owned(),
        }
    }

    pub(crate) fn tab(name: &str) -> Self {
        Screen::Tab {
            name: name.to_owned(),
        }
    }
}

pub(crate) type HookLog = Rc<RefCell<Vec<String>>>;

fn record(log: &HookLog, node: &PmNode<Screen>, hook: &str) {
    log.borrow_mut().push(format!("{}:{hook}", node.tag()));
}

macro_rules! logged_hooks {
    () => {
        fn on_create(&self) {
            record(&self.log, &self.node, "create");
        }

        fn on_foreground(&self) {
            record(&self.log, &self.node, "foreground");
        }

        fn on_background(&self) {
            record(&self.log, &self.node, "background");
        }

        fn on_destroy(&self) {
            record(&self.log, &self.node, "destroy");
        }
    };
}

/// Two attached leaves (`header`, `footer`), a stack starting at `home` and a
/// saveable `title`.
pub(crate) struct RootPm {
    node: PmNode<Screen>,
    log: HookLog,
    pub(crate) title: State<String>,
    pub(crate) header: Pm<Screen>,
    pub(crate) footer: Pm<Screen>,
    pub(crate) stack: StackNavigator<Screen>,
}

impl RootPm {
    fn new(params: PmParams<Screen>, log: HookLog) -> Result<Rc<Self>, PmError> {
        new_pm(params, |node| {
            let title = node.saveable_state("title", String::from("home"));
            let header = node.attached_child(Screen::leaf("header"), "header")?;
            let footer = node.attached_child(Screen::leaf("footer"), "footer")?;
            let stack = node.stack_navigator(Screen::leaf("home"))?;
            Ok(Self {
                node,
                log,
                title,
                header,
                footer,
                stack,
            })
        })
    }
}

impl PresentationModel<Screen> for RootPm {
    fn node(&self) -> &PmNode<Screen> {
        &self.node
    }

    logged_hooks!();
}

pub(crate) struct LeafPm {
    node: PmNode<Screen>,
    log: HookLog,
    pub(crate) counter: State<i32>,
}

impl LeafPm {
    fn new(params: PmParams<Screen>, log: HookLog) -> Result<Rc<Self>, PmError> {
        new_pm(params, |node| {
            let counter = node.saveable_state("counter", 0);
            Ok(Self { node, log, counter })
        })
    }
}

impl PresentationModel<Screen> for LeafPm {
    fn node(&self) -> &PmNode<Screen> {
        &self.node
    }

    logged_hooks!();
}

/// One tab: a stack starting at `{name}-home`.
pub(crate) struct TabPm {
    node: PmNode<Screen>,
    log: HookLog,
    pub(crate) stack: StackNavigator<Screen>,
}

impl TabPm {
    fn new(params: PmParams<Screen>, log: HookLog, name: &str) -> Result<Rc<Self>, PmError> {
        new_pm(params, |node| {
            let stack = node.stack_navigator(Screen::leaf(&format!("{name}-home")))?;
            Ok(Self { node, log, stack })
        })
    }
}

impl PresentationModel<Screen> for TabPm {
    fn node(&self) -> &PmNode<Screen> {
        &self.node
    }

    logged_hooks!();
}

/// Set navigator over tabs `a`, `b` and `c`.
pub(crate) struct TabsPm {
    node: PmNode<Screen>,
    log: HookLog,
    pub(crate) tabs: SetNavigator<Screen>,
}

impl TabsPm {
    fn new(params: PmParams<Screen>, log: HookLog) -> Result<Rc<Self>, PmError> {
        new_pm(params, |node| {
            let tabs = node.set_navigator(
                ["a", "b", "c"].map(|name| (Screen::tab(name), format!("tab-{name}"))),
            )?;
            Ok(Self { node, log, tabs })
        })
    }
}

impl PresentationModel<Screen> for TabsPm {
    fn node(&self) -> &PmNode<Screen> {
        &self.node
    }

    logged_hooks!();
}

pub(crate) fn factory(log: HookLog) -> Rc<dyn PmFactory<Screen>> {
    Rc::new(move |params: PmParams<Screen>| -> Result<Pm<Screen>, PmError> {
        let log = Rc::clone(&log);
        let pm: Pm<Screen> = match params.description.clone() {
            Screen::Root => RootPm::new(params, log)?,
            Screen::Leaf { .. } => LeafPm::new(params, log)?,
            Screen::Tabs => TabsPm::new(params, log)?,
            Screen::Tab { name } => TabPm::new(params, log, &name)?,
            Screen::Broken => {
                return Err(PmError::UnknownDescription {
                    description: format!("{:?}", params.description),
                })
            }
        };
        Ok(pm)
    })
}

pub(crate) struct Harness {
    pub(crate) log: HookLog,
    pub(crate) context: PmContext<Screen>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let log = HookLog::default();
        let context = PmContext::new(
            factory(Rc::clone(&log)),
            Rc::new(JsonStateCodec),
            Rc::new(SequentialTags::default()),
        );
        Self { log, context }
    }

    pub(crate) fn build(&self, description: Screen, state: Option<PmState<Screen>>) -> Pm<Screen> {
        self.context.create_root(description, "root", state).unwrap()
    }

    pub(crate) fn root(&self) -> Rc<RootPm> {
        downcast_pm(&self.build(Screen::Root, None)).unwrap()
    }

    pub(crate) fn tabs(&self) -> Rc<TabsPm> {
        downcast_pm(&self.build(Screen::Tabs, None)).unwrap()
    }

    pub(crate) fn take_log(&self) -> Vec<String> {
        self.log.borrow_mut().drain(..).collect()
    }
}

pub(crate) fn leaf(pm: &Pm<Screen>) -> Rc<LeafPm> {
    downcast_pm(pm).unwrap()
}

pub(crate) fn tags(pms: &[Pm<Screen>]) -> Vec<String> {
    pms.iter().map(|pm| pm.tag()).collect()
}
