use std::rc::Rc;

use pmtree_core::{
    new_pm, LifecycleState, Navigator, Pm, PmError, PmFactory, PmMessage, PmNode, PmParams,
    PresentationModel, SetNavigator, StackNavigator, State,
};
use pmtree_host::{HostConfig, HostError, PmHost};
use serde::{Deserialize, Serialize};

const TABS: [&str; 3] = ["Tab #1", "Tab #2", "Tab #3"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Screen {
    BottomNavigation,
    Tab { title: String },
    Item { number: u32 },
}

#[derive(Debug)]
struct OpenNext;

#[derive(Debug)]
struct SelectTab(usize);

struct BottomNavigationPm {
    node: PmNode<Screen>,
    tabs: SetNavigator<Screen>,
}

impl PresentationModel<Screen> for BottomNavigationPm {
    fn node(&self) -> &PmNode<Screen> {
        &self.node
    }

    fn handle_message(&self, message: &dyn PmMessage) -> bool {
        let Some(SelectTab(index)) = PmMessage::as_any(message).downcast_ref::<SelectTab>() else {
            return false;
        };
        if let Err(err) = self.tabs.set_current(*index) {
            log::warn!("cannot select tab {index}: {err}");
        }
        true
    }
}

struct TabPm {
    node: PmNode<Screen>,
    items: StackNavigator<Screen>,
}

impl PresentationModel<Screen> for TabPm {
    fn node(&self) -> &PmNode<Screen> {
        &self.node
    }

    fn on_foreground(&self) {
        log::info!("{} visible", self.node.tag());
    }
}

struct ItemPm {
    node: PmNode<Screen>,
    number: u32,
    views: State<u32>,
}

impl PresentationModel<Screen> for ItemPm {
    fn node(&self) -> &PmNode<Screen> {
        &self.node
    }

    fn on_foreground(&self) {
        self.views.update(|views| *views += 1);
    }
}

fn factory() -> Rc<dyn PmFactory<Screen>> {
    Rc::new(|params: PmParams<Screen>| -> Result<Pm<Screen>, PmError> {
        let pm: Pm<Screen> = match params.description {
            Screen::BottomNavigation => new_pm(params, |node| {
                let tabs = node.set_navigator(TABS.map(|title| {
                    (
                        Screen::Tab {
                            title: title.to_owned(),
                        },
                        title.to_owned(),
                    )
                }))?;
                Ok(BottomNavigationPm { node, tabs })
            })?,
            Screen::Tab { .. } => new_pm(params, |node| {
                let items = node.stack_navigator(Screen::Item { number: 1 })?;
                let stack = items.clone();
                node.messages().on::<OpenNext>(move |_| {
                    let number = stack.len() as u32 + 1;
                    if let Err(err) = stack.push(Screen::Item { number }) {
                        log::warn!("cannot open item {number}: {err}");
                    }
                    true
                });
                Ok(TabPm { node, items })
            })?,
            Screen::Item { number } => new_pm(params, |node| {
                let views = node.saveable_state("views", 0u32);
                Ok(ItemPm {
                    node,
                    number,
                    views,
                })
            })?,
        };
        Ok(pm)
    })
}

fn print_tree(pm: &Pm<Screen>, depth: usize) {
    let indent = "  ".repeat(depth);
    let detail = match pm.downcast_ref::<ItemPm>() {
        Some(item) => format!(" item {} viewed {}x", item.number, item.views.value()),
        None => String::new(),
    };
    println!("{indent}{} [{:?}]{detail}", pm.tag(), pm.lifecycle_state());
    if let Some(navigator) = pm.node().navigator() {
        for entry in navigator.entries() {
            print_tree(&entry.pm, depth + 1);
        }
    }
}

fn visible_item(host: &PmHost<Screen>) -> Option<Pm<Screen>> {
    let tab = host.root().node().navigator()?.current()?;
    match tab.node().navigator()? {
        Navigator::Stack(stack) => stack.current(),
        Navigator::Set(_) => None,
    }
}

fn open_next(host: &PmHost<Screen>) {
    if let Some(item) = visible_item(host) {
        item.node().send_message(OpenNext);
    }
}

fn main() -> Result<(), HostError> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig {
            pretty_snapshots: true,
            ..HostConfig::default()
        },
    };

    println!("=== pmtree tabs demo ===");
    let host = PmHost::new(config.clone(), factory(), Screen::BottomNavigation)?;
    host.on_create();
    host.on_foreground();

    open_next(&host);
    open_next(&host);
    if let Some(item) = visible_item(&host) {
        item.node().send_message(SelectTab(1));
    }
    open_next(&host);

    println!("\n-- live tree --");
    print_tree(host.root(), 0);

    host.on_background();
    let json = host.save_json()?;
    println!("\n-- snapshot --\n{json}");
    host.on_destroy();

    let restored = PmHost::from_snapshot_json(config, factory(), &json)?;
    restored.on_create();
    restored.on_foreground();
    println!("\n-- restored tree --");
    print_tree(restored.root(), 0);

    if let Some(tabs) = restored.root_as::<BottomNavigationPm>() {
        let current = tabs.tabs.current_index();
        let items = tabs
            .tabs
            .current()
            .and_then(|tab| restored_stack_len(&tab))
            .unwrap_or_default();
        println!("\ncurrent tab {current} holds {items} items");
    }

    let mut presses = 0;
    while restored.handle_back() {
        presses += 1;
    }
    println!("back handled {presses} times before the host would close");

    restored.on_destroy();
    debug_assert_eq!(restored.lifecycle_state(), LifecycleState::Destroyed);
    Ok(())
}

fn restored_stack_len(tab: &Pm<Screen>) -> Option<usize> {
    tab.downcast_ref::<TabPm>().map(|tab| tab.items.len())
}
