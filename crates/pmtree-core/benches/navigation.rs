use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pmtree_core::{
    downcast_pm, new_pm, JsonStateCodec, LifecycleState, Pm, PmContext, PmError, PmFactory,
    PmNode, PmParams, PmState, PresentationModel, SequentialTags, StackNavigator, State,
};
use serde::{Deserialize, Serialize};

const DEPTH_SAMPLES: &[usize] = &[4, 16, 64];

#[derive(Clone, Debug, Serialize, Deserialize)]
enum Route {
    Shell,
    Page(u32),
}

struct ShellPm {
    node: PmNode<Route>,
    stack: StackNavigator<Route>,
}

impl PresentationModel<Route> for ShellPm {
    fn node(&self) -> &PmNode<Route> {
        &self.node
    }
}

struct PagePm {
    node: PmNode<Route>,
    _scroll: State<f32>,
}

impl PresentationModel<Route> for PagePm {
    fn node(&self) -> &PmNode<Route> {
        &self.node
    }
}

fn factory() -> Rc<dyn PmFactory<Route>> {
    Rc::new(|params: PmParams<Route>| -> Result<Pm<Route>, PmError> {
        let pm: Pm<Route> = match params.description {
            Route::Shell => new_pm(params, |node| {
                let stack = node.stack_navigator(Route::Page(0))?;
                Ok(ShellPm { node, stack })
            })?,
            Route::Page(index) => new_pm(params, |node| {
                let scroll = node.saveable_state("scroll", index as f32 * 12.5);
                Ok(PagePm {
                    node,
                    _scroll: scroll,
                })
            })?,
        };
        Ok(pm)
    })
}

fn context() -> PmContext<Route> {
    PmContext::new(
        factory(),
        Rc::new(JsonStateCodec),
        Rc::new(SequentialTags::default()),
    )
}

fn shell(context: &PmContext<Route>, state: Option<PmState<Route>>) -> Rc<ShellPm> {
    let root = context
        .create_root(Route::Shell, "shell", state)
        .expect("shell");
    let shell: Rc<ShellPm> = downcast_pm(&root).expect("shell type");
    shell.node().move_lifecycle_to(LifecycleState::InForeground);
    shell
}

fn bench_push_pop(c: &mut Criterion) {
    let context = context();
    let shell = shell(&context, None);

    c.bench_function("navigation_push_pop", |b| {
        b.iter(|| {
            let page = shell.stack.push(Route::Page(1)).expect("push");
            black_box(&page);
            shell.stack.pop();
        });
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation_snapshot");
    for &depth in DEPTH_SAMPLES {
        let context = context();
        let shell = shell(&context, None);
        for index in 1..depth {
            shell.stack.push(Route::Page(index as u32)).expect("push");
        }

        group.bench_with_input(BenchmarkId::new("save", depth), &depth, |b, _| {
            b.iter(|| black_box(shell.node().save_state().expect("save")));
        });

        let saved = shell.node().save_state().expect("save");
        group.bench_with_input(BenchmarkId::new("rebuild", depth), &depth, |b, _| {
            b.iter(|| {
                let rebuilt = self::shell(&context, Some(saved.clone()));
                black_box(rebuilt.stack.len());
                rebuilt.node().move_lifecycle_to(LifecycleState::Destroyed);
            });
        });
    }
    group.finish();
}

criterion_group!(navigation, bench_push_pop, bench_snapshot);
criterion_main!(navigation);
