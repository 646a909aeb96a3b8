//! Integration tests for the owner thread, invocation channel and handle
//! lifecycle, driven through the public API only.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use horizon_tether_core::native::attrs;
use horizon_tether_core::{
    Container, Display, Handle, NativeError, NativeId, OwnerThread, State, Style, TetherError, Widget,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn setup() -> OwnerThread {
    init_tracing();
    OwnerThread::builder()
        .name("integration")
        .idle_interval(Duration::from_millis(5))
        .start()
        .unwrap()
}

/// Top-level surface.
#[derive(Default)]
struct Window;

impl Widget for Window {
    const CLASS: &'static str = "Window";
    const ROOT: bool = true;

    type Field = ();
    type Op = ();

    fn apply_field(&mut self, _: (), _: &mut Display, _: NativeId) -> Result<(), NativeError> {
        Ok(())
    }

    fn execute(&mut self, _: (), _: &mut Display, _: NativeId) -> Result<(), NativeError> {
        Ok(())
    }
}

impl Container for Window {}

/// Plain container.
#[derive(Default)]
struct Panel;

impl Widget for Panel {
    const CLASS: &'static str = "Panel";

    type Field = ();
    type Op = ();

    fn apply_field(&mut self, _: (), _: &mut Display, _: NativeId) -> Result<(), NativeError> {
        Ok(())
    }

    fn execute(&mut self, _: (), _: &mut Display, _: NativeId) -> Result<(), NativeError> {
        Ok(())
    }
}

impl Container for Panel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelField {
    Text,
}

#[derive(Debug)]
enum LabelOp {
    Fetch,
    Push(u32),
    Slow(Duration),
    Explode,
}

/// Leaf widget that records operations in its native text.
#[derive(Default)]
struct Label {
    text: String,
}

impl Widget for Label {
    const CLASS: &'static str = "Label";

    type Field = LabelField;
    type Op = LabelOp;

    fn apply_field(&mut self, field: LabelField, display: &mut Display, native: NativeId) -> Result<(), NativeError> {
        match field {
            LabelField::Text => display.set(native, attrs::TEXT, self.text.clone()),
        }
    }

    fn execute(&mut self, op: LabelOp, display: &mut Display, native: NativeId) -> Result<(), NativeError> {
        match op {
            LabelOp::Fetch => {
                self.text = display.get_or(native, attrs::TEXT, String::new())?;
            }
            LabelOp::Push(n) => {
                let mut text = display.get_or(native, attrs::TEXT, String::new())?;
                text.push_str(&format!("{n};"));
                display.set(native, attrs::TEXT, text)?;
            }
            LabelOp::Slow(duration) => thread::sleep(duration),
            LabelOp::Explode => panic!("label exploded"),
        }
        Ok(())
    }
}

fn native_text(owner: &OwnerThread, label: &Handle<Label>) -> Option<String> {
    let native = label.native()?;
    owner.invoke(move |display| display.get(native, attrs::TEXT).ok().flatten()).unwrap()
}

#[test]
fn ancestor_created_before_child() {
    let owner = setup();
    let window = Handle::new(&owner, Style::NONE, Window);
    let panel = Handle::with_parent(&window, Style::NONE, Panel).unwrap();
    let label = Handle::with_parent(&panel, Style::NONE, Label::default()).unwrap();

    label.create().unwrap();

    assert_eq!(panel.state(), State::Created);
    let (panel_native, label_native) = (panel.native().unwrap(), label.native().unwrap());
    let (panel_serial, label_serial, label_parent) = owner
        .invoke(move |display| {
            (
                display.serial(panel_native).unwrap(),
                display.serial(label_native).unwrap(),
                display.parent(label_native).unwrap(),
            )
        })
        .unwrap();
    assert!(panel_serial < label_serial);
    assert_eq!(label_parent, Some(panel_native));
    owner.shutdown_and_join();
}

#[test]
fn buffered_text_reflects_last_write() {
    let owner = setup();
    let window = Handle::new(&owner, Style::NONE, Window);
    let label = Handle::with_parent(&window, Style::NONE, Label::default()).unwrap();

    for text in ["one", "two", "hello"] {
        label.write(LabelField::Text, move |w| w.text = text.to_string()).unwrap();
    }
    label.create().unwrap();

    assert_eq!(native_text(&owner, &label).as_deref(), Some("hello"));
    let native = label.native().unwrap();
    let writes = owner
        .invoke(move |display| display.write_count(native, attrs::TEXT))
        .unwrap();
    assert_eq!(writes, 1);
    owner.shutdown_and_join();
}

#[test]
fn dispose_twice_matches_dispose_once() {
    let owner = setup();
    let window = Handle::new(&owner, Style::NONE, Window);
    let label = Handle::with_parent(&window, Style::NONE, Label::default()).unwrap();
    label.create().unwrap();

    label.dispose();
    let after_once = (label.state(), owner.invoke(|d| d.widget_count()).unwrap());
    label.dispose();
    let after_twice = (label.state(), owner.invoke(|d| d.widget_count()).unwrap());

    assert_eq!(after_once, (State::Disposed, 1));
    assert_eq!(after_once, after_twice);
    owner.shutdown_and_join();
}

#[test]
fn invoke_after_dispose_is_silent() {
    let owner = setup();
    let window = Handle::new(&owner, Style::NONE, Window);
    let label = Handle::with_parent(&window, Style::NONE, Label::default()).unwrap();
    label.create().unwrap();
    label.dispose();

    label.invoke(LabelOp::Push(1)).unwrap();
    label.invoke(LabelOp::Explode).unwrap();
    assert!(label.native().is_none());
    assert_eq!(owner.invoke(|d| d.count_class("Label")).unwrap(), 0);
    owner.shutdown_and_join();
}

#[test]
fn invocations_from_one_thread_stay_ordered() {
    let owner = setup();
    let window = Handle::new(&owner, Style::NONE, Window);
    let label = Handle::with_parent(&window, Style::NONE, Label::default()).unwrap();

    for n in 0..50 {
        label.invoke(LabelOp::Push(n)).unwrap();
    }
    label.invoke(LabelOp::Fetch).unwrap();

    let expected: String = (0..50).map(|n| format!("{n};")).collect();
    assert_eq!(label.read(|w| w.text.clone()), expected);
    owner.shutdown_and_join();
}

#[test]
fn child_of_parentless_container_fails() {
    let owner = setup();
    let panel = Handle::new(&owner, Style::NONE, Panel);
    let label = Handle::with_parent(&panel, Style::NONE, Label::default()).unwrap();

    let err = label.create().unwrap_err();
    assert!(matches!(err, TetherError::MissingParent { class: "Panel", .. }));
    assert_eq!(label.state(), State::NotCreated);
    assert_eq!(panel.state(), State::NotCreated);
    assert_eq!(owner.invoke(|d| d.widget_count()).unwrap(), 0);
    owner.shutdown_and_join();
}

#[test]
fn concurrent_children_share_one_parent() {
    let owner = setup();
    let window = Handle::new(&owner, Style::NONE, Window);
    let barrier = Arc::new(Barrier::new(2));

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let window = window.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let label = Handle::with_parent(&window, Style::NONE, Label::default()).unwrap();
                barrier.wait();
                label.create().unwrap();
                label
            })
        })
        .collect();
    let labels: Vec<Handle<Label>> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    let window_native = window.native().unwrap();
    let (windows, children) = owner
        .invoke(move |display| {
            (
                display.count_class("Window"),
                display.children(window_native).unwrap().to_vec(),
            )
        })
        .unwrap();
    assert_eq!(windows, 1);
    assert_eq!(children.len(), 2);
    for label in &labels {
        assert!(children.contains(&label.native().unwrap()));
    }
    owner.shutdown_and_join();
}

#[test]
fn bounded_wait_times_out() {
    let owner = setup();
    let window = Handle::new(&owner, Style::NONE, Window);
    let slow = Handle::with_parent(&window, Style::NONE, Label::default()).unwrap();
    let fast = Handle::with_parent(&window, Style::NONE, Label::default()).unwrap();
    fast.create().unwrap();

    let stall = {
        let slow = slow.clone();
        thread::spawn(move || slow.invoke(LabelOp::Slow(Duration::from_millis(300))))
    };
    thread::sleep(Duration::from_millis(50));

    let err = fast
        .invoke_timeout(LabelOp::Push(1), Duration::from_millis(20))
        .unwrap_err();
    assert!(matches!(err, TetherError::Timeout(_)));
    assert!(!err.is_programmer_error());

    stall.join().unwrap().unwrap();
    // The timed-out push was cancelled before it ran.
    assert_eq!(native_text(&owner, &fast), None);
    owner.shutdown_and_join();
}

#[test]
fn panicking_invocation_is_reported() {
    let owner = setup();
    let window = Handle::new(&owner, Style::NONE, Window);
    let label = Handle::with_parent(&window, Style::NONE, Label::default()).unwrap();

    let err = label.invoke(LabelOp::Explode).unwrap_err();
    assert!(matches!(err, TetherError::InvocationPanicked(ref msg) if msg.contains("label exploded")));

    // The loop survived.
    label.invoke(LabelOp::Push(7)).unwrap();
    assert_eq!(native_text(&owner, &label).as_deref(), Some("7;"));
    owner.shutdown_and_join();
}

#[test]
fn shutdown_abandons_queued_callers() {
    let owner = setup();
    let window = Handle::new(&owner, Style::NONE, Window);
    let label = Handle::with_parent(&window, Style::NONE, Label::default()).unwrap();
    label.create().unwrap();

    let stall = {
        let label = label.clone();
        thread::spawn(move || label.invoke(LabelOp::Slow(Duration::from_millis(200))))
    };
    thread::sleep(Duration::from_millis(50));
    let queued = {
        let label = label.clone();
        thread::spawn(move || label.invoke(LabelOp::Push(1)))
    };
    thread::sleep(Duration::from_millis(50));

    owner.shutdown();
    stall.join().unwrap().unwrap();
    assert!(matches!(queued.join().unwrap(), Err(TetherError::OwnerThreadGone)));
    assert!(owner.join());

    // Late callers fail fast; disposal still succeeds.
    assert!(matches!(label.invoke(LabelOp::Fetch), Err(TetherError::OwnerThreadGone)));
    label.dispose();
    assert!(label.is_disposed());
}

#[test]
fn owner_clones_share_one_thread() {
    let owner = setup();
    let other = owner.clone();
    let info = owner.context().unwrap();
    assert_eq!(info.name, "integration");
    assert!(other.same_as(&owner));
    drop(owner);

    // The remaining clone still reaches the running thread.
    assert!(other.is_running());
    assert_eq!(other.context().unwrap().thread, info.thread);
    assert!(other.shutdown_and_join());
}
