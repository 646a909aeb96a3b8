//! End-to-end tests for widget handles used from application threads.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use horizon_tether::logging::{HandleTreeDebug, TreeFormatOptions};
use horizon_tether::native::attrs;
use horizon_tether::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("horizon_tether=debug,horizon_tether_core=debug")
        .with_test_writer()
        .try_init();
}

fn setup() -> OwnerThread {
    init_tracing();
    OwnerThread::builder()
        .name("scenarios")
        .idle_interval(Duration::from_millis(5))
        .start()
        .unwrap()
}

#[test]
fn text_set_before_create_is_realized() {
    let owner = setup();
    let shell = Shell::new(&owner, Style::SHELL_TRIM);
    let text = Text::new(&shell, Style::BORDER).unwrap();

    text.set_text("hello").unwrap();
    text.create().unwrap();

    let native = text.native().unwrap();
    let realized = owner
        .invoke(move |display| display.get(native, attrs::TEXT).unwrap())
        .unwrap();
    assert_eq!(realized.as_deref(), Some("hello"));
    shell.close();
    owner.shutdown_and_join();
}

#[test]
fn child_of_unparented_container_is_not_created() {
    let owner = setup();
    let container = Composite::detached(&owner, Style::NONE);
    let button = Button::new(&container, Style::PUSH).unwrap();

    let err = button.create().unwrap_err();
    assert!(matches!(err, TetherError::MissingParent { .. }));
    assert_eq!(button.state(), State::NotCreated);
    assert_eq!(owner.invoke(|display| display.count_class("Button")).unwrap(), 0);

    // Once the container is attached, creation succeeds.
    let shell = Shell::new(&owner, Style::NONE);
    container.set_parent(&shell).unwrap();
    button.create().unwrap();
    assert_eq!(button.state(), State::Created);
    shell.close();
    owner.shutdown_and_join();
}

#[test]
fn disposing_container_disposes_children() {
    let owner = setup();
    let shell = Shell::new(&owner, Style::NONE);
    let container = Composite::new(&shell, Style::NONE).unwrap();
    let text = Text::new(&container, Style::NONE).unwrap();
    let combo = Combo::new(&container, Style::DROP_DOWN).unwrap();
    shell.open().unwrap();
    text.create().unwrap();

    container.dispose();

    assert_eq!(text.state(), State::Disposed);
    assert_eq!(combo.state(), State::Disposed);
    text.append("ignored").unwrap();
    combo.add("ignored").unwrap();
    assert!(combo.items().is_empty());

    // Only the shell is left natively.
    assert_eq!(owner.invoke(|display| display.widget_count()).unwrap(), 1);
    assert_eq!(shell.state(), State::Created);
    assert!(shell.children().is_empty());
    shell.close();
    owner.shutdown_and_join();
}

#[test]
fn concurrent_children_create_parent_once() {
    let owner = setup();
    let shell = Shell::new(&owner, Style::NONE);
    let barrier = Arc::new(Barrier::new(2));

    let workers: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|label| {
            let shell = shell.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let button = Button::new(&shell, Style::PUSH).unwrap();
                button.set_text(label).unwrap();
                barrier.wait();
                button.create().unwrap();
                button
            })
        })
        .collect();
    let buttons: Vec<Button> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    let shell_native = shell.native().unwrap();
    let (shells, children) = owner
        .invoke(move |display| {
            (
                display.count_class("Shell"),
                display.children(shell_native).unwrap().to_vec(),
            )
        })
        .unwrap();
    assert_eq!(shells, 1);
    assert_eq!(children.len(), 2);
    for button in &buttons {
        assert!(children.contains(&button.native().unwrap()));
    }
    shell.close();
    owner.shutdown_and_join();
}

#[test]
fn form_built_on_worker_thread() {
    let owner = setup();
    let shell = Shell::new(&owner, Style::SHELL_TRIM);

    let builder = {
        let shell = shell.clone();
        thread::spawn(move || -> Result<(Text, Combo, Button)> {
            shell.set_title("Settings")?;
            let form = Composite::new(&shell, Style::NONE)?;
            let name = Text::new(&form, Style::SINGLE)?;
            name.set_text("guest")?;
            let theme = Combo::new(&form, Style::DROP_DOWN | Style::READ_ONLY)?;
            theme.set_items(["light", "dark"])?;
            theme.select(Some(1))?;
            let remember = Button::new(&form, Style::CHECK)?;
            remember.set_text("Remember")?;
            remember.set_selected(true)?;
            Ok((name, theme, remember))
        })
    };
    let (name, theme, remember) = builder.join().unwrap().unwrap();

    shell.open().unwrap();
    assert_eq!(name.text().unwrap(), "guest");
    assert_eq!(theme.selection().unwrap(), Some(1));
    assert!(remember.is_selected().unwrap());
    assert_eq!(owner.invoke(|display| display.widget_count()).unwrap(), 5);

    let tree = HandleTreeDebug::with_options(TreeFormatOptions::minimal()).format(&shell.node());
    assert_eq!(tree.lines().count(), 5);
    assert!(tree.starts_with("Shell"));
    assert!(tree.contains("Composite"));

    shell.close();
    assert_eq!(owner.invoke(|display| display.widget_count()).unwrap(), 0);
    owner.shutdown_and_join();
}

#[test]
fn checks_readiness_of_disposed_widgets() {
    let owner = setup();
    let shell = Shell::new(&owner, Style::NONE);
    let bar = ProgressBar::new(&shell, Style::NONE).unwrap();
    assert!(bar.check_ready().is_ok());

    shell.close();
    let err = bar.check_ready().unwrap_err();
    assert!(matches!(err, TetherError::NotReady { class: "ProgressBar", .. }));
    assert!(err.to_string().contains("disposed"));

    // New children cannot be attached to a closed shell.
    assert!(matches!(
        Text::new(&shell, Style::NONE),
        Err(TetherError::InvalidParent { .. })
    ));
    owner.shutdown_and_join();
}

#[test]
fn owner_shutdown_releases_everything() {
    let owner = setup();
    let shell = Shell::new(&owner, Style::NONE);
    shell.set_font(Some(Font::new("Mono", 9))).unwrap();
    let text = Text::new(&shell, Style::NONE).unwrap();
    text.create().unwrap();

    assert!(owner.shutdown_and_join());
    assert!(matches!(text.text(), Err(TetherError::OwnerThreadGone)));

    // Disposal after shutdown is still safe.
    shell.close();
    assert!(text.is_disposed());
}
