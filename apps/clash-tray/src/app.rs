//! Tray event loop.
//!
//! `tao` owns the main thread. Supervisor calls run on a multi-threaded
//! tokio runtime through `block_on`; its worker threads keep draining the
//! daemon's output between events.

use std::time::Instant;

use anyhow::Context;
use clash_tray_menu::{ClickAction, ClickTracker, MenuAction};
use clash_tray_supervisor::Supervisor;
use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoopBuilder};
use tokio::runtime::Runtime;
use tray_icon::menu::MenuEvent;
use tray_icon::{MouseButton, MouseButtonState, TrayIconEvent};

use crate::config::Config;
use crate::controller::{Controller, Flow};
use crate::desktop::{DesktopNotifier, SystemLauncher};
use crate::icons::Icons;
use crate::view::TrayView;

enum UserEvent {
    Tray(TrayIconEvent),
    Menu(MenuEvent),
    Shutdown,
}

type TrayController = Controller<DesktopNotifier, SystemLauncher>;

/// Runs the tray until the user quits. Does not return on success.
pub fn run(config: Config) -> anyhow::Result<()> {
    let runtime = Runtime::new().context("failed to start async runtime")?;
    let mut icons = Some(Icons::load(&config)?);

    let mut controller: TrayController = Controller::new(
        Supervisor::new(config.supervisor_settings()),
        DesktopNotifier,
        SystemLauncher,
        config.dashboard_url.clone(),
    );
    let poll_interval = config.poll_interval();
    let autostart = config.autostart;
    let mut clicks = ClickTracker::new(config.double_click());

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();

    TrayIconEvent::set_event_handler(Some({
        let proxy = event_loop.create_proxy();
        move |event| {
            let _ = proxy.send_event(UserEvent::Tray(event));
        }
    }));
    MenuEvent::set_event_handler(Some({
        let proxy = event_loop.create_proxy();
        move |event| {
            let _ = proxy.send_event(UserEvent::Menu(event));
        }
    }));

    let proxy = event_loop.create_proxy();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            let _ = proxy.send_event(UserEvent::Shutdown);
        }
    });

    let mut view: Option<TrayView> = None;
    let mut next_poll = Instant::now() + poll_interval;

    tracing::info!(
        config_dir = %config.config_dir.display(),
        poll_secs = poll_interval.as_secs(),
        "starting tray"
    );

    event_loop.run(move |event, _, control_flow| {
        if *control_flow == ControlFlow::Exit {
            return;
        }

        let mut flow = Flow::Continue;
        let mut dirty = false;

        match event {
            Event::NewEvents(StartCause::Init) => {
                let Some(icons) = icons.take() else {
                    return;
                };
                match TrayView::new(icons) {
                    Ok(v) => view = Some(v),
                    Err(e) => {
                        tracing::error!("{e:#}");
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                }
                runtime.block_on(controller.init());
                if autostart {
                    runtime.block_on(controller.start());
                }
                dirty = true;
            }

            Event::UserEvent(UserEvent::Tray(event)) => match event {
                TrayIconEvent::Click {
                    button: MouseButton::Left,
                    button_state: MouseButtonState::Up,
                    ..
                } => clicks.click(Instant::now()),
                TrayIconEvent::DoubleClick {
                    button: MouseButton::Left,
                    ..
                } => {
                    let action = clicks.double_click();
                    flow = runtime.block_on(controller.handle(menu_action(action)));
                    dirty = true;
                }
                _ => {}
            },

            Event::UserEvent(UserEvent::Menu(event)) => {
                if let Some(action) = view.as_ref().and_then(|v| v.action(&event.id)) {
                    flow = runtime.block_on(controller.handle(action));
                    dirty = true;
                }
            }

            Event::UserEvent(UserEvent::Shutdown) | Event::LoopDestroyed => {
                runtime.block_on(controller.shutdown());
                flow = Flow::Exit;
            }

            _ => {}
        }

        if flow == Flow::Exit {
            view.take();
            *control_flow = ControlFlow::Exit;
            return;
        }

        let now = Instant::now();
        if let Some(action) = clicks.poll(now) {
            runtime.block_on(controller.handle(menu_action(action)));
            dirty = true;
        }
        if now >= next_poll {
            next_poll = now + poll_interval;
            dirty = true;
        }

        if dirty {
            let status = controller.tick();
            if let Some(view) = view.as_mut() {
                view.render(&status);
            }
        }

        let wake = clicks
            .deadline()
            .map_or(next_poll, |deadline| deadline.min(next_poll));
        *control_flow = ControlFlow::WaitUntil(wake);
    })
}

fn menu_action(click: ClickAction) -> MenuAction {
    match click {
        ClickAction::OpenDashboard => MenuAction::OpenDashboard,
        ClickAction::Toggle => MenuAction::Toggle,
    }
}
