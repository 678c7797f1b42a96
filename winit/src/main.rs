// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

slint::include_modules!();

mod board;

use std::sync::Arc;

use climate_widget_common::{
    DummySensorClient, FetchError, FileLogger, HttpSensorClient, Job, JobFuture, Logger, Pipeline,
    SensorClient, TapHandle, Trigger, ValueStore, WidgetConfig, WidgetId, WidgetView,
    WorkScheduler,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use board::WidgetBoard;

/// Sensor client picked at start-up.
enum HostClient {
    Http(HttpSensorClient),
    Dummy(DummySensorClient),
}

impl SensorClient for HostClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match self {
            HostClient::Http(client) => client.fetch(url).await,
            HostClient::Dummy(client) => client.fetch(url).await,
        }
    }
}

/// A widget window together with the store the pipeline renders into.
struct WidgetWindow {
    id: WidgetId,
    ui: ClimateWidget,
    store: ValueStore<WidgetView>,
}

/// Our App struct that holds the widget windows, the tokio runtime running the
/// sensor pipeline and the scheduler deciding when to run it.
///
/// Renders travel from the runtime to the UI thread through the widget board,
/// taps travel back through the trigger channel.
struct App {
    config: WidgetConfig,
    runtime: tokio::runtime::Runtime,
    logger: Arc<FileLogger>,
    board: Arc<WidgetBoard>,
    scheduler: Arc<WorkScheduler>,
    windows: Vec<WidgetWindow>,
    triggers: UnboundedSender<Trigger>,
    trigger_rx: Option<UnboundedReceiver<Trigger>>,
    timer: slint::Timer,
}

impl App {
    const PERIODIC_WORK: &'static str = "ClimateMonitorWork";
    const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(200);

    /// Create a new App struct.
    ///
    /// Loads the configuration, builds the pipeline and opens one window per widget.
    fn new() -> anyhow::Result<Self> {
        // Read config.json and the SENSOR_URL / CLIMATE_WIDGET_DEMO overrides.
        let config = WidgetConfig::load()?;
        log::info!("Configuration: {config:?}");

        // The pipeline and the scheduler run on a tokio runtime next to the UI thread.
        let runtime = tokio::runtime::Runtime::new()?;

        // The widget log goes to the data, cache and download directories.
        let logger = Arc::new(FileLogger::default());

        // Use the bundled reading in demo mode, otherwise talk to the real sensor.
        let client = if config.demo {
            HostClient::Dummy(DummySensorClient::new())
        } else {
            HostClient::Http(HttpSensorClient::new(config.request_timeout())?)
        };

        // The pipeline is shared by every run, so we wrap it in an Arc.
        let pipeline = Arc::new(Pipeline::with_logger(client, logger.clone()));

        // The board is the render target: the pipeline writes to it, the UI timer reads from it.
        let board = Arc::new(WidgetBoard::default());

        // Demo mode needs a non-blank URL, otherwise the run is a permanent failure.
        let url: Arc<str> = if config.demo {
            "demo://climate".into()
        } else {
            config.sensor_url.as_str().into()
        };

        // One job per run: snapshot the registered widgets, fetch and render.
        let job: Job = {
            let board = board.clone();
            Arc::new(move |trigger: Trigger| -> JobFuture {
                let pipeline = pipeline.clone();
                let board = board.clone();
                let url = url.clone();
                Box::pin(async move {
                    log::debug!("Pipeline run for {trigger:?}");
                    let targets = board.ids();
                    pipeline.run(&url, &targets, board.as_ref()).await
                })
            })
        };

        // The scheduler retries failed runs according to the configured policy.
        let scheduler = Arc::new(WorkScheduler::new(
            runtime.handle().clone(),
            job,
            config.retry.clone(),
        ));

        // Taps on the UI thread are sent to the runtime through this channel.
        let (triggers, trigger_rx) = unbounded_channel();

        // Open one window per widget and register it on the board.

        let mut windows = Vec::new();
        for n in 1..=config.widget_count.max(1) {
            let id = WidgetId(n);
            let ui = ClimateWidget::new()?;
            let store = board.register(id);

            logger.log(&format!("Binding tap handler for widgetId={n}"));
            bind_tap(&ui, TapHandle::new(id), &triggers);

            // Closing a window removes the widget, later runs no longer render to it.
            let close_board = board.clone();
            let close_logger = logger.clone();
            ui.window().on_close_requested(move || {
                close_board.unregister(id);
                close_logger.log(&format!("Widget removed: widgetId={n}"));
                slint::CloseRequestResponse::HideWindow
            });

            windows.push(WidgetWindow { id, ui, store });
        }

        // Return the App struct
        Ok(Self {
            config,
            runtime,
            logger,
            board,
            scheduler,
            windows,
            triggers,
            trigger_rx: Some(trigger_rx),
            timer: slint::Timer::default(),
        })
    }

    /// Run the App: schedule the work, start polling for renders and show the widgets.
    fn run(&mut self) -> anyhow::Result<()> {
        // Turn every tap into a one-shot run on the runtime.
        if let Some(mut trigger_rx) = self.trigger_rx.take() {
            let scheduler = self.scheduler.clone();
            let logger = self.logger.clone();
            self.runtime.spawn(async move {
                while let Some(trigger) = trigger_rx.recv().await {
                    logger.log(&format!("Tap received: {trigger:?}, starting one-shot run"));
                    scheduler.enqueue_one_shot(trigger);
                }
            });
        }

        self.logger.log(&format!(
            "Widgets enabled: {:?}, enqueue one-shot and periodic work",
            self.board.ids()
        ));
        // Fetch once right away, then keep refreshing on the configured interval.
        self.scheduler.enqueue_one_shot(Trigger::Scheduled);
        self.scheduler
            .enqueue_unique_periodic(Self::PERIODIC_WORK, self.config.refresh_interval());

        // Apply whatever the pipeline rendered since the last tick.
        let widgets: Vec<_> = self
            .windows
            .iter()
            .map(|window| (window.id, window.ui.as_weak(), window.store.clone()))
            .collect();
        // Clone the sender, because tap handlers are rebound inside the timer closure.
        let triggers = self.triggers.clone();

        // Start the timer, it moves rendered views onto the widgets.
        self.timer.start(slint::TimerMode::Repeated, Self::POLL_INTERVAL, move || {
            for (id, handle, store) in &widgets {
                let Some(view) = store.get() else {
                    continue;
                };
                let Some(ui) = handle.upgrade() else {
                    log::debug!("Widget {id} is gone, dropping update");
                    continue;
                };
                apply_view(&ui, &view, &triggers);
            }
        });

        // Show all widgets before entering the event loop.
        for window in &self.windows {
            window.ui.show()?;
        }

        // Run the event loop until the last widget is closed (and map an error to an anyhow::Error).
        slint::run_event_loop()?;

        // All widgets are gone, stop refreshing.
        self.scheduler.cancel(Self::PERIODIC_WORK);
        Ok(())
    }
}

/// Shows `view` on the widget and rebinds its tap action.
fn apply_view(ui: &ClimateWidget, view: &WidgetView, triggers: &UnboundedSender<Trigger>) {
    ui.set_temperature(view.text.temperature.as_str().into());
    ui.set_humidity(view.text.humidity.as_str().into());
    ui.set_co2(view.text.co2.as_str().into());
    ui.set_updated(slint::SharedString::from(
        chrono::Local::now().format("%H:%M:%S").to_string(),
    ));

    bind_tap(ui, view.tap, triggers);
}

fn bind_tap(ui: &ClimateWidget, tap: TapHandle, triggers: &UnboundedSender<Trigger>) {
    let triggers = triggers.clone();
    ui.on_tapped(move || {
        if triggers.send(tap.trigger()).is_err() {
            log::warn!("Scheduler stopped, ignoring tap on widget {}", tap.widget_id());
        }
    });
}

/// A minimal main function that initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut app = App::new()?;

    app.run()
}
