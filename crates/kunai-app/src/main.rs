use kunai_core::config::load_config;
use kunai_dav::CalDavClient;
use kunai_engine::alarm::{self, AlarmView};
use kunai_engine::event::StructuredEvent;
use kunai_engine::ops::CalendarOps;
use kunai_engine::time::render_event_time;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

/// One event of the listing, shaped for JSON output.
#[derive(serde::Serialize)]
struct EventSummary {
    uid: String,
    summary: Option<String>,
    start: Option<String>,
    end: Option<String>,
    all_day: bool,
    sequence: u32,
    alarms: Vec<AlarmView>,
}

impl From<&StructuredEvent> for EventSummary {
    fn from(event: &StructuredEvent) -> Self {
        Self {
            uid: event.uid.clone(),
            summary: event.summary.clone(),
            start: event.start.as_ref().map(render_event_time),
            end: event.end.as_ref().map(render_event_time),
            all_day: event.is_all_day(),
            sequence: event.sequence,
            alarms: alarm::list_alarms(event),
        }
    }
}

#[derive(serde::Serialize)]
struct Listing {
    calendar: String,
    events: Vec<EventSummary>,
    skipped: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(true))
        .init();

    let config = load_config()?;

    tracing::info!(
        url = %config.store.url,
        calendar = ?config.calendar.name,
        "Configuration loaded"
    );

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping info");
    }

    let client = CalDavClient::new(&config.store)?;

    // Connection check before doing anything else.
    let calendars = client.discover_calendars().await?;
    tracing::info!(count = calendars.len(), "Connected to CalDAV store");

    let ops = CalendarOps::open(client, config.calendar.name.as_deref()).await?;
    let listing = ops.list_events(None, None).await?;

    tracing::info!(
        events = listing.events.len(),
        skipped = listing.skipped,
        "Listed events in the default window"
    );

    let output = Listing {
        calendar: ops.collection().href.clone(),
        events: listing.events.iter().map(EventSummary::from).collect(),
        skipped: listing.skipped,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
