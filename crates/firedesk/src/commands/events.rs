//! Event log command handlers.

use std::sync::Arc;
use std::time::Duration;

use tabled::Tabled;

use firedesk_core::store::EVENT_BATCH_LIMIT;
use firedesk_core::{Bootstrap, Console, Event, EventCache, EventFilter, Period, ThemeSettings};

use crate::cli::{EventsArgs, EventsCommand, GlobalOpts, OutputFormat, PeriodArg};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Час")]
    time: String,
    #[tabled(rename = "№")]
    object: String,
    #[tabled(rename = "Об'єкт")]
    name: String,
    #[tabled(rename = "Подія")]
    kind: &'static str,
    #[tabled(rename = "Зона")]
    zone: String,
    #[tabled(rename = "Опис")]
    details: String,
}

impl From<&Event> for EventRow {
    fn from(e: &Event) -> Self {
        Self {
            time: e.date_time_display(),
            object: e.object_id.to_string(),
            name: e.object_name.clone(),
            kind: e.kind.label(),
            zone: e.zone.map(|z| z.to_string()).unwrap_or_default(),
            details: e.details.clone(),
        }
    }
}

impl From<PeriodArg> for Period {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Hour => Self::LastHour,
            PeriodArg::Today => Self::Today,
            PeriodArg::All => Self::All,
        }
    }
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn render_events(events: &[Arc<Event>], global: &GlobalOpts) -> Result<String, CliError> {
    let events: Vec<&Event> = events.iter().map(AsRef::as_ref).collect();
    output::render_list(&global.output, &events, |e| EventRow::from(*e), |e| e.id.to_string())
}

/// One line per event while following, colored like the console rows.
fn stream_line(event: &Event, format: &OutputFormat, theme: &ThemeSettings, color: bool) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Table => {
            let text = format!(
                "{}  {:>6}  {:<24} {:<16} {}",
                event.date_time_display(),
                event.object_id,
                event.object_name,
                event.kind.label(),
                event.details
            );
            output::paint(&text, theme.classify_active(event.code), color)
        }
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(event)?,
        OutputFormat::Yaml => format!(
            "---\n{}",
            serde_yaml::to_string(event).map_err(|e| CliError::Internal(e.to_string()))?
        ),
        OutputFormat::Plain => event.id.to_string(),
    })
}

/// Load up to `limit` of the newest events through a private backfill
/// cache, then return it for following.
async fn backfill(console: &Console, limit: usize) -> Result<EventCache, CliError> {
    let cache = EventCache::new(limit, Bootstrap::Backfill);
    let store = console.store();
    // First poll only places the watermark `limit` IDs back.
    let _ = cache.poll(store.as_ref()).await?;
    // A full batch means more history is waiting.
    loop {
        let batch = cache.poll(store.as_ref()).await?.done().unwrap_or_default();
        if batch.len() < EVENT_BATCH_LIMIT {
            break;
        }
    }
    Ok(cache)
}

pub async fn handle(console: &Console, args: EventsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        EventsCommand::Tail {
            limit,
            follow,
            important,
            object,
            period,
            interval,
        } => {
            let filter = EventFilter {
                period: period.into(),
                important_only: important,
                object: object.as_deref().map(util::object_id).transpose()?,
            };

            let cache = backfill(console, limit.max(1)).await?;
            let mut shown = filter.apply(&cache.events(), now());
            shown.reverse();
            let out = render_events(&shown, global)?;
            output::print_output(&out, global.quiet);

            if follow {
                follow_events(console, &cache, filter, Duration::from_secs(interval.max(1)), global).await?;
            }
            Ok(())
        }

        EventsCommand::Object { id } => {
            let id = util::object_id(&id)?;
            let details = console.select_object(id).await?.ok_or_else(|| CliError::NotFound {
                entity: "object".into(),
                identifier: id.to_string(),
            })?;
            let out = render_events(&details.events, global)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

/// Poll `cache` until Ctrl-C, printing each new matching event oldest
/// first. Poll failures are reported and retried on the next tick.
async fn follow_events(
    console: &Console,
    cache: &EventCache,
    filter: EventFilter,
    period: Duration,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let theme = console.theme();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let store = console.store();
                let batch = match cache.poll(store.as_ref()).await {
                    Ok(refresh) => refresh.done().unwrap_or_default(),
                    Err(e) => {
                        tracing::warn!(error = %e, "event poll failed");
                        continue;
                    }
                };
                let mut fresh = filter.apply(&batch, now());
                fresh.reverse();
                for event in &fresh {
                    let line = stream_line(event, &global.output, theme, color)?;
                    output::print_output(&line, global.quiet);
                }
            }
        }
    }
    Ok(())
}
