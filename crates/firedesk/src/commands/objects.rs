//! Object command handlers.

use std::fmt::Write as _;

use tabled::Tabled;

use firedesk_core::{Console, Object, ObjectDetails, ObjectFilter, ObjectQuery};

use crate::cli::{GlobalOpts, ObjectFilterArg, ObjectsArgs, ObjectsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ObjectRow {
    #[tabled(rename = "№")]
    id: String,
    #[tabled(rename = "Назва")]
    name: String,
    #[tabled(rename = "Адреса")]
    address: String,
    #[tabled(rename = "Стан")]
    status: &'static str,
    #[tabled(rename = "Охорона")]
    guard: &'static str,
    #[tabled(rename = "Зв'язок")]
    link: &'static str,
}

impl From<&Object> for ObjectRow {
    fn from(o: &Object) -> Self {
        Self {
            id: o.id.to_string(),
            name: o.name.clone(),
            address: o.address.clone(),
            status: o.status_label(),
            guard: if o.flags.is_armed() { "так" } else { "ні" },
            link: if o.flags.is_connected() { "є" } else { "нема" },
        }
    }
}

impl From<ObjectFilterArg> for ObjectFilter {
    fn from(arg: ObjectFilterArg) -> Self {
        match arg {
            ObjectFilterArg::All => Self::All,
            ObjectFilterArg::Alarms => Self::WithAlarms,
            ObjectFilterArg::Offline => Self::NoLink,
            ObjectFilterArg::Disarmed => Self::Disarmed,
        }
    }
}

// ── Detail view ──────────────────────────────────────────────────────

fn detail_text(d: &ObjectDetails) -> String {
    let o = &d.object;
    let mut pairs = vec![
        ("Об'єкт", format!("{} {}", o.id, o.name)),
        ("Адреса", util::or_dash(&o.address)),
        ("Договір", util::or_dash(&o.contract)),
        ("Стан", o.status_label().to_owned()),
        ("SIM1", util::or_dash(&o.sim1)),
        ("SIM2", util::or_dash(&o.sim2)),
    ];
    if let Some(detail) = &o.detail {
        pairs.extend([
            ("Прилад", util::or_dash(&detail.device_type)),
            ("Марка ППК", util::or_dash(&detail.panel_mark)),
            ("Канал", detail.channel.to_string()),
            ("Живлення", detail.power.label().to_owned()),
            ("Автотест, год", detail.auto_test_hours.to_string()),
            ("Телефон", util::or_dash(&detail.phone)),
            ("Розташування", util::or_dash(&detail.location)),
            ("Примітки", util::or_dash(&detail.notes)),
        ]);
    }
    let ext = &d.external;
    let when = |t: Option<chrono::NaiveDateTime>| {
        t.map_or_else(|| "—".to_owned(), |t| t.format("%d.%m.%Y %H:%M:%S").to_string())
    };
    pairs.extend([
        ("Сигнал", ext.signal.clone()),
        ("Останній тест", when(ext.last_test)),
        ("Останнє повідомлення", when(ext.last_message)),
    ]);

    let mut out = output::key_values(&pairs);

    if !d.zones.is_empty() {
        let _ = write!(out, "\n\nЗони:");
        for z in &d.zones {
            let _ = write!(
                out,
                "\n  {:>3}  {:<24} {:<12} {}",
                z.number,
                z.name,
                z.sensor_type,
                z.status.label()
            );
        }
    }
    if !d.contacts.is_empty() {
        let _ = write!(out, "\n\nВідповідальні особи:");
        for c in &d.contacts {
            let _ = write!(out, "\n  {}. {} ({}) {}", c.priority, c.name, util::or_dash(&c.position), c.phone);
        }
    }
    if !d.events.is_empty() {
        let _ = write!(out, "\n\nОстанні події:");
        for e in d.events.iter().take(10) {
            let _ = write!(out, "\n  {}  {:<16} {}", e.date_time_display(), e.kind.label(), e.details);
        }
    }
    out
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(console: &Console, args: ObjectsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ObjectsCommand::List { search, filter } => {
            let _ = console.refresh_objects().await?;
            let query = ObjectQuery {
                search: search.unwrap_or_default(),
                filter: filter.into(),
            };
            let view = console.objects().view(&query);
            tracing::debug!(shown = view.objects.len(), all = view.counts.all, "object view");

            let objects: Vec<&Object> = view.objects.iter().map(AsRef::as_ref).collect();
            let out = output::render_list(
                &global.output,
                &objects,
                |o| ObjectRow::from(*o),
                |o| o.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ObjectsCommand::Show { id } => {
            let id = util::object_id(&id)?;
            let details = console.select_object(id).await?.ok_or_else(|| CliError::NotFound {
                entity: "object".into(),
                identifier: id.to_string(),
            })?;
            let out = output::render_single(&global.output, &*details, detail_text, |d| d.object.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
