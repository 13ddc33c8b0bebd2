//! Alarm command handlers.

use tabled::Tabled;

use firedesk_core::{Alarm, Console};

use crate::cli::{AlarmsArgs, AlarmsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct AlarmRow {
    #[tabled(rename = "Час")]
    time: String,
    #[tabled(rename = "№")]
    object: String,
    #[tabled(rename = "Об'єкт")]
    name: String,
    #[tabled(rename = "Тип")]
    kind: &'static str,
    #[tabled(rename = "Зона")]
    zone: String,
    #[tabled(rename = "Опис")]
    details: String,
}

impl From<&Alarm> for AlarmRow {
    fn from(a: &Alarm) -> Self {
        Self {
            time: a.time_display(),
            object: a.object_id.to_string(),
            name: a.object_name.clone(),
            kind: a.kind.label(),
            zone: a.zone.map(|z| z.to_string()).unwrap_or_default(),
            details: a.details.clone(),
        }
    }
}

pub async fn handle(console: &Console, args: AlarmsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AlarmsCommand::List { fire } => {
            // A fresh console never skips: nothing else is polling.
            let snapshot = console
                .refresh_alarms()
                .await?
                .done()
                .unwrap_or_else(|| console.alarms().snapshot());

            let alarms: Vec<&Alarm> = snapshot
                .alarms
                .iter()
                .map(AsRef::as_ref)
                .filter(|a| !fire || a.is_unprocessed_fire())
                .collect();

            let out = output::render_list(
                &global.output,
                &alarms,
                |a| AlarmRow::from(*a),
                |a| a.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            if !global.quiet && matches!(global.output, crate::cli::OutputFormat::Table) {
                eprintln!("Активних тривог: {}, з них пожеж: {}", snapshot.total, snapshot.fire_count);
            }
            Ok(())
        }
    }
}
