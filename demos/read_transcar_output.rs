use std::path::PathBuf;

use time::format_description::FormatItem;
use time::macros::format_description;
use tracing_subscriber::EnvFilter;

use transcar_read::datcar::read_datcar;
use transcar_read::plasma::ISR_PARAM_NAMES;
use transcar_read::{decode_state_series, StateParam};

/// 表示する日時の書式
const DATETIME_FMT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let sim_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("resources/beam52"));
    let control = read_datcar(sim_dir.join("dir.input/DATCAR"))?;
    let requested = control.check_request(Some(control.end_precip));
    println!(
        "precipitation: {} - {}",
        control.start_precip.format(DATETIME_FMT)?,
        control.end_precip.format(DATETIME_FMT)?
    );

    let series = decode_state_series(sim_dir.join("dir.output/transcar_output"), requested.time())?;
    if let Some(diagnostic) = series.selection.as_ref().and_then(|s| s.diagnostic()) {
        println!("{diagnostic}");
    }
    for record in &series.records {
        println!(
            "{} chi={:.2} {:?}",
            record.time.format(DATETIME_FMT)?,
            record.chi,
            record.version
        );
        println!(
            "{:>10} {:>12} {:>12} {}",
            "alt[km]",
            StateParam::N1.name(),
            StateParam::N7.name(),
            ISR_PARAM_NAMES
                .iter()
                .map(|n| format!("{n:>12}"))
                .collect::<String>()
        );
        let isr = record.isr();
        for (i, params) in isr.rows.iter().enumerate() {
            println!(
                "{:>10.2} {:>12.4e} {:>12.4e} {}",
                isr.altitudes[i],
                record.profile.value(i, StateParam::N1).unwrap_or(f32::NAN),
                record.profile.value(i, StateParam::N7).unwrap_or(f32::NAN),
                params
                    .to_array()
                    .iter()
                    .map(|v| format!("{v:>12.4e}"))
                    .collect::<String>()
            );
        }
    }

    Ok(())
}
