use std::path::PathBuf;

use time::format_description::FormatItem;
use time::macros::format_description;
use tracing_subscriber::EnvFilter;

use transcar_read::{decode_excitation_rates, Reaction};

/// 表示する日時の書式
const DATETIME_FMT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("resources/beam52/dir.output"));
    let rates = decode_excitation_rates(&dir, "emissions.dat")?;
    println!("records={} dip={:.2}", rates.len(), rates.dip_angle);

    let Some(selection) = rates.select(None) else {
        return Ok(());
    };
    let index = selection.index();
    println!("{}", rates.times[index].format(DATETIME_FMT)?);
    println!(
        "{:>10}{}",
        "alt[km]",
        Reaction::ALL
            .iter()
            .map(|r| format!("{:>12}", r.name()))
            .collect::<String>()
    );
    for (altitude, row) in rates.altitudes.iter().zip(&rates.rates[index]) {
        println!(
            "{altitude:>10.2}{}",
            row.iter().map(|v| format!("{v:>12.4e}")).collect::<String>()
        );
    }
    for bin in &rates.precipitation[index] {
        println!("flux={:.4e} energy={:.1}", bin.flux, bin.energy);
    }

    Ok(())
}
