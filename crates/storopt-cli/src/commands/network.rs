use anyhow::{Context, Result};
use std::io::{self, Write};
use storopt_cli::OutputFormat;
use storopt_core::Diagnostics;
use storopt_ts::GridSnapshot;
use tabwriter::TabWriter;

use super::benchmark_network;

pub fn handle(format: OutputFormat) -> Result<()> {
    let network = benchmark_network();
    let stats = network.stats();
    let mut diag = Diagnostics::new();
    network.validate_into(&mut diag);
    let snapshot = GridSnapshot::from_network(&network).context("taking grid snapshot")?;

    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "stats": stats,
                "diagnostics": diag.issues,
                "columns": snapshot.column_labels(),
                "wind_column": snapshot.load_count() + snapshot.wind_position(),
            });
            serde_json::to_writer_pretty(io::stdout(), &body)
                .context("serializing network summary to JSON")?;
            println!();
        }
        OutputFormat::Plain => {
            let mut writer = TabWriter::new(Vec::new()).padding(2);
            writeln!(writer, "Buses\t{}", stats.num_buses)?;
            writeln!(writer, "Lines\t{}", stats.num_branches)?;
            writeln!(writer, "Loads\t{}\t{:.4} MW", stats.num_loads, stats.total_load_mw)?;
            writeln!(writer, "Generators\t{}\t{:.4} MW DER", stats.num_gens, stats.total_der_mw)?;
            writeln!(
                writer,
                "Storage\t{}\t{:.4} MWh",
                stats.num_storages, stats.total_storage_mwh
            )?;
            writer.flush()?;
            println!("{}", String::from_utf8(writer.into_inner()?)?);
            println!("{}", diag.summary());
            for issue in &diag.issues {
                println!("  {issue}");
            }

            println!();
            println!("Injection columns:");
            for (i, label) in snapshot.column_labels().iter().enumerate() {
                println!("  {i:>2}  {label}");
            }
        }
    }
    Ok(())
}
