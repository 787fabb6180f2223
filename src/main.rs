use anyhow::Result;
use csv_parser::csv_reader::read_table;
use csv_parser::table_printer::write_table;
use std::env;
use std::io;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

static USAGE: &str = "Usage: csv_parser <input>";

fn run(filepath: &str) -> Result<()> {
    let table = read_table(filepath)?;
    debug!(
        columns = table.header.len(),
        rows = table.rows.len(),
        "printing table"
    );

    write_table(io::stdout().lock(), &table)?;
    Ok(())
}

fn main() {
    // Logs go to stderr; stdout carries only the table.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        println!("{USAGE}");
        std::process::exit(1);
    }

    // Parse failures are reported but the exit status stays 0.
    if let Err(err) = run(&args[1]) {
        eprintln!("ERROR\t{err}");
    }
}
