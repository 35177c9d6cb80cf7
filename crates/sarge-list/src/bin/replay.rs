//! sarge-replay - drive a list session from a recorded trace.
//!
//! Usage: `sarge-replay <trace.json>`

use std::path::Path;

use sarge_list::{replay, ListError, ReplayReport, Trace};

fn run(path: &Path) -> Result<ReplayReport, ListError> {
    let trace = Trace::load(path)?;
    replay(&trace)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: sarge-replay <trace.json>");
        std::process::exit(2);
    };

    match run(Path::new(&path)) {
        Ok(report) => tracing::info!(
            "Done: {} rows, window {}..{}, selected {:?}, {} activation(s)",
            report.rows,
            report.window.start,
            report.window.end,
            report.selected,
            report.activations.len()
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
