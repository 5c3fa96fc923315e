//! Rivulet - runs a script session and streams its deltas to stdout.
//!
//! Every delivered message is printed as one JSON line. The built-in demo
//! script runs twice, with widget input applied in between, the way a
//! renderer would drive a session. Logs go to stderr (`RUST_LOG`).
//!
//! Environment:
//! - `RIVULET_CONFIG`: path to a JSON session config
//! - `RIVULET_SERVER_PORT`: overrides the configured server port
//! - `RIVULET_EXPORT_DIR`: write the finished session's files here

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use rivulet_api::{DataFrame, Value, WidgetValue};
use rivulet_kernel::{
    DeltaError, Number, Report, ReportConfig, Script, ScriptRunner, SliderArgs, SliderValue,
    WidgetId, Widgets, spawn_delivery_loop,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    let report = Arc::new(Report::new(
        "demo.rs",
        std::env::args().skip(1).collect(),
        config.clone(),
    ));
    tracing::info!(url = %report.url("localhost"), "starting Rivulet session");

    let (tx, mut rx) = mpsc::channel(64);
    let delivery = spawn_delivery_loop(report.clone(), config.delivery_interval(), tx);
    let printer = tokio::spawn(async move {
        while let Some(batch) = rx.recv().await {
            for msg in batch {
                match serde_json::to_string(&msg) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::error!("Failed to encode message: {}", e),
                }
            }
        }
    });

    let widgets = Arc::new(Widgets::new());
    let mut runner = ScriptRunner::new(report.clone(), widgets.clone());

    runner.run(demo)?;
    tokio::time::sleep(config.delivery_interval() * 2).await;

    // Input the renderer would report between runs.
    widgets.set_state(
        &WidgetId::new("slider", "Points"),
        WidgetValue::FloatArray(vec![8.0]),
    );
    widgets.set_state(
        &WidgetId::new("checkbox", "Show table"),
        WidgetValue::Bool(true),
    );
    runner.run(demo)?;
    tokio::time::sleep(config.delivery_interval() * 2).await;

    if let Ok(dir) = std::env::var("RIVULET_EXPORT_DIR") {
        export(&report, Path::new(&dir))?;
    }

    delivery.abort();
    let _ = printer.await;
    tracing::info!(
        deltas = runner.context().metrics().total(),
        "session finished"
    );
    Ok(())
}

fn load_config() -> anyhow::Result<ReportConfig> {
    let mut config = match std::env::var("RIVULET_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            ReportConfig::from_json(&raw).with_context(|| format!("parsing config {}", path))?
        }
        Err(_) => ReportConfig::default(),
    };

    if let Ok(port) = std::env::var("RIVULET_SERVER_PORT") {
        config.server_port = port
            .parse()
            .with_context(|| format!("invalid RIVULET_SERVER_PORT: {}", port))?;
    }
    Ok(config)
}

fn export(report: &Report, dir: &Path) -> anyhow::Result<()> {
    let files = report.serialize_final_report_to_files()?;
    for (key, bytes) in &files {
        let path = dir.join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    }
    tracing::info!(files = files.len(), dir = %dir.display(), "exported report");
    Ok(())
}

fn demo(s: &mut Script) -> Result<(), DeltaError> {
    s.main.title("Rivulet demo");

    let points = s
        .sidebar
        .slider("Points", SliderArgs::new().value(4).min(1).max(20))?;
    let n = match points {
        SliderValue::Single(Number::Int(n)) => n,
        _ => 4,
    };

    let row = |i: i64| vec![Value::from(i), Value::from((i * i) as f64)];
    let mut data = DataFrame::new(["x", "y"]);
    for i in 0..n {
        data.push_row(row(i));
    }

    s.write(&[&"Squares of the first", &n, &"integers:"])?;
    s.spinner(rivulet_kernel::DEFAULT_SPINNER_TEXT, |s| {
        let chart = s.main.line_chart(data.clone(), 0, 0);
        chart.add_rows(DataFrame::new(["x", "y"]).with_row(row(n)))
    })?;

    if s.main.checkbox("Show table", false)? {
        s.main.table(data);
    }

    let mut status = s.main.empty();
    status.progress(50)?;
    status.success("Done");

    let date = s.main.date_input("Date", NaiveDate::from_ymd_opt(2019, 6, 1))?;
    s.main.text(&format!("Selected {}", date));
    Ok(())
}
