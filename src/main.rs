// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use devwatch::{Config, DeviceContext, DeviceEvent, EventLoop, Monitor, SignalStop};
use nix::sys::signal::Signal;

#[macro_use]
extern crate tracing;

fn setup_logs(config: &Config) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let journal_layer = if config.journald {
        tracing_journald::layer().ok()
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(journal_layer)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };

    setup_logs(&config);
    if let Some(err) = config_error {
        error!("errors loading config: {}", err);
    }

    let context = DeviceContext::create().context("cannot open udev")?;

    if config.list_on_startup {
        let records = devwatch::list(&context).context("cannot enumerate devices")?;
        info!("Listing {} device(s)", records.len());
        for record in &records {
            print_json(record)?;
        }
    }

    let mut event_loop = EventLoop::new().context("cannot create event loop")?;
    let mut monitor = Monitor::open(&context, &event_loop.handle(), |event: DeviceEvent| {
        print_json(&event)
    })
    .context("cannot subscribe to device events")?;

    let signals = SignalStop::install(&event_loop.handle(), &[Signal::SIGINT, Signal::SIGTERM])
        .context("cannot watch termination signals")?;

    let result = event_loop.run();
    drop(signals);

    if let Err(err) = monitor.close() {
        warn!("{}", err);
    }
    drop(monitor);
    context.shutdown();

    result.context("device monitoring failed")
}
