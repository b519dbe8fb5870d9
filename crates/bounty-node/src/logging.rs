use crate::config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Level from `-v` count, falling back to the configured level.
pub fn effective_level(config: &LoggingConfig, cli_verbose: u8) -> &str {
    match cli_verbose {
        0 => &config.level,
        1 => "debug",
        _ => "trace",
    }
}

/// Build the env filter: `RUST_LOG` wins, otherwise `bounty=<level>` plus module directives.
pub fn build_filter(config: &LoggingConfig, cli_verbose: u8) -> anyhow::Result<EnvFilter> {
    let log_level = effective_level(config, cli_verbose);

    let mut filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("bounty={}", log_level)),
    );

    for (module, level) in &config.module_filters {
        filter = filter.add_directive(format!("{}={}", module, level).parse()?);
    }

    Ok(filter)
}

/// Initialize the logging system based on configuration
pub fn init_logging(config: &LoggingConfig, cli_verbose: u8) -> anyhow::Result<()> {
    let filter = build_filter(config, cli_verbose)?;
    let subscriber = tracing_subscriber::registry().with(filter);

    let file = match &config.file_output {
        Some(path) => Some(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?,
        ),
        None => None,
    };

    match config.format.as_str() {
        "json" => {
            let json_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true);

            match file {
                Some(file) => {
                    let file_layer = fmt::layer().json().with_writer(file).with_ansi(false);
                    subscriber.with(json_layer).with(file_layer).try_init()?;
                }
                None => subscriber.with(json_layer).try_init()?,
            }
        }
        _ => {
            // source locations only help when chasing debug output
            let show_location = matches!(effective_level(config, cli_verbose), "debug" | "trace");

            let pretty_layer = fmt::layer()
                .with_target(show_location)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(show_location)
                .with_file(show_location);

            match file {
                Some(file) => {
                    let file_layer = fmt::layer().with_writer(file).with_ansi(false);
                    subscriber.with(pretty_layer).with(file_layer).try_init()?;
                }
                None => subscriber.with(pretty_layer).try_init()?,
            }
        }
    }

    Ok(())
}
