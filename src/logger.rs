use std::env;

const LIBS_DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Warn;
const LIBS_LOG_LEVEL_VAR: &str = "ISOSURFACE_LIBS_LOG_LEVEL";

/// Initializes logger for current environment.
///
/// Debug builds log colored lines to stdout, release builds plain lines to
/// stderr. Log level of dependencies can be raised with the
/// `ISOSURFACE_LIBS_LOG_LEVEL` environment variable.
pub fn init() -> Result<(), log::SetLoggerError> {
    let base_logger = fern::Dispatch::new().level(libs_log_level());
    let env_specific_logger = init_env_specific(base_logger);

    env_specific_logger.apply()
}

fn libs_log_level() -> log::LevelFilter {
    env::var(LIBS_LOG_LEVEL_VAR)
        .map(|libs_log_level| parse_level(&libs_log_level))
        .unwrap_or(LIBS_DEFAULT_LOG_LEVEL)
}

fn parse_level(level: &str) -> log::LevelFilter {
    match level {
        "error" => log::LevelFilter::Error,
        "warning" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        "off" => log::LevelFilter::Off,
        _ => LIBS_DEFAULT_LOG_LEVEL,
    }
}

#[cfg(debug_assertions)]
fn init_env_specific(base_logger: fern::Dispatch) -> fern::Dispatch {
    use fern::colors::{Color, ColoredLevelConfig};

    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Cyan)
        .debug(Color::BrightWhite)
        .trace(Color::White);

    base_logger
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .level_for("isosurface_mesher", log::LevelFilter::Debug)
        .chain(std::io::stdout())
}

#[cfg(not(debug_assertions))]
fn init_env_specific(base_logger: fern::Dispatch) -> fern::Dispatch {
    base_logger
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level_for("isosurface_mesher", log::LevelFilter::Info)
        .chain(std::io::stderr())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_known_names() {
        assert_eq!(parse_level("error"), log::LevelFilter::Error);
        assert_eq!(parse_level("warning"), log::LevelFilter::Warn);
        assert_eq!(parse_level("trace"), log::LevelFilter::Trace);
        assert_eq!(parse_level("off"), log::LevelFilter::Off);
    }

    #[test]
    fn test_parse_level_unknown_falls_back_to_default() {
        assert_eq!(parse_level("warn"), LIBS_DEFAULT_LOG_LEVEL);
        assert_eq!(parse_level(""), LIBS_DEFAULT_LOG_LEVEL);
    }
}
