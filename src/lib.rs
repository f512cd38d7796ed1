use anyhow::{Context, Result, anyhow};
use log::LevelFilter;
use std::borrow::Cow;
use std::env;

pub mod transcoder;
pub mod trigger;

pub static APP_NAME: &str = "transcoder_trigger";

pub static PIPELINE_ID_VAR: &str = "PipelineId";
pub static LOGGING_LEVEL_VAR: &str = "LoggingLevel";

/// Numeric level used when `LoggingLevel` is unset.
pub const DEFAULT_LOGGING_LEVEL: i64 = 40;

#[derive(Debug, Clone)]
pub struct Config {
    pub pipeline_id: String,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let log_level = log_level_from_env()?;
        let pipeline_id =
            env::var(PIPELINE_ID_VAR).with_context(|| format!("{PIPELINE_ID_VAR} is not set"))?;

        Ok(Self {
            pipeline_id,
            log_level,
        })
    }
}

/// Reads `LoggingLevel`, falling back to error level when it is unset.
pub fn log_level_from_env() -> Result<LevelFilter> {
    match env::var(LOGGING_LEVEL_VAR) {
        Ok(value) => parse_log_level(&value),
        Err(env::VarError::NotPresent) => Ok(level_filter(DEFAULT_LOGGING_LEVEL)),
        Err(e) => Err(anyhow!("invalid {LOGGING_LEVEL_VAR}: {e}")),
    }
}

/// Parses a numeric logging threshold (10 debug, 20 info, 30 warning, 40 error, 50 critical).
///
/// Records at or above the threshold are logged, so 15 enables info and up.
pub fn parse_log_level(value: &str) -> Result<LevelFilter> {
    let level = value
        .trim()
        .parse::<i64>()
        .with_context(|| format!("invalid {LOGGING_LEVEL_VAR}: '{value}'"))?;

    Ok(level_filter(level))
}

fn level_filter(level: i64) -> LevelFilter {
    match level {
        i64::MIN..=0 => LevelFilter::Trace,
        1..=10 => LevelFilter::Debug,
        11..=20 => LevelFilter::Info,
        21..=30 => LevelFilter::Warn,
        _ => LevelFilter::Error,
    }
}

pub fn set_up_logger<T>(calling_module: T, level: LevelFilter) -> Result<()>
where
    T: Into<Cow<'static, str>>,
{
    // Already installed on warm invocations
    let _ = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level.min(LevelFilter::Warn))
        .level_for(APP_NAME, level)
        .level_for(calling_module, level)
        .chain(std::io::stdout())
        .apply();

    Ok(())
}

#[cfg(test)]
mod test {

    use super::*;
    use std::sync::{Mutex, MutexGuard};

    #[test]
    fn test_parse_log_level() -> Result<()> {
        assert_eq!(LevelFilter::Trace, parse_log_level("0")?);
        assert_eq!(LevelFilter::Debug, parse_log_level("10")?);
        assert_eq!(LevelFilter::Info, parse_log_level("20")?);
        assert_eq!(LevelFilter::Warn, parse_log_level("30")?);
        assert_eq!(LevelFilter::Error, parse_log_level("40")?);
        assert_eq!(LevelFilter::Error, parse_log_level("50")?);

        Ok(())
    }

    #[test]
    fn test_parse_log_level_between_levels() -> Result<()> {
        assert_eq!(LevelFilter::Debug, parse_log_level("5")?);
        assert_eq!(LevelFilter::Info, parse_log_level("15")?);
        assert_eq!(LevelFilter::Warn, parse_log_level(" 25 ")?);
        assert_eq!(LevelFilter::Error, parse_log_level("35")?);
        assert_eq!(LevelFilter::Trace, parse_log_level("-1")?);

        Ok(())
    }

    #[test]
    fn test_parse_log_level_rejects_names() {
        assert!(parse_log_level("INFO").is_err());
        assert!(parse_log_level("").is_err());
    }

    #[test]
    fn test_default_level_is_error() {
        assert_eq!(LevelFilter::Error, level_filter(DEFAULT_LOGGING_LEVEL));
    }

    // Tests below mutate the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_env(pipeline_id: Option<&str>, logging_level: Option<&str>) {
        // SAFETY: callers hold ENV_LOCK and nothing else in this crate reads these variables.
        unsafe {
            match pipeline_id {
                Some(value) => env::set_var(PIPELINE_ID_VAR, value),
                None => env::remove_var(PIPELINE_ID_VAR),
            }
            match logging_level {
                Some(value) => env::set_var(LOGGING_LEVEL_VAR, value),
                None => env::remove_var(LOGGING_LEVEL_VAR),
            }
        }
    }

    #[test]
    fn test_config_from_env() -> Result<()> {
        let _guard = lock_env();
        set_env(Some("1561436417428-xtx4ve"), Some("20"));

        let config = Config::from_env()?;

        assert_eq!("1561436417428-xtx4ve", config.pipeline_id);
        assert_eq!(LevelFilter::Info, config.log_level);

        Ok(())
    }

    #[test]
    fn test_config_from_env_missing_pipeline_id() {
        let _guard = lock_env();
        set_env(None, Some("20"));

        let err = Config::from_env().unwrap_err();

        assert!(err.to_string().contains(PIPELINE_ID_VAR));
    }

    #[test]
    fn test_log_level_from_env_unset() -> Result<()> {
        let _guard = lock_env();
        set_env(Some("1561436417428-xtx4ve"), None);

        assert_eq!(LevelFilter::Error, log_level_from_env()?);
        assert_eq!(LevelFilter::Error, Config::from_env()?.log_level);

        Ok(())
    }

    #[test]
    fn test_log_level_from_env_not_an_integer() {
        let _guard = lock_env();
        set_env(Some("1561436417428-xtx4ve"), Some("DEBUG"));

        assert!(log_level_from_env().is_err());
        assert!(Config::from_env().is_err());
    }
}
