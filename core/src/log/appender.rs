use super::{
    LogError,
    consts::{LOG_ARCHIVE_SUFFIX, LOG_FILE_BASE_ROLLS, LOG_FILE_MAX_ROLLS, LOG_FILE_MAX_SIZE, LOG_LINE_PATTERN, LOG_LINE_PATTERN_COLORED},
};
use log::LevelFilter;
use log4rs::{
    append::{
        Append,
        console::ConsoleAppender,
        rolling_file::{
            RollingFileAppender,
            policy::compound::{CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger},
        },
    },
    config::Appender,
    encode::pattern::PatternEncoder,
    filter::{Filter, threshold::ThresholdFilter},
};
use std::path::PathBuf;

pub(super) struct AppenderSpec {
    pub name: &'static str,
    level: Option<LevelFilter>,
    append: Box<dyn Append>,
}

impl AppenderSpec {
    pub fn console(name: &'static str, level: Option<LevelFilter>) -> Self {
        Self::new(
            name,
            level,
            Box::new(ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN_COLORED))).build()),
        )
    }

    pub fn roller(name: &'static str, level: Option<LevelFilter>, log_dir: &str, file_name: &str) -> Result<Self, LogError> {
        let trigger = Box::new(SizeTrigger::new(LOG_FILE_MAX_SIZE));

        let file_path = PathBuf::from(log_dir).join(file_name);
        let roller_pattern = PathBuf::from(log_dir).join(format!("{}{}", file_name, LOG_ARCHIVE_SUFFIX));
        let roller_pattern = roller_pattern.to_str().ok_or_else(|| LogError::InvalidLogPath(roller_pattern.display().to_string()))?;
        let roller = Box::new(
            FixedWindowRoller::builder()
                .base(LOG_FILE_BASE_ROLLS)
                .build(roller_pattern, LOG_FILE_MAX_ROLLS)
                .map_err(|err| LogError::AppenderError(err.to_string()))?,
        );

        let compound_policy = Box::new(CompoundPolicy::new(trigger, roller));
        let file_appender = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
            .build(file_path, compound_policy)
            .map_err(|err| LogError::AppenderError(err.to_string()))?;

        Ok(Self::new(name, level, Box::new(file_appender)))
    }

    pub fn new(name: &'static str, level: Option<LevelFilter>, append: Box<dyn Append>) -> Self {
        Self { name, level, append }
    }

    pub fn appender(self) -> Appender {
        Appender::builder()
            .filters(self.level.map(|x| Box::new(ThresholdFilter::new(x)) as Box<dyn Filter>))
            .build(self.name, self.append)
    }
}
