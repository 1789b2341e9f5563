use std::{
    env,
    io::Write,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::logger::{GroupEvent, get_group_event};
use crate::prelude::*;
use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};
use lazy_static::lazy_static;
use log::Log;
use simplelog::{CombinedLogger, SharedLogger};

pub const BENCHCTL_U8_COLOR_CODE: u8 = 39; // #00AFFF

const LOG_LEVEL_ENV: &str = "BENCHCTL_LOG";

lazy_static! {
    pub static ref SPINNER: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));
    pub static ref IS_TTY: bool = std::io::IsTerminal::is_terminal(&std::io::stdout());
}

/// Hide the spinner while `f` runs, then draw it again.
///
/// Without a TTY there is no spinner and `f` runs as is.
pub fn suspend_progress_bar<F: FnOnce() -> R, R>(f: F) -> R {
    if *IS_TTY {
        if let Ok(mut spinner) = SPINNER.lock() {
            if let Some(spinner) = spinner.as_mut() {
                return spinner.suspend(f);
            }
        }
    }

    f()
}

fn log_level_from_env() -> log::LevelFilter {
    env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|log_level| log_level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info)
}

pub struct LocalLogger {
    log_level: log::LevelFilter,
}

impl LocalLogger {
    pub fn new() -> Self {
        LocalLogger {
            log_level: log_level_from_env(),
        }
    }

    fn start_spinner(&self, name: &str) {
        let template = format!(
            "  {{spinner:>.{BENCHCTL_U8_COLOR_CODE}}} {{wide_msg:.{BENCHCTL_U8_COLOR_CODE}.bold}}"
        );
        let spinner_style = match ProgressStyle::with_template(&template) {
            Ok(spinner_style) => spinner_style,
            Err(_) => ProgressStyle::default_spinner(),
        };

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style);
        spinner.set_message(format!("{name}..."));
        spinner.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut current) = SPINNER.lock() {
            if let Some(previous) = current.replace(spinner) {
                previous.finish_and_clear();
            }
        }
    }
}

impl Log for LocalLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.log_level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Some(group_event) = get_group_event(record) {
            match group_event {
                GroupEvent::Start(name) => {
                    println!(
                        "\n{}",
                        style(format!("►►► {name} "))
                            .bold()
                            .color256(BENCHCTL_U8_COLOR_CODE)
                    );

                    if *IS_TTY {
                        self.start_spinner(&name);
                    } else {
                        println!("{name}...");
                    }
                }
                GroupEvent::End => clean_logger(),
            }

            return;
        }

        suspend_progress_bar(|| print_record(record));
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

/// Print a log record to the console with the appropriate style
fn print_record(record: &log::Record) {
    let error_style = Style::new().red();
    let info_style = Style::new().white();
    let warn_style = Style::new().yellow();
    let debug_style = Style::new().blue().dim();
    let trace_style = Style::new().black().dim();

    match record.level() {
        log::Level::Error => eprintln!("{}", error_style.apply_to(record.args())),
        log::Level::Warn => eprintln!("{}", warn_style.apply_to(record.args())),
        log::Level::Info => println!("{}", info_style.apply_to(record.args())),
        log::Level::Debug => println!(
            "{}",
            debug_style.apply_to(format!("[DEBUG::{}] {}", record.target(), record.args())),
        ),
        log::Level::Trace => println!(
            "{}",
            trace_style.apply_to(format!("[TRACE::{}] {}", record.target(), record.args()))
        ),
    }
}

impl SharedLogger for LocalLogger {
    fn level(&self) -> log::LevelFilter {
        self.log_level
    }

    fn config(&self) -> Option<&simplelog::Config> {
        None
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}

pub fn init_local_logger() -> Result<()> {
    CombinedLogger::init(vec![Box::new(LocalLogger::new())])?;
    Ok(())
}

pub fn clean_logger() {
    if let Ok(mut spinner) = SPINNER.lock() {
        if let Some(spinner) = spinner.take() {
            spinner.finish_and_clear();
        }
    }
}
