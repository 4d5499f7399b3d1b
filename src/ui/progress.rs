use colored::Colorize;
use std::io::{self, Write};
use std::time::{Duration, Instant};

const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// `1536` -> `1.5 KiB`
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Byte-oriented transfer bar. Drawn on stderr so stdout stays parseable.
///
/// When the server sends no length the bar degrades to a running byte count.
pub struct ProgressBar {
    total: Option<u64>,
    current: u64,
    message: String,
    start_time: Instant,
    width: usize,
    finished: bool,
}

impl ProgressBar {
    pub fn new(total: Option<u64>, message: &str) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            current: 0,
            message: message.to_string(),
            start_time: Instant::now(),
            width: 40,
            finished: false,
        }
    }

    pub fn set_total(&mut self, total: Option<u64>) {
        self.total = total.filter(|t| *t > 0);
    }

    pub fn set(&mut self, value: u64) {
        self.current = match self.total {
            Some(total) => value.min(total),
            None => value,
        };
        self.draw();
    }

    pub fn inc(&mut self, delta: u64) {
        self.set(self.current.saturating_add(delta));
    }

    /// Whole percent done, if the total is known.
    pub fn percent(&self) -> Option<u64> {
        self.total.map(|total| (self.current.min(total) * 100) / total)
    }

    pub fn eta(&self) -> Option<Duration> {
        let total = self.total?;
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.current == 0 || elapsed <= 0.0 {
            return None;
        }
        let rate = self.current as f64 / elapsed;
        let remaining = total.saturating_sub(self.current);
        Some(Duration::from_secs_f64(remaining as f64 / rate))
    }

    pub fn finish(mut self) {
        self.draw();
        self.finished = true;
        eprintln!();
    }

    pub(crate) fn render(&self) -> String {
        match (self.total, self.percent()) {
            (Some(total), Some(percent)) => {
                let filled = (percent as usize * self.width) / 100;
                let bar = "█".repeat(filled);
                let empty = "░".repeat(self.width.saturating_sub(filled));
                let eta = match self.eta() {
                    Some(eta) if eta.as_secs() > 0 => format!("{}s", eta.as_secs()),
                    _ => "--".to_string(),
                };
                format!(
                    "{} {} [{}{}] {}/{} {}% ETA: {}",
                    "▸".dimmed(),
                    self.message.cyan(),
                    bar.green(),
                    empty.dimmed(),
                    format_bytes(self.current).bold(),
                    format_bytes(total).dimmed(),
                    percent.to_string().bold(),
                    eta.dimmed()
                )
            }
            _ => format!(
                "{} {} {}",
                "▸".dimmed(),
                self.message.cyan(),
                format_bytes(self.current).bold()
            ),
        }
    }

    fn draw(&self) {
        eprint!("\r{}", self.render());
        io::stderr().flush().unwrap_or(());
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        if !self.finished {
            eprintln!();
        }
    }
}

/// Spinner for installs, which report at most a coarse fraction.
pub struct Spinner {
    message: String,
    frames: [&'static str; 10],
    current_frame: usize,
    active: bool,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            frames: ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
            current_frame: 0,
            active: true,
        }
    }

    pub fn update_message(&mut self, message: &str) {
        self.message = message.to_string();
        self.draw();
    }

    /// Advance one frame and redraw.
    pub fn tick(&mut self) {
        self.current_frame = self.current_frame.wrapping_add(1);
        self.draw();
    }

    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        eprint!("\r{:width$}\r", "", width = 100);
        io::stderr().flush().unwrap_or(());
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn frame(&self) -> &'static str {
        self.frames[self.current_frame % self.frames.len()]
    }

    fn draw(&self) {
        if !self.active {
            return;
        }
        eprint!("\r{} {} ...", self.frame().cyan().bold(), self.message);
        io::stderr().flush().unwrap_or(());
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}
