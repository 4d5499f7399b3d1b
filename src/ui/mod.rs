//! Terminal output helpers shared by every command.
//!
//! Status lines go through the glyph helpers below so `--quiet` can silence
//! them in one place. Errors and warnings always reach stderr.

use crate::core::{Image, ImageSource};
use crate::package::Package;
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod observer;
pub mod progress;

static QUIET: AtomicBool = AtomicBool::new(false);
static VERBOSE: AtomicBool = AtomicBool::new(false);
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Honour `NO_COLOR` and skip colors when stdout is not a terminal.
pub fn init_colors() {
    use std::io::IsTerminal;
    if std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
}

pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub fn mark_interrupted() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

pub fn was_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

pub fn header(title: &str) {
    if is_quiet() {
        return;
    }
    println!("\n{}", title.bold().underline());
}

pub fn success(msg: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", "✓".green().bold(), msg);
}

pub fn info(msg: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", "ℹ".blue().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

pub fn separator() {
    println!("{}", "─".repeat(60).bright_black());
}

pub fn keyval(key: &str, val: &str) {
    println!("{}: {}", key.bold(), val);
}

pub fn indent(msg: &str, level: usize) {
    let spaces = " ".repeat(level * 2);
    println!("{}{}", spaces, msg);
}

/// One line per package: urn, title and the handler that produced it.
pub fn package_line(package: &Package) -> String {
    let title = package.title().unwrap_or_default();
    format!(
        "{}  {}  {}",
        package.urn().to_string().cyan(),
        title,
        format!("({})", package.handler_id()).dimmed()
    )
}

pub fn package_list(packages: &[Package]) {
    if packages.is_empty() {
        info("No packages found");
        return;
    }
    for package in packages {
        println!("{}", package_line(package));
    }
}

/// Full detail view used by `resolve`.
pub fn package_details(package: &Package, url: Option<&str>) {
    println!("{}", package.display_title().bold().underline());
    separator();
    keyval("URN", &package.urn().to_string());
    keyval("Handler", package.handler_id());
    keyval("Status", &package.status().to_string());
    for (label, value) in package.display_fields() {
        keyval(label, &value);
    }
    if let Some(url) = url {
        keyval("URL", url);
    }
    for image in package.images() {
        keyval(&format!("{:?}", image.kind), &describe_image(image));
    }
    if let Some(description) = package.meta.description.as_deref() {
        println!();
        indent(description, 1);
    }
    if let Some(items) = package.items() {
        println!();
        keyval("Items", &items.len().to_string());
        for item in items {
            indent(&package_line(item), 1);
        }
    }
}

fn describe_image(image: &Image) -> String {
    match &image.source {
        ImageSource::Url(url) => url.clone(),
        ImageSource::Text(text) => format!("\"{}\" (text)", text),
        ImageSource::File(path) => path.display().to_string(),
    }
}
