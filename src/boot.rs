use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

/// Directories created on first start if missing.
const REQUIRED_DIRS: &[&str] = &["static", "templates"];

/// Every page template; a missing one turns that page into a 500.
pub const CRITICAL_TEMPLATES: &[&str] = &[
    "templates/base.html.tera",
    "templates/home.html.tera",
    "templates/detail.html.tera",
    "templates/editor.html.tera",
    "templates/delete.html.tera",
    "templates/settings.html.tera",
    "templates/login.html.tera",
];

const CRITICAL_STATIC: &[&str] = &["static/style.css"];

#[derive(Debug, Default, PartialEq)]
pub struct BootReport {
    pub warnings: u32,
    pub errors: u32,
}

/// Run the boot checks against the working directory and abort the process
/// if anything critical is missing.
pub fn run(database: &str) {
    info!("Boot check starting...");

    let report = check(Path::new("."), database);

    if report.errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            report.errors, report.warnings
        );
        process::exit(1);
    }

    if report.warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some pages may not render correctly.",
            report.warnings
        );
    } else {
        info!("Boot check passed.");
    }
}

pub fn check(root: &Path, database: &str) -> BootReport {
    let mut report = BootReport::default();

    // ── 1. Directories ─────────────────────────────────
    for dir in REQUIRED_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            match fs::create_dir_all(&path) {
                Ok(_) => info!("  Created directory: {}", dir),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir, e);
                    report.errors += 1;
                }
            }
        }
    }

    // ── 2. Templates ───────────────────────────────────
    for file in CRITICAL_TEMPLATES {
        if !root.join(file).exists() {
            error!("  MISSING critical template: {}", file);
            report.errors += 1;
        }
    }

    // ── 3. Static assets ───────────────────────────────
    for file in CRITICAL_STATIC {
        if !root.join(file).exists() {
            warn!("  Missing static asset: {} (pages will be unstyled)", file);
            report.warnings += 1;
        }
    }

    // ── 4. Database directory writable ─────────────────
    let db_dir = match Path::new(database).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => root.join(parent),
        _ => root.to_path_buf(),
    };
    let test_file = db_dir.join(".write_test");
    match fs::write(&test_file, "test") {
        Ok(_) => {
            let _ = fs::remove_file(&test_file);
        }
        Err(e) => {
            error!("  Database directory {} not writable: {}", db_dir.display(), e);
            report.errors += 1;
        }
    }

    // ── 5. Rocket.toml ─────────────────────────────────
    if !root.join("Rocket.toml").exists() {
        warn!("  Rocket.toml not found, using default config");
        report.warnings += 1;
    }

    report
}
