use crate::conf::load_config;
use crate::engine::Engine;
use crate::filter::FilterConfig;
use crate::render::{redraw, render_dashboard};
use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const LOOP_IDLE_SLEEP: Duration = Duration::from_millis(25);

/// Redraw the dashboard every refresh interval until interrupted.
pub fn run_watch(config: &Path, filter: &FilterConfig) -> Result<()> {
    let cfg = load_config(config)?;
    let engine = Engine::from_config(&cfg)?;
    let interval = cfg.dashboard.refresh_interval();

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    tracing::info!(
        access_log = %cfg.sources.access_log.display(),
        interval_ms = cfg.dashboard.refresh_interval_ms,
        "watching"
    );

    print!("\x1b[?25l");
    let _ = io::stdout().flush();

    while running.load(Ordering::SeqCst) {
        let started = Instant::now();

        match engine.evaluate(filter) {
            Ok(eval) => redraw(&render_dashboard(&eval)),
            Err(e) => tracing::error!(error = %e, "refresh failed"),
        }

        while running.load(Ordering::SeqCst) && started.elapsed() < interval {
            thread::sleep(LOOP_IDLE_SLEEP);
        }
    }

    // Restore cursor
    print!("\x1b[?25h");
    let _ = io::stdout().flush();

    Ok(())
}
