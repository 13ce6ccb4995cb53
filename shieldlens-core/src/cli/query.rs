use crate::conf::load_config;
use crate::engine::Engine;
use crate::filter::FilterConfig;
use crate::render::render_dashboard;
use anyhow::Result;
use std::path::Path;

/// Evaluate once and print the result.
pub fn run_query(config: &Path, filter: &FilterConfig, json: bool) -> Result<()> {
    let cfg = load_config(config)?;
    let engine = Engine::from_config(&cfg)?;
    let eval = engine.evaluate(filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*eval)?);
    } else {
        print!("{}", render_dashboard(&eval));
    }
    Ok(())
}
