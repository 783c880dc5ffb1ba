#![warn(clippy::pedantic)]

pub mod settings;
pub mod trace;

use anyhow::Result as AnyResult;

const USAGE: &str = "usage: scrawl <trace.toml> [output.png]
       scrawl --save-settings";

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", log::LevelFilter::Debug);
    }

    let mut args = std::env::args_os().skip(1);
    let Some(input) = args.next() else {
        anyhow::bail!(USAGE);
    };
    let settings = settings::Settings::load();
    if input == "--save-settings" {
        let path = settings.save()?;
        log::info!("wrote settings to {}", path.display());
        return Ok(());
    }
    let output = args
        .next()
        .map_or_else(|| std::path::PathBuf::from("out.png"), std::path::PathBuf::from);

    let source = std::fs::read_to_string(&input)?;
    let trace = trace::Trace::from_toml_str(&source)?;
    let mut board = scrawl_core::Whiteboard::with_document(settings.config, trace.document()?);
    log::debug!("replaying {} events", trace.events.len());
    trace.replay(&mut board);

    let pixmap: tiny_skia::Pixmap = board
        .render_to_pixmap()
        .ok_or_else(|| anyhow::anyhow!("could not allocate the canvas"))?;
    pixmap.save_png(&output)?;
    log::info!(
        "rendered {} elements to {}",
        board.document().len(),
        output.display()
    );
    Ok(())
}
