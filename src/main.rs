mod app;
mod notes;
mod util;

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Notes graph JSON file; a built-in demo graph is used when omitted.
    #[arg(long)]
    notes: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "notemap",
        options,
        Box::new(move |cc| Ok(Box::new(app::NoteMapApp::new(cc, args.notes.clone())))),
    )
}
