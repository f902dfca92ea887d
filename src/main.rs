use anyhow::Context;
use clap::Parser;
use picture_tray::{headless, Args, PictureTrayApp, RenderTarget};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_WINDOW_WIDTH: f32 = 440.0;
const DEFAULT_WINDOW_HEIGHT: f32 = 600.0;

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("picture_tray={level}").parse()?)
        .add_directive("eframe=warn".parse()?)
        .add_directive("notify=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn run_window(args: Args) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT])
            .with_title("Picture Tray"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Picture Tray",
        options,
        Box::new(|cc| {
            PictureTrayApp::new(cc, args)
                .map(|app| Box::new(app) as Box<dyn eframe::App>)
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
        }),
    );

    match result {
        Ok(_) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Failed to run application: {:?}", e)),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug)?;

    match args.target {
        RenderTarget::Window => run_window(args),
        RenderTarget::Headless => headless::run(&args).context("headless slideshow"),
    }
}
