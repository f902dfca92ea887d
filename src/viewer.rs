use eframe::egui;
use image::imageops::FilterType;
use notify::RecommendedWatcher;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::selector::{trim_label, Selection, Selector};
use crate::watch::start_watcher;
use crate::{Args, PictureTrayError, Result, Settings};

pub const PREVIEW_SIZE: u32 = 400;
const SOURCE_LABEL_WIDTH: usize = 30;
const PLACEHOLDER_TEXT: &str = "No Images Found";
const PLACEHOLDER_FONT_SIZE: f32 = 20.0;
const MIN_THREAD_COUNT: usize = 2;

pub struct PictureTrayApp {
    pub args: Args,
    /// What is on disk; command-line overrides are layered on top when used.
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub selector: Arc<Selector>,
    pub current: Option<Selection>,
    pub preview: Option<egui::TextureHandle>,
    pub preview_failed: bool,
    pub preview_sender: Sender<(PathBuf, Option<egui::ColorImage>)>,
    pub preview_receiver: Receiver<(PathBuf, Option<egui::ColorImage>)>,
    pub watch_sender: Sender<()>,
    pub watch_receiver: Receiver<()>,
    pub refreshed_sender: Sender<()>,
    pub refreshed_receiver: Receiver<()>,
    pub selector_sender: Sender<(u64, Arc<Selector>)>,
    pub selector_receiver: Receiver<(u64, Arc<Selector>)>,
    /// Bumped on every rebuild request; older results are discarded.
    pub rebuild_generation: u64,
    pub pending_roots: Option<Vec<PathBuf>>,
    pub thread_pool: rayon::ThreadPool,
    pub watcher: Option<RecommendedWatcher>,
    pub last_switch: Instant,
    pub dark_mode: Option<bool>,
    pub exit_prompt: bool,
    pub exit_confirmed: bool,
}

impl PictureTrayApp {
    pub fn new(cc: &eframe::CreationContext<'_>, args: Args) -> Result<Self> {
        Self::from_args(args, &cc.egui_ctx)
    }

    pub fn from_args(args: Args, ctx: &egui::Context) -> Result<Self> {
        let settings_path = args.settings_path();
        let settings = Settings::load(&settings_path)?;

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_cpus::get().max(MIN_THREAD_COUNT))
            .build()?;

        let (preview_sender, preview_receiver) = mpsc::channel();
        let (watch_sender, watch_receiver) = mpsc::channel();
        let (refreshed_sender, refreshed_receiver) = mpsc::channel();
        let (selector_sender, selector_receiver) = mpsc::channel();

        let roots = args.effective_settings(&settings).roots();
        let selector = Arc::new(Selector::new(roots));
        info!(roots = ?selector.roots(), images = selector.len(), "catalog ready");

        let mut app = Self {
            args,
            settings,
            settings_path,
            selector,
            current: None,
            preview: None,
            preview_failed: false,
            preview_sender,
            preview_receiver,
            watch_sender,
            watch_receiver,
            refreshed_sender,
            refreshed_receiver,
            selector_sender,
            selector_receiver,
            rebuild_generation: 0,
            pending_roots: None,
            thread_pool,
            watcher: None,
            last_switch: Instant::now(),
            dark_mode: None,
            exit_prompt: false,
            exit_confirmed: false,
        };

        app.restart_watcher(ctx);
        app.advance(ctx);
        Ok(app)
    }

    /// Settings as currently in effect, overrides included.
    pub fn effective_settings(&self) -> Settings {
        self.args.effective_settings(&self.settings)
    }

    /// Draw the next picture and start decoding its preview.
    pub fn advance(&mut self, ctx: &egui::Context) {
        self.last_switch = Instant::now();
        self.preview = None;
        self.preview_failed = false;
        self.current = self.selector.next();

        let Some(selection) = &self.current else {
            debug!("no images found");
            return;
        };
        debug!(
            image = %selection.image.display(),
            ordinal = selection.ordinal,
            total = selection.total,
            "selected"
        );

        let sender = self.preview_sender.clone();
        let path = selection.image.clone();
        let ctx = ctx.clone();
        self.thread_pool.spawn(move || {
            let preview = match load_preview(&path, PREVIEW_SIZE) {
                Ok(preview) => Some(preview),
                Err(e) => {
                    warn!(error = %e, "preview unavailable");
                    None
                }
            };
            let _ = sender.send((path, preview));
            ctx.request_repaint();
        });
    }

    pub fn process_preview_results(&mut self, ctx: &egui::Context) {
        while let Ok((path, preview)) = self.preview_receiver.try_recv() {
            // Drop results for pictures that are no longer shown
            if self.current.as_ref().map(|s| &s.image) != Some(&path) {
                continue;
            }
            match preview {
                Some(color_image) => {
                    self.preview = Some(ctx.load_texture(
                        "preview",
                        color_image,
                        egui::TextureOptions::default(),
                    ));
                }
                None => self.preview_failed = true,
            }
        }
    }

    /// Re-scan in the background when the watcher reported changes.
    pub fn process_watch_events(&mut self, ctx: &egui::Context) {
        let mut pending = false;
        while self.watch_receiver.try_recv().is_ok() {
            pending = true;
        }
        if !pending {
            return;
        }

        let selector = Arc::clone(&self.selector);
        let sender = self.refreshed_sender.clone();
        let ctx = ctx.clone();
        self.thread_pool.spawn(move || {
            selector.refresh();
            let _ = sender.send(());
            ctx.request_repaint();
        });
    }

    pub fn process_refresh_results(&mut self, ctx: &egui::Context) {
        let mut refreshed = false;
        while self.refreshed_receiver.try_recv().is_ok() {
            refreshed = true;
        }
        if !refreshed {
            return;
        }

        info!(images = self.selector.len(), "catalog refreshed");
        let stale = match &self.current {
            Some(selection) => !selection.image.exists(),
            None => true,
        };
        if stale {
            self.advance(ctx);
        }
    }

    pub fn process_selector_results(&mut self, ctx: &egui::Context) {
        let mut rebuilt = None;
        while let Ok((generation, selector)) = self.selector_receiver.try_recv() {
            if generation == self.rebuild_generation && self.pending_roots.is_some() {
                rebuilt = Some(selector);
            } else {
                debug!(generation, current = self.rebuild_generation, "dropping stale rebuild");
            }
        }
        let Some(selector) = rebuilt else {
            return;
        };
        self.pending_roots = None;

        info!(roots = ?selector.roots(), images = selector.len(), "catalog rebuilt");
        self.selector = selector;
        self.restart_watcher(ctx);
        self.advance(ctx);
    }

    /// Persist the settings and rebuild the selector from the new roots.
    pub fn apply_settings(&mut self, ctx: &egui::Context) {
        if let Err(e) = self.settings.save(&self.settings_path) {
            warn!(error = %e, "settings not saved");
        }

        let roots = self.effective_settings().roots();
        let target = self.pending_roots.as_deref().unwrap_or(self.selector.roots());
        if roots.as_slice() == target {
            return;
        }

        self.rebuild_generation += 1;
        if roots.as_slice() == self.selector.roots() {
            // Back to what is installed; whatever is in flight is stale
            self.pending_roots = None;
            return;
        }

        self.pending_roots = Some(roots.clone());
        let generation = self.rebuild_generation;
        let sender = self.selector_sender.clone();
        let ctx = ctx.clone();
        self.thread_pool.spawn(move || {
            let _ = sender.send((generation, Arc::new(Selector::new(roots))));
            ctx.request_repaint();
        });
    }

    pub fn restart_watcher(&mut self, ctx: &egui::Context) {
        // Dropping the old watcher stops it
        self.watcher = None;
        if self.args.no_watch {
            return;
        }

        let sender = self.watch_sender.clone();
        let ctx = ctx.clone();
        match start_watcher(self.selector.roots(), move || {
            let _ = sender.send(());
            ctx.request_repaint();
        }) {
            Ok(watcher) => self.watcher = Some(watcher),
            Err(e) => warn!(error = %e, "continuing without directory watching"),
        }
    }

    /// Ask before closing, unless the user already agreed.
    pub fn request_exit(&mut self) {
        if !self.exit_confirmed {
            self.exit_prompt = true;
        }
    }

    pub fn answer_exit(&mut self, ctx: &egui::Context, quit: bool) {
        self.exit_prompt = false;
        if quit {
            info!("exit confirmed");
            self.exit_confirmed = true;
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn show_exit_prompt(&mut self, ctx: &egui::Context) {
        if !self.exit_prompt {
            return;
        }

        let mut answer = None;
        egui::Window::new("Message")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Are you sure to quit?");
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        answer = Some(true);
                    }
                    if ui.button("No").clicked() {
                        answer = Some(false);
                    }
                });
            });

        if let Some(quit) = answer {
            self.answer_exit(ctx, quit);
        }
    }

    fn track_theme(&mut self, ctx: &egui::Context) {
        let dark = ctx.style().visuals.dark_mode;
        if self.dark_mode != Some(dark) {
            let theme = if dark { "dark" } else { "light" };
            info!(theme, "theme changed");
            self.dark_mode = Some(dark);
        }
    }

    fn handle_triggers(&mut self, ctx: &egui::Context) {
        let effective = self.effective_settings();

        let gained_focus = ctx.input(|i| {
            i.events
                .iter()
                .any(|e| matches!(e, egui::Event::WindowFocused(true)))
        });
        if gained_focus && effective.switch_on_open {
            self.advance(ctx);
        }

        if effective.switch_every_interval {
            let interval = effective.switch_interval();
            let elapsed = self.last_switch.elapsed();
            if elapsed >= interval {
                self.advance(ctx);
                ctx.request_repaint_after(interval);
            } else {
                ctx.request_repaint_after(interval - elapsed);
            }
        }
    }

    fn show_picture(&self, ui: &mut egui::Ui) {
        let Some(selection) = &self.current else {
            let color = if self.dark_mode.unwrap_or(false) {
                egui::Color32::WHITE
            } else {
                egui::Color32::BLACK
            };
            ui.add_space(PREVIEW_SIZE as f32 / 4.0);
            ui.label(
                egui::RichText::new(PLACEHOLDER_TEXT)
                    .color(color)
                    .size(PLACEHOLDER_FONT_SIZE),
            );
            ui.add_space(PREVIEW_SIZE as f32 / 4.0);
            return;
        };

        match &self.preview {
            Some(texture) => {
                ui.add(
                    egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                        .max_size(egui::Vec2::splat(PREVIEW_SIZE as f32))
                        .maintain_aspect_ratio(true),
                );
            }
            None => {
                let (rect, _) = ui.allocate_exact_size(
                    egui::Vec2::splat(PREVIEW_SIZE as f32),
                    egui::Sense::hover(),
                );
                let text = if self.preview_failed {
                    "Cannot display this image"
                } else {
                    "Loading..."
                };
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    text,
                    egui::FontId::default(),
                    ui.visuals().weak_text_color(),
                );
            }
        }

        ui.label(selection.stats_label())
            .on_hover_text(selection.image.to_string_lossy().into_owned());
    }
}

impl eframe::App for PictureTrayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.track_theme(ctx);
        self.process_preview_results(ctx);
        self.process_watch_events(ctx);
        self.process_refresh_results(ctx);
        self.process_selector_results(ctx);
        self.handle_triggers(ctx);

        let mut next_clicked = false;
        let mut settings_changed = false;
        let mut exit_clicked = false;
        let every = format!(
            "Every {}",
            humantime::format_duration(self.effective_settings().switch_interval())
        );

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                self.show_picture(ui);
            });

            ui.separator();

            ui.collapsing("Preferences", |ui| {
                ui.label("Image change action");
                settings_changed |= ui
                    .checkbox(&mut self.settings.switch_on_open, "On open")
                    .changed();
                settings_changed |= ui
                    .checkbox(&mut self.settings.switch_every_interval, every)
                    .changed();

                ui.separator();
                ui.label(source_label(&self.effective_settings()));
                settings_changed |= ui
                    .checkbox(&mut self.settings.show_stock, "Show stock images (ignore source)")
                    .changed();
            });

            ui.separator();

            ui.horizontal(|ui| {
                next_clicked = ui.button("Next image").clicked();
                exit_clicked = ui.button("Exit").clicked();
            });
        });

        if settings_changed {
            self.last_switch = Instant::now();
            self.apply_settings(ctx);
        }
        if next_clicked {
            self.advance(ctx);
        }
        if exit_clicked {
            self.request_exit();
        }
        if ctx.input(|i| i.viewport().close_requested()) && !self.exit_confirmed {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.request_exit();
        }
        self.show_exit_prompt(ctx);
    }
}

/// Menu text describing where pictures come from.
pub fn source_label(settings: &Settings) -> String {
    if settings.show_stock {
        return "Source (stock images)".to_owned();
    }

    match settings.source_directories.as_slice() {
        [] => "Source (not set)".to_owned(),
        [only] => format!(
            "Source ({})",
            trim_label(&only.to_string_lossy(), SOURCE_LABEL_WIDTH)
        ),
        [first, rest @ ..] => format!(
            "Source ({} +{} more)",
            trim_label(&first.to_string_lossy(), SOURCE_LABEL_WIDTH),
            rest.len()
        ),
    }
}

/// Decode `path` and scale it to fit a `size` x `size` box, keeping the
/// aspect ratio.
pub fn load_preview(path: &Path, size: u32) -> Result<egui::ColorImage> {
    let to_error = |source| PictureTrayError::PreviewLoad {
        path: path.to_path_buf(),
        source,
    };

    let img = image::io::Reader::open(path)
        .map_err(|e| to_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| to_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(to_error)?;

    Ok(fit_preview(img, size))
}

pub fn fit_preview(img: image::DynamicImage, size: u32) -> egui::ColorImage {
    let scaled = img.resize(size, size, FilterType::Triangle);
    let rgba = scaled.to_rgba8();
    let (width, height) = (scaled.width() as usize, scaled.height() as usize);

    egui::ColorImage::from_rgba_unmultiplied([width, height], rgba.as_raw())
}
