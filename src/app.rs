use crate::{
    animator::{BounceAnimator, SaverOptions},
    artwork,
    config::Config,
    connector::{PlayerConnector, PlayerEvent},
};
use eframe::egui::{
    self, Color32, ColorImage, CornerRadius, CursorIcon, LayerId, Pos2, Rect, TextureHandle,
    TextureOptions, ViewportCommand,
};
use std::time::{Duration, Instant};

/// Mouse travel (in points, per frame, either axis) below which movement is
/// treated as jitter rather than a wake-up gesture.
const MOUSE_JITTER_THRESHOLD: f32 = 5.0;

/// Upper bound on catch-up frames after a stall, so a long paint pause does
/// not turn into a burst of teleporting.
const MAX_CATCHUP_TICKS: u32 = 30;

#[derive(Debug, Clone, Copy)]
pub enum SaverMode {
    FullScreen,
    /// Drawable area is the preview pane's client size, measured before the
    /// window exists.
    Preview {
        parent: isize,
        width: i32,
        height: i32,
    },
}

/// Fixed-interval frame counter driven by the repaint loop, standing in for a
/// UI timer. Only armed when the initial player connect succeeded.
struct Ticker {
    interval: Duration,
    last: Instant,
}

impl Ticker {
    fn new(interval: Duration, now: Instant) -> Self {
        Self { interval, last: now }
    }

    fn due_ticks(&mut self, now: Instant) -> u32 {
        let mut ticks = 0;
        while now.duration_since(self.last) >= self.interval {
            self.last += self.interval;
            ticks += 1;
            if ticks >= MAX_CATCHUP_TICKS {
                self.last = now;
                break;
            }
        }
        ticks
    }
}

pub struct SaverApp {
    mode: SaverMode,
    config: Config,
    connector: Option<PlayerConnector>,
    rng: fastrand::Rng,
    options: Option<SaverOptions>,
    animator: Option<BounceAnimator>,
    ticker: Option<Ticker>,
    tick_interval: Duration,
    texture: Option<TextureHandle>,
    texture_dirty: bool,
    background: Color32,
    last_mouse: Option<Pos2>,
    #[cfg(target_os = "windows")]
    embedded: bool,
}

impl SaverApp {
    /// `connector` is the outcome of the one-time connect: `None` means it
    /// failed, in which case the frame ticker is never armed and the saver
    /// shows a bare background for its whole life. A track change can never
    /// revive it; see DESIGN.md before changing that.
    pub fn new(mode: SaverMode, config: Config, connector: Option<PlayerConnector>) -> Self {
        let tick_interval = Duration::from_millis(config.animation.tick_interval_ms);
        let ticker = connector
            .is_some()
            .then(|| Ticker::new(tick_interval, Instant::now()));
        let [r, g, b] = config.display.background;

        Self {
            mode,
            config,
            connector,
            rng: fastrand::Rng::new(),
            options: None,
            animator: None,
            ticker,
            tick_interval,
            texture: None,
            texture_dirty: false,
            background: Color32::from_rgb(r, g, b),
            last_mouse: None,
            #[cfg(target_os = "windows")]
            embedded: false,
        }
    }

    pub fn animation_enabled(&self) -> bool {
        self.ticker.is_some()
    }

    /// The drawable area is only known once the window exists; everything
    /// derived from it is built on the first frame and then never changes.
    fn ensure_initialized(&mut self, ctx: &egui::Context) {
        if self.animator.is_some() {
            return;
        }

        let options = match self.mode {
            SaverMode::Preview { width, height, .. } => {
                SaverOptions::preview(width, height, &self.config.animation)
            }
            SaverMode::FullScreen => {
                let rect = ctx.screen_rect();
                SaverOptions::full_screen(
                    rect.width() as i32,
                    rect.height() as i32,
                    &self.config.animation,
                )
            }
        };

        log::info!(
            "drawable {}x{}, sprite {}",
            options.drawable_width,
            options.drawable_height,
            options.sprite_size
        );

        self.animator = Some(BounceAnimator::new(&options, &mut self.rng));
        self.options = Some(options);
    }

    fn drain_player_events(&mut self) {
        let Some(connector) = &self.connector else {
            return;
        };

        let mut latest: Option<PlayerEvent> = None;
        while let Some(event) = connector.try_event() {
            latest = Some(event);
        }

        if let Some(PlayerEvent::TrackChanged { track, artwork }) = latest {
            match &track {
                Some(track) => log::info!("track changed: {}", track.display()),
                None => log::info!("nothing playing"),
            }
            let decoded = self.decode_event_artwork(artwork);
            if let Some(animator) = &mut self.animator {
                animator.set_artwork(decoded);
            }
            self.texture_dirty = true;
        }
    }

    fn decode_event_artwork(&self, artwork: Option<Vec<u8>>) -> Option<ColorImage> {
        let bytes = artwork?;
        match artwork::decode_artwork(&bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }

    fn advance_animation(&mut self) {
        let (Some(ticker), Some(animator)) = (&mut self.ticker, &mut self.animator) else {
            return;
        };

        for _ in 0..ticker.due_ticks(Instant::now()) {
            animator.tick();
        }
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_dirty {
            return;
        }
        self.texture_dirty = false;

        let artwork = self.animator.as_ref().and_then(BounceAnimator::artwork);
        self.texture = artwork
            .map(|image| ctx.load_texture("album-art", image.clone(), TextureOptions::LINEAR));
    }

    fn paint(&self, ctx: &egui::Context) {
        let painter = ctx.layer_painter(LayerId::background());
        painter.rect_filled(ctx.screen_rect(), CornerRadius::same(0), self.background);

        let (Some(animator), Some(texture)) = (&self.animator, &self.texture) else {
            return;
        };

        let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        painter.image(texture.id(), animator.sprite_rect(), uv, Color32::WHITE);
    }

    /// Any click, any key, or real mouse travel ends the saver. Disabled in
    /// preview mode, where the settings dialog owns the input.
    fn handle_exit_gestures(&mut self, ctx: &egui::Context) {
        let gestures_enabled = self
            .options
            .as_ref()
            .map_or(matches!(self.mode, SaverMode::FullScreen), |o| {
                o.exit_gestures
            });
        if !gestures_enabled {
            return;
        }

        let (clicked, key_pressed, mouse_pos) = ctx.input(|i| {
            let key_pressed = i
                .events
                .iter()
                .any(|event| matches!(event, egui::Event::Key { .. }));
            (i.pointer.any_click(), key_pressed, i.pointer.latest_pos())
        });

        if clicked || key_pressed {
            ctx.send_viewport_cmd(ViewportCommand::Close);
            return;
        }

        if let Some(pos) = mouse_pos {
            if let Some(previous) = self.last_mouse {
                if (pos.x - previous.x).abs() > MOUSE_JITTER_THRESHOLD
                    || (pos.y - previous.y).abs() > MOUSE_JITTER_THRESHOLD
                {
                    ctx.send_viewport_cmd(ViewportCommand::Close);
                    return;
                }
            }
            self.last_mouse = Some(pos);
        }
    }

    #[cfg(target_os = "windows")]
    fn ensure_embedded(&mut self, frame: &eframe::Frame) {
        let SaverMode::Preview { parent, .. } = self.mode else {
            return;
        };
        if self.embedded {
            return;
        }
        self.embedded = true;

        if let Err(e) = crate::platform::embed_into(parent, frame) {
            log::warn!("preview embedding failed: {e:#}");
        }
    }
}

impl eframe::App for SaverApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        #[cfg(target_os = "windows")]
        self.ensure_embedded(_frame);

        self.ensure_initialized(ctx);

        let cursor_visible = self.options.as_ref().map_or(false, |o| o.cursor_visible);
        if !cursor_visible {
            ctx.set_cursor_icon(CursorIcon::None);
        }

        self.drain_player_events();
        self.advance_animation();
        self.refresh_texture(ctx);
        self.paint(ctx);
        self.handle_exit_gestures(ctx);

        let next = if self.animation_enabled() {
            self.tick_interval
        } else {
            Duration::from_millis(250)
        };
        ctx.request_repaint_after(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::TrackInfo;
    use std::sync::mpsc;

    fn test_config() -> Config {
        Config::default()
    }

    fn stub_connector() -> PlayerConnector {
        let (_tx, rx) = mpsc::channel();
        PlayerConnector::from_receiver(rx)
    }

    #[test]
    fn connect_failure_never_arms_the_ticker() {
        let app = SaverApp::new(SaverMode::FullScreen, test_config(), None);
        assert!(!app.animation_enabled());
    }

    #[test]
    fn successful_connect_arms_the_ticker() {
        let app = SaverApp::new(SaverMode::FullScreen, test_config(), Some(stub_connector()));
        assert!(app.animation_enabled());
    }

    #[test]
    fn ticker_counts_whole_intervals() {
        let start = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(10), start);

        assert_eq!(ticker.due_ticks(start + Duration::from_millis(5)), 0);
        assert_eq!(ticker.due_ticks(start + Duration::from_millis(25)), 2);
        // Already consumed; only the remainder is left.
        assert_eq!(ticker.due_ticks(start + Duration::from_millis(31)), 1);
    }

    #[test]
    fn ticker_caps_catchup_after_a_stall() {
        let start = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(10), start);

        let late = start + Duration::from_secs(60);
        assert_eq!(ticker.due_ticks(late), MAX_CATCHUP_TICKS);
        assert_eq!(ticker.due_ticks(late), 0);
    }

    #[test]
    fn latest_track_event_wins() {
        let (tx, rx) = mpsc::channel();
        let mut app = SaverApp::new(
            SaverMode::Preview {
                parent: 0,
                width: 400,
                height: 300,
            },
            test_config(),
            Some(PlayerConnector::from_receiver(rx)),
        );
        app.animator = Some(BounceAnimator::new(
            &SaverOptions::preview(400, 300, &test_config().animation),
            &mut fastrand::Rng::with_seed(1),
        ));

        let event = |title: &str| PlayerEvent::TrackChanged {
            track: Some(TrackInfo {
                title: title.into(),
                ..Default::default()
            }),
            artwork: None,
        };
        tx.send(event("first")).unwrap();
        tx.send(event("second")).unwrap();

        app.drain_player_events();
        assert!(app.texture_dirty);
        // No artwork bytes arrived, so the sprite has nothing to draw.
        assert!(app.animator.as_ref().unwrap().artwork().is_none());
    }

    #[test]
    fn absent_track_clears_previous_artwork() {
        let (tx, rx) = mpsc::channel();
        let mut app = SaverApp::new(
            SaverMode::FullScreen,
            test_config(),
            Some(PlayerConnector::from_receiver(rx)),
        );
        let mut animator = BounceAnimator::new(
            &SaverOptions::full_screen(1000, 800, &test_config().animation),
            &mut fastrand::Rng::with_seed(2),
        );
        animator.set_artwork(Some(ColorImage::from_rgba_unmultiplied(
            [1, 1],
            &[1, 2, 3, 255],
        )));
        app.animator = Some(animator);

        tx.send(PlayerEvent::TrackChanged {
            track: None,
            artwork: None,
        })
        .unwrap();

        app.drain_player_events();
        assert!(app.animator.as_ref().unwrap().artwork().is_none());
        assert!(app.texture_dirty);
    }
}
