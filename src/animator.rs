use crate::config::AnimationConfig;
use eframe::egui::{pos2, vec2, ColorImage, Rect};

/// Half-open starting-speed range, in pixels per tick. `[min, max)` to match
/// the usual random-range convention; a collapsed range always yields `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedRange {
    pub min: i32,
    pub max: i32,
}

impl SpeedRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn fixed(speed: i32) -> Self {
        Self {
            min: speed,
            max: speed,
        }
    }

    fn sample(&self, rng: &mut fastrand::Rng) -> i32 {
        if self.min < self.max {
            rng.i32(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// Everything that differs between the full-screen saver and the embedded
/// settings-dialog preview: one options struct instead of two constructors.
#[derive(Debug, Clone)]
pub struct SaverOptions {
    pub drawable_width: i32,
    pub drawable_height: i32,
    pub sprite_size: i32,
    pub speed: SpeedRange,
    pub cursor_visible: bool,
    pub exit_gestures: bool,
}

impl SaverOptions {
    pub fn full_screen(width: i32, height: i32, animation: &AnimationConfig) -> Self {
        Self {
            drawable_width: width,
            drawable_height: height,
            sprite_size: sprite_size_for(width, height, animation.art_size_divisor),
            speed: SpeedRange::new(animation.min_speed, animation.max_speed),
            cursor_visible: false,
            exit_gestures: true,
        }
    }

    /// Preview panes animate at a fixed crawl and never react to input.
    pub fn preview(width: i32, height: i32, animation: &AnimationConfig) -> Self {
        Self {
            drawable_width: width,
            drawable_height: height,
            sprite_size: sprite_size_for(width, height, animation.art_size_divisor),
            speed: SpeedRange::fixed(1),
            cursor_visible: true,
            exit_gestures: false,
        }
    }
}

/// Sprite side length is a quarter of the drawable width, clamped so a
/// degenerate drawable still fits the sprite instead of producing an empty
/// random range for the starting position.
fn sprite_size_for(width: i32, height: i32, divisor: i32) -> i32 {
    (width / divisor.max(1)).min(width).min(height).max(1)
}

/// Bounces a single square sprite around a fixed drawable area, DVD-logo
/// style, and holds whatever album art should be drawn on it.
pub struct BounceAnimator {
    width: i32,
    height: i32,
    sprite: i32,
    x: i32,
    y: i32,
    vx: i32,
    vy: i32,
    artwork: Option<ColorImage>,
}

impl BounceAnimator {
    /// Starting position is drawn from `[0, drawable - sprite)` per axis so
    /// the sprite begins fully on-screen; starting velocity is drawn from the
    /// speed range with both components positive.
    pub fn new(options: &SaverOptions, rng: &mut fastrand::Rng) -> Self {
        Self {
            width: options.drawable_width,
            height: options.drawable_height,
            sprite: options.sprite_size,
            x: sample_start(options.drawable_width, options.sprite_size, rng),
            y: sample_start(options.drawable_height, options.sprite_size, rng),
            vx: options.speed.sample(rng),
            vy: options.speed.sample(rng),
            artwork: None,
        }
    }

    /// Advance one frame: position moves by the current velocity, and any axis
    /// whose leading edge left the drawable area (or whose trailing edge
    /// passed it) has its velocity flipped for the next frame. The overshoot
    /// itself is kept, not clamped back; the sprite visibly grazes the edge by
    /// up to one frame's travel before reversing.
    pub fn tick(&mut self) {
        self.x += self.vx;
        if self.x < 0 || self.x + self.sprite > self.width {
            self.vx = -self.vx;
        }

        self.y += self.vy;
        if self.y < 0 || self.y + self.sprite > self.height {
            self.vy = -self.vy;
        }
    }

    /// Replaces the artwork wholesale. `None` means nothing gets drawn until
    /// the next track comes along with art.
    pub fn set_artwork(&mut self, artwork: Option<ColorImage>) {
        self.artwork = artwork;
    }

    pub fn artwork(&self) -> Option<&ColorImage> {
        self.artwork.as_ref()
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn velocity(&self) -> (i32, i32) {
        (self.vx, self.vy)
    }

    pub fn sprite_size(&self) -> i32 {
        self.sprite
    }

    pub fn sprite_rect(&self) -> Rect {
        Rect::from_min_size(
            pos2(self.x as f32, self.y as f32),
            vec2(self.sprite as f32, self.sprite as f32),
        )
    }
}

fn sample_start(extent: i32, sprite: i32, rng: &mut fastrand::Rng) -> i32 {
    let span = extent - sprite;
    if span > 0 {
        rng.i32(0..span)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnimationConfig;
    use eframe::egui::ColorImage;

    fn animator(width: i32, height: i32, sprite: i32) -> BounceAnimator {
        BounceAnimator {
            width,
            height,
            sprite,
            x: 0,
            y: 0,
            vx: 0,
            vy: 0,
            artwork: None,
        }
    }

    fn pixel(value: u8) -> ColorImage {
        ColorImage::from_rgba_unmultiplied([1, 1], &[value, 0, 0, 255])
    }

    #[test]
    fn tick_adds_velocity_exactly_when_clear_of_edges() {
        let mut a = animator(1000, 800, 250);
        a.x = 100;
        a.y = 100;
        a.vx = 2;
        a.vy = 3;

        a.tick();

        assert_eq!(a.position(), (102, 103));
        assert_eq!(a.velocity(), (2, 3));
    }

    #[test]
    fn trailing_edge_contact_flips_only_that_axis() {
        // Drawable 1000x800, sprite 250, position (100, 700), velocity (2, 2):
        // the next frame lands on (102, 702) with trailing edge 952 > 800, so
        // the vertical velocity flips while the horizontal one is untouched.
        let mut a = animator(1000, 800, 250);
        a.x = 100;
        a.y = 700;
        a.vx = 2;
        a.vy = 2;

        a.tick();
        assert_eq!(a.position(), (102, 702));
        assert_eq!(a.velocity(), (2, -2));

        a.tick();
        assert_eq!(a.position(), (104, 700));
        assert_eq!(a.velocity(), (2, -2));
    }

    #[test]
    fn leading_edge_contact_flips_velocity_without_clamping() {
        let mut a = animator(1000, 800, 250);
        a.x = 1;
        a.y = 400;
        a.vx = -2;
        a.vy = 1;

        a.tick();

        // The overshoot past zero is kept for this frame.
        assert_eq!(a.position(), (-1, 401));
        assert_eq!(a.velocity(), (2, 1));
    }

    #[test]
    fn starting_state_stays_within_bounds_for_many_seeds() {
        let animation = AnimationConfig::default();
        let options = SaverOptions::full_screen(1000, 800, &animation);
        assert_eq!(options.sprite_size, 250);

        for seed in 0..200 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let a = BounceAnimator::new(&options, &mut rng);
            let (x, y) = a.position();
            assert!((0..=750).contains(&x), "x out of range: {x}");
            assert!((0..=550).contains(&y), "y out of range: {y}");

            let (vx, vy) = a.velocity();
            assert!((1..3).contains(&vx), "vx out of range: {vx}");
            assert!((1..3).contains(&vy), "vy out of range: {vy}");
        }
    }

    #[test]
    fn seeded_rng_makes_starting_state_reproducible() {
        let options = SaverOptions::full_screen(1000, 800, &AnimationConfig::default());
        let mut first = fastrand::Rng::with_seed(7);
        let mut second = fastrand::Rng::with_seed(7);

        let a = BounceAnimator::new(&options, &mut first);
        let b = BounceAnimator::new(&options, &mut second);

        assert_eq!(a.position(), b.position());
        assert_eq!(a.velocity(), b.velocity());
    }

    #[test]
    fn preview_options_fix_speed_and_quarter_the_pane() {
        let options = SaverOptions::preview(400, 300, &AnimationConfig::default());
        assert_eq!(options.sprite_size, 100);
        assert!(!options.exit_gestures);
        assert!(options.cursor_visible);

        let mut rng = fastrand::Rng::with_seed(1);
        let a = BounceAnimator::new(&options, &mut rng);
        assert_eq!(a.velocity(), (1, 1));
    }

    #[test]
    fn sprite_is_clamped_to_a_shallow_drawable() {
        // Width/4 would be taller than the drawable area; the sprite shrinks
        // to fit instead of starting half off-screen.
        let options = SaverOptions::full_screen(1000, 100, &AnimationConfig::default());
        assert_eq!(options.sprite_size, 100);

        let mut rng = fastrand::Rng::with_seed(3);
        let a = BounceAnimator::new(&options, &mut rng);
        assert_eq!(a.position().1, 0);
    }

    #[test]
    fn tiny_drawable_still_produces_a_sprite() {
        assert_eq!(sprite_size_for(3, 500, 4), 1);
        assert_eq!(sprite_size_for(0, 0, 4), 1);
    }

    #[test]
    fn artwork_is_replaced_wholesale() {
        let mut a = animator(100, 100, 10);
        assert!(a.artwork().is_none());

        a.set_artwork(Some(pixel(10)));
        a.set_artwork(Some(pixel(20)));
        assert_eq!(a.artwork().unwrap().pixels[0].r(), 20);

        a.set_artwork(None);
        assert!(a.artwork().is_none());
    }

    #[test]
    fn sprite_rect_tracks_position() {
        let mut a = animator(1000, 800, 250);
        a.x = 40;
        a.y = 60;
        let rect = a.sprite_rect();
        assert_eq!(rect.min, pos2(40.0, 60.0));
        assert_eq!(rect.size(), vec2(250.0, 250.0));
    }
}
