use crate::model::{
    Blob, Meteor, Sky, Star, Surface, BLOB_COUNT, BLOB_DRIFT, DT_CAP_MS, LAYERS, METEOR_LIFE_MS,
    METEOR_SPAWN_DELAY_MS,
};
use rand::{rngs::StdRng, Rng};
use std::f32::consts::{PI, TAU};

impl Sky {
    /// Recompute the subpixel surface from the cell size. Idempotent for an
    /// unchanged size; callers rebuild stars and nebula after any change so
    /// densities stay correct.
    pub(crate) fn resize(&mut self, cols: u16, rows: u16) {
        self.surface = Surface::new(cols, rows);
    }

    /// Regenerate all three parallax layers with area-proportional counts.
    pub(crate) fn build_stars(&mut self, rng: &mut StdRng) {
        let area = self.surface.area();
        let (w, h) = (self.surface.w, self.surface.h);

        self.stars.clear();
        for (li, layer) in LAYERS.iter().enumerate() {
            let count = (area / layer.density).floor() as usize;
            self.stars.reserve(count);
            for _ in 0..count {
                self.stars.push(Star {
                    x: rng.gen_range(0.0..w),
                    y: rng.gen_range(0.0..h),
                    r: rng.gen_range(layer.size[0]..layer.size[1]),
                    alpha: rng.gen_range(layer.alpha[0]..layer.alpha[1]),
                    twinkle_rate: rng.gen_range(0.001..0.003) * (li as f32 + 1.0),
                    twinkle_phase: rng.gen_range(0.0..TAU),
                    speed: layer.speed,
                    layer: li,
                });
            }
        }
    }

    /// Regenerate the nebula. Blobs may start up to 20% outside the surface
    /// so the wrap-around drift never shows a seam.
    pub(crate) fn build_nebula(&mut self, rng: &mut StdRng) {
        let (w, h) = (self.surface.w, self.surface.h);
        let base = w.min(h);

        self.blobs.clear();
        if base <= 0.0 {
            // degenerate surface: degrade to an empty draw
            return;
        }
        for _ in 0..BLOB_COUNT {
            self.blobs.push(Blob {
                x: rng.gen_range(-0.2 * w..1.2 * w),
                y: rng.gen_range(-0.2 * h..1.2 * h),
                r: rng.gen_range(base * 0.25..base * 0.55),
                hue: rng.gen_range(195.0..215.0),
                sat: rng.gen_range(45.0..70.0),
                alpha: rng.gen_range(0.04..0.12),
                dx: rng.gen_range(-0.05..0.05),
                dy: rng.gen_range(-0.02..0.02),
                pulse: rng.gen_range(0.000_025..0.000_075),
                phase: rng.gen_range(0.0..TAU),
            });
        }
    }

    /// One meteor: enters from the left or right offscreen margin, aimed
    /// inward and downward, then re-arms the spawn deadline.
    pub(crate) fn spawn_meteor(&mut self, rng: &mut StdRng) {
        let (w, h) = (self.surface.w, self.surface.h);
        let base = w.min(h);
        if base <= 0.0 {
            return;
        }

        let from_left = rng.gen_bool(0.5);
        let x = if from_left {
            rng.gen_range(-0.15 * w..0.2 * w)
        } else {
            rng.gen_range(0.8 * w..1.15 * w)
        };
        let y = rng.gen_range(0.05 * h..0.55 * h);

        let speed = base * rng.gen_range(0.0008..0.0014);
        let ang = if from_left {
            rng.gen_range(PI * 0.05..PI * 0.25)
        } else {
            rng.gen_range(PI * 0.75..PI * 0.95)
        };

        self.meteors.push(Meteor {
            x,
            y,
            vx: ang.cos() * speed,
            vy: ang.sin() * speed,
            born_ms: self.now_ms,
            life_ms: rng.gen_range(METEOR_LIFE_MS.0..METEOR_LIFE_MS.1),
            len: base * rng.gen_range(0.25..0.45),
            width: rng.gen_range(1.2..2.2),
        });

        self.spawner.arm(
            self.now_ms,
            rng.gen_range(METEOR_SPAWN_DELAY_MS.0..METEOR_SPAWN_DELAY_MS.1),
        );
    }

    /// Arm the spawn deadline if it is idle.
    pub(crate) fn start_meteors(&mut self, rng: &mut StdRng) {
        if !self.spawner.armed() {
            self.spawner.arm(
                self.now_ms,
                rng.gen_range(METEOR_SPAWN_DELAY_MS.0..METEOR_SPAWN_DELAY_MS.1),
            );
        }
    }

    pub(crate) fn stop_meteors(&mut self) {
        self.spawner.cancel();
    }

    /// Advance the whole scene to `now_ms`. Pure state transition; drawing
    /// happens elsewhere so this runs in tests without a terminal.
    pub(crate) fn advance(&mut self, now_ms: f32, rng: &mut StdRng) {
        let dt = match self.last_ms {
            Some(prev) => (now_ms - prev).clamp(0.0, DT_CAP_MS),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        self.now_ms = now_ms;

        let (w, h) = (self.surface.w, self.surface.h);

        // Nebula: pulse, drift, wrap on all four edges.
        for b in &mut self.blobs {
            b.phase += b.pulse * dt;
            b.x += b.dx * BLOB_DRIFT * dt;
            b.y += b.dy * BLOB_DRIFT * dt;

            if b.x < -b.r {
                b.x = w + b.r;
            } else if b.x > w + b.r {
                b.x = -b.r;
            }
            if b.y < -b.r {
                b.y = h + b.r;
            } else if b.y > h + b.r {
                b.y = -b.r;
            }
        }

        // Stars: parallax drift left, wrap past -4 to the right edge with a
        // fresh vertical position.
        for s in &mut self.stars {
            s.x -= s.speed * dt * 0.06;
            if s.x < -4.0 {
                s.x = w + 4.0;
                s.y = rng.gen_range(0.0..h);
            }
            s.twinkle_phase += s.twinkle_rate * dt;
        }

        // Meteors: advance, then drop the expired ones.
        for m in &mut self.meteors {
            m.x += m.vx * dt;
            m.y += m.vy * dt;
        }
        let now = self.now_ms;
        self.meteors.retain(|m| m.life_ratio(now) > 0.0);

        if self.spawner.due(now_ms) {
            self.spawn_meteor(rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn built_sky(cols: u16, rows: u16) -> (Sky, StdRng) {
        let mut r = rng();
        let mut sky = Sky::new(cols, rows);
        sky.build_stars(&mut r);
        sky.build_nebula(&mut r);
        (sky, r)
    }

    fn layer_counts(sky: &Sky) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for s in &sky.stars {
            counts[s.layer] += 1;
        }
        counts
    }

    #[test]
    fn star_counts_are_area_proportional_and_in_bounds() {
        // 60x20 cells -> 120x80 subpixels -> area 9600.
        let (sky, _) = built_sky(60, 20);
        assert_eq!(layer_counts(&sky), [24, 15, 10]);
        for s in &sky.stars {
            assert!(s.x >= 0.0 && s.x < sky.surface.w);
            assert!(s.y >= 0.0 && s.y < sky.surface.h);
        }
    }

    #[test]
    fn tiny_surface_degrades_to_zero_stars() {
        let (sky, _) = built_sky(1, 1);
        assert!(sky.stars.is_empty());
        assert_eq!(sky.blobs.len(), BLOB_COUNT);
    }

    #[test]
    fn quadrupled_area_quadruples_every_layer() {
        let (small, _) = built_sky(60, 20);
        let (big, _) = built_sky(120, 40);
        let a = layer_counts(&small);
        let b = layer_counts(&big);
        for i in 0..3 {
            assert_eq!(b[i], a[i] * 4);
        }
    }

    #[test]
    fn resize_is_idempotent_for_same_size() {
        let mut sky = Sky::new(80, 24);
        sky.resize(100, 30);
        let first = sky.surface;
        sky.resize(100, 30);
        assert_eq!(sky.surface, first);
    }

    #[test]
    fn star_wraps_from_left_edge_to_right() {
        let (mut sky, mut r) = built_sky(60, 20);
        sky.advance(0.0, &mut r);

        sky.stars[0].x = -5.0;
        sky.advance(0.0, &mut r); // dt 0: no drift, wrap still applies
        let s = sky.stars[0];
        assert_eq!(s.x, sky.surface.w + 4.0);
        assert!(s.y >= 0.0 && s.y < sky.surface.h);
    }

    #[test]
    fn elapsed_time_is_clamped_per_frame() {
        let (mut sky, mut r) = built_sky(60, 20);
        sky.advance(0.0, &mut r);

        sky.stars.clear();
        sky.stars.push(Star {
            x: 100.0,
            y: 10.0,
            r: 1.0,
            alpha: 0.5,
            twinkle_rate: 0.002,
            twinkle_phase: 0.0,
            speed: 0.12,
            layer: 2,
        });

        // A ten-second gap still advances by at most the 33ms cap.
        sky.advance(10_000.0, &mut r);
        let expected = 100.0 - 0.12 * DT_CAP_MS * 0.06;
        assert!((sky.stars[0].x - expected).abs() < 1e-4);
    }

    #[test]
    fn meteor_life_ratio_decreases_and_expiry_removes_it() {
        let (mut sky, mut r) = built_sky(60, 20);
        sky.advance(0.0, &mut r);

        sky.meteors.push(Meteor {
            x: 10.0,
            y: 10.0,
            vx: 0.05,
            vy: 0.02,
            born_ms: 0.0,
            life_ms: 600.0,
            len: 30.0,
            width: 1.5,
        });

        sky.advance(200.0, &mut r);
        let r1 = sky.meteors[0].life_ratio(sky.now_ms);
        sky.advance(400.0, &mut r);
        let r2 = sky.meteors[0].life_ratio(sky.now_ms);
        assert!(r1 > r2 && r2 > 0.0);

        // Exactly at expiry the ratio floors to 0 and the meteor is gone.
        sky.advance(600.0, &mut r);
        assert!(sky.meteors.is_empty());
    }

    #[test]
    fn spawner_fires_once_and_rearms() {
        let (mut sky, mut r) = built_sky(60, 20);
        sky.advance(0.0, &mut r);
        sky.start_meteors(&mut r);
        assert!(sky.spawner.armed());

        // Far past any possible deadline: exactly one spawn per tick.
        sky.advance(METEOR_SPAWN_DELAY_MS.1 + 100.0, &mut r);
        assert_eq!(sky.meteors.len(), 1);
        let next = sky.spawner.deadline().unwrap();
        assert!(next >= sky.now_ms + METEOR_SPAWN_DELAY_MS.0);

        sky.advance(sky.now_ms + 1.0, &mut r);
        assert_eq!(sky.meteors.len(), 1);
    }

    #[test]
    fn cancelled_spawner_never_fires() {
        let (mut sky, mut r) = built_sky(60, 20);
        sky.start_meteors(&mut r);
        sky.stop_meteors();
        sky.advance(100_000.0, &mut r);
        assert!(sky.meteors.is_empty());
        assert!(!sky.spawner.armed());
    }

    #[test]
    fn nebula_blobs_stay_in_the_blue_band() {
        let (sky, _) = built_sky(60, 20);
        let base = sky.surface.w.min(sky.surface.h);
        for b in &sky.blobs {
            assert!(b.hue >= 195.0 && b.hue < 215.0);
            assert!(b.r >= base * 0.25 && b.r < base * 0.55);
        }
    }

    #[test]
    fn blob_wraps_on_every_edge() {
        let (mut sky, mut r) = built_sky(60, 20);
        sky.advance(0.0, &mut r);

        let radius = sky.blobs[0].r;
        sky.blobs[0].x = -(radius + 1.0);
        sky.blobs[0].y = sky.surface.h + radius + 1.0;
        sky.advance(0.0, &mut r);
        assert_eq!(sky.blobs[0].x, sky.surface.w + radius);
        assert_eq!(sky.blobs[0].y, -radius);
    }
}
