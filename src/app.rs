use crate::carousel::Deck;
use crate::input::{poll_actions, Action};
use crate::model::Sky;
use crate::render::{self, Terminal};
use crate::Cli;
use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use std::time::{Duration, Instant};

pub(crate) struct App {
    cli: Cli,
    term: Terminal,
    sky: Sky,
    deck: Deck,
    rng: StdRng,
    paused: bool,
    show_help: bool,
    show_deck: bool,
    started: Instant,
}

impl App {
    fn init(cli: Cli) -> Result<Self> {
        let seed = if cli.seed != 0 {
            cli.seed
        } else {
            rand::random::<u64>()
        };
        let mut rng = StdRng::seed_from_u64(seed);

        let term = Terminal::begin()?;

        let mut sky = Sky::new(term.cols, term.rows);
        sky.build_stars(&mut rng);
        sky.build_nebula(&mut rng);
        if !cli.no_meteors {
            sky.start_meteors(&mut rng);
        }

        let show_deck = cli.deck;
        Ok(Self {
            cli,
            term,
            sky,
            deck: Deck::builtin(),
            rng,
            paused: false,
            show_help: false,
            show_deck,
            started: Instant::now(),
        })
    }

    fn frame_loop(&mut self) -> Result<()> {
        let fps = self.cli.fps.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);

        loop {
            let frame_start = Instant::now();

            // surface-size change: rebuild both collections before drawing
            if self.term.resize_if_needed()? {
                self.rebuild();
            }

            let (actions, resized) = poll_actions(frame_dt)?;
            if resized && self.term.resize_if_needed()? {
                self.rebuild();
            }
            for a in actions {
                match a {
                    Action::Quit => return Ok(()),
                    Action::TogglePause => self.paused = !self.paused,
                    Action::ToggleHelp => self.show_help = !self.show_help,
                    Action::ToggleDeck => self.show_deck = !self.show_deck,
                    Action::DeckPrev => self.deck.prev(),
                    Action::DeckNext => self.deck.next(),
                    Action::ToggleMeteors => {
                        if self.sky.spawner.armed() {
                            self.sky.stop_meteors();
                        } else {
                            self.sky.start_meteors(&mut self.rng);
                        }
                    }
                    Action::Rebuild => self.rebuild(),
                }
            }

            if !self.paused {
                let now_ms = self.started.elapsed().as_secs_f32() * 1000.0;
                self.sky.advance(now_ms, &mut self.rng);
            }

            self.term.canvas.fill(render::Rgbf::BLACK);
            render::draw_sky(&mut self.term.canvas, &self.sky);
            render::canvas_to_cells(&self.term.canvas, &mut self.term.cur);
            render::ui_overlay(
                &mut self.term.cur,
                &self.sky,
                self.paused,
                self.sky.spawner.armed(),
            );
            if self.show_deck {
                self.deck.draw(&mut self.term.cur);
            }
            if self.show_help {
                render::help_overlay(&mut self.term.cur);
            }
            self.term.present()?;

            spin_sleep(frame_dt, frame_start);
        }
    }

    fn rebuild(&mut self) {
        self.sky.resize(self.term.cols, self.term.rows);
        self.sky.build_stars(&mut self.rng);
        self.sky.build_nebula(&mut self.rng);
    }
}

pub(crate) fn run(cli: Cli) -> Result<()> {
    let mut app = App::init(cli)?;
    let res = app.frame_loop();
    let end = app.term.end();
    res.and(end)
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
