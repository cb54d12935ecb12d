//! Shai-Hulud entry point
//!
//! Native builds run a headless autoplay session that exercises the whole
//! level graph and logs the flow. The browser build starts from `web::start`.

#[cfg(not(target_arch = "wasm32"))]
mod autoplay {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use shai_hulud::consts::TARGET_FPS;
    use shai_hulud::persistence::{FileStorage, Storage};
    use shai_hulud::platform::{Key, KeyTracker};
    use shai_hulud::sim::StateId;
    use shai_hulud::{Game, GameError, Settings, Tuning};

    /// Scripted player: holds keys for random spans, chosen per screen
    pub struct Autopilot {
        rng: Pcg32,
        held: Option<(Key, u32)>,
        frames_in_state: u32,
    }

    impl Autopilot {
        pub fn new(seed: u64) -> Self {
            Self {
                rng: Pcg32::seed_from_u64(seed),
                held: None,
                frames_in_state: 0,
            }
        }

        fn state_changed(&mut self, keys: &mut KeyTracker) {
            keys.release_all();
            self.held = None;
            self.frames_in_state = 0;
        }

        /// Feed this frame's key events into the tracker
        pub fn drive(&mut self, state: StateId, keys: &mut KeyTracker) {
            self.frames_in_state += 1;

            if let Some((key, frames)) = self.held.as_mut() {
                if *frames == 0 {
                    keys.key_up(*key);
                    self.held = None;
                } else {
                    *frames -= 1;
                }
                return;
            }

            let (key, hold) = match state {
                StateId::Title | StateId::GameOver => {
                    if self.frames_in_state < TARGET_FPS {
                        return;
                    }
                    (Key::Enter, 1)
                }
                // jump, then guess at the hook symbols
                StateId::Level1 => {
                    if self.rng.random_bool(0.85) {
                        return;
                    }
                    if self.rng.random_bool(0.3) {
                        (Key::Space, 2)
                    } else {
                        (self.arrow(), 1)
                    }
                }
                StateId::Level2 => (self.arrow(), self.rng.random_range(10..60)),
                StateId::Level3 => {
                    if self.rng.random_bool(0.9) {
                        return;
                    }
                    if self.rng.random_bool(0.6) {
                        (Key::Space, self.rng.random_range(15..90))
                    } else {
                        (self.arrow(), 1)
                    }
                }
            };
            keys.key_down(key);
            self.held = Some((key, hold));
        }

        fn arrow(&mut self) -> Key {
            Key::ARROWS[self.rng.random_range(0..Key::ARROWS.len())]
        }
    }

    pub struct Options {
        pub tuning_path: Option<String>,
        pub seconds: u32,
        pub seed: u64,
    }

    impl Options {
        pub fn from_args() -> Result<Self, String> {
            let mut opts = Self {
                tuning_path: None,
                seconds: 300,
                seed: rand::random(),
            };
            let mut args = std::env::args().skip(1);
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--seconds" => {
                        opts.seconds = args
                            .next()
                            .and_then(|v| v.parse().ok())
                            .ok_or("--seconds expects a whole number")?;
                    }
                    "--seed" => {
                        opts.seed = args
                            .next()
                            .and_then(|v| v.parse().ok())
                            .ok_or("--seed expects an unsigned integer")?;
                    }
                    "-h" | "--help" => {
                        return Err("usage: shai-hulud [--seconds N] [--seed N] [TUNING.json]".into());
                    }
                    _ => opts.tuning_path = Some(arg),
                }
            }
            Ok(opts)
        }

        pub fn load_tuning(&self) -> Result<Tuning, String> {
            let Some(path) = &self.tuning_path else {
                return Ok(Tuning::default());
            };
            let json = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
            let tuning = Tuning::from_json(&json).map_err(|e| format!("{path}: {e}"))?;
            log::info!("Loaded tuning from {path}");
            Ok(tuning)
        }
    }

    #[derive(Debug, Default)]
    pub struct Summary {
        pub frames: u64,
        pub runs: u32,
        pub best_score: u64,
        pub best_loop: u32,
    }

    pub fn run(opts: &Options, tuning: Tuning) -> Result<Summary, GameError> {
        let data_dir = std::env::var("SHAI_HULUD_DATA").unwrap_or_else(|_| ".shai-hulud".into());
        let storage = FileStorage::new(data_dir);
        let settings = Settings::load(&storage as &dyn Storage);

        let mut game = Game::new(opts.seed, tuning, settings, Box::new(storage))?;
        let mut keys = KeyTracker::new();
        let mut pilot = Autopilot::new(opts.seed ^ 0xA070);
        let mut summary = Summary::default();

        let dt = 1.0 / TARGET_FPS as f32;
        let total = u64::from(opts.seconds) * u64::from(TARGET_FPS);
        let mut state = game.state().ok_or(GameError::NoActiveState)?;

        for _ in 0..total {
            pilot.drive(state, &mut keys);
            let input = keys.snapshot();
            let out = game.frame(&input, dt)?;
            summary.frames += 1;

            let session = game.session();
            summary.best_score = summary.best_score.max(session.score);
            summary.best_loop = summary.best_loop.max(session.loop_count);

            let next = out.state.ok_or(GameError::NoActiveState)?;
            if next != state {
                log::info!(
                    "[{:>6}] {} -> {} | lives {} score {} loop {}",
                    summary.frames,
                    state,
                    next,
                    session.lives,
                    session.score,
                    session.loop_count
                );
                if next == StateId::Level1 && state == StateId::Title {
                    summary.runs += 1;
                }
                state = next;
                pilot.state_changed(&mut keys);
            }
            for cmd in &out.effects {
                log::debug!("effect {cmd:?}");
            }
        }
        Ok(summary)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Shai-Hulud (headless) starting...");

    let opts = match autoplay::Options::from_args() {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };
    let tuning = match opts.load_tuning() {
        Ok(t) => t,
        Err(msg) => {
            log::error!("Bad tuning file: {msg}");
            std::process::exit(2);
        }
    };

    log::info!("Autoplay for {} s with seed {}", opts.seconds, opts.seed);
    match autoplay::run(&opts, tuning) {
        Ok(summary) => {
            println!(
                "{} frames, {} runs, best score {}, furthest loop {}",
                summary.frames, summary.runs, summary.best_score, summary.best_loop
            );
        }
        Err(e) => {
            log::error!("Game stopped: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser entry point is `shai_hulud::web::start`
}
