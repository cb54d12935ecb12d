//! Screen state machine
//!
//! One registered screen per `StateId`, exactly one active. Screens ask for
//! a transition through `Ctx::switch_to`; the host applies it after the
//! frame's render so the in-flight update/render pair finishes in the old
//! screen.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::state::SessionState;
use crate::audio::AudioManager;
use crate::effects::Effects;
use crate::error::GameError;
use crate::persistence::Storage;
use crate::platform::InputSnapshot;
use crate::renderer::DrawList;
use crate::tuning::Tuning;

/// Every screen in the level graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StateId {
    Title,
    Level1,
    Level2,
    Level3,
    GameOver,
}

impl StateId {
    pub fn name(&self) -> &'static str {
        match self {
            StateId::Title => "title",
            StateId::Level1 => "level1",
            StateId::Level2 => "level2",
            StateId::Level3 => "level3",
            StateId::GameOver => "gameover",
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a screen may touch during one frame
pub struct Ctx<'a> {
    pub session: &'a mut SessionState,
    pub input: &'a InputSnapshot,
    pub tuning: &'a Tuning,
    pub audio: &'a mut AudioManager,
    pub effects: &'a mut Effects,
    pub storage: &'a mut dyn Storage,
    transition: Option<StateId>,
}

impl<'a> Ctx<'a> {
    pub fn new(
        session: &'a mut SessionState,
        input: &'a InputSnapshot,
        tuning: &'a Tuning,
        audio: &'a mut AudioManager,
        effects: &'a mut Effects,
        storage: &'a mut dyn Storage,
    ) -> Self {
        Self {
            session,
            input,
            tuning,
            audio,
            effects,
            storage,
            transition: None,
        }
    }

    /// Request a transition at the end of this frame (last request wins)
    pub fn switch_to(&mut self, id: StateId) {
        if let Some(prev) = self.transition.replace(id) {
            log::debug!("Transition to {prev} replaced by {id}");
        }
    }

    pub fn pending_transition(&self) -> Option<StateId> {
        self.transition
    }

    pub fn take_transition(&mut self) -> Option<StateId> {
        self.transition.take()
    }
}

/// A screen: update and render are required, enter/exit optional
pub trait GameScreen {
    /// Called when the screen becomes active. Rebuild all per-entry state here.
    fn enter(&mut self, _ctx: &mut Ctx<'_>) {}

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32);

    fn render(&self, session: &SessionState, draw: &mut DrawList);

    /// Called when the screen is left, including forced switches
    fn exit(&mut self, _ctx: &mut Ctx<'_>) {}

    /// Whether the shared lives/loop/score overlay is drawn on top
    fn shows_hud(&self) -> bool {
        false
    }
}

/// Registry of screens plus the active id
#[derive(Default)]
pub struct StateMachine {
    states: HashMap<StateId, Box<dyn GameScreen>>,
    active: Option<StateId>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for `id`
    pub fn register_state(&mut self, id: StateId, screen: Box<dyn GameScreen>) {
        if self.states.insert(id, screen).is_some() {
            log::warn!("Screen {id} registered twice; keeping the newer one");
        }
    }

    /// exit() outgoing, set active, enter() incoming
    pub fn switch_state(&mut self, id: StateId, ctx: &mut Ctx<'_>) -> Result<(), GameError> {
        if !self.states.contains_key(&id) {
            return Err(GameError::UnregisteredState(id));
        }

        if let Some(screen) = self.active.and_then(|prev| self.states.get_mut(&prev)) {
            screen.exit(ctx);
        }

        log::info!(
            "State {} -> {}",
            self.active.map(|s| s.name()).unwrap_or("none"),
            id
        );
        self.active = Some(id);

        if let Some(screen) = self.states.get_mut(&id) {
            screen.enter(ctx);
        }
        Ok(())
    }

    pub fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) -> Result<(), GameError> {
        let id = self.active.ok_or(GameError::NoActiveState)?;
        let screen = self
            .states
            .get_mut(&id)
            .ok_or(GameError::UnregisteredState(id))?;
        screen.update(ctx, dt);
        Ok(())
    }

    pub fn render(&self, session: &SessionState, draw: &mut DrawList) -> Result<(), GameError> {
        let screen = self.active_screen()?;
        screen.render(session, draw);
        Ok(())
    }

    /// Whether the active screen wants the HUD overlay
    pub fn shows_hud(&self) -> bool {
        self.active_screen().map(|s| s.shows_hud()).unwrap_or(false)
    }

    pub fn active(&self) -> Option<StateId> {
        self.active
    }

    fn active_screen(&self) -> Result<&dyn GameScreen, GameError> {
        let id = self.active.ok_or(GameError::NoActiveState)?;
        self.states
            .get(&id)
            .map(|s| s.as_ref())
            .ok_or(GameError::UnregisteredState(id))
    }
}
