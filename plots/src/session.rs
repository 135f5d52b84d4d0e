use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    db::PlotDb,
    error::Result,
    plot::{free_plot_info, Plot},
    pos::{BlockPos, Face, PlotAddress},
    settings::Settings,
    world::BlockWorld,
};

/// Outcome of an intercepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// A connected player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
}

/// State kept for a connected player. It knows which plots the player owns and decides whether
/// the player may change blocks.
pub struct Session {
    actor: Actor,
    settings: Arc<Settings>,
    db: Arc<PlotDb>,
    plots: Mutex<Vec<PlotAddress>>,
}

impl Session {
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn db(&self) -> &PlotDb {
        &self.db
    }

    /// Addresses of the plots the player owns, in the order they were claimed.
    pub fn plot_positions(&self) -> Vec<PlotAddress> {
        self.plots.lock().clone()
    }

    /// The plots the player owns. Plots that cannot be read are left out.
    pub fn plots(&self) -> Vec<Arc<Plot>> {
        self.plot_positions()
            .into_iter()
            .filter_map(|pos| match self.db.plot(pos) {
                Ok(plot) => Some(plot),
                Err(e) => {
                    tracing::warn!(player = %self.actor.name, ?pos, "could not read owned plot: {e}");
                    None
                }
            })
            .collect()
    }

    /// Changes the list of owned plots. The new list is stored before it replaces the list of the
    /// session, so a failed write leaves both untouched.
    pub fn update_plot_positions(&self, f: impl FnOnce(&mut Vec<PlotAddress>)) -> Result<()> {
        let mut plots = self.plots.lock();
        let mut positions = plots.clone();
        f(&mut positions);
        self.db.store_player_plots(self.actor.id, &positions)?;
        *plots = positions;
        Ok(())
    }

    /// Checks if the player may edit the block at `pos`: it must be inside a plot that the player
    /// owns or helps on.
    pub fn can_edit(&self, pos: BlockPos) -> bool {
        let plot_pos = PlotAddress::from_block_pos(pos, &self.settings);
        if !plot_pos.contains(pos, &self.settings) {
            return false;
        }
        match self.db.plot(plot_pos) {
            Ok(plot) => plot.can_edit(self.actor.id),
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!(player = %self.actor.name, ?plot_pos, "could not read plot: {e}");
                }
                false
            }
        }
    }

    fn deny(&self, world: &dyn BlockWorld, pos: BlockPos) -> Decision {
        tracing::debug!(player = %self.actor.name, ?pos, "denied block change");
        world.play_deny_effect(pos);
        Decision::Deny
    }

    pub fn handle_block_break(&self, world: &dyn BlockWorld, pos: BlockPos) -> Decision {
        if !self.can_edit(pos) {
            return self.deny(world, pos);
        }
        Decision::Allow
    }

    pub fn handle_block_place(&self, world: &dyn BlockWorld, pos: BlockPos) -> Decision {
        if !self.can_edit(pos) {
            return self.deny(world, pos);
        }
        Decision::Allow
    }

    /// Using an item on a block outside of the player's plots is denied. Blocks are let through
    /// here and denied when they are placed.
    pub fn handle_item_use_on_block(&self, world: &dyn BlockWorld, pos: BlockPos, face: Face, held_is_block: bool) -> Decision {
        if held_is_block {
            return Decision::Allow;
        }
        if !self.can_edit(pos) {
            return self.deny(world, pos);
        }
        let side = pos.side(face);
        if !self.can_edit(side) {
            return self.deny(world, side);
        }
        Decision::Allow
    }

    /// Returns info on the plot the player walks into, once per plot entered.
    pub fn handle_move(&self, new_pos: BlockPos, old_pos: BlockPos) -> Option<String> {
        let plot_pos = PlotAddress::from_block_pos(new_pos, &self.settings);
        let previous = PlotAddress::from_block_pos(old_pos, &self.settings);

        let entered = plot_pos.contains(new_pos, &self.settings) && (plot_pos != previous || !plot_pos.contains(old_pos, &self.settings));
        if !entered {
            return None;
        }
        match self.db.plot(plot_pos) {
            Ok(plot) => Some(plot.info()),
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!(player = %self.actor.name, ?plot_pos, "could not read plot: {e}");
                }
                Some(free_plot_info())
            }
        }
    }
}

/// Sessions of all connected players by UUID. The registry holds weak references only: the
/// connection of a player owns its session.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Weak<Session>>,
}

impl SessionRegistry {
    pub fn new() -> SessionRegistry {
        SessionRegistry::default()
    }

    /// Creates the session of a player who just connected, loading the plots the player owns. A
    /// session registered earlier for the same player is replaced.
    pub fn register(&self, actor: Actor, settings: Arc<Settings>, db: Arc<PlotDb>) -> Result<Arc<Session>> {
        let plots = match db.player_plots(actor.id) {
            Ok(plots) => plots,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };
        tracing::info!(player = %actor.name, id = %actor.id, plots = plots.len(), "registered session");
        let session = Arc::new(Session {
            actor,
            settings,
            db,
            plots: Mutex::new(plots),
        });
        self.sessions.insert(session.actor.id, Arc::downgrade(&session));
        Ok(session)
    }

    pub fn lookup(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.get(&id).and_then(|session| session.value().upgrade())
    }

    /// Removes the session of a player. Removing an unknown player does nothing.
    pub fn unregister(&self, id: Uuid) {
        self.sessions.remove(&id);
    }

    /// Removes the session passed, unless the player registered a newer session in the meantime.
    pub fn unregister_session(&self, session: &Arc<Session>) {
        let removed = self
            .sessions
            .remove_if(&session.actor.id, |_, registered| std::ptr::eq(registered.as_ptr(), Arc::as_ptr(session)));
        if removed.is_some() {
            tracing::info!(player = %session.actor.name, "unregistered session");
        }
    }

    /// All sessions whose connection is still alive.
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        self.sessions.iter().filter_map(|session| session.value().upgrade()).collect()
    }

    /// Finds a connected player by name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<Arc<Session>> {
        self.sessions().into_iter().find(|session| session.actor.name.eq_ignore_ascii_case(name))
    }
}
