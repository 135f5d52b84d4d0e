use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use crate::{
    error::{PlotError, Result},
    plot::Plot,
    pos::PlotAddress,
};

/// Length of the raw UUID keys under which the plot lists of players are stored.
const PLAYER_KEY_LEN: usize = 16;

/// Access to the plot database. Plots are stored under the 8 byte key of their address, and the
/// list of plots owned by a player under the 16 bytes of the player's UUID.
///
/// Plots read are kept in a cache. The cache holds one shared instance per plot, so plots returned
/// must not be changed in place: store a new plot instead.
pub struct PlotDb {
    db: sled::Db,
    cache: DashMap<PlotAddress, Arc<Plot>>,
    closed: AtomicBool,
}

impl PlotDb {
    /// Opens the directory passed as a plot database, creating it if it does not yet exist.
    pub fn open(dir: impl AsRef<Path>) -> Result<PlotDb> {
        let dir = dir.as_ref();
        let db = sled::open(dir).map_err(PlotError::store("open plot database"))?;
        tracing::info!(path = %dir.display(), plots = db.len(), "opened plot database");
        Ok(PlotDb {
            db,
            cache: DashMap::new(),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PlotError::Closed);
        }
        Ok(())
    }

    /// Reads the plot at the address passed. Fails with `NotFound` if nobody claimed it.
    pub fn plot(&self, pos: PlotAddress) -> Result<Arc<Plot>> {
        self.ensure_open()?;
        if let Some(plot) = self.cache.get(&pos) {
            return Ok(plot.value().clone());
        }
        // The entry stays locked while reading, so a concurrent write or removal of the same plot
        // cannot be overwritten by the value read here.
        let plot = self.cache.entry(pos).or_try_insert_with(|| self.read_plot(pos))?;
        Ok(plot.value().clone())
    }

    fn read_plot(&self, pos: PlotAddress) -> Result<Arc<Plot>> {
        let val = self.db.get(pos.encode()).map_err(PlotError::store("plot"))?.ok_or(PlotError::NotFound)?;
        let plot: Plot = serde_json::from_slice(&val).map_err(PlotError::encoding("plot"))?;
        Ok(Arc::new(plot))
    }

    /// Writes the plot at the address passed, replacing whatever was there.
    pub fn store_plot(&self, pos: PlotAddress, plot: Arc<Plot>) -> Result<()> {
        self.ensure_open()?;
        let val = serde_json::to_vec(plot.as_ref()).map_err(PlotError::encoding("store plot"))?;
        let entry = self.cache.entry(pos);
        self.db.insert(pos.encode(), val).map_err(PlotError::store("store plot"))?;
        self.db.flush().map_err(PlotError::store("store plot"))?;
        entry.insert(plot);
        Ok(())
    }

    /// Writes the plot only if no plot is stored at the address yet. Two players claiming the same
    /// plot at the same time cannot both succeed.
    pub fn claim_plot(&self, pos: PlotAddress, plot: Arc<Plot>) -> Result<()> {
        self.ensure_open()?;
        let val = serde_json::to_vec(plot.as_ref()).map_err(PlotError::encoding("claim plot"))?;
        let entry = self.cache.entry(pos);
        let swapped = self
            .db
            .compare_and_swap(pos.encode(), None::<&[u8]>, Some(val))
            .map_err(PlotError::store("claim plot"))?;
        if let Err(conflict) = swapped {
            let owner_name = match conflict.current {
                Some(current) => serde_json::from_slice::<Plot>(&current).map_err(PlotError::encoding("claim plot"))?.owner_name,
                None => String::new(),
            };
            return Err(PlotError::AlreadyClaimed(owner_name));
        }
        self.db.flush().map_err(PlotError::store("claim plot"))?;
        entry.insert(plot);
        Ok(())
    }

    /// Removes the plot at the address passed. Removing a free plot is not an error.
    pub fn remove_plot(&self, pos: PlotAddress) -> Result<()> {
        self.ensure_open()?;
        let entry = self.cache.entry(pos);
        self.db.remove(pos.encode()).map_err(PlotError::store("remove plot"))?;
        self.db.flush().map_err(PlotError::store("remove plot"))?;
        if let Entry::Occupied(cached) = entry {
            cached.remove();
        }
        Ok(())
    }

    /// Reads the addresses of the plots owned by a player. Fails with `NotFound` if the player
    /// never owned a plot.
    pub fn player_plots(&self, player: Uuid) -> Result<Vec<PlotAddress>> {
        self.ensure_open()?;
        let val = self.db.get(player.as_bytes()).map_err(PlotError::store("player plots"))?.ok_or(PlotError::NotFound)?;
        serde_json::from_slice(&val).map_err(PlotError::encoding("player plots"))
    }

    /// Overwrites the full list of plots owned by a player.
    pub fn store_player_plots(&self, player: Uuid, positions: &[PlotAddress]) -> Result<()> {
        self.ensure_open()?;
        let val = serde_json::to_vec(positions).map_err(PlotError::encoding("store player plots"))?;
        self.db.insert(player.as_bytes(), val).map_err(PlotError::store("store player plots"))?;
        self.db.flush().map_err(PlotError::store("store player plots"))?;
        Ok(())
    }

    /// Reads every claimed plot in the database, bypassing the cache.
    pub fn claimed_plots(&self) -> Result<Vec<(PlotAddress, Plot)>> {
        self.ensure_open()?;
        let mut plots = Vec::new();
        for entry in self.db.iter() {
            let (key, val) = entry.map_err(PlotError::store("claimed plots"))?;
            if key.len() == PLAYER_KEY_LEN {
                continue;
            }
            let pos = PlotAddress::decode(&key)?;
            let plot = serde_json::from_slice(&val).map_err(PlotError::encoding("claimed plots"))?;
            plots.push((pos, plot));
        }
        Ok(plots)
    }

    /// Flushes and closes the database. Closing twice is an error, and so is any use afterwards.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(PlotError::Closed);
        }
        self.db.flush().map_err(PlotError::store("close"))?;
        self.cache.clear();
        tracing::info!("closed plot database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::Colour;

    fn open() -> (tempfile::TempDir, PlotDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = PlotDb::open(dir.path().join("plots")).unwrap();
        (dir, db)
    }

    #[test]
    fn missing_plot_is_not_found() {
        let (_dir, db) = open();
        assert!(db.plot(PlotAddress::new(3, -4)).unwrap_err().is_not_found());
        assert!(db.player_plots(Uuid::new_v4()).unwrap_err().is_not_found());
    }

    #[test]
    fn cached_plot_is_shared() {
        let (_dir, db) = open();
        let pos = PlotAddress::new(-1, 2);
        let plot = Arc::new(Plot::new(Uuid::new_v4(), "Steve", Colour::Red));
        db.store_plot(pos, plot.clone()).unwrap();

        let read = db.plot(pos).unwrap();
        assert!(Arc::ptr_eq(&read, &plot));
    }

    #[test]
    fn plots_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots");
        let pos = PlotAddress::new(7, 7);
        let owner = Uuid::new_v4();
        {
            let db = PlotDb::open(&path).unwrap();
            db.store_plot(pos, Arc::new(Plot::new(owner, "Alex", Colour::Blue))).unwrap();
            db.store_player_plots(owner, &[pos]).unwrap();
            db.close().unwrap();
        }
        let db = PlotDb::open(&path).unwrap();
        assert_eq!(db.plot(pos).unwrap().owner, Some(owner));
        assert_eq!(db.player_plots(owner).unwrap(), vec![pos]);
    }

    #[test]
    fn claim_does_not_overwrite() {
        let (_dir, db) = open();
        let pos = PlotAddress::new(0, 0);
        let first = Arc::new(Plot::new(Uuid::new_v4(), "Steve", Colour::Red));
        db.claim_plot(pos, first.clone()).unwrap();

        let second = Arc::new(Plot::new(Uuid::new_v4(), "Alex", Colour::Blue));
        match db.claim_plot(pos, second) {
            Err(PlotError::AlreadyClaimed(name)) => assert_eq!(name, "Steve"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(db.plot(pos).unwrap(), first);
    }

    #[test]
    fn removing_clears_the_cache() {
        let (_dir, db) = open();
        let pos = PlotAddress::new(1, 1);
        db.store_plot(pos, Arc::new(Plot::new(Uuid::new_v4(), "Steve", Colour::Red))).unwrap();
        db.plot(pos).unwrap();
        db.remove_plot(pos).unwrap();
        assert!(db.plot(pos).unwrap_err().is_not_found());
    }

    #[test]
    fn player_lists_are_overwritten() {
        let (_dir, db) = open();
        let player = Uuid::new_v4();
        db.store_player_plots(player, &[PlotAddress::new(0, 0), PlotAddress::new(1, 0)]).unwrap();
        db.store_player_plots(player, &[PlotAddress::new(5, 5)]).unwrap();
        assert_eq!(db.player_plots(player).unwrap(), vec![PlotAddress::new(5, 5)]);
    }

    #[test]
    fn claimed_plots_skip_player_lists() {
        let (_dir, db) = open();
        let owner = Uuid::new_v4();
        db.store_plot(PlotAddress::new(2, -3), Arc::new(Plot::new(owner, "Steve", Colour::Red))).unwrap();
        db.store_player_plots(owner, &[PlotAddress::new(2, -3)]).unwrap();

        let plots = db.claimed_plots().unwrap();
        assert_eq!(plots.len(), 1);
        assert_eq!(plots[0].0, PlotAddress::new(2, -3));
    }

    #[test]
    fn closing_twice_fails() {
        let (_dir, db) = open();
        db.close().unwrap();
        assert!(matches!(db.close(), Err(PlotError::Closed)));
        assert!(matches!(db.plot(PlotAddress::new(0, 0)), Err(PlotError::Closed)));
    }

    #[test]
    fn concurrent_reads_do_not_bring_back_removed_plots() {
        let (_dir, db) = open();
        let pos = PlotAddress::new(4, -4);
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        let _ = db.plot(pos);
                    }
                });
            }
            let mut stale = 0;
            for _ in 0..300 {
                db.store_plot(pos, Arc::new(Plot::new(Uuid::new_v4(), "Steve", Colour::Red))).unwrap();
                db.remove_plot(pos).unwrap();
                if db.plot(pos).is_ok() {
                    stale += 1;
                }
            }
            done.store(true, Ordering::Release);
            assert_eq!(stale, 0);
        });
        assert!(db.plot(pos).unwrap_err().is_not_found());
    }

    #[test]
    fn concurrent_reads_do_not_revert_stored_plots() {
        let (_dir, db) = open();
        let pos = PlotAddress::new(0, 1);
        let owner = Uuid::new_v4();
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        let _ = db.plot(pos);
                    }
                });
            }
            let mut reverted = 0;
            for round in 0..300 {
                let mut plot = Plot::new(owner, "Steve", Colour::Red);
                plot.helpers = (0..round % 3).map(|_| Uuid::new_v4()).collect();
                let plot = Arc::new(plot);
                db.store_plot(pos, plot.clone()).unwrap();
                if db.plot(pos).ok() != Some(plot) {
                    reverted += 1;
                }
            }
            done.store(true, Ordering::Release);
            assert_eq!(reverted, 0);
        });
    }

    #[test]
    fn claiming_over_a_corrupt_plot_reports_the_decode_error() {
        let (_dir, db) = open();
        let pos = PlotAddress::new(3, 3);
        db.db.insert(pos.encode(), &b"not json"[..]).unwrap();

        let plot = Arc::new(Plot::new(Uuid::new_v4(), "Alex", Colour::Blue));
        match db.claim_plot(pos, plot) {
            Err(PlotError::Encoding { context, .. }) => assert_eq!(context, "claim plot"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(db.db.get(pos.encode()).unwrap().as_deref(), Some(&b"not json"[..]));
    }
}
