//! Player-facing façade over one game at a time

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use super::events::{EventBus, GameEvent};
use super::poller::{Poller, RevealContext, SessionView};
use super::stage_machine::StageMachine;
use super::submit::Submitter;
use crate::commitment::CommitRevealManager;
use crate::config::BroadsideConfig;
use crate::error::{GameError, GameResult};
use crate::ledger::{Address, LedgerClient, ProgramBundle, SessionId, Transaction};
use crate::state::{GlobalState, Grid, LocalState, Stage};

/// Committed placement groups and how many of them the ledger confirmed
#[derive(Default)]
struct Placement {
    layout: Option<HashSet<u64>>,
    groups: Vec<Vec<Transaction>>,
    confirmed: usize,
}

/// State that exists only while a game is in progress
struct ActiveGame {
    id: SessionId,
    opponent: Address,
    view: watch::Receiver<SessionView>,
    secrets: Arc<RwLock<CommitRevealManager>>,
    placement: Mutex<Placement>,
    cancel: CancellationToken,
    poller: JoinHandle<()>,
}

impl ActiveGame {
    fn global(&self) -> GlobalState {
        self.view.borrow().global.clone()
    }
}

impl Drop for ActiveGame {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// One local player's side of a game
///
/// Actions only submit transactions; the cached game state is written solely
/// by the background poller started by [`GameSession::start`] or
/// [`GameSession::join`].
pub struct GameSession<L: LedgerClient> {
    ledger: Arc<L>,
    player: Address,
    config: BroadsideConfig,
    programs: ProgramBundle,
    submitter: Submitter<L>,
    events: EventBus,
    active: Option<ActiveGame>,
}

impl<L: LedgerClient> GameSession<L> {
    pub fn new(ledger: Arc<L>, player: Address, config: BroadsideConfig, programs: ProgramBundle) -> GameResult<Self> {
        config.validate()?;
        let submitter = Submitter::new(Arc::clone(&ledger), player, config.ledger.confirmation_rounds);

        Ok(Self {
            ledger,
            player,
            config,
            programs,
            submitter,
            events: EventBus::new(),
            active: None,
        })
    }

    /// Build a session, loading the on-chain programs from the configured paths
    pub fn from_config(ledger: Arc<L>, player: Address, config: BroadsideConfig) -> GameResult<Self> {
        let programs = ProgramBundle::load(&config.game)?;
        Self::new(ledger, player, config, programs)
    }

    pub fn is_valid_address(address: &str) -> bool {
        Address::is_valid(address)
    }

    /// Create a game against `opponent` and start polling it
    pub async fn start(&mut self, opponent: Address, total_ships: u32) -> GameResult<SessionId> {
        self.ensure_idle()?;

        if opponent == self.player {
            return Err(GameError::InvalidAddress(format!("cannot play against yourself ({opponent})")));
        }

        if total_ships == 0 || total_ships > self.config.game.max_ships {
            return Err(GameError::WrongShipCount {
                expected: self.config.game.max_ships,
                actual: total_ships as usize,
            });
        }

        let txn = Transaction::create_game(
            self.player,
            &self.programs,
            self.config.game.schema,
            opponent,
            total_ships,
        );
        let confirmation = self.submitter.send(vec![txn]).await?;

        let id = confirmation
            .application_id
            .ok_or_else(|| GameError::InvalidSessionId("ledger returned no application id".to_string()))
            .and_then(SessionId::new)?;

        let global = self.read_global(id).await?;
        info!(session = %id, %opponent, total_ships, "Game created");

        self.activate(id, opponent, global);
        Ok(id)
    }

    /// Opt into an existing game and start polling it; returns the opponent
    pub async fn join(&mut self, id: SessionId) -> GameResult<Address> {
        self.ensure_idle()?;

        self.submitter.send(vec![Transaction::opt_in(self.player, id)]).await?;

        let global = self.read_global(id).await?;
        let opponent = global.player1.ok_or(GameError::OpponentUnresolved)?;
        info!(session = %id, %opponent, "Joined game");

        self.activate(id, opponent, global);
        Ok(opponent)
    }

    /// Commit every board cell, with ships on `ships`
    ///
    /// Placement transactions go out in atomic groups, each confirmed before
    /// the next is sent. After a failed group, calling again with the same
    /// `ships` resumes from that group; a different layout is refused with
    /// [`GameError::PlacementConflict`].
    pub async fn place_all_cells(&self, ships: &HashSet<u64>) -> GameResult<()> {
        let active = self.active()?;
        let global = active.global();

        if global.stage > Stage::Placement {
            return Err(GameError::InvalidStage {
                action: "place cells",
                stage: global.stage,
            });
        }

        if ships.len() != global.total_ships as usize {
            return Err(GameError::WrongShipCount {
                expected: global.total_ships,
                actual: ships.len(),
            });
        }

        let cells = global.cell_count();
        if let Some(&index) = ships.iter().find(|&&index| index >= cells) {
            return Err(GameError::CellOutOfRange { index, cells });
        }

        let mut placement = active.placement.lock().await;
        match placement.layout.as_ref().map(|layout| layout == ships) {
            Some(false) => return Err(GameError::PlacementConflict),
            Some(true) => {}
            None => {
                let mut txns = Vec::new();
                {
                    let mut secrets = active.secrets.write().await;
                    for index in 0..cells {
                        let commitment = secrets.place_ship(ships.contains(&index))?;
                        txns.push(Transaction::place_cell(self.player, active.id, commitment.as_bytes()));
                    }
                }
                placement.groups = txns
                    .chunks(self.config.game.group_size)
                    .map(<[Transaction]>::to_vec)
                    .collect();
                placement.layout = Some(ships.clone());
            }
        }

        let groups = placement.groups.len();
        if placement.confirmed > 0 && placement.confirmed < groups {
            info!(session = %active.id, from = placement.confirmed + 1, groups, "Resuming placement");
        }
        while placement.confirmed < groups {
            let group = placement.groups[placement.confirmed].clone();
            self.submitter.send(group).await?;
            placement.confirmed += 1;
            info!(session = %active.id, group = placement.confirmed, groups, "Placement group confirmed");
        }

        Ok(())
    }

    /// Guess the opponent's cell at `(x, y)`; returns the cell index
    pub async fn guess_cell(&self, x: u32, y: u32) -> GameResult<u64> {
        let active = self.active()?;
        let global = active.global();

        if global.stage != Stage::Guess {
            return Err(GameError::InvalidStage {
                action: "guess",
                stage: global.stage,
            });
        }

        let index = global.grid.coords_to_index(x, y).ok_or(GameError::CellOutOfRange {
            index: u64::from(x) + u64::from(y) * u64::from(global.grid.size()),
            cells: global.cell_count(),
        })?;

        self.submitter
            .send(vec![Transaction::guess(self.player, active.id, index)])
            .await?;
        info!(session = %active.id, index, "Guess submitted");

        Ok(index)
    }

    /// Leave the current game, deleting it when the local player created it
    ///
    /// Local state (secrets, cached state, subscriptions) is cleared before any
    /// transaction is sent, so it is gone even if the ledger calls fail.
    pub async fn reset(&mut self) -> GameResult<()> {
        let active = self.active.take();
        self.events.clear();
        self.events = EventBus::new();

        let Some(active) = active else {
            return Ok(());
        };

        let id = active.id;
        let is_creator = active.view.borrow().global.player1 == Some(self.player);
        drop(active);
        info!(session = %id, is_creator, "Leaving game");

        self.submitter.send(vec![Transaction::close_out(self.player, id)]).await?;

        if is_creator {
            self.submitter.send(vec![Transaction::delete(self.player, id)]).await?;
        }

        Ok(())
    }

    /// Receive every event raised from now on, in order
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn player(&self) -> Address {
        self.player
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.active.as_ref().map(|active| active.id)
    }

    pub fn opponent(&self) -> Option<Address> {
        self.active.as_ref().map(|active| active.opponent)
    }

    /// Latest global state seen by the poller
    pub fn global_state(&self) -> Option<GlobalState> {
        self.active.as_ref().map(ActiveGame::global)
    }

    pub fn local_state(&self) -> Option<LocalState> {
        self.active.as_ref().and_then(|active| active.view.borrow().local.clone())
    }

    pub fn opponent_state(&self) -> Option<LocalState> {
        self.active.as_ref().and_then(|active| active.view.borrow().opponent.clone())
    }

    pub fn grid(&self) -> Option<Grid> {
        self.global_state().map(|global| global.grid)
    }

    /// True local layout; empty when no game is active
    pub async fn my_cells(&self) -> Vec<bool> {
        match &self.active {
            Some(active) => active.secrets.read().await.layout(),
            None => Vec::new(),
        }
    }

    pub fn coords_to_index(&self, x: u32, y: u32) -> Option<u64> {
        self.grid()?.coords_to_index(x, y)
    }

    pub fn index_to_coords(&self, index: u64) -> Option<(u32, u32)> {
        self.grid()?.index_to_coords(index)
    }

    /// Whether the background poller is still running
    pub fn is_polling(&self) -> bool {
        self.active.as_ref().is_some_and(|active| !active.poller.is_finished())
    }

    fn active(&self) -> GameResult<&ActiveGame> {
        self.active.as_ref().ok_or(GameError::NoActiveSession)
    }

    fn ensure_idle(&self) -> GameResult<()> {
        match &self.active {
            Some(active) => Err(GameError::SessionActive(active.id)),
            None => Ok(()),
        }
    }

    async fn read_global(&self, id: SessionId) -> GameResult<GlobalState> {
        let state = self
            .ledger
            .read_global_state(id)
            .await
            .map_err(|e| GameError::from(e).context("read global state"))?;
        GlobalState::decode(&state)
    }

    fn activate(&mut self, id: SessionId, opponent: Address, global: GlobalState) {
        let cells = global.cell_count() as usize;
        let secrets = Arc::new(RwLock::new(CommitRevealManager::with_secret_length(
            cells,
            self.config.game.secret_length,
        )));

        let (view_tx, view_rx) = watch::channel(SessionView {
            global: global.clone(),
            local: None,
            opponent: None,
        });

        let poller = Poller::new(
            Arc::clone(&self.ledger),
            id,
            self.player,
            opponent,
            StageMachine::new(self.player, opponent, global),
            RevealContext::new(self.submitter.clone(), id, Arc::clone(&secrets)),
            self.events.clone(),
            view_tx,
            self.config.ledger.round_buffer,
        );

        let cancel = CancellationToken::new();
        let span = info_span!("poller", session = %id, player = %self.player);
        let handle = tokio::spawn(poller.run(cancel.clone()).instrument(span));

        self.active = Some(ActiveGame {
            id,
            opponent,
            view: view_rx,
            secrets,
            placement: Mutex::new(Placement::default()),
            cancel,
            poller: handle,
        });
    }
}
