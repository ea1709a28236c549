//! In-memory rendition of the on-chain battleship program

use std::collections::HashMap;

use broadside::ledger::{decode_uint, encode_uint, Address, StateMap, StateValue, Transaction, TransactionKind};
use sha2::{Digest, Sha512_256};

const WAITING: u64 = 0;
const PLACEMENT: u64 = 1;
const GUESS: u64 = 2;
const REVEAL: u64 = 3;
const POST_REVEAL: u64 = 4;
const FINISHED: u64 = 5;

/// One deployed game application
#[derive(Debug, Clone)]
pub struct App {
    pub creator: Address,
    pub global: StateMap,
    pub local: HashMap<Address, StateMap>,
}

type Outcome = Result<(), String>;

fn uint(map: &StateMap, key: &[u8]) -> Option<u64> {
    match map.get(key) {
        Some(StateValue::Uint(v)) => Some(*v),
        _ => None,
    }
}

fn bytes<'a>(map: &'a StateMap, key: &[u8]) -> Option<&'a [u8]> {
    match map.get(key) {
        Some(StateValue::Bytes(v)) => Some(v.as_slice()),
        _ => None,
    }
}

fn put_uint(map: &mut StateMap, key: &[u8], value: u64) {
    map.insert(key.to_vec(), StateValue::Uint(value));
}

fn put_bytes(map: &mut StateMap, key: &[u8], value: Vec<u8>) {
    map.insert(key.to_vec(), StateValue::Bytes(value));
}

fn commit(secret: &[u8], value: u8) -> Vec<u8> {
    let mut hasher = Sha512_256::new();
    hasher.update(secret);
    hasher.update([value]);
    hasher.finalize().to_vec()
}

fn is_revealed(value: Option<&StateValue>) -> bool {
    matches!(value, Some(StateValue::Bytes(v)) if *v == encode_uint(0) || *v == encode_uint(1))
}

impl App {
    /// Apply a creation transaction, returning the new application
    pub fn create(txn: &Transaction, grid_size: u64) -> Result<Self, String> {
        let args = txn.args();
        if args.len() != 2 {
            return Err("create expects opponent and ship count".to_string());
        }
        let opponent = Address::from_slice(&args[0]).ok_or("bad opponent address")?;
        let ships = decode_uint(&args[1]).ok_or("bad ship count")?;
        if ships == 0 || ships > grid_size * grid_size {
            return Err(format!("ship count {ships} out of range"));
        }

        let mut global = StateMap::new();
        put_bytes(&mut global, b"p1", txn.sender.as_bytes().to_vec());
        put_bytes(&mut global, b"p2", opponent.as_bytes().to_vec());
        put_uint(&mut global, b"stage", WAITING);
        put_uint(&mut global, b"grid size", grid_size);
        put_uint(&mut global, b"num ships", ships);

        let mut app = Self {
            creator: txn.sender,
            global,
            local: HashMap::new(),
        };
        app.register(txn.sender);
        Ok(app)
    }

    fn register(&mut self, account: Address) {
        let mut local = StateMap::new();
        put_uint(&mut local, b"placing", 1);
        put_uint(&mut local, b"curIndex", 0);
        self.local.insert(account, local);
    }

    fn cells(&self) -> u64 {
        let size = uint(&self.global, b"grid size").unwrap_or(0);
        size * size
    }

    fn stage(&self) -> u64 {
        uint(&self.global, b"stage").unwrap_or(WAITING)
    }

    fn seat_address(&self, seat: &[u8]) -> Option<Address> {
        bytes(&self.global, seat).and_then(Address::from_slice)
    }

    fn turn(&self) -> Vec<u8> {
        bytes(&self.global, b"turn").unwrap_or(b"p1".as_slice()).to_vec()
    }

    /// Apply a call to an existing application
    pub fn call(&mut self, txn: &Transaction) -> Outcome {
        match &txn.kind {
            TransactionKind::OptIn => self.opt_in(txn.sender),
            TransactionKind::CloseOut => {
                self.local.remove(&txn.sender);
                Ok(())
            }
            TransactionKind::NoOp { args } => match self.stage() {
                WAITING | PLACEMENT => self.place(txn.sender, args),
                GUESS => self.guess(txn.sender, args),
                REVEAL => self.reveal(txn.sender, args),
                POST_REVEAL => self.post_reveal(txn.sender, args),
                stage => Err(format!("no calls accepted in stage {stage}")),
            },
            TransactionKind::Create { .. } | TransactionKind::Delete => Err("unexpected call".to_string()),
        }
    }

    fn opt_in(&mut self, sender: Address) -> Outcome {
        if self.stage() != WAITING {
            return Err("game already has two players".to_string());
        }
        if self.seat_address(b"p2") != Some(sender) {
            return Err("only the invited opponent may join".to_string());
        }
        put_uint(&mut self.global, b"stage", PLACEMENT);
        self.register(sender);
        Ok(())
    }

    fn place(&mut self, sender: Address, args: &[Vec<u8>]) -> Outcome {
        let cells = self.cells();
        let ships = uint(&self.global, b"num ships").unwrap_or(0);
        let local = self.local.get_mut(&sender).ok_or("not opted in")?;
        if uint(local, b"placing") != Some(1) {
            return Err("placement already complete".to_string());
        }
        let commitment = args.first().filter(|c| c.len() == 32).ok_or("bad commitment")?;

        let index = uint(local, b"curIndex").unwrap_or(0);
        put_bytes(local, &encode_uint(index), commitment.clone());
        put_uint(local, b"curIndex", index + 1);

        if index + 1 == cells {
            local.remove(b"placing".as_slice());
            local.remove(b"curIndex".as_slice());
            put_uint(local, b"ships", ships);

            if uint(&self.global, b"num placed").unwrap_or(0) == 0 {
                put_uint(&mut self.global, b"num placed", 1);
            } else {
                self.global.remove(b"num placed".as_slice());
                put_uint(&mut self.global, b"stage", GUESS);
                put_bytes(&mut self.global, b"turn", b"p1".to_vec());
            }
        }
        Ok(())
    }

    fn guess(&mut self, sender: Address, args: &[Vec<u8>]) -> Outcome {
        if self.seat_address(&self.turn()) != Some(sender) {
            return Err("not your turn".to_string());
        }
        let raw = args.first().ok_or("missing guess")?;
        let index = decode_uint(raw).ok_or("bad guess")?;
        if index >= self.cells() {
            return Err(format!("guess {index} off the board"));
        }
        put_bytes(&mut self.global, b"guess", raw.clone());
        put_uint(&mut self.global, b"stage", REVEAL);
        Ok(())
    }

    fn reveal(&mut self, sender: Address, args: &[Vec<u8>]) -> Outcome {
        let turn = self.turn();
        let revealer: &[u8] = if turn == b"p1" { b"p2" } else { b"p1" };
        if self.seat_address(revealer) != Some(sender) {
            return Err("only the guessed player may reveal".to_string());
        }
        let secret = args.first().ok_or("missing secret")?;
        let key = bytes(&self.global, b"guess").ok_or("no guess")?.to_vec();
        let local = self.local.get_mut(&sender).ok_or("not opted in")?;
        let cell = bytes(local, &key).ok_or("cell not placed")?.to_vec();

        if cell == commit(secret, 0) {
            put_bytes(local, &key, encode_uint(0));
            put_uint(&mut self.global, b"stage", GUESS);
            put_bytes(&mut self.global, b"turn", revealer.to_vec());
        } else if cell == commit(secret, 1) {
            put_bytes(local, &key, encode_uint(1));
            let remaining = uint(local, b"ships").unwrap_or(0).saturating_sub(1);
            put_uint(local, b"ships", remaining);
            if remaining == 0 {
                put_uint(&mut self.global, b"stage", POST_REVEAL);
                put_bytes(&mut self.global, b"winner", turn);
            } else {
                put_uint(&mut self.global, b"stage", GUESS);
            }
        } else {
            return Err("secret does not match commitment".to_string());
        }
        Ok(())
    }

    fn post_reveal(&mut self, sender: Address, args: &[Vec<u8>]) -> Outcome {
        let cells = self.cells();
        let ships = uint(&self.global, b"num ships").unwrap_or(0);
        let (secret, raw_index) = match args {
            [secret, index] => (secret, index),
            _ => return Err("expected secret and index".to_string()),
        };
        let index = decode_uint(raw_index).ok_or("bad index")?;
        let local = self.local.get_mut(&sender).ok_or("not opted in")?;
        if local.contains_key(b"placement".as_slice()) {
            return Err("reveal already finished".to_string());
        }

        if index == cells {
            if !(0..cells).all(|i| is_revealed(local.get(&encode_uint(i)))) {
                return Err("cells left to reveal".to_string());
            }
            let placed_ships = (0..cells)
                .filter(|i| matches!(local.get(&encode_uint(*i)), Some(StateValue::Bytes(v)) if *v == encode_uint(1)))
                .count() as u64;
            put_uint(local, b"placement", if placed_ships == ships { 2 } else { 1 });

            if uint(&self.global, b"num revealed").unwrap_or(0) == 0 {
                put_uint(&mut self.global, b"num revealed", 1);
            } else {
                put_uint(&mut self.global, b"stage", FINISHED);
            }
            return Ok(());
        }

        if index > cells {
            return Err(format!("index {index} off the board"));
        }
        let key = encode_uint(index);
        let cell = bytes(local, &key).ok_or("cell not placed")?.to_vec();
        if cell == commit(secret, 0) {
            put_bytes(local, &key, encode_uint(0));
        } else if cell == commit(secret, 1) {
            put_bytes(local, &key, encode_uint(1));
        } else {
            return Err("secret does not match commitment".to_string());
        }
        Ok(())
    }
}
