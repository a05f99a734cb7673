//! Shared state of one in-memory store.

use super::config::ConfigReader;
use crate::status::{NativeResult, Status};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Ordered records of one data source.
pub(crate) type Records = BTreeMap<Vec<u8>, Vec<u8>>;

/// One data source (table, index, file).
#[derive(Debug)]
pub(crate) struct Table {
    pub(crate) id: u64,
    pub(crate) records: RwLock<Records>,
}

impl Table {
    fn footprint(&self) -> u64 {
        self.records
            .read()
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum()
    }
}

/// State shared between a session and the cursors opened from it.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) id: u64,
    connection_alive: Arc<AtomicBool>,
    alive: AtomicBool,
    in_txn: AtomicBool,
}

impl SessionState {
    pub(crate) fn new(id: u64, connection_alive: Arc<AtomicBool>) -> Self {
        Self {
            id,
            connection_alive,
            alive: AtomicBool::new(true),
            in_txn: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_usable(&self) -> bool {
        self.alive.load(Ordering::Acquire) && self.connection_alive.load(Ordering::Acquire)
    }

    pub(crate) fn ensure_usable(&self) -> NativeResult<()> {
        if self.is_usable() {
            Ok(())
        } else {
            Err(Status::INVALID)
        }
    }

    pub(crate) fn in_txn(&self) -> bool {
        self.in_txn.load(Ordering::Acquire)
    }

    pub(crate) fn set_in_txn(&self, value: bool) {
        self.in_txn.store(value, Ordering::Release);
    }

    pub(crate) fn kill(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
struct UndoEntry {
    table: Arc<Table>,
    key: Vec<u8>,
    previous: Option<Vec<u8>>,
}

/// Write-side bookkeeping, serialised by one mutex.
#[derive(Debug, Default)]
struct WriteState {
    /// Undo logs of running transactions, by session.
    undo: HashMap<u64, Vec<UndoEntry>>,
    /// Uncommitted keys, by (table, key), owned by a session.
    owners: HashMap<(u64, Vec<u8>), u64>,
    /// Bytes of keys and values currently held.
    cache_used: u64,
}

impl WriteState {
    fn check_owner(&self, table: u64, key: &[u8], session: u64) -> NativeResult<()> {
        match self.owners.get(&(table, key.to_vec())) {
            Some(owner) if *owner != session => Err(Status::ROLLBACK),
            _ => Ok(()),
        }
    }

    fn release_owned(&mut self, session: u64) {
        self.owners.retain(|_, owner| *owner != session);
    }
}

/// An in-memory store: the unit a connection opens.
#[derive(Debug)]
pub(crate) struct Store {
    pub(crate) home: String,
    pub(crate) in_memory: bool,
    pub(crate) open: AtomicBool,
    cache_limit: Option<u64>,
    tables: RwLock<BTreeMap<String, Arc<Table>>>,
    writes: Mutex<WriteState>,
    next_table_id: AtomicU64,
    next_session_id: AtomicU64,
}

impl Store {
    pub(crate) fn new(home: &str, config: &ConfigReader) -> Self {
        let in_memory = config.flag("in_memory", false);
        Self {
            home: home.to_string(),
            in_memory,
            open: AtomicBool::new(false),
            // The cache budget is only a hard limit for in-memory stores.
            cache_limit: if in_memory {
                config.size("cache_size")
            } else {
                None
            },
            tables: RwLock::new(BTreeMap::new()),
            writes: Mutex::new(WriteState::default()),
            next_table_id: AtomicU64::new(1),
            next_session_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn table(&self, name: &str) -> NativeResult<Arc<Table>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or(Status::NO_ENTRY)
    }

    pub(crate) fn create(&self, name: &str, exclusive: bool) -> NativeResult<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return if exclusive { Err(Status::EXISTS) } else { Ok(()) };
        }
        let id = self.next_table_id.fetch_add(1, Ordering::Relaxed);
        tables.insert(
            name.to_string(),
            Arc::new(Table {
                id,
                records: RwLock::new(Records::new()),
            }),
        );
        Ok(())
    }

    pub(crate) fn drop_table(&self, name: &str, force: bool) -> NativeResult<()> {
        let mut tables = self.tables.write();
        let Some(table) = tables.get(name) else {
            return if force { Ok(()) } else { Err(Status::NO_ENTRY) };
        };
        // Open cursors and pending undo entries hold their own references.
        if Arc::strong_count(table) > 1 {
            return Err(Status::BUSY);
        }
        let freed = table.footprint();
        tables.remove(name);
        let mut writes = self.writes.lock();
        writes.cache_used = writes.cache_used.saturating_sub(freed);
        Ok(())
    }

    pub(crate) fn rename(&self, old_name: &str, new_name: &str) -> NativeResult<()> {
        let mut tables = self.tables.write();
        let Some(table) = tables.get(old_name) else {
            return Err(Status::NO_ENTRY);
        };
        if Arc::strong_count(table) > 1 {
            return Err(Status::BUSY);
        }
        if tables.contains_key(new_name) {
            return Err(Status::EXISTS);
        }
        if let Some(table) = tables.remove(old_name) {
            tables.insert(new_name.to_string(), table);
        }
        Ok(())
    }

    /// Writes a record on behalf of `session`.
    pub(crate) fn put(
        &self,
        session: &SessionState,
        table: &Arc<Table>,
        key: &[u8],
        value: &[u8],
        overwrite: bool,
    ) -> NativeResult<()> {
        let mut writes = self.writes.lock();
        writes.check_owner(table.id, key, session.id)?;

        let mut records = table.records.write();
        let previous = records.get(key).cloned();
        if previous.is_some() && !overwrite {
            return Err(Status::DUPLICATE_KEY);
        }

        let released = previous.as_ref().map_or(0, |v| (key.len() + v.len()) as u64);
        let needed = (key.len() + value.len()) as u64;
        let used = writes.cache_used.saturating_sub(released) + needed;
        if let Some(limit) = self.cache_limit {
            if used > limit {
                return Err(Status::CACHE_FULL);
            }
        }
        writes.cache_used = used;
        records.insert(key.to_vec(), value.to_vec());
        drop(records);

        if session.in_txn() {
            Self::log_undo(&mut writes, session.id, table, key, previous);
        }
        Ok(())
    }

    /// Removes a record on behalf of `session`.
    pub(crate) fn remove(
        &self,
        session: &SessionState,
        table: &Arc<Table>,
        key: &[u8],
        overwrite: bool,
    ) -> NativeResult<()> {
        let mut writes = self.writes.lock();
        writes.check_owner(table.id, key, session.id)?;

        let mut records = table.records.write();
        let Some(previous) = records.remove(key) else {
            return if overwrite { Ok(()) } else { Err(Status::NOT_FOUND) };
        };
        drop(records);

        let released = (key.len() + previous.len()) as u64;
        writes.cache_used = writes.cache_used.saturating_sub(released);
        if session.in_txn() {
            Self::log_undo(&mut writes, session.id, table, key, Some(previous));
        }
        Ok(())
    }

    fn log_undo(
        writes: &mut WriteState,
        session: u64,
        table: &Arc<Table>,
        key: &[u8],
        previous: Option<Vec<u8>>,
    ) {
        writes.owners.insert((table.id, key.to_vec()), session);
        writes.undo.entry(session).or_default().push(UndoEntry {
            table: Arc::clone(table),
            key: key.to_vec(),
            previous,
        });
    }

    /// Forgets the undo log of a committed transaction.
    pub(crate) fn commit(&self, session: u64) {
        let mut writes = self.writes.lock();
        writes.undo.remove(&session);
        writes.release_owned(session);
    }

    /// Undoes every write of the session's running transaction.
    pub(crate) fn rollback(&self, session: u64) {
        let mut writes = self.writes.lock();
        let entries = writes.undo.remove(&session).unwrap_or_default();
        Self::apply_undo(&mut writes, entries);
        writes.release_owned(session);
    }

    /// Undoes every running transaction. Used when the connection closes.
    pub(crate) fn rollback_all(&self) {
        let mut writes = self.writes.lock();
        let sessions: Vec<u64> = writes.undo.keys().copied().collect();
        for session in sessions {
            let entries = writes.undo.remove(&session).unwrap_or_default();
            Self::apply_undo(&mut writes, entries);
        }
        writes.owners.clear();
    }

    fn apply_undo(writes: &mut WriteState, entries: Vec<UndoEntry>) {
        for entry in entries.into_iter().rev() {
            let mut records = entry.table.records.write();
            let current = match entry.previous {
                Some(previous) => {
                    writes.cache_used += (entry.key.len() + previous.len()) as u64;
                    records.insert(entry.key.clone(), previous)
                }
                None => records.remove(&entry.key),
            };
            if let Some(current) = current {
                let released = (entry.key.len() + current.len()) as u64;
                writes.cache_used = writes.cache_used.saturating_sub(released);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store::new("home", &ConfigReader::parse(Some("create")))
    }

    fn session(store: &Store) -> SessionState {
        SessionState::new(store.next_session_id(), Arc::new(AtomicBool::new(true)))
    }

    #[test]
    fn create_is_idempotent_unless_exclusive() {
        let store = store();
        store.create("table:a", false).unwrap();
        store.create("table:a", false).unwrap();
        assert_eq!(store.create("table:a", true), Err(Status::EXISTS));
    }

    #[test]
    fn drop_missing_table() {
        let store = store();
        assert_eq!(store.drop_table("table:x", false), Err(Status::NO_ENTRY));
        assert!(store.drop_table("table:x", true).is_ok());
    }

    #[test]
    fn drop_with_open_reference_is_busy() {
        let store = store();
        store.create("table:a", false).unwrap();
        let held = store.table("table:a").unwrap();
        assert_eq!(store.drop_table("table:a", false), Err(Status::BUSY));
        drop(held);
        assert!(store.drop_table("table:a", false).is_ok());
        assert_eq!(store.table("table:a").err(), Some(Status::NO_ENTRY));
    }

    #[test]
    fn rename_moves_records() {
        let store = store();
        let s = session(&store);
        store.create("table:a", false).unwrap();
        let table = store.table("table:a").unwrap();
        store.put(&s, &table, b"k", b"v", true).unwrap();
        drop(table);

        store.rename("table:a", "table:b").unwrap();
        assert_eq!(store.table("table:a").err(), Some(Status::NO_ENTRY));
        let table = store.table("table:b").unwrap();
        assert_eq!(table.records.read().get(b"k".as_slice()), Some(&b"v".to_vec()));
    }

    #[test]
    fn rollback_restores_previous_values() {
        let store = store();
        let s = session(&store);
        store.create("table:a", false).unwrap();
        let table = store.table("table:a").unwrap();
        store.put(&s, &table, b"k1", b"old", true).unwrap();

        s.set_in_txn(true);
        store.put(&s, &table, b"k1", b"new", true).unwrap();
        store.put(&s, &table, b"k2", b"v2", true).unwrap();
        store.remove(&s, &table, b"k1", true).unwrap();
        store.rollback(s.id);
        s.set_in_txn(false);

        let records = table.records.read();
        assert_eq!(records.get(b"k1".as_slice()), Some(&b"old".to_vec()));
        assert!(records.get(b"k2".as_slice()).is_none());
    }

    #[test]
    fn uncommitted_keys_conflict() {
        let store = store();
        let a = session(&store);
        let b = session(&store);
        store.create("table:a", false).unwrap();
        let table = store.table("table:a").unwrap();

        a.set_in_txn(true);
        store.put(&a, &table, b"k", b"a", true).unwrap();
        assert_eq!(store.put(&b, &table, b"k", b"b", true), Err(Status::ROLLBACK));
        assert_eq!(store.remove(&b, &table, b"k", true), Err(Status::ROLLBACK));

        store.commit(a.id);
        a.set_in_txn(false);
        assert!(store.put(&b, &table, b"k", b"b", true).is_ok());
    }

    #[test]
    fn cache_limit_applies_to_in_memory_stores() {
        let store = Store::new(
            "home",
            &ConfigReader::parse(Some("create,in_memory=true,cache_size=16")),
        );
        let s = session(&store);
        store.create("table:a", false).unwrap();
        let table = store.table("table:a").unwrap();

        store.put(&s, &table, b"k1", b"12345678", true).unwrap();
        assert_eq!(
            store.put(&s, &table, b"k2", b"12345678", true),
            Err(Status::CACHE_FULL)
        );
        // Replacing a value only charges the difference.
        store.put(&s, &table, b"k1", b"1234", true).unwrap();
        store.remove(&s, &table, b"k1", true).unwrap();
        store.put(&s, &table, b"k2", b"12345678", true).unwrap();
    }
}
