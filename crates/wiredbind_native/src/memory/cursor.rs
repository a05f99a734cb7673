//! In-memory cursor.

use super::store::{SessionState, Store, Table};
use crate::api::NativeCursor;
use crate::status::{NativeResult, Status};
use std::ops::Bound;
use std::sync::Arc;

/// A raw-mode cursor over one in-memory table.
///
/// The current record is held as a private copy, so views handed out by
/// `get_key`/`get_value` stay valid until the next call on the cursor.
pub(crate) struct MemoryCursor {
    uri: String,
    store: Arc<Store>,
    table: Arc<Table>,
    session: Arc<SessionState>,
    overwrite: bool,
    key: Option<Vec<u8>>,
    value: Option<Vec<u8>>,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl MemoryCursor {
    pub(crate) fn new(
        uri: &str,
        store: Arc<Store>,
        table: Arc<Table>,
        session: Arc<SessionState>,
        overwrite: bool,
    ) -> Self {
        Self {
            uri: uri.to_string(),
            store,
            table,
            session,
            overwrite,
            key: None,
            value: None,
            current: None,
        }
    }

    fn staged_key(&self) -> NativeResult<&[u8]> {
        self.key.as_deref().ok_or(Status::INVALID)
    }

    fn position(&mut self, found: Option<(Vec<u8>, Vec<u8>)>) -> NativeResult<()> {
        let positioned = found.is_some();
        self.current = found;
        if positioned {
            Ok(())
        } else {
            Err(Status::NOT_FOUND)
        }
    }
}

impl NativeCursor for MemoryCursor {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn set_key(&mut self, key: &[u8]) {
        self.key = Some(key.to_vec());
    }

    fn set_value(&mut self, value: &[u8]) {
        self.value = Some(value.to_vec());
    }

    fn get_key(&self) -> NativeResult<&[u8]> {
        self.session.ensure_usable()?;
        self.current
            .as_ref()
            .map(|(k, _)| k.as_slice())
            .ok_or(Status::INVALID)
    }

    fn get_value(&self) -> NativeResult<&[u8]> {
        self.session.ensure_usable()?;
        self.current
            .as_ref()
            .map(|(_, v)| v.as_slice())
            .ok_or(Status::INVALID)
    }

    fn next(&mut self) -> NativeResult<()> {
        self.session.ensure_usable()?;
        let table = Arc::clone(&self.table);
        let records = table.records.read();
        let found = match &self.current {
            None => records.iter().next(),
            Some((key, _)) => records
                .range::<[u8], _>((Bound::Excluded(key.as_slice()), Bound::Unbounded))
                .next(),
        }
        .map(|(k, v)| (k.clone(), v.clone()));
        drop(records);
        self.position(found)
    }

    fn prev(&mut self) -> NativeResult<()> {
        self.session.ensure_usable()?;
        let table = Arc::clone(&self.table);
        let records = table.records.read();
        let found = match &self.current {
            None => records.iter().next_back(),
            Some((key, _)) => records
                .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key.as_slice())))
                .next_back(),
        }
        .map(|(k, v)| (k.clone(), v.clone()));
        drop(records);
        self.position(found)
    }

    fn reset(&mut self) -> NativeResult<()> {
        self.session.ensure_usable()?;
        self.current = None;
        self.key = None;
        self.value = None;
        Ok(())
    }

    fn search(&mut self) -> NativeResult<()> {
        self.session.ensure_usable()?;
        let key = self.staged_key()?;
        let found = self
            .table
            .records
            .read()
            .get(key)
            .map(|v| (key.to_vec(), v.clone()));
        self.position(found)
    }

    fn search_near(&mut self) -> NativeResult<i32> {
        self.session.ensure_usable()?;
        let key = self.staged_key()?;
        let table = Arc::clone(&self.table);
        let records = table.records.read();

        let (found, exact) = if let Some(value) = records.get(key) {
            (Some((key.to_vec(), value.clone())), 0)
        } else if let Some((k, v)) = records
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
        {
            (Some((k.clone(), v.clone())), 1)
        } else if let Some((k, v)) = records
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key)))
            .next_back()
        {
            (Some((k.clone(), v.clone())), -1)
        } else {
            (None, 0)
        };
        drop(records);

        self.position(found)?;
        Ok(exact)
    }

    fn insert(&mut self) -> NativeResult<()> {
        self.session.ensure_usable()?;
        let (Some(key), Some(value)) = (self.key.as_deref(), self.value.as_deref()) else {
            return Err(Status::INVALID);
        };
        self.store
            .put(&self.session, &self.table, key, value, self.overwrite)?;
        self.current = None;
        Ok(())
    }

    fn remove(&mut self) -> NativeResult<()> {
        self.session.ensure_usable()?;
        let key = self.staged_key()?;
        self.store
            .remove(&self.session, &self.table, key, self.overwrite)?;
        self.current = None;
        Ok(())
    }

    fn close(self: Box<Self>) -> NativeResult<()> {
        Ok(())
    }
}
