use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use cell_core::{FreeIndexStack, TxnId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableErr {
    /// No free slot. A protocol failure, to be answered with a reject
    Exhausted,
    /// Another transaction in use already has this key
    DuplicateKey,
}

#[derive(Debug)]
struct Slot<K, T> {
    key: K,
    data: T,
}

/// Bounded table of in-progress transactions of one node.
///
/// Slots live in a dense array; free slot ids come from a free-index stack. Each
/// in-use transaction also has a key (peer identity plus whatever the role needs to
/// demultiplex inbound messages) that is unique among in-use transactions.
#[derive(Debug)]
pub struct TransactionTable<K, T> {
    slots: Vec<Option<Slot<K, T>>>,
    free: FreeIndexStack,
    index: HashMap<K, TxnId>,
}

impl<K, T> TransactionTable<K, T>
where
    K: Copy + Eq + Hash + Debug,
{
    pub fn new(capacity: u16) -> Self {
        let mut slots = Vec::with_capacity(capacity as usize);
        slots.resize_with(capacity as usize, || None);
        Self {
            slots,
            free: FreeIndexStack::new(capacity),
            index: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Takes the lowest free slot for a new transaction
    pub fn create(&mut self, key: K, data: T) -> Result<TxnId, TableErr> {
        if self.index.contains_key(&key) {
            return Err(TableErr::DuplicateKey);
        }
        let Some(id) = self.free.allocate() else {
            tracing::debug!("transaction table full ({} slots), rejecting {:?}", self.slots.len(), key);
            return Err(TableErr::Exhausted);
        };
        self.slots[id as usize] = Some(Slot { key, data });
        self.index.insert(key, id);
        Ok(id)
    }

    /// Transaction id for a key
    pub fn lookup(&self, key: &K) -> Option<TxnId> {
        self.index.get(key).copied()
    }

    /// Transaction with this id, provided it is still in use under `key`
    pub fn find(&self, key: &K, id: TxnId) -> Option<&T> {
        match self.slots.get(id as usize) {
            Some(Some(slot)) if slot.key == *key => Some(&slot.data),
            _ => None,
        }
    }

    pub fn get(&self, id: TxnId) -> Option<&T> {
        self.slots.get(id as usize).and_then(|s| s.as_ref()).map(|s| &s.data)
    }

    pub fn get_mut(&mut self, id: TxnId) -> Option<&mut T> {
        self.slots.get_mut(id as usize).and_then(|s| s.as_mut()).map(|s| &mut s.data)
    }

    pub fn key_of(&self, id: TxnId) -> Option<K> {
        self.slots.get(id as usize).and_then(|s| s.as_ref()).map(|s| s.key)
    }

    pub fn contains(&self, id: TxnId) -> bool {
        self.free.is_in_use(id)
    }

    /// Frees the slot and hands back its contents so the caller can cancel timers and
    /// release resources. A second release of the same id returns None and changes nothing.
    pub fn release(&mut self, id: TxnId) -> Option<(K, T)> {
        let slot = self.slots.get_mut(id as usize)?.take()?;
        self.index.remove(&slot.key);
        self.free.release(id);
        Some((slot.key, slot.data))
    }

    /// Moves an in-use transaction to a new key
    pub fn rekey(&mut self, id: TxnId, new_key: K) -> Result<(), TableErr> {
        if let Some(existing) = self.index.get(&new_key) {
            return if *existing == id { Ok(()) } else { Err(TableErr::DuplicateKey) };
        }
        let Some(Some(slot)) = self.slots.get_mut(id as usize) else {
            return Err(TableErr::Exhausted);
        };
        self.index.remove(&slot.key);
        slot.key = new_key;
        self.index.insert(new_key, id);
        Ok(())
    }

    /// Ids of all in-use transactions, ascending
    pub fn ids(&self) -> Vec<TxnId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| i as TxnId)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TxnId, &K, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i as TxnId, &s.key, &s.data)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TxnId, &K, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|s| (i as TxnId, &s.key, &mut s.data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_until_exhausted() {
        let mut table: TransactionTable<u32, &str> = TransactionTable::new(2);
        assert_eq!(table.create(10, "a"), Ok(0));
        assert_eq!(table.create(11, "b"), Ok(1));
        assert_eq!(table.create(12, "c"), Err(TableErr::Exhausted));
        assert_eq!(table.create(10, "again"), Err(TableErr::DuplicateKey));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut table: TransactionTable<u32, u16> = TransactionTable::new(4);
        let a = table.create(1, 100).unwrap();
        let b = table.create(2, 200).unwrap();

        assert_eq!(table.release(a), Some((1, 100)));
        assert_eq!(table.release(a), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(&1), None);
        assert_eq!(table.get(b), Some(&200));

        // The freed slot is handed out again
        let c = table.create(3, 300).unwrap();
        assert_eq!(c, a);
        assert_eq!(table.find(&3, c), Some(&300));
        assert_eq!(table.find(&1, c), None);
    }

    #[test]
    fn test_rekey() {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        enum Key {
            Paging(u64),
            Conn(u32, u8),
        }
        let mut table: TransactionTable<Key, ()> = TransactionTable::new(4);
        let id = table.create(Key::Paging(1001), ()).unwrap();
        let other = table.create(Key::Conn(7, 0), ()).unwrap();

        assert_eq!(table.rekey(id, Key::Conn(7, 0)), Err(TableErr::DuplicateKey));
        assert_eq!(table.rekey(id, Key::Conn(8, 1)), Ok(()));
        assert_eq!(table.lookup(&Key::Paging(1001)), None);
        assert_eq!(table.lookup(&Key::Conn(8, 1)), Some(id));
        assert_eq!(table.key_of(other), Some(Key::Conn(7, 0)));
        assert_eq!(table.ids(), vec![0, 1]);
    }
}
