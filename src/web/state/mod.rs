mod channel;
mod entry;

use crate::watcher::WatchContext;

use channel::Channel;
pub use entry::{Entry, EntryState, EntryStatus};

use std::collections::{hash_map::IterMut, HashMap};
use std::sync::{Arc, Mutex};

pub type SharedState = Arc<Mutex<AppState>>;

pub struct AppState {
    context: WatchContext,
    entries: HashMap<String, Entry>,
}

impl AppState {
    pub fn new(context: WatchContext) -> Self {
        Self {
            context,
            entries: HashMap::new(),
        }
    }

    pub fn context(&self) -> WatchContext {
        self.context.clone()
    }

    pub fn insert<T: Into<String>>(&mut self, id: T, entry: Entry) -> Option<Entry> {
        self.entries.insert(id.into(), entry)
    }

    /// Stop the watch and forget it.
    pub fn remove<T: Into<String>>(&mut self, id: T) -> Option<Entry> {
        let mut entry = self.entries.remove(&id.into())?;
        entry.stop();
        Some(entry)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, String, Entry> {
        self.entries.iter_mut()
    }

    pub fn entry_states(&mut self) -> HashMap<String, EntryState> {
        self.entries
            .iter_mut()
            .map(|(id, entry)| {
                entry.check();
                (id.clone(), EntryState::from(&*entry))
            })
            .collect()
    }
}

impl From<AppState> for SharedState {
    fn from(state: AppState) -> Self {
        Arc::new(Mutex::new(state))
    }
}
