use crate::actions::{self, Action};
use crate::cache::Cache;
use crate::effects::{self, Effect};
use crate::store::Store;
use shield_model::CanvasChange;

pub struct State {
    pub store: Store,
    pub cache: Cache,
    action_queue: Vec<Action>,
    effect_queue: Vec<Effect>,
    changes: Vec<CanvasChange>,
    generation: u64,
}

impl State {
    pub fn new(store: Store) -> Self {
        let generation = store.generation();
        Self {
            store,
            cache: Cache::new(),
            action_queue: Vec::new(),
            effect_queue: Vec::new(),
            changes: Vec::new(),
            generation,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        self.action_queue.push(action);
    }

    pub fn flush_actions(&mut self) {
        let actions = std::mem::take(&mut self.action_queue);
        for action in actions {
            let mut effects = actions::update(&mut self.store, action);
            self.effect_queue.append(&mut effects);
        }
        self.collect_changes();
    }

    pub fn flush_effects(&mut self) {
        let effects = std::mem::take(&mut self.effect_queue);
        for effect in effects {
            effects::run(&mut self.store, effect);
        }
        self.collect_changes();
    }

    /// Applies queued actions, then the effects they produced.
    pub fn flush(&mut self) {
        self.flush_actions();
        self.flush_effects();
    }

    pub fn pending_effects(&self) -> &[Effect] {
        &self.effect_queue
    }

    /// Canvas changes seen since the last call, oldest first. A project
    /// replaced by new/load shows up as a leading `Reset`.
    pub fn take_changes(&mut self) -> Vec<CanvasChange> {
        std::mem::take(&mut self.changes)
    }

    fn collect_changes(&mut self) {
        let mut drained = self.store.canvas.drain_changes();
        let generation = self.store.generation();
        if generation != self.generation {
            self.generation = generation;
            self.changes.clear();
            match drained.iter().rposition(|c| *c == CanvasChange::Reset) {
                Some(pos) => {
                    drained.drain(..pos);
                }
                None => drained.insert(0, CanvasChange::Reset),
            }
        }
        self.changes.extend(drained);
    }
}
