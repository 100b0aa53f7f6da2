use eframe::egui::Pos2;
use std::fmt;

/// Stable identity of a target. Never reused after removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    pub id: TargetId,
    pub position: Pos2,
}

/// Targets in insertion order, which is also the dispatch order.
#[derive(Debug, Default)]
pub struct TargetStore {
    targets: Vec<Target>,
    next_id: u64,
}

impl TargetStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.targets.len() }

    pub fn is_empty(&self) -> bool { self.targets.is_empty() }

    pub fn iter(&self) -> std::slice::Iter<'_, Target> { self.targets.iter() }

    #[cfg(test)]
    pub fn ids(&self) -> Vec<TargetId> { self.targets.iter().map(|t| t.id).collect() }

    pub fn add(&mut self, position: Pos2) -> TargetId {
        let id = TargetId(self.next_id);
        self.next_id += 1;
        self.targets.push(Target { id, position });
        id
    }

    pub fn add_many(&mut self, positions: impl IntoIterator<Item = Pos2>) -> Vec<TargetId> {
        positions.into_iter().map(|p| self.add(p)).collect()
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Target> { self.targets.get(index) }

    /// 0-based position in dispatch order; the UI shows it 1-based.
    pub fn index_of(&self, id: TargetId) -> Option<usize> {
        self.targets.iter().position(|t| t.id == id)
    }

    pub fn contains(&self, id: TargetId) -> bool { self.index_of(id).is_some() }

    /// Overwrites the position. No clamping; unknown ids are ignored.
    pub fn move_to(&mut self, id: TargetId, position: Pos2) -> bool {
        match self.targets.iter_mut().find(|t| t.id == id) {
            Some(t) => {
                t.position = position;
                true
            }
            None => false,
        }
    }

    /// Removes exactly one target, returning the slot it occupied.
    pub fn remove(&mut self, id: TargetId) -> Option<usize> {
        let index = self.index_of(id)?;
        self.targets.remove(index);
        Some(index)
    }

    /// Empties the store. Identities keep counting up.
    pub fn clear(&mut self) { self.targets.clear(); }
}
