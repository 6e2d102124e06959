//! Per-level locks and the lock-coupling cursor.
//!
//! Every tree level is one [`Level`] behind its own `parking_lot::Mutex`. The
//! mutex owns the level's slice of the heap array together with the parked
//! [`Token`] of whichever operation occupies the level, so "only the holder of
//! level `L`'s lock touches a level-`L` node" is enforced by the borrow
//! checker.
//!
//! # Lock Coupling
//! A traversal holds at most two adjacent levels. [`Coupling::advance`]
//! releases level `L` only after `L + 1` is already held, then acquires
//! `L + 2`. Levels are only ever acquired in increasing order, which rules
//! out deadlock between traversals.
//!
//! # Resizing
//! The lock array itself lives in [`LevelTable`] as an `Arc<[LevelLock]>`
//! snapshot behind a `RwLock`. Only growth replaces it, and only while it
//! holds every level lock. A snapshot taken while holding level 0 is therefore
//! always current for the rest of that traversal.
//!
//! ```rust,ignore
//! let mut coupling = Coupling::enter(&table);
//! loop {
//!     let (current, ahead) = coupling.pair();
//!     // work on current + ahead
//!     if !coupling.advance() {
//!         break;
//!     }
//! }
//! // both guards release on drop
//! ```

use std::sync::Arc;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex, RwLock};

use crate::node::Node;

/// Shared handle to one level's lock.
pub type LevelLock<E> = Arc<Mutex<Level<E>>>;

/// Owned guard over one level. Not tied to a borrow of the table, so a
/// traversal can keep it across a table replacement.
pub type LevelGuard<E> = ArcMutexGuard<RawMutex, Level<E>>;

// ============================================================================
//  Token
// ============================================================================

/// Transient state an in-flight operation parks at a level: the element it is
/// carrying down and the array position it will work on next.
#[derive(Debug)]
pub struct Token<E> {
    carried: Option<E>,
    position: usize,
}

impl<E> Token<E> {
    const fn idle() -> Self {
        Self {
            carried: None,
            position: 0,
        }
    }

    /// Park a position (and optionally an element) for the next step.
    #[inline]
    pub fn park(&mut self, carried: Option<E>, position: usize) {
        debug_assert!(self.carried.is_none(), "token already carries an element");
        self.carried = carried;
        self.position = position;
    }

    /// Global array index parked here.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Take the carried element, leaving the token idle.
    #[inline]
    pub fn take(&mut self) -> Option<E> {
        self.carried.take()
    }
}

// ============================================================================
//  Level
// ============================================================================

/// One tree level: its partition of the heap array plus the parked token.
#[derive(Debug)]
pub struct Level<E> {
    depth: usize,
    nodes: Vec<Node<E>>,
    token: Token<E>,
}

impl<E> Level<E> {
    /// A level at `depth` owning `nodes`.
    #[must_use]
    pub const fn new(depth: usize, nodes: Vec<Node<E>>) -> Self {
        Self {
            depth,
            nodes,
            token: Token::idle(),
        }
    }

    /// Depth of this level (0 = root).
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Nodes of this level, in array order.
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node<E>] {
        &self.nodes
    }

    /// Mutable access to the partition (growth appends to it).
    #[inline]
    pub const fn nodes_mut(&mut self) -> &mut Vec<Node<E>> {
        &mut self.nodes
    }

    /// Node at `offset` within this level.
    #[inline]
    #[must_use]
    pub fn node(&self, offset: usize) -> Option<&Node<E>> {
        self.nodes.get(offset)
    }

    /// Mutable node at `offset` within this level.
    #[inline]
    pub fn node_mut(&mut self, offset: usize) -> Option<&mut Node<E>> {
        self.nodes.get_mut(offset)
    }

    /// The parked token.
    #[inline]
    pub const fn token(&mut self) -> &mut Token<E> {
        &mut self.token
    }
}

// ============================================================================
//  LevelTable
// ============================================================================

/// The resizable array of level locks.
pub struct LevelTable<E> {
    /// Level 0. Kept outside the snapshot because every traversal starts here
    /// and growth never replaces it.
    root: LevelLock<E>,

    /// Current lock array; `levels[0]` is `root`.
    levels: RwLock<Arc<[LevelLock<E>]>>,
}

impl<E> LevelTable<E> {
    /// Build a table over prepared level partitions.
    ///
    /// # Panics
    /// Panics if `partitions` is empty; a tree always has a root level.
    #[must_use]
    pub fn new(partitions: Vec<Vec<Node<E>>>) -> Self {
        let levels: Arc<[LevelLock<E>]> = partitions
            .into_iter()
            .enumerate()
            .map(|(depth, nodes)| Arc::new(Mutex::new(Level::new(depth, nodes))))
            .collect();

        assert!(!levels.is_empty(), "a level table needs a root level");
        let root: LevelLock<E> = Arc::clone(&levels[0]);

        Self {
            root,
            levels: RwLock::new(levels),
        }
    }

    /// Clone of the current lock array.
    ///
    /// Only guaranteed current while the caller holds level 0.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Arc<[LevelLock<E>]> {
        Arc::clone(&self.levels.read())
    }

    /// Number of levels in the current table.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.levels.read().len()
    }

    /// Lock level 0 and take a snapshot that stays current while it is held.
    #[must_use]
    pub fn lock_root(&self) -> (LevelGuard<E>, Arc<[LevelLock<E>]>) {
        let root: LevelGuard<E> = self.root.lock_arc();
        (root, self.snapshot())
    }

    /// Lock every level in increasing order.
    ///
    /// Waits for all in-flight traversals to drain out of the tree; nothing
    /// can enter while the returned guards are alive.
    #[must_use]
    pub fn lock_all(&self) -> Vec<LevelGuard<E>> {
        let (root, levels) = self.lock_root();
        let mut guards: Vec<LevelGuard<E>> = Vec::with_capacity(levels.len());

        guards.push(root);
        guards.extend(levels.iter().skip(1).map(|lock| lock.lock_arc()));
        guards
    }

    /// Replace the lock array.
    ///
    /// The caller must hold every level lock of the current table, and
    /// `levels` must start with the same lock handles.
    pub fn publish(&self, levels: Arc<[LevelLock<E>]>) {
        debug_assert!(Arc::ptr_eq(&levels[0], &self.root), "root level replaced");
        *self.levels.write() = levels;
    }
}

impl<E> std::fmt::Debug for LevelTable<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelTable")
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

// ============================================================================
//  Coupling
// ============================================================================

/// Cursor of one lock-coupled traversal.
///
/// Holds the guard of the level being worked on (`current`) and, when the
/// tree is deep enough, the guard of the level below (`ahead`). Dropping the
/// cursor releases both.
pub struct Coupling<E> {
    levels: Arc<[LevelLock<E>]>,
    depth: usize,
    current: LevelGuard<E>,
    ahead: Option<LevelGuard<E>>,
}

impl<E> Coupling<E> {
    /// Start a traversal: lock level 0, then level 1 if it exists.
    #[must_use]
    pub fn enter(table: &LevelTable<E>) -> Self {
        let (current, levels) = table.lock_root();
        let ahead: Option<LevelGuard<E>> = levels.get(1).map(|lock| lock.lock_arc());

        Self {
            levels,
            depth: 0,
            current,
            ahead,
        }
    }

    /// Depth of the level currently worked on.
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Height of the tree as seen by this traversal.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// The level being worked on.
    #[inline]
    pub fn current(&mut self) -> &mut Level<E> {
        &mut self.current
    }

    /// Both held levels at once.
    #[inline]
    pub fn pair(&mut self) -> (&mut Level<E>, Option<&mut Level<E>>) {
        (&mut *self.current, self.ahead.as_deref_mut())
    }

    /// Hand over one level: release `current`, promote `ahead`, and acquire
    /// the level after it.
    ///
    /// Returns `false` (and changes nothing) when there is no level below.
    pub fn advance(&mut self) -> bool {
        let Some(next) = self.ahead.take() else {
            return false;
        };

        let released: LevelGuard<E> = std::mem::replace(&mut self.current, next);
        drop(released);

        self.depth += 1;
        self.ahead = self.levels.get(self.depth + 1).map(|lock| lock.lock_arc());
        true
    }

    /// Lock every level below the held pair, in increasing order.
    ///
    /// Only valid at the root, where the pair is levels 0 and 1.
    #[must_use]
    pub fn lock_remaining(&self) -> Vec<LevelGuard<E>> {
        debug_assert_eq!(self.depth, 0, "lock_remaining() away from the root");
        self.levels.iter().skip(2).map(|lock| lock.lock_arc()).collect()
    }

    /// The lock array this traversal runs against.
    #[inline]
    #[must_use]
    pub fn levels(&self) -> &Arc<[LevelLock<E>]> {
        &self.levels
    }

    /// Switch to a freshly published lock array after growth.
    ///
    /// Only valid at the root. A tree that was a single level gains its
    /// level 1 here, acquired after level 0 as usual.
    pub fn refresh(&mut self, levels: Arc<[LevelLock<E>]>) {
        debug_assert_eq!(self.depth, 0, "refresh() away from the root");
        self.levels = levels;

        if self.ahead.is_none() {
            self.ahead = self.levels.get(1).map(|lock| lock.lock_arc());
        }
    }
}
