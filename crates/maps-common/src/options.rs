//! Scoped compiler options.
//!
//! Options are plain strings keyed by [`CompilerOption`]. Reads fall back
//! from the calling thread's override, to the process-wide override, to the
//! compiled-in default. Overrides are only installed through
//! [`CompilerOptions::lock`] / [`CompilerOptions::lock_for_this_thread`],
//! which hand out an [`OptionsGuard`]; dropping the guard reverts every
//! value it set.
//!
//! A thread may hold at most one guard at a time, and at most one global
//! guard exists across all threads.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use parking_lot::Mutex;

/// A named compiler switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompilerOption {
    /// Append `: Type` to every node when printing expression trees.
    PrintAllTypes,
    /// Disable constant inlining during concretization.
    DebugNoInline,
    /// Render diagnostics with ANSI colours.
    DiagnosticColor,
}

impl CompilerOption {
    pub const ALL: [CompilerOption; 3] = [
        CompilerOption::PrintAllTypes,
        CompilerOption::DebugNoInline,
        CompilerOption::DiagnosticColor,
    ];

    /// The key used in config files.
    pub fn key(self) -> &'static str {
        match self {
            Self::PrintAllTypes => "print-all-types",
            Self::DebugNoInline => "debug-no-inline",
            Self::DiagnosticColor => "diagnostic-color",
        }
    }

    pub fn default_value(self) -> &'static str {
        match self {
            Self::PrintAllTypes => "false",
            Self::DebugNoInline => "false",
            Self::DiagnosticColor => "false",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.key() == key)
    }
}

impl fmt::Display for CompilerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Option overrides, as passed to the lock functions.
pub type Entries = BTreeMap<CompilerOption, String>;

/// Which override a guard controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScope {
    Global,
    Thread,
}

/// Failure to acquire an options override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// The calling thread already holds a guard of the given scope.
    AlreadyHeldByThisThread(LockScope),
    /// Another thread holds the global guard.
    GlobalLockTaken,
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyHeldByThisThread(LockScope::Global) => {
                write!(f, "this thread already holds the global options lock")
            }
            Self::AlreadyHeldByThisThread(LockScope::Thread) => {
                write!(f, "this thread already holds a thread-local options lock")
            }
            Self::GlobalLockTaken => write!(f, "the global options lock is held by another thread"),
        }
    }
}

impl std::error::Error for OptionsError {}

// ── State ──────────────────────────────────────────────────────────────

static GLOBAL_ENTRIES: Mutex<Option<Entries>> = Mutex::new(None);

thread_local! {
    static THREAD_ENTRIES: RefCell<Option<Entries>> = const { RefCell::new(None) };
    static HELD: Cell<Option<LockScope>> = const { Cell::new(None) };
}

// ── Access ─────────────────────────────────────────────────────────────

/// Entry point for reading options and acquiring overrides.
pub struct CompilerOptions;

impl CompilerOptions {
    /// Take the process-wide override, applying `entries` on top of the
    /// defaults for every thread without its own override.
    pub fn lock(entries: &Entries) -> Result<OptionsGuard, OptionsError> {
        if let Some(scope) = HELD.with(Cell::get) {
            return Err(OptionsError::AlreadyHeldByThisThread(scope));
        }

        let mut global = GLOBAL_ENTRIES.lock();
        if global.is_some() {
            return Err(OptionsError::GlobalLockTaken);
        }
        *global = Some(entries.clone());
        drop(global);

        HELD.with(|held| held.set(Some(LockScope::Global)));
        log::debug!("global compiler options locked ({} entries)", entries.len());
        Ok(OptionsGuard::new(LockScope::Global))
    }

    /// Take an override visible only to the calling thread.
    pub fn lock_for_this_thread(entries: &Entries) -> Result<OptionsGuard, OptionsError> {
        if let Some(scope) = HELD.with(Cell::get) {
            return Err(OptionsError::AlreadyHeldByThisThread(scope));
        }

        THREAD_ENTRIES.with(|slot| *slot.borrow_mut() = Some(entries.clone()));
        HELD.with(|held| held.set(Some(LockScope::Thread)));
        Ok(OptionsGuard::new(LockScope::Thread))
    }

    /// Current value of `key` as seen from the calling thread.
    pub fn get(key: CompilerOption) -> String {
        let thread_value = THREAD_ENTRIES.with(|slot| {
            slot.borrow()
                .as_ref()
                .and_then(|entries| entries.get(&key).cloned())
        });
        if let Some(value) = thread_value {
            return value;
        }

        if let Some(value) = GLOBAL_ENTRIES
            .lock()
            .as_ref()
            .and_then(|entries| entries.get(&key).cloned())
        {
            return value;
        }

        key.default_value().to_string()
    }

    /// `true` iff the option's current value is the string `"true"`.
    pub fn get_bool(key: CompilerOption) -> bool {
        Self::get(key) == "true"
    }
}

/// Scoped ownership of an options override.
///
/// Not `Send`: the guard's bookkeeping is tied to the thread that took it.
#[must_use = "dropping the guard immediately reverts the options"]
pub struct OptionsGuard {
    scope: LockScope,
    _not_send: PhantomData<*const ()>,
}

impl OptionsGuard {
    fn new(scope: LockScope) -> Self {
        Self {
            scope,
            _not_send: PhantomData,
        }
    }

    pub fn scope(&self) -> LockScope {
        self.scope
    }

    /// Override `key` for as long as this guard lives.
    pub fn set(&mut self, key: CompilerOption, value: impl Into<String>) {
        let value = value.into();
        match self.scope {
            LockScope::Global => {
                GLOBAL_ENTRIES
                    .lock()
                    .get_or_insert_with(Entries::new)
                    .insert(key, value);
            }
            LockScope::Thread => THREAD_ENTRIES.with(|slot| {
                slot.borrow_mut()
                    .get_or_insert_with(Entries::new)
                    .insert(key, value);
            }),
        }
    }
}

impl Drop for OptionsGuard {
    fn drop(&mut self) {
        match self.scope {
            LockScope::Global => {
                *GLOBAL_ENTRIES.lock() = None;
                log::debug!("global compiler options released");
            }
            LockScope::Thread => THREAD_ENTRIES.with(|slot| *slot.borrow_mut() = None),
        }
        HELD.with(|held| held.set(None));
    }
}
