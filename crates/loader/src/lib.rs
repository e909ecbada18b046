//! Runtime module loading for hotsplice.
//!
//! This crate owns everything that happens after a loadable module exists on disk:
//!
//! * [`identity`]: file-level identity of a module, used for duplicate detection
//! * [`element`]: the [`ModuleElement`] capability a loaded module exposes
//! * [`native`]: shared-library backed elements opened through `libloading`
//! * [`host`]: the host process's ordered element list ([`HostLoader`])
//! * [`merge`]: splicing a module's elements into a [`LoaderState`]
//! * [`resolve`]: batch symbol resolution through the host or a module-scoped loader
//! * [`registry`]: the owned name-to-handle cache
//!
//! Symbol resolution is first-match-wins across an element list. Merging appends, so
//! a merged module can only supply names the host does not already answer.

pub mod element;
mod error;
pub mod host;
pub mod identity;
pub mod merge;
pub mod native;
pub mod registry;
pub mod resolve;
pub mod symbol;

pub use element::{ElementRef, LoadedModule, ModuleElement, ModuleOpener};
pub use error::{LoadError, MergeError};
pub use host::{ElementList, HostLoader, LoaderState};
pub use identity::ModuleIdentity;
pub use merge::{MergeOutcome, merge_into, plan_merge};
pub use native::{NativeElement, NativeOpener};
pub use registry::SymbolRegistry;
pub use resolve::{BatchResolution, ResolveVia, SymbolLoader};
pub use symbol::{SymbolAddress, SymbolHandle, SymbolName, SymbolNameError};
