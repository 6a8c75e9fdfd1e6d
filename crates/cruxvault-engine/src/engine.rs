//! The engine handle: one cipher, one store, every operation in §4.3/§4.4.

use cruxvault_crypto::Cipher;
use cruxvault_storage::Store;

/// Owns the cipher and the backing store and implements both the
/// Working Store (`set_secret`, `get_secret`, ...) and the
/// Version-Control Engine (`create_branch`, `commit`, `merge_branch`,
/// ...) as inherent methods, split across this crate's modules.
///
/// There is one `Engine` per open vault; the facade crate wraps it in
/// an `Arc` for cheap cloning across the embedding application.
pub struct Engine {
    pub(crate) store: Store,
    pub(crate) cipher: Cipher,
}

impl Engine {
    /// Builds an engine over an already-open store and cipher.
    pub fn new(store: Store, cipher: Cipher) -> Self {
        Self { store, cipher }
    }
}
