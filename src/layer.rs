//! # Layer trait
//!
//! Tower-style middleware composition for [`Ufs`] stores. Every
//! behavioral combinator (`Overlay`, `Logger`, `DirCache`, `WriteCache`,
//! `ReadWriteCache`) has a matching `Layer` so stores can be built up with
//! fluent `.layer(...)` chaining instead of nested constructor calls.
//!
//! ```text
//! Store ──▶ Layer::layer() ──▶ Wrapped store
//! ```

use crate::contract::Ufs;

/// A layer that wraps a store to add functionality.
pub trait Layer<B> {
    /// The resulting store type after applying this layer.
    type Store;

    /// Wrap the given store with this layer's functionality.
    fn layer(self, store: B) -> Self::Store;
}

/// Extension trait providing `.layer(...)` on any [`Ufs`] store.
pub trait LayerExt: Ufs + Sized {
    /// Apply a layer to this store.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Store {
        layer.layer(self)
    }
}

impl<B: Ufs> LayerExt for B {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;
    use crate::combinators::logger::LoggerLayer;

    #[test]
    fn layer_ext_composes_fluently() {
        let store = MemoryUfs::new().layer(LoggerLayer::new("test"));
        fn _takes_ufs<T: Ufs>(_: &T) {}
        _takes_ufs(&store);
    }
}
