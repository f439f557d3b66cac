//! Read-only repositories over the execution helpers.

mod product;

use std::sync::Arc;

use crate::config::{ConnectionDescriptor, SqlConfiguration};
use crate::session::Connect;

pub use product::{ProductRepository, ProductStore, StoredProcedure};

/// Hands out a connection source for each repository call.
pub trait ConnectionProvider: Send + Sync {
    type Conn: Connect;

    fn connection(&self) -> Self::Conn;
}

/// The configuration's default connection (`AdventureConnection`).
impl ConnectionProvider for SqlConfiguration {
    type Conn = ConnectionDescriptor;

    fn connection(&self) -> ConnectionDescriptor {
        self.default_connection().clone()
    }
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for Arc<P> {
    type Conn = P::Conn;

    fn connection(&self) -> P::Conn {
        (**self).connection()
    }
}

#[cfg(feature = "test-utils")]
impl ConnectionProvider for crate::test_utils::FakeServer {
    type Conn = crate::test_utils::FakeServer;

    fn connection(&self) -> Self::Conn {
        self.clone()
    }
}
