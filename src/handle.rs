use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use crate::document::AclDocument;
use crate::error::{RefreshError, SourceError};

/// The path at which the authorization service reports the caller's resolved ACL.
pub const RESULTANT_ACL_PATH: &str = "sys/internal/ui/resultant-acl/";

/// Something that can read the resolved ACL payload for an authenticated session.
///
/// `Ok(None)` means the read succeeded but returned no data.
pub trait AclSource {
    fn read_resultant_acl(&self) -> Result<Option<Value>, SourceError>;
}

impl<F> AclSource for F
where
    F: Fn() -> Result<Option<Value>, SourceError>,
{
    fn read_resultant_acl(&self) -> Result<Option<Value>, SourceError> {
        self()
    }
}

#[derive(Debug)]
struct Published {
    document: Arc<AclDocument>,
    generation: u64,
}

/// Holds the current [`AclDocument`] and swaps it wholesale on refresh.
///
/// Readers get an `Arc` snapshot, so a document is never observed half
/// replaced. The generation counts successful publications.
#[derive(Debug)]
pub struct AclHandle {
    current: RwLock<Published>,
}

impl AclHandle {
    /// Creates a handle holding an empty document at generation 0.
    pub fn new() -> Self {
        Self::with_document(AclDocument::empty())
    }

    /// Creates a handle holding `document` at generation 0.
    pub fn with_document(document: AclDocument) -> Self {
        Self {
            current: RwLock::new(Published {
                document: Arc::new(document),
                generation: 0,
            }),
        }
    }

    /// Returns the current document.
    pub fn load(&self) -> Arc<AclDocument> {
        Arc::clone(&self.current.read().document)
    }

    /// Returns the current document together with its generation.
    pub fn snapshot(&self) -> (Arc<AclDocument>, u64) {
        let current = self.current.read();
        (Arc::clone(&current.document), current.generation)
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Replaces the current document and returns the new generation.
    pub fn publish(&self, document: AclDocument) -> u64 {
        let mut current = self.current.write();
        current.document = Arc::new(document);
        current.generation += 1;
        current.generation
    }

    /// Reads, ingests and publishes a fresh document from `source`.
    ///
    /// A read with no data publishes an empty document. Any other failure
    /// leaves the current document in place and is returned to the caller.
    pub fn refresh(&self, source: &dyn AclSource) -> Result<u64, RefreshError> {
        let result = source
            .read_resultant_acl()
            .map_err(RefreshError::from)
            .and_then(|response| {
                AclDocument::from_response(response.as_ref()).map_err(RefreshError::from)
            });

        match result {
            Ok(document) => {
                let generation = self.publish(document);
                debug!(generation, "published refreshed ACL");
                Ok(generation)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    generation = self.generation(),
                    "ACL refresh failed; keeping previous document"
                );
                Err(err)
            }
        }
    }
}

impl Default for AclHandle {
    fn default() -> Self {
        Self::new()
    }
}
