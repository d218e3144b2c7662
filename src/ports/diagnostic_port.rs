//! Diagnostic sink port trait.

use crate::domain::diagnostic::Diagnostic;

/// Receives structured events from the sampling core.
///
/// Implementations must be shareable across threads because nodes hand their
/// sink down to every child they produce.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}
