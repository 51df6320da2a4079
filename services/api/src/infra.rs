use metrics_exporter_prometheus::PrometheusHandle;
use scheme_portal::intake::DocumentIntake;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) uploads: Arc<DocumentIntake>,
}

/// A single path segment naming a stored file. Anything that could leave the upload
/// directory is refused.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
