use std::sync::OnceLock;

use logfan_record::InstanceInfo;
use tracing::debug;

static AMBIENT_INSTANCE: OnceLock<Option<InstanceInfo>> = OnceLock::new();

/// Describe the host instance, discovering it at most once per process.
///
/// The first caller runs `discover`; every later caller gets the cached
/// result, including a cached `None` when discovery found nothing. Sessions
/// registered on the same host share one answer, so a slow or absent
/// metadata endpoint is probed exactly once.
pub fn ambient_instance(
    discover: impl FnOnce() -> Option<InstanceInfo>,
) -> Option<&'static InstanceInfo> {
    AMBIENT_INSTANCE
        .get_or_init(|| {
            let info = discover();
            match &info {
                Some(info) => debug!(zone = %info.zone, name = %info.name, "discovered host instance"),
                None => debug!("no host instance metadata available"),
            }
            info
        })
        .as_ref()
}
