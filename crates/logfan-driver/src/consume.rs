use std::sync::Arc;

use logfan_enrich::{build_entry, overlay_error, EmitContext};
use logfan_frame::{FrameConfig, FrameReader};
use logfan_record::{ErrorSlot, LogRecord};
use tracing::{debug, error};

use crate::registry::Registry;
use crate::session::{PipeStream, Session};

/// The per-session consume loop.
///
/// Decode one frame at a time; back off on blank heartbeat lines; enrich
/// and dispatch everything else. Terminal stream conditions (end-of-stream,
/// closed handle) end the loop and tear the session down; any other decode
/// error re-creates the codec on the same stream and keeps going. That
/// recovery is lossy: buffered bytes are discarded and realignment with the
/// next frame boundary is not guaranteed.
pub(crate) fn run(registry: Arc<Registry>, session: Arc<Session>, pipe: PipeStream) {
    session.set_consuming();

    let config = FrameConfig::default();
    let mut reader = FrameReader::with_config(pipe, config.clone());
    // An enrichment error surfaces as an overlay on the next emitted entry,
    // so operators see it in the log stream itself.
    let mut pending = ErrorSlot::new();

    loop {
        let record = match reader.read_record() {
            Ok(record) => record,
            Err(err) if err.is_terminal() => {
                debug!(id = %session.producer_id(), error = %err, "shutting down log consumer");
                break;
            }
            Err(err) => {
                debug!(id = %session.producer_id(), error = %err, "re-creating frame decoder");
                reader = FrameReader::with_config(reader.into_inner(), config.clone());
                continue;
            }
        };

        if record.is_blank() {
            std::thread::sleep(session.options.sleep_interval);
            continue;
        }

        dispatch(&session, &record, &mut pending);
    }

    registry.remove(&session);
    session.close();
}

/// Fan one record out to both sinks with isolated failure domains.
///
/// A failure writing to either sink is logged with producer and record
/// context but never stops the other sink or the loop.
fn dispatch(session: &Session, record: &LogRecord, pending: &mut ErrorSlot) {
    let ctx = EmitContext {
        instance: session.instance(),
        container: session.container(),
    };
    let (mut entry, enrich_err) = build_entry(record, &session.options.enrich, &ctx);

    if let Some(previous) = pending.take() {
        overlay_error(&mut entry, &previous, &session.options.enrich);
    }
    if let Some(err) = enrich_err {
        pending.set(err);
    }

    if let Err(err) = session.remote.write(entry) {
        error!(
            id = %session.producer_id(),
            source = %record.source,
            timestamp_nanos = record.timestamp_nanos,
            error = %err,
            "error writing record to remote sink"
        );
    }

    if session.options.local_logging {
        if let Err(err) = session.durable.write(record) {
            error!(
                id = %session.producer_id(),
                source = %record.source,
                timestamp_nanos = record.timestamp_nanos,
                error = %err,
                "error writing record to durable sink"
            );
        }
    }
}
