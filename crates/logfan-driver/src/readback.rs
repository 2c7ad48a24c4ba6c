use std::os::unix::net::UnixStream;

use logfan_frame::FrameWriter;
use tracing::{debug, error};

use crate::sink::Subscription;

/// Start a read-back pump for one subscription.
///
/// A dedicated thread re-frames each record delivered by the durable sink
/// into the wire format and writes it to one end of a socket pair; the
/// other end is handed to the consumer. End-of-data closes the stream
/// cleanly. If the consumer goes away first, the subscription is cancelled
/// so the sink stops producing.
pub fn spawn_pump(subscription: Subscription, producer_id: &str) -> std::io::Result<UnixStream> {
    let (pump_end, consumer_end) = UnixStream::pair()?;
    let id = producer_id.to_string();
    std::thread::Builder::new()
        .name(format!("logfan-read-{id}"))
        .spawn(move || pump(subscription, pump_end, id))?;
    Ok(consumer_end)
}

fn pump(subscription: Subscription, stream: UnixStream, id: String) {
    let mut writer = FrameWriter::new(stream);

    loop {
        match subscription.records.recv() {
            Ok(record) => {
                if let Err(err) = writer.write_record(&record) {
                    // Consumer gone: reverse-pressure the sink and stop.
                    debug!(id, error = %err, "read-back consumer disconnected");
                    subscription.cancel();
                    return;
                }
            }
            // Record channel closed: either clean end-of-data or the sink
            // reported a failure on its error channel.
            Err(_) => {
                match subscription.errors.try_recv() {
                    Ok(err) => error!(id, error = %err, "durable sink read failed"),
                    Err(_) => debug!(id, "read-back complete"),
                }
                // Dropping the writer closes our end; the consumer sees EOF.
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::time::Duration;

    use logfan_frame::FrameReader;
    use logfan_record::LogRecord;

    use super::*;
    use crate::sink::{subscription_channel, SinkError};

    #[test]
    fn records_are_reframed_for_the_consumer() {
        let (sender, subscription) = subscription_channel();
        let consumer = spawn_pump(subscription, "p1").unwrap();

        let records = vec![
            LogRecord::new("first", "stdout", 1),
            LogRecord::new("second", "stderr", 2),
        ];
        for record in &records {
            sender.records.send(record.clone()).unwrap();
        }
        drop(sender);

        let mut reader = FrameReader::new(consumer);
        for expected in &records {
            assert_eq!(&reader.read_record().unwrap(), expected);
        }
        // Clean end-of-data: EOF, not an error payload.
        assert!(reader.read_record().is_err());
    }

    #[test]
    fn sink_error_closes_the_stream() {
        let (sender, subscription) = subscription_channel();
        let consumer = spawn_pump(subscription, "p1").unwrap();

        sender.errors.send(SinkError::Other("index torn".into())).unwrap();
        drop(sender);

        let mut reader = FrameReader::new(consumer);
        assert!(reader.read_record().is_err());
    }

    #[test]
    fn consumer_disconnect_cancels_subscription() {
        let (sender, subscription) = subscription_channel();
        let consumer = spawn_pump(subscription, "p1").unwrap();
        drop(consumer);

        // Keep sending until the pump notices the broken stream.
        for i in 0.. {
            if sender.is_cancelled() {
                break;
            }
            assert!(i < 1000, "pump never noticed the disconnect");
            let _ = sender.records.send(LogRecord::new("x", "stdout", i));
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(sender.is_cancelled());
    }

    #[test]
    fn concurrent_pumps_are_independent() {
        let (sender_a, sub_a) = subscription_channel();
        let (sender_b, sub_b) = subscription_channel();
        let consumer_a = spawn_pump(sub_a, "p1").unwrap();
        let consumer_b = spawn_pump(sub_b, "p1").unwrap();

        for i in 0..5 {
            sender_a
                .records
                .send(LogRecord::new(format!("a{i}"), "stdout", i))
                .unwrap();
            sender_b
                .records
                .send(LogRecord::new(format!("b{i}"), "stdout", i))
                .unwrap();
        }
        drop(sender_a);
        drop(sender_b);

        let collect = |stream: UnixStream| {
            let mut reader = FrameReader::new(stream);
            let mut lines = Vec::new();
            while let Ok(record) = reader.read_record() {
                lines.push(String::from_utf8(record.line).unwrap());
            }
            lines
        };

        assert_eq!(collect(consumer_a), vec!["a0", "a1", "a2", "a3", "a4"]);
        assert_eq!(collect(consumer_b), vec!["b0", "b1", "b2", "b3", "b4"]);
    }

    #[test]
    fn empty_subscription_yields_immediate_eof() {
        let (sender, subscription) = subscription_channel();
        let mut consumer = spawn_pump(subscription, "p1").unwrap();
        drop(sender);

        let mut buf = Vec::new();
        consumer.read_to_end(&mut buf).unwrap();
        assert!(buf.is_empty());
    }
}
