//! Session management and multi-sink dispatch.
//!
//! One long-running consume thread per active producer: decode frames from
//! the producer's pipe, enrich the payload, and fan each record out to a
//! durable local sink and a remote sink with isolated failure domains.
//! Sessions live in a registry keyed by both stream handle and producer
//! identity; read-back re-frames stored records for a consumer.

pub mod consume;
pub mod error;
pub mod metadata;
pub mod options;
pub mod readback;
pub mod registry;
pub mod session;
pub mod sink;

pub use error::{Result, SessionError};
pub use metadata::ambient_instance;
pub use options::SessionOptions;
pub use registry::Registry;
pub use session::{PipeStream, Session, SessionState};
pub use sink::{
    subscription_channel, DropCounter, DurableSink, ReadConfig, RemoteSink, SinkError,
    Subscription, SubscriptionSender,
};
